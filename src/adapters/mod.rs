pub mod hg_branches;
pub mod hg_reader;
pub mod notify_watcher;

pub use hg_branches::HgBranchesCommand;
pub use hg_reader::HgMetadataReader;
pub use notify_watcher::MetadataWatcher;
