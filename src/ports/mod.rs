pub mod branches;
pub mod publisher;
pub mod repo_reader;

pub use branches::BranchesEnumerator;
pub use publisher::StatusPublisher;
pub use repo_reader::RepoReader;
