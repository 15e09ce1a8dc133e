pub mod types;

pub use types::{NamedRevision, RepoInfo, RepoState, DEFAULT_BRANCH};
