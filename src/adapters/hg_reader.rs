//! On-disk `.hg` metadata implementation of the RepoReader port.
//!
//! Each `read()` re-parses the metadata directory from scratch into a fresh
//! [`RepoInfo`]. Optional files that are simply absent (fresh repository,
//! no bookmarks, no tags) produce empty values; only an unreadable metadata
//! directory or an I/O failure on a present file is an error.

use crate::domain::{NamedRevision, RepoInfo, RepoState, DEFAULT_BRANCH};
use crate::error::TrackerError;
use crate::ports::RepoReader;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Length of a binary changeset node in the dirstate header.
const NODE_LEN: usize = 20;

/// Modification signature of a file, used for the cheap freshness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileSignature {
    mtime: SystemTime,
    len: u64,
}

fn signature_of(path: &Path) -> Option<FileSignature> {
    let meta = fs::metadata(path).ok()?;
    Some(FileSignature {
        mtime: meta.modified().ok()?,
        len: meta.len(),
    })
}

/// Reads working-copy state from a `.hg` directory.
pub struct HgMetadataReader {
    hg_dir: PathBuf,
    work_dir: PathBuf,
    /// Dirstate signature recorded at the last full `read()`.
    /// Outer `None` = never read; inner `None` = dirstate was absent.
    last_signature: Option<Option<FileSignature>>,
}

impl HgMetadataReader {
    /// Create a reader for the working copy rooted at `work_dir`.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let hg_dir = work_dir.join(".hg");
        Self {
            hg_dir,
            work_dir,
            last_signature: None,
        }
    }

    pub fn hg_dir(&self) -> &Path {
        &self.hg_dir
    }

    /// Read a metadata file that may legitimately not exist.
    fn read_optional(&self, path: &Path) -> Result<Option<String>, TrackerError> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TrackerError::unreadable(path, e)),
        }
    }

    fn read_current_branch(&self) -> Result<String, TrackerError> {
        Ok(self
            .read_optional(&self.hg_dir.join("branch"))?
            .map(|text| text.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string()))
    }

    /// First parent of the working directory, from the dirstate header.
    /// The null node (all zeroes) means no commits yet.
    fn read_current_revision(&self) -> Result<Option<String>, TrackerError> {
        let path = self.hg_dir.join("dirstate");
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TrackerError::unreadable(path, e)),
        };
        if bytes.len() < NODE_LEN {
            return Ok(None);
        }
        let node = &bytes[..NODE_LEN];
        if node.iter().all(|&b| b == 0) {
            return Ok(None);
        }
        Ok(Some(hex_encode(node)))
    }

    fn read_state(&self) -> RepoState {
        if self.hg_dir.join("merge").join("state").exists() {
            RepoState::Merging
        } else if self.hg_dir.join("rebasestate").exists() {
            RepoState::Rebasing
        } else if self.hg_dir.join("graftstate").exists() {
            RepoState::Grafting
        } else {
            RepoState::Normal
        }
    }

    /// Branch heads from the branch cache. Mercurial maintains several
    /// variants; the served one is current when present.
    fn read_branches(&self) -> Result<HashMap<String, HashSet<String>>, TrackerError> {
        for name in ["branch2-served", "branch2"] {
            let path = self.hg_dir.join("cache").join(name);
            if let Some(text) = self.read_optional(&path)? {
                return Ok(parse_branch_cache(&text));
            }
        }
        Ok(HashMap::new())
    }

    fn read_named_revisions(&self, path: &Path) -> Result<Vec<NamedRevision>, TrackerError> {
        Ok(self
            .read_optional(path)?
            .map(|text| parse_named_revisions(&text))
            .unwrap_or_default())
    }

    fn read_current_bookmark(&self) -> Result<Option<String>, TrackerError> {
        Ok(self
            .read_optional(&self.hg_dir.join("bookmarks.current"))?
            .map(|text| text.trim().to_string())
            .filter(|name| !name.is_empty()))
    }
}

impl RepoReader for HgMetadataReader {
    fn read(&mut self) -> Result<RepoInfo, TrackerError> {
        if !self.hg_dir.is_dir() {
            return Err(TrackerError::unreadable(
                &self.hg_dir,
                io::Error::new(io::ErrorKind::NotFound, "no .hg directory"),
            ));
        }

        let info = RepoInfo {
            current_branch: self.read_current_branch()?,
            current_revision: self.read_current_revision()?,
            state: self.read_state(),
            branches: self.read_branches()?,
            bookmarks: self.read_named_revisions(&self.hg_dir.join("bookmarks"))?,
            current_bookmark: self.read_current_bookmark()?,
            tags: self.read_named_revisions(&self.work_dir.join(".hgtags"))?,
            local_tags: self.read_named_revisions(&self.hg_dir.join("localtags"))?,
        };

        self.last_signature = Some(signature_of(&self.hg_dir.join("dirstate")));
        Ok(info)
    }

    fn is_fresh(&self) -> bool {
        match self.last_signature {
            None => true,
            Some(recorded) => signature_of(&self.hg_dir.join("dirstate")) == recorded,
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Parse the `branch2` cache: a header line (`tipnode tiprev [filter]`)
/// followed by `node status branch` lines. Malformed lines are skipped.
fn parse_branch_cache(text: &str) -> HashMap<String, HashSet<String>> {
    let mut branches: HashMap<String, HashSet<String>> = HashMap::new();
    for line in text.lines().skip(1) {
        let mut parts = line.splitn(3, ' ');
        let (Some(node), Some(_status), Some(branch)) =
            (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        if node.is_empty() || branch.is_empty() {
            continue;
        }
        branches
            .entry(branch.to_string())
            .or_default()
            .insert(node.to_string());
    }
    branches
}

/// Parse `node name` lines (bookmarks, `.hgtags`, localtags).
/// Names may contain spaces; everything after the first space is the name.
fn parse_named_revisions(text: &str) -> Vec<NamedRevision> {
    text.lines()
        .filter_map(|line| {
            let (node, name) = line.split_once(' ')?;
            let name = name.trim();
            if node.is_empty() || name.is_empty() {
                return None;
            }
            Some(NamedRevision::new(name, node))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn init_repo(dir: &TempDir) -> PathBuf {
        let hg = dir.path().join(".hg");
        fs::create_dir_all(hg.join("cache")).expect("create .hg");
        hg
    }

    #[test]
    fn missing_hg_dir_is_unreadable() {
        let dir = TempDir::new().expect("tempdir");
        let mut reader = HgMetadataReader::new(dir.path());
        let err = reader.read().expect_err("read without .hg should fail");
        assert!(matches!(err, TrackerError::MetadataUnreadable { .. }));
    }

    #[test]
    fn empty_repo_reads_as_defaults() {
        let dir = TempDir::new().expect("tempdir");
        init_repo(&dir);
        let mut reader = HgMetadataReader::new(dir.path());
        let info = reader.read().expect("read");
        assert_eq!(info, RepoInfo::default());
    }

    #[test]
    fn reads_full_metadata() {
        let dir = TempDir::new().expect("tempdir");
        let hg = init_repo(&dir);

        fs::write(hg.join("branch"), "feature\n").expect("branch");
        let mut dirstate = vec![0xabu8; NODE_LEN];
        dirstate[NODE_LEN - 1] = 0xcd;
        dirstate.extend_from_slice(&[0u8; NODE_LEN]); // second parent
        fs::write(hg.join("dirstate"), &dirstate).expect("dirstate");
        fs::write(
            hg.join("cache").join("branch2"),
            "ffff 12 served\n\
             aaaa o default\n\
             bbbb o default\n\
             cccc c feature\n",
        )
        .expect("branch2");
        fs::write(hg.join("bookmarks"), "1111 work in progress\n2222 done\n")
            .expect("bookmarks");
        fs::write(hg.join("bookmarks.current"), "done").expect("current bookmark");
        fs::write(dir.path().join(".hgtags"), "3333 v1.0\n").expect("hgtags");
        fs::write(hg.join("localtags"), "4444 wip-tag\n").expect("localtags");

        let mut reader = HgMetadataReader::new(dir.path());
        let info = reader.read().expect("read");

        assert_eq!(info.current_branch, "feature");
        let rev = info.current_revision.expect("revision");
        assert_eq!(rev.len(), 40);
        assert!(rev.starts_with("abababab"));
        assert!(rev.ends_with("cd"));
        assert_eq!(info.state, RepoState::Normal);
        assert_eq!(info.branches.len(), 2);
        assert_eq!(info.branches["default"].len(), 2);
        assert!(info.branches["feature"].contains("cccc"));
        assert_eq!(
            info.bookmarks,
            vec![
                NamedRevision::new("work in progress", "1111"),
                NamedRevision::new("done", "2222"),
            ]
        );
        assert_eq!(info.current_bookmark.as_deref(), Some("done"));
        assert_eq!(info.tags, vec![NamedRevision::new("v1.0", "3333")]);
        assert_eq!(info.local_tags, vec![NamedRevision::new("wip-tag", "4444")]);
    }

    #[test]
    fn null_dirstate_parent_means_no_commits() {
        let dir = TempDir::new().expect("tempdir");
        let hg = init_repo(&dir);
        fs::write(hg.join("dirstate"), [0u8; NODE_LEN]).expect("dirstate");
        let mut reader = HgMetadataReader::new(dir.path());
        assert_eq!(reader.read().expect("read").current_revision, None);
    }

    #[test]
    fn lifecycle_state_files_take_priority_order() {
        let dir = TempDir::new().expect("tempdir");
        let hg = init_repo(&dir);
        let mut reader = HgMetadataReader::new(dir.path());

        fs::write(hg.join("graftstate"), "").expect("graftstate");
        assert_eq!(reader.read().expect("read").state, RepoState::Grafting);

        fs::write(hg.join("rebasestate"), "").expect("rebasestate");
        assert_eq!(reader.read().expect("read").state, RepoState::Rebasing);

        fs::create_dir_all(hg.join("merge")).expect("merge dir");
        fs::write(hg.join("merge").join("state"), "").expect("merge state");
        assert_eq!(reader.read().expect("read").state, RepoState::Merging);
    }

    #[test]
    fn freshness_tracks_dirstate_signature() {
        let dir = TempDir::new().expect("tempdir");
        let hg = init_repo(&dir);
        fs::write(hg.join("dirstate"), vec![0x11u8; NODE_LEN]).expect("dirstate");

        let mut reader = HgMetadataReader::new(dir.path());
        assert!(reader.is_fresh(), "fresh before first read");

        reader.read().expect("read");
        assert!(reader.is_fresh(), "fresh right after a read");

        // Different length guarantees a changed signature regardless of
        // filesystem mtime granularity.
        fs::write(hg.join("dirstate"), vec![0x11u8; NODE_LEN + 8]).expect("rewrite");
        assert!(!reader.is_fresh(), "stale after dirstate changed");
    }

    #[test]
    fn branch_cache_skips_malformed_lines() {
        let parsed = parse_branch_cache("header line\naaaa o default\nbroken\n o x\n");
        assert_eq!(parsed.len(), 1);
        assert!(parsed["default"].contains("aaaa"));
    }
}
