//! Process-backed implementation of the BranchesEnumerator port.
//!
//! Shells out to the `hg` binary; `hg branches` lists open branches only,
//! which is exactly the derived set the tracker caches.

use crate::error::TrackerError;
use crate::ports::BranchesEnumerator;
use std::collections::HashSet;
use std::path::Path;
use std::process::Command;

pub struct HgBranchesCommand;

impl HgBranchesCommand {
    fn run_hg(root: &Path, args: &[&str]) -> Result<String, TrackerError> {
        let output = Command::new("hg")
            .args(args)
            .current_dir(root)
            .output()
            .map_err(|e| TrackerError::EnumerationFailed(format!("failed to execute hg: {e}")))?;

        if !output.status.success() {
            return Err(TrackerError::EnumerationFailed(format!(
                "hg {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| TrackerError::EnumerationFailed(format!("hg output not UTF-8: {e}")))
    }
}

impl BranchesEnumerator for HgBranchesCommand {
    fn collect_open_branches(&self, root: &Path) -> Result<HashSet<String>, TrackerError> {
        let output = Self::run_hg(root, &["branches"])?;
        Ok(parse_branch_names(&output))
    }
}

/// Parse `hg branches` output. Each line is
/// `name                   rev:shorthash [flags]`; the revision column is
/// right-aligned, so the name is everything before the last run of spaces.
fn parse_branch_names(output: &str) -> HashSet<String> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim_end();
            let name = match line.rfind("  ") {
                Some(idx) => &line[..idx],
                None => line,
            };
            let name = name.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aligned_branch_listing() {
        let output = "default                       42:1f2e3d4c5b6a\n\
                      feature branch                40:aabbccddeeff\n\
                      stable                        12:001122334455 (inactive)\n";
        let names = parse_branch_names(output);
        assert_eq!(names.len(), 3);
        assert!(names.contains("default"));
        assert!(names.contains("feature branch"));
        assert!(names.contains("stable"));
    }

    #[test]
    fn empty_output_yields_empty_set() {
        assert!(parse_branch_names("").is_empty());
        assert!(parse_branch_names("\n\n").is_empty());
    }

    #[test]
    fn missing_binary_maps_to_enumeration_failed() {
        let result = HgBranchesCommand::run_hg(Path::new("/"), &["branches"]);
        if let Err(e) = result {
            assert!(matches!(e, TrackerError::EnumerationFailed(_)));
        }
    }
}
