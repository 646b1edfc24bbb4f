//! Deterministic single-threaded directory walk using `ignore::Walk`
//! (not `WalkParallel`): sync's event order and write order need to be
//! deterministic, and a docs tree is small enough that parallel-scan
//! throughput isn't needed here (see DESIGN.md).

use std::collections::HashSet;
use std::path::Path;

use ignore::WalkBuilder;
use shark_core::config::ScannerConfig;

use crate::types::{CandidateFile, SkipReason};

/// Directories skipped without being reported, in addition to whatever the
/// configuration excludes.
const DEFAULT_IGNORES: &[&str] = &[".git", "node_modules", ".cache"];

/// Walk `root`, returning candidate files in deterministic (sorted-by-path)
/// order. Symlinks are followed once; a cycle (revisiting an inode already
/// seen) is silently skipped rather than erroring.
pub fn walk_directory(root: &Path, config: &ScannerConfig) -> Vec<CandidateFile> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(config.honor_gitignore)
        .git_global(config.honor_gitignore)
        .git_exclude(config.honor_gitignore)
        .follow_links(config.follow_symlinks)
        .standard_filters(false);

    let mut overrides = ignore::overrides::OverrideBuilder::new(root);
    if !config.include.is_empty() {
        for pattern in &config.include {
            let _ = overrides.add(pattern);
        }
    }
    for pattern in DEFAULT_IGNORES {
        let _ = overrides.add(&format!("!{pattern}/**"));
        let _ = overrides.add(&format!("!{pattern}"));
    }
    for pattern in &config.exclude {
        let _ = overrides.add(&format!("!{pattern}"));
    }
    if let Ok(built) = overrides.build() {
        builder.overrides(built);
    }

    let mut seen_inodes: HashSet<u64> = HashSet::new();
    let mut candidates = Vec::new();

    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            if !seen_inodes.insert(metadata.ino()) {
                continue;
            }
        }

        let size_bytes = metadata.len();
        let skip_hint = if size_bytes > config.max_file_size {
            Some(SkipReason::FileTooLarge { size_bytes, max_bytes: config.max_file_size })
        } else {
            None
        };

        candidates.push(CandidateFile {
            absolute_path: entry.path().to_path_buf(),
            kind_hint: None,
            depth: entry.depth(),
            size_bytes,
            skip_hint,
        });
    }

    candidates.sort_by(|a, b| a.absolute_path.cmp(&b.absolute_path));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walks_nested_markdown_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("E01-auth/E01-F01-login/tasks")).unwrap();
        fs::write(dir.path().join("E01-auth/epic.md"), "# Auth").unwrap();
        fs::write(
            dir.path().join("E01-auth/E01-F01-login/tasks/T-E01-F01-002.md"),
            "# T2",
        )
        .unwrap();
        fs::write(
            dir.path().join("E01-auth/E01-F01-login/tasks/T-E01-F01-001.md"),
            "# T1",
        )
        .unwrap();

        let candidates = walk_directory(dir.path(), &ScannerConfig::default());
        assert_eq!(candidates.len(), 3);
        assert!(candidates.windows(2).all(|w| w[0].absolute_path <= w[1].absolute_path));
    }

    #[test]
    fn skips_default_ignored_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main").unwrap();
        fs::write(dir.path().join("epic.md"), "# Auth").unwrap();

        let candidates = walk_directory(dir.path(), &ScannerConfig::default());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].absolute_path.file_name().unwrap(), "epic.md");
    }

    #[test]
    fn flags_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.md"), vec![b'a'; 128]).unwrap();

        let mut config = ScannerConfig::default();
        config.max_file_size = 16;
        let candidates = walk_directory(dir.path(), &config);
        assert_eq!(candidates.len(), 1);
        assert!(matches!(candidates[0].skip_hint, Some(SkipReason::FileTooLarge { .. })));
    }
}
