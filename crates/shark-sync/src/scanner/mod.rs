//! Scanner: walks the documentation root and emits [`CandidateFile`]
//! records.

mod walker;

use std::path::Path;

use shark_core::config::ScannerConfig;

use crate::types::CandidateFile;

pub struct Scanner {
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Walk `root` to completion and return every candidate file in
    /// deterministic order. Non-restartable: callers collect the full
    /// result rather than iterating lazily, matching the engine's
    /// buffer-then-classify phase sequence.
    pub fn scan(&self, root: &Path) -> Vec<CandidateFile> {
        walker::walk_directory(root, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_root_yields_no_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = Scanner::new(ScannerConfig::default());
        assert!(scanner.scan(dir.path()).is_empty());
    }
}
