//! # shark-sync
//!
//! The sync pipeline: Scanner -> PatternMatcher -> MetadataParser ->
//! ConflictDetector -> SyncEngine, plus the read-only Validator. Every type
//! that only lives for the duration of one invocation is in [`types`];
//! nothing here is persisted directly — that's `shark-storage`'s job.

pub mod conflict_detector;
pub mod engine;
pub mod metadata_parser;
pub mod pattern_matcher;
pub mod scanner;
pub mod types;
pub mod validator;

pub use engine::{run, SyncOptions, SyncOutcome};
pub use scanner::Scanner;
pub use validator::{validate, ValidationFinding, ValidationOutcome};
