/// Configuration errors fail the process before any phase begins; the CLI
/// maps any variant here to exit code 2.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot open database at {path}: {message}")]
    UnreadableDatabase { path: String, message: String },

    #[error("database schema version {found} is newer than the {supported} this build understands")]
    UnrecognizedSchemaVersion { found: u32, supported: u32 },

    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("unknown conflict strategy '{value}' (expected prefer_file, prefer_db, or abort)")]
    UnknownConflictStrategy { value: String },

    #[error("unknown output format '{value}' (expected cli or json)")]
    UnknownOutputFormat { value: String },

    #[error("cannot read config file at {path}: {message}")]
    UnreadableConfig { path: String, message: String },

    #[error("documentation root {path} does not exist or is not a directory")]
    InvalidDocumentationRoot { path: String },
}
