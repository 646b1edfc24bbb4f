//! # shark-core
//!
//! Foundation crate for `shark`: entity types, key patterns, the closed error
//! taxonomy, configuration, and the event feed the sync engine emits.
//! Every other crate in the workspace depends on this one.

pub mod config;
pub mod entities;
pub mod errors;
pub mod events;
pub mod keys;
pub mod run_status;
pub mod slug;

pub use config::{Config, WorkflowConfig};
pub use entities::{Document, Epic, EntityKind, Feature, Task};
pub use errors::{ErrorDetail, ErrorKind, Severity};
pub use events::Event;
pub use keys::{EpicKey, FeatureKey, TaskKey};
pub use run_status::RunStatus;
