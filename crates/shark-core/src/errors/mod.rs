//! The closed error taxonomy and the configuration-error type that fails
//! the process fast, before any sync/validate phase begins.

mod config_error;
mod kind;

pub use config_error::ConfigError;
pub use kind::{ErrorDetail, ErrorKind, Severity};
