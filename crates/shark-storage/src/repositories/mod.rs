//! One module per entity, each exposing free functions over `&Connection`
//! rather than a trait object — `SyncEngine` and `Validator` call these
//! directly, whether the connection came from `Storage::connection()` or
//! was deref'd from an open `Transaction`.

pub mod document;
pub mod epic;
pub mod feature;
pub mod task;
