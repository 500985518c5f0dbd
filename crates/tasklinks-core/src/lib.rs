//! tasklinks-core library.
//!
//! Typed links between tasks, stored as two mirrored rows per link so either
//! endpoint can list its relations directly. [`store::LinkStore`] is the only
//! writer of link rows; it keeps each pair consistent inside one SQLite
//! transaction and publishes change events after commit.
//!
//! # Conventions
//!
//! - **Errors**: setup paths return `anyhow::Result`; store operations return
//!   [`error::LinkResult`] so callers can match on [`error::LinkError`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod event;
pub mod model;
pub mod store;

pub use catalog::{RelationCatalog, RelationType};
pub use error::{ErrorCode, LinkError, LinkResult};
pub use event::{EventSink, MemorySink, TracingSink};
pub use model::{LabelGroup, LinkedTask, TaskLink, TaskLinkEvent};
pub use store::{LinkStore, StoreOptions};
