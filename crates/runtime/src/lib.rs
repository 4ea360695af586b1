//! Host-side glue around `capability-core`.
//!
//! A [`Session`] owns the baked registry and the shared context; each entity
//! the host simulates gets an [`EntityHost`] that keeps its attachment sources
//! in a fixed order and drives the per-tick dispatch sequence.
//!
//! Modules are organized by responsibility:
//! - [`session`] assembles the registry and spawns hosts
//! - [`host`] is the per-entity tick and attachment glue
//! - [`config`] loads [`SessionConfig`] from TOML and the environment
//! - [`persistence`] and [`replication`] move attachment lists across
//!   process boundaries
pub mod config;
pub mod error;
pub mod host;
pub mod persistence;
pub mod replication;
pub mod session;

pub use config::SessionConfig;
pub use error::{ConfigError, PersistenceError, Result, SessionError};
pub use host::{EntityHost, InputFrame, Slot};
pub use persistence::{EntitySave, ObjectSave, SaveFile};
pub use replication::{AttachmentSync, apply_sync};
pub use session::{Session, SessionBuilder};
