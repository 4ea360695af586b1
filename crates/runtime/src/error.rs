//! Runtime error types.
//!
//! Core errors are wrapped rather than flattened so callers can still match on
//! them and classify them through [`CapabilityError`].
use capability_core::{AttachError, CapabilityError, ErrorSeverity, IdentityError, RegistryError};
use thiserror::Error;

use crate::host::Slot;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors surfaced by session assembly and entity hosts.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Attach(#[from] AttachError),

    #[error("slot {slot} does not exist on this host")]
    UnknownSlot { slot: Slot },

    /// A save lists more objects in a section than the host has slots for.
    #[error("save has {saved} {section} slots but the host is configured for {configured}")]
    SlotOverflow {
        section: &'static str,
        saved: usize,
        configured: usize,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl CapabilityError for SessionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Registry(err) => err.severity(),
            Self::Attach(err) => err.severity(),
            Self::UnknownSlot { .. } => ErrorSeverity::Usage,
            Self::SlotOverflow { .. } => ErrorSeverity::Data,
            Self::Persistence(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Registry(err) => err.error_code(),
            Self::Attach(err) => err.error_code(),
            Self::UnknownSlot { .. } => "SESSION_UNKNOWN_SLOT",
            Self::SlotOverflow { .. } => "SESSION_SLOT_OVERFLOW",
            Self::Persistence(err) => err.error_code(),
        }
    }
}

/// Errors raised while saving or loading attachment state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl CapabilityError for PersistenceError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Data
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "PERSISTENCE_IO",
            Self::Serialization(_) => "PERSISTENCE_SERIALIZATION",
            Self::Json(_) => "PERSISTENCE_JSON",
            Self::Identity(err) => err.error_code(),
        }
    }
}

/// Errors raised while loading a [`SessionConfig`](crate::SessionConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config TOML: {0}")]
    Parse(String),

    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: &'static str, value: String },
}

impl CapabilityError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Configuration
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "CONFIG_IO",
            Self::Parse(_) => "CONFIG_PARSE",
            Self::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
        }
    }
}
