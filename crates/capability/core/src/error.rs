//! Error infrastructure for capability-core.
//!
//! Each fallible surface has its own enum. All of them implement
//! [`CapabilityError`] so hosts can classify failures uniformly.

use crate::capability::CapabilityId;
use crate::identity::ObjectId;

/// How a failure should be handled by the caller.
///
/// - **Configuration**: startup wiring is wrong (duplicate ids, late registration)
/// - **Usage**: an API was called in the wrong phase or with an unsuitable target
/// - **Data**: persisted or replicated content could not be interpreted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Fix the registration code; retrying will not help.
    Configuration,

    /// Caller bug or rejected request; state is unchanged.
    Usage,

    /// Bad input from disk or the network.
    Data,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Usage => "usage",
            Self::Data => "data",
        }
    }

    /// True when the error means the program was assembled incorrectly.
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration)
    }
}

/// Common trait for capability-core errors.
pub trait CapabilityError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable identifier for the variant, useful in logs and tests.
    fn error_code(&self) -> &'static str;
}

/// Failures of the type registry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("capability `{id}` is already registered")]
    DuplicateCapabilityId { id: CapabilityId },

    #[error("cannot register `{id}`: the registry is already baked")]
    RegistrationClosed { id: CapabilityId },

    #[error("capability ids must not be empty")]
    EmptyCapabilityId,

    #[error("the capability registry has not been baked yet")]
    RegistryNotBaked,
}

impl CapabilityError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DuplicateCapabilityId { .. }
            | Self::RegistrationClosed { .. }
            | Self::EmptyCapabilityId => ErrorSeverity::Configuration,
            Self::RegistryNotBaked => ErrorSeverity::Usage,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateCapabilityId { .. } => "REGISTRY_DUPLICATE_ID",
            Self::RegistrationClosed { .. } => "REGISTRY_CLOSED",
            Self::EmptyCapabilityId => "REGISTRY_EMPTY_ID",
            Self::RegistryNotBaked => "REGISTRY_NOT_BAKED",
        }
    }
}

/// Failures of the attachment API.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AttachError {
    /// Attachments are per-object; stackable objects cannot carry them.
    #[error("object kind {kind} is not attachable (max stack {max_stack})")]
    NotAttachable { kind: u32, max_stack: u32 },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl CapabilityError for AttachError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotAttachable { .. } => ErrorSeverity::Usage,
            Self::Registry(err) => err.severity(),
            Self::Identity(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotAttachable { .. } => "ATTACH_NOT_ATTACHABLE",
            Self::Registry(err) => err.error_code(),
            Self::Identity(err) => err.error_code(),
        }
    }
}

/// Failures of the identity allocator.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// A loaded identity leaves no room for the allocator to advance past it.
    #[error("{id} is outside the allocatable range")]
    OutOfRange { id: ObjectId },

    #[error("object identities are exhausted")]
    Exhausted,
}

impl CapabilityError for IdentityError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Data
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::OutOfRange { .. } => "IDENTITY_OUT_OF_RANGE",
            Self::Exhausted => "IDENTITY_EXHAUSTED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_follows_the_wrapped_error() {
        let err = AttachError::from(RegistryError::RegistryNotBaked);
        assert_eq!(err.severity(), ErrorSeverity::Usage);
        assert_eq!(err.error_code(), "REGISTRY_NOT_BAKED");

        let dup = RegistryError::DuplicateCapabilityId {
            id: CapabilityId::new("x:Dash"),
        };
        assert!(dup.severity().is_configuration());
        assert_eq!(dup.to_string(), "capability `x:Dash` is already registered");
    }
}
