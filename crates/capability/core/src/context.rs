//! Process-scoped shared state.
//!
//! Everything here is shared across entities and, for the dirty set and
//! allocator, across threads. A test builds a fresh context instead of
//! touching globals.

use std::sync::Arc;

use crate::identity::IdentityAllocator;
use crate::pool::InstancePool;
use crate::registry::CapabilityRegistry;
use crate::sync::DirtySet;

/// This process's part in attachment replication.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ReplicationRole {
    /// Single process, nothing to broadcast.
    #[default]
    Standalone,
    /// Owns the truth; object attachment edits are queued for broadcast.
    Authority,
    /// Mirrors an authority; receives attachment lists instead of sending.
    Remote,
}

impl ReplicationRole {
    pub const fn broadcasts(&self) -> bool {
        matches!(self, Self::Authority)
    }
}

/// Registry, pool, identity allocator and dirty set of one session.
#[derive(Debug)]
pub struct CapabilityContext {
    registry: Arc<CapabilityRegistry>,
    pool: InstancePool,
    identities: IdentityAllocator,
    dirty: DirtySet,
    role: ReplicationRole,
}

impl CapabilityContext {
    pub fn new(registry: Arc<CapabilityRegistry>, role: ReplicationRole) -> Self {
        Self {
            registry,
            pool: InstancePool::new(),
            identities: IdentityAllocator::new(),
            dirty: DirtySet::new(),
            role,
        }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<CapabilityRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn pool(&self) -> &InstancePool {
        &self.pool
    }

    pub fn identities(&self) -> &IdentityAllocator {
        &self.identities
    }

    pub fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    pub fn role(&self) -> ReplicationRole {
        self.role
    }
}
