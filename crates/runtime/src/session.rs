//! Session assembly: registration, bake, and entity hosts.
use std::sync::Arc;

use capability_core::{
    Capability, CapabilityContext, CapabilityId, CapabilityRegistry, EntityId, RegistryError,
    TrackedObject,
};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::host::EntityHost;
use crate::persistence::SaveFile;
use crate::replication::AttachmentSync;

/// A baked registry plus the shared context every host draws from.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    ctx: Arc<CapabilityContext>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<CapabilityContext> {
        &self.ctx
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        self.ctx.registry()
    }

    /// A host for `entity` with empty slots.
    pub fn spawn_host(&self, entity: EntityId) -> Result<EntityHost> {
        let host = EntityHost::new(entity, Arc::clone(&self.ctx), &self.config)?;
        debug!(target: "runtime::session", %entity, "Spawned entity host");
        Ok(host)
    }

    /// A host rebuilt from `save`. Persisted identities are restored in the
    /// allocator before any new one is handed out.
    ///
    /// # Errors
    ///
    /// [`SessionError::SlotOverflow`] when a section lists more objects than
    /// the configured slot count, checked before any identity is restored.
    /// [`SessionError::Persistence`] when a saved identity is out of range.
    pub fn restore_host(&self, save: SaveFile) -> Result<EntityHost> {
        let mut host = EntityHost::new(save.entity, Arc::clone(&self.ctx), &self.config)?;
        check_section("equipment", save.equipment.len(), host.equipment().len())?;
        check_section("misc", save.misc.len(), host.misc().len())?;

        let held = save.held.into_object(&self.ctx)?;
        let equipment = save
            .equipment
            .into_iter()
            .map(|object| object.into_object(&self.ctx))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let misc = save
            .misc
            .into_iter()
            .map(|object| object.into_object(&self.ctx))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        host.restore_parts(save.attachments.attachments, held, equipment, misc);

        debug!(target: "runtime::session", entity = %host.entity(), "Restored entity host");
        Ok(host)
    }

    /// Drains the dirty set and snapshots every matching object.
    ///
    /// Identities with no object among `objects` are dropped.
    pub fn end_of_tick_broadcast<'a, I>(&self, objects: I) -> Vec<AttachmentSync>
    where
        I: IntoIterator<Item = &'a TrackedObject>,
    {
        let dirty = self.ctx.dirty().consume();
        if dirty.is_empty() {
            return Vec::new();
        }

        let messages: Vec<_> = objects
            .into_iter()
            .filter(|object| object.identity().is_some_and(|id| dirty.contains(&id)))
            .filter_map(AttachmentSync::capture)
            .collect();

        debug!(
            target: "runtime::session",
            dirty = dirty.len(),
            sent = messages.len(),
            "Attachment broadcast"
        );
        messages
    }
}

fn check_section(section: &'static str, saved: usize, configured: usize) -> Result<()> {
    if saved > configured {
        return Err(SessionError::SlotOverflow {
            section,
            saved,
            configured,
        });
    }
    Ok(())
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    config: SessionConfig,
    registry: CapabilityRegistry,
}

impl SessionBuilder {
    fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            registry: CapabilityRegistry::new(),
        }
    }

    /// Override session configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers `T` through its [`Default`] impl.
    pub fn register<T>(self, id: impl Into<CapabilityId>) -> std::result::Result<Self, RegistryError>
    where
        T: Capability + Default + 'static,
    {
        self.registry.register_type::<T>(id)?;
        Ok(self)
    }

    /// Registers a capability type with an explicit factory.
    pub fn register_with<F>(
        self,
        id: impl Into<CapabilityId>,
        factory: F,
    ) -> std::result::Result<Self, RegistryError>
    where
        F: Fn() -> Box<dyn Capability> + Send + Sync + 'static,
    {
        self.registry.register(id, factory)?;
        Ok(self)
    }

    /// Bakes the registry and builds the session.
    pub fn build(self) -> Session {
        self.registry.bake();
        info!(
            target: "runtime::session",
            role = %self.config.replication,
            capabilities = self.registry.len(),
            "Session ready"
        );
        let ctx = CapabilityContext::new(Arc::new(self.registry), self.config.replication);
        Session {
            config: self.config,
            ctx: Arc::new(ctx),
        }
    }
}
