//! Instance pooling for multi-instance capabilities.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use tracing::trace;

use crate::attachment::ActiveAttachment;
use crate::capability::{Capability, CapabilityId, HookCx};
use crate::hook::HookMask;
use crate::registry::CapabilityDescriptor;
use crate::types::EntityId;

/// A module plus the per-binding state the dispatcher keeps for it.
pub struct CapabilityInstance {
    id: CapabilityId,
    hook_mask: HookMask,
    module: Box<dyn Capability>,
    owner: Option<EntityId>,
    attachments: Vec<ActiveAttachment>,
    active: bool,
}

impl CapabilityInstance {
    /// Fresh, unbound instance built through the descriptor's factory.
    pub fn new(descriptor: &CapabilityDescriptor) -> Self {
        Self {
            id: descriptor.id().clone(),
            hook_mask: descriptor.hook_mask(),
            module: descriptor.instantiate(),
            owner: None,
            attachments: Vec::new(),
            active: false,
        }
    }

    pub fn id(&self) -> &CapabilityId {
        &self.id
    }

    pub fn hook_mask(&self) -> HookMask {
        self.hook_mask
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn attachments(&self) -> &[ActiveAttachment] {
        &self.attachments
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn module(&self) -> &dyn Capability {
        self.module.as_ref()
    }

    pub fn module_mut(&mut self) -> &mut dyn Capability {
        self.module.as_mut()
    }

    pub(crate) fn bind(&mut self, owner: EntityId) {
        self.owner = Some(owner);
    }

    pub(crate) fn set_attachments(&mut self, attachments: Vec<ActiveAttachment>) {
        self.attachments = attachments;
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Splits the instance into the module and the read-only view it is
    /// called with. Instances that were never bound report the default entity.
    pub(crate) fn split(&mut self) -> (&mut dyn Capability, HookCx<'_>) {
        let cx = HookCx::new(self.owner.unwrap_or_default(), &self.attachments);
        (self.module.as_mut(), cx)
    }

    pub(crate) fn view(&self) -> (&dyn Capability, HookCx<'_>) {
        let cx = HookCx::new(self.owner.unwrap_or_default(), &self.attachments);
        (self.module.as_ref(), cx)
    }

    fn reset(&mut self) {
        self.owner = None;
        self.attachments.clear();
        self.active = false;
        self.module.reset();
    }
}

impl fmt::Debug for CapabilityInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityInstance")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("attachments", &self.attachments.len())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// Per-type free lists of retired instances, shared by every dispatcher.
#[derive(Default)]
pub struct InstancePool {
    free: Mutex<HashMap<CapabilityId, Vec<CapabilityInstance>>>,
}

impl InstancePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pops a retired instance of the descriptor's type, or builds one.
    pub fn rent(&self, descriptor: &CapabilityDescriptor) -> CapabilityInstance {
        let recycled = self
            .free
            .lock()
            .get_mut(descriptor.id())
            .and_then(Vec::pop);

        match recycled {
            Some(instance) => {
                trace!(target: "capability::pool", capability = %descriptor.id(), "Reused pooled instance");
                instance
            }
            None => CapabilityInstance::new(descriptor),
        }
    }

    /// Resets `instance` and pushes it onto its type's free list.
    pub fn give_back(&self, mut instance: CapabilityInstance) {
        instance.reset();
        trace!(target: "capability::pool", capability = %instance.id, "Returned instance to pool");
        self.free
            .lock()
            .entry(instance.id.clone())
            .or_default()
            .push(instance);
    }

    /// Retired instances waiting for `id`.
    pub fn idle_count(&self, id: &CapabilityId) -> usize {
        self.free.lock().get(id).map_or(0, Vec::len)
    }
}

impl fmt::Debug for InstancePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let free = self.free.lock();
        f.debug_struct("InstancePool")
            .field("types", &free.len())
            .field("idle", &free.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::{AttachmentContext, AttachmentData};
    use crate::capability::CapabilityManifest;
    use crate::hook::HookKind;
    use crate::identity::ObjectId;
    use crate::registry::CapabilityRegistry;

    #[derive(Default)]
    struct Charge {
        stacks: u32,
    }

    impl Capability for Charge {
        fn manifest(&self) -> CapabilityManifest {
            CapabilityManifest::multi_instance().hook(HookKind::PostUpdate)
        }

        fn post_update(&mut self, _cx: &HookCx<'_>) {
            self.stacks += 1;
        }

        fn reset(&mut self) {
            self.stacks = 0;
        }
    }

    fn descriptor() -> std::sync::Arc<CapabilityDescriptor> {
        let registry = CapabilityRegistry::new();
        registry.register_type::<Charge>("X:Charge").unwrap();
        registry.bake();
        registry
            .get_type_descriptor(&"X:Charge".into())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn returned_instances_carry_no_previous_binding() {
        let pool = InstancePool::new();
        let descriptor = descriptor();

        let mut instance = pool.rent(&descriptor);
        instance.bind(EntityId(7));
        instance.set_attachments(vec![ActiveAttachment::new(
            AttachmentContext::for_object(ObjectId(3), EntityId(7)),
            AttachmentData::new(),
        )]);
        instance.set_active(true);
        let (module, cx) = instance.split();
        module.post_update(&cx);

        pool.give_back(instance);
        assert_eq!(pool.idle_count(descriptor.id()), 1);

        let mut reused = pool.rent(&descriptor);
        assert_eq!(pool.idle_count(descriptor.id()), 0);
        assert_eq!(reused.owner(), None);
        assert!(reused.attachments().is_empty());
        assert!(!reused.is_active());
        let charge = reused.module_mut().as_any_mut().downcast_mut::<Charge>().unwrap();
        assert_eq!(charge.stacks, 0);
    }

    #[test]
    fn empty_pool_builds_new_instances() {
        let pool = InstancePool::new();
        let descriptor = descriptor();
        let a = pool.rent(&descriptor);
        let b = pool.rent(&descriptor);
        assert_eq!(a.id(), b.id());
        assert_eq!(a.hook_mask(), descriptor.hook_mask());
    }
}
