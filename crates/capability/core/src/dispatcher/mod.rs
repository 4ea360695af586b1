//! Per-entity capability dispatch.
//!
//! A [`CapabilityDispatcher`] owns every capability instance bound to one
//! entity. Instances live in a slot arena and are referenced by
//! [`InstanceHandle`]; per-hook buckets hold the handles of active instances
//! whose mask covers that hook, so a dispatch touches only implementors.
//!
//! # Lifecycle
//!
//! 1. [`initialize_singletons`](CapabilityDispatcher::initialize_singletons)
//!    builds one instance per singleton type (lazily on first use).
//! 2. [`refresh_contexts`](CapabilityDispatcher::refresh_contexts) reconciles
//!    instances against the current attachment sources.
//! 3. Each `dispatch_*` call first gives dormant eligible instances a chance to
//!    activate, then walks the hook's bucket and reduces the results.
//! 4. [`check_deactivations`](CapabilityDispatcher::check_deactivations)
//!    retires active multi-instances that do not hold themselves open, once
//!    per tick.
//!
//! The dispatcher has no internal locking: it is owned and driven by a single
//! tick context. Panics raised by a module propagate out of the dispatch call.

mod hooks;

use std::collections::{BTreeMap, BTreeSet};
use std::ops::ControlFlow;
use std::sync::Arc;

use strum::EnumCount;
use tracing::{debug, trace};

use crate::attachment::{ActiveAttachment, AttachmentContext, AttachmentRecord};
use crate::capability::{Capability, CapabilityId, HookCx, Multiplicity};
use crate::context::CapabilityContext;
use crate::error::RegistryError;
use crate::hook::HookKind;
use crate::identity::ObjectId;
use crate::pool::CapabilityInstance;
use crate::registry::CapabilityDescriptor;
use crate::types::EntityId;

/// Stable index of an instance in a dispatcher's slot arena.
///
/// Handles are only meaningful for the dispatcher that issued them, and a
/// retired multi-instance's handle may be reissued later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceHandle(u32);

impl InstanceHandle {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where an attachment source lives: on the entity itself or on an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKey {
    Entity,
    Object(ObjectId),
}

impl ObjectKey {
    fn context(self, entity: EntityId) -> AttachmentContext {
        match self {
            Self::Entity => AttachmentContext::for_entity(entity),
            Self::Object(object) => AttachmentContext::for_object(object, entity),
        }
    }
}

/// One attachment list fed to [`CapabilityDispatcher::refresh_contexts`].
#[derive(Clone, Copy, Debug)]
pub struct AttachmentSource<'a> {
    pub origin: ObjectKey,
    pub records: &'a [AttachmentRecord],
}

impl<'a> AttachmentSource<'a> {
    pub fn entity(records: &'a [AttachmentRecord]) -> Self {
        Self {
            origin: ObjectKey::Entity,
            records,
        }
    }

    pub fn object(identity: ObjectId, records: &'a [AttachmentRecord]) -> Self {
        Self {
            origin: ObjectKey::Object(identity),
            records,
        }
    }
}

type MultiKey = (CapabilityId, ObjectKey);

/// Capability instances and hook buckets of a single entity.
pub struct CapabilityDispatcher {
    entity: EntityId,
    ctx: Arc<CapabilityContext>,
    initialized: bool,

    slots: Vec<Option<CapabilityInstance>>,
    free_slots: Vec<u32>,
    buckets: Vec<Vec<InstanceHandle>>,

    singletons: BTreeMap<CapabilityId, InstanceHandle>,
    multi: BTreeMap<MultiKey, InstanceHandle>,

    // Reused across refreshes.
    singleton_views: BTreeMap<CapabilityId, Vec<ActiveAttachment>>,
    seen_multi: BTreeSet<MultiKey>,
    stale_multi: Vec<MultiKey>,
    pending: Vec<InstanceHandle>,
}

impl CapabilityDispatcher {
    /// Creates an empty dispatcher for `entity`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::RegistryNotBaked`] if the context's registry is still
    /// open for registration.
    pub fn new(entity: EntityId, ctx: Arc<CapabilityContext>) -> Result<Self, RegistryError> {
        if !ctx.registry().is_baked() {
            return Err(RegistryError::RegistryNotBaked);
        }

        Ok(Self {
            entity,
            ctx,
            initialized: false,
            slots: Vec::new(),
            free_slots: Vec::new(),
            buckets: vec![Vec::new(); HookKind::COUNT],
            singletons: BTreeMap::new(),
            multi: BTreeMap::new(),
            singleton_views: BTreeMap::new(),
            seen_multi: BTreeSet::new(),
            stale_multi: Vec::new(),
            pending: Vec::new(),
        })
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn context(&self) -> &Arc<CapabilityContext> {
        &self.ctx
    }

    // ========================================================================
    // Arena
    // ========================================================================

    fn insert(&mut self, instance: CapabilityInstance) -> InstanceHandle {
        match self.free_slots.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(instance);
                InstanceHandle(slot)
            }
            None => {
                let slot = u32::try_from(self.slots.len())
                    .expect("instance arena exceeds u32 handles");
                self.slots.push(Some(instance));
                InstanceHandle(slot)
            }
        }
    }

    fn take(&mut self, handle: InstanceHandle) -> Option<CapabilityInstance> {
        let instance = self.slots.get_mut(handle.index())?.take()?;
        self.free_slots.push(handle.0);
        Some(instance)
    }

    fn descriptor(&self, id: &CapabilityId) -> Option<Arc<CapabilityDescriptor>> {
        // The registry was baked before construction and bake is one-way.
        self.ctx.registry().get_type_descriptor(id).ok().flatten()
    }

    // ========================================================================
    // Singletons
    // ========================================================================

    /// Builds one dormant instance per singleton type. Runs once; later calls
    /// are no-ops.
    pub fn initialize_singletons(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let Ok(descriptors) = self.ctx.registry().get_all_descriptors() else {
            return;
        };

        for descriptor in descriptors.iter().filter(|d| d.is_singleton()) {
            let mut instance = CapabilityInstance::new(descriptor);
            instance.bind(self.entity);
            let handle = self.insert(instance);
            self.singletons.insert(descriptor.id().clone(), handle);
            self.singleton_views.insert(descriptor.id().clone(), Vec::new());
        }

        debug!(
            target: "capability::dispatch",
            entity = %self.entity,
            singletons = self.singletons.len(),
            "Initialized singleton capabilities"
        );
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Reconciles instances with the given attachment sources.
    ///
    /// Sources are walked in the order given; for singletons the first
    /// attachment seen is the one that gates activation. Unknown capability
    /// ids are skipped.
    pub fn refresh_contexts<'a, I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = AttachmentSource<'a>>,
    {
        self.initialize_singletons();

        self.seen_multi.clear();
        for view in self.singleton_views.values_mut() {
            view.clear();
        }

        for source in sources {
            let context = source.origin.context(self.entity);
            for record in source.records {
                let Some(descriptor) = self.descriptor(&record.capability_id) else {
                    trace!(
                        target: "capability::dispatch",
                        entity = %self.entity,
                        capability = %record.capability_id,
                        "Skipping unknown capability"
                    );
                    continue;
                };

                let attachment = ActiveAttachment::new(context, record.data.clone());
                match descriptor.multiplicity() {
                    Multiplicity::Singleton => {
                        if let Some(view) = self.singleton_views.get_mut(descriptor.id()) {
                            view.push(attachment);
                        }
                    }
                    Multiplicity::MultiInstance => {
                        self.ensure_multi(&descriptor, source.origin, attachment);
                    }
                }
            }
        }

        self.finalize_singletons();
        self.remove_stale_multi();
    }

    fn ensure_multi(
        &mut self,
        descriptor: &CapabilityDescriptor,
        origin: ObjectKey,
        attachment: ActiveAttachment,
    ) {
        let key = (descriptor.id().clone(), origin);
        self.seen_multi.insert(key.clone());
        if self.multi.contains_key(&key) {
            return;
        }

        let mut instance = self.ctx.pool().rent(descriptor);
        instance.bind(self.entity);
        instance.set_attachments(vec![attachment]);
        let handle = self.insert(instance);
        debug!(
            target: "capability::dispatch",
            entity = %self.entity,
            capability = %descriptor.id(),
            origin = ?origin,
            "Bound multi-instance capability"
        );
        self.multi.insert(key, handle);
    }

    fn finalize_singletons(&mut self) {
        let Self {
            entity,
            slots,
            buckets,
            singletons,
            singleton_views,
            ..
        } = self;

        for (id, handle) in singletons.iter() {
            let Some(instance) = slots.get_mut(handle.index()).and_then(Option::as_mut) else {
                continue;
            };
            let view = singleton_views.get(id).cloned().unwrap_or_default();
            let had_attachments = !instance.attachments().is_empty();
            let lost_all = had_attachments && view.is_empty();
            instance.set_attachments(view);

            if lost_all && instance.is_active() {
                deactivate(buckets, *handle, instance);
                debug!(
                    target: "capability::dispatch",
                    entity = %entity,
                    capability = %id,
                    "Deactivated singleton after losing its attachments"
                );
            }
        }
    }

    fn remove_stale_multi(&mut self) {
        let mut stale = std::mem::take(&mut self.stale_multi);
        stale.clear();
        stale.extend(
            self.multi
                .keys()
                .filter(|key| !self.seen_multi.contains(*key))
                .cloned(),
        );
        for key in &stale {
            self.retire(key);
        }
        self.stale_multi = stale;
    }

    /// Deactivates a multi-instance if needed and returns it to the pool.
    fn retire(&mut self, key: &MultiKey) {
        let Some(handle) = self.multi.remove(key) else {
            return;
        };
        let Some(mut instance) = self.take(handle) else {
            return;
        };
        if instance.is_active() {
            deactivate(&mut self.buckets, handle, &mut instance);
        }
        debug!(
            target: "capability::dispatch",
            entity = %self.entity,
            capability = %key.0,
            origin = ?key.1,
            "Retired multi-instance capability"
        );
        self.ctx.pool().give_back(instance);
    }

    // ========================================================================
    // Activation
    // ========================================================================

    /// Activates `handle` for `hook` if it is eligible and its gate opens.
    ///
    /// Returns whether the instance is active afterwards. Already-active
    /// instances are left untouched.
    pub fn try_activate(&mut self, handle: InstanceHandle, hook: HookKind) -> bool {
        let Some(instance) = self.slots.get_mut(handle.index()).and_then(Option::as_mut) else {
            return false;
        };
        if instance.is_active() {
            return true;
        }

        let mask = instance.hook_mask();
        if !mask.has(hook) || mask.is_no_auto_activate(hook) {
            return false;
        }
        let Some(primary) = instance.attachments().first() else {
            return false;
        };
        if !instance.module().can_activate(&primary.data) {
            return false;
        }

        instance.set_active(true);
        for covered in mask.iter() {
            self.buckets[covered.index()].push(handle);
        }
        let (module, cx) = instance.split();
        module.on_activate(&cx);

        debug!(
            target: "capability::dispatch",
            entity = %self.entity,
            capability = %instance.id(),
            hook = %hook,
            "Activated capability"
        );
        true
    }

    /// Gives every dormant instance that implements `hook` a chance to activate.
    pub fn activate_pending(&mut self, hook: HookKind) {
        self.initialize_singletons();

        let mut pending = std::mem::take(&mut self.pending);
        pending.clear();
        let eligible = |handle: &&InstanceHandle| {
            self.slots
                .get(handle.index())
                .and_then(Option::as_ref)
                .is_some_and(|instance| {
                    !instance.is_active()
                        && !instance.attachments().is_empty()
                        && instance.hook_mask().has(hook)
                })
        };
        pending.extend(self.singletons.values().filter(eligible).copied());
        pending.extend(self.multi.values().filter(eligible).copied());

        for handle in &pending {
            self.try_activate(*handle, hook);
        }
        self.pending = pending;
    }

    /// Removes an active instance from every bucket and runs its deactivation
    /// callback. Returns false if it was not active.
    pub fn force_deactivate(&mut self, handle: InstanceHandle) -> bool {
        let Some(instance) = self.slots.get_mut(handle.index()).and_then(Option::as_mut) else {
            return false;
        };
        if !instance.is_active() {
            return false;
        }
        deactivate(&mut self.buckets, handle, instance);
        true
    }

    /// Retires every active multi-instance whose deactivation gate is open.
    pub fn check_deactivations(&mut self) {
        let mut ending = std::mem::take(&mut self.stale_multi);
        ending.clear();
        for (key, handle) in &self.multi {
            let done = self
                .slots
                .get(handle.index())
                .and_then(Option::as_ref)
                .is_some_and(|instance| instance.is_active() && instance.module().can_deactivate());
            if done {
                ending.push(key.clone());
            }
        }
        for key in &ending {
            self.retire(key);
        }
        self.stale_multi = ending;
    }

    // ========================================================================
    // Reduction
    // ========================================================================

    /// Runs pending activation for `hook`, then folds over its bucket.
    fn fold<T>(
        &mut self,
        hook: HookKind,
        init: T,
        mut step: impl FnMut(T, &mut dyn Capability, &HookCx<'_>) -> ControlFlow<T, T>,
    ) -> T {
        self.activate_pending(hook);

        let mut acc = init;
        for handle in &self.buckets[hook.index()] {
            let Some(instance) = self.slots.get_mut(handle.index()).and_then(Option::as_mut) else {
                continue;
            };
            let (module, cx) = instance.split();
            match step(acc, module, &cx) {
                ControlFlow::Continue(next) => acc = next,
                ControlFlow::Break(done) => return done,
            }
        }
        acc
    }

    fn for_each(&mut self, hook: HookKind, mut call: impl FnMut(&mut dyn Capability, &HookCx<'_>)) {
        self.fold(hook, (), |(), module, cx| {
            call(module, cx);
            ControlFlow::Continue(())
        })
    }

    /// AND with short-circuit on the first `false`.
    fn all(&mut self, hook: HookKind, mut call: impl FnMut(&mut dyn Capability, &HookCx<'_>) -> bool) -> bool {
        self.fold(hook, true, |_, module, cx| {
            if call(module, cx) {
                ControlFlow::Continue(true)
            } else {
                ControlFlow::Break(false)
            }
        })
    }

    /// AND where every implementor is still called.
    fn all_exhaustive(
        &mut self,
        hook: HookKind,
        mut call: impl FnMut(&mut dyn Capability, &HookCx<'_>) -> bool,
    ) -> bool {
        self.fold(hook, true, |acc, module, cx| ControlFlow::Continue(call(module, cx) && acc))
    }

    /// OR with short-circuit on the first `true`.
    fn any(&mut self, hook: HookKind, mut call: impl FnMut(&mut dyn Capability, &HookCx<'_>) -> bool) -> bool {
        self.fold(hook, false, |_, module, cx| {
            if call(module, cx) {
                ControlFlow::Break(true)
            } else {
                ControlFlow::Continue(false)
            }
        })
    }

    /// Tri-state: any deny wins, any allow beats no opinion.
    fn verdict(
        &mut self,
        hook: HookKind,
        mut call: impl FnMut(&mut dyn Capability, &HookCx<'_>) -> Option<bool>,
    ) -> Option<bool> {
        self.fold(hook, None, |acc, module, cx| match call(module, cx) {
            Some(false) => ControlFlow::Break(Some(false)),
            Some(true) => ControlFlow::Continue(Some(true)),
            None => ControlFlow::Continue(acc),
        })
    }

    fn product(&mut self, hook: HookKind, mut call: impl FnMut(&mut dyn Capability, &HookCx<'_>) -> f32) -> f32 {
        self.fold(hook, 1.0, |acc, module, cx| ControlFlow::Continue(acc * call(module, cx)))
    }

    fn combine<T: crate::stat::Combine>(
        &mut self,
        hook: HookKind,
        mut call: impl FnMut(&mut dyn Capability, &HookCx<'_>) -> T,
    ) -> T {
        self.fold(hook, T::identity(), |acc, module, cx| {
            ControlFlow::Continue(acc.combine(call(module, cx)))
        })
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn singleton_handle(&self, id: &CapabilityId) -> Option<InstanceHandle> {
        self.singletons.get(id).copied()
    }

    pub fn instance(&self, handle: InstanceHandle) -> Option<&CapabilityInstance> {
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    /// The singleton module for `id`, for state queries outside dispatch.
    pub fn get_singleton(&self, id: &CapabilityId) -> Option<&dyn Capability> {
        let handle = self.singleton_handle(id)?;
        self.instance(handle).map(CapabilityInstance::module)
    }

    /// Typed access to a singleton module.
    pub fn get_singleton_as<T: Capability>(&self, id: &CapabilityId) -> Option<&T> {
        self.get_singleton(id)?.as_any().downcast_ref::<T>()
    }

    pub fn get_singleton_mut_as<T: Capability>(&mut self, id: &CapabilityId) -> Option<&mut T> {
        let handle = self.singleton_handle(id)?;
        self.slots
            .get_mut(handle.index())
            .and_then(Option::as_mut)?
            .module_mut()
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Display lines of a singleton, empty if it is unknown.
    pub fn describe(&self, id: &CapabilityId, detailed: bool) -> Vec<String> {
        self.singleton_handle(id)
            .and_then(|handle| self.instance(handle))
            .map(|instance| {
                let (module, cx) = instance.view();
                module.describe(&cx, detailed)
            })
            .unwrap_or_default()
    }

    pub fn is_active(&self, handle: InstanceHandle) -> bool {
        self.instance(handle).is_some_and(CapabilityInstance::is_active)
    }

    pub fn attachment_view(&self, handle: InstanceHandle) -> &[ActiveAttachment] {
        self.instance(handle)
            .map(CapabilityInstance::attachments)
            .unwrap_or_default()
    }

    pub fn bucket(&self, hook: HookKind) -> &[InstanceHandle] {
        &self.buckets[hook.index()]
    }

    pub fn bucket_contains(&self, hook: HookKind, handle: InstanceHandle) -> bool {
        self.buckets[hook.index()].contains(&handle)
    }

    /// True if `handle` sits in any bucket.
    pub fn in_any_bucket(&self, handle: InstanceHandle) -> bool {
        self.buckets.iter().any(|bucket| bucket.contains(&handle))
    }

    pub fn multi_instance(&self, id: &CapabilityId, origin: ObjectKey) -> Option<InstanceHandle> {
        self.multi.get(&(id.clone(), origin)).copied()
    }

    pub fn live_multi_instances(&self) -> impl Iterator<Item = (&CapabilityId, ObjectKey, InstanceHandle)> + '_ {
        self.multi.iter().map(|((id, origin), handle)| (id, *origin, *handle))
    }

    pub fn singleton_count(&self) -> usize {
        self.singletons.len()
    }
}

impl std::fmt::Debug for CapabilityDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityDispatcher")
            .field("entity", &self.entity)
            .field("singletons", &self.singletons.len())
            .field("multi_instances", &self.multi.len())
            .finish_non_exhaustive()
    }
}

/// Bucket removal, then the callback, then the flag.
fn deactivate(buckets: &mut [Vec<InstanceHandle>], handle: InstanceHandle, instance: &mut CapabilityInstance) {
    for bucket in buckets.iter_mut() {
        bucket.retain(|entry| *entry != handle);
    }
    let (module, cx) = instance.split();
    module.on_deactivate(&cx);
    instance.set_active(false);
}
