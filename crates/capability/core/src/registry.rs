//! Capability type registry.
//!
//! Types are registered during a fixed startup phase and then baked. Baking
//! instantiates one prototype per type, reads its [`CapabilityManifest`] and
//! freezes the resulting descriptors. After bake the registry is read-only and
//! lookups are lock-free.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::capability::{Capability, CapabilityId, CapabilityManifest, Multiplicity};
use crate::error::RegistryError;
use crate::hook::HookMask;

/// Zero-argument constructor of a capability module.
pub type CapabilityFactory = Arc<dyn Fn() -> Box<dyn Capability> + Send + Sync>;

/// Immutable per-type record produced by bake.
#[derive(Clone)]
pub struct CapabilityDescriptor {
    id: CapabilityId,
    factory: CapabilityFactory,
    hook_mask: HookMask,
    multiplicity: Multiplicity,
}

impl CapabilityDescriptor {
    pub fn id(&self) -> &CapabilityId {
        &self.id
    }

    pub fn hook_mask(&self) -> HookMask {
        self.hook_mask
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    pub fn is_singleton(&self) -> bool {
        self.multiplicity == Multiplicity::Singleton
    }

    /// Builds a fresh module through the registered factory.
    pub fn instantiate(&self) -> Box<dyn Capability> {
        (self.factory)()
    }
}

impl fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("id", &self.id)
            .field("hook_mask", &self.hook_mask)
            .field("multiplicity", &self.multiplicity)
            .finish_non_exhaustive()
    }
}

/// Registry of capability types for one process-scoped context.
///
/// Registration and bake take `&self` so the registry can live behind an
/// `Arc` shared by every entity's dispatcher.
#[derive(Default)]
pub struct CapabilityRegistry {
    pending: Mutex<Vec<(CapabilityId, CapabilityFactory)>>,
    baked: OnceLock<BTreeMap<CapabilityId, Arc<CapabilityDescriptor>>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability type under `id`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::EmptyCapabilityId`] for a blank id
    /// - [`RegistryError::RegistrationClosed`] after [`bake`](Self::bake)
    /// - [`RegistryError::DuplicateCapabilityId`] if `id` (compared
    ///   case-insensitively) is already registered; the first registration stays
    pub fn register<F>(&self, id: impl Into<CapabilityId>, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn Capability> + Send + Sync + 'static,
    {
        let id = id.into();
        if id.is_empty() {
            return Err(RegistryError::EmptyCapabilityId);
        }

        let mut pending = self.pending.lock();
        if self.baked.get().is_some() {
            return Err(RegistryError::RegistrationClosed { id });
        }
        if pending.iter().any(|(existing, _)| *existing == id) {
            return Err(RegistryError::DuplicateCapabilityId { id });
        }

        debug!(
            target: "capability::registry",
            capability = %id,
            "Registered capability type"
        );
        pending.push((id, Arc::new(factory)));
        Ok(())
    }

    /// Registers `T` using its [`Default`] impl as the factory.
    pub fn register_type<T>(&self, id: impl Into<CapabilityId>) -> Result<(), RegistryError>
    where
        T: Capability + Default + 'static,
    {
        self.register(id, || Box::new(T::default()) as Box<dyn Capability>)
    }

    /// Closes registration and compiles descriptors. Calling it again is a no-op.
    pub fn bake(&self) {
        let pending = self.pending.lock();
        if self.baked.get().is_some() {
            return;
        }

        let table: BTreeMap<_, _> = pending
            .iter()
            .map(|(id, factory)| {
                let manifest: CapabilityManifest = factory().manifest();
                let descriptor = CapabilityDescriptor {
                    id: id.clone(),
                    factory: Arc::clone(factory),
                    hook_mask: manifest.hooks(),
                    multiplicity: manifest.multiplicity(),
                };
                debug!(
                    target: "capability::registry",
                    capability = %id,
                    multiplicity = %descriptor.multiplicity,
                    hooks = descriptor.hook_mask.len(),
                    "Compiled capability descriptor"
                );
                (id.clone(), Arc::new(descriptor))
            })
            .collect();

        let singletons = table.values().filter(|d| d.is_singleton()).count();
        info!(
            target: "capability::registry",
            types = table.len(),
            singletons,
            multi_instance = table.len() - singletons,
            "Capability registry baked"
        );

        if self.baked.set(table).is_err() {
            warn!(
                target: "capability::registry",
                "Registry was baked elsewhere; keeping the first table"
            );
        }
    }

    pub fn is_baked(&self) -> bool {
        self.baked.get().is_some()
    }

    fn table(&self) -> Result<&BTreeMap<CapabilityId, Arc<CapabilityDescriptor>>, RegistryError> {
        self.baked.get().ok_or(RegistryError::RegistryNotBaked)
    }

    /// Descriptor for `id`, or `None` for ids never registered.
    pub fn get_type_descriptor(
        &self,
        id: &CapabilityId,
    ) -> Result<Option<Arc<CapabilityDescriptor>>, RegistryError> {
        Ok(self.table()?.get(id).cloned())
    }

    /// Every descriptor, ordered by id.
    pub fn get_all_descriptors(&self) -> Result<Vec<Arc<CapabilityDescriptor>>, RegistryError> {
        Ok(self.table()?.values().cloned().collect())
    }

    /// True when `id` names a baked type. False before bake.
    pub fn contains(&self, id: &CapabilityId) -> bool {
        self.baked.get().is_some_and(|table| table.contains_key(id))
    }

    /// Number of registered types, baked or not.
    pub fn len(&self) -> usize {
        match self.baked.get() {
            Some(table) => table.len(),
            None => self.pending.lock().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("baked", &self.is_baked())
            .field("types", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::HookKind;

    #[derive(Default)]
    struct Dash;

    impl Capability for Dash {
        fn manifest(&self) -> CapabilityManifest {
            CapabilityManifest::singleton()
                .hook(HookKind::PostUpdate)
                .hook_no_auto(HookKind::ResetEffects)
        }
    }

    #[derive(Default)]
    struct Flame;

    impl Capability for Flame {
        fn manifest(&self) -> CapabilityManifest {
            CapabilityManifest::multi_instance().hook(HookKind::OnHitNpc)
        }
    }

    #[test]
    fn duplicate_ids_are_rejected_case_insensitively() {
        let registry = CapabilityRegistry::new();
        registry.register_type::<Dash>("X:Dash").unwrap();

        let err = registry.register_type::<Flame>("x:dash").unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateCapabilityId { .. }));

        registry.bake();
        let descriptor = registry
            .get_type_descriptor(&CapabilityId::new("X:DASH"))
            .unwrap()
            .unwrap();
        assert!(descriptor.is_singleton());
        assert_eq!(descriptor.id().as_str(), "X:Dash");
    }

    #[test]
    fn registration_closes_after_bake() {
        let registry = CapabilityRegistry::new();
        registry.bake();
        let err = registry.register_type::<Dash>("X:Dash").unwrap_err();
        assert!(matches!(err, RegistryError::RegistrationClosed { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn queries_fail_before_bake() {
        let registry = CapabilityRegistry::new();
        registry.register_type::<Dash>("X:Dash").unwrap();
        assert_eq!(
            registry.get_all_descriptors().unwrap_err(),
            RegistryError::RegistryNotBaked
        );
        assert!(registry.get_type_descriptor(&"X:Dash".into()).is_err());
        assert!(!registry.contains(&"X:Dash".into()));
    }

    #[test]
    fn empty_id_is_rejected() {
        let registry = CapabilityRegistry::new();
        assert_eq!(
            registry.register_type::<Dash>("  ").unwrap_err(),
            RegistryError::EmptyCapabilityId
        );
    }

    #[test]
    fn bake_is_idempotent_and_reads_manifests() {
        let registry = CapabilityRegistry::new();
        registry.register_type::<Flame>("X:Flame").unwrap();
        registry.register_type::<Dash>("X:Dash").unwrap();
        registry.bake();

        let first: Vec<_> = registry
            .get_all_descriptors()
            .unwrap()
            .iter()
            .map(|d| (d.id().clone(), d.hook_mask(), d.multiplicity()))
            .collect();
        registry.bake();
        let second: Vec<_> = registry
            .get_all_descriptors()
            .unwrap()
            .iter()
            .map(|d| (d.id().clone(), d.hook_mask(), d.multiplicity()))
            .collect();
        assert_eq!(first, second);

        // Sorted by id.
        assert_eq!(first[0].0.as_str(), "X:Dash");
        let dash_mask = first[0].1;
        assert!(dash_mask.has(HookKind::PostUpdate));
        assert!(dash_mask.is_no_auto_activate(HookKind::ResetEffects));
        assert!(!dash_mask.is_no_auto_activate(HookKind::PostUpdate));
        assert_eq!(first[1].2, Multiplicity::MultiInstance);
    }

    #[test]
    fn concurrent_bakes_publish_one_table() {
        let registry = Arc::new(CapabilityRegistry::new());
        registry.register_type::<Flame>("X:Flame").unwrap();

        let seen: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.bake();
                    registry
                        .get_type_descriptor(&"X:Flame".into())
                        .unwrap()
                        .unwrap()
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert!(seen.iter().all(|descriptor| Arc::ptr_eq(descriptor, &seen[0])));
        assert_eq!(registry.len(), 1);
    }
}
