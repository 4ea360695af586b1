//! Attachment-driven capability dispatch.
//!
//! `capability-core` lets a host compose behavior onto entities and onto
//! individually-identified objects without the host knowing any specific
//! behavior. Capability types register once into a [`CapabilityRegistry`],
//! get baked into immutable descriptors, and are then bound per entity by a
//! [`CapabilityDispatcher`] according to the [`AttachmentRecord`]s that the
//! entity and its objects carry.
//!
//! Shared state (registry, instance pool, identity allocator, dirty set) lives
//! in a [`CapabilityContext`] owned by whatever owns the entity population.
pub mod attachment;
pub mod capability;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod hook;
pub mod identity;
pub mod object;
pub mod pool;
pub mod registry;
pub mod stat;
pub mod sync;
pub mod types;

pub use attachment::{
    ActiveAttachment, AttachmentContext, AttachmentData, AttachmentRecord, OwnerKind, TagValue,
    attach_to_entity, attach_to_object, detach_from_entity, detach_from_object,
    entity_attachments, object_attachments, purge_unknown,
};
pub use capability::{
    AsAny, Capability, CapabilityId, CapabilityManifest, HookCx, Multiplicity, capability_id_for,
};
pub use context::{CapabilityContext, ReplicationRole};
pub use dispatcher::{AttachmentSource, CapabilityDispatcher, InstanceHandle, ObjectKey};
pub use error::{AttachError, CapabilityError, ErrorSeverity, IdentityError, RegistryError};
pub use hook::{
    DamageSource, HitInfo, HitModifiers, HookKind, HookMask, HurtInfo, HurtModifiers, ItemRef,
    KillContext, ManaCost, MaxStats, NpcRef, ProjectileRef, ShootStats, TriggerSet, Victim,
};
pub use identity::{IdentityAllocator, ObjectId};
pub use object::TrackedObject;
pub use pool::{CapabilityInstance, InstancePool};
pub use registry::{CapabilityDescriptor, CapabilityFactory, CapabilityRegistry};
pub use stat::{Combine, StatModifier};
pub use sync::DirtySet;
pub use types::{EntityId, Rect, Vec2};
