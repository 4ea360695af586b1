//! Attach / detach / list over entities and tracked objects.
//!
//! Object edits made by a replication authority mark the object's identity
//! dirty so the next broadcast carries the new list. Entity-level lists are
//! persisted with the entity and never broadcast.

use tracing::debug;

use crate::capability::CapabilityId;
use crate::context::CapabilityContext;
use crate::error::AttachError;
use crate::object::TrackedObject;

use super::AttachmentRecord;

fn mark_dirty(ctx: &CapabilityContext, object: &TrackedObject) {
    if !ctx.role().broadcasts() {
        return;
    }
    if let Some(identity) = object.identity() {
        ctx.dirty().mark(identity);
    }
}

/// Appends `record` to an individually-identified object, assigning the
/// object an identity if it has none yet.
///
/// # Errors
///
/// [`AttachError::NotAttachable`] when the object stacks (or is air), and
/// [`AttachError::Identity`] when no identity can be allocated for it.
pub fn attach_to_object(
    ctx: &CapabilityContext,
    object: &mut TrackedObject,
    record: AttachmentRecord,
) -> Result<(), AttachError> {
    if !object.is_attachable() {
        return Err(AttachError::NotAttachable {
            kind: object.kind,
            max_stack: object.max_stack,
        });
    }

    let identity = object.ensure_identity(ctx.identities())?;
    debug!(
        target: "capability::attachment",
        object = %identity,
        capability = %record.capability_id,
        "Attached capability to object"
    );
    object.attachments_mut().push(record);
    mark_dirty(ctx, object);
    Ok(())
}

/// Removes every record for `id` from the object. Returns how many went.
pub fn detach_from_object(
    ctx: &CapabilityContext,
    object: &mut TrackedObject,
    id: &CapabilityId,
) -> usize {
    let attachments = object.attachments_mut();
    let before = attachments.len();
    attachments.retain(|record| record.capability_id != *id);
    let removed = before - attachments.len();

    if removed > 0 {
        debug!(
            target: "capability::attachment",
            object = ?object.identity(),
            capability = %id,
            removed,
            "Detached capability from object"
        );
        mark_dirty(ctx, object);
    }
    removed
}

pub fn attach_to_entity(attachments: &mut Vec<AttachmentRecord>, record: AttachmentRecord) {
    attachments.push(record);
}

pub fn detach_from_entity(attachments: &mut Vec<AttachmentRecord>, id: &CapabilityId) -> usize {
    let before = attachments.len();
    attachments.retain(|record| record.capability_id != *id);
    before - attachments.len()
}

/// Records on `object`; empty for a missing object or air.
pub fn object_attachments(object: Option<&TrackedObject>) -> &[AttachmentRecord] {
    object.map(TrackedObject::attachments).unwrap_or_default()
}

pub fn entity_attachments(attachments: &[AttachmentRecord]) -> &[AttachmentRecord] {
    attachments
}

/// Drops records whose capability id is not in the baked registry.
///
/// # Errors
///
/// [`RegistryError::RegistryNotBaked`](crate::RegistryError::RegistryNotBaked)
/// before bake, since every id would look unknown.
pub fn purge_unknown(ctx: &CapabilityContext, object: &mut TrackedObject) -> Result<usize, AttachError> {
    let registry = ctx.registry();
    if !registry.is_baked() {
        return Err(crate::error::RegistryError::RegistryNotBaked.into());
    }

    let attachments = object.attachments_mut();
    let before = attachments.len();
    attachments.retain(|record| registry.contains(&record.capability_id));
    let removed = before - attachments.len();

    if removed > 0 {
        debug!(
            target: "capability::attachment",
            object = ?object.identity(),
            removed,
            "Purged unknown capabilities"
        );
        mark_dirty(ctx, object);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::attachment::AttachmentData;
    use crate::capability::{Capability, CapabilityManifest};
    use crate::context::ReplicationRole;
    use crate::error::RegistryError;
    use crate::hook::HookKind;
    use crate::identity::ObjectId;
    use crate::registry::CapabilityRegistry;

    #[derive(Default)]
    struct Dash;

    impl Capability for Dash {
        fn manifest(&self) -> CapabilityManifest {
            CapabilityManifest::singleton().hook(HookKind::PostUpdate)
        }
    }

    fn context(role: ReplicationRole) -> CapabilityContext {
        let registry = CapabilityRegistry::new();
        registry.register_type::<Dash>("X:Dash").unwrap();
        registry.bake();
        CapabilityContext::new(Arc::new(registry), role)
    }

    #[test]
    fn stackable_objects_refuse_attachments() {
        let ctx = context(ReplicationRole::Standalone);
        let mut potions = TrackedObject::stackable(9, 30);
        let err = attach_to_object(&ctx, &mut potions, AttachmentRecord::bare("X:Dash")).unwrap_err();
        assert_eq!(err, AttachError::NotAttachable { kind: 9, max_stack: 30 });
        assert_eq!(potions.identity(), None);
    }

    #[test]
    fn authority_edits_mark_the_object_dirty() {
        let ctx = context(ReplicationRole::Authority);
        let mut boots = TrackedObject::new(5);
        attach_to_object(&ctx, &mut boots, AttachmentRecord::bare("X:Dash")).unwrap();
        assert_eq!(boots.identity(), Some(ObjectId(1)));
        assert_eq!(ctx.dirty().consume().into_iter().collect::<Vec<_>>(), vec![ObjectId(1)]);

        assert_eq!(detach_from_object(&ctx, &mut boots, &"x:dash".into()), 1);
        assert!(boots.attachments().is_empty());
        assert_eq!(ctx.dirty().len(), 1);
    }

    #[test]
    fn standalone_edits_stay_local() {
        let ctx = context(ReplicationRole::Standalone);
        let mut boots = TrackedObject::new(5);
        attach_to_object(&ctx, &mut boots, AttachmentRecord::bare("X:Dash")).unwrap();
        assert!(ctx.dirty().is_empty());
    }

    #[test]
    fn entity_detach_removes_every_match() {
        let mut list = Vec::new();
        attach_to_entity(&mut list, AttachmentRecord::bare("X:Dash"));
        attach_to_entity(&mut list, AttachmentRecord::new("X:Dash", AttachmentData::new().with("power", 2)));
        attach_to_entity(&mut list, AttachmentRecord::bare("X:Other"));
        assert_eq!(detach_from_entity(&mut list, &"X:Dash".into()), 2);
        assert_eq!(entity_attachments(&list).len(), 1);
        assert!(object_attachments(None).is_empty());
    }

    #[test]
    fn purge_keeps_only_registered_ids() {
        let ctx = context(ReplicationRole::Authority);
        let mut ring = TrackedObject::new(11);
        attach_to_object(&ctx, &mut ring, AttachmentRecord::bare("X:Dash")).unwrap();
        attach_to_object(&ctx, &mut ring, AttachmentRecord::bare("Gone:Blink")).unwrap();
        ctx.dirty().consume();

        assert_eq!(purge_unknown(&ctx, &mut ring).unwrap(), 1);
        assert_eq!(ring.attachments().len(), 1);
        assert_eq!(ctx.dirty().len(), 1);

        let unbaked = CapabilityContext::new(Arc::new(CapabilityRegistry::new()), ReplicationRole::Standalone);
        assert_eq!(
            purge_unknown(&unbaked, &mut ring).unwrap_err(),
            AttachError::Registry(RegistryError::RegistryNotBaked)
        );
    }
}
