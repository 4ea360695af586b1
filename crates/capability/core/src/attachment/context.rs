//! Where an attachment instance came from, as seen by a module instance.

use crate::identity::ObjectId;
use crate::types::EntityId;

use super::AttachmentData;

/// Kind of owner holding an attachment record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OwnerKind {
    EntityOwned,
    ObjectOwned,
}

/// Identifies the origin of an attachment without depending on object
/// storage: the entity it applies to and, for object-owned attachments, the
/// granting object's identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttachmentContext {
    owner_kind: OwnerKind,
    object: Option<ObjectId>,
    entity: EntityId,
}

impl AttachmentContext {
    pub const fn for_entity(entity: EntityId) -> Self {
        Self {
            owner_kind: OwnerKind::EntityOwned,
            object: None,
            entity,
        }
    }

    pub const fn for_object(object: ObjectId, entity: EntityId) -> Self {
        Self {
            owner_kind: OwnerKind::ObjectOwned,
            object: Some(object),
            entity,
        }
    }

    pub const fn owner_kind(&self) -> OwnerKind {
        self.owner_kind
    }

    /// Granting object's identity; `None` for entity-owned attachments.
    pub const fn object(&self) -> Option<ObjectId> {
        self.object
    }

    pub const fn entity(&self) -> EntityId {
        self.entity
    }
}

/// Read-only unit of attachment exposed to a module instance.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveAttachment {
    pub context: AttachmentContext,
    pub data: AttachmentData,
}

impl ActiveAttachment {
    pub fn new(context: AttachmentContext, data: AttachmentData) -> Self {
        Self { context, data }
    }
}
