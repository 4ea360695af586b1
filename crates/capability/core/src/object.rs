//! Individually-identified objects that can carry attachments.

use crate::attachment::AttachmentRecord;
use crate::error::IdentityError;
use crate::identity::{IdentityAllocator, ObjectId};

/// An inventory object as the capability layer sees it.
///
/// `kind == 0` or `stack == 0` is "air": an empty slot that lists no
/// attachments.
#[derive(Debug, PartialEq)]
pub struct TrackedObject {
    pub kind: u32,
    pub stack: u32,
    pub max_stack: u32,
    identity: Option<ObjectId>,
    attachments: Vec<AttachmentRecord>,
}

impl TrackedObject {
    /// A single, unstackable object of `kind`.
    pub fn new(kind: u32) -> Self {
        Self::stackable(kind, 1)
    }

    pub fn stackable(kind: u32, max_stack: u32) -> Self {
        Self {
            kind,
            stack: 1,
            max_stack,
            identity: None,
            attachments: Vec::new(),
        }
    }

    /// Rebuilds an object from persisted or replicated parts.
    pub fn from_parts(
        kind: u32,
        stack: u32,
        max_stack: u32,
        identity: Option<ObjectId>,
        attachments: Vec<AttachmentRecord>,
    ) -> Self {
        Self {
            kind,
            stack,
            max_stack,
            identity,
            attachments,
        }
    }

    pub fn air() -> Self {
        Self::from_parts(0, 0, 0, None, Vec::new())
    }

    pub fn is_air(&self) -> bool {
        self.kind == 0 || self.stack == 0
    }

    /// Attachments only make sense on objects that never stack.
    pub fn is_attachable(&self) -> bool {
        self.max_stack == 1
    }

    pub fn identity(&self) -> Option<ObjectId> {
        self.identity
    }

    /// Assigns an identity on first use.
    pub fn ensure_identity(
        &mut self,
        allocator: &IdentityAllocator,
    ) -> Result<ObjectId, IdentityError> {
        if let Some(id) = self.identity {
            return Ok(id);
        }
        let id = allocator.allocate()?;
        self.identity = Some(id);
        Ok(id)
    }

    /// Adopts an identity received from persistence or replication.
    ///
    /// On error the object keeps whatever identity it had.
    pub fn restore_identity(
        &mut self,
        id: ObjectId,
        allocator: &IdentityAllocator,
    ) -> Result<(), IdentityError> {
        self.identity = Some(allocator.restore(id)?);
        Ok(())
    }

    /// Attachment list; empty for air.
    pub fn attachments(&self) -> &[AttachmentRecord] {
        if self.is_air() {
            &[]
        } else {
            &self.attachments
        }
    }

    pub(crate) fn attachments_mut(&mut self) -> &mut Vec<AttachmentRecord> {
        &mut self.attachments
    }

    /// Replaces the attachment list wholesale (replication inbox).
    pub fn replace_attachments(&mut self, attachments: Vec<AttachmentRecord>) {
        self.attachments = attachments;
    }
}

/// A clone is a logically distinct object: it gets no identity until it
/// needs one, and its own copy of the attachments.
impl Clone for TrackedObject {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            stack: self.stack,
            max_stack: self.max_stack,
            identity: None,
            attachments: self.attachments.clone(),
        }
    }
}

impl Default for TrackedObject {
    fn default() -> Self {
        Self::air()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_get_their_own_identity() {
        let ids = IdentityAllocator::new();
        let mut sword = TrackedObject::new(42);
        let original = sword.ensure_identity(&ids).unwrap();
        assert_eq!(sword.ensure_identity(&ids), Ok(original));

        let mut copy = sword.clone();
        assert_eq!(copy.identity(), None);
        let copied = copy.ensure_identity(&ids).unwrap();
        assert_ne!(copied, original);

        // Both ids reload without colliding with later allocations.
        let reloaded = IdentityAllocator::new();
        let mut a = TrackedObject::new(42);
        let mut b = TrackedObject::new(42);
        a.restore_identity(original, &reloaded).unwrap();
        b.restore_identity(copied, &reloaded).unwrap();
        let fresh = reloaded.allocate().unwrap();
        assert!(fresh > original && fresh > copied);
    }

    #[test]
    fn air_lists_nothing() {
        let mut air = TrackedObject::air();
        air.replace_attachments(vec![AttachmentRecord::bare("X:Dash")]);
        assert!(air.attachments().is_empty());
        assert!(!TrackedObject::stackable(7, 999).is_attachable());
    }
}
