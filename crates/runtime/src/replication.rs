//! Attachment replication messages.
//!
//! The authority side drains the dirty set once per broadcast interval and
//! sends one [`AttachmentSync`] per changed object. The remote side adopts
//! the list and the identity verbatim so both views agree.
use capability_core::{AttachmentRecord, CapabilityContext, ObjectId, TrackedObject};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::PersistenceError;

/// Full attachment list of one identified object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttachmentSync {
    pub identity: ObjectId,
    pub attachments: Vec<AttachmentRecord>,
}

impl AttachmentSync {
    /// Snapshot of `object`, or `None` if it has no identity yet.
    pub fn capture(object: &TrackedObject) -> Option<Self> {
        Some(Self {
            identity: object.identity()?,
            attachments: object.attachments().to_vec(),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, PersistenceError> {
        bincode::serialize(self).map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PersistenceError> {
        bincode::deserialize(bytes).map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    /// Writes the identity and list into `object` regardless of what it held.
    ///
    /// Used when the receiving side is materializing the object from the
    /// message itself. An identity the allocator rejects leaves `object`
    /// untouched.
    pub fn apply_to(
        &self,
        ctx: &CapabilityContext,
        object: &mut TrackedObject,
    ) -> Result<(), PersistenceError> {
        object.restore_identity(self.identity, ctx.identities())?;
        object.replace_attachments(self.attachments.clone());
        Ok(())
    }
}

/// Replaces the attachments of whichever object carries `message.identity`.
///
/// Returns `Ok(false)` when none of `objects` matches.
pub fn apply_sync<'a, I>(
    ctx: &CapabilityContext,
    objects: I,
    message: &AttachmentSync,
) -> Result<bool, PersistenceError>
where
    I: IntoIterator<Item = &'a mut TrackedObject>,
{
    let target = objects
        .into_iter()
        .find(|object| object.identity() == Some(message.identity));

    match target {
        Some(object) => {
            message.apply_to(ctx, object)?;
            debug!(
                target: "runtime::replication",
                identity = %message.identity,
                attachments = message.attachments.len(),
                "Applied attachment sync"
            );
            Ok(true)
        }
        None => {
            trace!(
                target: "runtime::replication",
                identity = %message.identity,
                "No local object for attachment sync"
            );
            Ok(false)
        }
    }
}
