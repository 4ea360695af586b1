//! Attachment records, the context a module sees them through, and the API
//! collaborators use to edit them.

mod api;
mod context;
mod record;

pub use api::{
    attach_to_entity, attach_to_object, detach_from_entity, detach_from_object,
    entity_attachments, object_attachments, purge_unknown,
};
pub use context::{ActiveAttachment, AttachmentContext, OwnerKind};
pub use record::{AttachmentData, AttachmentRecord, TagValue};
