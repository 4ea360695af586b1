//! Save/load of attachment lists.
//!
//! The binary format is bincode; the JSON form exists for developer tooling.
//! Record order is kept verbatim because singleton gating depends on it.
use std::fs;
use std::path::Path;

use capability_core::{
    AttachmentRecord, CapabilityContext, CapabilityId, EntityId, ObjectId, TrackedObject,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PersistenceError;
use crate::host::EntityHost;

/// Entity-level attachments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySave {
    pub attachments: Vec<AttachmentRecord>,
}

/// Persisted form of a [`TrackedObject`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSave {
    pub kind: u32,
    pub stack: u32,
    pub max_stack: u32,
    #[serde(default)]
    pub identity: Option<ObjectId>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRecord>,
}

impl From<&TrackedObject> for ObjectSave {
    fn from(object: &TrackedObject) -> Self {
        Self {
            kind: object.kind,
            stack: object.stack,
            max_stack: object.max_stack,
            identity: object.identity(),
            attachments: object.attachments().to_vec(),
        }
    }
}

impl ObjectSave {
    /// Rebuilds the object, registering its identity with the allocator.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::Identity`] when the saved identity cannot be
    /// restored.
    pub fn into_object(self, ctx: &CapabilityContext) -> Result<TrackedObject, PersistenceError> {
        let identity = self
            .identity
            .map(|id| ctx.identities().restore(id))
            .transpose()?;
        Ok(TrackedObject::from_parts(
            self.kind,
            self.stack,
            self.max_stack,
            identity,
            self.attachments,
        ))
    }

    fn retain_known(&mut self, is_known: &impl Fn(&CapabilityId) -> bool) -> usize {
        let before = self.attachments.len();
        self.attachments
            .retain(|record| is_known(&record.capability_id));
        before - self.attachments.len()
    }
}

/// Everything one entity host persists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    pub entity: EntityId,
    #[serde(default)]
    pub attachments: EntitySave,
    #[serde(default)]
    pub held: ObjectSave,
    #[serde(default)]
    pub equipment: Vec<ObjectSave>,
    #[serde(default)]
    pub misc: Vec<ObjectSave>,
}

impl SaveFile {
    /// An entity with no attachments and empty slots.
    pub fn empty(entity: EntityId) -> Self {
        Self {
            entity,
            attachments: EntitySave::default(),
            held: ObjectSave::default(),
            equipment: Vec::new(),
            misc: Vec::new(),
        }
    }

    pub fn capture(host: &EntityHost) -> Self {
        Self {
            entity: host.entity(),
            attachments: EntitySave {
                attachments: host.entity_attachments().to_vec(),
            },
            held: ObjectSave::from(host.held()),
            equipment: host.equipment().iter().map(ObjectSave::from).collect(),
            misc: host.misc().iter().map(ObjectSave::from).collect(),
        }
    }

    /// Objects in refresh order.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectSave> + '_ {
        std::iter::once(&self.held)
            .chain(self.equipment.iter())
            .chain(self.misc.iter())
    }

    /// Drops every record whose id `is_known` rejects. Returns the count.
    pub fn retain_known(&mut self, is_known: impl Fn(&CapabilityId) -> bool) -> usize {
        let before = self.attachments.attachments.len();
        self.attachments
            .attachments
            .retain(|record| is_known(&record.capability_id));
        let mut removed = before - self.attachments.attachments.len();

        removed += self.held.retain_known(&is_known);
        for object in self.equipment.iter_mut().chain(self.misc.iter_mut()) {
            removed += object.retain_known(&is_known);
        }
        removed
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    pub fn encode(&self) -> Result<Vec<u8>, PersistenceError> {
        bincode::serialize(self).map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PersistenceError> {
        bincode::deserialize(bytes).map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        serde_json::to_string_pretty(self).map_err(|e| PersistenceError::Json(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, PersistenceError> {
        serde_json::from_str(text).map_err(|e| PersistenceError::Json(e.to_string()))
    }

    /// Writes the bincode form atomically (temp file, then rename).
    pub fn write_to(&self, path: &Path) -> Result<(), PersistenceError> {
        let bytes = self.encode()?;
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, path)?;

        debug!(
            target: "runtime::persistence",
            entity = %self.entity,
            path = %path.display(),
            bytes = bytes.len(),
            "Saved attachments"
        );
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, PersistenceError> {
        let bytes = fs::read(path)?;
        let save = Self::decode(&bytes)?;

        debug!(
            target: "runtime::persistence",
            entity = %save.entity,
            path = %path.display(),
            "Loaded attachments"
        );
        Ok(save)
    }
}

#[cfg(test)]
mod tests {
    use capability_core::AttachmentData;

    use super::*;

    fn sample() -> SaveFile {
        let mut save = SaveFile::empty(EntityId(3));
        save.attachments.attachments = vec![
            AttachmentRecord::bare("Aba:Second"),
            AttachmentRecord::bare("Aba:First"),
        ];
        save.held = ObjectSave {
            kind: 12,
            stack: 1,
            max_stack: 1,
            identity: Some(ObjectId(5)),
            attachments: vec![AttachmentRecord::new(
                "Aba:Siphon",
                AttachmentData::new().with("ratio", 0.25),
            )],
        };
        save
    }

    #[test]
    fn json_keeps_record_order() {
        let save = sample();
        let decoded = SaveFile::from_json(&save.to_json().unwrap()).unwrap();
        assert_eq!(decoded, save);
        assert_eq!(
            decoded.attachments.attachments[0].capability_id.as_str(),
            "Aba:Second"
        );
    }

    #[test]
    fn retain_known_counts_every_removal() {
        let mut save = sample();
        let removed = save.retain_known(|id| id.as_str() == "Aba:First");
        assert_eq!(removed, 2);
        assert_eq!(save.attachments.attachments.len(), 1);
        assert!(save.held.attachments.is_empty());
    }

    #[test]
    fn missing_sections_default_when_reading_json() {
        let save = SaveFile::from_json(r#"{ "entity": 9 }"#).unwrap();
        assert_eq!(save, SaveFile::empty(EntityId(9)));
    }

    #[test]
    fn garbage_is_a_serialization_error() {
        let err = SaveFile::decode(&[0xff, 0x01]).unwrap_err();
        assert!(matches!(err, PersistenceError::Serialization(_)));
    }
}
