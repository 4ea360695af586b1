//! Durable attachment records and their opaque configuration blob.

use std::collections::BTreeMap;

use crate::capability::CapabilityId;

/// A single value inside an [`AttachmentData`] blob.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<TagValue>),
    Compound(AttachmentData),
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

impl From<i32> for TagValue {
    fn from(value: i32) -> Self {
        TagValue::Int(i64::from(value))
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        TagValue::Float(value)
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Str(value.to_owned())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Str(value)
    }
}

impl From<AttachmentData> for TagValue {
    fn from(value: AttachmentData) -> Self {
        TagValue::Compound(value)
    }
}

/// Module-defined configuration carried by an attachment.
///
/// The core never interprets it; it is persisted and replicated verbatim and
/// handed to the capability's activation gate and hooks.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AttachmentData {
    entries: BTreeMap<String, TagValue>,
}

impl AttachmentData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Option<TagValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<TagValue> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            TagValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            TagValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Reads a float, widening integers.
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            TagValue::Float(value) => Some(*value),
            TagValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            TagValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

/// A `(capability id, configuration)` pair owned by an entity or object.
///
/// Created by attach, removed by detach, and otherwise only changed by
/// replacing `data`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttachmentRecord {
    pub capability_id: CapabilityId,
    pub data: AttachmentData,
}

impl AttachmentRecord {
    pub fn new(capability_id: impl Into<CapabilityId>, data: AttachmentData) -> Self {
        Self {
            capability_id: capability_id.into(),
            data,
        }
    }

    /// Record with empty configuration.
    pub fn bare(capability_id: impl Into<CapabilityId>) -> Self {
        Self::new(capability_id, AttachmentData::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_reject_mismatched_values() {
        let data = AttachmentData::new()
            .with("charges", 3)
            .with("ratio", 0.5)
            .with("label", "siphon")
            .with("enabled", true);

        assert_eq!(data.get_int("charges"), Some(3));
        assert_eq!(data.get_float("charges"), Some(3.0));
        assert_eq!(data.get_float("ratio"), Some(0.5));
        assert_eq!(data.get_str("label"), Some("siphon"));
        assert_eq!(data.get_bool("enabled"), Some(true));
        assert_eq!(data.get_int("label"), None);
        assert_eq!(data.get_bool("missing"), None);
    }

    #[test]
    fn records_compare_ids_case_insensitively() {
        let a = AttachmentRecord::bare("Aba:MagicalDash");
        let b = AttachmentRecord::bare("aba:magicaldash");
        assert_eq!(a, b);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn nested_data_survives_bincode() {
        let record = AttachmentRecord::new(
            "Aba:Siphon",
            AttachmentData::new()
                .with("ratio", 0.25)
                .with("inner", AttachmentData::new().with("tier", 2))
                .with("tags", TagValue::List(vec!["fire".into(), 3.into()])),
        );

        let bytes = bincode::serialize(&record).unwrap();
        let decoded: AttachmentRecord = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.capability_id.as_str(), "Aba:Siphon");
    }
}
