//! Case-insensitive capability identifiers.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Globally unique, case-insensitive identifier of a capability type.
///
/// By convention ids read `"Namespace:TypeName"`. The original spelling is
/// kept for display and persistence; equality, ordering and hashing use the
/// lowercase form. Cloning is a reference-count bump.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub struct CapabilityId {
    display: Arc<str>,
    key: Arc<str>,
}

impl CapabilityId {
    pub fn new(id: impl AsRef<str>) -> Self {
        let display: Arc<str> = Arc::from(id.as_ref());
        let lowered = display.to_lowercase();
        let key = if *lowered == *display {
            Arc::clone(&display)
        } else {
            Arc::from(lowered)
        };
        Self { display, key }
    }

    /// Id as originally spelled.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Lowercase lookup key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_empty(&self) -> bool {
        self.display.trim().is_empty()
    }

    /// Namespace part before the first `:`, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.display.split_once(':').map(|(namespace, _)| namespace)
    }
}

/// Builds the conventional `"namespace:TypeName"` id for a Rust type.
pub fn capability_id_for<T: ?Sized>(namespace: &str) -> CapabilityId {
    let full = core::any::type_name::<T>();
    let short = full.rsplit("::").next().unwrap_or(full);
    CapabilityId::new(format!("{namespace}:{short}"))
}

impl PartialEq for CapabilityId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for CapabilityId {}

impl PartialOrd for CapabilityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CapabilityId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Hash for CapabilityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Lets maps keyed by `CapabilityId` be queried with a lowercase `&str`.
impl Borrow<str> for CapabilityId {
    fn borrow(&self) -> &str {
        &self.key
    }
}

impl core::fmt::Debug for CapabilityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", &*self.display)
    }
}

impl core::fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.display)
    }
}

impl From<&str> for CapabilityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CapabilityId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&CapabilityId> for CapabilityId {
    fn from(value: &CapabilityId) -> Self {
        value.clone()
    }
}

impl From<CapabilityId> for String {
    fn from(value: CapabilityId) -> Self {
        value.display.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MagicalDash;

    #[test]
    fn equality_ignores_case_but_display_keeps_it() {
        let a = CapabilityId::new("Aba:MagicalDash");
        let b = CapabilityId::new("ABA:magicaldash");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Aba:MagicalDash");
        assert_eq!(a.namespace(), Some("Aba"));
    }

    #[test]
    fn map_lookup_by_lowercase_key() {
        let mut map = HashMap::new();
        map.insert(CapabilityId::new("Aba:Siphon"), 1);
        assert_eq!(map.get("aba:siphon"), Some(&1));
        assert_eq!(map.get(&CapabilityId::new("ABA:SIPHON")), Some(&1));
    }

    #[test]
    fn id_for_type_uses_short_name() {
        let id = capability_id_for::<MagicalDash>("Aba");
        assert_eq!(id.as_str(), "Aba:MagicalDash");
    }
}
