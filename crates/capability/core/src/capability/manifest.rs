//! Declarative description of what a capability type implements.

use crate::hook::{HookKind, HookMask};

/// How many instances of a capability type an entity may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Multiplicity {
    /// One long-lived instance per entity, however many attachments grant it.
    #[default]
    Singleton,
    /// One pooled instance per `(capability id, object identity)` pair.
    MultiInstance,
}

/// Hooks and multiplicity a capability type declares at registration.
///
/// Read once from a prototype during bake; the resulting mask is frozen into
/// the type descriptor.
///
/// # Example
/// ```
/// # use capability_core::{CapabilityManifest, HookKind, Multiplicity};
/// let manifest = CapabilityManifest::singleton()
///     .hook(HookKind::OnActivateKeyDown)
///     .hook_no_auto(HookKind::PreUpdate);
///
/// assert_eq!(manifest.multiplicity(), Multiplicity::Singleton);
/// assert!(manifest.hooks().is_no_auto_activate(HookKind::PreUpdate));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CapabilityManifest {
    multiplicity: Multiplicity,
    hooks: HookMask,
}

impl CapabilityManifest {
    pub const fn singleton() -> Self {
        Self {
            multiplicity: Multiplicity::Singleton,
            hooks: HookMask::EMPTY,
        }
    }

    pub const fn multi_instance() -> Self {
        Self {
            multiplicity: Multiplicity::MultiInstance,
            hooks: HookMask::EMPTY,
        }
    }

    /// Declares an implemented hook that may trigger lazy activation.
    #[must_use]
    pub const fn hook(mut self, hook: HookKind) -> Self {
        self.hooks = self.hooks.with(hook, false);
        self
    }

    /// Declares an implemented hook that must run without triggering
    /// activation (e.g. bookkeeping that also runs while dormant).
    #[must_use]
    pub const fn hook_no_auto(mut self, hook: HookKind) -> Self {
        self.hooks = self.hooks.with(hook, true);
        self
    }

    #[must_use]
    pub fn hooks_from(mut self, hooks: impl IntoIterator<Item = HookKind>) -> Self {
        for hook in hooks {
            self.hooks = self.hooks.with(hook, false);
        }
        self
    }

    pub const fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    pub const fn hooks(&self) -> HookMask {
        self.hooks
    }
}
