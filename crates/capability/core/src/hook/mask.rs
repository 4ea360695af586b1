//! Bitset over hook ordinals.

use strum::EnumCount;

use super::HookKind;

const WORDS: usize = 2;

/// Records which hooks a capability type implements, and which of those must
/// not trigger lazy activation.
///
/// Two parallel bitsets of [`HookMask::CAPACITY`] bits each. The mask is a
/// property of a capability *type*: instances copy it at creation and never
/// change it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HookMask {
    implemented: [u64; WORDS],
    no_auto_activate: [u64; WORDS],
}

const _: () = assert!(HookKind::COUNT <= HookMask::CAPACITY);

impl HookMask {
    pub const EMPTY: Self = Self {
        implemented: [0; WORDS],
        no_auto_activate: [0; WORDS],
    };

    /// Number of hook ordinals the mask can address.
    pub const CAPACITY: usize = WORDS * 64;

    #[inline]
    const fn locate(hook: HookKind) -> (usize, u64) {
        let index = hook.index();
        (index / 64, 1u64 << (index % 64))
    }

    /// Returns true if the type implements `hook`.
    #[inline]
    pub const fn has(&self, hook: HookKind) -> bool {
        let (word, bit) = Self::locate(hook);
        self.implemented[word] & bit != 0
    }

    /// Returns true if `hook` is implemented but exempt from lazy activation.
    #[inline]
    pub const fn is_no_auto_activate(&self, hook: HookKind) -> bool {
        let (word, bit) = Self::locate(hook);
        self.no_auto_activate[word] & bit != 0
    }

    /// Returns a copy with `hook` marked implemented.
    #[must_use]
    pub const fn with(mut self, hook: HookKind, no_auto_activate: bool) -> Self {
        let (word, bit) = Self::locate(hook);
        self.implemented[word] |= bit;
        if no_auto_activate {
            self.no_auto_activate[word] |= bit;
        }
        self
    }

    pub const fn is_empty(&self) -> bool {
        let mut word = 0;
        while word < WORDS {
            if self.implemented[word] != 0 {
                return false;
            }
            word += 1;
        }
        true
    }

    /// Number of implemented hooks.
    pub fn len(&self) -> usize {
        self.implemented
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }

    /// Iterates implemented hooks in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = HookKind> + '_ {
        (0..HookKind::COUNT)
            .filter_map(HookKind::from_index)
            .filter(|hook| self.has(*hook))
    }
}

impl FromIterator<HookKind> for HookMask {
    fn from_iter<I: IntoIterator<Item = HookKind>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::EMPTY, |mask, hook| mask.with(hook, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mask_has_nothing() {
        let mask = HookMask::EMPTY;
        assert!(mask.is_empty());
        assert!(!mask.has(HookKind::ResetEffects));
        assert!(!mask.is_no_auto_activate(HookKind::ResetEffects));
    }

    #[test]
    fn bits_in_both_words() {
        // OnActivateKeyUp sits past ordinal 64
        assert!(HookKind::OnActivateKeyUp.index() >= 64);

        let mask = HookMask::EMPTY
            .with(HookKind::PreUpdate, true)
            .with(HookKind::OnActivateKeyUp, false);

        assert!(mask.has(HookKind::PreUpdate));
        assert!(mask.is_no_auto_activate(HookKind::PreUpdate));
        assert!(mask.has(HookKind::OnActivateKeyUp));
        assert!(!mask.is_no_auto_activate(HookKind::OnActivateKeyUp));
        assert!(!mask.has(HookKind::OnActivateKeyDown));
        assert_eq!(mask.len(), 2);
        assert_eq!(
            mask.iter().collect::<Vec<_>>(),
            vec![HookKind::PreUpdate, HookKind::OnActivateKeyUp]
        );
    }

    #[test]
    fn with_is_an_immutable_update() {
        let base = HookMask::EMPTY.with(HookKind::CanHitNpc, false);
        let extended = base.with(HookKind::Shoot, false);

        assert!(!base.has(HookKind::Shoot));
        assert!(extended.has(HookKind::Shoot));
        assert!(extended.has(HookKind::CanHitNpc));
    }
}
