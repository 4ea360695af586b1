//! The fixed enumeration of host callback points.

/// One of the host's well-known lifecycle or interaction callback points.
///
/// The discriminant is the hook's ordinal and doubles as its bit index in
/// [`HookMask`](super::HookMask) and its bucket index in the dispatcher.
/// New hooks are appended; existing ordinals never move.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumCount,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::FromRepr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[repr(u8)]
pub enum HookKind {
    // ========================================================================
    // Per-tick lifecycle
    // ========================================================================
    ResetEffects,
    UpdateDead,
    PreUpdate,
    ProcessTriggers,
    SetControls,
    PreUpdateBuffs,
    PostUpdateBuffs,
    UpdateEquips,
    PostUpdateEquips,
    PostUpdateMiscEffects,
    PostUpdateRunSpeeds,
    PreUpdateMovement,
    PostUpdate,
    UpdateLifeRegen,
    UpdateBadLifeRegen,
    NaturalLifeRegen,
    FrameEffects,

    // ========================================================================
    // Damage taken
    // ========================================================================
    FreeDodge,
    ConsumableDodge,
    ModifyHurt,
    OnHurt,
    PostHurt,
    PreKill,
    Kill,
    ModifyHitByNpc,
    OnHitByNpc,
    ModifyHitByProjectile,
    OnHitByProjectile,

    // ========================================================================
    // Damage dealt
    // ========================================================================
    CanHitNpc,
    ModifyHitNpc,
    OnHitNpc,
    CanHitNpcWithItem,
    ModifyHitNpcWithItem,
    OnHitNpcWithItem,
    CanHitNpcWithProjectile,
    ModifyHitNpcWithProjectile,
    OnHitNpcWithProjectile,
    CanHitPvp,
    CanHitPvpWithProjectile,
    OnHitAnything,

    // ========================================================================
    // Item use
    // ========================================================================
    PreItemCheck,
    PostItemCheck,
    UseTimeMultiplier,
    UseAnimationMultiplier,
    UseSpeedMultiplier,
    CanConsumeAmmo,
    OnConsumeAmmo,
    CanShoot,
    ModifyShootStats,
    Shoot,
    MeleeEffects,
    ModifyWeaponDamage,
    ModifyWeaponKnockback,
    ModifyWeaponCrit,
    GetHealLife,
    GetHealMana,
    ModifyManaCost,
    OnMissingMana,
    OnConsumeMana,
    ModifyMaxStats,

    // ========================================================================
    // Input edges (derived by the host from held-key state)
    // ========================================================================
    OnAttackKeyDown,
    WhileAttackKeyDown,
    OnAttackKeyUp,
    OnActivateKeyDown,
    WhileActivateKeyDown,
    OnActivateKeyUp,
}

impl HookKind {
    /// Ordinal of this hook (bit and bucket index).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Looks a hook up by ordinal.
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index).ok().and_then(Self::from_repr)
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::{EnumCount, IntoEnumIterator};

    #[test]
    fn ordinals_are_dense() {
        for (expected, hook) in HookKind::iter().enumerate() {
            assert_eq!(hook.index(), expected);
            assert_eq!(HookKind::from_index(expected), Some(hook));
        }
        assert_eq!(HookKind::from_index(HookKind::COUNT), None);
    }

    #[test]
    fn parses_snake_case_names() {
        assert_eq!("pre_update".parse::<HookKind>(), Ok(HookKind::PreUpdate));
        assert_eq!("CAN_HIT_NPC".parse::<HookKind>(), Ok(HookKind::CanHitNpc));
        assert_eq!(HookKind::OnActivateKeyUp.as_str(), "on_activate_key_up");
    }
}
