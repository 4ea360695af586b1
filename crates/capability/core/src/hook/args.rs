//! Host-neutral argument types passed through hook dispatch.
//!
//! These are plain data snapshots of whatever the host hands to its own
//! callback. The core copies nothing out of them; they exist so a capability
//! can be written once against a stable surface.

use bitflags::bitflags;

use crate::identity::ObjectId;
use crate::stat::{Combine, StatModifier};
use crate::types::{EntityId, Vec2};

/// A non-player combatant as seen by a hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NpcRef {
    /// Host slot index of the NPC.
    pub index: u32,
    /// Host type id of the NPC.
    pub kind: u32,
}

/// A projectile as seen by a hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProjectileRef {
    pub index: u32,
    pub kind: u32,
    pub owner: Option<EntityId>,
}

/// An inventory object as seen by a hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ItemRef {
    /// Host type id of the object.
    pub kind: u32,
    /// Identity, when the object has been assigned one.
    pub identity: Option<ObjectId>,
}

/// Whatever was struck by an attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Victim {
    Npc(NpcRef),
    Player(EntityId),
    Other(u32),
}

/// Origin of incoming damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DamageSource {
    Npc(NpcRef),
    Projectile(ProjectileRef),
    Player(EntityId),
    #[default]
    Environment,
}

/// Final, already-modified incoming hit.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct HurtInfo {
    pub damage: i32,
    pub source: DamageSource,
    pub hit_direction: i8,
    pub pvp: bool,
    pub dodgeable: bool,
}

/// Mutable modifiers for an incoming hit, before it lands.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct HurtModifiers {
    pub incoming_damage: StatModifier,
    pub knockback: StatModifier,
    pub disable_sound: bool,
}

/// Final, already-modified outgoing hit.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct HitInfo {
    pub damage: i32,
    pub crit: bool,
    pub knockback: f32,
    pub hit_direction: i8,
}

/// Mutable modifiers for an outgoing hit, before it lands.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct HitModifiers {
    pub source_damage: StatModifier,
    pub crit_damage: StatModifier,
    pub knockback: StatModifier,
    pub force_crit: bool,
    pub disable_crit: bool,
}

/// Death about to happen (or that happened) to the owning entity.
///
/// `pre_kill` receives it mutably so capabilities can silence the death
/// effects or rewrite the reason.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct KillContext {
    pub damage: f64,
    pub hit_direction: i8,
    pub pvp: bool,
    pub play_sound: bool,
    pub spawn_dust: bool,
    pub source: DamageSource,
    pub reason: Option<String>,
}

/// Mutable projectile spawn parameters.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ShootStats {
    pub position: Vec2,
    pub velocity: Vec2,
    pub projectile_kind: u32,
    pub damage: i32,
    pub knockback: f32,
}

/// Mana cost adjustments, applied as `cost × mult - reduce`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ManaCost {
    pub reduce: f32,
    pub mult: f32,
}

impl Default for ManaCost {
    fn default() -> Self {
        Self {
            reduce: 0.0,
            mult: 1.0,
        }
    }
}

/// Max health and mana modifiers returned by `modify_max_stats`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct MaxStats {
    pub health: StatModifier,
    pub mana: StatModifier,
}

impl Combine for MaxStats {
    fn identity() -> Self {
        Self::default()
    }

    fn combine(self, other: Self) -> Self {
        Self {
            health: self.health.combine(other.health),
            mana: self.mana.combine(other.mana),
        }
    }
}

bitflags! {
    /// Input triggers pressed this tick, as handed to `process_triggers`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TriggerSet: u16 {
        const ATTACK     = 1 << 0;
        const ACTIVATE   = 1 << 1;
        const JUMP       = 1 << 2;
        const UP         = 1 << 3;
        const DOWN       = 1 << 4;
        const LEFT       = 1 << 5;
        const RIGHT      = 1 << 6;
        const QUICK_HEAL = 1 << 7;
        const QUICK_MANA = 1 << 8;
        const GRAPPLE    = 1 << 9;
    }
}
