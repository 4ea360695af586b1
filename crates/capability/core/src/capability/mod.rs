//! The capability module contract.
//!
//! A capability is a behavior unit authored independently of the host entity.
//! Each type implements [`Capability`], overriding only the hooks it cares
//! about and declaring them in its [`CapabilityManifest`]. The dispatcher only
//! routes a hook to instances whose manifest declares it; the default no-op
//! bodies make calling an undeclared hook harmless, just wasteful.
//!
//! # Lifecycle
//!
//! - **Dormant**: the instance exists but is in no hook bucket.
//! - **Active**: [`Capability::can_activate`] passed on a dispatch of a declared
//!   hook; the instance sits in every bucket its manifest covers.
//! - Singletons go dormant again only when their last attachment disappears.
//!   Active multi-instances end at every deactivation check unless
//!   [`Capability::can_deactivate`] holds them, and are then returned to the
//!   pool. One whose attachment is still present is bound again on the next
//!   refresh and re-activates on its next hook.

mod id;
mod manifest;

use std::any::Any;

pub use id::{CapabilityId, capability_id_for};
pub use manifest::{CapabilityManifest, Multiplicity};

use crate::attachment::{ActiveAttachment, AttachmentData};
use crate::hook::{
    HitInfo, HitModifiers, HurtInfo, HurtModifiers, ItemRef, KillContext, ManaCost, MaxStats,
    NpcRef, ProjectileRef, ShootStats, TriggerSet, Victim,
};
use crate::identity::ObjectId;
use crate::stat::StatModifier;
use crate::types::{EntityId, Rect, Vec2};

/// Upcast helper so boxed capabilities can be downcast to their concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-call view handed to a capability: who it acts for and which
/// attachments currently grant it.
#[derive(Clone, Copy, Debug)]
pub struct HookCx<'a> {
    entity: EntityId,
    attachments: &'a [ActiveAttachment],
}

impl<'a> HookCx<'a> {
    pub fn new(entity: EntityId, attachments: &'a [ActiveAttachment]) -> Self {
        Self {
            entity,
            attachments,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn attachments(&self) -> &'a [ActiveAttachment] {
        self.attachments
    }

    /// First attachment in enumeration order; its data gates activation.
    pub fn primary(&self) -> Option<&'a ActiveAttachment> {
        self.attachments.first()
    }

    /// Objects currently granting this capability.
    pub fn granting_objects(&self) -> impl Iterator<Item = ObjectId> + 'a {
        self.attachments
            .iter()
            .filter_map(|attachment| attachment.context.object())
    }
}

/// Behavior composed onto an entity through attachments.
///
/// Override the hooks the type needs and list them in [`manifest`](Self::manifest).
#[allow(unused_variables)]
pub trait Capability: AsAny + Send {
    /// Hooks and multiplicity of this type. Must not depend on instance state.
    fn manifest(&self) -> CapabilityManifest;

    // ========================================================================
    // Activation
    // ========================================================================

    /// Gate evaluated with the primary attachment's data before activation.
    fn can_activate(&self, data: &AttachmentData) -> bool {
        true
    }

    /// Whether an active multi-instance ends at the next deactivation check.
    ///
    /// Defaults to `true`, which makes multi-instances one-shot per tick.
    /// Long-lived effects return `false` until they are done. Ignored for
    /// singletons.
    fn can_deactivate(&self) -> bool {
        true
    }

    fn on_activate(&mut self, cx: &HookCx<'_>) {}

    fn on_deactivate(&mut self, cx: &HookCx<'_>) {}

    /// Clears module-owned state before the instance goes back to the pool.
    fn reset(&mut self) {}

    /// Display lines for UI collaborators (tooltips, dev listings).
    fn describe(&self, cx: &HookCx<'_>, detailed: bool) -> Vec<String> {
        Vec::new()
    }

    // ========================================================================
    // Per-tick lifecycle
    // ========================================================================

    fn reset_effects(&mut self, cx: &HookCx<'_>) {}
    fn update_dead(&mut self, cx: &HookCx<'_>) {}
    fn pre_update(&mut self, cx: &HookCx<'_>) {}
    fn process_triggers(&mut self, cx: &HookCx<'_>, triggers: TriggerSet) {}
    fn set_controls(&mut self, cx: &HookCx<'_>) {}
    fn pre_update_buffs(&mut self, cx: &HookCx<'_>) {}
    fn post_update_buffs(&mut self, cx: &HookCx<'_>) {}
    fn update_equips(&mut self, cx: &HookCx<'_>) {}
    fn post_update_equips(&mut self, cx: &HookCx<'_>) {}
    fn post_update_misc_effects(&mut self, cx: &HookCx<'_>) {}
    fn post_update_run_speeds(&mut self, cx: &HookCx<'_>) {}
    fn pre_update_movement(&mut self, cx: &HookCx<'_>) {}
    fn post_update(&mut self, cx: &HookCx<'_>) {}
    fn update_life_regen(&mut self, cx: &HookCx<'_>) {}
    fn update_bad_life_regen(&mut self, cx: &HookCx<'_>) {}
    fn natural_life_regen(&mut self, cx: &HookCx<'_>, regen: &mut f32) {}
    fn frame_effects(&mut self, cx: &HookCx<'_>) {}

    // ========================================================================
    // Damage taken
    // ========================================================================

    /// Dodge without cost. Any `true` dodges.
    fn free_dodge(&mut self, cx: &HookCx<'_>, info: &HurtInfo) -> bool {
        false
    }

    /// Dodge that consumes something. Any `true` dodges.
    fn consumable_dodge(&mut self, cx: &HookCx<'_>, info: &HurtInfo) -> bool {
        false
    }

    fn modify_hurt(&mut self, cx: &HookCx<'_>, modifiers: &mut HurtModifiers) {}
    fn on_hurt(&mut self, cx: &HookCx<'_>, info: &HurtInfo) {}
    fn post_hurt(&mut self, cx: &HookCx<'_>, info: &HurtInfo) {}

    /// Returning `false` prevents the death. Every implementor is consulted.
    fn pre_kill(&mut self, cx: &HookCx<'_>, kill: &mut KillContext) -> bool {
        true
    }

    fn kill(&mut self, cx: &HookCx<'_>, kill: &KillContext) {}
    fn modify_hit_by_npc(&mut self, cx: &HookCx<'_>, npc: NpcRef, modifiers: &mut HurtModifiers) {}
    fn on_hit_by_npc(&mut self, cx: &HookCx<'_>, npc: NpcRef, info: &HurtInfo) {}
    fn modify_hit_by_projectile(
        &mut self,
        cx: &HookCx<'_>,
        projectile: ProjectileRef,
        modifiers: &mut HurtModifiers,
    ) {
    }
    fn on_hit_by_projectile(&mut self, cx: &HookCx<'_>, projectile: ProjectileRef, info: &HurtInfo) {}

    // ========================================================================
    // Damage dealt
    // ========================================================================

    fn can_hit_npc(&mut self, cx: &HookCx<'_>, target: NpcRef) -> bool {
        true
    }

    fn modify_hit_npc(&mut self, cx: &HookCx<'_>, target: NpcRef, modifiers: &mut HitModifiers) {}
    fn on_hit_npc(&mut self, cx: &HookCx<'_>, target: NpcRef, hit: &HitInfo, damage_done: i32) {}

    /// `Some(false)` forbids, `Some(true)` allows, `None` has no opinion.
    fn can_hit_npc_with_item(&mut self, cx: &HookCx<'_>, item: ItemRef, target: NpcRef) -> Option<bool> {
        None
    }

    fn modify_hit_npc_with_item(
        &mut self,
        cx: &HookCx<'_>,
        item: ItemRef,
        target: NpcRef,
        modifiers: &mut HitModifiers,
    ) {
    }
    fn on_hit_npc_with_item(
        &mut self,
        cx: &HookCx<'_>,
        item: ItemRef,
        target: NpcRef,
        hit: &HitInfo,
        damage_done: i32,
    ) {
    }

    /// Same tri-state convention as [`can_hit_npc_with_item`](Self::can_hit_npc_with_item).
    fn can_hit_npc_with_projectile(
        &mut self,
        cx: &HookCx<'_>,
        projectile: ProjectileRef,
        target: NpcRef,
    ) -> Option<bool> {
        None
    }

    fn modify_hit_npc_with_projectile(
        &mut self,
        cx: &HookCx<'_>,
        projectile: ProjectileRef,
        target: NpcRef,
        modifiers: &mut HitModifiers,
    ) {
    }
    fn on_hit_npc_with_projectile(
        &mut self,
        cx: &HookCx<'_>,
        projectile: ProjectileRef,
        target: NpcRef,
        hit: &HitInfo,
        damage_done: i32,
    ) {
    }

    fn can_hit_pvp(&mut self, cx: &HookCx<'_>, item: ItemRef, target: EntityId) -> bool {
        true
    }

    fn can_hit_pvp_with_projectile(
        &mut self,
        cx: &HookCx<'_>,
        projectile: ProjectileRef,
        target: EntityId,
    ) -> bool {
        true
    }

    fn on_hit_anything(&mut self, cx: &HookCx<'_>, position: Vec2, victim: Victim) {}

    // ========================================================================
    // Item use
    // ========================================================================

    fn pre_item_check(&mut self, cx: &HookCx<'_>) -> bool {
        true
    }

    fn post_item_check(&mut self, cx: &HookCx<'_>) {}

    fn use_time_multiplier(&mut self, cx: &HookCx<'_>, item: ItemRef) -> f32 {
        1.0
    }

    fn use_animation_multiplier(&mut self, cx: &HookCx<'_>, item: ItemRef) -> f32 {
        1.0
    }

    fn use_speed_multiplier(&mut self, cx: &HookCx<'_>, item: ItemRef) -> f32 {
        1.0
    }

    fn can_consume_ammo(&mut self, cx: &HookCx<'_>, weapon: ItemRef, ammo: ItemRef) -> bool {
        true
    }

    fn on_consume_ammo(&mut self, cx: &HookCx<'_>, weapon: ItemRef, ammo: ItemRef) {}

    fn can_shoot(&mut self, cx: &HookCx<'_>, item: ItemRef) -> bool {
        true
    }

    fn modify_shoot_stats(&mut self, cx: &HookCx<'_>, item: ItemRef, stats: &mut ShootStats) {}

    /// Returning `false` suppresses the host's default projectile spawn.
    fn shoot(&mut self, cx: &HookCx<'_>, item: ItemRef, stats: &ShootStats) -> bool {
        true
    }

    fn melee_effects(&mut self, cx: &HookCx<'_>, item: ItemRef, hitbox: Rect) {}
    fn modify_weapon_damage(&mut self, cx: &HookCx<'_>, item: ItemRef, damage: &mut StatModifier) {}
    fn modify_weapon_knockback(&mut self, cx: &HookCx<'_>, item: ItemRef, knockback: &mut StatModifier) {}
    fn modify_weapon_crit(&mut self, cx: &HookCx<'_>, item: ItemRef, crit: &mut f32) {}
    fn get_heal_life(&mut self, cx: &HookCx<'_>, item: ItemRef, quick_heal: bool, heal: &mut i32) {}
    fn get_heal_mana(&mut self, cx: &HookCx<'_>, item: ItemRef, quick_heal: bool, heal: &mut i32) {}
    fn modify_mana_cost(&mut self, cx: &HookCx<'_>, item: ItemRef, cost: &mut ManaCost) {}
    fn on_missing_mana(&mut self, cx: &HookCx<'_>, item: ItemRef, needed: i32) {}
    fn on_consume_mana(&mut self, cx: &HookCx<'_>, item: ItemRef, consumed: i32) {}

    /// Contribution to max health/mana, merged across implementors.
    fn modify_max_stats(&mut self, cx: &HookCx<'_>) -> MaxStats {
        MaxStats::default()
    }

    // ========================================================================
    // Input edges
    // ========================================================================

    fn on_attack_key_down(&mut self, cx: &HookCx<'_>) {}
    fn while_attack_key_down(&mut self, cx: &HookCx<'_>, ticks_held: u32) {}
    fn on_attack_key_up(&mut self, cx: &HookCx<'_>, ticks_held: u32) {}
    fn on_activate_key_down(&mut self, cx: &HookCx<'_>) {}
    fn while_activate_key_down(&mut self, cx: &HookCx<'_>, ticks_held: u32) {}
    fn on_activate_key_up(&mut self, cx: &HookCx<'_>, ticks_held: u32) {}
}
