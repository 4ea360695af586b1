//! One dispatch entry point per hook kind.
//!
//! Each entry runs pending activation for its hook and reduces over the
//! bucket: plain notifications call every implementor, `can_*` gates AND with
//! short-circuit, dodges OR with short-circuit, tri-state gates let any deny
//! win, multipliers multiply and stat contributions combine.

use crate::hook::{
    HitInfo, HitModifiers, HookKind, HurtInfo, HurtModifiers, ItemRef, KillContext, ManaCost,
    MaxStats, NpcRef, ProjectileRef, ShootStats, TriggerSet, Victim,
};
use crate::stat::StatModifier;
use crate::types::{EntityId, Rect, Vec2};

use super::CapabilityDispatcher;

impl CapabilityDispatcher {
    // ========================================================================
    // Per-tick lifecycle
    // ========================================================================

    pub fn dispatch_reset_effects(&mut self) {
        self.for_each(HookKind::ResetEffects, |m, cx| m.reset_effects(cx));
    }

    pub fn dispatch_update_dead(&mut self) {
        self.for_each(HookKind::UpdateDead, |m, cx| m.update_dead(cx));
    }

    pub fn dispatch_pre_update(&mut self) {
        self.for_each(HookKind::PreUpdate, |m, cx| m.pre_update(cx));
    }

    pub fn dispatch_process_triggers(&mut self, triggers: TriggerSet) {
        self.for_each(HookKind::ProcessTriggers, |m, cx| m.process_triggers(cx, triggers));
    }

    pub fn dispatch_set_controls(&mut self) {
        self.for_each(HookKind::SetControls, |m, cx| m.set_controls(cx));
    }

    pub fn dispatch_pre_update_buffs(&mut self) {
        self.for_each(HookKind::PreUpdateBuffs, |m, cx| m.pre_update_buffs(cx));
    }

    pub fn dispatch_post_update_buffs(&mut self) {
        self.for_each(HookKind::PostUpdateBuffs, |m, cx| m.post_update_buffs(cx));
    }

    pub fn dispatch_update_equips(&mut self) {
        self.for_each(HookKind::UpdateEquips, |m, cx| m.update_equips(cx));
    }

    pub fn dispatch_post_update_equips(&mut self) {
        self.for_each(HookKind::PostUpdateEquips, |m, cx| m.post_update_equips(cx));
    }

    pub fn dispatch_post_update_misc_effects(&mut self) {
        self.for_each(HookKind::PostUpdateMiscEffects, |m, cx| m.post_update_misc_effects(cx));
    }

    pub fn dispatch_post_update_run_speeds(&mut self) {
        self.for_each(HookKind::PostUpdateRunSpeeds, |m, cx| m.post_update_run_speeds(cx));
    }

    pub fn dispatch_pre_update_movement(&mut self) {
        self.for_each(HookKind::PreUpdateMovement, |m, cx| m.pre_update_movement(cx));
    }

    pub fn dispatch_post_update(&mut self) {
        self.for_each(HookKind::PostUpdate, |m, cx| m.post_update(cx));
    }

    pub fn dispatch_update_life_regen(&mut self) {
        self.for_each(HookKind::UpdateLifeRegen, |m, cx| m.update_life_regen(cx));
    }

    pub fn dispatch_update_bad_life_regen(&mut self) {
        self.for_each(HookKind::UpdateBadLifeRegen, |m, cx| m.update_bad_life_regen(cx));
    }

    pub fn dispatch_natural_life_regen(&mut self, regen: &mut f32) {
        self.for_each(HookKind::NaturalLifeRegen, |m, cx| m.natural_life_regen(cx, regen));
    }

    pub fn dispatch_frame_effects(&mut self) {
        self.for_each(HookKind::FrameEffects, |m, cx| m.frame_effects(cx));
    }

    // ========================================================================
    // Damage taken
    // ========================================================================

    pub fn dispatch_free_dodge(&mut self, info: &HurtInfo) -> bool {
        self.any(HookKind::FreeDodge, |m, cx| m.free_dodge(cx, info))
    }

    pub fn dispatch_consumable_dodge(&mut self, info: &HurtInfo) -> bool {
        self.any(HookKind::ConsumableDodge, |m, cx| m.consumable_dodge(cx, info))
    }

    pub fn dispatch_modify_hurt(&mut self, modifiers: &mut HurtModifiers) {
        self.for_each(HookKind::ModifyHurt, |m, cx| m.modify_hurt(cx, modifiers));
    }

    pub fn dispatch_on_hurt(&mut self, info: &HurtInfo) {
        self.for_each(HookKind::OnHurt, |m, cx| m.on_hurt(cx, info));
    }

    pub fn dispatch_post_hurt(&mut self, info: &HurtInfo) {
        self.for_each(HookKind::PostHurt, |m, cx| m.post_hurt(cx, info));
    }

    /// Every implementor sees the kill attempt, even after one has vetoed it.
    pub fn dispatch_pre_kill(&mut self, kill: &mut KillContext) -> bool {
        self.all_exhaustive(HookKind::PreKill, |m, cx| m.pre_kill(cx, kill))
    }

    pub fn dispatch_kill(&mut self, kill: &KillContext) {
        self.for_each(HookKind::Kill, |m, cx| m.kill(cx, kill));
    }

    pub fn dispatch_modify_hit_by_npc(&mut self, npc: NpcRef, modifiers: &mut HurtModifiers) {
        self.for_each(HookKind::ModifyHitByNpc, |m, cx| m.modify_hit_by_npc(cx, npc, modifiers));
    }

    pub fn dispatch_on_hit_by_npc(&mut self, npc: NpcRef, info: &HurtInfo) {
        self.for_each(HookKind::OnHitByNpc, |m, cx| m.on_hit_by_npc(cx, npc, info));
    }

    pub fn dispatch_modify_hit_by_projectile(
        &mut self,
        projectile: ProjectileRef,
        modifiers: &mut HurtModifiers,
    ) {
        self.for_each(HookKind::ModifyHitByProjectile, |m, cx| {
            m.modify_hit_by_projectile(cx, projectile, modifiers)
        });
    }

    pub fn dispatch_on_hit_by_projectile(&mut self, projectile: ProjectileRef, info: &HurtInfo) {
        self.for_each(HookKind::OnHitByProjectile, |m, cx| {
            m.on_hit_by_projectile(cx, projectile, info)
        });
    }

    // ========================================================================
    // Damage dealt
    // ========================================================================

    pub fn dispatch_can_hit_npc(&mut self, target: NpcRef) -> bool {
        self.all(HookKind::CanHitNpc, |m, cx| m.can_hit_npc(cx, target))
    }

    pub fn dispatch_modify_hit_npc(&mut self, target: NpcRef, modifiers: &mut HitModifiers) {
        self.for_each(HookKind::ModifyHitNpc, |m, cx| m.modify_hit_npc(cx, target, modifiers));
    }

    pub fn dispatch_on_hit_npc(&mut self, target: NpcRef, hit: &HitInfo, damage_done: i32) {
        self.for_each(HookKind::OnHitNpc, |m, cx| m.on_hit_npc(cx, target, hit, damage_done));
    }

    pub fn dispatch_can_hit_npc_with_item(&mut self, item: ItemRef, target: NpcRef) -> Option<bool> {
        self.verdict(HookKind::CanHitNpcWithItem, |m, cx| {
            m.can_hit_npc_with_item(cx, item, target)
        })
    }

    pub fn dispatch_modify_hit_npc_with_item(
        &mut self,
        item: ItemRef,
        target: NpcRef,
        modifiers: &mut HitModifiers,
    ) {
        self.for_each(HookKind::ModifyHitNpcWithItem, |m, cx| {
            m.modify_hit_npc_with_item(cx, item, target, modifiers)
        });
    }

    pub fn dispatch_on_hit_npc_with_item(
        &mut self,
        item: ItemRef,
        target: NpcRef,
        hit: &HitInfo,
        damage_done: i32,
    ) {
        self.for_each(HookKind::OnHitNpcWithItem, |m, cx| {
            m.on_hit_npc_with_item(cx, item, target, hit, damage_done)
        });
    }

    pub fn dispatch_can_hit_npc_with_projectile(
        &mut self,
        projectile: ProjectileRef,
        target: NpcRef,
    ) -> Option<bool> {
        self.verdict(HookKind::CanHitNpcWithProjectile, |m, cx| {
            m.can_hit_npc_with_projectile(cx, projectile, target)
        })
    }

    pub fn dispatch_modify_hit_npc_with_projectile(
        &mut self,
        projectile: ProjectileRef,
        target: NpcRef,
        modifiers: &mut HitModifiers,
    ) {
        self.for_each(HookKind::ModifyHitNpcWithProjectile, |m, cx| {
            m.modify_hit_npc_with_projectile(cx, projectile, target, modifiers)
        });
    }

    pub fn dispatch_on_hit_npc_with_projectile(
        &mut self,
        projectile: ProjectileRef,
        target: NpcRef,
        hit: &HitInfo,
        damage_done: i32,
    ) {
        self.for_each(HookKind::OnHitNpcWithProjectile, |m, cx| {
            m.on_hit_npc_with_projectile(cx, projectile, target, hit, damage_done)
        });
    }

    pub fn dispatch_can_hit_pvp(&mut self, item: ItemRef, target: EntityId) -> bool {
        self.all(HookKind::CanHitPvp, |m, cx| m.can_hit_pvp(cx, item, target))
    }

    pub fn dispatch_can_hit_pvp_with_projectile(
        &mut self,
        projectile: ProjectileRef,
        target: EntityId,
    ) -> bool {
        self.all(HookKind::CanHitPvpWithProjectile, |m, cx| {
            m.can_hit_pvp_with_projectile(cx, projectile, target)
        })
    }

    pub fn dispatch_on_hit_anything(&mut self, position: Vec2, victim: Victim) {
        self.for_each(HookKind::OnHitAnything, |m, cx| m.on_hit_anything(cx, position, victim));
    }

    // ========================================================================
    // Item use
    // ========================================================================

    pub fn dispatch_pre_item_check(&mut self) -> bool {
        self.all(HookKind::PreItemCheck, |m, cx| m.pre_item_check(cx))
    }

    pub fn dispatch_post_item_check(&mut self) {
        self.for_each(HookKind::PostItemCheck, |m, cx| m.post_item_check(cx));
    }

    pub fn dispatch_use_time_multiplier(&mut self, item: ItemRef) -> f32 {
        self.product(HookKind::UseTimeMultiplier, |m, cx| m.use_time_multiplier(cx, item))
    }

    pub fn dispatch_use_animation_multiplier(&mut self, item: ItemRef) -> f32 {
        self.product(HookKind::UseAnimationMultiplier, |m, cx| {
            m.use_animation_multiplier(cx, item)
        })
    }

    pub fn dispatch_use_speed_multiplier(&mut self, item: ItemRef) -> f32 {
        self.product(HookKind::UseSpeedMultiplier, |m, cx| m.use_speed_multiplier(cx, item))
    }

    pub fn dispatch_can_consume_ammo(&mut self, weapon: ItemRef, ammo: ItemRef) -> bool {
        self.all(HookKind::CanConsumeAmmo, |m, cx| m.can_consume_ammo(cx, weapon, ammo))
    }

    pub fn dispatch_on_consume_ammo(&mut self, weapon: ItemRef, ammo: ItemRef) {
        self.for_each(HookKind::OnConsumeAmmo, |m, cx| m.on_consume_ammo(cx, weapon, ammo));
    }

    pub fn dispatch_can_shoot(&mut self, item: ItemRef) -> bool {
        self.all(HookKind::CanShoot, |m, cx| m.can_shoot(cx, item))
    }

    pub fn dispatch_modify_shoot_stats(&mut self, item: ItemRef, stats: &mut ShootStats) {
        self.for_each(HookKind::ModifyShootStats, |m, cx| m.modify_shoot_stats(cx, item, stats));
    }

    /// `false` means some capability handled the shot itself.
    pub fn dispatch_shoot(&mut self, item: ItemRef, stats: &ShootStats) -> bool {
        self.all(HookKind::Shoot, |m, cx| m.shoot(cx, item, stats))
    }

    pub fn dispatch_melee_effects(&mut self, item: ItemRef, hitbox: Rect) {
        self.for_each(HookKind::MeleeEffects, |m, cx| m.melee_effects(cx, item, hitbox));
    }

    pub fn dispatch_modify_weapon_damage(&mut self, item: ItemRef, damage: &mut StatModifier) {
        self.for_each(HookKind::ModifyWeaponDamage, |m, cx| {
            m.modify_weapon_damage(cx, item, damage)
        });
    }

    pub fn dispatch_modify_weapon_knockback(&mut self, item: ItemRef, knockback: &mut StatModifier) {
        self.for_each(HookKind::ModifyWeaponKnockback, |m, cx| {
            m.modify_weapon_knockback(cx, item, knockback)
        });
    }

    pub fn dispatch_modify_weapon_crit(&mut self, item: ItemRef, crit: &mut f32) {
        self.for_each(HookKind::ModifyWeaponCrit, |m, cx| m.modify_weapon_crit(cx, item, crit));
    }

    pub fn dispatch_get_heal_life(&mut self, item: ItemRef, quick_heal: bool, heal: &mut i32) {
        self.for_each(HookKind::GetHealLife, |m, cx| m.get_heal_life(cx, item, quick_heal, heal));
    }

    pub fn dispatch_get_heal_mana(&mut self, item: ItemRef, quick_heal: bool, heal: &mut i32) {
        self.for_each(HookKind::GetHealMana, |m, cx| m.get_heal_mana(cx, item, quick_heal, heal));
    }

    pub fn dispatch_modify_mana_cost(&mut self, item: ItemRef, cost: &mut ManaCost) {
        self.for_each(HookKind::ModifyManaCost, |m, cx| m.modify_mana_cost(cx, item, cost));
    }

    pub fn dispatch_on_missing_mana(&mut self, item: ItemRef, needed: i32) {
        self.for_each(HookKind::OnMissingMana, |m, cx| m.on_missing_mana(cx, item, needed));
    }

    pub fn dispatch_on_consume_mana(&mut self, item: ItemRef, consumed: i32) {
        self.for_each(HookKind::OnConsumeMana, |m, cx| m.on_consume_mana(cx, item, consumed));
    }

    /// Combined max health / mana modifiers of every implementor.
    pub fn dispatch_modify_max_stats(&mut self) -> MaxStats {
        self.combine(HookKind::ModifyMaxStats, |m, cx| m.modify_max_stats(cx))
    }

    // ========================================================================
    // Input edges
    // ========================================================================

    pub fn dispatch_on_attack_key_down(&mut self) {
        self.for_each(HookKind::OnAttackKeyDown, |m, cx| m.on_attack_key_down(cx));
    }

    pub fn dispatch_while_attack_key_down(&mut self, ticks_held: u32) {
        self.for_each(HookKind::WhileAttackKeyDown, |m, cx| {
            m.while_attack_key_down(cx, ticks_held)
        });
    }

    pub fn dispatch_on_attack_key_up(&mut self, ticks_held: u32) {
        self.for_each(HookKind::OnAttackKeyUp, |m, cx| m.on_attack_key_up(cx, ticks_held));
    }

    pub fn dispatch_on_activate_key_down(&mut self) {
        self.for_each(HookKind::OnActivateKeyDown, |m, cx| m.on_activate_key_down(cx));
    }

    pub fn dispatch_while_activate_key_down(&mut self, ticks_held: u32) {
        self.for_each(HookKind::WhileActivateKeyDown, |m, cx| {
            m.while_activate_key_down(cx, ticks_held)
        });
    }

    pub fn dispatch_on_activate_key_up(&mut self, ticks_held: u32) {
        self.for_each(HookKind::OnActivateKeyUp, |m, cx| m.on_activate_key_up(cx, ticks_held));
    }
}
