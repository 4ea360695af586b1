//! Hook kinds, hook masks, and the argument types carried by dispatch.

mod args;
mod kind;
mod mask;

pub use args::{
    DamageSource, HitInfo, HitModifiers, HurtInfo, HurtModifiers, ItemRef, KillContext, ManaCost,
    MaxStats, NpcRef, ProjectileRef, ShootStats, TriggerSet, Victim,
};
pub use kind::HookKind;
pub use mask::HookMask;
