//! Per-entity glue between a host simulation and its capability dispatcher.
//!
//! An [`EntityHost`] owns the entity-level attachment list and the objects
//! whose attachments count for this entity (held object, equipment, misc
//! slots). It decides when contexts are refreshed and turns raw key state into
//! input-edge hooks. Every other hook is reachable through
//! [`EntityHost::dispatcher_mut`].
use std::fmt;
use std::iter;
use std::str::FromStr;
use std::sync::Arc;

use capability_core::{
    AttachmentRecord, AttachmentSource, CapabilityContext, CapabilityDispatcher, CapabilityId,
    EntityId, HurtInfo, TrackedObject, attach_to_entity, attach_to_object, detach_from_entity,
    detach_from_object, purge_unknown,
};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::replication::{self, AttachmentSync};

/// An object slot that contributes attachments, in refresh order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Held,
    Equipment(usize),
    Misc(usize),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Held => write!(f, "held"),
            Self::Equipment(index) => write!(f, "equipment:{index}"),
            Self::Misc(index) => write!(f, "misc:{index}"),
        }
    }
}

impl FromStr for Slot {
    type Err = String;

    /// Parses `held`, `equipment:N` or `misc:N`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "held" {
            return Ok(Self::Held);
        }
        let (kind, index) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid slot `{s}` (expected held, equipment:N or misc:N)"))?;
        let index: usize = index
            .parse()
            .map_err(|_| format!("invalid slot index `{index}`"))?;
        match kind {
            "equipment" => Ok(Self::Equipment(index)),
            "misc" => Ok(Self::Misc(index)),
            other => Err(format!("unknown slot kind `{other}`")),
        }
    }
}

/// Key state sampled once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub attack: bool,
    pub activate: bool,
}

/// Edges derived from one key for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct KeyEdges {
    pressed: bool,
    held: Option<u32>,
    released: Option<u32>,
}

#[derive(Clone, Copy, Debug, Default)]
struct KeyTracker {
    held_ticks: u32,
}

impl KeyTracker {
    /// Down on the first held tick, then while-held with the ticks held so
    /// far, then up with the total once released.
    fn advance(&mut self, down: bool) -> KeyEdges {
        if down {
            let edges = KeyEdges {
                pressed: self.held_ticks == 0,
                held: Some(self.held_ticks),
                released: None,
            };
            self.held_ticks = self.held_ticks.saturating_add(1);
            edges
        } else {
            let released = (self.held_ticks > 0).then_some(self.held_ticks);
            self.held_ticks = 0;
            KeyEdges {
                released,
                ..KeyEdges::default()
            }
        }
    }
}

/// Drives one entity's capabilities from the host's tick.
pub struct EntityHost {
    entity: EntityId,
    ctx: Arc<CapabilityContext>,
    dispatcher: CapabilityDispatcher,

    attachments: Vec<AttachmentRecord>,
    held: TrackedObject,
    equipment: Vec<TrackedObject>,
    misc: Vec<TrackedObject>,

    refresh_interval: u32,
    ticks_since_refresh: u32,
    tick: u64,
    last_damage_tick: Option<u64>,

    attack_key: KeyTracker,
    activate_key: KeyTracker,
}

impl EntityHost {
    pub(crate) fn new(
        entity: EntityId,
        ctx: Arc<CapabilityContext>,
        config: &SessionConfig,
    ) -> Result<Self> {
        let dispatcher = CapabilityDispatcher::new(entity, Arc::clone(&ctx))?;
        Ok(Self {
            entity,
            ctx,
            dispatcher,
            attachments: Vec::new(),
            held: TrackedObject::air(),
            equipment: iter::repeat_with(TrackedObject::air)
                .take(config.equipment_slots)
                .collect(),
            misc: iter::repeat_with(TrackedObject::air)
                .take(config.misc_slots)
                .collect(),
            refresh_interval: config.refresh_interval_ticks.max(1),
            ticks_since_refresh: 0,
            tick: 0,
            last_damage_tick: None,
            attack_key: KeyTracker::default(),
            activate_key: KeyTracker::default(),
        })
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn dispatcher(&self) -> &CapabilityDispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut CapabilityDispatcher {
        &mut self.dispatcher
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Tick of the most recent [`record_hurt`](Self::record_hurt).
    pub fn last_damage_tick(&self) -> Option<u64> {
        self.last_damage_tick
    }

    // ========================================================================
    // Objects & attachments
    // ========================================================================

    pub fn entity_attachments(&self) -> &[AttachmentRecord] {
        &self.attachments
    }

    pub fn held(&self) -> &TrackedObject {
        &self.held
    }

    pub fn equipment(&self) -> &[TrackedObject] {
        &self.equipment
    }

    pub fn misc(&self) -> &[TrackedObject] {
        &self.misc
    }

    pub fn object(&self, slot: Slot) -> Option<&TrackedObject> {
        match slot {
            Slot::Held => Some(&self.held),
            Slot::Equipment(index) => self.equipment.get(index),
            Slot::Misc(index) => self.misc.get(index),
        }
    }

    fn object_mut(&mut self, slot: Slot) -> Result<&mut TrackedObject> {
        let object = match slot {
            Slot::Held => Some(&mut self.held),
            Slot::Equipment(index) => self.equipment.get_mut(index),
            Slot::Misc(index) => self.misc.get_mut(index),
        };
        object.ok_or(SessionError::UnknownSlot { slot })
    }

    /// Every slot's object in refresh order.
    pub fn objects(&self) -> impl Iterator<Item = &TrackedObject> + '_ {
        iter::once(&self.held)
            .chain(self.equipment.iter())
            .chain(self.misc.iter())
    }

    /// Every slot with its object, in refresh order.
    pub fn slots(&self) -> impl Iterator<Item = (Slot, &TrackedObject)> + '_ {
        iter::once((Slot::Held, &self.held))
            .chain(self.equipment.iter().enumerate().map(|(i, o)| (Slot::Equipment(i), o)))
            .chain(self.misc.iter().enumerate().map(|(i, o)| (Slot::Misc(i), o)))
    }

    /// Puts `object` into `slot`, refreshes, and returns what was there.
    pub fn put(&mut self, slot: Slot, object: TrackedObject) -> Result<TrackedObject> {
        let previous = std::mem::replace(self.object_mut(slot)?, object);
        self.refresh();
        Ok(previous)
    }

    /// Switches the held object. Contexts refresh immediately.
    pub fn select_held(&mut self, object: TrackedObject) -> TrackedObject {
        let previous = std::mem::replace(&mut self.held, object);
        self.refresh();
        previous
    }

    pub fn attach(&mut self, slot: Slot, record: AttachmentRecord) -> Result<()> {
        let ctx = Arc::clone(&self.ctx);
        attach_to_object(&ctx, self.object_mut(slot)?, record)?;
        self.refresh();
        Ok(())
    }

    pub fn detach(&mut self, slot: Slot, id: &CapabilityId) -> Result<usize> {
        let ctx = Arc::clone(&self.ctx);
        let removed = detach_from_object(&ctx, self.object_mut(slot)?, id);
        if removed > 0 {
            self.refresh();
        }
        Ok(removed)
    }

    pub fn attach_to_entity(&mut self, record: AttachmentRecord) {
        attach_to_entity(&mut self.attachments, record);
        self.refresh();
    }

    pub fn detach_from_entity(&mut self, id: &CapabilityId) -> usize {
        let removed = detach_from_entity(&mut self.attachments, id);
        if removed > 0 {
            self.refresh();
        }
        removed
    }

    /// Drops attachments of capability types the registry no longer knows,
    /// from the entity and every slot. Returns how many were removed.
    pub fn purge_unknown(&mut self) -> Result<usize> {
        let ctx = Arc::clone(&self.ctx);
        let mut removed = 0;
        for object in iter::once(&mut self.held)
            .chain(self.equipment.iter_mut())
            .chain(self.misc.iter_mut())
        {
            removed += purge_unknown(&ctx, object)?;
        }

        let registry = ctx.registry();
        let before = self.attachments.len();
        self.attachments
            .retain(|record| registry.contains(&record.capability_id));
        removed += before - self.attachments.len();

        if removed > 0 {
            debug!(
                target: "runtime::host",
                entity = %self.entity,
                removed,
                "Purged unknown capabilities"
            );
            self.refresh();
        }
        Ok(removed)
    }

    /// Adopts a replicated attachment list. Returns `Ok(false)` if no slot
    /// holds the object.
    pub fn apply_sync(&mut self, message: &AttachmentSync) -> Result<bool> {
        let objects = iter::once(&mut self.held)
            .chain(self.equipment.iter_mut())
            .chain(self.misc.iter_mut());
        let applied = replication::apply_sync(&self.ctx, objects, message)?;
        if applied {
            self.refresh();
        }
        Ok(applied)
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Rebuilds the dispatcher's view of every attachment source.
    ///
    /// Order: held object, equipment by index, misc by index, then the
    /// entity's own list. Objects carrying attachments get an identity here
    /// if they have none yet; one that cannot get an identity contributes
    /// nothing.
    pub fn refresh(&mut self) {
        let identities = self.ctx.identities();
        for object in iter::once(&mut self.held)
            .chain(self.equipment.iter_mut())
            .chain(self.misc.iter_mut())
        {
            if object.attachments().is_empty() {
                continue;
            }
            if let Err(err) = object.ensure_identity(identities) {
                warn!(
                    target: "runtime::host",
                    entity = %self.entity,
                    kind = object.kind,
                    %err,
                    "Skipping object without identity"
                );
            }
        }

        let sources = iter::once(&self.held)
            .chain(self.equipment.iter())
            .chain(self.misc.iter())
            .filter_map(|object| {
                let identity = object.identity()?;
                let records = object.attachments();
                (!records.is_empty()).then(|| AttachmentSource::object(identity, records))
            })
            .chain(iter::once(AttachmentSource::entity(&self.attachments)));

        self.dispatcher.refresh_contexts(sources);
        self.ticks_since_refresh = 0;
    }

    /// Start of an entity update: cadence refresh, then `ResetEffects`.
    pub fn begin_tick(&mut self) {
        self.tick += 1;
        self.ticks_since_refresh += 1;
        if self.ticks_since_refresh >= self.refresh_interval {
            self.refresh();
        }
        self.dispatcher.dispatch_reset_effects();
    }

    /// End of an entity update: input edges, `PostUpdate`, then
    /// deactivation checks.
    pub fn end_tick(&mut self, input: InputFrame) {
        let attack = self.attack_key.advance(input.attack);
        if attack.pressed {
            self.dispatcher.dispatch_on_attack_key_down();
        }
        if let Some(ticks) = attack.held {
            self.dispatcher.dispatch_while_attack_key_down(ticks);
        }
        if let Some(ticks) = attack.released {
            self.dispatcher.dispatch_on_attack_key_up(ticks);
        }

        let activate = self.activate_key.advance(input.activate);
        if activate.pressed {
            self.dispatcher.dispatch_on_activate_key_down();
        }
        if let Some(ticks) = activate.held {
            self.dispatcher.dispatch_while_activate_key_down(ticks);
        }
        if let Some(ticks) = activate.released {
            self.dispatcher.dispatch_on_activate_key_up(ticks);
        }

        self.dispatcher.dispatch_post_update();
        self.dispatcher.check_deactivations();
    }

    /// Records the hit and forwards it to `OnHurt` implementors.
    pub fn record_hurt(&mut self, info: &HurtInfo) {
        self.last_damage_tick = Some(self.tick);
        self.dispatcher.dispatch_on_hurt(info);
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Callers check that neither section is longer than the host's.
    pub(crate) fn restore_parts(
        &mut self,
        attachments: Vec<AttachmentRecord>,
        held: TrackedObject,
        equipment: Vec<TrackedObject>,
        misc: Vec<TrackedObject>,
    ) {
        debug_assert!(equipment.len() <= self.equipment.len());
        debug_assert!(misc.len() <= self.misc.len());
        self.attachments = attachments;
        self.held = held;
        for (slot, object) in self.equipment.iter_mut().zip(equipment) {
            *slot = object;
        }
        for (slot, object) in self.misc.iter_mut().zip(misc) {
            *slot = object;
        }
        self.refresh();
    }
}

impl fmt::Debug for EntityHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityHost")
            .field("entity", &self.entity)
            .field("tick", &self.tick)
            .field("attachments", &self.attachments.len())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_edges_follow_press_hold_release() {
        let mut key = KeyTracker::default();

        assert_eq!(
            key.advance(true),
            KeyEdges { pressed: true, held: Some(0), released: None }
        );
        assert_eq!(
            key.advance(true),
            KeyEdges { pressed: false, held: Some(1), released: None }
        );
        assert_eq!(
            key.advance(false),
            KeyEdges { pressed: false, held: None, released: Some(2) }
        );
        assert_eq!(key.advance(false), KeyEdges::default());
    }

    #[test]
    fn slots_parse_and_display() {
        for text in ["held", "equipment:3", "misc:0"] {
            let slot: Slot = text.parse().unwrap();
            assert_eq!(slot.to_string(), text);
        }
        assert_eq!("Equipment:2".parse::<Slot>().unwrap(), Slot::Equipment(2));
        assert!("armor:1".parse::<Slot>().is_err());
        assert!("misc:x".parse::<Slot>().is_err());
        assert!("held:1".parse::<Slot>().is_err());
    }
}
