//! Capabilities and session helpers shared by the runtime integration tests.
#![allow(dead_code)]

use capability_core::{
    AttachmentData, Capability, CapabilityId, CapabilityManifest, HookCx, HookKind, HurtInfo,
    ReplicationRole,
};
use capability_runtime::{Session, SessionConfig};

pub const DASH: &str = "Test:Dash";
pub const SIPHON: &str = "Test:Siphon";

pub fn id(text: &str) -> CapabilityId {
    CapabilityId::new(text)
}

/// Singleton that logs input edges and refuses to activate while `locked`.
#[derive(Default)]
pub struct Dash {
    pub events: Vec<String>,
    pub activations: u32,
}

impl Capability for Dash {
    fn manifest(&self) -> CapabilityManifest {
        CapabilityManifest::singleton()
            .hook(HookKind::OnActivateKeyDown)
            .hook(HookKind::WhileActivateKeyDown)
            .hook(HookKind::OnActivateKeyUp)
            .hook(HookKind::PostUpdate)
    }

    fn can_activate(&self, data: &AttachmentData) -> bool {
        data.get_bool("locked") != Some(true)
    }

    fn on_activate(&mut self, _cx: &HookCx<'_>) {
        self.activations += 1;
    }

    fn on_activate_key_down(&mut self, _cx: &HookCx<'_>) {
        self.events.push("down".into());
    }

    fn while_activate_key_down(&mut self, _cx: &HookCx<'_>, ticks_held: u32) {
        self.events.push(format!("while:{ticks_held}"));
    }

    fn on_activate_key_up(&mut self, _cx: &HookCx<'_>, ticks_held: u32) {
        self.events.push(format!("up:{ticks_held}"));
    }

    fn describe(&self, _cx: &HookCx<'_>, detailed: bool) -> Vec<String> {
        let mut lines = vec!["Dash on activate".to_owned()];
        if detailed {
            lines.push(format!("activations: {}", self.activations));
        }
        lines
    }
}

/// Per-object effect counting the hits its owner takes. Stays active while
/// attached.
#[derive(Default)]
pub struct Siphon {
    pub hits: u32,
    pub damage: i32,
}

impl Capability for Siphon {
    fn manifest(&self) -> CapabilityManifest {
        CapabilityManifest::multi_instance().hook(HookKind::OnHurt)
    }

    fn can_deactivate(&self) -> bool {
        false
    }

    fn on_hurt(&mut self, _cx: &HookCx<'_>, info: &HurtInfo) {
        self.hits += 1;
        self.damage += info.damage;
    }
}

pub fn session(config: SessionConfig) -> Session {
    Session::builder()
        .config(config)
        .register::<Dash>(DASH)
        .and_then(|builder| builder.register::<Siphon>(SIPHON))
        .unwrap()
        .build()
}

pub fn session_with_role(role: ReplicationRole) -> Session {
    session(SessionConfig {
        replication: role,
        ..SessionConfig::default()
    })
}
