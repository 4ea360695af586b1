mod common;

use capability_core::{
    AsAny, AttachError, AttachmentData, AttachmentRecord, EntityId, HurtInfo, ObjectKey,
    ReplicationRole, TrackedObject,
};
use capability_runtime::{InputFrame, SessionConfig, SessionError, Slot};

use common::{DASH, Dash, SIPHON, Siphon, id, session_with_role};

const PLAYER: EntityId = EntityId(1);

fn pressed(activate: bool) -> InputFrame {
    InputFrame {
        attack: false,
        activate,
    }
}

#[test]
fn activate_key_edges_reach_an_entity_capability() {
    let session = session_with_role(ReplicationRole::Standalone);
    let mut host = session.spawn_host(PLAYER).unwrap();
    host.attach_to_entity(AttachmentRecord::bare(DASH));

    for frame in [true, true, false, false] {
        host.begin_tick();
        host.end_tick(pressed(frame));
    }

    let dash = host.dispatcher().get_singleton_as::<Dash>(&id(DASH)).unwrap();
    assert_eq!(dash.events, ["down", "while:0", "while:1", "up:2"]);
    assert_eq!(dash.activations, 1);
}

#[test]
fn held_object_attachment_comes_and_goes_with_selection() {
    let session = session_with_role(ReplicationRole::Standalone);
    let mut host = session.spawn_host(PLAYER).unwrap();

    let mut sword = TrackedObject::new(42);
    let sword_id = sword.ensure_identity(session.context().identities()).unwrap();
    host.select_held(sword);
    host.attach(Slot::Held, AttachmentRecord::bare(SIPHON)).unwrap();

    host.begin_tick();
    host.record_hurt(&HurtInfo {
        damage: 17,
        ..HurtInfo::default()
    });

    let key = ObjectKey::Object(sword_id);
    let handle = host.dispatcher().multi_instance(&id(SIPHON), key).unwrap();
    let siphon = host
        .dispatcher()
        .instance(handle)
        .and_then(|instance| instance.module().as_any().downcast_ref::<Siphon>())
        .unwrap();
    assert_eq!((siphon.hits, siphon.damage), (1, 17));
    assert_eq!(host.last_damage_tick(), Some(1));

    let previous = host.select_held(TrackedObject::air());
    assert_eq!(previous.identity(), Some(sword_id));
    assert!(host.dispatcher().multi_instance(&id(SIPHON), key).is_none());
    assert_eq!(host.dispatcher().live_multi_instances().count(), 0);
}

#[test]
fn held_object_record_gates_before_entity_record() {
    let session = session_with_role(ReplicationRole::Standalone);
    let mut host = session.spawn_host(PLAYER).unwrap();

    host.select_held(TrackedObject::new(7));
    host.attach(
        Slot::Held,
        AttachmentRecord::new(DASH, AttachmentData::new().with("locked", true)),
    )
    .unwrap();
    host.attach_to_entity(AttachmentRecord::bare(DASH));

    host.begin_tick();
    host.end_tick(pressed(true));
    let handle = host.dispatcher().singleton_handle(&id(DASH)).unwrap();
    assert!(!host.dispatcher().is_active(handle));
    assert_eq!(host.dispatcher().attachment_view(handle).len(), 2);

    assert_eq!(host.detach(Slot::Held, &id(DASH)).unwrap(), 1);
    host.begin_tick();
    host.end_tick(pressed(true));
    assert!(host.dispatcher().is_active(handle));
}

#[test]
fn slot_edits_are_checked() {
    let session = session_with_role(ReplicationRole::Standalone);
    let mut host = session.spawn_host(PLAYER).unwrap();

    let err = host
        .attach(Slot::Equipment(99), AttachmentRecord::bare(SIPHON))
        .unwrap_err();
    assert!(matches!(err, SessionError::UnknownSlot { slot: Slot::Equipment(99) }));

    host.put(Slot::Misc(0), TrackedObject::stackable(3, 99)).unwrap();
    let err = host
        .attach(Slot::Misc(0), AttachmentRecord::bare(SIPHON))
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Attach(AttachError::NotAttachable { .. })
    ));
}

#[test]
fn slot_counts_follow_config() {
    let session = common::session(SessionConfig {
        equipment_slots: 3,
        misc_slots: 1,
        ..SessionConfig::default()
    });
    let host = session.spawn_host(PLAYER).unwrap();

    assert_eq!(host.equipment().len(), 3);
    assert_eq!(host.misc().len(), 1);
    assert_eq!(host.objects().count(), 5);
    assert!(host.object(Slot::Equipment(3)).is_none());
}

#[test]
fn describe_reads_the_entity_singleton() {
    let session = session_with_role(ReplicationRole::Standalone);
    let mut host = session.spawn_host(PLAYER).unwrap();
    host.attach_to_entity(AttachmentRecord::bare(DASH));

    assert_eq!(host.dispatcher().describe(&id(DASH), false), ["Dash on activate"]);
    assert_eq!(host.dispatcher().describe(&id(DASH), true).len(), 2);
    assert!(host.dispatcher().describe(&id(SIPHON), false).is_empty());
}
