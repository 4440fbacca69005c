//! Capture/restore behavior on hand-built worlds: sentinels, removed
//! actors, dirty geometry, the sector node free list and malformed input.

use keyframe_core::geometry::ButtonWhere;
use keyframe_core::id::{LineIndex, SectorIndex, SideIndex};
use keyframe_core::mobj::Mobj;
use keyframe_core::pointer::{CAP_REF, NULL_REF};
use keyframe_core::serialize::{
    CaptureError, RestoreError, Section, SectionHashes, capture, capture_with_layout, restore,
};
use keyframe_core::test_utils::*;
use keyframe_core::thinker::{Think, ThinkerClass, ThinkerKind, ThinkerRef};
use keyframe_core::World;

fn patch_i32(bytes: &mut [u8], at: usize, v: i32) {
    bytes[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

// ===========================================================================
// Round trips
// ===========================================================================

#[test]
fn populated_world_round_trips() {
    let world = populated_world();
    let bytes = capture(&world).unwrap();
    let mut restored = test_level(6);
    restored.playeringame = world.playeringame;
    // Restore needs the same dirty elements tracked as the capturing world.
    restored.set_line_special(LineIndex(3), 0);
    restored.set_line_flags(LineIndex(7), 1);
    restored.set_side_textures(SideIndex(2), 1, 2, 0);
    restored.set_side_offsets(SideIndex(9), fixed(0), fixed(0));
    restore(&mut restored, &bytes).unwrap();
    assert_eq!(capture(&restored).unwrap(), bytes);
    assert!(restored.thinkers.is_consistent());
    assert_eq!(restored.players[2].killcount, 7);
    assert_eq!(restored.players[0].visited.len(), 2);
    assert_eq!(restored.rng, world.rng);
    assert_eq!(restored.lines()[7].state.flags, 0x21);
    assert_eq!(restored.sides()[9].state.rowoffset, fixed(-4));
    assert_eq!(restored.buttons, world.buttons);
}

#[test]
fn empty_world_round_trips() {
    let mut world = test_level(2);
    let bytes = capture(&world).unwrap();
    restore(&mut world, &bytes).unwrap();
    assert!(world.thinkers.is_empty());
    assert_eq!(world.thinkers.cap().next, ThinkerRef::Cap);
    assert_eq!(capture(&world).unwrap(), bytes);
}

#[test]
fn class_lists_keep_their_members() {
    let mut w = populated_world();
    let before: Vec<_> = w
        .thinkers
        .iter()
        .map(|id| w.thinkers.class_of(id))
        .collect();
    let bytes = capture(&w).unwrap();
    restore(&mut w, &bytes).unwrap();
    let after: Vec<_> = w
        .thinkers
        .iter()
        .map(|id| w.thinkers.class_of(id))
        .collect();
    assert_eq!(before, after);
    assert!(after.iter().all(Option::is_some));
    for class in ThinkerClass::ALL {
        let members = w.thinkers.class_iter(class).count();
        let expected = before.iter().filter(|c| **c == Some(class)).count();
        assert_eq!(members, expected);
        if members == 0 {
            assert_eq!(w.thinkers.class_cap(class).next, ThinkerRef::ClassCap(class));
        }
    }
}

// ===========================================================================
// Sentinels and references
// ===========================================================================

#[test]
fn sentinels_survive_in_reference_fields() {
    let mut w = test_level(2);
    let a = spawn_monster(&mut w, 0, 10, 10);
    if let Some(m) = w.thinkers.mobj_mut(a) {
        m.tracer = ThinkerRef::Dummy;
        m.lastenemy = ThinkerRef::ClassCap(ThinkerClass::Friends);
    }
    w.sectors[1].floordata = ThinkerRef::Cap;

    let bytes = capture(&w).unwrap();
    let mut restored = w.clone();
    restore(&mut restored, &bytes).unwrap();

    let id = restored.thinkers.iter().next().unwrap();
    let m = restored.thinkers.mobj(id).unwrap();
    assert_eq!(m.tracer, ThinkerRef::Dummy);
    assert_eq!(m.lastenemy, ThinkerRef::ClassCap(ThinkerClass::Friends));
    assert_eq!(restored.sectors[1].floordata, ThinkerRef::Cap);
}

#[test]
fn sole_thinker_links_encode_the_cap() {
    let mut w = test_level(1);
    w.spawn_thinker(Think::Noop, ThinkerKind::Placeholder);
    let (bytes, layout) = capture_with_layout(&w).unwrap();
    let payload = layout.range(Section::ThinkerPayloads).start;
    // Global cap links then four class caps, all pointing at thinker 0.
    assert_eq!(read_i32(&bytes, payload), 0);
    assert_eq!(read_i32(&bytes, payload + 4), 0);
    // Thinker header: prev and next are both the cap.
    let header = payload + 8 + 4 * 8;
    assert_eq!(read_i32(&bytes, header), CAP_REF);
    assert_eq!(read_i32(&bytes, header + 4), CAP_REF);
}

#[test]
fn removed_actor_references_restore_as_null() {
    let mut w = test_level(2);
    let hunter = spawn_monster(&mut w, 0, 10, 10);
    let prey = spawn_monster(&mut w, 1, 300, 300);
    w.set_target(hunter, Some(prey));
    w.sectors[1].soundtarget = ThinkerRef::Node(prey);
    w.remove_mobj(prey);
    assert_eq!(w.reclaim_removed(), 0);

    let bytes = capture(&w).unwrap();
    let mut restored = w.clone();
    restore(&mut restored, &bytes).unwrap();

    let ids: Vec<_> = restored.thinkers.iter().collect();
    assert_eq!(ids.len(), 2);
    let hunter = restored.thinkers.mobj(ids[0]).unwrap();
    assert_eq!(hunter.target, ThinkerRef::Null);
    assert_eq!(restored.sectors[1].soundtarget, ThinkerRef::Null);
    let prey = restored.thinkers.get(ids[1]).unwrap();
    assert!(prey.is_removed_actor());
    assert_eq!(prey.references, 0);
    assert_eq!(restored.thinkers.class_of(ids[1]), Some(ThinkerClass::Delete));
}

#[test]
fn removed_actor_is_reclaimed_after_restore() {
    let mut w = test_level(2);
    let hunter = spawn_monster(&mut w, 0, 10, 10);
    let tracker = spawn_monster(&mut w, 0, 40, 10);
    let prey = spawn_monster(&mut w, 1, 300, 300);
    w.set_target(hunter, Some(prey));
    w.set_tracer(tracker, Some(prey));
    w.set_lastenemy(tracker, Some(prey));
    w.remove_mobj(prey);
    assert_eq!(w.thinkers.get(prey).unwrap().references, 3);

    let bytes = capture(&w).unwrap();
    let mut restored = w.clone();
    restore(&mut restored, &bytes).unwrap();
    assert_eq!(capture(&restored).unwrap(), bytes);
    assert_eq!(restored.reclaim_removed(), 1);
    assert_eq!(restored.thinkers.len(), 2);
    assert!(restored.thinkers.is_consistent());

    // The live world still holds its references until they are cleared.
    assert_eq!(w.reclaim_removed(), 0);
    w.set_target(hunter, None);
    w.set_tracer(tracker, None);
    w.set_lastenemy(tracker, None);
    assert_eq!(w.reclaim_removed(), 1);
}

#[test]
fn colliding_indices_resolve_in_their_own_domain() {
    // Thinker 0, sector node 0, ceiling node 0 and plat node 0 all exist,
    // and each points across domains.
    let mut w = test_level(3);
    let mo = spawn_monster(&mut w, 0, 10, 10);
    w.set_touching(mo, &[SectorIndex(0)]);
    w.spawn_ceiling(make_ceiling(1));
    w.spawn_plat(make_plat(2));

    let (bytes, layout) = capture_with_layout(&w).unwrap();
    let node = layout.range(Section::SecNodePayloads).start;
    assert_eq!(read_i32(&bytes, node + 4), 0);
    let ceiling = layout.range(Section::ActiveCeilingPayloads).start;
    assert_eq!(read_i32(&bytes, ceiling), 1);
    let plat = layout.range(Section::ActivePlatPayloads).start;
    assert_eq!(read_i32(&bytes, plat), 2);

    let mut restored = w.clone();
    restore(&mut restored, &bytes).unwrap();
    let ids: Vec<_> = restored.thinkers.iter().collect();

    let head = restored.thinkers.mobj(ids[0]).unwrap().touching_sectorlist.unwrap();
    let node = restored.secnodes.get(head).unwrap();
    assert_eq!(node.thing, ThinkerRef::Node(ids[0]));
    assert_eq!(node.sector, SectorIndex(0));

    let ceiling_node = restored.active_ceilings.head().unwrap();
    assert_eq!(
        restored.active_ceilings.get(ceiling_node).unwrap().mover,
        ThinkerRef::Node(ids[1])
    );
    match &restored.thinkers.get(ids[1]).unwrap().kind {
        ThinkerKind::Ceiling(c) => assert_eq!(c.list, Some(ceiling_node)),
        other => panic!("expected a ceiling, got {other:?}"),
    }

    let plat_node = restored.active_plats.head().unwrap();
    assert_eq!(
        restored.active_plats.get(plat_node).unwrap().mover,
        ThinkerRef::Node(ids[2])
    );
    match &restored.thinkers.get(ids[2]).unwrap().kind {
        ThinkerKind::Plat(p) => assert_eq!(p.list, Some(plat_node)),
        other => panic!("expected a plat, got {other:?}"),
    }
}

#[test]
fn null_reference_is_minus_one() {
    let mut w = test_level(1);
    spawn_monster(&mut w, 0, 10, 10);
    let (bytes, layout) = capture_with_layout(&w).unwrap();
    let sectors = layout.range(Section::Sectors);
    // Sector soundtarget sits after the six fixed fields, two angles, the
    // tint and five shorts.
    let soundtarget = sectors.start + 4 + 6 * 4 + 2 * 4 + 4 + 5 * 2;
    assert_eq!(read_i32(&bytes, soundtarget), NULL_REF);
}

#[test]
fn unknown_thinker_kind_fails_capture() {
    let mut w = test_level(1);
    w.spawn_thinker(Think::Glow, ThinkerKind::Placeholder);
    let err = capture(&w).unwrap_err();
    assert!(matches!(
        err,
        CaptureError::UnknownThinker {
            think: Think::Glow,
            ..
        }
    ));
}

// ===========================================================================
// Auxiliary lists
// ===========================================================================

#[test]
fn free_list_length_is_preserved_and_reused() {
    let mut w = test_level(4);
    let a = spawn_monster(&mut w, 0, 10, 10);
    w.set_touching(a, &[SectorIndex(0), SectorIndex(1), SectorIndex(2)]);
    w.set_touching(a, &[SectorIndex(0)]);
    assert_eq!(w.secnodes.free_len(), 2);
    let allocated = w.secnodes.allocated();

    let bytes = capture(&w).unwrap();
    let mut restored = w.clone();
    restore(&mut restored, &bytes).unwrap();
    assert_eq!(restored.secnodes.free_len(), 2);
    assert_eq!(restored.secnodes.allocated(), allocated);

    let id = restored.thinkers.iter().next().unwrap();
    restored.touch_sector(id, SectorIndex(3));
    assert_eq!(restored.secnodes.free_len(), 1);
    assert_eq!(restored.secnodes.allocated(), allocated);
    assert_eq!(restored.touched_sectors(id), vec![SectorIndex(3), SectorIndex(0)]);
}

#[test]
fn stasis_movers_keep_payload_and_step() {
    let mut w = test_level(3);
    let c = w.spawn_ceiling(make_ceiling(1));
    let p = w.spawn_plat(make_plat(2));
    w.stasis_ceiling(c);
    w.stasis_plat(p);
    let bytes = capture(&w).unwrap();
    let mut restored = w.clone();
    restore(&mut restored, &bytes).unwrap();

    let ids: Vec<_> = restored.thinkers.iter().collect();
    let ceiling = restored.thinkers.get(ids[0]).unwrap();
    assert_eq!(ceiling.think, Think::Noop);
    let ThinkerKind::Ceiling(c) = &ceiling.kind else {
        panic!("expected a ceiling");
    };
    assert_eq!(c.olddirection, -1);
    assert_eq!(restored.active_ceilings.find_mover(ids[0]), c.list);

    let plat = restored.thinkers.get(ids[1]).unwrap();
    assert_eq!(plat.think, Think::Noop);
    assert_eq!(restored.active_plats.len(), 1);
}

// ===========================================================================
// Dirty geometry
// ===========================================================================

#[test]
fn untouched_geometry_emits_no_records() {
    let w = test_level(3);
    let (bytes, layout) = capture_with_layout(&w).unwrap();
    assert_eq!(&bytes[layout.range(Section::DirtyLines)], &[0, 0, 0, 0]);
    assert_eq!(&bytes[layout.range(Section::DirtySides)], &[0, 0, 0, 0]);
}

#[test]
fn reverted_line_is_still_emitted() {
    let mut w = test_level(3);
    w.set_line_special(LineIndex(2), 11);
    w.set_line_special(LineIndex(2), 0);
    assert_eq!(w.lines()[2].state, keyframe_core::geometry::LineState { special: 0, flags: 1 });
    let (bytes, layout) = capture_with_layout(&w).unwrap();
    // One record: count, special 0, flags 1.
    assert_eq!(
        &bytes[layout.range(Section::DirtyLines)],
        &[1, 0, 0, 0, 0, 0, 1, 0, 0, 0]
    );
}

#[test]
fn lines_dirtied_after_capture_reset_to_baseline() {
    let mut w = test_level(3);
    w.set_line_special(LineIndex(0), 48);
    let bytes = capture(&w).unwrap();
    w.set_line_special(LineIndex(0), 0);
    w.set_line_flags(LineIndex(4), 0xff);
    w.set_side_textures(SideIndex(1), 9, 9, 9);
    restore(&mut w, &bytes).unwrap();
    assert_eq!(w.lines()[0].state.special, 48);
    assert_eq!(w.lines()[4].state.flags, 1);
    assert_eq!(w.sides()[1].state.toptexture, 1);
    // Tracking is monotonic.
    assert!(w.geometry().is_line_dirty(LineIndex(4)));
}

#[test]
fn more_dirty_records_than_tracked_is_an_error() {
    let mut w = test_level(3);
    w.set_line_special(LineIndex(0), 48);
    let bytes = capture(&w).unwrap();
    let mut fresh = test_level(3);
    let err = restore(&mut fresh, &bytes).unwrap_err();
    assert!(matches!(
        err,
        RestoreError::DirtyOverflow {
            what: "line",
            count: 1,
            tracked: 0
        }
    ));
    assert_eq!(fresh.lines()[0].state.special, 0);
}

// ===========================================================================
// Malformed input
// ===========================================================================

#[test]
fn trailing_bytes_are_rejected() {
    let mut w = populated_world();
    let mut bytes = capture(&w).unwrap();
    bytes.push(0);
    assert!(matches!(
        restore(&mut w, &bytes),
        Err(RestoreError::TrailingBytes(1))
    ));
}

#[test]
fn unknown_tag_is_rejected() {
    let mut w = populated_world();
    let mut bytes = capture(&w).unwrap();
    bytes[4] = 200;
    assert!(matches!(
        restore(&mut w, &bytes),
        Err(RestoreError::UnknownTag {
            index: 0,
            value: 200
        })
    ));
}

#[test]
fn out_of_range_mover_reference_is_rejected() {
    let mut w = test_level(2);
    w.spawn_ceiling(make_ceiling(1));
    let (mut bytes, layout) = capture_with_layout(&w).unwrap();
    let at = layout.range(Section::ActiveCeilingPayloads).start;
    patch_i32(&mut bytes, at, 9999);
    let before = capture(&w).unwrap();
    assert!(matches!(
        restore(&mut w, &bytes),
        Err(RestoreError::BadReference { value: 9999, .. })
    ));
    assert_eq!(capture(&w).unwrap(), before);
}

#[test]
fn sector_count_mismatch_is_rejected() {
    let w = test_level(3);
    let bytes = capture(&w).unwrap();
    let mut other = test_level(4);
    assert!(matches!(
        restore(&mut other, &bytes),
        Err(RestoreError::SectorCount {
            expected: 4,
            found: 3
        })
    ));
}

#[test]
fn failed_restore_leaves_world_intact() {
    let mut w = populated_world();
    let before = capture(&w).unwrap();
    w.rng.m_random();
    let drifted = capture(&w).unwrap();
    let mut bytes = before.clone();
    bytes.truncate(bytes.len() - 3);
    assert!(matches!(
        restore(&mut w, &bytes),
        Err(RestoreError::Truncated { .. })
    ));
    assert_eq!(capture(&w).unwrap(), drifted);
}

// ===========================================================================
// Players, buttons, hashes
// ===========================================================================

#[test]
fn only_ingame_players_are_archived() {
    let mut w = test_level(2);
    let (bytes, layout) = capture_with_layout(&w).unwrap();
    assert!(layout.range(Section::Players).is_empty());

    w.spawn_player(1, Mobj::at(fixed(10), fixed(10), fixed(0), SectorIndex(0)));
    let (with_player, layout) = capture_with_layout(&w).unwrap();
    assert!(!layout.range(Section::Players).is_empty());
    assert!(with_player.len() > bytes.len());
}

#[test]
fn player_actor_reference_survives() {
    let mut w = test_level(2);
    w.spawn_player(0, Mobj::at(fixed(10), fixed(10), fixed(0), SectorIndex(0)));
    let imp = spawn_monster(&mut w, 1, 200, 200);
    w.players[0].attacker = ThinkerRef::Node(imp);
    let bytes = capture(&w).unwrap();
    restore(&mut w, &bytes).unwrap();

    let ids: Vec<_> = w.thinkers.iter().collect();
    assert_eq!(w.players[0].mo, ThinkerRef::Node(ids[0]));
    assert_eq!(w.players[0].attacker, ThinkerRef::Node(ids[1]));
    assert_eq!(w.thinkers.mobj(ids[0]).unwrap().player, Some(0));
}

#[test]
fn pressed_button_survives() {
    let mut w = test_level(2);
    let slot = w
        .start_button(LineIndex(1), ButtonWhere::Bottom, 17, 35, None)
        .unwrap();
    let bytes = capture(&w).unwrap();
    w.buttons[slot].timer = 0;
    restore(&mut w, &bytes).unwrap();
    assert_eq!(w.buttons[slot].line, Some(LineIndex(1)));
    assert_eq!(w.buttons[slot].position, ButtonWhere::Bottom);
    assert_eq!(w.buttons[slot].timer, 35);
}

#[test]
fn section_hashes_isolate_rng_drift() {
    let a = populated_world();
    let mut b: World = a.clone();
    b.rng.m_random();
    let hash = |w: &World| {
        let (bytes, layout) = capture_with_layout(w).unwrap();
        SectionHashes::new(&bytes, &layout)
    };
    assert_eq!(hash(&a).diverged(&hash(&b)), vec![Section::Rng]);
}
