//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::blockmap::Blockmap;
use crate::fixed::{Fixed, fixed_from_int};
use crate::geometry::{ButtonWhere, Line, LineState, Sector, Side, SideState};
use crate::id::{LineIndex, SectorIndex, SideIndex, ThinkerId};
use crate::mobj::{MF_COUNTKILL, MF_FRIEND, MF_NOBLOCKMAP, MF_SHOOTABLE, MF_SOLID, Mobj};
use crate::player::LevelId;
use crate::rng::RngClass;
use crate::specials::{
    AmbientSound, Ceiling, CeilingKind, Door, DoorKind, Floor, FloorKind, Glow, LightFlash, Plat,
    PlatKind, PlatStatus, Pusher, PusherKind, Scroll, ScrollKind,
};
use crate::thinker::{Think, ThinkerKind};
use crate::world::World;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: i32) -> Fixed {
    fixed_from_int(v)
}

// ===========================================================================
// Level builders
// ===========================================================================

/// A level of `sectors` sectors, each with two lines and two sides, and an
/// 8x8 blockmap at the origin.
pub fn test_level(sectors: usize) -> World {
    let sector_list = (0..sectors)
        .map(|i| {
            let mut s = Sector::new(fixed(0), fixed(128), 160);
            s.tag = i as i16;
            s.floorpic = 3;
            s.ceilingpic = 4;
            s
        })
        .collect();
    let sides: Vec<Side> = (0..sectors * 2)
        .map(|i| Side {
            state: SideState {
                toptexture: 1,
                bottomtexture: 2,
                midtexture: 0,
                textureoffset: Fixed::ZERO,
                rowoffset: Fixed::ZERO,
            },
            sector: SectorIndex((i / 2) as u32),
        })
        .collect();
    let lines = (0..sectors * 2)
        .map(|i| Line {
            state: LineState {
                special: 0,
                flags: 1,
            },
            tag: 0,
            front: Some(SideIndex(i as u32)),
            back: None,
        })
        .collect();
    World::new(
        sector_list,
        lines,
        sides,
        Blockmap::new(Fixed::ZERO, Fixed::ZERO, 8, 8),
    )
}

// ===========================================================================
// Actors
// ===========================================================================

/// A shootable, kill-counted monster.
pub fn spawn_monster(world: &mut World, sector: u32, x: i32, y: i32) -> ThinkerId {
    let mut mobj = Mobj::at(fixed(x), fixed(y), Fixed::ZERO, SectorIndex(sector));
    mobj.flags = MF_SOLID | MF_SHOOTABLE | MF_COUNTKILL;
    mobj.mobj_type = 9;
    mobj.radius = fixed(20);
    mobj.height = fixed(56);
    mobj.state = 174;
    mobj.tics = 10;
    world.spawn_mobj(mobj)
}

/// A friendly monster, sorted onto the friends class list.
pub fn spawn_friend(world: &mut World, sector: u32, x: i32, y: i32) -> ThinkerId {
    let id = spawn_monster(world, sector, x, y);
    if let Some(m) = world.thinkers.mobj_mut(id) {
        m.flags |= MF_FRIEND;
    }
    world.thinkers.update_class(id);
    id
}

/// A pickup that sits in a sector but stays out of the blockmap.
pub fn spawn_item(world: &mut World, sector: u32, x: i32, y: i32) -> ThinkerId {
    let mut mobj = Mobj::at(fixed(x), fixed(y), Fixed::ZERO, SectorIndex(sector));
    mobj.flags = MF_NOBLOCKMAP;
    mobj.mobj_type = 55;
    world.spawn_mobj(mobj)
}

// ===========================================================================
// Movers
// ===========================================================================

pub fn make_ceiling(sector: u32) -> Ceiling {
    Ceiling {
        kind: CeilingKind::CrushAndRaise,
        sector: SectorIndex(sector),
        bottomheight: fixed(8),
        topheight: fixed(128),
        speed: fixed(1),
        oldspeed: fixed(1),
        crush: true,
        direction: -1,
        tag: sector as i32,
        ..Ceiling::default()
    }
}

pub fn make_plat(sector: u32) -> Plat {
    Plat {
        sector: SectorIndex(sector),
        speed: fixed(4),
        low: fixed(-64),
        high: fixed(0),
        wait: 105,
        count: 0,
        status: PlatStatus::Down,
        oldstatus: PlatStatus::Up,
        tag: sector as i32,
        kind: PlatKind::DownWaitUpStay,
        ..Plat::default()
    }
}

pub fn make_door(sector: u32) -> Door {
    Door {
        kind: DoorKind::Normal,
        sector: SectorIndex(sector),
        topheight: fixed(124),
        speed: fixed(2),
        direction: 1,
        topwait: 150,
        ..Door::default()
    }
}

pub fn make_floor(sector: u32) -> Floor {
    Floor {
        kind: FloorKind::RaiseFloor,
        sector: SectorIndex(sector),
        direction: 1,
        floordestheight: fixed(64),
        speed: fixed(1),
        ..Floor::default()
    }
}

// ===========================================================================
// Populated world
// ===========================================================================

/// A level exercising every archived structure: all thinker classes, a
/// removed actor still referenced, sector nodes with a non-empty free list,
/// both active lists with one mover in stasis, lighting, a scroller, a
/// pusher with a source actor, dirty geometry, a pressed button, two
/// players and an advanced RNG.
pub fn populated_world() -> World {
    let mut w = test_level(6);

    let player = w
        .spawn_player(0, Mobj::at(fixed(40), fixed(40), Fixed::ZERO, SectorIndex(0)))
        .unwrap_or_default();
    w.spawn_player(2, Mobj::at(fixed(300), fixed(40), Fixed::ZERO, SectorIndex(1)));
    let imp = spawn_monster(&mut w, 1, 200, 60);
    let demon = spawn_monster(&mut w, 1, 210, 70);
    let friend = spawn_friend(&mut w, 2, 400, 400);
    let doomed = spawn_monster(&mut w, 2, 420, 420);
    let item = spawn_item(&mut w, 3, 500, 500);

    w.set_target(imp, Some(player));
    w.set_target(demon, Some(doomed));
    w.set_tracer(friend, Some(imp));
    w.set_lastenemy(imp, Some(friend));
    w.set_health(doomed, 0);
    w.remove_mobj(doomed);
    w.players[0].attacker = crate::thinker::ThinkerRef::Node(imp);

    w.set_touching(player, &[SectorIndex(0), SectorIndex(1)]);
    w.set_touching(imp, &[SectorIndex(1), SectorIndex(2)]);
    w.set_touching(demon, &[SectorIndex(1)]);
    w.set_touching(item, &[SectorIndex(3), SectorIndex(4)]);
    w.set_touching(item, &[SectorIndex(3)]);

    let crusher = w.spawn_ceiling(make_ceiling(1));
    let _ = w.spawn_ceiling(make_ceiling(2));
    w.stasis_ceiling(crusher);
    let lift = w.spawn_plat(make_plat(3));
    let _ = w.spawn_plat(make_plat(4));
    let finished = w.spawn_plat(make_plat(5));
    w.finish_plat(finished);
    w.stasis_plat(lift);
    w.spawn_door(make_door(0));
    w.spawn_floor(make_floor(5));

    w.spawn_light_flash(LightFlash {
        sector: SectorIndex(4),
        count: 3,
        maxlight: 200,
        minlight: 100,
        maxtime: 64,
        mintime: 7,
    });
    w.spawn_glow(Glow {
        sector: SectorIndex(5),
        minlight: 96,
        maxlight: 192,
        direction: -1,
    });
    w.spawn_thinker(
        Think::Scroll,
        ThinkerKind::Scroll(Scroll {
            kind: ScrollKind::Side,
            dx: fixed(1),
            affectee: 3,
            control: Some(SectorIndex(2)),
            accel: true,
            ..Scroll::default()
        }),
    );
    w.spawn_thinker(
        Think::Push,
        ThinkerKind::Pusher(Pusher {
            kind: PusherKind::Push,
            source: crate::thinker::ThinkerRef::Node(item),
            magnitude: 50,
            radius: 256,
            x: 500,
            y: 500,
            affectee: SectorIndex(3),
            ..Pusher::default()
        }),
    );
    w.spawn_thinker(
        Think::AmbientSound,
        ThinkerKind::AmbientSound(AmbientSound {
            source: crate::thinker::ThinkerRef::Node(demon),
            sfx: 12,
            volume: 100,
            min_tics: 35,
            max_tics: 70,
            active: true,
            ..AmbientSound::default()
        }),
    );
    w.sectors[1].soundtarget = crate::thinker::ThinkerRef::Node(player);
    w.sectors[2].soundtarget = crate::thinker::ThinkerRef::Node(doomed);

    w.set_line_special(LineIndex(3), 0);
    w.set_line_flags(LineIndex(7), 0x21);
    w.set_side_textures(SideIndex(2), 5, 6, 7);
    w.set_side_offsets(SideIndex(9), fixed(8), fixed(-4));
    w.start_button(LineIndex(3), ButtonWhere::Middle, 42, 35, Some(SectorIndex(1)));

    w.players[0].visited.push(LevelId { episode: 1, map: 1 });
    w.players[0].visited.push(LevelId { episode: 1, map: 2 });
    w.players[2].killcount = 7;
    for _ in 0..5 {
        w.rng.p_random(RngClass::Damage);
    }
    w.rng.m_random();
    w
}
