//! Criterion benchmarks for snapshot capture and restore.
//!
//! Two benchmark groups:
//! - `capture`: snapshot a crowded level
//! - `restore`: rebuild the same level from its snapshot

use criterion::{Criterion, criterion_group, criterion_main};
use keyframe_core::World;
use keyframe_core::id::SectorIndex;
use keyframe_core::serialize::{capture, restore};
use keyframe_core::test_utils::*;

// ===========================================================================
// Level builder
// ===========================================================================

/// 64 sectors, 2000 actors each touching two sectors, 64 movers and a
/// handful of targets between actors.
fn build_crowded_level() -> World {
    let mut w = test_level(64);
    let mut actors = Vec::with_capacity(2000);
    for i in 0..2000u32 {
        let sector = i % 64;
        let x = (i % 40) as i32 * 25;
        let y = (i / 40) as i32 * 20;
        let id = spawn_monster(&mut w, sector, x, y);
        w.set_touching(id, &[SectorIndex(sector), SectorIndex((sector + 1) % 64)]);
        actors.push(id);
    }
    for pair in actors.chunks(2) {
        if let [a, b] = pair {
            w.set_target(*a, Some(*b));
        }
    }
    for s in 0..32 {
        w.spawn_ceiling(make_ceiling(s));
        w.spawn_plat(make_plat(s + 32));
    }
    w
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_capture(c: &mut Criterion) {
    let world = build_crowded_level();
    c.bench_function("capture", |b| {
        b.iter(|| capture(&world).unwrap());
    });
}

fn bench_restore(c: &mut Criterion) {
    let world = build_crowded_level();
    let bytes = capture(&world).unwrap();
    c.bench_function("restore", |b| {
        let mut target = world.clone();
        b.iter(|| restore(&mut target, &bytes).unwrap());
    });
}

criterion_group!(benches, bench_capture, bench_restore);
criterion_main!(benches);
