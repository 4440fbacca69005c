#![no_main]
use arbitrary::Arbitrary;
use keyframe_core::serialize::{capture, restore};
use keyframe_core::test_utils::populated_world;
use libfuzzer_sys::fuzz_target;

/// Overwrite one byte of a valid snapshot.
#[derive(Arbitrary, Debug)]
struct Patch {
    offset: u16,
    value: u8,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    patches: Vec<Patch>,
    truncate: Option<u16>,
}

fuzz_target!(|input: FuzzInput| {
    let mut world = populated_world();
    let Ok(mut bytes) = capture(&world) else {
        return;
    };
    for patch in input.patches.iter().take(16) {
        let at = patch.offset as usize % bytes.len();
        bytes[at] = patch.value;
    }
    if let Some(len) = input.truncate {
        bytes.truncate(len as usize);
    }

    let before = capture(&world).ok();
    if restore(&mut world, &bytes).is_err() {
        // A rejected snapshot must leave the world untouched.
        assert_eq!(capture(&world).ok(), before);
    }
});
