#![no_main]
use keyframe_core::serialize::restore;
use keyframe_core::test_utils::populated_world;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes to restore.
    // Must not panic -- returning Err is fine.
    let mut world = populated_world();
    let _ = restore(&mut world, data);
});
