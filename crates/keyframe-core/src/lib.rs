//! Keyframe Core -- world-state snapshots for a tic-based game simulation.
//!
//! This crate captures the complete live state of a running level into a
//! flat byte buffer and restores it later, with every reference between
//! objects re-established. It is the primitive behind save games and
//! rollback checkpoints; the caller decides when to take snapshots.
//!
//! # Two-Pass Capture and Restore
//!
//! Objects point at each other freely (actors target actors, sectors point
//! at their movers, cross-reference nodes sit on two lists at once), so
//! neither direction can be done in one pass:
//!
//! 1. **Prepare / allocate** -- Every identity domain (thinkers, sector
//!    nodes, active ceiling nodes, active platform nodes) is numbered on
//!    capture, or allocated as empty objects on restore.
//! 2. **Payloads / fill** -- Fields are written with references encoded as
//!    dense indices, or read back with indices resolved to the allocated
//!    objects.
//!
//! ```rust,ignore
//! let bytes = keyframe_core::serialize::capture(&world)?;
//! // ... simulate ...
//! keyframe_core::serialize::restore(&mut world, &bytes)?;
//! ```
//!
//! # Key Types
//!
//! - [`world::World`] -- The level context: geometry, thinkers, auxiliary
//!   lists, blockmap, players, buttons and RNG.
//! - [`thinker::ThinkerList`] -- Thinker arena with the global and class
//!   circular lists.
//! - [`pointer::RefEncoder`] / [`pointer::RefDecoder`] -- Reference
//!   encoding with the null/cap/dummy/class-cap sentinels.
//! - [`serialize::RewindBuffer`] -- Ring buffer of checkpoints.
//! - [`serialize::SectionHashes`] -- Per-section hashes for desync hunting.

pub mod active;
pub mod active_archive;
pub mod blockmap;
pub mod config;
pub mod dirty;
pub mod fixed;
pub mod geometry;
pub mod hash;
pub mod id;
pub mod idmap;
pub mod mobj;
pub mod player;
pub mod pointer;
pub mod rng;
pub mod secnode;
pub mod secnode_archive;
pub mod serialize;
pub mod specials;
pub mod stream;
pub mod thinker;
pub mod thinker_archive;
pub mod world;
pub mod world_archive;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::RewindConfig;
pub use serialize::{
    CaptureError, RestoreError, RewindBuffer, Section, SectionHashes, capture,
    capture_with_layout, restore,
};
pub use world::World;
