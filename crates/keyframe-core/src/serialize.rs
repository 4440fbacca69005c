//! Snapshot capture and restore.
//!
//! A snapshot is the concatenation of fixed sections with no header,
//! version tag or checksum; only a snapshot produced by the same build is
//! restorable. Capture runs a preparation pass over every identity domain
//! before any payload is written. Restore mirrors that with an allocation
//! pass before any field is read, so references resolve in both directions.
//!
//! Also provides a bounded rewind buffer of snapshots and per-section hashing
//! for desync debugging.

use crate::active_archive;
use crate::config::RewindConfig;
use crate::hash::StateHash;
use crate::pointer::{RefDecoder, RefEncoder};
use crate::secnode_archive;
use crate::stream::{LoadCursor, SaveBuffer};
use crate::thinker::{PayloadKind, Think};
use crate::thinker_archive;
use crate::world::World;
use crate::world_archive;
use std::collections::VecDeque;
use std::ops::Range;
use tracing::debug;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that abort a capture.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("unrecognized thinker kind: step {think:?} with {payload:?} payload")]
    UnknownThinker { think: Think, payload: PayloadKind },
    #[error("{domain} 0x{identity:016X} is referenced but not in its identity domain")]
    Unresolved { domain: &'static str, identity: u64 },
    #[error("{what} count {count} does not fit in 32 bits")]
    CountOverflow { what: &'static str, count: usize },
}

/// Errors that abort a restore. The world is left as it was.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("snapshot truncated: needed {needed} bytes at offset {offset} of {len}")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },
    #[error("invalid {what} value {value}")]
    InvalidEnum { what: &'static str, value: u8 },
    #[error("unknown thinker tag {value} at position {index}")]
    UnknownTag { index: usize, value: u8 },
    #[error("{domain} reference {value} out of range (domain holds {len})")]
    BadReference {
        domain: &'static str,
        value: i32,
        len: usize,
    },
    #[error("{what} index {index} out of range (level has {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: i64,
        len: usize,
    },
    #[error("snapshot has {found} sectors, level has {expected}")]
    SectorCount { expected: usize, found: usize },
    #[error("snapshot has {found} blockmap cells, level has {expected}")]
    BlockmapShape { expected: usize, found: usize },
    #[error("snapshot has {count} dirty {what}s but only {tracked} are tracked")]
    DirtyOverflow {
        what: &'static str,
        count: usize,
        tracked: usize,
    },
    #[error("{count} {what} exceeds the limit of {limit}")]
    TooMany {
        what: &'static str,
        count: usize,
        limit: usize,
    },
    #[error("visited level history of {0} entries exceeds the limit")]
    VisitedOverflow(usize),
    #[error("restored {0} lists are not closed circular lists")]
    BrokenList(&'static str),
    #[error("{0} unread bytes after the last section")]
    TrailingBytes(usize),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// The sections of a snapshot, in stream order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    ThinkerTags,
    SecNodeCounts,
    ActiveCeilingCount,
    ActivePlatCount,
    ThinkerPayloads,
    SecNodePayloads,
    ActiveCeilingPayloads,
    ActivePlatPayloads,
    Sectors,
    DirtyLines,
    DirtySides,
    Blockmap,
    Players,
    Buttons,
    Rng,
}

impl Section {
    pub const COUNT: usize = 15;

    pub const ALL: [Section; Self::COUNT] = [
        Section::ThinkerTags,
        Section::SecNodeCounts,
        Section::ActiveCeilingCount,
        Section::ActivePlatCount,
        Section::ThinkerPayloads,
        Section::SecNodePayloads,
        Section::ActiveCeilingPayloads,
        Section::ActivePlatPayloads,
        Section::Sectors,
        Section::DirtyLines,
        Section::DirtySides,
        Section::Blockmap,
        Section::Players,
        Section::Buttons,
        Section::Rng,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Byte range of every section within one captured snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotLayout {
    ranges: [Range<usize>; Section::COUNT],
}

impl SnapshotLayout {
    pub fn range(&self, section: Section) -> Range<usize> {
        self.ranges[section.index()].clone()
    }
}

/// Per-section hashes of one snapshot. Comparing two of these pinpoints
/// which subsystem diverged between two simulation instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHashes {
    hashes: [u64; Section::COUNT],
}

impl SectionHashes {
    pub fn new(snapshot: &[u8], layout: &SnapshotLayout) -> Self {
        let hashes = Section::ALL.map(|section| {
            let mut h = StateHash::new();
            if let Some(bytes) = snapshot.get(layout.range(section)) {
                h.write(bytes);
            }
            h.finish()
        });
        Self { hashes }
    }

    pub fn get(&self, section: Section) -> u64 {
        self.hashes[section.index()]
    }

    /// Sections whose hashes differ, in stream order.
    pub fn diverged(&self, other: &SectionHashes) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|&s| self.get(s) != other.get(s))
            .collect()
    }
}

/// Records the byte range each section occupies as it is written.
struct SectionWriter {
    out: SaveBuffer,
    layout: SnapshotLayout,
}

impl SectionWriter {
    fn section<T>(
        &mut self,
        section: Section,
        write: impl FnOnce(&mut SaveBuffer) -> Result<T, CaptureError>,
    ) -> Result<T, CaptureError> {
        let start = self.out.len();
        let value = write(&mut self.out)?;
        self.layout.ranges[section.index()] = start..self.out.len();
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Capture / restore
// ---------------------------------------------------------------------------

/// Capture the complete live state of `world`.
pub fn capture(world: &World) -> Result<Vec<u8>, CaptureError> {
    capture_with_layout(world).map(|(bytes, _)| bytes)
}

/// Capture, also returning where each section landed.
pub fn capture_with_layout(world: &World) -> Result<(Vec<u8>, SnapshotLayout), CaptureError> {
    let mut w = SectionWriter {
        out: SaveBuffer::with_capacity(4096),
        layout: SnapshotLayout::default(),
    };

    let thinkers = w.section(Section::ThinkerTags, |out| {
        thinker_archive::prepare(&world.thinkers, out)
    })?;
    let secnodes = w.section(Section::SecNodeCounts, |out| {
        secnode_archive::prepare(&world.sectors, &world.secnodes, out)
    })?;
    let ceilings = w.section(Section::ActiveCeilingCount, |out| {
        active_archive::prepare(&world.active_ceilings, out)
    })?;
    let plats = w.section(Section::ActivePlatCount, |out| {
        active_archive::prepare(&world.active_plats, out)
    })?;

    let enc = RefEncoder::new(&world.thinkers, thinkers, secnodes, ceilings, plats);
    w.section(Section::ThinkerPayloads, |out| {
        thinker_archive::write_payloads(&world.thinkers, &enc, out)
    })?;
    w.section(Section::SecNodePayloads, |out| {
        secnode_archive::write_payloads(&world.secnodes, &enc, out)
    })?;
    w.section(Section::ActiveCeilingPayloads, |out| {
        active_archive::write_payloads(&world.active_ceilings, &enc.ceilings, &enc, out)
    })?;
    w.section(Section::ActivePlatPayloads, |out| {
        active_archive::write_payloads(&world.active_plats, &enc.plats, &enc, out)
    })?;

    w.section(Section::Sectors, |out| {
        world_archive::write_sectors(&world.sectors, &enc, out)
    })?;
    w.section(Section::DirtyLines, |out| {
        world_archive::write_dirty_lines(world, out)
    })?;
    w.section(Section::DirtySides, |out| {
        world_archive::write_dirty_sides(world, out)
    })?;
    w.section(Section::Blockmap, |out| {
        world_archive::write_blockmap(world, &enc, out)
    })?;
    w.section(Section::Players, |out| {
        world_archive::write_players(world, &enc, out)
    })?;
    w.section(Section::Buttons, |out| {
        world_archive::write_buttons(&world.buttons, out);
        Ok(())
    })?;
    w.section(Section::Rng, |out| {
        world_archive::write_rng(&world.rng, out);
        Ok(())
    })?;

    debug!(
        bytes = w.out.len(),
        thinkers = enc.thinkers.len(),
        secnodes = enc.secnodes.len(),
        ceilings = enc.ceilings.len(),
        plats = enc.plats.len(),
        "captured snapshot"
    );
    Ok((w.out.into_bytes(), w.layout))
}

/// Hash every section of a fresh capture of `world`.
pub fn section_hashes(world: &World) -> Result<SectionHashes, CaptureError> {
    let (bytes, layout) = capture_with_layout(world)?;
    Ok(SectionHashes::new(&bytes, &layout))
}

/// Replace the live state of `world` with a snapshot.
///
/// Decoding happens on a staged copy; `world` is only replaced once the
/// whole snapshot has been read successfully.
pub fn restore(world: &mut World, data: &[u8]) -> Result<(), RestoreError> {
    let mut staged = world.clone();
    restore_into(&mut staged, data)?;
    *world = staged;
    Ok(())
}

fn restore_into(world: &mut World, data: &[u8]) -> Result<(), RestoreError> {
    let mut cur = LoadCursor::new(data);

    let thinkers = thinker_archive::allocate(&mut cur, &mut world.thinkers)?;
    let secnodes = secnode_archive::allocate(&mut cur, &mut world.secnodes)?;
    let ceilings = active_archive::allocate(&mut cur, &mut world.active_ceilings)?;
    let plats = active_archive::allocate(&mut cur, &mut world.active_plats)?;

    let dec = RefDecoder::new(
        thinkers,
        secnodes,
        ceilings,
        plats,
        world.sectors.len(),
        world.lines.len(),
    );
    thinker_archive::fill(&mut cur, &dec, &mut world.thinkers)?;
    secnode_archive::fill(&mut cur, &dec, &mut world.secnodes)?;
    active_archive::fill(&mut cur, &dec.ceilings, &dec, &mut world.active_ceilings)?;
    active_archive::fill(&mut cur, &dec.plats, &dec, &mut world.active_plats)?;

    world_archive::read_sectors(&mut world.sectors, &dec, &mut cur)?;
    world_archive::read_dirty_lines(world, &mut cur)?;
    world_archive::read_dirty_sides(world, &mut cur)?;
    world_archive::read_blockmap(world, &dec, &mut cur)?;
    world_archive::read_players(world, &dec, &mut cur)?;
    world_archive::read_buttons(&mut world.buttons, &dec, &mut cur)?;
    world_archive::read_rng(&mut world.rng, &mut cur)?;
    cur.finish()?;

    debug!(
        bytes = data.len(),
        thinkers = dec.thinkers.len(),
        secnodes = dec.secnodes.len(),
        "restored snapshot"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// RewindBuffer
// ---------------------------------------------------------------------------

/// The most recent checkpoints, oldest first. Pushing past capacity drops
/// the oldest.
#[derive(Debug)]
pub struct RewindBuffer {
    checkpoints: VecDeque<Checkpoint>,
    capacity: usize,
    total_taken: u64,
}

/// A snapshot and the tic it was taken on.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub tic: u64,
    pub data: Vec<u8>,
}

impl RewindBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            checkpoints: VecDeque::with_capacity(capacity),
            capacity,
            total_taken: 0,
        }
    }

    pub fn from_config(config: &RewindConfig) -> Self {
        Self::new(config.capacity)
    }

    pub fn push(&mut self, checkpoint: Checkpoint) {
        if self.checkpoints.len() == self.capacity {
            self.checkpoints.pop_front();
        }
        self.checkpoints.push_back(checkpoint);
        self.total_taken += 1;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Checkpoints ever pushed, evicted ones included.
    pub fn total_taken(&self) -> u64 {
        self.total_taken
    }

    /// 0 is the oldest retained checkpoint.
    pub fn get(&self, index: usize) -> Option<&Checkpoint> {
        self.checkpoints.get(index)
    }

    pub fn latest(&self) -> Option<&Checkpoint> {
        self.checkpoints.back()
    }

    /// Index of the newest checkpoint taken at or before `tic`.
    pub fn at_or_before(&self, tic: u64) -> Option<usize> {
        self.checkpoints.iter().rposition(|c| c.tic <= tic)
    }

    pub fn clear(&mut self) {
        self.checkpoints.clear();
    }
}

impl World {
    /// Capture the world into `buffer`, tagged with `tic`.
    pub fn take_checkpoint(
        &self,
        buffer: &mut RewindBuffer,
        tic: u64,
    ) -> Result<(), CaptureError> {
        let data = capture(self)?;
        debug!(tic, bytes = data.len(), "took checkpoint");
        buffer.push(Checkpoint { tic, data });
        Ok(())
    }

    /// Restore the checkpoint at `index` (0 = oldest). Returns its tic, or
    /// `None` if the index is out of range.
    pub fn rewind_to(
        &mut self,
        buffer: &RewindBuffer,
        index: usize,
    ) -> Result<Option<u64>, RestoreError> {
        let Some(checkpoint) = buffer.get(index) else {
            return Ok(None);
        };
        restore(self, &checkpoint.data)?;
        Ok(Some(checkpoint.tic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint(tic: u64) -> Checkpoint {
        Checkpoint {
            tic,
            data: vec![tic as u8],
        }
    }

    #[test]
    fn rewind_buffer_basic() {
        let mut buf = RewindBuffer::new(3);
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 3);
        buf.push(checkpoint(10));
        buf.push(checkpoint(20));
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.get(0).unwrap().tic, 10);
        assert_eq!(buf.latest().unwrap().tic, 20);
        assert!(buf.get(2).is_none());
    }

    #[test]
    fn rewind_buffer_evicts_oldest() {
        let mut buf = RewindBuffer::new(2);
        for tic in [1, 2, 3] {
            buf.push(checkpoint(tic));
        }
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.total_taken(), 3);
        assert_eq!(buf.get(0).unwrap().tic, 2);
        assert_eq!(buf.get(1).unwrap().tic, 3);
    }

    #[test]
    fn rewind_buffer_zero_capacity_clamped() {
        let buf = RewindBuffer::new(0);
        assert_eq!(buf.capacity(), 1);
    }

    #[test]
    fn rewind_buffer_clear_keeps_total() {
        let mut buf = RewindBuffer::new(2);
        buf.push(checkpoint(1));
        buf.clear();
        assert!(buf.latest().is_none());
        assert_eq!(buf.total_taken(), 1);
    }

    #[test]
    fn at_or_before_finds_newest_match() {
        let mut buf = RewindBuffer::new(4);
        for tic in [0, 35, 70] {
            buf.push(checkpoint(tic));
        }
        assert_eq!(buf.at_or_before(50), Some(1));
        assert_eq!(buf.at_or_before(70), Some(2));
        assert_eq!(buf.at_or_before(100), Some(2));
        buf.push(checkpoint(105));
        buf.push(checkpoint(140));
        assert_eq!(buf.at_or_before(10), None);
        assert_eq!(buf.get(0).unwrap().tic, 35);
    }

    #[test]
    fn section_hashes_report_divergence() {
        let mut layout = SnapshotLayout::default();
        layout.ranges[Section::Rng.index()] = 0..2;
        layout.ranges[Section::Buttons.index()] = 2..4;
        let a = SectionHashes::new(&[1, 2, 3, 4], &layout);
        let b = SectionHashes::new(&[1, 2, 3, 5], &layout);
        assert_eq!(a.diverged(&b), vec![Section::Buttons]);
        assert_eq!(a.diverged(&a), Vec::<Section>::new());
    }
}
