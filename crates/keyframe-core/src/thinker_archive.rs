//! Archiver for the thinker graph.
//!
//! Each thinker is classified into a closed set of tags by its step
//! function and payload kind. Capture emits the tag list first and the
//! payloads second; restore allocates one empty thinker per tag before it
//! reads any payload, so references in either direction resolve.

use std::collections::HashMap;

use crate::id::ThinkerId;
use crate::mobj::Mobj;
use crate::player::MAXPLAYERS;
use crate::pointer::{AllocTable, IndexDomain, RefDecoder, RefEncoder, encode_index};
use crate::serialize::{CaptureError, RestoreError};
use crate::specials::{
    AmbientSound, Ceiling, Door, Elevator, FireFlicker, Floor, Friction, Glow, LightFlash, Plat,
    Pusher, Scroll, Strobe,
};
use crate::stream::{LoadCursor, SaveBuffer, WireEnum, wire_enum};
use crate::thinker::{
    Links, PayloadKind, Think, Thinker, ThinkerClass, ThinkerKind, ThinkerList,
};
use tracing::{debug, trace};

wire_enum! {
    /// Stream tag of one thinker. Removal and stasis states get their own
    /// tags so restore can re-derive the step function.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ThinkerTag {
        Placeholder = 0,
        Mobj = 1,
        MobjRemoved = 2,
        Door = 3,
        DoorRemoved = 4,
        Ceiling = 5,
        CeilingRemoved = 6,
        CeilingStasis = 7,
        Floor = 8,
        FloorRemoved = 9,
        Plat = 10,
        PlatRemoved = 11,
        PlatStasis = 12,
        Elevator = 13,
        ElevatorRemoved = 14,
        LightFlash = 15,
        StrobeFlash = 16,
        Glow = 17,
        FireFlicker = 18,
        Scroll = 19,
        Pusher = 20,
        Friction = 21,
        AmbientSound = 22,
    }
}

/// Step function and payload kind per tag, indexed by tag value.
const TAG_TABLE: [(Think, PayloadKind); 23] = [
    (Think::Noop, PayloadKind::Placeholder),
    (Think::Mobj, PayloadKind::Mobj),
    (Think::RemoveDelayed, PayloadKind::Mobj),
    (Think::MoveDoor, PayloadKind::Door),
    (Think::RemoveDelayed, PayloadKind::Door),
    (Think::MoveCeiling, PayloadKind::Ceiling),
    (Think::RemoveDelayed, PayloadKind::Ceiling),
    (Think::Noop, PayloadKind::Ceiling),
    (Think::MoveFloor, PayloadKind::Floor),
    (Think::RemoveDelayed, PayloadKind::Floor),
    (Think::MovePlat, PayloadKind::Plat),
    (Think::RemoveDelayed, PayloadKind::Plat),
    (Think::Noop, PayloadKind::Plat),
    (Think::MoveElevator, PayloadKind::Elevator),
    (Think::RemoveDelayed, PayloadKind::Elevator),
    (Think::LightFlash, PayloadKind::LightFlash),
    (Think::StrobeFlash, PayloadKind::Strobe),
    (Think::Glow, PayloadKind::Glow),
    (Think::FireFlicker, PayloadKind::FireFlicker),
    (Think::Scroll, PayloadKind::Scroll),
    (Think::Push, PayloadKind::Pusher),
    (Think::Friction, PayloadKind::Friction),
    (Think::AmbientSound, PayloadKind::AmbientSound),
];

impl ThinkerTag {
    /// The tag for a thinker's current state, if it is archivable.
    pub fn classify(thinker: &Thinker) -> Option<Self> {
        let key = (thinker.think, thinker.kind.payload_kind());
        TAG_TABLE
            .iter()
            .position(|&entry| entry == key)
            .and_then(|i| Self::from_wire(i as u8))
    }

    pub fn think(self) -> Think {
        TAG_TABLE[self as usize].0
    }

    pub fn payload(self) -> PayloadKind {
        TAG_TABLE[self as usize].1
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// Number every thinker in global list order and emit the tag list.
pub fn prepare(
    list: &ThinkerList,
    out: &mut SaveBuffer,
) -> Result<IndexDomain<ThinkerId>, CaptureError> {
    let live: Vec<(ThinkerId, &Thinker)> = list
        .iter()
        .filter_map(|id| list.get(id).map(|t| (id, t)))
        .collect();
    out.write_count("thinkers", live.len())?;
    let mut domain = IndexDomain::with_capacity(live.len());
    for (id, thinker) in live {
        let tag = ThinkerTag::classify(thinker).ok_or(CaptureError::UnknownThinker {
            think: thinker.think,
            payload: thinker.kind.payload_kind(),
        })?;
        let index = domain.assign(id);
        trace!(index, ?tag, "classified thinker");
        out.write_enum(tag);
    }
    debug!(thinkers = domain.len(), "prepared thinker domain");
    Ok(domain)
}

/// Emit the caps, then every thinker's header and payload in index order.
pub fn write_payloads(
    list: &ThinkerList,
    enc: &RefEncoder<'_>,
    out: &mut SaveBuffer,
) -> Result<(), CaptureError> {
    write_links(list.cap(), enc, out)?;
    for class in ThinkerClass::ALL {
        write_links(list.class_cap(class), enc, out)?;
    }
    let dropped = dropped_references(list);
    for &id in enc.thinkers.keys() {
        let Some(thinker) = list.get(id) else {
            return Err(CaptureError::Unresolved {
                domain: "thinker",
                identity: crate::id::Domain::identity(id),
            });
        };
        write_links(thinker.links, enc, out)?;
        write_links(thinker.class_links, enc, out)?;
        out.write_i32(thinker.references - dropped.get(&id).copied().unwrap_or(0));
        if let Some(payload) = payload(&thinker.kind) {
            payload.write(enc, out)?;
        }
    }
    Ok(())
}

/// Counted actor references that are written as null because they point at
/// a removed actor, keyed by the removed actor. Its archived count drops by
/// the same amount so it can still be reclaimed after a restore.
fn dropped_references(list: &ThinkerList) -> HashMap<ThinkerId, i32> {
    let mut dropped = HashMap::new();
    for id in list.iter() {
        let Some(m) = list.mobj(id) else {
            continue;
        };
        for r in [m.target, m.tracer, m.lastenemy] {
            if let Some(to) = r.node() {
                if list.get(to).is_some_and(|t| t.is_removed_actor()) {
                    *dropped.entry(to).or_insert(0) += 1;
                }
            }
        }
    }
    dropped
}

fn write_links(
    links: Links,
    enc: &RefEncoder<'_>,
    out: &mut SaveBuffer,
) -> Result<(), CaptureError> {
    out.write_i32(enc.thinker(links.prev)?);
    out.write_i32(enc.thinker(links.next)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Restore
// ---------------------------------------------------------------------------

/// Read the tag list and allocate one empty thinker per tag.
pub fn allocate(
    cur: &mut LoadCursor<'_>,
    list: &mut ThinkerList,
) -> Result<AllocTable<ThinkerId>, RestoreError> {
    list.clear();
    let count = cur.read_len(1)?;
    let mut tags = Vec::with_capacity(count);
    for index in 0..count {
        let value = cur.read8()?;
        let tag = ThinkerTag::from_wire(value).ok_or(RestoreError::UnknownTag { index, value })?;
        tags.push(tag);
    }
    let table: AllocTable<ThinkerId> = tags
        .iter()
        .map(|tag| list.insert_unlinked(Thinker::new(tag.think(), tag.payload().empty())))
        .collect();
    debug!(thinkers = table.len(), "allocated thinkers");
    Ok(table)
}

/// Fill the caps and every allocated thinker, then check the lists close.
pub fn fill(
    cur: &mut LoadCursor<'_>,
    dec: &RefDecoder,
    list: &mut ThinkerList,
) -> Result<(), RestoreError> {
    list.set_cap(read_links(cur, dec)?);
    for class in ThinkerClass::ALL {
        list.set_class_cap(class, read_links(cur, dec)?);
    }
    for &id in dec.thinkers.keys() {
        let links = read_links(cur, dec)?;
        let class_links = read_links(cur, dec)?;
        let references = cur.read_i32()?;
        let Some(thinker) = list.get_mut(id) else {
            return Err(RestoreError::BrokenList("thinker"));
        };
        thinker.links = links;
        thinker.class_links = class_links;
        thinker.references = references;
        if let Some(payload) = payload_mut(&mut thinker.kind) {
            payload.read(dec, cur)?;
        }
    }
    if !list.is_consistent() {
        return Err(RestoreError::BrokenList("thinker"));
    }
    Ok(())
}

fn read_links(cur: &mut LoadCursor<'_>, dec: &RefDecoder) -> Result<Links, RestoreError> {
    Ok(Links {
        prev: dec.thinker(cur.read_i32()?)?,
        next: dec.thinker(cur.read_i32()?)?,
    })
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Field layout of one kind-specific payload.
trait Payload {
    fn write(&self, enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError>;

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError>;
}

fn payload(kind: &ThinkerKind) -> Option<&dyn Payload> {
    let payload: &dyn Payload = match kind {
        ThinkerKind::Placeholder => return None,
        ThinkerKind::Mobj(p) => &**p,
        ThinkerKind::Door(p) => p,
        ThinkerKind::Ceiling(p) => p,
        ThinkerKind::Floor(p) => p,
        ThinkerKind::Plat(p) => p,
        ThinkerKind::Elevator(p) => p,
        ThinkerKind::LightFlash(p) => p,
        ThinkerKind::Strobe(p) => p,
        ThinkerKind::Glow(p) => p,
        ThinkerKind::FireFlicker(p) => p,
        ThinkerKind::Scroll(p) => p,
        ThinkerKind::Pusher(p) => p,
        ThinkerKind::Friction(p) => p,
        ThinkerKind::AmbientSound(p) => p,
    };
    Some(payload)
}

fn payload_mut(kind: &mut ThinkerKind) -> Option<&mut dyn Payload> {
    let payload: &mut dyn Payload = match kind {
        ThinkerKind::Placeholder => return None,
        ThinkerKind::Mobj(p) => &mut **p,
        ThinkerKind::Door(p) => p,
        ThinkerKind::Ceiling(p) => p,
        ThinkerKind::Floor(p) => p,
        ThinkerKind::Plat(p) => p,
        ThinkerKind::Elevator(p) => p,
        ThinkerKind::LightFlash(p) => p,
        ThinkerKind::Strobe(p) => p,
        ThinkerKind::Glow(p) => p,
        ThinkerKind::FireFlicker(p) => p,
        ThinkerKind::Scroll(p) => p,
        ThinkerKind::Pusher(p) => p,
        ThinkerKind::Friction(p) => p,
        ThinkerKind::AmbientSound(p) => p,
    };
    Some(payload)
}

const NO_PLAYER: u8 = 0xff;

impl Payload for Mobj {
    fn write(&self, enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        for v in [self.x, self.y, self.z, self.momx, self.momy, self.momz] {
            out.write_fixed(v);
        }
        out.write32(self.angle);
        for v in [self.floorz, self.ceilingz, self.dropoffz, self.radius, self.height] {
            out.write_fixed(v);
        }
        out.write32(self.sector.0);
        out.write_i32(self.mobj_type);
        out.write_i32(self.state);
        out.write_i32(self.tics);
        out.write32(self.flags);
        for v in [
            self.health,
            self.movedir,
            self.movecount,
            self.reactiontime,
            self.threshold,
            self.lastlook,
        ] {
            out.write_i32(v);
        }
        out.write_i32(enc.actor(self.target)?);
        out.write_i32(enc.actor(self.tracer)?);
        out.write_i32(enc.actor(self.lastenemy)?);
        out.write8(self.player.unwrap_or(NO_PLAYER));
        out.write_i32(enc.thinker(self.snext)?);
        out.write_i32(enc.thinker(self.sprev)?);
        out.write_i32(enc.secnode(self.touching_sectorlist)?);
        out.write_fixed(self.friction);
        out.write_fixed(self.movefactor);
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        for v in [
            &mut self.x,
            &mut self.y,
            &mut self.z,
            &mut self.momx,
            &mut self.momy,
            &mut self.momz,
        ] {
            *v = cur.read_fixed()?;
        }
        self.angle = cur.read32()?;
        for v in [
            &mut self.floorz,
            &mut self.ceilingz,
            &mut self.dropoffz,
            &mut self.radius,
            &mut self.height,
        ] {
            *v = cur.read_fixed()?;
        }
        self.sector = dec.sector(cur.read32()?)?;
        self.mobj_type = cur.read_i32()?;
        self.state = cur.read_i32()?;
        self.tics = cur.read_i32()?;
        self.flags = cur.read32()?;
        for v in [
            &mut self.health,
            &mut self.movedir,
            &mut self.movecount,
            &mut self.reactiontime,
            &mut self.threshold,
            &mut self.lastlook,
        ] {
            *v = cur.read_i32()?;
        }
        self.target = dec.thinker(cur.read_i32()?)?;
        self.tracer = dec.thinker(cur.read_i32()?)?;
        self.lastenemy = dec.thinker(cur.read_i32()?)?;
        self.player = match cur.read8()? {
            NO_PLAYER => None,
            slot if (slot as usize) < MAXPLAYERS => Some(slot),
            slot => {
                return Err(RestoreError::IndexOutOfRange {
                    what: "player slot",
                    index: i64::from(slot),
                    len: MAXPLAYERS,
                });
            }
        };
        self.snext = dec.thinker(cur.read_i32()?)?;
        self.sprev = dec.thinker(cur.read_i32()?)?;
        self.touching_sectorlist = dec.secnode(cur.read_i32()?)?;
        self.friction = cur.read_fixed()?;
        self.movefactor = cur.read_fixed()?;
        Ok(())
    }
}

impl Payload for Door {
    fn write(&self, _enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        out.write_enum(self.kind);
        out.write32(self.sector.0);
        out.write_fixed(self.topheight);
        out.write_fixed(self.speed);
        out.write_i32(self.direction);
        out.write_i32(self.topwait);
        out.write_i32(self.topcountdown);
        out.write_i32(encode_index(self.line.map(|l| l.0)));
        out.write_i32(self.lighttag);
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        self.kind = cur.read_enum()?;
        self.sector = dec.sector(cur.read32()?)?;
        self.topheight = cur.read_fixed()?;
        self.speed = cur.read_fixed()?;
        self.direction = cur.read_i32()?;
        self.topwait = cur.read_i32()?;
        self.topcountdown = cur.read_i32()?;
        self.line = dec.line_opt(cur.read_i32()?)?;
        self.lighttag = cur.read_i32()?;
        Ok(())
    }
}

impl Payload for Ceiling {
    fn write(&self, enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        out.write_enum(self.kind);
        out.write32(self.sector.0);
        out.write_fixed(self.bottomheight);
        out.write_fixed(self.topheight);
        out.write_fixed(self.speed);
        out.write_fixed(self.oldspeed);
        out.write_bool(self.crush);
        out.write_i16(self.newspecial);
        out.write_i16(self.oldspecial);
        out.write_i16(self.texture);
        out.write_i32(self.direction);
        out.write_i32(self.tag);
        out.write_i32(self.olddirection);
        out.write_i32(enc.ceiling_node(self.list)?);
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        self.kind = cur.read_enum()?;
        self.sector = dec.sector(cur.read32()?)?;
        self.bottomheight = cur.read_fixed()?;
        self.topheight = cur.read_fixed()?;
        self.speed = cur.read_fixed()?;
        self.oldspeed = cur.read_fixed()?;
        self.crush = cur.read_bool()?;
        self.newspecial = cur.read_i16()?;
        self.oldspecial = cur.read_i16()?;
        self.texture = cur.read_i16()?;
        self.direction = cur.read_i32()?;
        self.tag = cur.read_i32()?;
        self.olddirection = cur.read_i32()?;
        self.list = dec.ceiling_node(cur.read_i32()?)?;
        Ok(())
    }
}

impl Payload for Floor {
    fn write(&self, _enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        out.write_enum(self.kind);
        out.write_bool(self.crush);
        out.write32(self.sector.0);
        out.write_i32(self.direction);
        out.write_i16(self.newspecial);
        out.write_i16(self.oldspecial);
        out.write_i16(self.texture);
        out.write_fixed(self.floordestheight);
        out.write_fixed(self.speed);
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        self.kind = cur.read_enum()?;
        self.crush = cur.read_bool()?;
        self.sector = dec.sector(cur.read32()?)?;
        self.direction = cur.read_i32()?;
        self.newspecial = cur.read_i16()?;
        self.oldspecial = cur.read_i16()?;
        self.texture = cur.read_i16()?;
        self.floordestheight = cur.read_fixed()?;
        self.speed = cur.read_fixed()?;
        Ok(())
    }
}

impl Payload for Plat {
    fn write(&self, enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        out.write32(self.sector.0);
        out.write_fixed(self.speed);
        out.write_fixed(self.low);
        out.write_fixed(self.high);
        out.write_i32(self.wait);
        out.write_i32(self.count);
        out.write_enum(self.status);
        out.write_enum(self.oldstatus);
        out.write_bool(self.crush);
        out.write_i32(self.tag);
        out.write_enum(self.kind);
        out.write_i32(enc.plat_node(self.list)?);
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        self.sector = dec.sector(cur.read32()?)?;
        self.speed = cur.read_fixed()?;
        self.low = cur.read_fixed()?;
        self.high = cur.read_fixed()?;
        self.wait = cur.read_i32()?;
        self.count = cur.read_i32()?;
        self.status = cur.read_enum()?;
        self.oldstatus = cur.read_enum()?;
        self.crush = cur.read_bool()?;
        self.tag = cur.read_i32()?;
        self.kind = cur.read_enum()?;
        self.list = dec.plat_node(cur.read_i32()?)?;
        Ok(())
    }
}

impl Payload for Elevator {
    fn write(&self, _enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        out.write_enum(self.kind);
        out.write32(self.sector.0);
        out.write_i32(self.direction);
        out.write_fixed(self.floordestheight);
        out.write_fixed(self.ceilingdestheight);
        out.write_fixed(self.speed);
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        self.kind = cur.read_enum()?;
        self.sector = dec.sector(cur.read32()?)?;
        self.direction = cur.read_i32()?;
        self.floordestheight = cur.read_fixed()?;
        self.ceilingdestheight = cur.read_fixed()?;
        self.speed = cur.read_fixed()?;
        Ok(())
    }
}

impl Payload for LightFlash {
    fn write(&self, _enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        out.write32(self.sector.0);
        for v in [self.count, self.maxlight, self.minlight, self.maxtime, self.mintime] {
            out.write_i32(v);
        }
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        self.sector = dec.sector(cur.read32()?)?;
        for v in [
            &mut self.count,
            &mut self.maxlight,
            &mut self.minlight,
            &mut self.maxtime,
            &mut self.mintime,
        ] {
            *v = cur.read_i32()?;
        }
        Ok(())
    }
}

impl Payload for Strobe {
    fn write(&self, _enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        out.write32(self.sector.0);
        for v in [self.count, self.minlight, self.maxlight, self.darktime, self.brighttime] {
            out.write_i32(v);
        }
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        self.sector = dec.sector(cur.read32()?)?;
        for v in [
            &mut self.count,
            &mut self.minlight,
            &mut self.maxlight,
            &mut self.darktime,
            &mut self.brighttime,
        ] {
            *v = cur.read_i32()?;
        }
        Ok(())
    }
}

impl Payload for Glow {
    fn write(&self, _enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        out.write32(self.sector.0);
        out.write_i32(self.minlight);
        out.write_i32(self.maxlight);
        out.write_i32(self.direction);
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        self.sector = dec.sector(cur.read32()?)?;
        self.minlight = cur.read_i32()?;
        self.maxlight = cur.read_i32()?;
        self.direction = cur.read_i32()?;
        Ok(())
    }
}

impl Payload for FireFlicker {
    fn write(&self, _enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        out.write32(self.sector.0);
        out.write_i32(self.count);
        out.write_i32(self.maxlight);
        out.write_i32(self.minlight);
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        self.sector = dec.sector(cur.read32()?)?;
        self.count = cur.read_i32()?;
        self.maxlight = cur.read_i32()?;
        self.minlight = cur.read_i32()?;
        Ok(())
    }
}

impl Payload for Scroll {
    fn write(&self, _enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        out.write_enum(self.kind);
        out.write_fixed(self.dx);
        out.write_fixed(self.dy);
        out.write_i32(self.affectee);
        out.write_i32(encode_index(self.control.map(|s| s.0)));
        out.write_fixed(self.last_height);
        out.write_fixed(self.vdx);
        out.write_fixed(self.vdy);
        out.write_bool(self.accel);
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        self.kind = cur.read_enum()?;
        self.dx = cur.read_fixed()?;
        self.dy = cur.read_fixed()?;
        self.affectee = cur.read_i32()?;
        self.control = dec.sector_opt(cur.read_i32()?)?;
        self.last_height = cur.read_fixed()?;
        self.vdx = cur.read_fixed()?;
        self.vdy = cur.read_fixed()?;
        self.accel = cur.read_bool()?;
        Ok(())
    }
}

impl Payload for Pusher {
    fn write(&self, enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        out.write_enum(self.kind);
        out.write_i32(enc.actor(self.source)?);
        for v in [self.x_mag, self.y_mag, self.magnitude, self.radius, self.x, self.y] {
            out.write_i32(v);
        }
        out.write32(self.affectee.0);
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        self.kind = cur.read_enum()?;
        self.source = dec.thinker(cur.read_i32()?)?;
        for v in [
            &mut self.x_mag,
            &mut self.y_mag,
            &mut self.magnitude,
            &mut self.radius,
            &mut self.x,
            &mut self.y,
        ] {
            *v = cur.read_i32()?;
        }
        self.affectee = dec.sector(cur.read32()?)?;
        Ok(())
    }
}

impl Payload for Friction {
    fn write(&self, _enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        out.write_i32(self.friction);
        out.write_i32(self.movefactor);
        out.write32(self.affectee.0);
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        self.friction = cur.read_i32()?;
        self.movefactor = cur.read_i32()?;
        self.affectee = dec.sector(cur.read32()?)?;
        Ok(())
    }
}

impl Payload for AmbientSound {
    fn write(&self, enc: &RefEncoder<'_>, out: &mut SaveBuffer) -> Result<(), CaptureError> {
        out.write_i32(enc.actor(self.source)?);
        for v in [
            self.sfx,
            self.volume,
            self.attenuation,
            self.min_tics,
            self.max_tics,
            self.wait_tics,
        ] {
            out.write_i32(v);
        }
        out.write_bool(self.active);
        Ok(())
    }

    fn read(&mut self, dec: &RefDecoder, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
        self.source = dec.thinker(cur.read_i32()?)?;
        for v in [
            &mut self.sfx,
            &mut self.volume,
            &mut self.attenuation,
            &mut self.min_tics,
            &mut self.max_tics,
            &mut self.wait_tics,
        ] {
            *v = cur.read_i32()?;
        }
        self.active = cur.read_bool()?;
        Ok(())
    }
}
