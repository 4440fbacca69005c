//! Archiver for per-snapshot world state: sectors, dirty geometry, the
//! blockmap, players, buttons and the RNG.

use crate::geometry::{Button, LineState, MAXBUTTONS, Sector};
use crate::player::{MAX_VISITED_LEVELS, MAXPLAYERS, LevelId, Player, Psprite};
use crate::pointer::{RefDecoder, RefEncoder, encode_index};
use crate::rng::{RngClass, SimRng};
use crate::serialize::{CaptureError, RestoreError};
use crate::stream::{LoadCursor, SaveBuffer};
use crate::world::World;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Sectors
// ---------------------------------------------------------------------------

pub fn write_sectors(
    sectors: &[Sector],
    enc: &RefEncoder<'_>,
    out: &mut SaveBuffer,
) -> Result<(), CaptureError> {
    out.write_count("sectors", sectors.len())?;
    for s in sectors {
        for v in [
            s.floorheight,
            s.ceilingheight,
            s.floor_xoffs,
            s.floor_yoffs,
            s.ceiling_xoffs,
            s.ceiling_yoffs,
        ] {
            out.write_fixed(v);
        }
        out.write32(s.floor_rotation);
        out.write32(s.ceiling_rotation);
        out.write_i32(s.tint);
        for v in [s.floorpic, s.ceilingpic, s.lightlevel, s.special, s.tag] {
            out.write_i16(v);
        }
        out.write_i32(enc.actor(s.soundtarget)?);
        out.write_i32(enc.thinker(s.floordata)?);
        out.write_i32(enc.thinker(s.ceilingdata)?);
        out.write_i32(enc.thinker(s.lightingdata)?);
        out.write_i32(enc.secnode(s.touching_thinglist)?);
        out.write_i32(enc.thinker(s.thinglist)?);
    }
    Ok(())
}

/// Sectors are never created or destroyed, so the count must match.
pub fn read_sectors(
    sectors: &mut [Sector],
    dec: &RefDecoder,
    cur: &mut LoadCursor<'_>,
) -> Result<(), RestoreError> {
    let found = cur.read_count()?;
    if found != sectors.len() {
        return Err(RestoreError::SectorCount {
            expected: sectors.len(),
            found,
        });
    }
    for s in sectors.iter_mut() {
        for v in [
            &mut s.floorheight,
            &mut s.ceilingheight,
            &mut s.floor_xoffs,
            &mut s.floor_yoffs,
            &mut s.ceiling_xoffs,
            &mut s.ceiling_yoffs,
        ] {
            *v = cur.read_fixed()?;
        }
        s.floor_rotation = cur.read32()?;
        s.ceiling_rotation = cur.read32()?;
        s.tint = cur.read_i32()?;
        for v in [
            &mut s.floorpic,
            &mut s.ceilingpic,
            &mut s.lightlevel,
            &mut s.special,
            &mut s.tag,
        ] {
            *v = cur.read_i16()?;
        }
        s.soundtarget = dec.thinker(cur.read_i32()?)?;
        s.floordata = dec.thinker(cur.read_i32()?)?;
        s.ceilingdata = dec.thinker(cur.read_i32()?)?;
        s.lightingdata = dec.thinker(cur.read_i32()?)?;
        s.touching_thinglist = dec.secnode(cur.read_i32()?)?;
        s.thinglist = dec.thinker(cur.read_i32()?)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Dirty geometry
// ---------------------------------------------------------------------------

/// Current values of every dirty line, in first-marked order. The line
/// index is implied by the position in the dirty list.
pub fn write_dirty_lines(world: &World, out: &mut SaveBuffer) -> Result<(), CaptureError> {
    let dirty = world.geometry.dirty_lines();
    out.write_count("dirty lines", dirty.len())?;
    for d in dirty {
        let state = world
            .lines
            .get(d.line.get())
            .map_or(d.clean, |l| l.state);
        out.write16(state.special as u16);
        out.write32(state.flags);
    }
    Ok(())
}

/// Apply the first `n` dirty lines from the stream and reset every tracked
/// line past `n` to its level-load value.
pub fn read_dirty_lines(world: &mut World, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
    let count = cur.read_len(6)?;
    let tracked = world.geometry.dirty_lines().len();
    if count > tracked {
        return Err(RestoreError::DirtyOverflow {
            what: "line",
            count,
            tracked,
        });
    }
    for i in 0..tracked {
        let d = world.geometry.dirty_lines()[i];
        let state = if i < count {
            LineState {
                special: cur.read16()? as i16,
                flags: cur.read32()?,
            }
        } else {
            d.clean
        };
        if let Some(line) = world.lines.get_mut(d.line.get()) {
            line.state = state;
        }
    }
    if count < tracked {
        warn!(
            reset = tracked - count,
            "restored lines past the snapshot's dirty count to their baseline"
        );
    }
    Ok(())
}

pub fn write_dirty_sides(world: &World, out: &mut SaveBuffer) -> Result<(), CaptureError> {
    let dirty = world.geometry.dirty_sides();
    out.write_count("dirty sides", dirty.len())?;
    for d in dirty {
        let state = world
            .sides
            .get(d.side.get())
            .map_or(d.clean, |s| s.state);
        out.write16(state.toptexture as u16);
        out.write16(state.bottomtexture as u16);
        out.write16(state.midtexture as u16);
        out.write_fixed(state.textureoffset);
        out.write_fixed(state.rowoffset);
    }
    Ok(())
}

pub fn read_dirty_sides(world: &mut World, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
    let count = cur.read_len(14)?;
    let tracked = world.geometry.dirty_sides().len();
    if count > tracked {
        return Err(RestoreError::DirtyOverflow {
            what: "side",
            count,
            tracked,
        });
    }
    for i in 0..tracked {
        let d = world.geometry.dirty_sides()[i];
        let mut state = d.clean;
        if i < count {
            state.toptexture = cur.read16()? as i16;
            state.bottomtexture = cur.read16()? as i16;
            state.midtexture = cur.read16()? as i16;
            state.textureoffset = cur.read_fixed()?;
            state.rowoffset = cur.read_fixed()?;
        }
        if let Some(side) = world.sides.get_mut(d.side.get()) {
            side.state = state;
        }
    }
    if count < tracked {
        warn!(
            reset = tracked - count,
            "restored sides past the snapshot's dirty count to their baseline"
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Blockmap
// ---------------------------------------------------------------------------

pub fn write_blockmap(
    world: &World,
    enc: &RefEncoder<'_>,
    out: &mut SaveBuffer,
) -> Result<(), CaptureError> {
    out.write_count("blockmap cells", world.blockmap.cell_count())?;
    for cell in world.blockmap.cells() {
        out.write_count("blockmap cell", cell.len())?;
        for &id in cell {
            out.write_i32(enc.thinker(id.into())?);
        }
    }
    Ok(())
}

pub fn read_blockmap(
    world: &mut World,
    dec: &RefDecoder,
    cur: &mut LoadCursor<'_>,
) -> Result<(), RestoreError> {
    let found = cur.read_count()?;
    let expected = world.blockmap.cell_count();
    if found != expected {
        return Err(RestoreError::BlockmapShape { expected, found });
    }
    let mut occupied = 0usize;
    for index in 0..expected {
        let count = cur.read_len(4)?;
        let mut actors = Vec::with_capacity(count);
        for _ in 0..count {
            actors.push(dec.thinker_node(cur.read_i32()?)?);
        }
        occupied += usize::from(!actors.is_empty());
        world.blockmap.replace_cell(index, actors);
    }
    debug!(cells = expected, occupied, "restored blockmap");
    Ok(())
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// Emit the slots currently in the game, in slot order.
pub fn write_players(
    world: &World,
    enc: &RefEncoder<'_>,
    out: &mut SaveBuffer,
) -> Result<(), CaptureError> {
    for (player, _) in world
        .players
        .iter()
        .zip(world.playeringame)
        .filter(|(_, ingame)| *ingame)
    {
        write_player(player, enc, out)?;
    }
    Ok(())
}

pub fn read_players(
    world: &mut World,
    dec: &RefDecoder,
    cur: &mut LoadCursor<'_>,
) -> Result<(), RestoreError> {
    for slot in 0..MAXPLAYERS {
        if world.playeringame[slot] {
            read_player(&mut world.players[slot], dec, cur)?;
        }
    }
    Ok(())
}

fn write_player(
    p: &Player,
    enc: &RefEncoder<'_>,
    out: &mut SaveBuffer,
) -> Result<(), CaptureError> {
    out.write_i32(enc.actor(p.mo)?);
    out.write_enum(p.playerstate);
    for v in [p.viewz, p.viewheight, p.deltaviewheight, p.bob] {
        out.write_fixed(v);
    }
    out.write_i32(p.health);
    out.write_i32(p.armorpoints);
    out.write_i32(p.armortype);
    p.powers.iter().for_each(|&v| out.write_i32(v));
    p.cards.iter().for_each(|&v| out.write_bool(v));
    out.write_bool(p.backpack);
    p.frags.iter().for_each(|&v| out.write_i32(v));
    out.write_enum(p.readyweapon);
    out.write_enum(p.pendingweapon);
    p.weaponowned.iter().for_each(|&v| out.write_bool(v));
    p.ammo.iter().for_each(|&v| out.write_i32(v));
    p.maxammo.iter().for_each(|&v| out.write_i32(v));
    out.write_bool(p.attackdown);
    out.write_bool(p.usedown);
    out.write32(p.cheats);
    for v in [
        p.refire,
        p.killcount,
        p.itemcount,
        p.secretcount,
        p.damagecount,
        p.bonuscount,
    ] {
        out.write_i32(v);
    }
    out.write_i32(enc.actor(p.attacker)?);
    out.write_i32(p.extralight);
    out.write_i32(p.fixedcolormap);
    out.write_i32(p.colormap);
    for psp in &p.psprites {
        out.write_i32(psp.state);
        out.write_i32(psp.tics);
        out.write_fixed(psp.sx);
        out.write_fixed(psp.sy);
    }
    out.write_bool(p.didsecret);
    out.write_count("visited levels", p.visited.len())?;
    for level in p.visited.iter() {
        out.write8(level.episode);
        out.write8(level.map);
    }
    Ok(())
}

fn read_player(
    p: &mut Player,
    dec: &RefDecoder,
    cur: &mut LoadCursor<'_>,
) -> Result<(), RestoreError> {
    p.mo = dec.thinker(cur.read_i32()?)?;
    p.playerstate = cur.read_enum()?;
    for v in [
        &mut p.viewz,
        &mut p.viewheight,
        &mut p.deltaviewheight,
        &mut p.bob,
    ] {
        *v = cur.read_fixed()?;
    }
    p.health = cur.read_i32()?;
    p.armorpoints = cur.read_i32()?;
    p.armortype = cur.read_i32()?;
    for v in &mut p.powers {
        *v = cur.read_i32()?;
    }
    for v in &mut p.cards {
        *v = cur.read_bool()?;
    }
    p.backpack = cur.read_bool()?;
    for v in &mut p.frags {
        *v = cur.read_i32()?;
    }
    p.readyweapon = cur.read_enum()?;
    p.pendingweapon = cur.read_enum()?;
    for v in &mut p.weaponowned {
        *v = cur.read_bool()?;
    }
    for v in &mut p.ammo {
        *v = cur.read_i32()?;
    }
    for v in &mut p.maxammo {
        *v = cur.read_i32()?;
    }
    p.attackdown = cur.read_bool()?;
    p.usedown = cur.read_bool()?;
    p.cheats = cur.read32()?;
    for v in [
        &mut p.refire,
        &mut p.killcount,
        &mut p.itemcount,
        &mut p.secretcount,
        &mut p.damagecount,
        &mut p.bonuscount,
    ] {
        *v = cur.read_i32()?;
    }
    p.attacker = dec.thinker(cur.read_i32()?)?;
    p.extralight = cur.read_i32()?;
    p.fixedcolormap = cur.read_i32()?;
    p.colormap = cur.read_i32()?;
    for psp in &mut p.psprites {
        *psp = Psprite {
            state: cur.read_i32()?,
            tics: cur.read_i32()?,
            sx: cur.read_fixed()?,
            sy: cur.read_fixed()?,
        };
    }
    p.didsecret = cur.read_bool()?;
    let visited = cur.read_count()?;
    if visited > MAX_VISITED_LEVELS {
        return Err(RestoreError::VisitedOverflow(visited));
    }
    p.visited.clear();
    for _ in 0..visited {
        let episode = cur.read8()?;
        let map = cur.read8()?;
        p.visited.push(LevelId { episode, map });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Buttons and RNG
// ---------------------------------------------------------------------------

pub fn write_buttons(buttons: &[Button; MAXBUTTONS], out: &mut SaveBuffer) {
    for b in buttons {
        out.write_i32(encode_index(b.line.map(|l| l.0)));
        out.write_enum(b.position);
        out.write_i32(b.texture);
        out.write_i32(b.timer);
        out.write_i32(encode_index(b.sound_origin.map(|s| s.0)));
    }
}

pub fn read_buttons(
    buttons: &mut [Button; MAXBUTTONS],
    dec: &RefDecoder,
    cur: &mut LoadCursor<'_>,
) -> Result<(), RestoreError> {
    for b in buttons.iter_mut() {
        *b = Button {
            line: dec.line_opt(cur.read_i32()?)?,
            position: cur.read_enum()?,
            texture: cur.read_i32()?,
            timer: cur.read_i32()?,
            sound_origin: dec.sector_opt(cur.read_i32()?)?,
        };
    }
    Ok(())
}

pub fn write_rng(rng: &SimRng, out: &mut SaveBuffer) {
    for seed in rng.seeds {
        out.write32(seed);
    }
    out.write_i32(rng.rndindex);
    out.write_i32(rng.prndindex);
}

pub fn read_rng(rng: &mut SimRng, cur: &mut LoadCursor<'_>) -> Result<(), RestoreError> {
    let mut seeds = [0u32; RngClass::COUNT];
    for seed in &mut seeds {
        *seed = cur.read32()?;
    }
    *rng = SimRng {
        seeds,
        rndindex: cur.read_i32()?,
        prndindex: cur.read_i32()?,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::AllocTable;

    fn decoder() -> RefDecoder {
        RefDecoder::new(
            AllocTable::default(),
            AllocTable::default(),
            AllocTable::default(),
            AllocTable::default(),
            4,
            4,
        )
    }

    #[test]
    fn rng_section_is_forty_bytes() {
        let mut rng = SimRng::new(7);
        rng.p_random(RngClass::Damage);
        let mut out = SaveBuffer::new();
        write_rng(&rng, &mut out);
        assert_eq!(out.len(), 4 * RngClass::COUNT + 8);
        let bytes = out.into_bytes();
        let mut restored = SimRng::default();
        read_rng(&mut restored, &mut LoadCursor::new(&bytes)).unwrap();
        assert_eq!(restored, rng);
    }

    #[test]
    fn buttons_reject_out_of_range_line() {
        let mut out = SaveBuffer::new();
        let mut buttons = [Button::default(); MAXBUTTONS];
        buttons[3].line = Some(crate::id::LineIndex(9));
        write_buttons(&buttons, &mut out);
        let bytes = out.into_bytes();
        let mut restored = [Button::default(); MAXBUTTONS];
        let err = read_buttons(&mut restored, &decoder(), &mut LoadCursor::new(&bytes));
        assert!(matches!(
            err,
            Err(RestoreError::IndexOutOfRange { what: "line", index: 9, .. })
        ));
    }
}
