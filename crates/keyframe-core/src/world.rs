//! The explicit world context snapshots are taken of.
//!
//! [`World`] bundles everything a running level owns: geometry, the thinker
//! graph, the auxiliary lists, the spatial hash, players, buttons and the
//! RNG. Its mutation helpers are the operations the gameplay layer performs
//! between snapshots; they keep the intrusive lists, reference counts and
//! dirty marks consistent the way the simulation would.

use crate::active::{ActiveCeilings, ActivePlats};
use crate::blockmap::Blockmap;
use crate::dirty::DirtyGeometry;
use crate::fixed::Fixed;
use crate::geometry::{Button, ButtonWhere, Line, MAXBUTTONS, Sector, Side};
use crate::id::{LineIndex, SecNodeId, SectorIndex, SideIndex, ThinkerId};
use crate::mobj::{MF_NOBLOCKMAP, MF_NOSECTOR, Mobj};
use crate::player::{MAXPLAYERS, Player};
use crate::rng::SimRng;
use crate::secnode::{SecNode, SecNodes};
use crate::specials::{
    Ceiling, Door, Elevator, FireFlicker, Floor, Glow, LightFlash, Plat, PlatStatus, Strobe,
};
use crate::thinker::{Think, ThinkerKind, ThinkerList, ThinkerRef};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct World {
    pub sectors: Vec<Sector>,
    pub(crate) lines: Vec<Line>,
    pub(crate) sides: Vec<Side>,
    pub(crate) geometry: DirtyGeometry,
    pub thinkers: ThinkerList,
    pub secnodes: SecNodes,
    pub active_ceilings: ActiveCeilings,
    pub active_plats: ActivePlats,
    pub blockmap: Blockmap,
    pub players: [Player; MAXPLAYERS],
    pub playeringame: [bool; MAXPLAYERS],
    pub buttons: [Button; MAXBUTTONS],
    pub rng: SimRng,
}

fn target_of(m: &mut Mobj) -> &mut ThinkerRef {
    &mut m.target
}

fn tracer_of(m: &mut Mobj) -> &mut ThinkerRef {
    &mut m.tracer
}

fn lastenemy_of(m: &mut Mobj) -> &mut ThinkerRef {
    &mut m.lastenemy
}

impl World {
    /// A freshly loaded level. The current line and side values become the
    /// clean baseline for dirty tracking.
    pub fn new(
        sectors: Vec<Sector>,
        lines: Vec<Line>,
        sides: Vec<Side>,
        blockmap: Blockmap,
    ) -> Self {
        let geometry = DirtyGeometry::from_level(&lines, &sides);
        Self {
            sectors,
            lines,
            sides,
            geometry,
            thinkers: ThinkerList::new(),
            secnodes: SecNodes::new(),
            active_ceilings: ActiveCeilings::new(),
            active_plats: ActivePlats::new(),
            blockmap,
            players: Default::default(),
            playeringame: [false; MAXPLAYERS],
            buttons: [Button::default(); MAXBUTTONS],
            rng: SimRng::default(),
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn sides(&self) -> &[Side] {
        &self.sides
    }

    pub fn geometry(&self) -> &DirtyGeometry {
        &self.geometry
    }

    // -----------------------------------------------------------------------
    // Thinkers and actors
    // -----------------------------------------------------------------------

    /// Add a thinker that needs no extra bookkeeping.
    pub fn spawn_thinker(&mut self, think: Think, kind: ThinkerKind) -> ThinkerId {
        self.thinkers.add(think, kind)
    }

    /// Add an actor and link it into its sector and blockmap cell.
    pub fn spawn_mobj(&mut self, mobj: Mobj) -> ThinkerId {
        let id = self.thinkers.add(Think::Mobj, ThinkerKind::Mobj(Box::new(mobj)));
        self.set_thing_position(id);
        id
    }

    /// Spawn a player's actor and bring the slot into the game.
    pub fn spawn_player(&mut self, slot: usize, mut mobj: Mobj) -> Option<ThinkerId> {
        if slot >= MAXPLAYERS {
            return None;
        }
        mobj.player = Some(slot as u8);
        let id = self.spawn_mobj(mobj);
        self.players[slot] = Player::spawned(ThinkerRef::Node(id));
        self.playeringame[slot] = true;
        Some(id)
    }

    /// Move an actor, relinking it into the sector and blockmap.
    pub fn move_mobj(&mut self, id: ThinkerId, x: Fixed, y: Fixed, sector: SectorIndex) {
        self.unset_thing_position(id);
        if let Some(m) = self.thinkers.mobj_mut(id) {
            m.x = x;
            m.y = y;
            m.sector = sector;
        }
        self.set_thing_position(id);
    }

    /// Take an actor out of the world. It stays on the thinker list until
    /// nothing references it any more.
    pub fn remove_mobj(&mut self, id: ThinkerId) {
        if self.thinkers.mobj(id).is_none() {
            return;
        }
        self.unset_thing_position(id);
        self.clear_touching(id);
        self.set_target(id, None);
        self.set_tracer(id, None);
        self.set_lastenemy(id, None);
        self.thinkers.remove(id);
    }

    pub fn set_target(&mut self, id: ThinkerId, target: Option<ThinkerId>) -> bool {
        self.set_actor_field(id, target_of, target)
    }

    pub fn set_tracer(&mut self, id: ThinkerId, tracer: Option<ThinkerId>) -> bool {
        self.set_actor_field(id, tracer_of, tracer)
    }

    pub fn set_lastenemy(&mut self, id: ThinkerId, enemy: Option<ThinkerId>) -> bool {
        self.set_actor_field(id, lastenemy_of, enemy)
    }

    /// Change an actor's health, re-sorting it between the monster classes.
    pub fn set_health(&mut self, id: ThinkerId, health: i32) {
        if let Some(m) = self.thinkers.mobj_mut(id) {
            m.health = health;
            self.thinkers.update_class(id);
        }
    }

    /// Free every removed thinker nothing references.
    pub fn reclaim_removed(&mut self) -> usize {
        let freed = self.thinkers.reclaim_removed();
        if freed > 0 {
            debug!(freed, "reclaimed removed thinkers");
        }
        freed
    }

    fn set_actor_field(
        &mut self,
        id: ThinkerId,
        field: fn(&mut Mobj) -> &mut ThinkerRef,
        new: Option<ThinkerId>,
    ) -> bool {
        let Some(mobj) = self.thinkers.mobj_mut(id) else {
            return false;
        };
        let new = ThinkerRef::from(new);
        let old = std::mem::replace(field(mobj), new);
        self.adjust_references(old, -1);
        self.adjust_references(new, 1);
        true
    }

    fn adjust_references(&mut self, r: ThinkerRef, delta: i32) {
        if let Some(t) = r.node().and_then(|id| self.thinkers.get_mut(id)) {
            t.references += delta;
        }
    }

    fn set_thing_position(&mut self, id: ThinkerId) {
        let Some(mobj) = self.thinkers.mobj(id) else {
            return;
        };
        let (flags, sector, x, y) = (mobj.flags, mobj.sector.get(), mobj.x, mobj.y);
        if flags & MF_NOSECTOR == 0 {
            if let Some(head) = self.sectors.get(sector).map(|s| s.thinglist) {
                if let Some(m) = self.thinkers.mobj_mut(id) {
                    m.sprev = ThinkerRef::Null;
                    m.snext = head;
                }
                if let Some(h) = head.node().and_then(|h| self.thinkers.mobj_mut(h)) {
                    h.sprev = ThinkerRef::Node(id);
                }
                self.sectors[sector].thinglist = ThinkerRef::Node(id);
            }
        }
        if flags & MF_NOBLOCKMAP == 0 {
            if let Some(cell) = self.blockmap.cell_of(x, y) {
                self.blockmap.link(cell, id);
            }
        }
    }

    fn unset_thing_position(&mut self, id: ThinkerId) {
        let Some(mobj) = self.thinkers.mobj(id) else {
            return;
        };
        let (flags, sector, x, y) = (mobj.flags, mobj.sector.get(), mobj.x, mobj.y);
        let (prev, next) = (mobj.sprev, mobj.snext);
        if flags & MF_NOSECTOR == 0 {
            if let Some(n) = next.node().and_then(|n| self.thinkers.mobj_mut(n)) {
                n.sprev = prev;
            }
            match prev.node() {
                Some(p) => {
                    if let Some(pm) = self.thinkers.mobj_mut(p) {
                        pm.snext = next;
                    }
                }
                None => {
                    if let Some(s) = self.sectors.get_mut(sector) {
                        if s.thinglist == ThinkerRef::Node(id) {
                            s.thinglist = next;
                        }
                    }
                }
            }
            if let Some(m) = self.thinkers.mobj_mut(id) {
                m.sprev = ThinkerRef::Null;
                m.snext = ThinkerRef::Null;
            }
        }
        if flags & MF_NOBLOCKMAP == 0 {
            if let Some(cell) = self.blockmap.cell_of(x, y) {
                self.blockmap.unlink(cell, id);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Sector/thing cross-reference nodes
    // -----------------------------------------------------------------------

    /// Record that an actor touches a sector, reusing a free node if one is
    /// available. Returns the existing node if the pair is already linked.
    pub fn touch_sector(&mut self, thing: ThinkerId, sector: SectorIndex) -> Option<SecNodeId> {
        let head = self.thinkers.mobj(thing)?.touching_sectorlist;
        let sector_head = self.sectors.get(sector.get())?.touching_thinglist;
        let existing = self
            .secnodes
            .chain(head, |n| n.tnext)
            .find(|&n| self.secnodes.get(n).is_some_and(|n| n.sector == sector));
        if let Some(existing) = existing {
            if let Some(node) = self.secnodes.get_mut(existing) {
                node.visited = true;
            }
            return Some(existing);
        }

        let id = self.secnodes.acquire();
        if let Some(node) = self.secnodes.get_mut(id) {
            *node = SecNode {
                sector,
                thing: ThinkerRef::Node(thing),
                tprev: None,
                tnext: head,
                sprev: None,
                snext: sector_head,
                visited: true,
            };
        }
        if let Some(h) = head.and_then(|h| self.secnodes.get_mut(h)) {
            h.tprev = Some(id);
        }
        if let Some(h) = sector_head.and_then(|h| self.secnodes.get_mut(h)) {
            h.sprev = Some(id);
        }
        self.sectors[sector.get()].touching_thinglist = Some(id);
        if let Some(m) = self.thinkers.mobj_mut(thing) {
            m.touching_sectorlist = Some(id);
        }
        Some(id)
    }

    /// Unlink a node from both of its lists and put it on the free list.
    /// Returns the next node of the same actor.
    pub fn untouch(&mut self, id: SecNodeId) -> Option<SecNodeId> {
        let node = self.secnodes.get(id)?.clone();

        match node.tprev {
            Some(p) => {
                if let Some(pn) = self.secnodes.get_mut(p) {
                    pn.tnext = node.tnext;
                }
            }
            None => {
                if let Some(m) = node.thing.node().and_then(|t| self.thinkers.mobj_mut(t)) {
                    if m.touching_sectorlist == Some(id) {
                        m.touching_sectorlist = node.tnext;
                    }
                }
            }
        }
        if let Some(nn) = node.tnext.and_then(|n| self.secnodes.get_mut(n)) {
            nn.tprev = node.tprev;
        }

        match node.sprev {
            Some(p) => {
                if let Some(pn) = self.secnodes.get_mut(p) {
                    pn.snext = node.snext;
                }
            }
            None => {
                if let Some(s) = self.sectors.get_mut(node.sector.get()) {
                    if s.touching_thinglist == Some(id) {
                        s.touching_thinglist = node.snext;
                    }
                }
            }
        }
        if let Some(nn) = node.snext.and_then(|n| self.secnodes.get_mut(n)) {
            nn.sprev = node.sprev;
        }

        self.secnodes.release(id);
        node.tnext
    }

    /// Drop every sector an actor touches.
    pub fn clear_touching(&mut self, thing: ThinkerId) {
        let mut cursor = self.thinkers.mobj(thing).and_then(|m| m.touching_sectorlist);
        while let Some(id) = cursor {
            cursor = self.untouch(id);
        }
    }

    /// Replace an actor's touched sectors with exactly `sectors`, keeping
    /// nodes that are still valid and freeing the rest.
    pub fn set_touching(&mut self, thing: ThinkerId, sectors: &[SectorIndex]) {
        let Some(head) = self.thinkers.mobj(thing).map(|m| m.touching_sectorlist) else {
            return;
        };
        let current: Vec<SecNodeId> = self.secnodes.chain(head, |n| n.tnext).collect();
        for &id in &current {
            if let Some(node) = self.secnodes.get_mut(id) {
                node.visited = false;
            }
        }
        for &sector in sectors {
            self.touch_sector(thing, sector);
        }
        for id in current {
            if self.secnodes.get(id).is_some_and(|n| !n.visited) {
                self.untouch(id);
            }
        }
    }

    /// Sectors an actor touches, most recently added first.
    pub fn touched_sectors(&self, thing: ThinkerId) -> Vec<SectorIndex> {
        let head = self.thinkers.mobj(thing).and_then(|m| m.touching_sectorlist);
        self.secnodes
            .chain(head, |n| n.tnext)
            .filter_map(|id| self.secnodes.get(id).map(|n| n.sector))
            .collect()
    }

    /// Actors touching a sector, most recently added first.
    pub fn touching_things(&self, sector: SectorIndex) -> Vec<ThinkerRef> {
        let head = self
            .sectors
            .get(sector.get())
            .and_then(|s| s.touching_thinglist);
        self.secnodes
            .chain(head, |n| n.snext)
            .filter_map(|id| self.secnodes.get(id).map(|n| n.thing))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Sector movers
    // -----------------------------------------------------------------------

    /// Start a ceiling mover and put it on the active ceiling list.
    pub fn spawn_ceiling(&mut self, ceiling: Ceiling) -> ThinkerId {
        let sector = ceiling.sector.get();
        let id = self
            .thinkers
            .add(Think::MoveCeiling, ThinkerKind::Ceiling(ceiling));
        let node = self.active_ceilings.add(id);
        if let Some(ThinkerKind::Ceiling(c)) = self.thinkers.get_mut(id).map(|t| &mut t.kind) {
            c.list = Some(node);
        }
        if let Some(s) = self.sectors.get_mut(sector) {
            s.ceilingdata = ThinkerRef::Node(id);
        }
        id
    }

    /// A ceiling reached its destination: release the sector and schedule
    /// the mover for removal.
    pub fn finish_ceiling(&mut self, id: ThinkerId) {
        let Some(ThinkerKind::Ceiling(c)) = self.thinkers.get(id).map(|t| &t.kind) else {
            return;
        };
        let (sector, list) = (c.sector.get(), c.list);
        if let Some(node) = list {
            self.active_ceilings.remove(node);
        }
        if let Some(s) = self.sectors.get_mut(sector) {
            s.ceilingdata = ThinkerRef::Null;
        }
        if let Some(ThinkerKind::Ceiling(c)) = self.thinkers.get_mut(id).map(|t| &mut t.kind) {
            c.list = None;
        }
        self.thinkers.remove(id);
    }

    /// Suspend a crushing ceiling; it keeps its payload and list node.
    pub fn stasis_ceiling(&mut self, id: ThinkerId) {
        if let Some(ThinkerKind::Ceiling(c)) = self.thinkers.get_mut(id).map(|t| &mut t.kind) {
            c.olddirection = c.direction;
            c.direction = 0;
            self.thinkers.set_think(id, Think::Noop);
        }
    }

    pub fn activate_ceiling(&mut self, id: ThinkerId) {
        if let Some(ThinkerKind::Ceiling(c)) = self.thinkers.get_mut(id).map(|t| &mut t.kind) {
            c.direction = c.olddirection;
            self.thinkers.set_think(id, Think::MoveCeiling);
        }
    }

    /// Start a platform and put it on the active platform list.
    pub fn spawn_plat(&mut self, plat: Plat) -> ThinkerId {
        let sector = plat.sector.get();
        let id = self.thinkers.add(Think::MovePlat, ThinkerKind::Plat(plat));
        let node = self.active_plats.add(id);
        if let Some(ThinkerKind::Plat(p)) = self.thinkers.get_mut(id).map(|t| &mut t.kind) {
            p.list = Some(node);
        }
        if let Some(s) = self.sectors.get_mut(sector) {
            s.floordata = ThinkerRef::Node(id);
        }
        id
    }

    pub fn finish_plat(&mut self, id: ThinkerId) {
        let Some(ThinkerKind::Plat(p)) = self.thinkers.get(id).map(|t| &t.kind) else {
            return;
        };
        let (sector, list) = (p.sector.get(), p.list);
        if let Some(node) = list {
            self.active_plats.remove(node);
        }
        if let Some(s) = self.sectors.get_mut(sector) {
            s.floordata = ThinkerRef::Null;
        }
        if let Some(ThinkerKind::Plat(p)) = self.thinkers.get_mut(id).map(|t| &mut t.kind) {
            p.list = None;
        }
        self.thinkers.remove(id);
    }

    pub fn stasis_plat(&mut self, id: ThinkerId) {
        if let Some(ThinkerKind::Plat(p)) = self.thinkers.get_mut(id).map(|t| &mut t.kind) {
            p.oldstatus = p.status;
            p.status = PlatStatus::InStasis;
            self.thinkers.set_think(id, Think::Noop);
        }
    }

    pub fn activate_plat(&mut self, id: ThinkerId) {
        if let Some(ThinkerKind::Plat(p)) = self.thinkers.get_mut(id).map(|t| &mut t.kind) {
            p.status = p.oldstatus;
            self.thinkers.set_think(id, Think::MovePlat);
        }
    }

    pub fn spawn_door(&mut self, door: Door) -> ThinkerId {
        let sector = door.sector.get();
        let id = self.thinkers.add(Think::MoveDoor, ThinkerKind::Door(door));
        if let Some(s) = self.sectors.get_mut(sector) {
            s.ceilingdata = ThinkerRef::Node(id);
        }
        id
    }

    pub fn finish_door(&mut self, id: ThinkerId) {
        if let Some(ThinkerKind::Door(d)) = self.thinkers.get(id).map(|t| &t.kind) {
            let sector = d.sector.get();
            if let Some(s) = self.sectors.get_mut(sector) {
                s.ceilingdata = ThinkerRef::Null;
            }
            self.thinkers.remove(id);
        }
    }

    pub fn spawn_floor(&mut self, floor: Floor) -> ThinkerId {
        let sector = floor.sector.get();
        let id = self.thinkers.add(Think::MoveFloor, ThinkerKind::Floor(floor));
        if let Some(s) = self.sectors.get_mut(sector) {
            s.floordata = ThinkerRef::Node(id);
        }
        id
    }

    pub fn finish_floor(&mut self, id: ThinkerId) {
        if let Some(ThinkerKind::Floor(f)) = self.thinkers.get(id).map(|t| &t.kind) {
            let sector = f.sector.get();
            if let Some(s) = self.sectors.get_mut(sector) {
                s.floordata = ThinkerRef::Null;
            }
            self.thinkers.remove(id);
        }
    }

    /// Elevators drive both planes of their sector.
    pub fn spawn_elevator(&mut self, elevator: Elevator) -> ThinkerId {
        let sector = elevator.sector.get();
        let id = self
            .thinkers
            .add(Think::MoveElevator, ThinkerKind::Elevator(elevator));
        if let Some(s) = self.sectors.get_mut(sector) {
            s.floordata = ThinkerRef::Node(id);
            s.ceilingdata = ThinkerRef::Node(id);
        }
        id
    }

    pub fn finish_elevator(&mut self, id: ThinkerId) {
        if let Some(ThinkerKind::Elevator(e)) = self.thinkers.get(id).map(|t| &t.kind) {
            let sector = e.sector.get();
            if let Some(s) = self.sectors.get_mut(sector) {
                s.floordata = ThinkerRef::Null;
                s.ceilingdata = ThinkerRef::Null;
            }
            self.thinkers.remove(id);
        }
    }

    // -----------------------------------------------------------------------
    // Lighting
    // -----------------------------------------------------------------------

    pub fn spawn_light_flash(&mut self, flash: LightFlash) -> ThinkerId {
        let sector = flash.sector;
        self.spawn_lighting(sector, Think::LightFlash, ThinkerKind::LightFlash(flash))
    }

    pub fn spawn_strobe(&mut self, strobe: Strobe) -> ThinkerId {
        let sector = strobe.sector;
        self.spawn_lighting(sector, Think::StrobeFlash, ThinkerKind::Strobe(strobe))
    }

    pub fn spawn_glow(&mut self, glow: Glow) -> ThinkerId {
        let sector = glow.sector;
        self.spawn_lighting(sector, Think::Glow, ThinkerKind::Glow(glow))
    }

    pub fn spawn_fire_flicker(&mut self, flicker: FireFlicker) -> ThinkerId {
        let sector = flicker.sector;
        self.spawn_lighting(sector, Think::FireFlicker, ThinkerKind::FireFlicker(flicker))
    }

    fn spawn_lighting(
        &mut self,
        sector: SectorIndex,
        think: Think,
        kind: ThinkerKind,
    ) -> ThinkerId {
        let id = self.thinkers.add(think, kind);
        if let Some(s) = self.sectors.get_mut(sector.get()) {
            s.lightingdata = ThinkerRef::Node(id);
        }
        id
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    pub fn set_line_special(&mut self, line: LineIndex, special: i16) -> bool {
        let Some(l) = self.lines.get_mut(line.get()) else {
            return false;
        };
        l.state.special = special;
        self.geometry.mark_line(line);
        true
    }

    pub fn set_line_flags(&mut self, line: LineIndex, flags: u32) -> bool {
        let Some(l) = self.lines.get_mut(line.get()) else {
            return false;
        };
        l.state.flags = flags;
        self.geometry.mark_line(line);
        true
    }

    pub fn set_side_textures(&mut self, side: SideIndex, top: i16, bottom: i16, mid: i16) -> bool {
        let Some(s) = self.sides.get_mut(side.get()) else {
            return false;
        };
        s.state.toptexture = top;
        s.state.bottomtexture = bottom;
        s.state.midtexture = mid;
        self.geometry.mark_side(side);
        true
    }

    pub fn set_side_offsets(
        &mut self,
        side: SideIndex,
        textureoffset: Fixed,
        rowoffset: Fixed,
    ) -> bool {
        let Some(s) = self.sides.get_mut(side.get()) else {
            return false;
        };
        s.state.textureoffset = textureoffset;
        s.state.rowoffset = rowoffset;
        self.geometry.mark_side(side);
        true
    }

    /// Queue a switch to flip back after `timer` tics. Returns the slot used,
    /// or `None` if every slot is busy.
    pub fn start_button(
        &mut self,
        line: LineIndex,
        position: ButtonWhere,
        texture: i32,
        timer: i32,
        sound_origin: Option<SectorIndex>,
    ) -> Option<usize> {
        if self
            .buttons
            .iter()
            .any(|b| b.timer > 0 && b.line == Some(line))
        {
            return None;
        }
        let slot = self.buttons.iter().position(|b| b.timer == 0)?;
        self.buttons[slot] = Button {
            line: Some(line),
            position,
            texture,
            timer,
            sound_origin,
        };
        Some(slot)
    }
}
