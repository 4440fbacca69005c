//! Map objects: the actors that move around the level.

use crate::fixed::{Angle, Fixed};
use crate::id::{SecNodeId, SectorIndex};
use crate::thinker::ThinkerRef;

pub const MF_SOLID: u32 = 0x0000_0002;
pub const MF_SHOOTABLE: u32 = 0x0000_0004;
pub const MF_NOSECTOR: u32 = 0x0000_0008;
pub const MF_NOBLOCKMAP: u32 = 0x0000_0010;
pub const MF_COUNTKILL: u32 = 0x0040_0000;
pub const MF_FRIEND: u32 = 0x4000_0000;

/// Lost souls count as monsters for class sorting even without `MF_COUNTKILL`.
pub const MT_SKULL: i32 = 18;

/// An actor's full mutable state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mobj {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
    pub momx: Fixed,
    pub momy: Fixed,
    pub momz: Fixed,
    pub angle: Angle,
    pub floorz: Fixed,
    pub ceilingz: Fixed,
    pub dropoffz: Fixed,
    pub radius: Fixed,
    pub height: Fixed,
    /// Sector the actor's origin currently lies in.
    pub sector: SectorIndex,
    pub mobj_type: i32,
    /// Index into the state table.
    pub state: i32,
    pub tics: i32,
    pub flags: u32,
    pub health: i32,
    pub movedir: i32,
    pub movecount: i32,
    pub reactiontime: i32,
    pub threshold: i32,
    pub lastlook: i32,
    pub target: ThinkerRef,
    pub tracer: ThinkerRef,
    pub lastenemy: ThinkerRef,
    /// Player slot controlling this actor.
    pub player: Option<u8>,
    /// Next actor in the sector's thing list.
    pub snext: ThinkerRef,
    /// Previous actor in the sector's thing list.
    pub sprev: ThinkerRef,
    /// Head of the list of sectors this actor touches.
    pub touching_sectorlist: Option<SecNodeId>,
    pub friction: Fixed,
    pub movefactor: Fixed,
}

impl Mobj {
    /// A fresh actor at a position.
    pub fn at(x: Fixed, y: Fixed, z: Fixed, sector: SectorIndex) -> Self {
        Self {
            x,
            y,
            z,
            sector,
            health: 100,
            ..Self::default()
        }
    }
}
