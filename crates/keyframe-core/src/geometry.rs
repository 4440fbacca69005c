//! Level geometry: sectors, lines, sides and switch buttons.
//!
//! Sectors are fully mutable at runtime. Lines and sides are mostly static;
//! only the fields captured in [`LineState`] and [`SideState`] ever change,
//! and only lines/sides flagged by the dirty tracker are archived.

use crate::fixed::{Angle, Fixed};
use crate::id::{LineIndex, SecNodeId, SectorIndex, SideIndex};
use crate::stream::wire_enum;
use crate::thinker::ThinkerRef;
use serde::{Deserialize, Serialize};

/// One sector's mutable state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sector {
    pub floorheight: Fixed,
    pub ceilingheight: Fixed,
    pub floor_xoffs: Fixed,
    pub floor_yoffs: Fixed,
    pub ceiling_xoffs: Fixed,
    pub ceiling_yoffs: Fixed,
    pub floor_rotation: Angle,
    pub ceiling_rotation: Angle,
    /// Colormap tint applied to the whole sector.
    pub tint: i32,
    pub floorpic: i16,
    pub ceilingpic: i16,
    pub lightlevel: i16,
    pub special: i16,
    pub tag: i16,
    /// Last actor that made a noise monsters in this sector heard.
    pub soundtarget: ThinkerRef,
    /// Mover currently running the floor.
    pub floordata: ThinkerRef,
    /// Mover currently running the ceiling.
    pub ceilingdata: ThinkerRef,
    /// Lighting effect currently running the light level.
    pub lightingdata: ThinkerRef,
    /// Head of the cross-reference nodes of actors touching this sector.
    pub touching_thinglist: Option<SecNodeId>,
    /// First actor whose origin lies in this sector.
    pub thinglist: ThinkerRef,
}

impl Sector {
    /// A plain sector with the given floor and ceiling heights.
    pub fn new(floorheight: Fixed, ceilingheight: Fixed, lightlevel: i16) -> Self {
        Self {
            floorheight,
            ceilingheight,
            lightlevel,
            ..Self::default()
        }
    }
}

/// The runtime-mutable part of a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineState {
    pub special: i16,
    pub flags: u32,
}

/// A line. Only `state` changes at runtime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub state: LineState,
    pub tag: i16,
    pub front: Option<SideIndex>,
    pub back: Option<SideIndex>,
}

/// The runtime-mutable part of a side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideState {
    pub toptexture: i16,
    pub bottomtexture: i16,
    pub midtexture: i16,
    pub textureoffset: Fixed,
    pub rowoffset: Fixed,
}

/// A side. Only `state` changes at runtime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Side {
    pub state: SideState,
    pub sector: SectorIndex,
}

wire_enum! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub enum ButtonWhere {
        #[default]
        Top = 0,
        Middle = 1,
        Bottom = 2,
    }
}

/// Fixed number of switch buttons that can be animating at once.
pub const MAXBUTTONS: usize = 16;

/// A switch waiting to flip its texture back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Button {
    pub line: Option<LineIndex>,
    pub position: ButtonWhere,
    pub texture: i32,
    /// Tics left until the texture flips back; 0 means the slot is free.
    pub timer: i32,
    /// Sector whose sound origin plays the switch-back sound.
    pub sound_origin: Option<SectorIndex>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::fixed_from_int;

    #[test]
    fn new_sector_has_no_movers() {
        let s = Sector::new(Fixed::ZERO, fixed_from_int(128), 160);
        assert_eq!(s.lightlevel, 160);
        assert!(s.floordata.is_null());
        assert!(s.ceilingdata.is_null());
        assert!(s.touching_thinglist.is_none());
    }

    #[test]
    fn default_button_is_free() {
        let b = Button::default();
        assert_eq!(b.timer, 0);
        assert!(b.line.is_none());
    }
}
