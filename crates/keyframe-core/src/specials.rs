//! Sector specials: movers, lighting effects, scrollers, pushers, friction
//! and ambient sound emitters.

use crate::fixed::Fixed;
use crate::id::{CeilingNodeId, LineIndex, PlatNodeId, SectorIndex};
use crate::stream::wire_enum;
use crate::thinker::ThinkerRef;

// ---------------------------------------------------------------------------
// Kind enums
// ---------------------------------------------------------------------------

wire_enum! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub enum DoorKind {
        #[default]
        Normal = 0,
        Close30ThenOpen = 1,
        Close = 2,
        Open = 3,
        RaiseIn5Mins = 4,
        BlazeRaise = 5,
        BlazeOpen = 6,
        BlazeClose = 7,
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub enum CeilingKind {
        #[default]
        LowerToFloor = 0,
        RaiseToHighest = 1,
        LowerAndCrush = 2,
        CrushAndRaise = 3,
        FastCrushAndRaise = 4,
        SilentCrushAndRaise = 5,
        Generic = 6,
        GenericCrusher = 7,
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub enum FloorKind {
        #[default]
        LowerFloor = 0,
        LowerFloorToLowest = 1,
        TurboLower = 2,
        RaiseFloor = 3,
        RaiseFloorToNearest = 4,
        RaiseToTexture = 5,
        LowerAndChange = 6,
        RaiseFloor24 = 7,
        RaiseFloor24AndChange = 8,
        RaiseFloorCrush = 9,
        RaiseFloorTurbo = 10,
        DonutRaise = 11,
        RaiseFloor512 = 12,
        Generic = 13,
        BuildStair = 14,
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub enum PlatKind {
        #[default]
        PerpetualRaise = 0,
        DownWaitUpStay = 1,
        RaiseAndChange = 2,
        RaiseToNearestAndChange = 3,
        BlazeDwus = 4,
        Generic = 5,
        Toggle = 6,
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub enum PlatStatus {
        #[default]
        Up = 0,
        Down = 1,
        Waiting = 2,
        InStasis = 3,
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub enum ElevatorKind {
        #[default]
        Up = 0,
        Down = 1,
        Current = 2,
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub enum ScrollKind {
        #[default]
        Side = 0,
        Floor = 1,
        Ceiling = 2,
        Carry = 3,
        CarryCeiling = 4,
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub enum PusherKind {
        #[default]
        Push = 0,
        Pull = 1,
        Wind = 2,
        Current = 3,
    }
}

// ---------------------------------------------------------------------------
// Movers
// ---------------------------------------------------------------------------

/// A vertical door.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Door {
    pub kind: DoorKind,
    pub sector: SectorIndex,
    pub topheight: Fixed,
    pub speed: Fixed,
    /// 1 = up, 0 = waiting, -1 = down.
    pub direction: i32,
    pub topwait: i32,
    pub topcountdown: i32,
    /// Line that triggered the door, for lighting tag effects.
    pub line: Option<LineIndex>,
    pub lighttag: i32,
}

/// A moving ceiling (crusher or lowering/raising ceiling).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ceiling {
    pub kind: CeilingKind,
    pub sector: SectorIndex,
    pub bottomheight: Fixed,
    pub topheight: Fixed,
    pub speed: Fixed,
    pub oldspeed: Fixed,
    pub crush: bool,
    pub newspecial: i16,
    pub oldspecial: i16,
    pub texture: i16,
    pub direction: i32,
    pub tag: i32,
    pub olddirection: i32,
    /// Node on the active ceiling list.
    pub list: Option<CeilingNodeId>,
}

/// A moving floor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Floor {
    pub kind: FloorKind,
    pub crush: bool,
    pub sector: SectorIndex,
    pub direction: i32,
    pub newspecial: i16,
    pub oldspecial: i16,
    pub texture: i16,
    pub floordestheight: Fixed,
    pub speed: Fixed,
}

/// A lift/platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plat {
    pub sector: SectorIndex,
    pub speed: Fixed,
    pub low: Fixed,
    pub high: Fixed,
    pub wait: i32,
    pub count: i32,
    pub status: PlatStatus,
    pub oldstatus: PlatStatus,
    pub crush: bool,
    pub tag: i32,
    pub kind: PlatKind,
    /// Node on the active platform list.
    pub list: Option<PlatNodeId>,
}

/// Floor and ceiling moving together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Elevator {
    pub kind: ElevatorKind,
    pub sector: SectorIndex,
    pub direction: i32,
    pub floordestheight: Fixed,
    pub ceilingdestheight: Fixed,
    pub speed: Fixed,
}

// ---------------------------------------------------------------------------
// Lighting
// ---------------------------------------------------------------------------

/// Random flicker between two light levels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightFlash {
    pub sector: SectorIndex,
    pub count: i32,
    pub maxlight: i32,
    pub minlight: i32,
    pub maxtime: i32,
    pub mintime: i32,
}

/// Regular strobe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Strobe {
    pub sector: SectorIndex,
    pub count: i32,
    pub minlight: i32,
    pub maxlight: i32,
    pub darktime: i32,
    pub brighttime: i32,
}

/// Smooth oscillation between two light levels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glow {
    pub sector: SectorIndex,
    pub minlight: i32,
    pub maxlight: i32,
    pub direction: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FireFlicker {
    pub sector: SectorIndex,
    pub count: i32,
    pub maxlight: i32,
    pub minlight: i32,
}

// ---------------------------------------------------------------------------
// Scrollers, pushers, friction, ambient sound
// ---------------------------------------------------------------------------

/// Texture or floor scroller, optionally driven by a control sector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scroll {
    pub kind: ScrollKind,
    pub dx: Fixed,
    pub dy: Fixed,
    /// Side or sector index, depending on `kind`.
    pub affectee: i32,
    /// Sector whose height changes drive the scroll speed.
    pub control: Option<SectorIndex>,
    pub last_height: Fixed,
    pub vdx: Fixed,
    pub vdy: Fixed,
    pub accel: bool,
}

/// Wind, current or point push/pull source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pusher {
    pub kind: PusherKind,
    /// Point source actor for push/pull kinds.
    pub source: ThinkerRef,
    pub x_mag: i32,
    pub y_mag: i32,
    pub magnitude: i32,
    pub radius: i32,
    pub x: i32,
    pub y: i32,
    pub affectee: SectorIndex,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Friction {
    pub friction: i32,
    pub movefactor: i32,
    pub affectee: SectorIndex,
}

/// A looping or randomly repeating positional sound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmbientSound {
    pub source: ThinkerRef,
    pub sfx: i32,
    pub volume: i32,
    pub attenuation: i32,
    pub min_tics: i32,
    pub max_tics: i32,
    pub wait_tics: i32,
    pub active: bool,
}
