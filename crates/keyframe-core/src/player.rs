//! Per-slot player state.

use crate::fixed::Fixed;
use crate::stream::wire_enum;
use crate::thinker::ThinkerRef;
use std::collections::VecDeque;

pub const MAXPLAYERS: usize = 4;
pub const NUMWEAPONS: usize = 9;
pub const NUMAMMO: usize = 4;
pub const NUMPOWERS: usize = 6;
pub const NUMCARDS: usize = 6;
pub const NUMPSPRITES: usize = 2;

/// How many completed levels a player remembers.
pub const MAX_VISITED_LEVELS: usize = 32;

wire_enum! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub enum PlayerState {
        #[default]
        Live = 0,
        Dead = 1,
        Reborn = 2,
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub enum WeaponType {
        #[default]
        Fist = 0,
        Pistol = 1,
        Shotgun = 2,
        Chaingun = 3,
        Missile = 4,
        Plasma = 5,
        Bfg = 6,
        Chainsaw = 7,
        SuperShotgun = 8,
        NoChange = 10,
    }
}

/// One overlay sprite (weapon or muzzle flash).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Psprite {
    /// State table index, or -1 when the overlay is off.
    pub state: i32,
    pub tics: i32,
    pub sx: Fixed,
    pub sy: Fixed,
}

impl Default for Psprite {
    fn default() -> Self {
        Self {
            state: -1,
            tics: 0,
            sx: Fixed::ZERO,
            sy: Fixed::ZERO,
        }
    }
}

/// A finished level, identified by episode and map number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LevelId {
    pub episode: u8,
    pub map: u8,
}

/// Bounded history of visited levels, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitedLevels {
    levels: VecDeque<LevelId>,
}

impl VisitedLevels {
    /// Record a level, dropping the oldest entry once the history is full.
    pub fn push(&mut self, level: LevelId) {
        if self.levels.len() == MAX_VISITED_LEVELS {
            self.levels.pop_front();
        }
        self.levels.push_back(level);
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelId> {
        self.levels.iter()
    }

    pub fn contains(&self, level: LevelId) -> bool {
        self.levels.contains(&level)
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Player {
    /// The actor this player controls.
    pub mo: ThinkerRef,
    pub playerstate: PlayerState,
    pub viewz: Fixed,
    pub viewheight: Fixed,
    pub deltaviewheight: Fixed,
    pub bob: Fixed,
    pub health: i32,
    pub armorpoints: i32,
    pub armortype: i32,
    /// Remaining tics per power-up.
    pub powers: [i32; NUMPOWERS],
    pub cards: [bool; NUMCARDS],
    pub backpack: bool,
    pub frags: [i32; MAXPLAYERS],
    pub readyweapon: WeaponType,
    pub pendingweapon: WeaponType,
    pub weaponowned: [bool; NUMWEAPONS],
    pub ammo: [i32; NUMAMMO],
    pub maxammo: [i32; NUMAMMO],
    pub attackdown: bool,
    pub usedown: bool,
    pub cheats: u32,
    pub refire: i32,
    pub killcount: i32,
    pub itemcount: i32,
    pub secretcount: i32,
    pub damagecount: i32,
    pub bonuscount: i32,
    /// Who did the last damage.
    pub attacker: ThinkerRef,
    pub extralight: i32,
    pub fixedcolormap: i32,
    pub colormap: i32,
    pub psprites: [Psprite; NUMPSPRITES],
    pub didsecret: bool,
    pub visited: VisitedLevels,
}

impl Player {
    /// A freshly spawned player with the starting loadout.
    pub fn spawned(mo: ThinkerRef) -> Self {
        let mut weaponowned = [false; NUMWEAPONS];
        weaponowned[WeaponType::Fist as usize] = true;
        weaponowned[WeaponType::Pistol as usize] = true;
        let mut ammo = [0; NUMAMMO];
        ammo[0] = 50;
        Self {
            mo,
            health: 100,
            readyweapon: WeaponType::Pistol,
            pendingweapon: WeaponType::NoChange,
            weaponowned,
            ammo,
            maxammo: [200, 50, 300, 50],
            viewheight: crate::fixed::fixed_from_int(41),
            ..Self::default()
        }
    }
}
