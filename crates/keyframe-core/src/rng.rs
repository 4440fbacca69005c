//! Deterministic random number generator state.
//!
//! Gameplay draws from several independent seeded streams, one per concern,
//! so that an extra draw in one system never perturbs another. Two cursor
//! indices walk a fixed 256-entry byte table for the menu/cosmetic draws and
//! for the compatibility draw sequence.

/// A random stream, one per gameplay concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RngClass {
    Misc,
    Damage,
    Chase,
    Attack,
    Spawn,
    Drop,
    Weapon,
    Ambient,
}

impl RngClass {
    pub const COUNT: usize = 8;

    pub const ALL: [RngClass; Self::COUNT] = [
        RngClass::Misc,
        RngClass::Damage,
        RngClass::Chase,
        RngClass::Attack,
        RngClass::Spawn,
        RngClass::Drop,
        RngClass::Weapon,
        RngClass::Ambient,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// All random state that must survive a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    /// One LCG seed per [`RngClass`].
    pub seeds: [u32; RngClass::COUNT],
    /// Cursor for [`SimRng::m_random`].
    pub rndindex: i32,
    /// Cursor for the table-driven gameplay sequence.
    pub prndindex: i32,
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(1993)
    }
}

impl SimRng {
    /// Seed every stream from one level seed.
    pub fn new(seed: u32) -> Self {
        let mut seeds = [0u32; RngClass::COUNT];
        let mut s = seed;
        for slot in &mut seeds {
            s = s.wrapping_mul(69069).wrapping_add(1);
            *slot = s;
        }
        Self {
            seeds,
            rndindex: 0,
            prndindex: 0,
        }
    }

    /// Draw a byte from the given class stream.
    pub fn p_random(&mut self, class: RngClass) -> u8 {
        let c = class.index();
        let boom = self.seeds[c];
        self.seeds[c] = boom
            .wrapping_mul(1_664_525)
            .wrapping_add(221_297)
            .wrapping_add((c as u32) * 2);
        self.prndindex = (self.prndindex + 1) & 0xff;
        let mixed = (boom >> 20) ^ u32::from(table_byte(self.prndindex));
        (mixed & 0xff) as u8
    }

    /// Cosmetic draw that never affects gameplay.
    pub fn m_random(&mut self) -> u8 {
        self.rndindex = (self.rndindex + 1) & 0xff;
        table_byte(self.rndindex)
    }
}

/// SplitMix64 finalizer. Also used to spread identity hashes.
#[inline]
pub(crate) fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Entry `index` of the fixed byte table.
fn table_byte(index: i32) -> u8 {
    (mix64(index as u64 & 0xff) >> 56) as u8
}
