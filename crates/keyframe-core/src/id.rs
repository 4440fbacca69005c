use serde::{Deserialize, Serialize};
use slotmap::{Key, new_key_type};

new_key_type! {
    /// Identifies a thinker in the thinker arena.
    pub struct ThinkerId;

    /// Identifies a sector/thing cross-reference node.
    pub struct SecNodeId;

    /// Identifies a node on the active ceiling list.
    pub struct CeilingNodeId;

    /// Identifies a node on the active platform list.
    pub struct PlatNodeId;
}

/// An arena key that belongs to one archive identity domain.
///
/// Each domain is numbered independently during capture, so the same dense
/// index can mean different objects in different domains. The key type of a
/// field decides which domain its index is resolved against.
pub trait Domain: Key {
    /// Human-readable domain name used in diagnostics.
    const NAME: &'static str;

    /// The 64-bit identity fed to the identity map.
    fn identity(self) -> u64 {
        self.data().as_ffi()
    }
}

impl Domain for ThinkerId {
    const NAME: &'static str = "thinker";
}

impl Domain for SecNodeId {
    const NAME: &'static str = "sector node";
}

impl Domain for CeilingNodeId {
    const NAME: &'static str = "active ceiling";
}

impl Domain for PlatNodeId {
    const NAME: &'static str = "active platform";
}

/// Index into the level's sector table.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SectorIndex(pub u32);

/// Index into the level's line table.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LineIndex(pub u32);

/// Index into the level's side table.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SideIndex(pub u32);

impl SectorIndex {
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl LineIndex {
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl SideIndex {
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn geometry_index_equality() {
        assert_eq!(SectorIndex(3), SectorIndex(3));
        assert_ne!(LineIndex(0), LineIndex(1));
        assert_eq!(SideIndex(7).get(), 7);
    }

    #[test]
    fn identities_are_distinct_per_slot() {
        let mut arena: SlotMap<ThinkerId, ()> = SlotMap::with_key();
        let a = arena.insert(());
        let b = arena.insert(());
        assert_ne!(a.identity(), b.identity());
        assert_eq!(a.identity(), a.identity());
    }

    #[test]
    fn reused_slot_gets_new_identity() {
        let mut arena: SlotMap<SecNodeId, ()> = SlotMap::with_key();
        let a = arena.insert(());
        arena.remove(a);
        let b = arena.insert(());
        assert_ne!(a.identity(), b.identity());
    }
}
