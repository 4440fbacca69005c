//! Open-addressed identity map: 64-bit object identity -> dense index.
//!
//! Built fresh for every capture. The first identity put gets index 0, the
//! next unseen one index 1, and so on; re-putting a known identity returns
//! its existing index. Linear probing over a power-of-two table kept at most
//! half full.

use crate::rng::mix64;

#[derive(Debug, Clone, Copy)]
struct Entry {
    identity: u64,
    index: u32,
}

/// Identity -> dense index table for one archive domain.
#[derive(Debug, Clone)]
pub struct IdentityMap {
    slots: Vec<Option<Entry>>,
    len: usize,
}

impl Default for IdentityMap {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityMap {
    const MIN_SLOTS: usize = 16;

    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Size the table so `capacity` identities fit without growing.
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (capacity.saturating_mul(2))
            .next_power_of_two()
            .max(Self::MIN_SLOTS);
        Self {
            slots: vec![None; slots],
            len: 0,
        }
    }

    /// Number of identities assigned so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Assign the next dense index to `identity`, or return the one it
    /// already has.
    pub fn put(&mut self, identity: u64) -> u32 {
        if let Some(index) = self.get(identity) {
            return index;
        }
        if (self.len + 1) * 2 > self.slots.len() {
            self.grow();
        }
        let index = self.len as u32;
        self.insert_entry(Entry { identity, index });
        self.len += 1;
        index
    }

    /// Look up the index previously assigned to `identity`.
    pub fn get(&self, identity: u64) -> Option<u32> {
        let mask = self.slots.len() - 1;
        let mut slot = mix64(identity) as usize & mask;
        loop {
            match self.slots[slot] {
                None => return None,
                Some(entry) if entry.identity == identity => return Some(entry.index),
                Some(_) => slot = (slot + 1) & mask,
            }
        }
    }

    fn insert_entry(&mut self, entry: Entry) {
        let mask = self.slots.len() - 1;
        let mut slot = mix64(entry.identity) as usize & mask;
        while self.slots[slot].is_some() {
            slot = (slot + 1) & mask;
        }
        self.slots[slot] = Some(entry);
    }

    fn grow(&mut self) {
        let doubled = vec![None; self.slots.len() * 2];
        let old = std::mem::replace(&mut self.slots, doubled);
        for entry in old.into_iter().flatten() {
            self.insert_entry(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_ordered() {
        let mut map = IdentityMap::new();
        assert_eq!(map.put(0xdead), 0);
        assert_eq!(map.put(0xbeef), 1);
        assert_eq!(map.put(42), 2);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn repeated_put_returns_existing_index() {
        let mut map = IdentityMap::new();
        map.put(10);
        map.put(20);
        assert_eq!(map.put(10), 0);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn get_absent_is_none() {
        let mut map = IdentityMap::new();
        map.put(1);
        assert_eq!(map.get(2), None);
        assert_eq!(map.get(1), Some(0));
    }

    #[test]
    fn growth_preserves_indices() {
        let mut map = IdentityMap::with_capacity(4);
        for i in 0..10_000u64 {
            assert_eq!(map.put(i.wrapping_mul(0x1_0000_0001)), i as u32);
        }
        for i in 0..10_000u64 {
            assert_eq!(map.get(i.wrapping_mul(0x1_0000_0001)), Some(i as u32));
        }
    }

    #[test]
    fn default_map_grows_past_initial_table() {
        let mut map = IdentityMap::new();
        for i in 0..1_000u64 {
            map.put(i << 12);
        }
        assert_eq!(map.len(), 1_000);
        assert_eq!(map.get(0), Some(0));
        assert_eq!(map.get(999 << 12), Some(999));
    }

    #[test]
    fn extreme_identities_are_ordinary_keys() {
        let mut map = IdentityMap::new();
        assert_eq!(map.put(u64::MAX), 0);
        assert_eq!(map.put(0), 1);
        assert_eq!(map.get(u64::MAX), Some(0));
    }
}
