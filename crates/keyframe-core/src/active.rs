//! Active mover lists.
//!
//! Two structurally identical singly-linked lists track the ceiling movers
//! and the platform movers currently running. They are kept type-distinct
//! by their node key so a ceiling node can never be mistaken for a
//! platform node.

use crate::id::{CeilingNodeId, PlatNodeId, ThinkerId};
use crate::thinker::ThinkerRef;
use slotmap::{Key, SlotMap};

/// One entry: the mover thinker that drives a sector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveNode<K: Key> {
    pub mover: ThinkerRef,
    pub next: Option<K>,
}

/// A singly-linked list of active movers. New movers go on the front.
#[derive(Debug, Clone)]
pub struct ActiveList<K: Key> {
    nodes: SlotMap<K, ActiveNode<K>>,
    head: Option<K>,
}

pub type ActiveCeilings = ActiveList<CeilingNodeId>;
pub type ActivePlats = ActiveList<PlatNodeId>;

impl<K: Key> Default for ActiveList<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> ActiveList<K> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            head: None,
        }
    }

    pub fn head(&self) -> Option<K> {
        self.head
    }

    pub fn get(&self, key: K) -> Option<&ActiveNode<K>> {
        self.nodes.get(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Put a mover on the front of the list.
    pub fn add(&mut self, mover: ThinkerId) -> K {
        let key = self.nodes.insert(ActiveNode {
            mover: ThinkerRef::Node(mover),
            next: self.head,
        });
        self.head = Some(key);
        key
    }

    /// Unlink and free a node. Returns `false` if it was not on the list.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(node) = self.nodes.get(key) else {
            return false;
        };
        let next = node.next;
        if self.head == Some(key) {
            self.head = next;
        } else {
            let prev = self.keys().find(|&k| self.nodes[k].next == Some(key));
            match prev {
                Some(prev) => self.nodes[prev].next = next,
                None => return false,
            }
        }
        self.nodes.remove(key);
        true
    }

    /// Walk the list from the head. Bounded by the node count.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        let mut cursor = self.head;
        let mut remaining = self.nodes.len();
        std::iter::from_fn(move || {
            let key = cursor?;
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            cursor = self.nodes.get(key)?.next;
            Some(key)
        })
    }

    /// Movers in list order.
    pub fn movers(&self) -> impl Iterator<Item = ThinkerRef> + '_ {
        self.keys().map(|k| self.nodes[k].mover)
    }

    /// The node driven by `mover`, if any.
    pub fn find_mover(&self, mover: ThinkerId) -> Option<K> {
        self.keys()
            .find(|&k| self.nodes[k].mover == ThinkerRef::Node(mover))
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
    }

    /// Allocate `count` empty nodes chained in order; returns them head first.
    pub(crate) fn alloc_chain(&mut self, count: usize) -> Vec<K> {
        let keys: Vec<K> = (0..count)
            .map(|_| {
                self.nodes.insert(ActiveNode {
                    mover: ThinkerRef::Null,
                    next: None,
                })
            })
            .collect();
        for pair in keys.windows(2) {
            self.nodes[pair[0]].next = Some(pair[1]);
        }
        self.head = keys.first().copied();
        keys
    }

    pub(crate) fn set_mover(&mut self, key: K, mover: ThinkerRef) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.mover = mover;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn thinker_ids(n: usize) -> Vec<ThinkerId> {
        let mut sm: SlotMap<ThinkerId, ()> = SlotMap::with_key();
        (0..n).map(|_| sm.insert(())).collect()
    }

    #[test]
    fn add_pushes_front() {
        let ids = thinker_ids(3);
        let mut list = ActiveCeilings::new();
        for &id in &ids {
            list.add(id);
        }
        let movers: Vec<_> = list.movers().collect();
        assert_eq!(
            movers,
            vec![
                ThinkerRef::Node(ids[2]),
                ThinkerRef::Node(ids[1]),
                ThinkerRef::Node(ids[0])
            ]
        );
    }

    #[test]
    fn remove_head_middle_and_tail() {
        let ids = thinker_ids(4);
        let mut list = ActivePlats::new();
        let keys: Vec<_> = ids.iter().map(|&id| list.add(id)).collect();
        assert!(list.remove(keys[3]));
        assert!(list.remove(keys[1]));
        assert!(list.remove(keys[0]));
        assert_eq!(list.movers().collect::<Vec<_>>(), vec![ThinkerRef::Node(ids[2])]);
        assert!(!list.remove(keys[0]));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn find_mover_locates_node() {
        let ids = thinker_ids(2);
        let mut list = ActiveCeilings::new();
        let k0 = list.add(ids[0]);
        list.add(ids[1]);
        assert_eq!(list.find_mover(ids[0]), Some(k0));
    }

    #[test]
    fn alloc_chain_links_in_order() {
        let mut list = ActivePlats::new();
        let keys = list.alloc_chain(3);
        assert_eq!(list.head(), Some(keys[0]));
        assert_eq!(list.keys().collect::<Vec<_>>(), keys);
    }
}
