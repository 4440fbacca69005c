//! Sector/thing cross-reference nodes.
//!
//! A node records that one actor overlaps one sector and sits on two lists
//! at once: the actor's list of touched sectors (`tprev`/`tnext`) and the
//! sector's list of touching actors (`sprev`/`snext`). Released nodes are
//! kept on a free list, chained through `snext`, and reused before any new
//! node is allocated.

use crate::id::{SecNodeId, SectorIndex};
use crate::thinker::ThinkerRef;
use slotmap::SlotMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecNode {
    pub sector: SectorIndex,
    pub thing: ThinkerRef,
    /// Previous node of the same actor.
    pub tprev: Option<SecNodeId>,
    /// Next node of the same actor.
    pub tnext: Option<SecNodeId>,
    /// Previous node of the same sector.
    pub sprev: Option<SecNodeId>,
    /// Next node of the same sector, or of the free list.
    pub snext: Option<SecNodeId>,
    /// Scratch mark used while re-computing an actor's sector list.
    pub visited: bool,
}

/// Storage for cross-reference nodes plus the free list.
#[derive(Debug, Clone, Default)]
pub struct SecNodes {
    arena: SlotMap<SecNodeId, SecNode>,
    free: Option<SecNodeId>,
}

impl SecNodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SecNodeId) -> Option<&SecNode> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: SecNodeId) -> Option<&mut SecNode> {
        self.arena.get_mut(id)
    }

    /// Total nodes allocated, live and free.
    pub fn allocated(&self) -> usize {
        self.arena.len()
    }

    /// Take a node from the free list, or allocate a new one.
    pub fn acquire(&mut self) -> SecNodeId {
        match self.free {
            Some(id) => {
                self.free = self.arena[id].snext;
                self.arena[id] = SecNode::default();
                id
            }
            None => self.arena.insert(SecNode::default()),
        }
    }

    /// Return a node to the free list.
    pub fn release(&mut self, id: SecNodeId) {
        if let Some(node) = self.arena.get_mut(id) {
            *node = SecNode {
                snext: self.free,
                ..SecNode::default()
            };
            self.free = Some(id);
        }
    }

    /// Walk the free list.
    pub fn free_iter(&self) -> impl Iterator<Item = SecNodeId> + '_ {
        self.chain(self.free, |n| n.snext)
    }

    /// Number of reclaimed nodes waiting for reuse.
    pub fn free_len(&self) -> usize {
        self.free_iter().count()
    }

    /// Follow one of the node chains from `head`. Bounded by the arena size.
    pub fn chain(
        &self,
        head: Option<SecNodeId>,
        next: fn(&SecNode) -> Option<SecNodeId>,
    ) -> impl Iterator<Item = SecNodeId> + '_ {
        let mut cursor = head;
        let mut remaining = self.arena.len();
        std::iter::from_fn(move || {
            let id = cursor?;
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            cursor = next(self.arena.get(id)?);
            Some(id)
        })
    }

    /// Drop every node, live and free.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.free = None;
    }

    pub(crate) fn insert_unlinked(&mut self) -> SecNodeId {
        self.arena.insert(SecNode::default())
    }

    /// Allocate `count` empty nodes straight onto the free list.
    pub(crate) fn reserve_free(&mut self, count: usize) {
        for _ in 0..count {
            let id = self.arena.insert(SecNode {
                snext: self.free,
                ..SecNode::default()
            });
            self.free = Some(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_reuses_released_nodes() {
        let mut nodes = SecNodes::new();
        let a = nodes.acquire();
        nodes.release(a);
        assert_eq!(nodes.free_len(), 1);
        let b = nodes.acquire();
        assert_eq!(a, b);
        assert_eq!(nodes.free_len(), 0);
        assert_eq!(nodes.allocated(), 1);
    }

    #[test]
    fn free_list_is_lifo() {
        let mut nodes = SecNodes::new();
        let a = nodes.acquire();
        let b = nodes.acquire();
        nodes.release(a);
        nodes.release(b);
        assert_eq!(nodes.free_iter().collect::<Vec<_>>(), vec![b, a]);
    }

    #[test]
    fn released_node_is_scrubbed() {
        let mut nodes = SecNodes::new();
        let a = nodes.acquire();
        nodes.get_mut(a).unwrap().sector = SectorIndex(5);
        nodes.get_mut(a).unwrap().visited = true;
        nodes.release(a);
        let again = nodes.acquire();
        assert_eq!(nodes.get(again).unwrap(), &SecNode::default());
    }

    #[test]
    fn reserve_free_builds_chain() {
        let mut nodes = SecNodes::new();
        nodes.reserve_free(3);
        assert_eq!(nodes.free_len(), 3);
        assert_eq!(nodes.allocated(), 3);
    }

    #[test]
    fn chain_stops_on_cycle() {
        let mut nodes = SecNodes::new();
        let a = nodes.acquire();
        nodes.get_mut(a).unwrap().tnext = Some(a);
        assert_eq!(nodes.chain(Some(a), |n| n.tnext).count(), 1);
    }
}
