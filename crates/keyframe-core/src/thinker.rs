//! Thinkers: the per-tic simulation objects and their intrusive lists.
//!
//! Every live thinker sits on two circular doubly-linked lists at once: the
//! global list rooted at the thinker cap, and one of four class lists rooted
//! at a class cap. The caps are not arena objects; a [`ThinkerRef`] names
//! them directly, alongside null, the dummy substitute and arena nodes.

use crate::id::ThinkerId;
use crate::mobj::{MF_COUNTKILL, MF_FRIEND, MT_SKULL, Mobj};
use crate::specials::{
    AmbientSound, Ceiling, Door, Elevator, FireFlicker, Floor, Friction, Glow, LightFlash, Plat,
    Pusher, Scroll, Strobe,
};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// The four class sub-lists every thinker is sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThinkerClass {
    /// Thinkers scheduled for delayed removal.
    Delete,
    /// Everything that is not a live monster.
    Misc,
    /// Live monsters friendly to the player.
    Friends,
    /// Live hostile monsters.
    Enemies,
}

impl ThinkerClass {
    pub const COUNT: usize = 4;

    pub const ALL: [ThinkerClass; Self::COUNT] = [
        ThinkerClass::Delete,
        ThinkerClass::Misc,
        ThinkerClass::Friends,
        ThinkerClass::Enemies,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// A reference to a thinker-list participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ThinkerRef {
    #[default]
    Null,
    /// The global list's cap.
    Cap,
    /// The well-known substitute for an invalidated target.
    Dummy,
    /// A class list's cap.
    ClassCap(ThinkerClass),
    /// An arena thinker.
    Node(ThinkerId),
}

impl ThinkerRef {
    pub fn node(self) -> Option<ThinkerId> {
        match self {
            ThinkerRef::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_null(self) -> bool {
        self == ThinkerRef::Null
    }
}

impl From<ThinkerId> for ThinkerRef {
    fn from(id: ThinkerId) -> Self {
        ThinkerRef::Node(id)
    }
}

impl From<Option<ThinkerId>> for ThinkerRef {
    fn from(id: Option<ThinkerId>) -> Self {
        id.map_or(ThinkerRef::Null, ThinkerRef::Node)
    }
}

/// Previous/next pair of one list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    pub prev: ThinkerRef,
    pub next: ThinkerRef,
}

impl Links {
    /// An empty circular list: the cap points at itself both ways.
    pub fn empty(cap: ThinkerRef) -> Self {
        Self {
            prev: cap,
            next: cap,
        }
    }
}

// ---------------------------------------------------------------------------
// Step functions and payloads
// ---------------------------------------------------------------------------

/// Which step function runs for a thinker each tic.
///
/// Together with the payload kind this identifies how a thinker is
/// archived. `RemoveDelayed` replaces the real step function once a thinker
/// has been removed but is still referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Think {
    Noop,
    Mobj,
    MoveDoor,
    MoveCeiling,
    MoveFloor,
    MovePlat,
    MoveElevator,
    LightFlash,
    StrobeFlash,
    Glow,
    FireFlicker,
    Scroll,
    Push,
    Friction,
    AmbientSound,
    RemoveDelayed,
}

/// Kind-specific thinker payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ThinkerKind {
    /// A bare thinker with no payload.
    Placeholder,
    Mobj(Box<Mobj>),
    Door(Door),
    Ceiling(Ceiling),
    Floor(Floor),
    Plat(Plat),
    Elevator(Elevator),
    LightFlash(LightFlash),
    Strobe(Strobe),
    Glow(Glow),
    FireFlicker(FireFlicker),
    Scroll(Scroll),
    Pusher(Pusher),
    Friction(Friction),
    AmbientSound(AmbientSound),
}

/// Fieldless mirror of [`ThinkerKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Placeholder,
    Mobj,
    Door,
    Ceiling,
    Floor,
    Plat,
    Elevator,
    LightFlash,
    Strobe,
    Glow,
    FireFlicker,
    Scroll,
    Pusher,
    Friction,
    AmbientSound,
}

impl PayloadKind {
    /// A zeroed payload of this kind, ready to be filled in.
    pub fn empty(self) -> ThinkerKind {
        match self {
            PayloadKind::Placeholder => ThinkerKind::Placeholder,
            PayloadKind::Mobj => ThinkerKind::Mobj(Box::default()),
            PayloadKind::Door => ThinkerKind::Door(Door::default()),
            PayloadKind::Ceiling => ThinkerKind::Ceiling(Ceiling::default()),
            PayloadKind::Floor => ThinkerKind::Floor(Floor::default()),
            PayloadKind::Plat => ThinkerKind::Plat(Plat::default()),
            PayloadKind::Elevator => ThinkerKind::Elevator(Elevator::default()),
            PayloadKind::LightFlash => ThinkerKind::LightFlash(LightFlash::default()),
            PayloadKind::Strobe => ThinkerKind::Strobe(Strobe::default()),
            PayloadKind::Glow => ThinkerKind::Glow(Glow::default()),
            PayloadKind::FireFlicker => ThinkerKind::FireFlicker(FireFlicker::default()),
            PayloadKind::Scroll => ThinkerKind::Scroll(Scroll::default()),
            PayloadKind::Pusher => ThinkerKind::Pusher(Pusher::default()),
            PayloadKind::Friction => ThinkerKind::Friction(Friction::default()),
            PayloadKind::AmbientSound => ThinkerKind::AmbientSound(AmbientSound::default()),
        }
    }
}

impl ThinkerKind {
    pub fn payload_kind(&self) -> PayloadKind {
        match self {
            ThinkerKind::Placeholder => PayloadKind::Placeholder,
            ThinkerKind::Mobj(_) => PayloadKind::Mobj,
            ThinkerKind::Door(_) => PayloadKind::Door,
            ThinkerKind::Ceiling(_) => PayloadKind::Ceiling,
            ThinkerKind::Floor(_) => PayloadKind::Floor,
            ThinkerKind::Plat(_) => PayloadKind::Plat,
            ThinkerKind::Elevator(_) => PayloadKind::Elevator,
            ThinkerKind::LightFlash(_) => PayloadKind::LightFlash,
            ThinkerKind::Strobe(_) => PayloadKind::Strobe,
            ThinkerKind::Glow(_) => PayloadKind::Glow,
            ThinkerKind::FireFlicker(_) => PayloadKind::FireFlicker,
            ThinkerKind::Scroll(_) => PayloadKind::Scroll,
            ThinkerKind::Pusher(_) => PayloadKind::Pusher,
            ThinkerKind::Friction(_) => PayloadKind::Friction,
            ThinkerKind::AmbientSound(_) => PayloadKind::AmbientSound,
        }
    }

    pub fn as_mobj(&self) -> Option<&Mobj> {
        match self {
            ThinkerKind::Mobj(mobj) => Some(mobj),
            _ => None,
        }
    }

    pub fn as_mobj_mut(&mut self) -> Option<&mut Mobj> {
        match self {
            ThinkerKind::Mobj(mobj) => Some(mobj),
            _ => None,
        }
    }
}

/// One thinker: list links, reference count, step function and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Thinker {
    /// Links on the global list.
    pub links: Links,
    /// Links on the class list.
    pub class_links: Links,
    /// How many other objects still point at this thinker. A removed
    /// thinker is only reclaimed once this drops to zero.
    pub references: i32,
    pub think: Think,
    pub kind: ThinkerKind,
}

impl Thinker {
    /// An unlinked thinker.
    pub fn new(think: Think, kind: ThinkerKind) -> Self {
        Self {
            links: Links::default(),
            class_links: Links::default(),
            references: 0,
            think,
            kind,
        }
    }

    /// The class list this thinker belongs on given its current state.
    pub fn class(&self) -> ThinkerClass {
        match (self.think, &self.kind) {
            (Think::RemoveDelayed, _) => ThinkerClass::Delete,
            (Think::Mobj, ThinkerKind::Mobj(mobj))
                if mobj.health > 0
                    && (mobj.flags & MF_COUNTKILL != 0 || mobj.mobj_type == MT_SKULL) =>
            {
                if mobj.flags & MF_FRIEND != 0 {
                    ThinkerClass::Friends
                } else {
                    ThinkerClass::Enemies
                }
            }
            _ => ThinkerClass::Misc,
        }
    }

    /// Whether this is an actor waiting for delayed removal.
    pub fn is_removed_actor(&self) -> bool {
        self.think == Think::RemoveDelayed && matches!(self.kind, ThinkerKind::Mobj(_))
    }
}

// ---------------------------------------------------------------------------
// ThinkerList
// ---------------------------------------------------------------------------

/// The thinker arena plus the global and class list caps.
#[derive(Debug, Clone)]
pub struct ThinkerList {
    arena: SlotMap<ThinkerId, Thinker>,
    cap: Links,
    class_caps: [Links; ThinkerClass::COUNT],
}

impl Default for ThinkerList {
    fn default() -> Self {
        Self::new()
    }
}

impl ThinkerList {
    /// An empty world: every cap points at itself.
    pub fn new() -> Self {
        Self {
            arena: SlotMap::with_key(),
            cap: Links::empty(ThinkerRef::Cap),
            class_caps: ThinkerClass::ALL.map(|c| Links::empty(ThinkerRef::ClassCap(c))),
        }
    }

    /// Number of thinkers in the arena.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: ThinkerId) -> bool {
        self.arena.contains_key(id)
    }

    pub fn get(&self, id: ThinkerId) -> Option<&Thinker> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: ThinkerId) -> Option<&mut Thinker> {
        self.arena.get_mut(id)
    }

    pub fn mobj(&self, id: ThinkerId) -> Option<&Mobj> {
        self.arena.get(id).and_then(|t| t.kind.as_mobj())
    }

    pub fn mobj_mut(&mut self, id: ThinkerId) -> Option<&mut Mobj> {
        self.arena.get_mut(id).and_then(|t| t.kind.as_mobj_mut())
    }

    /// Links of the global cap.
    pub fn cap(&self) -> Links {
        self.cap
    }

    /// Links of a class cap.
    pub fn class_cap(&self, class: ThinkerClass) -> Links {
        self.class_caps[class.index()]
    }

    pub(crate) fn set_cap(&mut self, links: Links) {
        self.cap = links;
    }

    pub(crate) fn set_class_cap(&mut self, class: ThinkerClass, links: Links) {
        self.class_caps[class.index()] = links;
    }

    /// Drop every thinker and reset all caps.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Put a thinker into the arena without linking it anywhere.
    pub(crate) fn insert_unlinked(&mut self, thinker: Thinker) -> ThinkerId {
        self.arena.insert(thinker)
    }

    /// Walk the global list from the cap's successor back to the cap.
    ///
    /// Stops early if the walk leaves the arena or exceeds the arena size,
    /// so a corrupted list never loops forever.
    pub fn iter(&self) -> ListIter<'_> {
        ListIter {
            list: self,
            cursor: self.cap.next,
            remaining: self.arena.len(),
            class_list: false,
        }
    }

    /// Walk one class list from its cap's successor back to its cap.
    pub fn class_iter(&self, class: ThinkerClass) -> ListIter<'_> {
        ListIter {
            list: self,
            cursor: self.class_caps[class.index()].next,
            remaining: self.arena.len(),
            class_list: true,
        }
    }

    /// Add a new thinker at the tail of the global list and of the class
    /// list its state selects.
    pub fn add(&mut self, think: Think, kind: ThinkerKind) -> ThinkerId {
        let id = self.arena.insert(Thinker::new(think, kind));
        let last = self.cap.prev;
        self.arena[id].links = Links {
            prev: last,
            next: ThinkerRef::Cap,
        };
        if let Some(links) = self.global_links_mut(last) {
            links.next = ThinkerRef::Node(id);
        }
        self.cap.prev = ThinkerRef::Node(id);
        self.link_class(id);
        id
    }

    /// Change a thinker's step function and re-sort it into its class list.
    pub fn set_think(&mut self, id: ThinkerId, think: Think) {
        if let Some(t) = self.arena.get_mut(id) {
            t.think = think;
            self.update_class(id);
        }
    }

    /// Schedule a thinker for delayed removal.
    pub fn remove(&mut self, id: ThinkerId) {
        self.set_think(id, Think::RemoveDelayed);
    }

    /// Move a thinker to the tail of the class list its state selects,
    /// if it is not already there.
    pub fn update_class(&mut self, id: ThinkerId) {
        let Some(thinker) = self.arena.get(id) else {
            return;
        };
        let class = thinker.class();
        if self.class_of(id) == Some(class) {
            return;
        }
        self.unlink_class(id);
        self.link_class(id);
    }

    /// Unlink and free every removed thinker nobody references any more.
    ///
    /// Returns the number of thinkers reclaimed.
    pub fn reclaim_removed(&mut self) -> usize {
        let doomed: Vec<ThinkerId> = self
            .class_iter(ThinkerClass::Delete)
            .filter(|&id| self.arena[id].references == 0)
            .collect();
        for &id in &doomed {
            self.unlink_class(id);
            let links = self.arena[id].links;
            if let Some(prev) = self.global_links_mut(links.prev) {
                prev.next = links.next;
            }
            if let Some(next) = self.global_links_mut(links.next) {
                next.prev = links.prev;
            }
            self.arena.remove(id);
        }
        doomed.len()
    }

    /// Which class list currently holds `id`, found by walking to a cap.
    pub fn class_of(&self, id: ThinkerId) -> Option<ThinkerClass> {
        let mut cursor = self.arena.get(id)?.class_links.next;
        for _ in 0..=self.arena.len() {
            match cursor {
                ThinkerRef::ClassCap(class) => return Some(class),
                ThinkerRef::Node(next) => cursor = self.arena.get(next)?.class_links.next,
                _ => return None,
            }
        }
        None
    }

    /// Whether every list is circular and doubly linked: walking forward
    /// from each cap returns to it, and every `next` has a matching `prev`.
    pub fn is_consistent(&self) -> bool {
        let global_ok = self.check_ring(ThinkerRef::Cap, false);
        let classes_ok = ThinkerClass::ALL
            .iter()
            .all(|&c| self.check_ring(ThinkerRef::ClassCap(c), true));
        let counted: usize = ThinkerClass::ALL
            .iter()
            .map(|&c| self.class_iter(c).count())
            .sum();
        global_ok && classes_ok && self.iter().count() == self.arena.len() && counted == self.len()
    }

    fn check_ring(&self, cap: ThinkerRef, class_list: bool) -> bool {
        let links_of = |r: ThinkerRef| -> Option<Links> {
            match (r, class_list) {
                (ThinkerRef::Cap, false) => Some(self.cap),
                (ThinkerRef::ClassCap(c), true) => Some(self.class_caps[c.index()]),
                (ThinkerRef::Node(id), false) => self.arena.get(id).map(|t| t.links),
                (ThinkerRef::Node(id), true) => self.arena.get(id).map(|t| t.class_links),
                _ => None,
            }
        };
        let mut current = cap;
        for _ in 0..=self.arena.len() {
            let Some(links) = links_of(current) else {
                return false;
            };
            let Some(next_links) = links_of(links.next) else {
                return false;
            };
            if next_links.prev != current {
                return false;
            }
            if links.next == cap {
                return true;
            }
            current = links.next;
        }
        false
    }

    fn global_links_mut(&mut self, r: ThinkerRef) -> Option<&mut Links> {
        match r {
            ThinkerRef::Cap => Some(&mut self.cap),
            ThinkerRef::Node(id) => self.arena.get_mut(id).map(|t| &mut t.links),
            _ => None,
        }
    }

    fn class_links_mut(&mut self, r: ThinkerRef) -> Option<&mut Links> {
        match r {
            ThinkerRef::ClassCap(c) => Some(&mut self.class_caps[c.index()]),
            ThinkerRef::Node(id) => self.arena.get_mut(id).map(|t| &mut t.class_links),
            _ => None,
        }
    }

    fn link_class(&mut self, id: ThinkerId) {
        let class = self.arena[id].class();
        let cap = ThinkerRef::ClassCap(class);
        let last = self.class_caps[class.index()].prev;
        self.arena[id].class_links = Links { prev: last, next: cap };
        if let Some(links) = self.class_links_mut(last) {
            links.next = ThinkerRef::Node(id);
        }
        self.class_caps[class.index()].prev = ThinkerRef::Node(id);
    }

    fn unlink_class(&mut self, id: ThinkerId) {
        let links = self.arena[id].class_links;
        if let Some(prev) = self.class_links_mut(links.prev) {
            prev.next = links.next;
        }
        if let Some(next) = self.class_links_mut(links.next) {
            next.prev = links.prev;
        }
        self.arena[id].class_links = Links::default();
    }
}

/// Iterator over one of the thinker lists.
pub struct ListIter<'a> {
    list: &'a ThinkerList,
    cursor: ThinkerRef,
    remaining: usize,
    class_list: bool,
}

impl Iterator for ListIter<'_> {
    type Item = ThinkerId;

    fn next(&mut self) -> Option<ThinkerId> {
        let ThinkerRef::Node(id) = self.cursor else {
            return None;
        };
        if self.remaining == 0 {
            return None;
        }
        let thinker = self.list.arena.get(id)?;
        self.remaining -= 1;
        self.cursor = if self.class_list {
            thinker.class_links.next
        } else {
            thinker.links.next
        };
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specials::Glow;

    fn monster(health: i32, friendly: bool) -> ThinkerKind {
        let mut mobj = Mobj::default();
        mobj.health = health;
        mobj.flags = MF_COUNTKILL | if friendly { MF_FRIEND } else { 0 };
        ThinkerKind::Mobj(Box::new(mobj))
    }

    #[test]
    fn empty_list_caps_point_at_themselves() {
        let list = ThinkerList::new();
        assert_eq!(list.cap(), Links::empty(ThinkerRef::Cap));
        for c in ThinkerClass::ALL {
            assert_eq!(list.class_cap(c), Links::empty(ThinkerRef::ClassCap(c)));
        }
        assert!(list.is_consistent());
        assert_eq!(list.iter().count(), 0);
    }

    #[test]
    fn add_appends_in_order() {
        let mut list = ThinkerList::new();
        let a = list.add(Think::Noop, ThinkerKind::Placeholder);
        let b = list.add(Think::Glow, ThinkerKind::Glow(Glow::default()));
        let c = list.add(Think::Noop, ThinkerKind::Placeholder);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(list.cap().next, ThinkerRef::Node(a));
        assert_eq!(list.cap().prev, ThinkerRef::Node(c));
        assert_eq!(list.get(c).unwrap().links.next, ThinkerRef::Cap);
        assert!(list.is_consistent());
    }

    #[test]
    fn monsters_sort_into_friend_and_enemy_classes() {
        let mut list = ThinkerList::new();
        let foe = list.add(Think::Mobj, monster(100, false));
        let pal = list.add(Think::Mobj, monster(100, true));
        let corpse = list.add(Think::Mobj, monster(0, false));
        assert_eq!(list.class_of(foe), Some(ThinkerClass::Enemies));
        assert_eq!(list.class_of(pal), Some(ThinkerClass::Friends));
        assert_eq!(list.class_of(corpse), Some(ThinkerClass::Misc));
        assert!(list.is_consistent());
    }

    #[test]
    fn remove_moves_to_delete_class_but_stays_listed() {
        let mut list = ThinkerList::new();
        let a = list.add(Think::Mobj, monster(50, false));
        list.remove(a);
        assert_eq!(list.class_of(a), Some(ThinkerClass::Delete));
        assert_eq!(list.iter().count(), 1);
        assert!(list.get(a).unwrap().is_removed_actor());
        assert!(list.is_consistent());
    }

    #[test]
    fn reclaim_frees_only_unreferenced() {
        let mut list = ThinkerList::new();
        let a = list.add(Think::Noop, ThinkerKind::Placeholder);
        let b = list.add(Think::Noop, ThinkerKind::Placeholder);
        let c = list.add(Think::Noop, ThinkerKind::Placeholder);
        list.remove(a);
        list.remove(b);
        list.get_mut(b).unwrap().references = 1;
        assert_eq!(list.reclaim_removed(), 1);
        assert!(!list.contains(a));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![b, c]);
        assert!(list.is_consistent());
    }

    #[test]
    fn iteration_is_bounded_on_corrupt_list() {
        let mut list = ThinkerList::new();
        let a = list.add(Think::Noop, ThinkerKind::Placeholder);
        list.get_mut(a).unwrap().links.next = ThinkerRef::Node(a);
        assert_eq!(list.iter().count(), 1);
        assert!(!list.is_consistent());
    }
}
