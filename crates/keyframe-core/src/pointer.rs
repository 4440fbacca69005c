//! Reference encoding between live keys and 32-bit stream values.
//!
//! A stored reference is either a reserved negative sentinel or a dense,
//! zero-based index into one identity domain. Which domain an index belongs
//! to is never stored: it is implied by the field being read, and the
//! encoder/decoder method called for that field.

use crate::id::{CeilingNodeId, Domain, LineIndex, PlatNodeId, SecNodeId, SectorIndex, ThinkerId};
use crate::idmap::IdentityMap;
use crate::serialize::{CaptureError, RestoreError};
use crate::thinker::{ThinkerClass, ThinkerList, ThinkerRef};

pub const NULL_REF: i32 = -1;
pub const CAP_REF: i32 = -2;
pub const DUMMY_REF: i32 = -3;
/// `ClassCap(c)` is stored as `CLASS_CAP_BASE - c.index()`.
pub const CLASS_CAP_BASE: i32 = -4;

/// Encode an optional plain table index, `-1` for none.
pub fn encode_index(index: Option<u32>) -> i32 {
    index.map_or(NULL_REF, |i| i as i32)
}

// ---------------------------------------------------------------------------
// Capture side
// ---------------------------------------------------------------------------

/// Dense numbering of one domain's live keys, built during preparation.
#[derive(Debug, Clone)]
pub struct IndexDomain<K: Domain> {
    map: IdentityMap,
    order: Vec<K>,
}

impl<K: Domain> IndexDomain<K> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: IdentityMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Number `key`, or return the index it already has.
    pub fn assign(&mut self, key: K) -> u32 {
        let before = self.map.len();
        let index = self.map.put(key.identity());
        if self.map.len() > before {
            self.order.push(key);
        }
        index
    }

    pub fn index_of(&self, key: K) -> Option<u32> {
        self.map.get(key.identity())
    }

    /// Keys in index order.
    pub fn keys(&self) -> &[K] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Encode an optional key of this domain.
    pub fn encode(&self, key: Option<K>) -> Result<i32, CaptureError> {
        let Some(key) = key else {
            return Ok(NULL_REF);
        };
        self.index_of(key)
            .map(|i| i as i32)
            .ok_or(CaptureError::Unresolved {
                domain: K::NAME,
                identity: key.identity(),
            })
    }
}

/// Everything capture needs to turn a live reference into a stream value.
pub struct RefEncoder<'w> {
    list: &'w ThinkerList,
    pub thinkers: IndexDomain<ThinkerId>,
    pub secnodes: IndexDomain<SecNodeId>,
    pub ceilings: IndexDomain<CeilingNodeId>,
    pub plats: IndexDomain<PlatNodeId>,
}

impl<'w> RefEncoder<'w> {
    pub fn new(
        list: &'w ThinkerList,
        thinkers: IndexDomain<ThinkerId>,
        secnodes: IndexDomain<SecNodeId>,
        ceilings: IndexDomain<CeilingNodeId>,
        plats: IndexDomain<PlatNodeId>,
    ) -> Self {
        Self {
            list,
            thinkers,
            secnodes,
            ceilings,
            plats,
        }
    }

    /// Encode a thinker reference exactly as it is.
    pub fn thinker(&self, r: ThinkerRef) -> Result<i32, CaptureError> {
        match r {
            ThinkerRef::Null => Ok(NULL_REF),
            ThinkerRef::Cap => Ok(CAP_REF),
            ThinkerRef::Dummy => Ok(DUMMY_REF),
            ThinkerRef::ClassCap(class) => Ok(CLASS_CAP_BASE - class.index() as i32),
            ThinkerRef::Node(id) => self.thinkers.encode(Some(id)),
        }
    }

    /// Encode a cross-reference to an actor. Actors waiting for delayed
    /// removal are written as null so they never come back as live targets.
    pub fn actor(&self, r: ThinkerRef) -> Result<i32, CaptureError> {
        if let Some(id) = r.node() {
            if self.list.get(id).is_some_and(|t| t.is_removed_actor()) {
                return Ok(NULL_REF);
            }
        }
        self.thinker(r)
    }

    pub fn secnode(&self, id: Option<SecNodeId>) -> Result<i32, CaptureError> {
        self.secnodes.encode(id)
    }

    pub fn ceiling_node(&self, id: Option<CeilingNodeId>) -> Result<i32, CaptureError> {
        self.ceilings.encode(id)
    }

    pub fn plat_node(&self, id: Option<PlatNodeId>) -> Result<i32, CaptureError> {
        self.plats.encode(id)
    }
}

// ---------------------------------------------------------------------------
// Restore side
// ---------------------------------------------------------------------------

/// Index -> key table for one domain, filled by the allocation pass.
#[derive(Debug, Clone)]
pub struct AllocTable<K: Domain> {
    keys: Vec<K>,
}

impl<K: Domain> Default for AllocTable<K> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<K: Domain> AllocTable<K> {
    pub fn push(&mut self, key: K) {
        self.keys.push(key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Resolve `-1` to `None` and a valid index to its key.
    pub fn resolve(&self, raw: i32) -> Result<Option<K>, RestoreError> {
        if raw == NULL_REF {
            return Ok(None);
        }
        usize::try_from(raw)
            .ok()
            .and_then(|i| self.keys.get(i))
            .copied()
            .map(Some)
            .ok_or(RestoreError::BadReference {
                domain: K::NAME,
                value: raw,
                len: self.keys.len(),
            })
    }
}

impl<K: Domain> FromIterator<K> for AllocTable<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Everything restore needs to turn a stream value back into a reference.
pub struct RefDecoder {
    pub thinkers: AllocTable<ThinkerId>,
    pub secnodes: AllocTable<SecNodeId>,
    pub ceilings: AllocTable<CeilingNodeId>,
    pub plats: AllocTable<PlatNodeId>,
    sectors: usize,
    lines: usize,
}

impl RefDecoder {
    pub fn new(
        thinkers: AllocTable<ThinkerId>,
        secnodes: AllocTable<SecNodeId>,
        ceilings: AllocTable<CeilingNodeId>,
        plats: AllocTable<PlatNodeId>,
        sectors: usize,
        lines: usize,
    ) -> Self {
        Self {
            thinkers,
            secnodes,
            ceilings,
            plats,
            sectors,
            lines,
        }
    }

    pub fn thinker(&self, raw: i32) -> Result<ThinkerRef, RestoreError> {
        match raw {
            NULL_REF => Ok(ThinkerRef::Null),
            CAP_REF => Ok(ThinkerRef::Cap),
            DUMMY_REF => Ok(ThinkerRef::Dummy),
            raw if raw <= CLASS_CAP_BASE => {
                let class = usize::try_from(CLASS_CAP_BASE - raw)
                    .ok()
                    .and_then(ThinkerClass::from_index)
                    .ok_or(RestoreError::BadReference {
                        domain: ThinkerId::NAME,
                        value: raw,
                        len: self.thinkers.len(),
                    })?;
                Ok(ThinkerRef::ClassCap(class))
            }
            raw => Ok(ThinkerRef::from(self.thinkers.resolve(raw)?)),
        }
    }

    /// A reference that must name an arena thinker.
    pub fn thinker_node(&self, raw: i32) -> Result<ThinkerId, RestoreError> {
        self.thinker(raw)?.node().ok_or(RestoreError::BadReference {
            domain: ThinkerId::NAME,
            value: raw,
            len: self.thinkers.len(),
        })
    }

    pub fn secnode(&self, raw: i32) -> Result<Option<SecNodeId>, RestoreError> {
        self.secnodes.resolve(raw)
    }

    pub fn ceiling_node(&self, raw: i32) -> Result<Option<CeilingNodeId>, RestoreError> {
        self.ceilings.resolve(raw)
    }

    pub fn plat_node(&self, raw: i32) -> Result<Option<PlatNodeId>, RestoreError> {
        self.plats.resolve(raw)
    }

    pub fn sector(&self, raw: u32) -> Result<SectorIndex, RestoreError> {
        if (raw as usize) < self.sectors {
            Ok(SectorIndex(raw))
        } else {
            Err(RestoreError::IndexOutOfRange {
                what: "sector",
                index: i64::from(raw),
                len: self.sectors,
            })
        }
    }

    pub fn sector_opt(&self, raw: i32) -> Result<Option<SectorIndex>, RestoreError> {
        match raw {
            NULL_REF => Ok(None),
            raw if raw >= 0 => self.sector(raw as u32).map(Some),
            raw => Err(RestoreError::IndexOutOfRange {
                what: "sector",
                index: i64::from(raw),
                len: self.sectors,
            }),
        }
    }

    pub fn line_opt(&self, raw: i32) -> Result<Option<LineIndex>, RestoreError> {
        match raw {
            NULL_REF => Ok(None),
            raw if raw >= 0 && (raw as usize) < self.lines => Ok(Some(LineIndex(raw as u32))),
            raw => Err(RestoreError::IndexOutOfRange {
                what: "line",
                index: i64::from(raw),
                len: self.lines,
            }),
        }
    }
}
