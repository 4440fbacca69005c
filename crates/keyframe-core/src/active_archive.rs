//! Archiver for the active ceiling and platform lists.
//!
//! Both lists share one implementation; the node key type selects the
//! identity domain.

use crate::active::ActiveList;
use crate::id::Domain;
use crate::pointer::{AllocTable, IndexDomain, RefDecoder, RefEncoder};
use crate::serialize::{CaptureError, RestoreError};
use crate::stream::{LoadCursor, SaveBuffer};
use tracing::debug;

/// Number the list's nodes head first and emit the count.
pub fn prepare<K: Domain>(
    list: &ActiveList<K>,
    out: &mut SaveBuffer,
) -> Result<IndexDomain<K>, CaptureError> {
    let mut domain = IndexDomain::with_capacity(list.len());
    for key in list.keys() {
        domain.assign(key);
    }
    out.write_count(K::NAME, domain.len())?;
    debug!(domain = K::NAME, nodes = domain.len(), "prepared active list");
    Ok(domain)
}

/// Emit each node's mover reference. List order is implied by index order.
pub fn write_payloads<K: Domain>(
    list: &ActiveList<K>,
    domain: &IndexDomain<K>,
    enc: &RefEncoder<'_>,
    out: &mut SaveBuffer,
) -> Result<(), CaptureError> {
    for &key in domain.keys() {
        let mover = list.get(key).map(|n| n.mover).unwrap_or_default();
        out.write_i32(enc.thinker(mover)?);
    }
    Ok(())
}

/// Clear the list and allocate a chain of empty nodes of the recorded length.
pub fn allocate<K: Domain>(
    cur: &mut LoadCursor<'_>,
    list: &mut ActiveList<K>,
) -> Result<AllocTable<K>, RestoreError> {
    list.clear();
    let count = cur.read_len(4)?;
    Ok(list.alloc_chain(count).into_iter().collect())
}

pub fn fill<K: Domain>(
    cur: &mut LoadCursor<'_>,
    table: &AllocTable<K>,
    dec: &RefDecoder,
    list: &mut ActiveList<K>,
) -> Result<(), RestoreError> {
    for &key in table.keys() {
        let mover = dec.thinker(cur.read_i32()?)?;
        list.set_mover(key, mover);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::active::ActiveCeilings;
    use crate::thinker::{Think, ThinkerKind, ThinkerList, ThinkerRef};

    #[test]
    fn empty_list_is_four_zero_bytes() {
        let list = ActiveCeilings::new();
        let mut out = SaveBuffer::new();
        let domain = prepare(&list, &mut out).unwrap();
        assert!(domain.is_empty());
        assert_eq!(out.as_bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn movers_round_trip_in_list_order() {
        let mut thinkers = ThinkerList::new();
        let a = thinkers.add(Think::Noop, ThinkerKind::Placeholder);
        let b = thinkers.add(Think::Noop, ThinkerKind::Placeholder);
        let mut list = ActiveCeilings::new();
        list.add(a);
        list.add(b);

        let mut out = SaveBuffer::new();
        let mut tdomain = IndexDomain::with_capacity(2);
        tdomain.assign(a);
        tdomain.assign(b);
        let cdomain = prepare(&list, &mut out).unwrap();
        let enc = RefEncoder::new(
            &thinkers,
            tdomain,
            IndexDomain::with_capacity(0),
            IndexDomain::with_capacity(0),
            IndexDomain::with_capacity(0),
        );
        write_payloads(&list, &cdomain, &enc, &mut out).unwrap();
        let bytes = out.into_bytes();

        let table: AllocTable<_> = [a, b].into_iter().collect();
        let dec = RefDecoder::new(
            table,
            AllocTable::default(),
            AllocTable::default(),
            AllocTable::default(),
            0,
            0,
        );
        let mut cur = LoadCursor::new(&bytes);
        let mut restored = ActiveCeilings::new();
        let ctable = allocate(&mut cur, &mut restored).unwrap();
        fill(&mut cur, &ctable, &dec, &mut restored).unwrap();
        cur.finish().unwrap();
        assert_eq!(
            restored.movers().collect::<Vec<_>>(),
            vec![ThinkerRef::Node(b), ThinkerRef::Node(a)]
        );
    }
}
