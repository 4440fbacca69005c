//! Archiver for sector/thing cross-reference nodes and their free list.

use crate::geometry::Sector;
use crate::id::{Domain, SecNodeId};
use crate::pointer::{AllocTable, IndexDomain, RefDecoder, RefEncoder};
use crate::secnode::SecNodes;
use crate::serialize::{CaptureError, RestoreError};
use crate::stream::{LoadCursor, SaveBuffer};
use tracing::debug;

/// Bytes per archived live node.
const NODE_SIZE: usize = 4 + 5 * 4 + 1;

/// Upper bound on a restored free list. Free nodes carry no payload, so
/// their count cannot be checked against the stream length.
pub const MAX_FREE_NODES: usize = 1 << 16;

/// Number every live node, walking each sector's touching list in sector
/// order, and emit the live count and free-list length.
pub fn prepare(
    sectors: &[Sector],
    nodes: &SecNodes,
    out: &mut SaveBuffer,
) -> Result<IndexDomain<SecNodeId>, CaptureError> {
    let mut domain = IndexDomain::with_capacity(nodes.allocated());
    for sector in sectors {
        for id in nodes.chain(sector.touching_thinglist, |n| n.snext) {
            domain.assign(id);
        }
    }
    let free = nodes.free_len();
    out.write_count("sector nodes", domain.len())?;
    out.write_count("free sector nodes", free)?;
    debug!(live = domain.len(), free, "prepared sector node domain");
    Ok(domain)
}

pub fn write_payloads(
    nodes: &SecNodes,
    enc: &RefEncoder<'_>,
    out: &mut SaveBuffer,
) -> Result<(), CaptureError> {
    for &id in enc.secnodes.keys() {
        let Some(node) = nodes.get(id) else {
            return Err(CaptureError::Unresolved {
                domain: SecNodeId::NAME,
                identity: id.identity(),
            });
        };
        out.write32(node.sector.0);
        out.write_i32(enc.actor(node.thing)?);
        out.write_i32(enc.secnode(node.tprev)?);
        out.write_i32(enc.secnode(node.tnext)?);
        out.write_i32(enc.secnode(node.sprev)?);
        out.write_i32(enc.secnode(node.snext)?);
        out.write_bool(node.visited);
    }
    Ok(())
}

/// Clear the node storage, allocate the live nodes and rebuild a free list
/// of the recorded length.
pub fn allocate(
    cur: &mut LoadCursor<'_>,
    nodes: &mut SecNodes,
) -> Result<AllocTable<SecNodeId>, RestoreError> {
    nodes.clear();
    let live = cur.read_len(NODE_SIZE)?;
    let free = cur.read_count()?;
    if free > MAX_FREE_NODES {
        return Err(RestoreError::TooMany {
            what: "free sector nodes",
            count: free,
            limit: MAX_FREE_NODES,
        });
    }
    let table: AllocTable<SecNodeId> = (0..live).map(|_| nodes.insert_unlinked()).collect();
    nodes.reserve_free(free);
    debug!(live, free, "allocated sector nodes");
    Ok(table)
}

pub fn fill(
    cur: &mut LoadCursor<'_>,
    dec: &RefDecoder,
    nodes: &mut SecNodes,
) -> Result<(), RestoreError> {
    for &id in dec.secnodes.keys() {
        let sector = dec.sector(cur.read32()?)?;
        let thing = dec.thinker(cur.read_i32()?)?;
        let tprev = dec.secnode(cur.read_i32()?)?;
        let tnext = dec.secnode(cur.read_i32()?)?;
        let sprev = dec.secnode(cur.read_i32()?)?;
        let snext = dec.secnode(cur.read_i32()?)?;
        let visited = cur.read_bool()?;
        let Some(node) = nodes.get_mut(id) else {
            return Err(RestoreError::BrokenList("sector node"));
        };
        node.sector = sector;
        node.thing = thing;
        node.tprev = tprev;
        node.tnext = tnext;
        node.sprev = sprev;
        node.snext = snext;
        node.visited = visited;
    }
    Ok(())
}
