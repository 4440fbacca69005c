//! Spatial hash for collision broad-phase: one actor list per map block.

use crate::fixed::Fixed;
use crate::id::ThinkerId;

/// log2 of the block size in map units.
pub const MAPBLOCKSHIFT: u32 = 7;

#[derive(Debug, Clone, Default)]
pub struct Blockmap {
    pub origin_x: Fixed,
    pub origin_y: Fixed,
    width: u32,
    height: u32,
    cells: Vec<Vec<ThinkerId>>,
}

impl Blockmap {
    pub fn new(origin_x: Fixed, origin_y: Fixed, width: u32, height: u32) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
            cells: vec![Vec::new(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cell holding the point, or `None` if it lies outside the map.
    pub fn cell_of(&self, x: Fixed, y: Fixed) -> Option<usize> {
        let shift = MAPBLOCKSHIFT + crate::fixed::FRACBITS;
        let bx = (x.to_bits().wrapping_sub(self.origin_x.to_bits())) >> shift;
        let by = (y.to_bits().wrapping_sub(self.origin_y.to_bits())) >> shift;
        if bx < 0 || by < 0 || bx as u32 >= self.width || by as u32 >= self.height {
            return None;
        }
        Some(by as usize * self.width as usize + bx as usize)
    }

    /// Actors in a cell, most recently linked first.
    pub fn cell(&self, index: usize) -> &[ThinkerId] {
        self.cells.get(index).map_or(&[], Vec::as_slice)
    }

    pub fn cells(&self) -> impl Iterator<Item = &[ThinkerId]> {
        self.cells.iter().map(Vec::as_slice)
    }

    pub fn link(&mut self, index: usize, id: ThinkerId) {
        if let Some(cell) = self.cells.get_mut(index) {
            cell.insert(0, id);
        }
    }

    pub fn unlink(&mut self, index: usize, id: ThinkerId) {
        if let Some(cell) = self.cells.get_mut(index) {
            cell.retain(|&other| other != id);
        }
    }

    pub(crate) fn replace_cell(&mut self, index: usize, actors: Vec<ThinkerId>) {
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = actors;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::fixed_from_int;
    use slotmap::SlotMap;

    #[test]
    fn cell_of_maps_blocks() {
        let bm = Blockmap::new(Fixed::ZERO, Fixed::ZERO, 4, 4);
        assert_eq!(bm.cell_of(fixed_from_int(10), fixed_from_int(10)), Some(0));
        assert_eq!(bm.cell_of(fixed_from_int(130), fixed_from_int(0)), Some(1));
        assert_eq!(bm.cell_of(fixed_from_int(0), fixed_from_int(130)), Some(4));
        assert_eq!(bm.cell_of(fixed_from_int(-1), fixed_from_int(0)), None);
        assert_eq!(bm.cell_of(fixed_from_int(600), fixed_from_int(0)), None);
    }

    #[test]
    fn link_and_unlink() {
        let mut sm: SlotMap<ThinkerId, ()> = SlotMap::with_key();
        let a = sm.insert(());
        let b = sm.insert(());
        let mut bm = Blockmap::new(Fixed::ZERO, Fixed::ZERO, 2, 2);
        bm.link(3, a);
        bm.link(3, b);
        assert_eq!(bm.cell(3), &[b, a]);
        bm.unlink(3, b);
        assert_eq!(bm.cell(3), &[a]);
        assert!(bm.cell(99).is_empty());
    }
}
