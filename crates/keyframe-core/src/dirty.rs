use crate::geometry::{Line, LineState, Side, SideState};
use crate::id::{LineIndex, SideIndex};

/// A line that has changed at least once since level load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyLine {
    pub line: LineIndex,
    /// The line's state as loaded from level data.
    pub clean: LineState,
}

/// A side that has changed at least once since level load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtySide {
    pub side: SideIndex,
    pub clean: SideState,
}

/// Tracks which lines and sides have ever been modified since level load.
///
/// Marks are monotonic: once a line or side is dirty it stays dirty for the
/// rest of the level, even if its value is later put back to the baseline.
/// Dirty records are kept in the order they were first marked, so a
/// snapshot's dirty count names a prefix of the current dirty list.
#[derive(Debug, Clone, Default)]
pub struct DirtyGeometry {
    lines: Vec<DirtyLine>,
    sides: Vec<DirtySide>,
    line_marked: Vec<bool>,
    side_marked: Vec<bool>,
    clean_lines: Vec<LineState>,
    clean_sides: Vec<SideState>,
}

impl DirtyGeometry {
    /// Record the level-load baseline. Nothing is dirty yet.
    pub fn from_level(lines: &[Line], sides: &[Side]) -> Self {
        Self {
            lines: Vec::new(),
            sides: Vec::new(),
            line_marked: vec![false; lines.len()],
            side_marked: vec![false; sides.len()],
            clean_lines: lines.iter().map(|l| l.state).collect(),
            clean_sides: sides.iter().map(|s| s.state).collect(),
        }
    }

    /// Mark a line dirty. Returns `true` if it was clean before.
    pub fn mark_line(&mut self, line: LineIndex) -> bool {
        let Some(marked) = self.line_marked.get_mut(line.get()) else {
            return false;
        };
        if *marked {
            return false;
        }
        *marked = true;
        self.lines.push(DirtyLine {
            line,
            clean: self.clean_lines[line.get()],
        });
        true
    }

    /// Mark a side dirty. Returns `true` if it was clean before.
    pub fn mark_side(&mut self, side: SideIndex) -> bool {
        let Some(marked) = self.side_marked.get_mut(side.get()) else {
            return false;
        };
        if *marked {
            return false;
        }
        *marked = true;
        self.sides.push(DirtySide {
            side,
            clean: self.clean_sides[side.get()],
        });
        true
    }

    /// Dirty lines in first-marked order.
    pub fn dirty_lines(&self) -> &[DirtyLine] {
        &self.lines
    }

    /// Dirty sides in first-marked order.
    pub fn dirty_sides(&self) -> &[DirtySide] {
        &self.sides
    }

    pub fn is_line_dirty(&self, line: LineIndex) -> bool {
        self.line_marked.get(line.get()).copied().unwrap_or(false)
    }

    pub fn is_side_dirty(&self, side: SideIndex) -> bool {
        self.side_marked.get(side.get()).copied().unwrap_or(false)
    }

    /// Returns `true` if nothing has been marked since level load.
    pub fn is_clean(&self) -> bool {
        self.lines.is_empty() && self.sides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(lines: usize, sides: usize) -> (Vec<Line>, Vec<Side>) {
        let lines = (0..lines)
            .map(|i| Line {
                state: LineState {
                    special: i as i16,
                    flags: 0,
                },
                ..Line::default()
            })
            .collect();
        (lines, vec![Side::default(); sides])
    }

    #[test]
    fn tracker_initially_clean() {
        let (lines, sides) = level(4, 4);
        let tracker = DirtyGeometry::from_level(&lines, &sides);
        assert!(tracker.is_clean());
        assert!(!tracker.is_line_dirty(LineIndex(0)));
    }

    #[test]
    fn marks_are_recorded_once_in_order() {
        let (lines, sides) = level(4, 2);
        let mut tracker = DirtyGeometry::from_level(&lines, &sides);
        assert!(tracker.mark_line(LineIndex(3)));
        assert!(tracker.mark_line(LineIndex(1)));
        assert!(!tracker.mark_line(LineIndex(3)));
        let order: Vec<_> = tracker.dirty_lines().iter().map(|d| d.line).collect();
        assert_eq!(order, vec![LineIndex(3), LineIndex(1)]);
    }

    #[test]
    fn record_keeps_level_baseline() {
        let (lines, sides) = level(4, 2);
        let mut tracker = DirtyGeometry::from_level(&lines, &sides);
        tracker.mark_line(LineIndex(2));
        assert_eq!(tracker.dirty_lines()[0].clean.special, 2);
    }

    #[test]
    fn out_of_range_marks_are_ignored() {
        let (lines, sides) = level(1, 1);
        let mut tracker = DirtyGeometry::from_level(&lines, &sides);
        assert!(!tracker.mark_line(LineIndex(9)));
        assert!(!tracker.mark_side(SideIndex(9)));
        assert!(tracker.is_clean());
    }
}
