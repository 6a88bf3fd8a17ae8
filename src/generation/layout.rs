//! Placement of iterations side by side in the world.

use crate::core::{GridSize, IVec3};

/// Gap between neighbouring results, in cells
const SPACING: i32 = 2;

/// Square-ish grid of iteration slots
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    per_row: u32,
}

impl GridLayout {
    /// Layout for `amount` iterations: `ceil(sqrt(amount))` per row, at least one
    pub fn new(amount: u32) -> Self {
        let mut per_row = 1u32;
        while (per_row as u64) * (per_row as u64) < amount as u64 {
            per_row += 1;
        }
        Self { per_row }
    }

    pub fn per_row(&self) -> u32 {
        self.per_row
    }

    /// `(column, row)` of a zero-based slot
    pub fn slot(&self, index: u32) -> (u32, u32) {
        (index % self.per_row, index / self.per_row)
    }

    /// World origin of a slot holding a grid of `size`.
    ///
    /// Grid y extends along world z; world y is up.
    pub fn origin(&self, index: u32, size: GridSize) -> IVec3 {
        let (col, row) = self.slot(index);
        IVec3::new(
            SPACING + col as i32 * (size.x as i32 + SPACING),
            0,
            SPACING + row as i32 * (size.y as i32 + SPACING),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_row() {
        assert_eq!(GridLayout::new(0).per_row(), 1);
        assert_eq!(GridLayout::new(1).per_row(), 1);
        assert_eq!(GridLayout::new(4).per_row(), 2);
        assert_eq!(GridLayout::new(5).per_row(), 3);
        assert_eq!(GridLayout::new(9).per_row(), 3);
    }

    #[test]
    fn test_origin() {
        let layout = GridLayout::new(5);
        let size = GridSize::new(10, 6, 1);
        assert_eq!(layout.slot(4), (1, 1));
        assert_eq!(layout.origin(0, size), IVec3::new(2, 0, 2));
        assert_eq!(layout.origin(4, size), IVec3::new(14, 0, 10));
    }
}
