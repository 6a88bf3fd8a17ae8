//! Core type aliases and grid geometry

pub use glam::{IVec3, UVec3};

/// Standard Result type for the crate
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;

/// Dimensions of a voxel grid, in cells.
///
/// Cells are stored flat in x-major order: `x + y * SX + z * SX * SY`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridSize {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridSize {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Total number of cells, saturating on absurd sizes
    pub fn volume(&self) -> usize {
        (self.x as usize)
            .saturating_mul(self.y as usize)
            .saturating_mul(self.z as usize)
    }

    /// True when the grid is a single layer deep (2-D model)
    pub fn is_flat(&self) -> bool {
        self.z == 1
    }

    pub fn contains(&self, cell: UVec3) -> bool {
        cell.x < self.x && cell.y < self.y && cell.z < self.z
    }

    /// Flat index of a cell. The cell must lie inside the grid.
    pub fn index(&self, cell: UVec3) -> usize {
        cell.x as usize
            + cell.y as usize * self.x as usize
            + cell.z as usize * self.x as usize * self.y as usize
    }

    /// Inverse of [`GridSize::index`]
    pub fn cell(&self, index: usize) -> UVec3 {
        let sx = self.x as usize;
        let sxy = sx * self.y as usize;
        UVec3::new(
            (index % sx) as u32,
            ((index % sxy) / sx) as u32,
            (index / sxy) as u32,
        )
    }

    /// Component-wise maximum of two sizes
    pub fn max(&self, other: GridSize) -> GridSize {
        GridSize::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

}

impl std::fmt::Display for GridSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}
