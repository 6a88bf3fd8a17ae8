//! Symbol palettes: base colors, per-model mappings and mesh resolution.

pub mod color;
pub mod base;
pub mod mapping;
pub mod resolver;
pub mod session;
pub mod auto_map;

pub use color::Rgb;
pub use base::{BasePalette, BasePaletteEntry};
pub use mapping::{FullPalette, MappingItem};
pub use resolver::{
    resolve, BlockCatalog, BlockId, BlockStateCatalog, MeshAssigner,
    MeshPaletteEntry, ResolvedPalette, DEFAULT_MESH,
};
pub use session::PaletteSession;
pub use auto_map::{auto_map, BlockCandidate, BlockSelection};
