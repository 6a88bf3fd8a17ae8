//! In-memory recording and its file schema.

use serde::{Deserialize, Serialize};

use crate::core::GridSize;
use crate::frame::BlockChange;
use crate::palette::{BlockCatalog, BlockId, MappingItem, MeshAssigner, MeshPaletteEntry, Rgb};

/// Palette entry of a recording; the position in the palette is the value index
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingPaletteEntry {
    #[serde(default, alias = "Character", skip_serializing_if = "Option::is_none")]
    pub symbol: Option<char>,
    #[serde(rename = "color_hex", alias = "Color")]
    pub color: Rgb,
    #[serde(
        default,
        rename = "block_reference",
        alias = "BlockState",
        skip_serializing_if = "Option::is_none"
    )]
    pub block: Option<String>,
}

impl RecordingPaletteEntry {
    pub fn block_ref(&self) -> Option<&str> {
        self.block.as_deref().map(str::trim).filter(|b| !b.is_empty())
    }
}

impl From<&MappingItem> for RecordingPaletteEntry {
    fn from(item: &MappingItem) -> Self {
        Self {
            symbol: Some(item.symbol),
            color: item.color,
            block: item.block_ref().map(str::to_string),
        }
    }
}

/// Serialized form of a recording
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingFile {
    #[serde(alias = "Palette")]
    pub palette: Vec<RecordingPaletteEntry>,
    #[serde(alias = "SizeX")]
    pub size_x: u32,
    #[serde(alias = "SizeY")]
    pub size_y: u32,
    #[serde(alias = "SizeZ")]
    pub size_z: u32,
    #[serde(alias = "FrameData")]
    pub frame_data: Vec<String>,
}

/// A change log ready for replay.
///
/// Immutable once built; replay sessions may share one through an `Arc`.
#[derive(Clone, Debug)]
pub struct Recording {
    palette: Vec<RecordingPaletteEntry>,
    size: GridSize,
    frames: Vec<Vec<BlockChange>>,
    meshes: Vec<MeshPaletteEntry>,
    block_meshes: Vec<BlockId>,
}

impl Recording {
    /// Assemble a recording, resolving its palette to meshes in palette order.
    pub fn new<C: BlockCatalog + ?Sized>(
        palette: Vec<RecordingPaletteEntry>,
        size: GridSize,
        frames: Vec<Vec<BlockChange>>,
        catalog: &C,
    ) -> Self {
        let mut assigner = MeshAssigner::new(catalog);
        let meshes = palette
            .iter()
            .map(|entry| assigner.assign(entry.color, entry.block_ref()))
            .collect();

        Self {
            palette,
            size,
            frames,
            meshes,
            block_meshes: assigner.finish(),
        }
    }

    pub fn palette(&self) -> &[RecordingPaletteEntry] {
        &self.palette
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn frames(&self) -> &[Vec<BlockChange>] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&[BlockChange]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn change_count(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }

    /// All changes in recording order
    pub fn changes(&self) -> impl Iterator<Item = &BlockChange> {
        self.frames.iter().flatten()
    }

    /// Mesh entry of a value index
    pub fn mesh(&self, value: u16) -> Option<MeshPaletteEntry> {
        self.meshes.get(value as usize).copied()
    }

    pub fn meshes(&self) -> &[MeshPaletteEntry] {
        &self.meshes
    }

    /// Blocks by mesh index; `block_meshes()[i]` is mesh `i + 1`
    pub fn block_meshes(&self) -> &[BlockId] {
        &self.block_meshes
    }

    pub fn is_flat(&self) -> bool {
        self.size.is_flat()
    }
}
