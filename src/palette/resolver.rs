//! Symbol to `(mesh, color)` resolution.
//!
//! Mesh index 0 is the generic cube. Every distinct block identity gets its
//! own mesh index, handed out from 1 upwards on first use and reused for any
//! later symbol that names the same block.

use std::collections::HashMap;

use super::base::BasePalette;
use super::color::Rgb;
use super::mapping::{FullPalette, MappingItem};

/// Mesh index of the generic cube shape
pub const DEFAULT_MESH: u32 = 0;

/// Renderer-facing form of a palette entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshPaletteEntry {
    pub mesh_index: u32,
    pub color: Rgb,
}

impl MeshPaletteEntry {
    pub const fn cube(color: Rgb) -> Self {
        Self { mesh_index: DEFAULT_MESH, color }
    }

    pub fn is_cube(&self) -> bool {
        self.mesh_index == DEFAULT_MESH
    }
}

/// Canonical identity of a block shape
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(String);

impl BlockId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves textual block references to block identities.
///
/// Two references that denote the same block must resolve to equal ids.
pub trait BlockCatalog {
    /// `None` when the reference does not name a known block
    fn resolve(&self, reference: &str) -> Option<BlockId>;
}

/// Catalog accepting any well-formed `namespace:path[key=value,...]` reference.
///
/// The namespace defaults to `minecraft`, names and properties are
/// lower-cased and properties are sorted, so `Oak_Log[axis=y]` and
/// `minecraft:oak_log[ axis = y ]` are the same block.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockStateCatalog;

const DEFAULT_NAMESPACE: &str = "minecraft";

impl BlockStateCatalog {
    fn canonical_name(name: &str) -> Option<String> {
        let name = name.trim().to_ascii_lowercase();
        let (namespace, path) = match name.split_once(':') {
            Some((ns, path)) => (ns.to_string(), path.to_string()),
            None => (DEFAULT_NAMESPACE.to_string(), name),
        };

        let valid = |s: &str, extra: &[char]| {
            !s.is_empty()
                && s.chars().all(|c| {
                    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' || c == '.' || extra.contains(&c)
                })
        };

        if valid(&namespace, &[]) && valid(&path, &['/']) {
            Some(format!("{}:{}", namespace, path))
        } else {
            None
        }
    }

    fn canonical_properties(props: &str) -> Option<Vec<String>> {
        let mut out = Vec::new();
        for prop in props.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = prop.split_once('=')?;
            let (key, value) = (key.trim().to_ascii_lowercase(), value.trim().to_ascii_lowercase());
            if key.is_empty() || value.is_empty() {
                return None;
            }
            out.push(format!("{}={}", key, value));
        }
        out.sort();
        Some(out)
    }
}

impl BlockCatalog for BlockStateCatalog {
    fn resolve(&self, reference: &str) -> Option<BlockId> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        match reference.split_once('[') {
            None => Self::canonical_name(reference).map(BlockId),
            Some((name, rest)) => {
                let props = rest.strip_suffix(']')?;
                let name = Self::canonical_name(name)?;
                let props = Self::canonical_properties(props)?;
                if props.is_empty() {
                    Some(BlockId(name))
                } else {
                    Some(BlockId(format!("{}[{}]", name, props.join(","))))
                }
            }
        }
    }
}

/// Hands out mesh indices to block identities for one load operation.
pub struct MeshAssigner<'a, C: BlockCatalog + ?Sized> {
    catalog: &'a C,
    by_block: HashMap<BlockId, u32>,
    blocks: Vec<BlockId>,
}

impl<'a, C: BlockCatalog + ?Sized> MeshAssigner<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            by_block: HashMap::new(),
            blocks: Vec::new(),
        }
    }

    /// Resolve a color and optional block reference. Entries without a
    /// usable block reference keep the cube mesh and their own color.
    pub fn assign(&mut self, color: Rgb, reference: Option<&str>) -> MeshPaletteEntry {
        let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty()) else {
            return MeshPaletteEntry::cube(color);
        };

        let Some(block) = self.catalog.resolve(reference) else {
            log::warn!("Unknown block reference {:?}, using cube mesh", reference);
            return MeshPaletteEntry::cube(color);
        };

        if let Some(&mesh_index) = self.by_block.get(&block) {
            return MeshPaletteEntry { mesh_index, color };
        }

        let mesh_index = self.blocks.len() as u32 + 1;
        self.by_block.insert(block.clone(), mesh_index);
        self.blocks.push(block);

        MeshPaletteEntry { mesh_index, color }
    }

    pub fn assign_item(&mut self, item: &MappingItem) -> MeshPaletteEntry {
        self.assign(item.color, item.block_ref())
    }

    /// Blocks by mesh index; `blocks[i]` is mesh `i + 1`
    pub fn finish(self) -> Vec<BlockId> {
        self.blocks
    }
}

/// Result of merging the base palette with a model's custom mapping
#[derive(Clone, Debug, Default)]
pub struct ResolvedPalette {
    /// Merged palette, base order first, new custom symbols appended
    pub full: FullPalette,
    meshes: HashMap<char, MeshPaletteEntry>,
    block_meshes: Vec<BlockId>,
}

impl ResolvedPalette {
    pub fn mesh(&self, symbol: char) -> Option<MeshPaletteEntry> {
        self.meshes.get(&symbol).copied()
    }

    /// Block of a mesh index, `None` for the cube or out of range
    pub fn block_for_mesh(&self, mesh_index: u32) -> Option<&BlockId> {
        (mesh_index as usize).checked_sub(1).and_then(|i| self.block_meshes.get(i))
    }

    /// Number of meshes including the cube
    pub fn mesh_count(&self) -> usize {
        self.block_meshes.len() + 1
    }

    pub fn block_meshes(&self) -> &[BlockId] {
        &self.block_meshes
    }
}

/// Merge `base` with `custom` and resolve every symbol to a mesh entry.
///
/// Custom items are processed in order; an item fully supersedes the base
/// entry of its symbol. Deterministic for identical input order.
pub fn resolve<C: BlockCatalog + ?Sized>(
    base: &BasePalette,
    custom: &[MappingItem],
    catalog: &C,
) -> ResolvedPalette {
    let mut full = FullPalette::new();
    let mut meshes = HashMap::with_capacity(base.len() + custom.len());

    for entry in base.entries() {
        full.insert(MappingItem::new(entry.symbol, entry.color));
        meshes.insert(entry.symbol, MeshPaletteEntry::cube(entry.color));
    }

    let mut assigner = MeshAssigner::new(catalog);
    for item in custom {
        meshes.insert(item.symbol, assigner.assign_item(item));
        full.insert(item.clone());
    }

    let block_meshes = assigner.finish();
    log::debug!(
        "Resolved palette: {} symbols, {} block meshes",
        full.len(),
        block_meshes.len()
    );

    ResolvedPalette { full, meshes, block_meshes }
}
