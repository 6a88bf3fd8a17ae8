//! Per-model mapping items and the ordered palette that holds them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::color::Rgb;

/// Mapping of one symbol to a color and, optionally, a block reference.
///
/// A mapping item replaces the base palette entry of its symbol entirely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingItem {
    #[serde(alias = "Character")]
    pub symbol: char,
    #[serde(alias = "Color")]
    pub color: Rgb,
    #[serde(
        default,
        rename = "block_reference",
        alias = "BlockState",
        skip_serializing_if = "Option::is_none"
    )]
    pub block: Option<String>,
}

impl MappingItem {
    pub fn new(symbol: char, color: Rgb) -> Self {
        Self { symbol, color, block: None }
    }

    pub fn with_block(mut self, block: impl Into<String>) -> Self {
        self.block = Some(block.into());
        self
    }

    /// Block reference, if one is set and not blank
    pub fn block_ref(&self) -> Option<&str> {
        self.block.as_deref().map(str::trim).filter(|b| !b.is_empty())
    }

    /// Whether both items map to the same visual target
    /// (same color, same block reference).
    pub fn maps_identical(&self, other: &MappingItem) -> bool {
        self.color == other.color && self.block_ref() == other.block_ref()
    }
}

/// Ordered `symbol -> MappingItem` table.
///
/// Cloning yields a fully independent copy; no item is shared between clones.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FullPalette {
    items: Vec<MappingItem>,
    by_symbol: HashMap<char, usize>,
}

impl FullPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item, fully replacing any existing item for the same symbol.
    /// A replaced item keeps its original position.
    pub fn insert(&mut self, item: MappingItem) {
        match self.by_symbol.get(&item.symbol) {
            Some(&i) => self.items[i] = item,
            None => {
                self.by_symbol.insert(item.symbol, self.items.len());
                self.items.push(item);
            }
        }
    }

    pub fn get(&self, symbol: char) -> Option<&MappingItem> {
        self.by_symbol.get(&symbol).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, symbol: char) -> Option<&mut MappingItem> {
        self.by_symbol.get(&symbol).map(|&i| &mut self.items[i])
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.by_symbol.contains_key(&symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappingItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<MappingItem> for FullPalette {
    fn from_iter<I: IntoIterator<Item = MappingItem>>(iter: I) -> Self {
        let mut palette = FullPalette::new();
        for item in iter {
            palette.insert(item);
        }
        palette
    }
}
