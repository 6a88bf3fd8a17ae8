//! Base symbol palette shared by every model of a session.
//!
//! The base palette is loaded once and never mutated afterwards. It is an
//! ordinary value: whoever owns the session builds it and lends it out.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use super::color::Rgb;

/// One `symbol -> color` pair of the base palette
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePaletteEntry {
    pub symbol: char,
    #[serde(rename = "value", alias = "color")]
    pub color: Rgb,
}

/// Immutable, ordered base palette
#[derive(Clone, Debug, Default)]
pub struct BasePalette {
    entries: Vec<BasePaletteEntry>,
    by_symbol: HashMap<char, usize>,
}

impl BasePalette {
    /// Build from entries in file order. Duplicate symbols are rejected.
    pub fn from_entries(entries: Vec<BasePaletteEntry>) -> Result<Self> {
        let mut by_symbol = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if by_symbol.insert(entry.symbol, i).is_some() {
                return Err(Error::Palette(format!(
                    "Duplicate base palette symbol {:?}",
                    entry.symbol
                )));
            }
        }
        Ok(Self { entries, by_symbol })
    }

    /// Parse a JSON array of `{"symbol": "B", "value": "000000"}` objects
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<BasePaletteEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Load from file (sync)
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let palette = Self::from_json_str(&json)?;
        log::info!("Base palette loaded from {}: {} symbols", path.display(), palette.len());
        Ok(palette)
    }

    pub fn get(&self, symbol: char) -> Option<Rgb> {
        self.by_symbol.get(&symbol).map(|&i| self.entries[i].color)
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.by_symbol.contains_key(&symbol)
    }

    pub fn entries(&self) -> &[BasePaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
