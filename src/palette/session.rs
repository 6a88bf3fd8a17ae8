//! Palette editing session: an authoritative as-loaded palette plus an
//! editable copy used for export overrides.

use std::collections::{HashMap, HashSet};

use crate::core::{Error, Result};
use super::base::BasePalette;
use super::color::Rgb;
use super::mapping::{FullPalette, MappingItem};
use super::resolver::ResolvedPalette;

/// Two independent copies of a model's palette.
///
/// Edits only ever touch the editable copy.
#[derive(Clone, Debug)]
pub struct PaletteSession {
    base_colors: HashMap<char, Rgb>,
    as_loaded: FullPalette,
    editable: FullPalette,
}

impl PaletteSession {
    pub fn new(base: &BasePalette, resolved: &ResolvedPalette) -> Self {
        let as_loaded = resolved.full.clone();
        let editable = as_loaded.clone();
        Self {
            base_colors: base.entries().iter().map(|e| (e.symbol, e.color)).collect(),
            as_loaded,
            editable,
        }
    }

    pub fn as_loaded(&self) -> &FullPalette {
        &self.as_loaded
    }

    pub fn editable(&self) -> &FullPalette {
        &self.editable
    }

    /// Apply an edit to the editable item of `symbol`
    pub fn edit(&mut self, symbol: char, f: impl FnOnce(&mut MappingItem)) -> Result<()> {
        let item = self
            .editable
            .get_mut(symbol)
            .ok_or_else(|| Error::Palette(format!("Unknown symbol {:?}", symbol)))?;
        f(item);
        // The key must stay stable no matter what the closure did
        item.symbol = symbol;
        Ok(())
    }

    pub fn set_color(&mut self, symbol: char, color: Rgb) -> Result<()> {
        self.edit(symbol, |item| item.color = color)
    }

    pub fn set_block(&mut self, symbol: char, block: Option<String>) -> Result<()> {
        self.edit(symbol, |item| item.block = block)
    }

    /// Color a symbol falls back to: the base color, or the as-loaded color
    /// for symbols the base palette does not know.
    pub fn base_color(&self, symbol: char) -> Option<Rgb> {
        self.base_colors
            .get(&symbol)
            .copied()
            .or_else(|| self.as_loaded.get(symbol).map(|item| item.color))
    }

    /// Restore the base color of the editable item. The block reference is kept.
    pub fn revert_to_base(&mut self, symbol: char) -> Result<()> {
        let color = self
            .base_color(symbol)
            .ok_or_else(|| Error::Palette(format!("Unknown symbol {:?}", symbol)))?;
        self.set_color(symbol, color)
    }

    /// Whether the editable item still maps to the as-loaded target
    pub fn is_override_identical(&self, symbol: char) -> bool {
        match (self.as_loaded.get(symbol), self.editable.get(symbol)) {
            (Some(loaded), Some(edited)) => loaded.maps_identical(edited),
            _ => true,
        }
    }

    /// The editable item, only when it differs from the as-loaded one
    pub fn override_for(&self, symbol: char) -> Option<&MappingItem> {
        if self.is_override_identical(symbol) {
            None
        } else {
            self.editable.get(symbol)
        }
    }

    /// Editable items whose symbol is in `symbols`, in palette order
    pub fn partial_for_editing(&self, symbols: &HashSet<char>) -> Vec<&MappingItem> {
        self.editable
            .iter()
            .filter(|item| symbols.contains(&item.symbol))
            .collect()
    }

    /// Whether the editable item carries information beyond the base palette
    pub fn should_be_saved(&self, symbol: char) -> bool {
        match self.editable.get(symbol) {
            Some(item) => item.block_ref().is_some() || Some(item.color) != self.base_colors.get(&symbol).copied(),
            None => false,
        }
    }

    /// Items worth writing back as a model's custom mapping
    pub fn custom_mapping(&self) -> Vec<MappingItem> {
        self.editable
            .iter()
            .filter(|item| self.should_be_saved(item.symbol))
            .cloned()
            .collect()
    }

    /// Independent snapshot of the editable palette
    pub fn export_palette(&self) -> FullPalette {
        self.editable.clone()
    }
}
