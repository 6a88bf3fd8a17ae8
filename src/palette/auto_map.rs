//! Nearest-color automatic block mapping.
//!
//! Candidate blocks come with an average color; only the ones present in a
//! [`BlockSelection`] are considered.

use std::collections::HashSet;

use super::color::Rgb;
use super::session::PaletteSession;

/// A block that symbols may be mapped to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockCandidate {
    pub block: String,
    /// Average color of the block's texture
    pub color: Rgb,
}

impl BlockCandidate {
    pub fn new(block: impl Into<String>, color: Rgb) -> Self {
        Self { block: block.into(), color }
    }
}

/// Plain set of selected block references
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockSelection {
    selected: HashSet<String>,
}

impl BlockSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, block: impl Into<String>) {
        self.selected.insert(block.into());
    }

    pub fn deselect(&mut self, block: &str) {
        self.selected.remove(block);
    }

    pub fn select_all<'a>(&mut self, candidates: impl IntoIterator<Item = &'a BlockCandidate>) {
        self.selected.extend(candidates.into_iter().map(|c| c.block.clone()));
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, block: &str) -> bool {
        self.selected.contains(block)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Selected candidate closest to `color`; ties go to the earlier candidate.
pub fn nearest<'a>(
    color: Rgb,
    candidates: &'a [BlockCandidate],
    selection: &BlockSelection,
) -> Option<&'a BlockCandidate> {
    candidates
        .iter()
        .filter(|c| selection.is_selected(&c.block))
        .min_by_key(|c| c.color.distance_sq(color))
}

/// Map each of `symbols` in the editable palette to its nearest selected block.
///
/// Returns the number of symbols that received a block.
pub fn auto_map(
    session: &mut PaletteSession,
    symbols: &[char],
    candidates: &[BlockCandidate],
    selection: &BlockSelection,
) -> usize {
    let mut mapped = 0;

    for &symbol in symbols {
        let Some(color) = session.editable().get(symbol).map(|item| item.color) else {
            log::warn!("Auto mapping skipped unknown symbol {:?}", symbol);
            continue;
        };
        let Some(candidate) = nearest(color, candidates, selection) else {
            log::warn!("No block selected for auto mapping");
            break;
        };
        if session.set_block(symbol, Some(candidate.block.clone())).is_ok() {
            mapped += 1;
        }
    }

    log::debug!("Auto mapped {}/{} symbols", mapped, symbols.len());
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::base::{BasePalette, BasePaletteEntry};
    use crate::palette::resolver::{resolve, BlockStateCatalog};

    fn candidates() -> Vec<BlockCandidate> {
        vec![
            BlockCandidate::new("black_wool", Rgb::new(20, 20, 25)),
            BlockCandidate::new("white_wool", Rgb::new(235, 235, 235)),
            BlockCandidate::new("red_wool", Rgb::new(160, 40, 35)),
        ]
    }

    fn session() -> PaletteSession {
        let base = BasePalette::from_entries(vec![
            BasePaletteEntry { symbol: 'B', color: Rgb::BLACK },
            BasePaletteEntry { symbol: 'W', color: Rgb::WHITE },
            BasePaletteEntry { symbol: 'R', color: Rgb::new(255, 0, 0) },
        ])
        .unwrap();
        let resolved = resolve(&base, &[], &BlockStateCatalog);
        PaletteSession::new(&base, &resolved)
    }

    #[test]
    fn test_nearest_respects_selection() {
        let candidates = candidates();
        let mut selection = BlockSelection::new();
        selection.select_all(&candidates);
        assert_eq!(nearest(Rgb::WHITE, &candidates, &selection).unwrap().block, "white_wool");

        selection.deselect("white_wool");
        assert_ne!(nearest(Rgb::WHITE, &candidates, &selection).unwrap().block, "white_wool");

        selection.clear();
        assert!(nearest(Rgb::WHITE, &candidates, &selection).is_none());
    }

    #[test]
    fn test_auto_map_edits_only_editable_copy() {
        let mut session = session();
        let candidates = candidates();
        let mut selection = BlockSelection::new();
        selection.select_all(&candidates);

        let mapped = auto_map(&mut session, &['B', 'R', 'Q'], &candidates, &selection);

        assert_eq!(mapped, 2);
        assert_eq!(session.editable().get('B').unwrap().block_ref(), Some("black_wool"));
        assert_eq!(session.editable().get('R').unwrap().block_ref(), Some("red_wool"));
        assert_eq!(session.editable().get('W').unwrap().block_ref(), None);
        assert_eq!(session.as_loaded().get('B').unwrap().block_ref(), None);
    }

    #[test]
    fn test_auto_map_with_empty_selection() {
        let mut session = session();
        let mapped = auto_map(&mut session, &['B'], &candidates(), &BlockSelection::new());
        assert_eq!(mapped, 0);
    }
}
