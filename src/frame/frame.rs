//! Full grid snapshot of a generation process.

use crate::core::{Error, GridSize, Result, UVec3};

/// One full snapshot of the grid, as symbols.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationFrame {
    values: Vec<char>,
    size: GridSize,
    step_count: u32,
    /// Symbol of an untouched cell
    empty: char,
}

impl GenerationFrame {
    pub fn new(values: Vec<char>, size: GridSize, step_count: u32, empty: char) -> Result<Self> {
        if values.len() != size.volume() {
            return Err(Error::Frame(format!(
                "Frame of size {} needs {} cells, got {}",
                size,
                size.volume(),
                values.len()
            )));
        }
        Ok(Self { values, size, step_count, empty })
    }

    /// Build from legend indices, the generator's native form.
    ///
    /// `legend[0]` is the symbol of an untouched cell.
    pub fn from_indexed(values: &[u8], legend: &[char], size: GridSize, step_count: u32) -> Result<Self> {
        let empty = *legend
            .first()
            .ok_or_else(|| Error::Frame("Empty legend".into()))?;

        let symbols = values
            .iter()
            .map(|&v| {
                legend.get(v as usize).copied().ok_or_else(|| {
                    Error::Frame(format!("Value {} outside legend of {} symbols", v, legend.len()))
                })
            })
            .collect::<Result<Vec<char>>>()?;

        Self::new(symbols, size, step_count, empty)
    }

    pub fn values(&self) -> &[char] {
        &self.values
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn empty_symbol(&self) -> char {
        self.empty
    }

    pub fn symbol_at(&self, cell: UVec3) -> Option<char> {
        if self.size.contains(cell) {
            Some(self.values[self.size.index(cell)])
        } else {
            None
        }
    }
}
