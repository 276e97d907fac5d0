//! Worksheet type

use crate::cell::{CellAddress, CellData, CellError, CellStorage, Token};
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet: a named, sparse grid of formula cells
///
/// Every stored cell holds a tokenized formula plus the value and error from
/// its last evaluation. A plain number is stored as a one-token formula.
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Cell storage
    cells: CellStorage,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // === Cell Access ===

    /// Get a cell by label (e.g., "A1")
    pub fn cell(&self, label: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(label)?;
        Ok(self.cell_at(addr))
    }

    /// Get a cell by address
    pub fn cell_at(&self, address: CellAddress) -> Option<&CellData> {
        self.cells.get(address.row, address.col)
    }

    /// Get a mutable cell by address
    pub fn cell_at_mut(&mut self, address: CellAddress) -> Option<&mut CellData> {
        self.cells.get_mut(address.row, address.col)
    }

    /// Set a cell formula by label
    ///
    /// `source` is the text the tokens were produced from, kept for display.
    /// Any previously computed result is discarded.
    pub fn set_cell_formula<S: Into<String>>(
        &mut self,
        label: &str,
        formula: Vec<Token>,
        source: S,
    ) -> Result<()> {
        let addr = CellAddress::parse(label)?;
        self.set_cell_formula_at(addr, formula, source)
    }

    /// Set a cell formula by address
    pub fn set_cell_formula_at<S: Into<String>>(
        &mut self,
        address: CellAddress,
        formula: Vec<Token>,
        source: S,
    ) -> Result<()> {
        self.validate_cell_position(address)?;
        self.cells
            .set(address.row, address.col, CellData::new(formula, source));
        Ok(())
    }

    /// Store the result of evaluating a cell's formula
    pub fn set_formula_result(
        &mut self,
        address: CellAddress,
        value: f64,
        error: Option<CellError>,
    ) -> Result<()> {
        let cell = self.cell_at_mut(address).ok_or_else(|| {
            Error::InvalidAddress(format!("Cell {} not found", address))
        })?;

        cell.value = value;
        cell.error = error;
        Ok(())
    }

    /// Clear a cell
    pub fn clear_cell(&mut self, label: &str) -> Result<()> {
        let addr = CellAddress::parse(label)?;
        self.cells.remove(addr.row, addr.col);
        Ok(())
    }

    /// Remove every cell
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Iterate over all formula cells in row-major order
    pub fn formula_cells(&self) -> impl Iterator<Item = (CellAddress, &CellData)> {
        self.cells.iter()
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    fn validate_cell_position(&self, address: CellAddress) -> Result<()> {
        if address.row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(address.row, MAX_ROWS - 1));
        }
        if address.col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(address.col as u32, MAX_COLS - 1));
        }
        Ok(())
    }
}

impl Default for Worksheet {
    fn default() -> Self {
        Self::new("Sheet1")
    }
}
