//! Worksheet calculation engine
//!
//! Provides worksheet-level formula calculation with dependency tracking and
//! circular reference detection. The evaluator itself assumes referenced
//! cells are current; this module is what makes that true.
//!
//! # Example
//!
//! ```rust
//! use cellcalc::prelude::*;
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! // Entered out of order on purpose
//! cellcalc::set_formula(&mut sheet, "A3", "=A1+A2").unwrap();
//! cellcalc::set_formula(&mut sheet, "A1", "=10").unwrap();
//! cellcalc::set_formula(&mut sheet, "A2", "=20").unwrap();
//!
//! let stats = sheet.calculate().unwrap();
//! assert_eq!(stats.cells_calculated, 3);
//! assert_eq!(sheet.cell("A3").unwrap().unwrap().value, 30.0);
//! ```

use crate::{
    CellAddress, CellError, DependencyGraph, Error, Evaluator, EvaluatorOptions, Result,
    Worksheet,
};
use std::collections::BTreeSet;

/// Options for worksheet calculation
#[derive(Debug, Clone, Default)]
pub struct CalculationOptions {
    /// Options passed to the evaluator for every cell
    pub evaluator: EvaluatorOptions,
}

impl CalculationOptions {
    /// Set the maximum parenthesis nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.evaluator.max_depth = max_depth;
        self
    }
}

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Total number of formula cells
    pub formula_count: usize,
    /// Number of cells evaluated
    pub cells_calculated: usize,
    /// Number of cells found on a reference cycle
    pub circular_references: usize,
    /// Number of cells left holding an error
    pub errors: usize,
}

/// Extension trait for Worksheet to add calculation methods
pub trait WorksheetCalculationExt {
    /// Calculate all formulas in the worksheet with default options
    fn calculate(&mut self) -> Result<CalculationStats>;

    /// Calculate all formulas with custom options
    fn calculate_with_options(&mut self, options: &CalculationOptions) -> Result<CalculationStats>;

    /// Recalculate only the changed cells and everything that depends on them
    fn recalculate_cells(
        &mut self,
        changed: &[CellAddress],
        options: &CalculationOptions,
    ) -> Result<CalculationStats>;
}

impl WorksheetCalculationExt for Worksheet {
    fn calculate(&mut self) -> Result<CalculationStats> {
        self.calculate_with_options(&CalculationOptions::default())
    }

    fn calculate_with_options(&mut self, options: &CalculationOptions) -> Result<CalculationStats> {
        let mut engine = CalculationEngine::new(options.clone());
        engine.calculate_all(self)
    }

    fn recalculate_cells(
        &mut self,
        changed: &[CellAddress],
        options: &CalculationOptions,
    ) -> Result<CalculationStats> {
        let mut engine = CalculationEngine::new(options.clone());
        engine.calculate_changed(self, changed)
    }
}

/// The calculation engine
struct CalculationEngine {
    options: CalculationOptions,
    /// Dependency graph built from formulas
    dependency_graph: DependencyGraph,
    /// Cells holding a formula
    formula_cells: BTreeSet<CellAddress>,
    /// Cells on a reference cycle
    circular_cells: BTreeSet<CellAddress>,
}

impl CalculationEngine {
    fn new(options: CalculationOptions) -> Self {
        Self {
            options,
            dependency_graph: DependencyGraph::new(),
            formula_cells: BTreeSet::new(),
            circular_cells: BTreeSet::new(),
        }
    }

    /// Calculate all formulas in the worksheet
    fn calculate_all(&mut self, sheet: &mut Worksheet) -> Result<CalculationStats> {
        let all: Vec<CellAddress> = sheet.formula_cells().map(|(addr, _)| addr).collect();
        self.calculate_changed(sheet, &all)
    }

    /// Calculate the given cells and their dependents
    fn calculate_changed(
        &mut self,
        sheet: &mut Worksheet,
        changed: &[CellAddress],
    ) -> Result<CalculationStats> {
        let mut stats = CalculationStats::default();

        // Phase 1: Collect formulas, build dependency graph
        self.collect_formulas(sheet, &mut stats);

        if stats.formula_count == 0 {
            return Ok(stats);
        }

        // Phase 2: Detect circular references
        self.detect_circular_references();
        stats.circular_references = self.circular_cells.len();

        // Phase 3: Get calculation order (topological sort)
        let calc_order = self.get_calculation_order(changed);

        // Phase 4: Calculate cells in order
        self.calculate_cells(sheet, &calc_order, &mut stats)?;

        tracing::debug!(
            sheet = sheet.name(),
            formulas = stats.formula_count,
            calculated = stats.cells_calculated,
            errors = stats.errors,
            "calculation finished"
        );

        Ok(stats)
    }

    /// Collect all formulas from the worksheet and build the dependency graph
    fn collect_formulas(&mut self, sheet: &Worksheet, stats: &mut CalculationStats) {
        for (addr, cell) in sheet.formula_cells() {
            self.dependency_graph.add_formula(addr, &cell.formula);
            self.formula_cells.insert(addr);
            stats.formula_count += 1;
        }
    }

    /// Detect cells involved in circular references
    fn detect_circular_references(&mut self) {
        for &addr in &self.formula_cells {
            if self.dependency_graph.has_circular_reference(addr) {
                tracing::warn!(cell = %addr, "circular reference detected");
                self.circular_cells.insert(addr);
            }
        }
    }

    /// Get the calculation order via topological sort
    fn get_calculation_order(&self, changed: &[CellAddress]) -> Vec<CellAddress> {
        let mut order = self.dependency_graph.get_recalc_order(changed);

        // Referenced-but-empty cells have nothing to evaluate
        order.retain(|addr| self.formula_cells.contains(addr));

        order
    }

    /// Calculate cells in order, storing each result before its dependents run
    fn calculate_cells(
        &self,
        sheet: &mut Worksheet,
        order: &[CellAddress],
        stats: &mut CalculationStats,
    ) -> Result<()> {
        for &addr in order {
            if self.circular_cells.contains(&addr) {
                sheet.set_formula_result(addr, 0.0, Some(CellError::CircularReference))?;
                stats.errors += 1;
                continue;
            }

            let evaluation = {
                let cell = sheet
                    .cell_at(addr)
                    .ok_or_else(|| Error::other(format!("Cell {} not found", addr)))?;
                Evaluator::with_options(&*sheet, self.options.evaluator.clone())
                    .evaluate(&cell.formula)
            };

            if evaluation.error.is_some() {
                stats.errors += 1;
            }
            sheet.set_formula_result(addr, evaluation.value, evaluation.error)?;
            stats.cells_calculated += 1;
        }

        Ok(())
    }
}
