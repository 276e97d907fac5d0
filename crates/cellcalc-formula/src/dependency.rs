//! Dependency tracking for formula calculation

use cellcalc_core::{CellAddress, Token};
use std::collections::{BTreeMap, BTreeSet};

/// Collect the cells a formula refers to, in order of first appearance
pub fn extract_references(formula: &[Token]) -> Vec<CellAddress> {
    let mut seen = BTreeSet::new();
    formula
        .iter()
        .filter_map(Token::as_reference)
        .filter(|addr| seen.insert(*addr))
        .collect()
}

/// Dependency graph for formula cells
///
/// Tracks which cells depend on which other cells,
/// enabling recalculation in dependency order.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Cell → Cells that depend on it (dependents)
    dependents: BTreeMap<CellAddress, BTreeSet<CellAddress>>,
    /// Cell → Cells it depends on (precedents)
    precedents: BTreeMap<CellAddress, BTreeSet<CellAddress>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: CellAddress, dependent: CellAddress) {
        self.dependents
            .entry(precedent)
            .or_default()
            .insert(dependent);
        self.precedents
            .entry(dependent)
            .or_default()
            .insert(precedent);
    }

    /// Record every reference in `formula` as a precedent of `cell`
    pub fn add_formula(&mut self, cell: CellAddress, formula: &[Token]) {
        for precedent in extract_references(formula) {
            self.add_dependency(precedent, cell);
        }
    }

    /// Get cells that depend on the given cell
    pub fn get_dependents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get cells that the given cell depends on
    pub fn get_precedents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.precedents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get the changed cells plus everything downstream of them, precedents first
    ///
    /// Cells on a cycle still appear exactly once; their relative order is
    /// unspecified.
    pub fn get_recalc_order(&self, changed: &[CellAddress]) -> Vec<CellAddress> {
        let mut result = Vec::new();
        let mut visited = BTreeSet::new();
        let mut in_stack = BTreeSet::new();

        for &cell in changed {
            self.topological_sort(cell, &mut result, &mut visited, &mut in_stack);
        }

        // Post-order over dependents puts the last dependent first
        result.reverse();
        result
    }

    /// Topological sort helper (DFS)
    fn topological_sort(
        &self,
        cell: CellAddress,
        result: &mut Vec<CellAddress>,
        visited: &mut BTreeSet<CellAddress>,
        in_stack: &mut BTreeSet<CellAddress>,
    ) {
        if visited.contains(&cell) || in_stack.contains(&cell) {
            return;
        }

        in_stack.insert(cell);

        // Visit all dependents first
        for dependent in self.get_dependents(cell) {
            self.topological_sort(dependent, result, visited, in_stack);
        }

        in_stack.remove(&cell);
        visited.insert(cell);
        result.push(cell);
    }

    /// Check whether a cell lies on a reference cycle
    ///
    /// Cells that merely depend on a cycle are not on it.
    pub fn has_circular_reference(&self, cell: CellAddress) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<CellAddress> = self.get_precedents(cell).collect();

        while let Some(current) = stack.pop() {
            if current == cell {
                return true;
            }
            if visited.insert(current) {
                stack.extend(self.get_precedents(current));
            }
        }

        false
    }
}
