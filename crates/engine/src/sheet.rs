//! Sheet orchestration: cell storage, formula assignment, memoized reads.
//!
//! The sheet is the sole mutation and lookup entry point. A content change
//! flows: payload rebuild (parsing formulas) → cycle validation → edge
//! update → transitive cache invalidation → extents update. A value read
//! flows: cache hit, or recompute against current contents and repopulate.
//!
//! Single-writer, single-threaded. The value cache sits behind a `RefCell`
//! so reads can memoize; nothing here is `Sync`.

use std::cell::RefCell;

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::addr::{Addr, Size};
use crate::cell::{Cell, CellContent, CellValue};
use crate::dep_graph::DepGraph;
use crate::error::SheetError;
use crate::extents::Extents;
use crate::formula::{parse, ArithError, CellLookup};

#[derive(Debug, Default)]
pub struct Sheet {
    cells: FxHashMap<Addr, Cell>,
    graph: DepGraph,
    /// Memoized cell values; a missing entry is stale.
    cache: RefCell<FxHashMap<Addr, CellValue>>,
    extents: Extents,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a cell's content.
    ///
    /// Text starting with `=` (and longer than the `=` alone) is parsed as
    /// a formula and evaluated eagerly. Fails without touching any state on
    /// an invalid address, a malformed formula, or a formula that would
    /// close a dependency cycle.
    pub fn set_cell(&mut self, addr: Addr, text: &str) -> Result<(), SheetError> {
        if !addr.is_valid() {
            return Err(SheetError::InvalidAddress(addr));
        }

        let cell = match formula_source(text) {
            Some(source) => {
                let expr = parse(source)?;
                let refs = dedup_in_order(expr.referenced_cells());
                if self.graph.would_create_cycle(addr, &refs) {
                    return Err(SheetError::CircularReference);
                }
                Cell::formula(expr, refs)
            }
            None => Cell::text(text),
        };

        // Commit: edges, storage, extents, then cache.
        let new_children: FxHashSet<Addr> = match cell.content() {
            CellContent::Formula { refs, .. } => refs.iter().copied().collect(),
            CellContent::Text(_) => FxHashSet::default(),
        };
        self.graph.replace_edges(addr, new_children);
        self.cells.insert(addr, cell);
        self.extents.insert(addr);
        self.invalidate(addr);

        // Eager evaluation at assignment time; the cache entry is the
        // memoized last-computed value.
        let value = self.memoized_value(addr);
        debug!("set {addr}: {text:?} -> {value:?}");
        Ok(())
    }

    /// Look up a cell. `Ok(None)` for a valid but unpopulated address.
    pub fn get_cell(&self, addr: Addr) -> Result<Option<&Cell>, SheetError> {
        if !addr.is_valid() {
            return Err(SheetError::InvalidAddress(addr));
        }
        Ok(self.cells.get(&addr))
    }

    /// A cell's computed value, memoized. Recomputes against current sheet
    /// contents on a cache miss. `Ok(None)` for an unpopulated address.
    pub fn value(&self, addr: Addr) -> Result<Option<CellValue>, SheetError> {
        if !addr.is_valid() {
            return Err(SheetError::InvalidAddress(addr));
        }
        Ok(self.memoized_value(addr))
    }

    /// A cell's textual form: the original literal, or `=` plus the
    /// canonical rendering of its formula.
    pub fn text(&self, addr: Addr) -> Result<Option<String>, SheetError> {
        if !addr.is_valid() {
            return Err(SheetError::InvalidAddress(addr));
        }
        Ok(self.cells.get(&addr).map(|c| c.display_text()))
    }

    /// Remove a cell. Clearing an absent cell is a no-op. Cells whose
    /// formulas reference the cleared address keep their edges; they now
    /// read it as empty.
    pub fn clear_cell(&mut self, addr: Addr) -> Result<(), SheetError> {
        if !addr.is_valid() {
            return Err(SheetError::InvalidAddress(addr));
        }
        if self.cells.remove(&addr).is_none() {
            return Ok(());
        }

        self.graph.clear_cell(addr);
        self.invalidate(addr);
        let cells = &self.cells;
        self.extents.remove(addr, |a| cells.contains_key(&a));
        debug!("cleared {addr}");
        Ok(())
    }

    /// The smallest rectangle containing all populated cells.
    pub fn printable_size(&self) -> Size {
        self.extents.size()
    }

    /// Drop cached values for the cell and everything that depends on it,
    /// directly or transitively.
    fn invalidate(&mut self, addr: Addr) {
        let dirty = self.graph.parent_closure(addr);
        let mut cache = self.cache.borrow_mut();
        for a in &dirty {
            cache.remove(a);
        }
        trace!("invalidated {} cells after change at {addr}", dirty.len());
    }

    fn memoized_value(&self, addr: Addr) -> Option<CellValue> {
        if !self.cells.contains_key(&addr) {
            return None;
        }
        self.warm_cache(addr);
        self.cache.borrow().get(&addr).cloned()
    }

    /// Populate cache entries for the cell and every uncached cell it
    /// transitively reads, deepest first. The walk carries an explicit
    /// stack; formula chains can be thousands of cells deep, which would
    /// overflow the call stack under naive recursion. Terminates because
    /// the committed edge relation is acyclic.
    fn warm_cache(&self, addr: Addr) {
        let mut stack = vec![addr];
        while let Some(&top) = stack.last() {
            let Some(cell) = self.cells.get(&top) else {
                stack.pop();
                continue;
            };
            if self.cache.borrow().contains_key(&top) {
                stack.pop();
                continue;
            }
            let pending: Vec<Addr> = cell
                .referenced_cells()
                .iter()
                .copied()
                .filter(|r| self.cells.contains_key(r) && !self.cache.borrow().contains_key(r))
                .collect();
            if pending.is_empty() {
                // Every reference now resolves from the cache (or reads as
                // empty), so this evaluation stays shallow.
                let value = cell.compute_value(self);
                self.cache.borrow_mut().insert(top, value);
                stack.pop();
            } else {
                stack.extend(pending);
            }
        }
    }
}

impl CellLookup for Sheet {
    fn cell_value(&self, addr: Addr) -> Result<f64, ArithError> {
        match self.memoized_value(addr) {
            // Referenced-but-unpopulated cells read as zero.
            None => Ok(0.0),
            Some(CellValue::Number(n)) => Ok(n),
            Some(CellValue::Text(_)) => Err(ArithError),
            Some(CellValue::Error(e)) => Err(e),
        }
    }
}

/// Formula sources start with `=` and are longer than the `=` alone;
/// anything else (including a bare `"="`) is literal text.
fn formula_source(text: &str) -> Option<&str> {
    let source = text.strip_prefix('=')?;
    if source.is_empty() {
        None
    } else {
        Some(source)
    }
}

fn dedup_in_order(refs: Vec<Addr>) -> Vec<Addr> {
    let mut seen = FxHashSet::default();
    refs.into_iter().filter(|a| seen.insert(*a)).collect()
}
