//! FILENAME: core/engine/src/sheet.rs
//! PURPOSE: Owns the cell map and the bidirectional `refs`/`deps` adjacency,
//! and enforces the invariants that make lazy, memoized evaluation safe:
//! acyclicity, auto-vivification, and cascading cache invalidation.
//! CONTEXT: This is the one place in the crate allowed to mutate more than
//! one cell's worth of state at a time. Every public method either leaves
//! the sheet exactly as it found it (on any failure) or applies every
//! effect of a single logical edit atomically.

use std::collections::{HashMap, HashSet};

use crate::cell::{Cell, CellValue};
use crate::error::SheetError;
use crate::evaluator;
use crate::position::Position;

/// The in-memory spreadsheet: a sparse cell map plus the two adjacency maps
/// that mirror each other (`a ∈ refs(b) ⇔ b ∈ deps(a)`).
#[derive(Debug, Default)]
pub struct Sheet {
    cells: HashMap<Position, Cell>,
    /// Outgoing edges: formula cell -> cells it reads.
    refs: HashMap<Position, HashSet<Position>>,
    /// Incoming edges: cell -> formula cells that read it. Inverse of `refs`.
    deps: HashMap<Position, HashSet<Position>>,
}

impl Sheet {
    pub fn new() -> Self {
        Sheet {
            cells: HashMap::new(),
            refs: HashMap::new(),
            deps: HashMap::new(),
        }
    }

    pub(crate) fn cell_at(&self, pos: Position) -> Option<&Cell> {
        self.cells.get(&pos)
    }

    /// Reads the computed value at `pos`, evaluating and memoizing lazily.
    /// An absent position reads the same as an `Empty` cell: `Text("")`.
    pub fn value_at(&self, pos: Position) -> Result<CellValue, SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        Ok(match self.cells.get(&pos) {
            None => CellValue::Text(String::new()),
            Some(cell) => cell.value(&mut |p| evaluator::lookup(self, p)),
        })
    }

    /// Returns the cell at `pos`, or `None` if it is absent or present but
    /// `Empty` -- the recommended policy that lets callers treat "nothing
    /// to show" uniformly regardless of whether an auto-vivified sentinel
    /// happens to live there.
    pub fn get_cell(&self, pos: Position) -> Result<Option<&Cell>, SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        let cell = self.cells.get(&pos).filter(|c| !c.is_empty());
        // Invariant 5: every stored cell is canonical under its map key.
        debug_assert!(cell.map_or(true, |c| c.position() == pos));
        Ok(cell)
    }

    /// Sets the text at `pos`, following §4.4.1: build a candidate cell,
    /// reject on parse failure or on a cycle the new edges would close,
    /// auto-vivify freshly-referenced positions, remove `pos`'s old edges,
    /// cascade-invalidate its dependants, then install the new cell and its
    /// edges. Nothing is mutated unless every check above passes.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }

        let candidate = Cell::new(pos, text)?;
        let new_refs = candidate.referenced_cells();

        if new_refs.contains(&pos) || self.reaches(&new_refs, pos) {
            log::warn!("set_cell rejected: {:?} would close a cycle", pos);
            return Err(SheetError::CircularDependency(pos));
        }

        for &q in &new_refs {
            self.cells.entry(q).or_insert_with(|| {
                log::debug!("auto-vivifying empty cell at {:?}", q);
                Cell::new_empty(q)
            });
        }

        if let Some(old_refs) = self.refs.remove(&pos) {
            for q in old_refs {
                if let Some(d) = self.deps.get_mut(&q) {
                    d.remove(&pos);
                }
            }
        }

        self.invalidate_dependants(pos);

        let mut refs_set = HashSet::with_capacity(new_refs.len());
        for q in new_refs {
            refs_set.insert(q);
            self.deps.entry(q).or_default().insert(pos);
        }
        self.refs.insert(pos, refs_set);
        self.cells.insert(pos, candidate);

        Ok(())
    }

    /// Clears `pos` back to `Empty`, dropping its outgoing edges and
    /// cascading invalidation to its dependants. Absent positions are a
    /// no-op, not an error. The `Empty` sentinel is kept rather than the
    /// key removed outright (§3 Lifecycle): invariant 2 already allows a
    /// referenced position to stay resident, and keeping it here avoids a
    /// second reachability pass to decide whether anything still points at it.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        if !self.cells.contains_key(&pos) {
            return Ok(());
        }

        if let Some(old_refs) = self.refs.remove(&pos) {
            for q in old_refs {
                if let Some(d) = self.deps.get_mut(&q) {
                    d.remove(&pos);
                }
            }
        }

        self.cells.insert(pos, Cell::new_empty(pos));
        self.invalidate_dependants(pos);

        Ok(())
    }

    /// The smallest `[0,rows) x [0,cols)` rectangle containing every cell
    /// whose `text()` is non-empty. Auto-vivified and explicitly cleared
    /// `Empty` cells never extend it.
    pub fn printable_size(&self) -> (usize, usize) {
        let mut max: Option<Position> = None;
        for (pos, cell) in &self.cells {
            if cell.text().is_empty() {
                continue;
            }
            max = Some(match max {
                None => *pos,
                Some(m) => Position::new(m.row.max(pos.row), m.col.max(pos.col)),
            });
        }
        match max {
            None => (0, 0),
            Some(m) => ((m.row + 1) as usize, (m.col + 1) as usize),
        }
    }

    /// Emits the printable rectangle row by row, tab-separated and
    /// newline-terminated, via each cell's computed value. Missing cells
    /// render as empty fields.
    pub fn print_values<W: std::io::Write>(&self, out: &mut W) -> std::io::Result<()> {
        self.print_rectangle(out, |cell| match cell {
            None => String::new(),
            Some(cell) => cell.value(&mut |p| evaluator::lookup(self, p)).to_string(),
        })
    }

    /// As `print_values`, but emits each cell's stored text instead of its
    /// computed value.
    pub fn print_texts<W: std::io::Write>(&self, out: &mut W) -> std::io::Result<()> {
        self.print_rectangle(out, |cell| cell.map(Cell::text).unwrap_or_default())
    }

    fn print_rectangle<W: std::io::Write>(
        &self,
        out: &mut W,
        mut field: impl FnMut(Option<&Cell>) -> String,
    ) -> std::io::Result<()> {
        let (rows, cols) = self.printable_size();
        for row in 0..rows {
            let mut fields = Vec::with_capacity(cols);
            for col in 0..cols {
                let pos = Position::new(row as i32, col as i32);
                fields.push(field(self.cells.get(&pos)));
            }
            writeln!(out, "{}", fields.join("\t"))?;
        }
        Ok(())
    }

    /// True iff `target` is reachable from any position in `starts` by
    /// following existing `refs` edges. Used to detect whether installing
    /// `refs(target) = starts` would close a cycle, before any edge exists.
    fn reaches(&self, starts: &[Position], target: Position) -> bool {
        let mut visited = HashSet::new();
        let mut stack: Vec<Position> = starts.to_vec();
        while let Some(p) = stack.pop() {
            if p == target {
                return true;
            }
            if !visited.insert(p) {
                continue;
            }
            if let Some(next) = self.refs.get(&p) {
                stack.extend(next.iter().copied());
            }
        }
        false
    }

    /// Walks `deps` forward from (but not including) `pos`, invalidating the
    /// cache of every reachable cell. A visited set guards against revisits;
    /// the graph is acyclic by invariant, but the old edges from `pos` are
    /// still in place while this runs (the new ones aren't installed yet).
    fn invalidate_dependants(&self, pos: Position) {
        let mut visited = HashSet::new();
        let mut stack: Vec<Position> = self
            .deps
            .get(&pos)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        while let Some(p) = stack.pop() {
            if !visited.insert(p) {
                continue;
            }
            if let Some(cell) = self.cells.get(&p) {
                cell.invalidate_cache();
            }
            if let Some(next) = self.deps.get(&p) {
                stack.extend(next.iter().copied());
            }
        }
    }

    #[cfg(test)]
    fn refs_of(&self, pos: Position) -> HashSet<Position> {
        self.refs.get(&pos).cloned().unwrap_or_default()
    }

    #[cfg(test)]
    fn deps_of(&self, pos: Position) -> HashSet<Position> {
        self.deps.get(&pos).cloned().unwrap_or_default()
    }
}
