//! FILENAME: core/engine/src/cell.rs
//! PURPOSE: The three-variant cell state model and its memoized value.
//! CONTEXT: A `Cell` never reaches across to another cell directly. All
//! cross-cell resolution goes through a `lookup` closure handed to it by
//! `Sheet` at evaluation time (see `evaluator.rs`); this file only knows how
//! to classify raw text, render it back out, and cache the result of asking
//! a `parser::Formula` to evaluate itself.

use std::cell::RefCell;

use parser::FormulaError;
use serde::{Deserialize, Serialize};

use crate::position::Position;

/// The escape sign: a leading `'` is stripped from `value()` but kept in
/// `text()`, so a user can enter `'123` to store the literal text "123"
/// instead of a number.
const ESCAPE_SIGN: char = '\'';

/// The result of reading a cell's computed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

/// The three closed states a cell can be in. Kept as a tagged union rather
/// than a trait object: the set of kinds is fixed, and only the formula arm
/// needs a cache slot.
#[derive(Debug, Clone)]
enum CellInner {
    Empty,
    /// Raw stored text, escape sign and all. Stripped only in `value()`.
    Text(String),
    Formula {
        formula: parser::Formula,
        /// Interior mutability: `value()` takes `&self` (the read path is
        /// shared across recursive lookups), but evaluating on a cache miss
        /// still needs to record the result.
        cache: RefCell<Option<CellValue>>,
    },
}

/// A single stored cell. Identity (`position`) is carried alongside the
/// state so a `Cell` can be handed around without its map key.
#[derive(Debug, Clone)]
pub struct Cell {
    position: Position,
    inner: CellInner,
}

impl Cell {
    /// Builds a cell at `position` from raw input text, classifying it per
    /// the rules in order: empty string is `Empty`; a leading `=` (with at
    /// least one more character) is a formula, parsed eagerly so that a bad
    /// formula is rejected at edit time rather than read time; anything else
    /// is stored verbatim as `Text`.
    pub fn new(position: Position, text: &str) -> Result<Cell, parser::ParseError> {
        let inner = if text.is_empty() {
            CellInner::Empty
        } else if text.starts_with('=') && text.len() >= 2 {
            let formula = parser::Formula::parse(&text[1..])?;
            CellInner::Formula {
                formula,
                cache: RefCell::new(None),
            }
        } else {
            CellInner::Text(text.to_string())
        };
        Ok(Cell { position, inner })
    }

    /// An auto-vivified sentinel: a position that was only ever referenced
    /// by some other formula, never explicitly set.
    pub fn new_empty(position: Position) -> Cell {
        Cell {
            position,
            inner: CellInner::Empty,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.inner, CellInner::Empty)
    }

    /// The displayed value. For a `Formula` cell, returns the memoized
    /// result if the cache is still valid, otherwise evaluates via `lookup`
    /// and stores whatever comes back -- including an `Error`, which is
    /// cached identically to a number.
    pub fn value(&self, lookup: &mut dyn FnMut(Position) -> Result<f64, FormulaError>) -> CellValue {
        match &self.inner {
            CellInner::Empty => CellValue::Text(String::new()),
            CellInner::Text(s) => match s.strip_prefix(ESCAPE_SIGN) {
                Some(rest) => CellValue::Text(rest.to_string()),
                None => CellValue::Text(s.clone()),
            },
            CellInner::Formula { formula, cache } => {
                if let Some(v) = cache.borrow().as_ref() {
                    return v.clone();
                }
                let mut bridge = |col: u32, row: u32| lookup(Position::new(row as i32, col as i32));
                let result = match formula.evaluate(&mut bridge) {
                    Ok(n) => CellValue::Number(n),
                    Err(e) => CellValue::Error(e),
                };
                *cache.borrow_mut() = Some(result.clone());
                result
            }
        }
    }

    /// The stored text. Unlike `value()`, this preserves the leading escape
    /// sign on a `Text` cell and re-renders a `Formula` cell through its
    /// canonical `printable_form` rather than the text originally typed.
    pub fn text(&self) -> String {
        match &self.inner {
            CellInner::Empty => String::new(),
            CellInner::Text(s) => s.clone(),
            CellInner::Formula { formula, .. } => format!("={}", formula.printable_form()),
        }
    }

    /// Positions this cell's formula reads, deduplicated and in first-seen
    /// source order, with invalid positions filtered out. Empty and `Text`
    /// cells never reference anything.
    pub fn referenced_cells(&self) -> Vec<Position> {
        let CellInner::Formula { formula, .. } = &self.inner else {
            return Vec::new();
        };
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for (col, row) in formula.referenced_cells() {
            let pos = Position::new(row as i32, col as i32);
            if pos.is_valid() && seen.insert(pos) {
                out.push(pos);
            }
        }
        out
    }

    /// Drops the memoized result. A no-op on `Empty`/`Text` cells, which
    /// never carry a cache.
    pub fn invalidate_cache(&self) {
        if let CellInner::Formula { cache, .. } = &self.inner {
            *cache.borrow_mut() = None;
        }
    }
}
