//! FILENAME: core/engine/src/error.rs

use crate::position::Position;
use thiserror::Error;

/// Structural, edit-time errors raised by the `Sheet` API. None of these
/// ever leave the sheet mutated: `set_cell`/`clear_cell` validate and check
/// before touching any cell, edge, or cache.
///
/// This is distinct from `FormulaError` (re-exported from `parser`), which
/// is an evaluation-time *value*, not a raised error -- see the module docs
/// on `cell`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    #[error("invalid position: {0:?}")]
    InvalidPosition(Position),

    #[error("circular dependency through {0:?}")]
    CircularDependency(Position),

    #[error("formula parse error: {0}")]
    ParsingError(#[from] parser::ParseError),
}
