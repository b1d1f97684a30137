//! FILENAME: core/engine/src/evaluator.rs
//! PURPOSE: The lookup closure contract between `Sheet` and a cell's
//! `parser::Formula`: resolving a referenced position to a number, coercing
//! text to numbers where needed, and translating absent cells and typed
//! errors per the rules the rest of the engine depends on.
//! CONTEXT: Kept separate from `sheet.rs` so the coercion policy (text
//! parsing, absent-cell default, error propagation) has one obvious home,
//! the way this workspace keeps evaluation glue apart from graph bookkeeping.

use parser::FormulaError;

use crate::cell::CellValue;
use crate::position::Position;
use crate::sheet::Sheet;

/// Resolves a single position against `sheet`, recursing through nested
/// formula cells as needed. This is the only contract a `parser::Formula`
/// sees (by way of `Cell::value`'s `lookup` parameter):
///
/// 1. An invalid position raises `Ref`.
/// 2. An absent cell reads as `0.0`.
/// 3. A `Number` cell returns its value directly.
/// 4. A `Text` cell is coerced: `""` reads as `0.0`, anything else is parsed
///    as a decimal number or raises `Value`.
/// 5. An `Error` cell propagates its error.
pub(crate) fn lookup(sheet: &Sheet, pos: Position) -> Result<f64, FormulaError> {
    if !pos.is_valid() {
        return Err(FormulaError::Ref);
    }
    match sheet.cell_at(pos) {
        None => Ok(0.0),
        Some(cell) => coerce(&cell.value(&mut |p| lookup(sheet, p))),
    }
}

/// Coerces an already-computed `CellValue` to the `f64` a formula needs.
fn coerce(value: &CellValue) -> Result<f64, FormulaError> {
    match value {
        CellValue::Number(n) => Ok(*n),
        CellValue::Text(s) => {
            if s.is_empty() {
                Ok(0.0)
            } else {
                s.trim().parse::<f64>().map_err(|_| FormulaError::Value)
            }
        }
        CellValue::Error(e) => Err(*e),
    }
}
