//! FILENAME: core/parser/src/error.rs
//! PURPOSE: The evaluation-time error categories a formula can raise.
//! CONTEXT: Deliberately lives here rather than in the engine crate: both
//! Formula::evaluate (this crate) and the cell-lookup closure it calls
//! (supplied by the engine crate) need the same type, and only one of the
//! two crates can depend on the other. The engine crate re-exports this
//! type rather than defining its own.

/// A formula evaluation failure. Unlike a parse failure, this is not an
/// exception to the caller -- it becomes an ordinary `CellValue::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FormulaError {
    /// A reference to a position outside the valid grid bounds.
    Ref,
    /// Text that could not be coerced to a number where one was required.
    Value,
    /// Division by zero, or any arithmetic result that is non-finite.
    Div0,
}

impl std::fmt::Display for FormulaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FormulaError::Ref => "#REF!",
            FormulaError::Value => "#VALUE!",
            FormulaError::Div0 => "#DIV/0!",
        };
        write!(f, "{}", s)
    }
}

impl std::error::Error for FormulaError {}
