//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the spreadsheet engine.
//! CONTEXT: Re-exports the public surface -- `Position`, `Cell`,
//! `CellValue`, `Sheet`, `SheetError`, and the `parser` crate's
//! `FormulaError` -- so downstream crates depend on `engine` alone rather
//! than reaching into its submodules or into `parser` directly.

pub mod cell;
pub mod error;
pub mod evaluator;
pub mod position;
pub mod sheet;

pub use cell::{Cell, CellValue};
pub use error::SheetError;
pub use parser::FormulaError;
pub use position::Position;
pub use sheet::Sheet;

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Position {
        Position::from_string(s).unwrap()
    }

    // Sc1 -- chained formulas.
    #[test]
    fn scenario_chained_formulas() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "1").unwrap();
        sheet.set_cell(p("A2"), "=A1+1").unwrap();
        sheet.set_cell(p("A3"), "=A2+1").unwrap();

        assert_eq!(sheet.value_at(p("A2")), Ok(CellValue::Number(2.0)));
        assert_eq!(sheet.value_at(p("A3")), Ok(CellValue::Number(3.0)));

        sheet.set_cell(p("A1"), "2").unwrap();
        assert_eq!(sheet.value_at(p("A2")), Ok(CellValue::Number(3.0)));
        assert_eq!(sheet.value_at(p("A3")), Ok(CellValue::Number(4.0)));
    }

    // Sc2 -- cycle rejection.
    #[test]
    fn scenario_cycle_rejection() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "=B1").unwrap();
        assert_eq!(
            sheet.set_cell(p("B1"), "=A1"),
            Err(SheetError::CircularDependency(p("B1")))
        );
        assert_eq!(sheet.value_at(p("A1")), Ok(CellValue::Number(0.0)));
    }

    // Sc3 -- text coercion error.
    #[test]
    fn scenario_text_coercion_error() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "hello").unwrap();
        sheet.set_cell(p("B1"), "=A1+1").unwrap();
        assert_eq!(sheet.value_at(p("B1")), Ok(CellValue::Error(FormulaError::Value)));

        sheet.set_cell(p("A1"), "3.5").unwrap();
        assert_eq!(sheet.value_at(p("B1")), Ok(CellValue::Number(4.5)));
    }

    // Sc4 -- division by zero and escape.
    #[test]
    fn scenario_div0_and_escape() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "'123").unwrap();
        sheet.set_cell(p("B1"), "=A1/0").unwrap();
        assert_eq!(sheet.value_at(p("A1")), Ok(CellValue::Text("123".to_string())));
        assert_eq!(sheet.value_at(p("B1")), Ok(CellValue::Error(FormulaError::Div0)));
    }

    // Sc5 -- clear cascades invalidation.
    #[test]
    fn scenario_clear_cascades_invalidation() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "5").unwrap();
        sheet.set_cell(p("A2"), "=A1*2").unwrap();
        sheet.set_cell(p("A3"), "=A2+1").unwrap();

        sheet.clear_cell(p("A1")).unwrap();

        assert_eq!(sheet.value_at(p("A2")), Ok(CellValue::Number(0.0)));
        assert_eq!(sheet.value_at(p("A3")), Ok(CellValue::Number(1.0)));
    }

    // Sc6 -- print rectangle.
    #[test]
    fn scenario_print_rectangle() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("B2"), "x").unwrap();
        sheet.set_cell(p("D5"), "y").unwrap();
        assert_eq!(sheet.printable_size(), (5, 4));

        let mut out = Vec::new();
        sheet.print_texts(&mut out).unwrap();
        let lines: Vec<&str> = std::str::from_utf8(&out).unwrap().lines().collect();
        assert_eq!(lines[1], "\tx\t\t");
        assert_eq!(lines[4], "\t\t\ty");
    }

    // P5 -- error typing, exercised end to end through a whole sheet.
    #[test]
    fn property_error_typing() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "=ZZZZ1").unwrap(); // out of column bound -> Ref
        assert_eq!(sheet.value_at(p("A1")), Ok(CellValue::Error(FormulaError::Ref)));

        sheet.set_cell(p("A2"), "=1/0").unwrap();
        assert_eq!(sheet.value_at(p("A2")), Ok(CellValue::Error(FormulaError::Div0)));

        sheet.set_cell(p("A3"), "abc").unwrap();
        sheet.set_cell(p("A4"), "=A3+1").unwrap();
        assert_eq!(sheet.value_at(p("A4")), Ok(CellValue::Error(FormulaError::Value)));
    }

    #[test]
    fn diamond_dependency_recomputes_once_reachable() {
        // A1 feeds both B1 and C1, which both feed D1.
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "2").unwrap();
        sheet.set_cell(p("B1"), "=A1*10").unwrap();
        sheet.set_cell(p("C1"), "=A1*100").unwrap();
        sheet.set_cell(p("D1"), "=B1+C1").unwrap();
        assert_eq!(sheet.value_at(p("D1")), Ok(CellValue::Number(220.0)));

        sheet.set_cell(p("A1"), "3").unwrap();
        assert_eq!(sheet.value_at(p("D1")), Ok(CellValue::Number(330.0)));
    }

    #[test]
    fn indirect_cycle_through_three_cells_is_rejected() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "=B1").unwrap();
        sheet.set_cell(p("B1"), "=C1").unwrap();
        assert_eq!(
            sheet.set_cell(p("C1"), "=A1"),
            Err(SheetError::CircularDependency(p("C1")))
        );
    }

    #[test]
    fn reassigning_a_formula_cell_drops_its_old_edges() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "1").unwrap();
        sheet.set_cell(p("B1"), "2").unwrap();
        sheet.set_cell(p("C1"), "=A1+1").unwrap();
        assert_eq!(sheet.value_at(p("C1")), Ok(CellValue::Number(2.0)));

        // Re-point C1 at B1 instead; mutating A1 afterward must not affect C1.
        sheet.set_cell(p("C1"), "=B1+1").unwrap();
        sheet.set_cell(p("A1"), "999").unwrap();
        assert_eq!(sheet.value_at(p("C1")), Ok(CellValue::Number(3.0)));
    }

    #[test]
    fn invalid_position_errors_do_not_panic() {
        let sheet = Sheet::new();
        assert!(sheet.get_cell(Position::new(-1, 0)).is_err());
        assert!(sheet.get_cell(Position::new(0, -1)).is_err());
    }

    #[test]
    fn position_and_cell_value_round_trip_through_serde() {
        let pos = p("AA100");
        let json = serde_json::to_string(&pos).unwrap();
        assert_eq!(serde_json::from_str::<Position>(&json).unwrap(), pos);

        let value = CellValue::Error(FormulaError::Div0);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(serde_json::from_str::<CellValue>(&json).unwrap(), value);
    }
}
