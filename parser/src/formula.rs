//! FILENAME: core/parser/src/formula.rs
//! PURPOSE: Wraps a parsed Expression with the evaluate/printable_form/referenced_cells
//! contract the engine crate depends on.
//! CONTEXT: `Formula` is the boundary object between this crate and `engine`.
//! It knows nothing about `Sheet` or `Position` -- evaluation is driven
//! entirely by a lookup closure supplied by the caller, and cell references
//! are exposed as raw zero-based (col, row) pairs rather than an engine type.

use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::error::FormulaError;
use crate::parser::{parse, ParseError};

/// A parsed, evaluatable formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    expr: Expression,
}

impl Formula {
    /// Parses a formula body (the text after the leading `=`, already stripped by the caller).
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(Formula { expr: parse(text)? })
    }

    /// Evaluates the formula. `lookup` resolves a zero-based (col, row) cell
    /// reference to a number, or raises a `FormulaError` (e.g. an invalid
    /// position or non-numeric text). Every binary operation's result is
    /// checked for finiteness; a non-finite result raises `Div0`.
    pub fn evaluate(
        &self,
        lookup: &mut dyn FnMut(u32, u32) -> Result<f64, FormulaError>,
    ) -> Result<f64, FormulaError> {
        eval(&self.expr, lookup)
    }

    /// A canonicalized re-rendering of the formula with minimal parentheses.
    pub fn printable_form(&self) -> String {
        print_expr(&self.expr, 0)
    }

    /// Positions referenced by the formula, zero-based, in source (pre-order,
    /// left-to-right) order. Not deduplicated and not filtered for validity --
    /// the engine crate owns both of those policies.
    pub fn referenced_cells(&self) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        collect_refs(&self.expr, &mut out);
        out
    }
}

fn eval(
    expr: &Expression,
    lookup: &mut dyn FnMut(u32, u32) -> Result<f64, FormulaError>,
) -> Result<f64, FormulaError> {
    match expr {
        Expression::Literal(n) => Ok(*n),
        Expression::CellRef { col, row } => lookup(*col, *row),
        Expression::UnaryOp { op: UnaryOperator::Negate, operand } => {
            Ok(-eval(operand, lookup)?)
        }
        Expression::BinaryOp { left, op, right } => {
            let l = eval(left, lookup)?;
            let r = eval(right, lookup)?;
            let result = match op {
                BinaryOperator::Add => l + r,
                BinaryOperator::Subtract => l - r,
                BinaryOperator::Multiply => l * r,
                BinaryOperator::Divide => l / r,
            };
            if result.is_finite() {
                Ok(result)
            } else {
                Err(FormulaError::Div0)
            }
        }
    }
}

fn collect_refs(expr: &Expression, out: &mut Vec<(u32, u32)>) {
    match expr {
        Expression::Literal(_) => {}
        Expression::CellRef { col, row } => out.push((*col, *row)),
        Expression::UnaryOp { operand, .. } => collect_refs(operand, out),
        Expression::BinaryOp { left, right, .. } => {
            collect_refs(left, out);
            collect_refs(right, out);
        }
    }
}

fn precedence(op: BinaryOperator) -> u8 {
    match op {
        BinaryOperator::Add | BinaryOperator::Subtract => 1,
        BinaryOperator::Multiply | BinaryOperator::Divide => 2,
    }
}

/// Prints `expr`, wrapping it in parentheses if its own precedence is lower
/// than `min_prec` (the precedence demanded by its parent).
fn print_expr(expr: &Expression, min_prec: u8) -> String {
    match expr {
        Expression::Literal(n) => format!("{}", n),
        Expression::CellRef { col, row } => cell_label(*col, *row),
        Expression::UnaryOp { op, operand } => format!("{}{}", op, print_expr(operand, 3)),
        Expression::BinaryOp { left, op, right } => {
            let prec = precedence(*op);
            // Right operand needs strictly higher precedence to stay
            // unparenthesized, since these operators are left-associative.
            let s = format!(
                "{}{}{}",
                print_expr(left, prec),
                op,
                print_expr(right, prec + 1)
            );
            if prec < min_prec {
                format!("({})", s)
            } else {
                s
            }
        }
    }
}

/// Renders a zero-based (col, row) pair back into A1-style text.
fn cell_label(col: u32, row: u32) -> String {
    let mut letters = String::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    format!("{}{}", letters, row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(values: &HashMap<(u32, u32), f64>) -> impl FnMut(u32, u32) -> Result<f64, FormulaError> + '_ {
        move |col, row| Ok(*values.get(&(col, row)).unwrap_or(&0.0))
    }

    #[test]
    fn evaluates_arithmetic() {
        let f = Formula::parse("1+2*3").unwrap();
        let mut lookup = |_, _| Ok(0.0);
        assert_eq!(f.evaluate(&mut lookup).unwrap(), 7.0);
    }

    #[test]
    fn evaluates_cell_refs_via_lookup() {
        let mut values = HashMap::new();
        values.insert((0, 0), 10.0); // A1
        let f = Formula::parse("A1+1").unwrap();
        let mut lookup = lookup_from(&values);
        assert_eq!(f.evaluate(&mut lookup).unwrap(), 11.0);
    }

    #[test]
    fn division_by_zero_is_div0() {
        let f = Formula::parse("1/0").unwrap();
        let mut lookup = |_, _| Ok(0.0);
        assert_eq!(f.evaluate(&mut lookup), Err(FormulaError::Div0));
    }

    #[test]
    fn overflow_is_div0() {
        // The lexer has no exponent notation, so build a literal far larger
        // than f64::MAX out of plain digits instead of writing "1e308".
        let huge = format!("1{}", "0".repeat(308));
        let f = Formula::parse(&format!("{}*{}", huge, huge)).unwrap();
        let mut lookup = |_, _| Ok(0.0);
        assert_eq!(f.evaluate(&mut lookup), Err(FormulaError::Div0));
    }

    #[test]
    fn lookup_error_propagates() {
        let f = Formula::parse("A1+1").unwrap();
        let mut lookup = |_, _| Err(FormulaError::Ref);
        assert_eq!(f.evaluate(&mut lookup), Err(FormulaError::Ref));
    }

    #[test]
    fn printable_form_adds_minimal_parens() {
        let f = Formula::parse("(1+2)*3").unwrap();
        assert_eq!(f.printable_form(), "(1+2)*3");

        let f = Formula::parse("1+2*3").unwrap();
        assert_eq!(f.printable_form(), "1+2*3");
    }

    #[test]
    fn printable_form_round_trips_cell_refs() {
        let f = Formula::parse("AA100+B2").unwrap();
        assert_eq!(f.printable_form(), "AA100+B2");
    }

    #[test]
    fn referenced_cells_preserve_source_order_and_duplicates() {
        let f = Formula::parse("A1+A1+B2").unwrap();
        assert_eq!(f.referenced_cells(), vec![(0, 0), (0, 0), (1, 1)]);
    }
}
