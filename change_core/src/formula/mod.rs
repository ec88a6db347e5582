//! Formula evaluation
//!
//! The resolver only depends on the [`FormulaEvaluator`] trait. [`ArithmeticEvaluator`]
//! is a small built-in implementation for hosts without their own expression language.

mod arithmetic;
mod lexer;

pub use arithmetic::ArithmeticEvaluator;

use crate::store::AttributeLookup;
use thiserror::Error;

/// Formula evaluation error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Unexpected token '{token}' at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },
    #[error("Unexpected end of formula")]
    UnexpectedEnd,
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Function {name} expects {expected} argument(s), got {got}")]
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("Missing attribute: @{0}")]
    MissingAttribute(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Formula produced a non-finite value")]
    NonFinite,
    #[error("Formula nests deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("Formula is longer than {0} tokens")]
    TooLong(usize),
}

/// Turns a change's formula into a number against a snapshot of the attribute store.
///
/// Implementations must be pure and synchronous and must not call back into the resolver.
pub trait FormulaEvaluator {
    fn evaluate(&self, formula: &str, context: &dyn AttributeLookup) -> Result<f64, FormulaError>;
}

impl<F> FormulaEvaluator for F
where
    F: Fn(&str, &dyn AttributeLookup) -> Result<f64, FormulaError>,
{
    fn evaluate(&self, formula: &str, context: &dyn AttributeLookup) -> Result<f64, FormulaError> {
        self(formula, context)
    }
}
