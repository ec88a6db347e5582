//! ArithmeticEvaluator - numbers, + - * /, parentheses, @attribute references, and
//! min/max/floor/ceil/abs/round

use super::lexer::{lex, Token};
use super::{FormulaError, FormulaEvaluator};
use crate::store::AttributeLookup;
use chumsky::prelude::*;
use logos::Span;

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Parsed formula
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Attr(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

fn expr_parser<'src>() -> impl Parser<'src, &'src [Token], Expr, extra::Err<Rich<'src, Token>>> + Clone {
    recursive(|expr| {
        let call = select! { Token::Ident(name) => name }
            .then(
                expr.clone()
                    .separated_by(just(Token::Comma))
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .map(|(name, args)| Expr::Call(name, args));

        let atom = choice((
            select! {
                Token::Number(n) => Expr::Number(n),
                Token::Attr(path) => Expr::Attr(path),
            },
            call,
            expr.delimited_by(just(Token::LParen), just(Token::RParen)),
        ));

        let unary = choice((just(Token::Minus).to(true), just(Token::Plus).to(false)))
            .repeated()
            .foldr(atom, |negate, operand| {
                if negate {
                    Expr::Neg(Box::new(operand))
                } else {
                    operand
                }
            });

        let product = unary.clone().foldl(
            choice((just(Token::Star).to(BinaryOp::Mul), just(Token::Slash).to(BinaryOp::Div)))
                .then(unary)
                .repeated(),
            |left, (op, right)| Expr::Binary(op, Box::new(left), Box::new(right)),
        );

        product.clone().foldl(
            choice((just(Token::Plus).to(BinaryOp::Add), just(Token::Minus).to(BinaryOp::Sub)))
                .then(product)
                .repeated(),
            |left, (op, right)| Expr::Binary(op, Box::new(left), Box::new(right)),
        )
    })
}

fn parse(formula: &str) -> Result<Expr, FormulaError> {
    let (tokens, spans) = lex(formula)?;
    if tokens.is_empty() {
        return Err(FormulaError::UnexpectedEnd);
    }
    let result = expr_parser()
        .then_ignore(end())
        .parse(tokens.as_slice())
        .into_result()
        .map_err(|errors| match errors.first() {
            Some(error) => parse_error(error, &spans),
            None => FormulaError::UnexpectedEnd,
        });
    result
}

fn parse_error(error: &Rich<'_, Token>, spans: &[Span]) -> FormulaError {
    match error.found() {
        Some(token) => FormulaError::UnexpectedToken {
            token: token.to_string(),
            offset: spans.get(error.span().start).map_or(0, |span| span.start),
        },
        None => FormulaError::UnexpectedEnd,
    }
}

fn call(name: &str, args: &[f64]) -> Result<f64, FormulaError> {
    let unary = |f: fn(f64) -> f64| -> Result<f64, FormulaError> {
        match args {
            [x] => Ok(f(*x)),
            _ => Err(FormulaError::WrongArity {
                name: name.to_string(),
                expected: 1,
                got: args.len(),
            }),
        }
    };
    match name {
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "abs" => unary(f64::abs),
        "round" => unary(f64::round),
        "min" | "max" => {
            let Some((first, rest)) = args.split_first() else {
                return Err(FormulaError::WrongArity {
                    name: name.to_string(),
                    expected: 1,
                    got: 0,
                });
            };
            let fold: fn(f64, f64) -> f64 = if name == "min" { f64::min } else { f64::max };
            Ok(rest.iter().fold(*first, |acc, x| fold(acc, *x)))
        }
        other => Err(FormulaError::UnknownFunction(other.to_string())),
    }
}

/// Built-in arithmetic evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticEvaluator {
    /// Treat missing `@attribute` references as 0 instead of failing
    pub lenient: bool,
}

impl ArithmeticEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lenient() -> Self {
        ArithmeticEvaluator { lenient: true }
    }

    fn eval(&self, expr: &Expr, context: &dyn AttributeLookup) -> Result<f64, FormulaError> {
        match expr {
            Expr::Number(value) => Ok(*value),
            Expr::Attr(path) => match context.get(path) {
                Some(value) => Ok(value),
                None if self.lenient => Ok(0.0),
                None => Err(FormulaError::MissingAttribute(path.clone())),
            },
            Expr::Neg(operand) => Ok(-self.eval(operand, context)?),
            Expr::Binary(op, left, right) => {
                let left = self.eval(left, context)?;
                let right = self.eval(right, context)?;
                match op {
                    BinaryOp::Add => Ok(left + right),
                    BinaryOp::Sub => Ok(left - right),
                    BinaryOp::Mul => Ok(left * right),
                    BinaryOp::Div if right == 0.0 => Err(FormulaError::DivisionByZero),
                    BinaryOp::Div => Ok(left / right),
                }
            }
            Expr::Call(name, args) => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, context))
                    .collect::<Result<Vec<_>, _>>()?;
                call(name, &args)
            }
        }
    }
}

impl FormulaEvaluator for ArithmeticEvaluator {
    fn evaluate(&self, formula: &str, context: &dyn AttributeLookup) -> Result<f64, FormulaError> {
        let expr = parse(formula)?;
        let value = self.eval(&expr, context)?;
        if !value.is_finite() {
            return Err(FormulaError::NonFinite);
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AttributeSheet;

    fn eval(formula: &str) -> Result<f64, FormulaError> {
        let sheet = AttributeSheet::new()
            .with("abilities.str.mod", 3.0)
            .with("details.level", 9.0);
        ArithmeticEvaluator::new().evaluate(formula, &sheet)
    }

    #[test]
    fn test_precedence() {
        assert!((eval("2 + 3 * 4").unwrap() - 14.0).abs() < f64::EPSILON);
        assert!((eval("(2 + 3) * 4").unwrap() - 20.0).abs() < f64::EPSILON);
        assert!((eval("10 - 4 - 3").unwrap() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unary_minus() {
        assert!((eval("-2").unwrap() + 2.0).abs() < f64::EPSILON);
        assert!((eval("3 - -2").unwrap() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_attribute_references() {
        assert!((eval("@abilities.str.mod * 2").unwrap() - 6.0).abs() < f64::EPSILON);
        assert!((eval("1 + floor(@details.level / 4)").unwrap() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_functions() {
        assert!((eval("min(5, 2 + 4)").unwrap() - 5.0).abs() < f64::EPSILON);
        assert!((eval("max(1, 7, 3)").unwrap() - 7.0).abs() < f64::EPSILON);
        assert!((eval("abs(-3) + ceil(1.2) + round(2.5)").unwrap() - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_attribute() {
        assert_eq!(
            eval("@skills.acr.rank"),
            Err(FormulaError::MissingAttribute("skills.acr.rank".to_string()))
        );
        let lenient = ArithmeticEvaluator::lenient();
        assert_eq!(lenient.evaluate("@nope + 1", &AttributeSheet::new()), Ok(1.0));
    }

    #[test]
    fn test_malformed_formulas() {
        assert!(matches!(eval("2 +"), Err(FormulaError::UnexpectedEnd)));
        assert!(matches!(eval("2 3"), Err(FormulaError::UnexpectedToken { .. })));
        assert!(matches!(eval("1d6"), Err(FormulaError::UnexpectedToken { .. })));
        assert!(matches!(eval("sqrt(4)"), Err(FormulaError::UnknownFunction(_))));
        assert!(matches!(eval("floor(1, 2)"), Err(FormulaError::WrongArity { .. })));
        assert!(matches!(eval("4 / 0"), Err(FormulaError::DivisionByZero)));
        assert!(matches!(eval(""), Err(FormulaError::UnexpectedEnd)));
        assert!(matches!(eval("$"), Err(FormulaError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let formula = "(".repeat(200_000) + "1";
        assert!(matches!(eval(&formula), Err(FormulaError::NestingTooDeep(_))));
        let unary_chain = "-".repeat(200_000) + "1";
        assert!(matches!(eval(&unary_chain), Err(FormulaError::TooLong(_))));
    }

    #[test]
    fn test_nesting_within_limit() {
        let formula = "(".repeat(20) + "1 + 2" + &")".repeat(20);
        assert!((eval(&formula).unwrap() - 3.0).abs() < f64::EPSILON);
        assert!((eval("--2").unwrap() - 2.0).abs() < f64::EPSILON);
    }
}
