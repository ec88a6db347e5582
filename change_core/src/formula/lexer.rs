//! Formula tokens
//!
//! Uses Logos for tokenization.

use super::FormulaError;
use logos::{Logos, Span};
use std::fmt;

/// Deepest parenthesis nesting a formula may use
pub const MAX_NESTING: usize = 32;

/// Longest formula, in tokens
pub const MAX_TOKENS: usize = 256;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    /// Number literal (e.g., 2, 0.5, .25)
    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    /// Attribute reference (e.g., @abilities.dex.mod)
    #[regex(r"@[A-Za-z0-9_]+(\.[A-Za-z0-9_]+)*", |lex| lex.slice()[1..].to_string())]
    Attr(String),

    /// Function name
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Attr(path) => write!(f, "@{}", path),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// Tokenize a formula, returning tokens with their byte spans.
///
/// Fails on unknown characters and on formulas past [`MAX_NESTING`] or [`MAX_TOKENS`],
/// so parsing and evaluation never recurse deeper than those bounds.
pub fn lex(formula: &str) -> Result<(Vec<Token>, Vec<Span>), FormulaError> {
    let mut lexer = Token::lexer(formula);
    let mut tokens = Vec::new();
    let mut spans = Vec::new();
    let mut depth = 0usize;

    while let Some(result) = lexer.next() {
        let token = result.map_err(|_| FormulaError::UnexpectedToken {
            token: lexer.slice().to_string(),
            offset: lexer.span().start,
        })?;
        match token {
            Token::LParen => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(FormulaError::NestingTooDeep(MAX_NESTING));
                }
            }
            Token::RParen => depth = depth.saturating_sub(1),
            _ => {}
        }
        if tokens.len() == MAX_TOKENS {
            return Err(FormulaError::TooLong(MAX_TOKENS));
        }
        tokens.push(token);
        spans.push(lexer.span());
    }

    Ok((tokens, spans))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_tokens() {
        let (tokens, spans) = lex("min(5, @abilities.dex.mod) - .5").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("min".to_string()),
                Token::LParen,
                Token::Number(5.0),
                Token::Comma,
                Token::Attr("abilities.dex.mod".to_string()),
                Token::RParen,
                Token::Minus,
                Token::Number(0.5),
            ]
        );
        assert_eq!(spans[4], 7..25);
    }

    #[test]
    fn test_lex_rejects_unknown_character() {
        assert_eq!(
            lex("2 $ 3"),
            Err(FormulaError::UnexpectedToken {
                token: "$".to_string(),
                offset: 2
            })
        );
        assert!(matches!(lex("@"), Err(FormulaError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_lex_limits() {
        let nested = "(".repeat(MAX_NESTING + 1) + "1";
        assert_eq!(lex(&nested), Err(FormulaError::NestingTooDeep(MAX_NESTING)));
        let flat = "(1)".repeat(MAX_NESTING * 2);
        assert!(lex(&flat).is_ok());
        let long = vec!["1"; MAX_TOKENS].join("+");
        assert_eq!(lex(&long), Err(FormulaError::TooLong(MAX_TOKENS)));
    }
}
