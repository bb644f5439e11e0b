//! Infix expression parser.
//!
//! Consumes a text string and folds it directly into a canonical
//! [`Quantity`] under the algebra. The grammar:
//!
//! ```text
//! expr     := factor (op? factor)*
//! factor   := atom ('^' integer)?
//! atom     := number | symbol | '(' expr ')'
//! op       := '*' | '/'
//! number   := integer | integer '.' integer
//! symbol   := letter+
//! ```
//!
//! Juxtaposition multiplies (`a b` is `a*b`), `/` applies to the next factor
//! only, and `^` binds tighter than either operator, so `a/b^2` is `a·b⁻²`.
//! Unknown symbols are accepted and carried through as opaque atoms.

use crate::error::{Error, Result};
use crate::quantity::Quantity;

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Integer(i64),
    Float(f64),
    Symbol(&'a str),
    Star,
    Slash,
    Caret,
    OpenParen,
    CloseParen,
}

/// Single-pass tokenizer over the input bytes. `token_start` holds the byte
/// column of the most recently returned token, for error reporting.
struct Tokenizer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    token_start: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            token_start: 0,
        }
    }

    #[inline]
    fn current_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.current_byte() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn scan_symbol(&mut self) -> Token<'a> {
        let start = self.pos;
        while let Some(b) = self.current_byte() {
            if b.is_ascii_alphabetic() {
                self.pos += 1;
            } else {
                break;
            }
        }
        Token::Symbol(&self.input[start..self.pos])
    }

    /// Scans `integer` or `integer '.' integer`. A dot not followed by a
    /// digit is left in place for the next call to reject.
    fn scan_number(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        while let Some(b) = self.current_byte() {
            if b.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }

        let is_float = self.current_byte() == Some(b'.')
            && self.peek_byte(1).is_some_and(|b| b.is_ascii_digit());
        if is_float {
            self.pos += 1;
            while let Some(b) = self.current_byte() {
                if b.is_ascii_digit() {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            let text = &self.input[start..self.pos];
            let value: f64 = text
                .parse()
                .map_err(|_| Error::parse(format!("invalid number `{text}`"), start))?;
            Ok(Token::Float(value))
        } else {
            let text = &self.input[start..self.pos];
            let value: i64 = text
                .parse()
                .map_err(|_| Error::parse(format!("number `{text}` out of range"), start))?;
            Ok(Token::Integer(value))
        }
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        self.skip_whitespace();
        self.token_start = self.pos;

        let Some(b) = self.current_byte() else {
            return Ok(None);
        };

        let token = match b {
            b'a'..=b'z' | b'A'..=b'Z' => self.scan_symbol(),
            b'0'..=b'9' => self.scan_number()?,
            b'*' => {
                self.pos += 1;
                Token::Star
            }
            b'/' => {
                self.pos += 1;
                Token::Slash
            }
            b'^' => {
                self.pos += 1;
                Token::Caret
            }
            b'(' => {
                self.pos += 1;
                Token::OpenParen
            }
            b')' => {
                self.pos += 1;
                Token::CloseParen
            }
            _ => {
                let ch = self.input[self.pos..].chars().next().unwrap_or('?');
                return Err(Error::parse(
                    format!("unexpected character `{ch}`"),
                    self.pos,
                ));
            }
        };
        Ok(Some(token))
    }
}

struct Parser<'a> {
    tok: Tokenizer<'a>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            tok: Tokenizer::new(input),
        }
    }

    /// `expr := factor (op? factor)*`, folded left to right. A missing
    /// operator between factors means multiplication; `/` divides by the
    /// next factor only.
    fn parse_expr(&mut self) -> Result<Quantity> {
        let mut acc = self.parse_factor()?;

        loop {
            let saved = self.tok.pos;
            match self.tok.next_token()? {
                None => break,
                Some(Token::Star) => {
                    let rhs = self.parse_factor()?;
                    acc = acc.mul(&rhs);
                }
                Some(Token::Slash) => {
                    let rhs = self.parse_factor()?;
                    acc = acc.div(&rhs)?;
                }
                Some(Token::CloseParen) => {
                    self.tok.pos = saved;
                    break;
                }
                Some(_) => {
                    // Juxtaposition: re-read the token as the next factor.
                    self.tok.pos = saved;
                    let rhs = self.parse_factor()?;
                    acc = acc.mul(&rhs);
                }
            }
        }
        Ok(acc)
    }

    /// `factor := atom ('^' integer)?`
    fn parse_factor(&mut self) -> Result<Quantity> {
        let atom = self.parse_atom()?;

        let saved = self.tok.pos;
        match self.tok.next_token()? {
            Some(Token::Caret) => {
                let exp = self.parse_exponent()?;
                Ok(atom.powi(exp))
            }
            _ => {
                self.tok.pos = saved;
                Ok(atom)
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Quantity> {
        match self.tok.next_token()? {
            Some(Token::Integer(n)) => Ok(Quantity::scalar(n as f64)),
            Some(Token::Float(v)) => Ok(Quantity::scalar(v)),
            Some(Token::Symbol(sym)) => Ok(Quantity::unit(sym)),
            Some(Token::OpenParen) => {
                let inner = self.parse_expr()?;
                match self.tok.next_token()? {
                    Some(Token::CloseParen) => Ok(inner),
                    _ => Err(Error::parse(
                        "missing closing parenthesis",
                        self.tok.token_start,
                    )),
                }
            }
            Some(_) => Err(Error::parse(
                format!(
                    "expected a number, symbol or `(`, found `{}`",
                    &self.tok.input[self.tok.token_start..self.tok.pos]
                ),
                self.tok.token_start,
            )),
            None => Err(Error::parse("expected an expression", self.tok.token_start)),
        }
    }

    /// `^` operands must be integers; `a^2.5` is rejected.
    fn parse_exponent(&mut self) -> Result<i32> {
        match self.tok.next_token()? {
            Some(Token::Integer(n)) => i32::try_from(n)
                .map_err(|_| Error::parse("exponent out of range", self.tok.token_start)),
            Some(Token::Float(_)) => Err(Error::parse(
                "exponent must be an integer",
                self.tok.token_start,
            )),
            _ => Err(Error::parse(
                "expected an integer exponent after `^`",
                self.tok.token_start,
            )),
        }
    }
}

/// Parse an infix expression into a canonical [`Quantity`].
///
/// ```
/// use unitpath::parse_expression;
///
/// let q = parse_expression("5 m/s^2").unwrap();
/// assert_eq!(q.value(), 5.0);
/// assert_eq!(q.dims().exponent("m"), 1);
/// assert_eq!(q.dims().exponent("s"), -2);
/// ```
pub fn parse_expression(input: &str) -> Result<Quantity> {
    if input.trim().is_empty() {
        return Err(Error::parse("empty expression", 0));
    }

    let mut parser = Parser::new(input);
    let quantity = parser.parse_expr()?;

    match parser.tok.next_token()? {
        None => Ok(quantity),
        Some(Token::CloseParen) => Err(Error::parse(
            "unmatched closing parenthesis",
            parser.tok.token_start,
        )),
        Some(_) => Err(Error::parse(
            "unexpected trailing input",
            parser.tok.token_start,
        )),
    }
}
