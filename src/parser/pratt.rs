// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Precedence-climbing parser that compiles tokens straight into [`Invokee`]s
//!
//! There is no intermediate syntax tree: every production returns the
//! executable node for its sub-expression. Member and function names are kept
//! as plain strings and only resolved when the node runs.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::span::Spanned;
use super::tokenizer::{Token, Tokenizer};
use crate::error::{FhirPathError, Result};
use crate::evaluator::Invokee;
use crate::model::{PartialDateTime, PartialTime};

/// Binary operator precedence levels, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Precedence {
    /// `and`, `or`, `xor`, `implies`
    Logic = 1,
    /// `=`, `!=`, `~`, `!~`, `<`, `<=`, `>`, `>=`, `in`
    Comparison = 2,
    /// `|` and `&`
    Union = 3,
    /// `+` and `-`
    Additive = 4,
    /// `*`, `/`, `div`, `mod`
    Multiplicative = 5,
}

impl Precedence {
    /// The level binding the right operand of a left-associative operator
    pub const fn next_level(self) -> Option<Self> {
        match self {
            Precedence::Logic => Some(Precedence::Comparison),
            Precedence::Comparison => Some(Precedence::Union),
            Precedence::Union => Some(Precedence::Additive),
            Precedence::Additive => Some(Precedence::Multiplicative),
            Precedence::Multiplicative => None,
        }
    }
}

/// Operator symbol and binding level of a binary operator token
fn binary_operator(token: &Token<'_>) -> Option<(&'static str, Precedence)> {
    let entry = match token {
        Token::And => ("and", Precedence::Logic),
        Token::Or => ("or", Precedence::Logic),
        Token::Xor => ("xor", Precedence::Logic),
        Token::Implies => ("implies", Precedence::Logic),
        Token::Equal => ("=", Precedence::Comparison),
        Token::NotEqual => ("!=", Precedence::Comparison),
        Token::Equivalent => ("~", Precedence::Comparison),
        Token::NotEquivalent => ("!~", Precedence::Comparison),
        Token::LessThan => ("<", Precedence::Comparison),
        Token::LessThanOrEqual => ("<=", Precedence::Comparison),
        Token::GreaterThan => (">", Precedence::Comparison),
        Token::GreaterThanOrEqual => (">=", Precedence::Comparison),
        Token::In => ("in", Precedence::Comparison),
        Token::Union => ("|", Precedence::Union),
        Token::Ampersand => ("&", Precedence::Union),
        Token::Plus => ("+", Precedence::Additive),
        Token::Minus => ("-", Precedence::Additive),
        Token::Multiply => ("*", Precedence::Multiplicative),
        Token::Divide => ("/", Precedence::Multiplicative),
        Token::Div => ("div", Precedence::Multiplicative),
        Token::Mod => ("mod", Precedence::Multiplicative),
        _ => return None,
    };
    Some(entry)
}

/// Single-use parser over one source string
pub struct PrattParser<'input> {
    source: &'input str,
    tokenizer: Tokenizer<'input>,
    current: Option<Spanned<Token<'input>>>,
}

impl<'input> PrattParser<'input> {
    /// Create a parser positioned on the first token
    pub fn new(source: &'input str) -> Result<Self> {
        let mut tokenizer = Tokenizer::new(source);
        let current = tokenizer.next_token()?;
        Ok(Self {
            source,
            tokenizer,
            current,
        })
    }

    /// Parse the whole input into one expression node
    pub fn parse(mut self) -> Result<Invokee> {
        if self.current.is_none() {
            return Err(FhirPathError::syntax(0, "Empty expression"));
        }
        let expression = self.parse_expression(Precedence::Logic)?;
        if self.current.is_some() {
            return Err(self.unexpected("end of expression"));
        }
        Ok(expression)
    }

    fn peek(&self) -> Option<&Token<'input>> {
        self.current.as_ref().map(|token| &token.value)
    }

    fn advance(&mut self) -> Result<Option<Spanned<Token<'input>>>> {
        let next = self.tokenizer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, expected: Token<'input>, description: &str) -> Result<()> {
        if self.peek() == Some(&expected) {
            self.advance()?;
            Ok(())
        } else {
            Err(self.unexpected(description))
        }
    }

    fn unexpected(&self, expected: &str) -> FhirPathError {
        match &self.current {
            Some(token) => FhirPathError::syntax(
                token.start,
                format!("Unexpected token '{}', expected {expected}", token.value),
            ),
            None => FhirPathError::syntax(
                self.source.len(),
                format!("Unexpected end of expression, expected {expected}"),
            ),
        }
    }

    fn parse_expression(&mut self, min_precedence: Precedence) -> Result<Invokee> {
        let mut left = self.parse_term()?;

        while let Some((symbol, precedence)) = self.peek().and_then(binary_operator) {
            if precedence < min_precedence {
                break;
            }
            self.advance()?;
            let right = match precedence.next_level() {
                Some(level) => self.parse_expression(level)?,
                None => self.parse_term()?,
            };
            left = Invokee::operator(symbol, vec![left, right]);
        }

        Ok(left)
    }

    /// A primary term followed by any number of `.step` and `[index]` suffixes
    fn parse_term(&mut self) -> Result<Invokee> {
        let mut term = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance()?;
                    let step = self.parse_step()?;
                    term = term.then(step);
                }
                Some(Token::LeftBracket) => {
                    self.advance()?;
                    let index = self.parse_expression(Precedence::Logic)?;
                    self.expect(Token::RightBracket, "']'")?;
                    term = term.then(Invokee::function("item", vec![index]));
                }
                _ => return Ok(term),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Invokee> {
        let Some(Spanned { value, start, .. }) = self.advance()? else {
            return Err(self.unexpected("an expression"));
        };

        match value {
            Token::Integer(text) => Ok(Invokee::literal(parse_integer(text, false, start)?)),
            Token::Decimal(text) => Ok(Invokee::literal(parse_decimal(text, start)?)),
            Token::String(raw) => Ok(Invokee::literal(process_string_escapes(raw, start)?)),
            Token::True => Ok(Invokee::literal(true)),
            Token::False => Ok(Invokee::literal(false)),
            Token::DateTime(text) => PartialDateTime::parse(text)
                .map(Invokee::literal)
                .map_err(|_| FhirPathError::syntax(start, format!("Invalid date-time literal '@{text}'"))),
            Token::Time(text) => PartialTime::parse(text)
                .map(Invokee::literal)
                .map_err(|_| FhirPathError::syntax(start, format!("Invalid time literal '@T{text}'"))),
            Token::Constant(name) => Ok(Invokee::constant(name)),
            Token::QuotedConstant(raw) => Ok(Invokee::constant(process_string_escapes(raw, start)?)),
            Token::This => Ok(Invokee::this()),
            Token::LeftParen => self.parse_parenthesized(),
            Token::Minus => self.parse_negative_literal(start),
            Token::Identifier(name) => self.parse_invocation(name.to_string()),
            Token::QuotedIdentifier(raw) => {
                let name = process_string_escapes(raw, start)?;
                self.parse_invocation(name)
            }
            other => Err(FhirPathError::syntax(
                start,
                format!("Unexpected token '{other}', expected an expression"),
            )),
        }
    }

    /// Rest of a parenthesized expression, the `(` already consumed
    fn parse_parenthesized(&mut self) -> Result<Invokee> {
        let inner = self.parse_expression(Precedence::Logic)?;
        self.expect(Token::RightParen, "')'")?;
        Ok(inner)
    }

    fn parse_negative_literal(&mut self, start: usize) -> Result<Invokee> {
        match self.advance()? {
            Some(Spanned { value: Token::Integer(text), start: digits, .. }) => {
                Ok(Invokee::literal(parse_integer(text, true, digits)?))
            }
            Some(Spanned { value: Token::Decimal(text), .. }) => {
                Ok(Invokee::literal(-parse_decimal(text, start)?))
            }
            _ => Err(FhirPathError::syntax(
                start,
                "Unary minus is only allowed before a number literal",
            )),
        }
    }

    /// The step after a `.`: a member, a function call, or a parenthesized path
    fn parse_step(&mut self) -> Result<Invokee> {
        let Some(Spanned { value, start, .. }) = self.advance()? else {
            return Err(self.unexpected("a member or function name after '.'"));
        };

        let name = match value {
            Token::Identifier(name) => name.to_string(),
            Token::QuotedIdentifier(raw) => process_string_escapes(raw, start)?,
            Token::LeftParen => return self.parse_parenthesized(),
            other => match other.keyword_text() {
                Some(keyword) => keyword.to_string(),
                None => {
                    return Err(FhirPathError::syntax(
                        start,
                        format!("Expected a member or function name after '.', found '{other}'"),
                    ));
                }
            },
        };
        self.parse_invocation(name)
    }

    /// A member access, or a function call when `(` follows the name
    fn parse_invocation(&mut self, name: String) -> Result<Invokee> {
        if self.peek() != Some(&Token::LeftParen) {
            return Ok(Invokee::member(name));
        }
        self.advance()?;

        let mut parameters = Vec::new();
        if self.peek() != Some(&Token::RightParen) {
            loop {
                parameters.push(self.parse_expression(Precedence::Logic)?);
                if self.peek() == Some(&Token::Comma) {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RightParen, "')' to close the argument list")?;

        Ok(Invokee::function(name, parameters))
    }
}

fn parse_integer(digits: &str, negative: bool, position: usize) -> Result<i64> {
    let parsed = if negative {
        format!("-{digits}").parse::<i64>()
    } else {
        digits.parse::<i64>()
    };
    parsed.map_err(|_| {
        FhirPathError::syntax(position, format!("Integer literal '{digits}' is out of range"))
    })
}

fn parse_decimal(text: &str, position: usize) -> Result<Decimal> {
    Decimal::from_str(text).map_err(|_| {
        FhirPathError::syntax(position, format!("Invalid decimal literal '{text}'"))
    })
}

/// Resolve escape sequences in string literals and quoted names
pub fn process_string_escapes(input: &str, position: usize) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('f') => result.push('\u{000C}'),
            Some(c @ ('\\' | '\'' | '"' | '`' | '/')) => result.push(c),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = (hex.len() == 4)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(c) => result.push(c),
                    None => {
                        return Err(FhirPathError::syntax(
                            position,
                            format!("Invalid unicode escape '\\u{hex}'"),
                        ));
                    }
                }
            }
            Some(other) => {
                return Err(FhirPathError::syntax(
                    position,
                    format!("Invalid escape sequence '\\{other}'"),
                ));
            }
            None => {
                return Err(FhirPathError::syntax(position, "Dangling escape character"));
            }
        }
    }

    Ok(result)
}
