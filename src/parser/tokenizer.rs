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

//! Tokenizer for FluentPath expressions
//!
//! Tokens borrow their text from the input. Escape sequences in strings and
//! quoted identifiers are left untouched here and resolved by the parser.

use std::fmt;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use unicode_xid::UnicodeXID;

use super::span::Spanned;
use crate::error::{FhirPathError, Result};

/// A lexical token
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'input> {
    /// Integer literal digits (e.g., 42); range is checked once the sign is known
    Integer(&'input str),
    /// Decimal literal text (e.g., 3.14)
    Decimal(&'input str),
    /// String literal content between the quotes, escapes unresolved
    String(&'input str),
    /// Date-time literal text after `@`
    DateTime(&'input str),
    /// Time literal text after `@T`
    Time(&'input str),
    /// `true`
    True,
    /// `false`
    False,

    /// Plain identifier
    Identifier(&'input str),
    /// Back-tick delimited identifier content, escapes unresolved
    QuotedIdentifier(&'input str),
    /// `%name` constant
    Constant(&'input str),
    /// `%'name'` or `` %`name` `` constant content, escapes unresolved
    QuotedConstant(&'input str),
    /// `$this`
    This,

    /// Addition operator (+)
    Plus,
    /// Subtraction operator (-)
    Minus,
    /// Multiplication operator (*)
    Multiply,
    /// Division operator (/)
    Divide,
    /// Integer division operator (div keyword)
    Div,
    /// Modulo operator (mod keyword)
    Mod,
    /// Equality operator (=)
    Equal,
    /// Inequality operator (!=)
    NotEqual,
    /// Equivalence operator (~)
    Equivalent,
    /// Non-equivalence operator (!~)
    NotEquivalent,
    /// Less than operator (<)
    LessThan,
    /// Less than or equal operator (<=)
    LessThanOrEqual,
    /// Greater than operator (>)
    GreaterThan,
    /// Greater than or equal operator (>=)
    GreaterThanOrEqual,
    /// Union operator (|)
    Union,
    /// Concatenation operator (&)
    Ampersand,
    /// Membership operator (in keyword)
    In,
    /// Logical AND operator (and keyword)
    And,
    /// Logical OR operator (or keyword)
    Or,
    /// Logical XOR operator (xor keyword)
    Xor,
    /// Logical implication operator (implies keyword)
    Implies,

    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Left square bracket [
    LeftBracket,
    /// Right square bracket ]
    RightBracket,
    /// Dot operator (.) for invocation
    Dot,
    /// Comma separator (,)
    Comma,
}

impl Token<'_> {
    /// Spelling of keyword tokens, which stay usable as member names after a
    /// dot (`text.div`)
    pub fn keyword_text(&self) -> Option<&'static str> {
        match self {
            Token::True => Some("true"),
            Token::False => Some("false"),
            Token::Div => Some("div"),
            Token::Mod => Some("mod"),
            Token::In => Some("in"),
            Token::And => Some("and"),
            Token::Or => Some("or"),
            Token::Xor => Some("xor"),
            Token::Implies => Some("implies"),
            _ => None,
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(keyword) = self.keyword_text() {
            return f.write_str(keyword);
        }
        match self {
            Token::Integer(i) => write!(f, "{i}"),
            Token::Decimal(text) => f.write_str(text),
            Token::String(text) => write!(f, "'{text}'"),
            Token::DateTime(text) => write!(f, "@{text}"),
            Token::Time(text) => write!(f, "@T{text}"),
            Token::Identifier(name) => f.write_str(name),
            Token::QuotedIdentifier(name) => write!(f, "`{name}`"),
            Token::Constant(name) => write!(f, "%{name}"),
            Token::QuotedConstant(name) => write!(f, "%'{name}'"),
            Token::This => f.write_str("$this"),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Multiply => f.write_str("*"),
            Token::Divide => f.write_str("/"),
            Token::Equal => f.write_str("="),
            Token::NotEqual => f.write_str("!="),
            Token::Equivalent => f.write_str("~"),
            Token::NotEquivalent => f.write_str("!~"),
            Token::LessThan => f.write_str("<"),
            Token::LessThanOrEqual => f.write_str("<="),
            Token::GreaterThan => f.write_str(">"),
            Token::GreaterThanOrEqual => f.write_str(">="),
            Token::Union => f.write_str("|"),
            Token::Ampersand => f.write_str("&"),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::LeftBracket => f.write_str("["),
            Token::RightBracket => f.write_str("]"),
            Token::Dot => f.write_str("."),
            Token::Comma => f.write_str(","),
            _ => Ok(()),
        }
    }
}

/// Shared keyword lookup table
static KEYWORD_TABLE: Lazy<FxHashMap<&'static str, Token<'static>>> = Lazy::new(|| {
    let mut map = FxHashMap::default();

    // Boolean literals
    map.insert("true", Token::True);
    map.insert("false", Token::False);

    // Logical operators
    map.insert("and", Token::And);
    map.insert("or", Token::Or);
    map.insert("xor", Token::Xor);
    map.insert("implies", Token::Implies);

    // Membership and arithmetic operators
    map.insert("in", Token::In);
    map.insert("div", Token::Div);
    map.insert("mod", Token::Mod);

    map
});

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_xid_start()
}

fn is_identifier_continue(c: char) -> bool {
    c.is_xid_continue()
}

/// Streaming tokenizer over one expression
#[derive(Debug, Clone)]
pub struct Tokenizer<'input> {
    input: &'input str,
    pos: usize,
}

impl<'input> Tokenizer<'input> {
    /// Create a tokenizer at the start of `input`
    pub fn new(input: &'input str) -> Self {
        Self { input, pos: 0 }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read all remaining tokens
    pub fn tokenize_all(&mut self) -> Result<Vec<Spanned<Token<'input>>>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, keep: impl Fn(char) -> bool) -> &'input str {
        let input = self.input;
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if !keep(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &input[start..self.pos]
    }

    fn slice_from(&self, start: usize) -> &'input str {
        let input = self.input;
        &input[start..self.pos]
    }

    fn next_is_digit_after(&self, c: char) -> bool {
        self.peek_char() == Some(c) && self.peek_nth(1).is_some_and(|d| d.is_ascii_digit())
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            self.eat_while(char::is_whitespace);
            let input = self.input;
            let rest = &input[self.pos..];
            if rest.starts_with("//") {
                self.eat_while(|c| c != '\n');
            } else if let Some(body) = rest.strip_prefix("/*") {
                match body.find("*/") {
                    Some(end) => self.pos += 2 + end + 2,
                    None => {
                        return Err(FhirPathError::syntax(self.pos, "Unterminated block comment"));
                    }
                }
            } else {
                return Ok(());
            }
        }
    }

    /// Read the next token, `None` at the end of input
    pub fn next_token(&mut self) -> Result<Option<Spanned<Token<'input>>>> {
        self.skip_trivia()?;
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Ok(None);
        };

        let token = match c {
            '0'..='9' => self.lex_number(start)?,
            '\'' => Token::String(self.lex_quoted('\'', start)?),
            '`' => Token::QuotedIdentifier(self.lex_quoted('`', start)?),
            '@' => self.lex_date_time(start)?,
            '%' => self.lex_constant(start)?,
            '$' => {
                let name = self.eat_while(is_identifier_continue);
                if name != "this" {
                    return Err(FhirPathError::syntax(
                        start,
                        format!("Unknown special variable '${name}'"),
                    ));
                }
                Token::This
            }
            '.' => Token::Dot,
            ',' => Token::Comma,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Multiply,
            '/' => Token::Divide,
            '|' => Token::Union,
            '&' => Token::Ampersand,
            '=' => Token::Equal,
            '~' => Token::Equivalent,
            '!' => {
                if self.eat('=') {
                    Token::NotEqual
                } else if self.eat('~') {
                    Token::NotEquivalent
                } else {
                    return Err(FhirPathError::syntax(start, "Expected '=' or '~' after '!'"));
                }
            }
            '<' => {
                if self.eat('=') {
                    Token::LessThanOrEqual
                } else {
                    Token::LessThan
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::GreaterThanOrEqual
                } else {
                    Token::GreaterThan
                }
            }
            c if is_identifier_start(c) => {
                self.eat_while(is_identifier_continue);
                let text = self.slice_from(start);
                KEYWORD_TABLE
                    .get(text)
                    .copied()
                    .unwrap_or(Token::Identifier(text))
            }
            other => {
                return Err(FhirPathError::syntax(
                    start,
                    format!("Unexpected character '{other}'"),
                ));
            }
        };

        Ok(Some(Spanned::new(token, start, self.pos)))
    }

    fn lex_number(&mut self, start: usize) -> Result<Token<'input>> {
        self.eat_while(|c| c.is_ascii_digit());
        if self.next_is_digit_after('.') {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
            return Ok(Token::Decimal(self.slice_from(start)));
        }
        Ok(Token::Integer(self.slice_from(start)))
    }

    /// Content up to the closing `quote`; the opening one is already consumed
    fn lex_quoted(&mut self, quote: char, start: usize) -> Result<&'input str> {
        let content_start = self.pos;
        loop {
            match self.bump() {
                None => break,
                Some('\\') => {
                    if self.bump().is_none() {
                        break;
                    }
                }
                Some(c) if c == quote => {
                    let input = self.input;
                    return Ok(&input[content_start..self.pos - quote.len_utf8()]);
                }
                Some(_) => {}
            }
        }
        let what = if quote == '`' { "identifier" } else { "string" };
        Err(FhirPathError::syntax(start, format!("Unterminated {what} literal")))
    }

    fn lex_time_part(&mut self) {
        self.eat_while(|c| c.is_ascii_digit());
        for _ in 0..2 {
            if !self.next_is_digit_after(':') {
                break;
            }
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
        }
        if self.next_is_digit_after('.') {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
        }
    }

    fn lex_offset(&mut self) {
        if self.eat('Z') {
            return;
        }
        if self.next_is_digit_after('+') || self.next_is_digit_after('-') {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
            if self.next_is_digit_after(':') {
                self.bump();
                self.eat_while(|c| c.is_ascii_digit());
            }
        }
    }

    fn lex_date_time(&mut self, start: usize) -> Result<Token<'input>> {
        if self.eat('T') {
            let text_start = self.pos;
            self.lex_time_part();
            let text = self.slice_from(text_start);
            crate::model::PartialTime::parse(text).map_err(|_| {
                FhirPathError::syntax(start, format!("Invalid time literal '@T{text}'"))
            })?;
            return Ok(Token::Time(text));
        }

        let text_start = self.pos;
        self.eat_while(|c| c.is_ascii_digit());
        for _ in 0..2 {
            if !self.next_is_digit_after('-') {
                break;
            }
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
        }
        if self.eat('T') && self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.lex_time_part();
            self.lex_offset();
        }

        let raw = self.slice_from(text_start);
        let text = raw.strip_suffix('T').unwrap_or(raw);
        crate::model::PartialDateTime::parse(text).map_err(|_| {
            FhirPathError::syntax(start, format!("Invalid date-time literal '@{raw}'"))
        })?;
        Ok(Token::DateTime(text))
    }

    fn lex_constant(&mut self, start: usize) -> Result<Token<'input>> {
        match self.peek_char() {
            Some(quote @ ('\'' | '`')) => {
                self.bump();
                Ok(Token::QuotedConstant(self.lex_quoted(quote, start)?))
            }
            _ => {
                let name = self.eat_while(|c| c == '-' || is_identifier_continue(c));
                if name.is_empty() {
                    Err(FhirPathError::syntax(start, "Expected a constant name after '%'"))
                } else {
                    Ok(Token::Constant(name))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        Tokenizer::new(input)
            .tokenize_all()
            .unwrap()
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn test_path_and_call() {
        assert_eq!(
            tokens("Patient.name.where(use = 'official')"),
            vec![
                Token::Identifier("Patient"),
                Token::Dot,
                Token::Identifier("name"),
                Token::Dot,
                Token::Identifier("where"),
                Token::LeftParen,
                Token::Identifier("use"),
                Token::Equal,
                Token::String("official"),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokens("42 3.14"), vec![Token::Integer("42"), Token::Decimal("3.14")]);
        assert_eq!(
            tokens("1.toString()"),
            vec![
                Token::Integer("1"),
                Token::Dot,
                Token::Identifier("toString"),
                Token::LeftParen,
                Token::RightParen
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokens("!= !~ <= >= < > ~ = | & div mod in"),
            vec![
                Token::NotEqual,
                Token::NotEquivalent,
                Token::LessThanOrEqual,
                Token::GreaterThanOrEqual,
                Token::LessThan,
                Token::GreaterThan,
                Token::Equivalent,
                Token::Equal,
                Token::Union,
                Token::Ampersand,
                Token::Div,
                Token::Mod,
                Token::In,
            ]
        );
    }

    #[test]
    fn test_constants_and_variables() {
        assert_eq!(
            tokens("%context %vs-administrative-gender %'quoted name' $this"),
            vec![
                Token::Constant("context"),
                Token::Constant("vs-administrative-gender"),
                Token::QuotedConstant("quoted name"),
                Token::This,
            ]
        );
        assert!(Tokenizer::new("$that").tokenize_all().is_err());
        assert!(Tokenizer::new("% ").tokenize_all().is_err());
    }

    #[test]
    fn test_date_time_literals() {
        assert_eq!(
            tokens("@2015-02-04T14:34:28Z @2015-02 @T14:30 @2015-02-04"),
            vec![
                Token::DateTime("2015-02-04T14:34:28Z"),
                Token::DateTime("2015-02"),
                Token::Time("14:30"),
                Token::DateTime("2015-02-04"),
            ]
        );
        assert!(Tokenizer::new("@2015-13-01").tokenize_all().is_err());
    }

    #[test]
    fn test_strings_and_quoted_identifiers() {
        assert_eq!(
            tokens(r"'it\'s' `given name`"),
            vec![Token::String(r"it\'s"), Token::QuotedIdentifier("given name")]
        );
        let err = Tokenizer::new("'open").tokenize_all().unwrap_err();
        assert_eq!(err, FhirPathError::syntax(0, "Unterminated string literal"));
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            tokens("1 // trailing\n + /* inline */ 2"),
            vec![Token::Integer("1"), Token::Plus, Token::Integer("2")]
        );
        assert!(Tokenizer::new("1 /* open").tokenize_all().is_err());
    }

    #[test]
    fn test_unicode_identifiers() {
        assert_eq!(tokens("naïve"), vec![Token::Identifier("naïve")]);
        assert!(Tokenizer::new("#").tokenize_all().is_err());
    }
}
