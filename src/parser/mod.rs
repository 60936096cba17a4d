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

//! FluentPath expression parser
//!
//! Source text is tokenized and compiled in one pass by a precedence-climbing
//! parser into executable [`Invokee`](crate::evaluator::Invokee) nodes.

#![warn(missing_docs)]

pub mod pratt;
pub mod span;
pub mod tokenizer;

pub use pratt::{PrattParser, Precedence, process_string_escapes};
pub use span::Spanned;
pub use tokenizer::{Token, Tokenizer};

use crate::error::Result;
use crate::evaluator::CompiledExpression;

/// Compile a FluentPath expression
///
/// Malformed input fails with a syntax error; names of members and functions
/// are only resolved when the expression runs.
pub fn parse(source: &str) -> Result<CompiledExpression> {
    let root = PrattParser::new(source)?.parse()?;
    log::trace!("compiled expression '{source}'");
    Ok(CompiledExpression::new(source, root))
}
