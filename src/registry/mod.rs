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

//! Function and operator registry for FluentPath
//!
//! Built-in functions and operators are plain Rust functions registered in a
//! [`SymbolTable`] together with their signatures and empty-propagation
//! behavior. The table is built once and shared by every evaluation.

#![warn(missing_docs)]

pub mod functions;
pub mod operators;
pub mod signature;
pub mod symbol_table;

use once_cell::sync::Lazy;

pub use signature::{ParamType, Signature};
pub use symbol_table::{Candidate, EmptyPropagation, SymbolEntry, SymbolTable, describe_call};

use crate::error::{FhirPathError, Result};
use crate::evaluator::{EvaluationContext, Invokee};
use crate::model::Collection;

static STANDARD_SYMBOLS: Lazy<SymbolTable> = Lazy::new(|| {
    let table = create_standard_table();
    log::debug!("registered {} built-in function and operator entries", table.len());
    table
});

/// The shared table of built-in functions and operators
pub fn standard_symbols() -> &'static SymbolTable {
    &STANDARD_SYMBOLS
}

/// Create a table with all built-in functions and operators
pub fn create_standard_table() -> SymbolTable {
    let mut table = SymbolTable::new();

    // Register built-in functions
    functions::register(&mut table);

    // Register built-in operators
    operators::register(&mut table);

    table
}

fn arity_mismatch(expected: usize, actual: usize) -> FhirPathError {
    FhirPathError::evaluation_error(format!(
        "body expects {expected} argument(s), got {actual}"
    ))
}

/// Adapt a body over one evaluated argument (the focus of a function)
pub(crate) fn wrap1(body: fn(Collection) -> Result<Collection>) -> Invokee {
    Invokee::new(move |ctx: &EvaluationContext, args: &[Invokee]| match args {
        [a] => body(a.select(ctx)?),
        _ => Err(arity_mismatch(1, args.len())),
    })
}

/// Adapt a body over two evaluated arguments (focus and one parameter, or
/// two operands)
pub(crate) fn wrap2(body: fn(Collection, Collection) -> Result<Collection>) -> Invokee {
    Invokee::new(move |ctx: &EvaluationContext, args: &[Invokee]| match args {
        [a, b] => body(a.select(ctx)?, b.select(ctx)?),
        _ => Err(arity_mismatch(2, args.len())),
    })
}

/// Adapt a body over three evaluated arguments
pub(crate) fn wrap3(body: fn(Collection, Collection, Collection) -> Result<Collection>) -> Invokee {
    Invokee::new(move |ctx: &EvaluationContext, args: &[Invokee]| match args {
        [a, b, c] => body(a.select(ctx)?, b.select(ctx)?, c.select(ctx)?),
        _ => Err(arity_mismatch(3, args.len())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_contents() {
        let table = standard_symbols();
        for (name, arity) in [
            ("where", 1),
            ("select", 1),
            ("all", 1),
            ("any", 0),
            ("any", 1),
            ("first", 0),
            ("substring", 1),
            ("substring", 2),
            ("trace", 1),
            ("log", 1),
            ("+", 2),
            ("and", 2),
            ("|", 2),
        ] {
            assert!(table.get(name, arity).is_some(), "missing {name}/{arity}");
        }
        assert!(table.get("first", 1).is_none());
        assert!(table.contains_name("first"));
    }

    #[test]
    fn test_wrap_rejects_wrong_argument_count() {
        let body = wrap1(|focus| Ok(focus));
        let ctx = EvaluationContext::new(Collection::new());
        assert!(body.invoke(&ctx, &[]).is_err());
    }
}
