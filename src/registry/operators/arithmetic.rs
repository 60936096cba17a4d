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

//! Arithmetic operators for FluentPath expressions
//!
//! Integer operations are checked; overflow is an error. Division by zero
//! yields empty.

use rust_decimal::Decimal;

use crate::error::{FhirPathError, Result};
use crate::model::{Collection, coerce};
use crate::registry::{EmptyPropagation, ParamType as P, Signature, SymbolTable, wrap2};

fn overflow(symbol: &str) -> FhirPathError {
    FhirPathError::evaluation_error(format!("arithmetic overflow in '{symbol}'"))
}

fn integers(
    left: &Collection,
    right: &Collection,
    symbol: &str,
    op: fn(i64, i64) -> Option<i64>,
) -> Result<Collection> {
    let (a, b) = (coerce::<i64>(left)?, coerce::<i64>(right)?);
    op(a, b).map(Collection::singleton).ok_or_else(|| overflow(symbol))
}

fn decimals(
    left: &Collection,
    right: &Collection,
    symbol: &str,
    op: fn(Decimal, Decimal) -> Option<Decimal>,
) -> Result<Collection> {
    let (a, b) = (coerce::<Decimal>(left)?, coerce::<Decimal>(right)?);
    op(a, b).map(Collection::singleton).ok_or_else(|| overflow(symbol))
}

fn divisor_is_zero(right: &Collection) -> Result<bool> {
    Ok(coerce::<Decimal>(right)?.is_zero())
}

fn add_integers(left: Collection, right: Collection) -> Result<Collection> {
    integers(&left, &right, "+", i64::checked_add)
}

fn add_decimals(left: Collection, right: Collection) -> Result<Collection> {
    decimals(&left, &right, "+", Decimal::checked_add)
}

fn concat_strings(left: Collection, right: Collection) -> Result<Collection> {
    let (a, b) = (coerce::<String>(&left)?, coerce::<String>(&right)?);
    Ok(Collection::singleton(a + &b))
}

fn subtract_integers(left: Collection, right: Collection) -> Result<Collection> {
    integers(&left, &right, "-", i64::checked_sub)
}

fn subtract_decimals(left: Collection, right: Collection) -> Result<Collection> {
    decimals(&left, &right, "-", Decimal::checked_sub)
}

fn multiply_integers(left: Collection, right: Collection) -> Result<Collection> {
    integers(&left, &right, "*", i64::checked_mul)
}

fn multiply_decimals(left: Collection, right: Collection) -> Result<Collection> {
    decimals(&left, &right, "*", Decimal::checked_mul)
}

fn divide(left: Collection, right: Collection) -> Result<Collection> {
    if divisor_is_zero(&right)? {
        return Ok(Collection::new());
    }
    decimals(&left, &right, "/", Decimal::checked_div)
}

fn truncated_divide_integers(left: Collection, right: Collection) -> Result<Collection> {
    if divisor_is_zero(&right)? {
        return Ok(Collection::new());
    }
    integers(&left, &right, "div", i64::checked_div)
}

fn truncated_divide_decimals(left: Collection, right: Collection) -> Result<Collection> {
    if divisor_is_zero(&right)? {
        return Ok(Collection::new());
    }
    decimals(&left, &right, "div", |a, b| a.checked_div(b).map(|q| q.trunc()))
}

fn modulo_integers(left: Collection, right: Collection) -> Result<Collection> {
    if divisor_is_zero(&right)? {
        return Ok(Collection::new());
    }
    integers(&left, &right, "mod", i64::checked_rem)
}

fn modulo_decimals(left: Collection, right: Collection) -> Result<Collection> {
    if divisor_is_zero(&right)? {
        return Ok(Collection::new());
    }
    decimals(&left, &right, "mod", Decimal::checked_rem)
}

pub(crate) fn register(table: &mut SymbolTable) {
    use EmptyPropagation::Propagate;

    let ints = Signature::operator(&[P::Integer, P::Integer]);
    let decs = Signature::operator(&[P::Decimal, P::Decimal]);
    let strings = Signature::operator(&[P::String, P::String]);

    table.add("+", Propagate, ints.clone(), wrap2(add_integers));
    table.add("+", Propagate, decs.clone(), wrap2(add_decimals));
    table.add("+", Propagate, strings, wrap2(concat_strings));

    table.add("-", Propagate, ints.clone(), wrap2(subtract_integers));
    table.add("-", Propagate, decs.clone(), wrap2(subtract_decimals));

    table.add("*", Propagate, ints.clone(), wrap2(multiply_integers));
    table.add("*", Propagate, decs.clone(), wrap2(multiply_decimals));

    table.add("/", Propagate, decs.clone(), wrap2(divide));

    table.add("div", Propagate, ints.clone(), wrap2(truncated_divide_integers));
    table.add("div", Propagate, decs.clone(), wrap2(truncated_divide_decimals));

    table.add("mod", Propagate, ints, wrap2(modulo_integers));
    table.add("mod", Propagate, decs, wrap2(modulo_decimals));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn int(i: i64) -> Collection {
        Collection::singleton(i)
    }

    fn dec(text: &str) -> Collection {
        Collection::singleton(Decimal::from_str(text).unwrap())
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(add_integers(int(1), int(2)).unwrap().to_strings(), vec!["3"]);
        assert_eq!(subtract_integers(int(1), int(2)).unwrap().to_strings(), vec!["-1"]);
        assert_eq!(multiply_integers(int(4), int(3)).unwrap().to_strings(), vec!["12"]);
        assert_eq!(truncated_divide_integers(int(7), int(2)).unwrap().to_strings(), vec!["3"]);
        assert_eq!(modulo_integers(int(7), int(2)).unwrap().to_strings(), vec!["1"]);
    }

    #[test]
    fn test_division_yields_decimal() {
        assert_eq!(divide(int(10), int(4)).unwrap().to_strings(), vec!["2.5"]);
        assert_eq!(
            truncated_divide_decimals(dec("7.5"), dec("2")).unwrap().to_strings(),
            vec!["3"]
        );
    }

    #[test]
    fn test_division_by_zero_is_empty() {
        assert!(divide(int(1), int(0)).unwrap().is_empty());
        assert!(truncated_divide_integers(int(1), int(0)).unwrap().is_empty());
        assert!(modulo_decimals(dec("1.5"), dec("0.0")).unwrap().is_empty());
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(add_integers(int(i64::MAX), int(1)).is_err());
        assert!(multiply_integers(int(i64::MIN), int(-1)).is_err());
    }

    #[test]
    fn test_string_concatenation() {
        let result = concat_strings(Collection::singleton("ab"), Collection::singleton("cd")).unwrap();
        assert_eq!(result.to_strings(), vec!["abcd"]);
    }
}
