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

//! Type conversion functions
//!
//! A value that cannot be converted yields empty rather than an error.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::Result;
use crate::model::{Collection, Primitive, single};
use crate::registry::{EmptyPropagation, ParamType as P, Signature, SymbolTable, wrap1};

fn primitive(focus: &Collection) -> Result<Option<Primitive>> {
    Ok(single(focus, "value")?.value())
}

/// toInteger() - integers, integer strings and booleans (1/0)
pub fn to_integer(focus: Collection) -> Result<Collection> {
    let converted = match primitive(&focus)? {
        Some(Primitive::Integer(i)) => Some(i),
        Some(Primitive::Boolean(b)) => Some(i64::from(b)),
        Some(Primitive::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(converted.map(Collection::singleton).unwrap_or_default())
}

/// toDecimal() - numbers, numeric strings and booleans (1.0/0.0)
pub fn to_decimal(focus: Collection) -> Result<Collection> {
    let converted = match primitive(&focus)? {
        Some(Primitive::Decimal(d)) => Some(d),
        Some(Primitive::Integer(i)) => Some(Decimal::from(i)),
        Some(Primitive::Boolean(b)) => Some(if b { Decimal::ONE } else { Decimal::ZERO }),
        Some(Primitive::String(s)) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };
    Ok(converted.map(Collection::singleton).unwrap_or_default())
}

/// toString() - the string form of any primitive
pub fn to_string(focus: Collection) -> Result<Collection> {
    Ok(primitive(&focus)?
        .map(|p| Collection::singleton(p.to_string_representation()))
        .unwrap_or_default())
}

pub(crate) fn register(table: &mut SymbolTable) {
    use EmptyPropagation::Propagate;

    let on_value = Signature::function(P::Value, &[]);
    table.add("toInteger", Propagate, on_value.clone(), wrap1(to_integer));
    table.add("toDecimal", Propagate, on_value.clone(), wrap1(to_decimal));
    table.add("toString", Propagate, on_value, wrap1(to_string));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Collection::singleton("42"), Some("42"))]
    #[case(Collection::singleton(" 7 "), Some("7"))]
    #[case(Collection::singleton(true), Some("1"))]
    #[case(Collection::singleton("4.5"), None)]
    #[case(Collection::singleton(Decimal::new(45, 1)), None)]
    fn test_to_integer(#[case] focus: Collection, #[case] expected: Option<&str>) {
        let result = to_integer(focus).unwrap();
        assert_eq!(result.to_strings().first().map(String::as_str), expected);
    }

    #[rstest]
    #[case(Collection::singleton("4.50"), Some("4.50"))]
    #[case(Collection::singleton(3i64), Some("3"))]
    #[case(Collection::singleton(false), Some("0"))]
    #[case(Collection::singleton("abc"), None)]
    fn test_to_decimal(#[case] focus: Collection, #[case] expected: Option<&str>) {
        let result = to_decimal(focus).unwrap();
        assert_eq!(result.to_strings().first().map(String::as_str), expected);
    }

    #[test]
    fn test_to_string() {
        assert_eq!(to_string(Collection::singleton(12i64)).unwrap().to_strings(), vec!["12"]);
        assert_eq!(to_string(Collection::singleton(true)).unwrap().to_strings(), vec!["true"]);
    }
}
