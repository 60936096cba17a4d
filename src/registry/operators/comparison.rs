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

//! Equality, equivalence and ordering operators

use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::error::{FhirPathError, Result};
use crate::model::{Collection, FhirPathValue, Primitive, single};
use crate::registry::{EmptyPropagation, ParamType as P, Signature, SymbolTable, wrap2};

/// Equality of two single items, `None` when it cannot be decided
///
/// Primitives compare by value, integers and decimals across types, and
/// date-time strings against date-times. Date-times of different precision
/// whose shared components agree are undecided. Value-less elements compare
/// structurally.
pub fn value_equality(left: &FhirPathValue, right: &FhirPathValue) -> Option<bool> {
    match (left.value(), right.value()) {
        (Some(a), Some(b)) => primitive_equality(&a, &b),
        (None, None) => Some(match (left.as_element(), right.as_element()) {
            (Some(a), Some(b)) => a.deep_equals(b),
            _ => false,
        }),
        _ => Some(false),
    }
}

/// Equality of two single items, undecided counting as unequal
pub fn values_equal(left: &FhirPathValue, right: &FhirPathValue) -> bool {
    value_equality(left, right) == Some(true)
}

fn primitive_equality(left: &Primitive, right: &Primitive) -> Option<bool> {
    match (left, right) {
        (Primitive::Integer(a), Primitive::Decimal(b)) => Some(Decimal::from(*a) == *b),
        (Primitive::Decimal(a), Primitive::Integer(b)) => Some(*a == Decimal::from(*b)),
        (Primitive::DateTime(a), Primitive::DateTime(b)) => a.equals(b),
        (Primitive::DateTime(a), Primitive::String(_)) => {
            right.as_date_time().map_or(Some(false), |b| a.equals(&b))
        }
        (Primitive::String(_), Primitive::DateTime(b)) => {
            left.as_date_time().map_or(Some(false), |a| a.equals(b))
        }
        (Primitive::Time(a), Primitive::Time(b)) => a.equals(b),
        (a, b) => Some(a == b),
    }
}

/// Equivalence of two single items: like equality, but strings ignore case
/// and whitespace differences and decimals compare at the lower precision
pub fn values_equivalent(left: &FhirPathValue, right: &FhirPathValue) -> bool {
    match (left.value(), right.value()) {
        (Some(a), Some(b)) => primitives_equivalent(&a, &b),
        _ => values_equal(left, right),
    }
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn as_decimal(value: &Primitive) -> Option<Decimal> {
    match value {
        Primitive::Integer(i) => Some(Decimal::from(*i)),
        Primitive::Decimal(d) => Some(*d),
        _ => None,
    }
}

fn primitives_equivalent(left: &Primitive, right: &Primitive) -> bool {
    match (left, right) {
        (Primitive::String(a), Primitive::String(b)) => normalize_text(a) == normalize_text(b),
        (Primitive::Decimal(_), _) | (_, Primitive::Decimal(_)) => {
            match (as_decimal(left), as_decimal(right)) {
                (Some(a), Some(b)) => {
                    let scale = a.scale().min(b.scale());
                    a.round_dp(scale) == b.round_dp(scale)
                }
                _ => false,
            }
        }
        _ => primitive_equality(left, right) == Some(true),
    }
}

/// Pairwise equality of two collections, `None` when some pair is undecided
pub fn collections_equality(left: &Collection, right: &Collection) -> Option<bool> {
    if left.len() != right.len() {
        return Some(false);
    }
    let mut decided = true;
    for (a, b) in left.iter().zip(right) {
        match value_equality(a, b) {
            Some(false) => return Some(false),
            Some(true) => {}
            None => decided = false,
        }
    }
    decided.then_some(true)
}

/// Pairwise equality of two collections of the same length
pub fn collections_equal(left: &Collection, right: &Collection) -> bool {
    collections_equality(left, right) == Some(true)
}

/// Order-independent equivalence of two collections
pub fn collections_equivalent(left: &Collection, right: &Collection) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut used = vec![false; right.len()];
    left.iter().all(|item| {
        let found = right
            .iter()
            .enumerate()
            .find(|(i, candidate)| !used[*i] && values_equivalent(item, candidate));
        match found {
            Some((i, _)) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

/// Order two single items, `None` when the ordering is unknown
pub fn compare_values(left: &FhirPathValue, right: &FhirPathValue) -> Result<Option<Ordering>> {
    let (Some(a), Some(b)) = (left.value(), right.value()) else {
        return Err(incomparable(left.type_name(), right.type_name()));
    };
    let ordering = match (&a, &b) {
        (Primitive::Integer(x), Primitive::Integer(y)) => Some(x.cmp(y)),
        (Primitive::String(x), Primitive::String(y)) => Some(x.cmp(y)),
        (Primitive::DateTime(x), Primitive::DateTime(y)) => x.compare(y),
        (Primitive::DateTime(x), Primitive::String(_)) => match b.as_date_time() {
            Some(y) => x.compare(&y),
            None => return Err(incomparable(a.type_name(), b.type_name())),
        },
        (Primitive::String(_), Primitive::DateTime(y)) => match a.as_date_time() {
            Some(x) => x.compare(y),
            None => return Err(incomparable(a.type_name(), b.type_name())),
        },
        (Primitive::Time(x), Primitive::Time(y)) => x.compare(y),
        _ => match (as_decimal(&a), as_decimal(&b)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => return Err(incomparable(a.type_name(), b.type_name())),
        },
    };
    Ok(ordering)
}

fn incomparable(left: &str, right: &str) -> FhirPathError {
    FhirPathError::evaluation_error(format!("cannot compare {left} with {right}"))
}

fn equals(left: Collection, right: Collection) -> Result<Collection> {
    Ok(collections_equality(&left, &right)
        .map(Collection::singleton)
        .unwrap_or_default())
}

fn not_equals(left: Collection, right: Collection) -> Result<Collection> {
    Ok(collections_equality(&left, &right)
        .map(|equal| Collection::singleton(!equal))
        .unwrap_or_default())
}

fn equivalent(left: Collection, right: Collection) -> Result<Collection> {
    Ok(Collection::singleton(collections_equivalent(&left, &right)))
}

fn not_equivalent(left: Collection, right: Collection) -> Result<Collection> {
    Ok(Collection::singleton(!collections_equivalent(&left, &right)))
}

fn ordered(left: &Collection, right: &Collection, accept: fn(Ordering) -> bool) -> Result<Collection> {
    let ordering = compare_values(single(left, "value")?, single(right, "value")?)?;
    Ok(ordering
        .map(|o| Collection::singleton(accept(o)))
        .unwrap_or_default())
}

fn less_than(left: Collection, right: Collection) -> Result<Collection> {
    ordered(&left, &right, Ordering::is_lt)
}

fn less_or_equal(left: Collection, right: Collection) -> Result<Collection> {
    ordered(&left, &right, Ordering::is_le)
}

fn greater_than(left: Collection, right: Collection) -> Result<Collection> {
    ordered(&left, &right, Ordering::is_gt)
}

fn greater_or_equal(left: Collection, right: Collection) -> Result<Collection> {
    ordered(&left, &right, Ordering::is_ge)
}

const ORDERED_TYPES: [P; 5] = [P::Integer, P::Decimal, P::String, P::DateTime, P::Time];

pub(crate) fn register(table: &mut SymbolTable) {
    use EmptyPropagation::{Custom, Propagate};

    let both = Signature::operator(&[P::Collection, P::Collection]);
    table.add("=", Propagate, both.clone(), wrap2(equals));
    table.add("!=", Propagate, both.clone(), wrap2(not_equals));
    table.add("~", Custom, both.clone(), wrap2(equivalent));
    table.add("!~", Custom, both, wrap2(not_equivalent));

    let ordering_ops: [(&str, fn(Collection, Collection) -> Result<Collection>); 4] = [
        ("<", less_than),
        ("<=", less_or_equal),
        (">", greater_than),
        (">=", greater_or_equal),
    ];
    for (symbol, body) in ordering_ops {
        let body = wrap2(body);
        for operand in ORDERED_TYPES {
            table.add(symbol, Propagate, Signature::operator(&[operand, operand]), body.clone());
        }
    }
}
