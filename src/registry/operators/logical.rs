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

//! Logical operators for FluentPath expressions
//!
//! Operands are three-valued: true, false or empty (unknown). The right
//! operand is only evaluated when the left one does not settle the result.

use crate::error::{FhirPathError, Result};
use crate::evaluator::{EvaluationContext, Invokee};
use crate::model::{Collection, boolean_eval};
use crate::registry::{EmptyPropagation, ParamType, Signature, SymbolTable};

fn truth(value: Option<bool>) -> Collection {
    value.map(Collection::singleton).unwrap_or_default()
}

fn operands<'a>(symbol: &str, args: &'a [Invokee]) -> Result<(&'a Invokee, &'a Invokee)> {
    match args {
        [left, right] => Ok((left, right)),
        _ => Err(FhirPathError::InvalidArity {
            function_name: symbol.to_string(),
            actual: args.len(),
        }),
    }
}

fn eval(operand: &Invokee, ctx: &EvaluationContext) -> Result<Option<bool>> {
    boolean_eval(&operand.select(ctx)?)
}

/// Logical AND
///
/// - false and anything = false
/// - true and true = true
/// - otherwise empty
pub fn and(ctx: &EvaluationContext, args: &[Invokee]) -> Result<Collection> {
    let (left, right) = operands("and", args)?;
    let left = eval(left, ctx)?;
    if left == Some(false) {
        return Ok(truth(Some(false)));
    }
    let result = match (left, eval(right, ctx)?) {
        (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    };
    Ok(truth(result))
}

/// Logical OR
///
/// - true or anything = true
/// - false or false = false
/// - otherwise empty
pub fn or(ctx: &EvaluationContext, args: &[Invokee]) -> Result<Collection> {
    let (left, right) = operands("or", args)?;
    let left = eval(left, ctx)?;
    if left == Some(true) {
        return Ok(truth(Some(true)));
    }
    let result = match (left, eval(right, ctx)?) {
        (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    };
    Ok(truth(result))
}

/// Logical XOR, empty when either side is empty
pub fn xor(ctx: &EvaluationContext, args: &[Invokee]) -> Result<Collection> {
    let (left, right) = operands("xor", args)?;
    let result = match (eval(left, ctx)?, eval(right, ctx)?) {
        (Some(a), Some(b)) => Some(a != b),
        _ => None,
    };
    Ok(truth(result))
}

/// Logical implication
///
/// - false implies anything = true
/// - anything implies true = true
/// - true implies false = false
/// - otherwise empty
pub fn implies(ctx: &EvaluationContext, args: &[Invokee]) -> Result<Collection> {
    let (left, right) = operands("implies", args)?;
    let left = eval(left, ctx)?;
    if left == Some(false) {
        return Ok(truth(Some(true)));
    }
    let result = match (left, eval(right, ctx)?) {
        (_, Some(true)) => Some(true),
        (Some(true), Some(false)) => Some(false),
        _ => None,
    };
    Ok(truth(result))
}

pub(crate) fn register(table: &mut SymbolTable) {
    let lazy_pair = Signature::operator(&[ParamType::Lambda, ParamType::Lambda]);
    table.add("and", EmptyPropagation::Custom, lazy_pair.clone(), Invokee::new(and));
    table.add("or", EmptyPropagation::Custom, lazy_pair.clone(), Invokee::new(or));
    table.add("xor", EmptyPropagation::Custom, lazy_pair.clone(), Invokee::new(xor));
    table.add("implies", EmptyPropagation::Custom, lazy_pair, Invokee::new(implies));
}
