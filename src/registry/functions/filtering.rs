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

//! Filtering and projection functions
//!
//! The criteria and projection arguments are evaluated once per focus item,
//! with that single item as `$this`.

use crate::error::{FhirPathError, Result};
use crate::evaluator::{EvaluationContext, Invokee};
use crate::model::{Collection, FhirPathValue};
use crate::registry::{EmptyPropagation, ParamType as P, Signature, SymbolTable, wrap1};

fn focus_and_lambda<'a>(
    name: &str,
    ctx: &EvaluationContext,
    args: &'a [Invokee],
) -> Result<(Collection, &'a Invokee)> {
    match args {
        [focus, lambda] => Ok((focus.select(ctx)?, lambda)),
        _ => Err(FhirPathError::InvalidArity {
            function_name: name.to_string(),
            actual: args.len().saturating_sub(1),
        }),
    }
}

fn item_context(ctx: &EvaluationContext, item: &FhirPathValue) -> EvaluationContext {
    ctx.nest(Collection::singleton(item.clone()))
}

/// where(criteria) - items for which `criteria` is exactly `true`
pub fn where_(ctx: &EvaluationContext, args: &[Invokee]) -> Result<Collection> {
    let (focus, criteria) = focus_and_lambda("where", ctx, args)?;
    let mut kept = Collection::new();
    for item in focus {
        if criteria.is_boolean(true, &item_context(ctx, &item))? {
            kept.push(item);
        }
    }
    Ok(kept)
}

/// select(projection) - concatenated projection results
pub fn select(ctx: &EvaluationContext, args: &[Invokee]) -> Result<Collection> {
    let (focus, projection) = focus_and_lambda("select", ctx, args)?;
    let mut projected = Collection::new();
    for item in &focus {
        projected.extend(projection.select(&item_context(ctx, item))?);
    }
    Ok(projected)
}

/// all(criteria) - true when no item fails `criteria`; empty criteria pass
pub fn all(ctx: &EvaluationContext, args: &[Invokee]) -> Result<Collection> {
    let (focus, criteria) = focus_and_lambda("all", ctx, args)?;
    for item in &focus {
        if !criteria.predicate(&item_context(ctx, item))? {
            return Ok(Collection::singleton(false));
        }
    }
    Ok(Collection::singleton(true))
}

/// any(criteria) - true when some item makes `criteria` exactly `true`
pub fn any(ctx: &EvaluationContext, args: &[Invokee]) -> Result<Collection> {
    let (focus, criteria) = focus_and_lambda("any", ctx, args)?;
    for item in &focus {
        if criteria.is_boolean(true, &item_context(ctx, item))? {
            return Ok(Collection::singleton(true));
        }
    }
    Ok(Collection::singleton(false))
}

/// any() - true when the focus is not empty
pub fn any_item(focus: Collection) -> Result<Collection> {
    Ok(Collection::singleton(!focus.is_empty()))
}

pub(crate) fn register(table: &mut SymbolTable) {
    use EmptyPropagation::{Custom, Propagate};

    let with_lambda = Signature::function(P::Collection, &[P::Lambda]);
    table.add("where", Propagate, with_lambda.clone(), Invokee::new(where_));
    table.add("select", Propagate, with_lambda.clone(), Invokee::new(select));
    table.add("all", Custom, with_lambda.clone(), Invokee::new(all));
    table.add("any", Custom, with_lambda, Invokee::new(any));
    table.add("any", Custom, Signature::function(P::Collection, &[]), wrap1(any_item));
}
