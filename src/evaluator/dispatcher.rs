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

//! Runtime dispatch of function calls and operators
//!
//! Arguments are evaluated once here to learn their runtime types and to
//! apply empty propagation. The chosen body then receives the original,
//! unevaluated argument nodes and evaluates what it needs itself.

use smallvec::SmallVec;

use super::context::EvaluationContext;
use super::invokee::Invokee;
use crate::error::{FhirPathError, Result};
use crate::model::Collection;
use crate::registry::{SymbolEntry, standard_symbols};

type Evaluated = SmallVec<[Option<Collection>; 4]>;

/// Call `name` on the focus; `args[0]` yields the focus, the rest are parameters
pub fn dispatch_function(name: &str, ctx: &EvaluationContext, args: &[Invokee]) -> Result<Collection> {
    let Some((focus_node, parameters)) = args.split_first() else {
        return Err(FhirPathError::evaluation_error(format!(
            "function '{name}' was compiled without a focus"
        )));
    };

    let table = standard_symbols();
    let Some(entry) = table.get(name, parameters.len()) else {
        if table.contains_name(name) {
            return Err(FhirPathError::InvalidArity {
                function_name: name.to_string(),
                actual: parameters.len(),
            });
        }
        return invoke_external(name, ctx, focus_node, parameters);
    };

    let focus = focus_node.select(ctx)?;
    if focus.is_empty() && entry.propagates_empty() {
        log::trace!("{name}: empty focus propagated");
        return Ok(Collection::new());
    }

    // Parameters see the focus as `$this`
    let nested = ctx.nest(focus.clone());
    let Some(evaluated) = evaluate_parameters(entry, &nested, parameters)? else {
        log::trace!("{name}: empty argument propagated");
        return Ok(Collection::new());
    };

    let candidate = entry.resolve(name, Some(&focus), &evaluated)?;
    log::trace!("{name}: dispatching to {}", candidate.signature);
    candidate
        .body
        .invoke(ctx, args)
        .map_err(|e| FhirPathError::in_function(name, e))
}

/// Apply the operator `symbol` to `operands`
pub fn dispatch_operator(symbol: &str, ctx: &EvaluationContext, operands: &[Invokee]) -> Result<Collection> {
    let entry = standard_symbols()
        .get(symbol, operands.len())
        .ok_or_else(|| FhirPathError::UnknownFunction {
            function_name: symbol.to_string(),
        })?;

    let Some(evaluated) = evaluate_parameters(entry, ctx, operands)? else {
        log::trace!("{symbol}: empty operand propagated");
        return Ok(Collection::new());
    };

    let candidate = entry.resolve(symbol, None, &evaluated)?;
    log::trace!("{symbol}: dispatching to {}", candidate.signature);
    candidate
        .body
        .invoke(ctx, operands)
        .map_err(|e| FhirPathError::in_function(symbol, e))
}

/// Evaluate the eager parameters; `None` when an empty one propagates
fn evaluate_parameters(
    entry: &SymbolEntry,
    ctx: &EvaluationContext,
    parameters: &[Invokee],
) -> Result<Option<Evaluated>> {
    let mut evaluated = Evaluated::with_capacity(parameters.len());
    for (index, parameter) in parameters.iter().enumerate() {
        if entry.is_lazy_parameter(index) {
            evaluated.push(None);
            continue;
        }
        let value = parameter.select(ctx)?;
        if value.is_empty() && entry.propagates_empty() {
            return Ok(None);
        }
        evaluated.push(Some(value));
    }
    Ok(Some(evaluated))
}

fn invoke_external(
    name: &str,
    ctx: &EvaluationContext,
    focus_node: &Invokee,
    parameters: &[Invokee],
) -> Result<Collection> {
    let focus = focus_node.select(ctx)?;
    let nested = ctx.nest(focus.clone());
    let values = parameters
        .iter()
        .map(|p| p.select(&nested))
        .collect::<Result<Vec<_>>>()?;

    log::debug!("{name}: not built in, handing {} parameter(s) to the host", values.len());
    ctx.host().invoke_external_function(name, &focus, &values)
}
