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

//! Utility functions: `not()`, `trace()`, `today()`, `now()`

use crate::error::{FhirPathError, Result};
use crate::evaluator::{EvaluationContext, Invokee};
use crate::model::{Collection, PartialDateTime, boolean_eval, coerce};
use crate::registry::{EmptyPropagation, ParamType as P, Signature, SymbolTable, wrap1};

/// not() - boolean negation, empty stays empty
pub fn not(focus: Collection) -> Result<Collection> {
    Ok(boolean_eval(&focus)?
        .map(|b| Collection::singleton(!b))
        .unwrap_or_default())
}

/// trace(label) - hand the focus to the host's trace hook and return it unchanged
pub fn trace(ctx: &EvaluationContext, args: &[Invokee]) -> Result<Collection> {
    let [focus, label] = args else {
        return Err(FhirPathError::InvalidArity {
            function_name: "trace".to_string(),
            actual: args.len().saturating_sub(1),
        });
    };
    let focus = focus.select(ctx)?;
    let label = coerce::<String>(&label.select(ctx)?)?;
    ctx.host().trace(&label, &focus);
    Ok(focus)
}

/// today() - the current date
pub fn today(_focus: Collection) -> Result<Collection> {
    Ok(Collection::singleton(PartialDateTime::today()))
}

/// now() - the current date and time
pub fn now(_focus: Collection) -> Result<Collection> {
    Ok(Collection::singleton(PartialDateTime::now()))
}

pub(crate) fn register(table: &mut SymbolTable) {
    use EmptyPropagation::Custom;

    let on_collection = Signature::function(P::Collection, &[]);
    table.add("not", Custom, on_collection.clone(), wrap1(not));
    table.add("today", Custom, on_collection.clone(), wrap1(today));
    table.add("now", Custom, on_collection, wrap1(now));

    let with_label = Signature::function(P::Collection, &[P::String]);
    for name in ["trace", "log"] {
        table.add(name, Custom, with_label.clone(), Invokee::new(trace));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvaluationHost;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_not_is_three_valued() {
        assert_eq!(not(Collection::singleton(true)).unwrap().to_strings(), vec!["false"]);
        assert_eq!(not(Collection::singleton(false)).unwrap().to_strings(), vec!["true"]);
        assert!(not(Collection::new()).unwrap().is_empty());
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, usize)>>);

    impl EvaluationHost for Recorder {
        fn trace(&self, label: &str, focus: &Collection) {
            if let Ok(mut calls) = self.0.lock() {
                calls.push((label.to_string(), focus.len()));
            }
        }
    }

    #[test]
    fn test_trace_returns_focus_and_calls_host() {
        let recorder = Arc::new(Recorder::default());
        let focus: Collection = vec![1i64.into(), 2i64.into()].into();
        let ctx = EvaluationContext::builder(focus)
            .with_host(recorder.clone())
            .build();

        let result = trace(&ctx, &[Invokee::this(), Invokee::literal("checkpoint")]).unwrap();
        assert_eq!(result.to_strings(), vec!["1", "2"]);
        assert_eq!(*recorder.0.lock().unwrap(), vec![("checkpoint".to_string(), 2)]);
    }

    #[test]
    fn test_today_has_day_precision() {
        let result = today(Collection::new()).unwrap();
        assert_eq!(result.describe_type(), "dateTime");
        assert_eq!(result.to_strings()[0].len(), "2024-01-01".len());
    }
}
