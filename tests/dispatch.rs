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

//! Runtime dispatch, evaluation host hooks and semantic errors

mod utils;

use std::sync::{Arc, Mutex};

use octofhir_fluentpath::{
    Collection, EvaluationContext, EvaluationHost, FhirPathEngine, FhirPathError, FhirPathValue,
    Result, parse,
};
use pretty_assertions::assert_eq;
use utils::{init_logging, patient, strings};

fn eval_err(source: &str) -> FhirPathError {
    init_logging();
    FhirPathEngine::new()
        .evaluate(source, patient())
        .expect_err(source)
}

#[test]
fn test_no_matching_signature_names_runtime_types() {
    let err = eval_err("'abc'.substring('x')");
    assert_eq!(
        err,
        FhirPathError::NoMatchingSignature {
            function_name: "substring".to_string(),
            signature: "on focus of type 'string' with parameters of type 'string'".to_string(),
        }
    );
    assert!(err.to_string().contains("substring"));
}

#[test]
fn test_operator_mismatch_names_operand_types() {
    let err = eval_err("1 + true");
    assert_eq!(
        err,
        FhirPathError::NoMatchingSignature {
            function_name: "+".to_string(),
            signature: "with operands of type 'integer, boolean'".to_string(),
        }
    );
}

#[test]
fn test_multi_item_focus_does_not_fit_scalar_slot() {
    let err = eval_err("Patient.name.given.startsWith('P')");
    assert!(matches!(
        err,
        FhirPathError::NoMatchingSignature { ref function_name, .. } if function_name == "startsWith"
    ));
}

#[test]
fn test_wrong_arity_of_known_function() {
    assert_eq!(
        eval_err("Patient.name.first(1)"),
        FhirPathError::InvalidArity {
            function_name: "first".to_string(),
            actual: 1,
        }
    );
}

#[test]
fn test_unknown_function_without_host_support() {
    assert_eq!(
        eval_err("Patient.frobnicate()"),
        FhirPathError::UnknownFunction {
            function_name: "frobnicate".to_string(),
        }
    );
}

#[test]
fn test_unknown_constant() {
    assert_eq!(
        eval_err("%nope"),
        FhirPathError::UnknownConstant {
            name: "nope".to_string(),
        }
    );
}

#[test]
fn test_unbound_resource() {
    let err = eval_err("%resource.id");
    assert!(matches!(err, FhirPathError::UnboundAxis { ref axis, .. } if axis == "%resource"));
    assert!(err.is_semantic());
}

#[test]
fn test_resource_binding() {
    let engine = FhirPathEngine::new();
    let input = patient();
    let resource = input.first().cloned().unwrap();
    let result = engine
        .evaluate_with_resource("Patient.name.where(%resource.active).count()", input, resource)
        .unwrap();
    assert_eq!(result.to_strings(), strings(&["2"]));
}

#[test]
fn test_faults_inside_bodies_are_wrapped() {
    let err = eval_err("Patient.name.where(%nope)");
    assert!(matches!(err, FhirPathError::FunctionError { ref function_name, .. } if function_name == "where"));
    assert_eq!(
        err.root_cause(),
        &FhirPathError::UnknownConstant {
            name: "nope".to_string(),
        }
    );
}

#[test]
fn test_cardinality_error_for_multi_item_criteria() {
    let err = eval_err("Patient.where(name.use)");
    assert!(matches!(err.root_cause(), FhirPathError::Cardinality { actual: 2, .. }));
}

#[test]
fn test_integer_slot_rejects_decimal() {
    let err = eval_err("Patient.name.skip(1.5)");
    assert!(matches!(err, FhirPathError::NoMatchingSignature { ref function_name, .. } if function_name == "skip"));
}

#[derive(Default)]
struct TestHost {
    traces: Mutex<Vec<(String, Vec<String>)>>,
}

impl EvaluationHost for TestHost {
    fn resolve_constant(&self, name: &str) -> Option<FhirPathValue> {
        match name {
            "answer" => Some(FhirPathValue::from(42i64)),
            other => octofhir_fluentpath::evaluator::resolve_fhir_constant(other),
        }
    }

    fn invoke_external_function(
        &self,
        name: &str,
        focus: &Collection,
        parameters: &[Collection],
    ) -> Result<Collection> {
        match name {
            "shout" => Ok(focus
                .iter()
                .map(|item| FhirPathValue::from(item.to_string_representation().to_uppercase()))
                .collect()),
            "countParams" => Ok(Collection::singleton(parameters.len() as i64)),
            _ => Err(FhirPathError::UnknownFunction {
                function_name: name.to_string(),
            }),
        }
    }

    fn trace(&self, label: &str, focus: &Collection) {
        if let Ok(mut traces) = self.traces.lock() {
            traces.push((label.to_string(), focus.to_strings()));
        }
    }
}

fn engine_with(host: Arc<TestHost>) -> FhirPathEngine {
    init_logging();
    FhirPathEngine::new().with_host(host)
}

#[test]
fn test_host_constants() {
    let engine = engine_with(Arc::new(TestHost::default()));
    assert_eq!(
        engine.evaluate("%answer + 1", Collection::new()).unwrap().to_strings(),
        strings(&["43"])
    );
    assert_eq!(
        engine.evaluate("%loinc", Collection::new()).unwrap().to_strings(),
        strings(&["http://loinc.org"])
    );
}

#[test]
fn test_external_functions() {
    let engine = engine_with(Arc::new(TestHost::default()));
    assert_eq!(
        engine.evaluate("Patient.name.given.shout()", patient()).unwrap().to_strings(),
        strings(&["PETER", "JAMES", "JIM"])
    );
    assert_eq!(
        engine.evaluate("countParams(1, 'a', true)", patient()).unwrap().to_strings(),
        strings(&["3"])
    );
}

#[test]
fn test_trace_reports_to_host_and_passes_focus_through() {
    let host = Arc::new(TestHost::default());
    let engine = engine_with(Arc::clone(&host));

    let result = engine
        .evaluate("Patient.name.given.trace('given').count()", patient())
        .unwrap();
    assert_eq!(result.to_strings(), strings(&["3"]));

    engine
        .evaluate("Patient.gender.log('gender')", patient())
        .unwrap();

    let traces = host.traces.lock().unwrap();
    assert_eq!(
        *traces,
        vec![
            ("given".to_string(), strings(&["Peter", "James", "Jim"])),
            ("gender".to_string(), strings(&["male"])),
        ]
    );
}

#[test]
fn test_compiled_expression_is_shareable_across_threads() {
    let expression = parse("Patient.name.given.count()").unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let expression = expression.clone();
            std::thread::spawn(move || {
                let ctx = EvaluationContext::new(patient());
                expression.evaluate_with_context(&ctx).unwrap().to_strings()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), strings(&["3"]));
    }
}
