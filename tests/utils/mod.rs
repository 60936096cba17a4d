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

//! Shared fixtures for integration tests

#![allow(dead_code)]

use octofhir_fluentpath::{Collection, FhirPathEngine};
use serde_json::{Value, json};

/// Install a test logger once per test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Patient with two names, a telecom entry and one extension
pub fn create_test_patient() -> Value {
    json!({
        "resourceType": "Patient",
        "id": "example",
        "active": true,
        "gender": "male",
        "birthDate": "1974-12-25",
        "multipleBirthInteger": 2,
        "name": [
            {
                "use": "official",
                "family": "Chalmers",
                "given": ["Peter", "James"]
            },
            {
                "use": "usual",
                "given": ["Jim"]
            }
        ],
        "telecom": [
            {"system": "phone", "value": "(03) 5555 6473", "use": "work"}
        ],
        "extension": [
            {"url": "http://example.org/ext/race", "valueString": "unknown"}
        ]
    })
}

/// The test patient as an input collection
pub fn patient() -> Collection {
    Collection::from_json(&create_test_patient()).unwrap()
}

/// Evaluate against the test patient and render every item as a string
pub fn eval_patient(source: &str) -> Vec<String> {
    init_logging();
    FhirPathEngine::new()
        .evaluate(source, patient())
        .unwrap_or_else(|e| panic!("'{source}' failed: {e}"))
        .to_strings()
}

/// Evaluate without any input and render every item as a string
pub fn eval(source: &str) -> Vec<String> {
    init_logging();
    FhirPathEngine::new()
        .evaluate(source, Collection::new())
        .unwrap_or_else(|e| panic!("'{source}' failed: {e}"))
        .to_strings()
}

/// Evaluate without any input and report the type name of every item
pub fn eval_types(source: &str) -> Vec<String> {
    type_names(FhirPathEngine::new().evaluate(source, Collection::new()), source)
}

/// Evaluate against the test patient and report the type name of every item
pub fn eval_patient_types(source: &str) -> Vec<String> {
    type_names(FhirPathEngine::new().evaluate(source, patient()), source)
}

fn type_names(result: octofhir_fluentpath::Result<Collection>, source: &str) -> Vec<String> {
    init_logging();
    result
        .unwrap_or_else(|e| panic!("'{source}' failed: {e}"))
        .iter()
        .map(|item| item.type_name().to_string())
        .collect()
}

/// Shorthand for expected string lists
pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
