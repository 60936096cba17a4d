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

//! FluentPath (FHIRPath) expression engine
//!
//! Expressions are compiled straight into closure trees and evaluated against
//! any document that implements the [`Navigator`] contract. A JSON-backed
//! document tree is included.
//!
//! ```
//! use octofhir_fluentpath::{FhirPathEngine, Collection};
//! use serde_json::json;
//!
//! let patient = json!({
//!     "resourceType": "Patient",
//!     "name": [{"given": ["Peter", "James"]}, {"given": ["Jim"]}]
//! });
//!
//! let engine = FhirPathEngine::new();
//! let input = Collection::from_json(&patient).unwrap();
//! let result = engine.evaluate("Patient.name.given.count()", input).unwrap();
//! assert_eq!(result.to_strings(), vec!["3"]);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod registry;

pub use error::{ErrorKind, FhirPathError, Result};
pub use evaluator::{
    CompiledExpression, DefaultHost, EvaluationConfig, EvaluationContext, EvaluationHost,
    FhirPathEngine, Invokee,
};
pub use model::{
    Collection, DocumentTree, DocumentTreeBuilder, FhirPathValue, Navigator, Node,
    PartialDateTime, PartialTime, Primitive,
};
pub use parser::parse;
pub use registry::{SymbolTable, standard_symbols};
