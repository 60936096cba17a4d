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

//! Expression evaluation
//!
//! Compiled expressions are trees of [`Invokee`] closures. Calls to functions
//! and operators go through the dispatcher, which picks a candidate body by the
//! runtime types of the evaluated operands.

#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod expression;
pub mod invokee;

pub use config::EvaluationConfig;
pub use context::{
    DefaultHost, EvaluationContext, EvaluationContextBuilder, EvaluationHost,
    resolve_fhir_constant,
};
pub use engine::FhirPathEngine;
pub use expression::CompiledExpression;
pub use invokee::Invokee;
