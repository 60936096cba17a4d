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

//! FluentPath engine - the main entry point for evaluating source text

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::config::EvaluationConfig;
use super::context::{DefaultHost, EvaluationContext, EvaluationHost};
use super::expression::CompiledExpression;
use crate::error::Result;
use crate::model::{Collection, FhirPathValue, Primitive};
use crate::parser::parse;

/// Holds the evaluation host and the configuration shared by every call
///
/// Each call compiles its source text afresh; keep a [`CompiledExpression`]
/// from [`FhirPathEngine::compile`] to run one expression repeatedly.
#[derive(Clone)]
pub struct FhirPathEngine {
    host: Arc<dyn EvaluationHost>,
    config: EvaluationConfig,
}

impl Default for FhirPathEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FhirPathEngine {
    /// Create an engine with the default host and configuration
    pub fn new() -> Self {
        Self {
            host: Arc::new(DefaultHost),
            config: EvaluationConfig::default(),
        }
    }

    /// Use a custom evaluation host for constants, external functions and tracing
    pub fn with_host(mut self, host: Arc<dyn EvaluationHost>) -> Self {
        self.host = host;
        self
    }

    /// Use a custom configuration
    pub fn with_config(mut self, config: EvaluationConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Compile `source`
    pub fn compile(&self, source: &str) -> Result<CompiledExpression> {
        parse(source)
    }

    /// A context over `input` using this engine's host and configuration
    pub fn context(&self, input: impl Into<Collection>) -> EvaluationContext {
        EvaluationContext::builder(input.into())
            .with_host(Arc::clone(&self.host))
            .with_config(self.config.clone())
            .build()
    }

    /// Evaluate `source` against `input`
    pub fn evaluate(&self, source: &str, input: impl Into<Collection>) -> Result<Collection> {
        self.compile(source)?
            .evaluate_with_context(&self.context(input))
    }

    /// Evaluate `source` against `input` with `%resource` bound
    pub fn evaluate_with_resource(
        &self,
        source: &str,
        input: impl Into<Collection>,
        resource: FhirPathValue,
    ) -> Result<Collection> {
        let compiled = self.compile(source)?;
        let ctx = EvaluationContext::builder(input.into())
            .with_resource(resource)
            .with_host(Arc::clone(&self.host))
            .with_config(self.config.clone())
            .build();
        compiled.evaluate_with_context(&ctx)
    }

    /// Evaluate `source` against a JSON document, which is also bound as `%resource`
    pub fn evaluate_json(&self, source: &str, document: &Value) -> Result<Collection> {
        let input = Collection::from_json(document)?;
        match input.first().cloned() {
            Some(resource) => self.evaluate_with_resource(source, input, resource),
            None => self.evaluate(source, input),
        }
    }

    /// Evaluate `source` as a filter criterion; empty counts as `true`
    pub fn predicate(&self, source: &str, input: impl Into<Collection>) -> Result<bool> {
        self.compile(source)?.predicate(&self.context(input))
    }

    /// Whether `source` evaluates to exactly the boolean `value`
    pub fn is_boolean(&self, source: &str, value: bool, input: impl Into<Collection>) -> Result<bool> {
        self.compile(source)?
            .is_boolean(value, &self.context(input))
    }

    /// Evaluate `source` to at most one primitive value
    pub fn scalar(&self, source: &str, input: impl Into<Collection>) -> Result<Option<Primitive>> {
        self.compile(source)?.scalar(&self.context(input))
    }
}

impl fmt::Debug for FhirPathEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FhirPathEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
