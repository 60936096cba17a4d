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

//! Evaluation host and per-step evaluation context

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use super::config::EvaluationConfig;
use crate::error::{FhirPathError, Result};
use crate::model::{Collection, FhirPathValue};

/// Services an embedding application provides to running expressions
///
/// Every method has a default, so a host only overrides what it needs.
pub trait EvaluationHost: Send + Sync {
    /// Value of the `%name` constant, `None` when unknown
    ///
    /// `%context` and `%resource` are handled by the engine and never reach
    /// the host.
    fn resolve_constant(&self, name: &str) -> Option<FhirPathValue> {
        resolve_fhir_constant(name)
    }

    /// Run a function the engine does not define itself
    fn invoke_external_function(
        &self,
        name: &str,
        _focus: &Collection,
        _parameters: &[Collection],
    ) -> Result<Collection> {
        Err(FhirPathError::UnknownFunction {
            function_name: name.to_string(),
        })
    }

    /// Observe a `trace()` call
    fn trace(&self, label: &str, focus: &Collection) {
        log::info!(target: "fhirpath::trace", "{label}: {:?}", focus);
    }
}

/// Host with only the default behaviour
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHost;

impl EvaluationHost for DefaultHost {}

static FIXED_CONSTANTS: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut constants = FxHashMap::default();
    constants.insert("sct", "http://snomed.info/sct");
    constants.insert("loinc", "http://loinc.org");
    constants.insert("ucum", "http://unitsofmeasure.org");
    constants
});

const EXTENSION_PREFIX: &str = "ext-";
const VALUE_SET_PREFIX: &str = "vs-";

/// Resolve the well-known FHIR constants
///
/// `%sct`, `%loinc` and `%ucum` name code systems; `%ext-<id>` and `%vs-<id>`
/// expand to canonical extension and value set URLs.
pub fn resolve_fhir_constant(name: &str) -> Option<FhirPathValue> {
    if let Some(id) = name.strip_prefix(EXTENSION_PREFIX) {
        return Some(FhirPathValue::from(format!(
            "http://hl7.org/fhir/StructureDefinition/{id}"
        )));
    }
    if let Some(id) = name.strip_prefix(VALUE_SET_PREFIX) {
        return Some(FhirPathValue::from(format!("http://hl7.org/fhir/ValueSet/{id}")));
    }
    FIXED_CONSTANTS
        .get(name)
        .map(|url| FhirPathValue::from(*url))
}

struct Environment {
    root: Collection,
    resource: Option<FhirPathValue>,
    host: Arc<dyn EvaluationHost>,
    config: EvaluationConfig,
}

/// State visible to one evaluation step
///
/// The environment (root input, `%resource`, host, config) is shared by every
/// nested context of a run; only the focus changes from step to step.
#[derive(Clone)]
pub struct EvaluationContext {
    environment: Arc<Environment>,
    this: Collection,
}

impl EvaluationContext {
    /// Context over `input` with the default host and configuration
    pub fn new(input: Collection) -> Self {
        EvaluationContextBuilder::new(input).build()
    }

    /// Start building a context over `input`
    pub fn builder(input: Collection) -> EvaluationContextBuilder {
        EvaluationContextBuilder::new(input)
    }

    /// A context with the same environment and a different focus
    pub fn nest(&self, focus: Collection) -> Self {
        Self {
            environment: Arc::clone(&self.environment),
            this: focus,
        }
    }

    /// The current focus (`$this`)
    pub fn this(&self) -> &Collection {
        &self.this
    }

    /// The collection the whole evaluation started from (`%context`)
    pub fn root(&self) -> &Collection {
        &self.environment.root
    }

    /// The containing resource (`%resource`)
    pub fn resource(&self) -> Result<Collection> {
        self.environment
            .resource
            .clone()
            .map(Collection::from)
            .ok_or_else(|| FhirPathError::UnboundAxis {
                axis: "%resource".to_string(),
                message: "no resource was bound for this evaluation".to_string(),
            })
    }

    /// Resolve a `%name` constant
    pub fn resolve_constant(&self, name: &str) -> Result<Collection> {
        match name {
            "context" => Ok(self.root().clone()),
            "resource" => self.resource(),
            _ => self
                .environment
                .host
                .resolve_constant(name)
                .map(Collection::from)
                .ok_or_else(|| FhirPathError::UnknownConstant {
                    name: name.to_string(),
                }),
        }
    }

    /// The evaluation host
    pub fn host(&self) -> &dyn EvaluationHost {
        self.environment.host.as_ref()
    }

    /// The evaluation configuration
    pub fn config(&self) -> &EvaluationConfig {
        &self.environment.config
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("this", &self.this)
            .field("root", &self.environment.root)
            .field("resource", &self.environment.resource)
            .field("config", &self.environment.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`EvaluationContext`]
pub struct EvaluationContextBuilder {
    input: Collection,
    resource: Option<FhirPathValue>,
    host: Arc<dyn EvaluationHost>,
    config: EvaluationConfig,
}

impl EvaluationContextBuilder {
    /// Start with the default host and configuration
    pub fn new(input: Collection) -> Self {
        Self {
            input,
            resource: None,
            host: Arc::new(DefaultHost),
            config: EvaluationConfig::default(),
        }
    }

    /// Bind `%resource`
    pub fn with_resource(mut self, resource: FhirPathValue) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Use a custom evaluation host
    pub fn with_host(mut self, host: Arc<dyn EvaluationHost>) -> Self {
        self.host = host;
        self
    }

    /// Use a custom configuration
    pub fn with_config(mut self, config: EvaluationConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish building
    pub fn build(self) -> EvaluationContext {
        EvaluationContext {
            environment: Arc::new(Environment {
                root: self.input.clone(),
                resource: self.resource,
                host: self.host,
                config: self.config,
            }),
            this: self.input,
        }
    }
}
