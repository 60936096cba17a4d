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

//! Compiled expressions ready to run against any input

use std::fmt;
use std::sync::Arc;

use super::context::EvaluationContext;
use super::invokee::Invokee;
use crate::error::{FhirPathError, Result};
use crate::model::{Collection, Primitive, single};

/// A parsed expression together with its source text
///
/// Cloning is cheap; the compiled node tree is shared.
#[derive(Clone)]
pub struct CompiledExpression {
    source: Arc<str>,
    root: Invokee,
}

impl CompiledExpression {
    /// Wrap a compiled node
    pub fn new(source: &str, root: Invokee) -> Self {
        Self {
            source: Arc::from(source),
            root,
        }
    }

    /// The source text this expression was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The root expression node
    pub fn root(&self) -> &Invokee {
        &self.root
    }

    /// Evaluate with `input` bound as both the focus and `%context`
    pub fn evaluate(&self, input: impl Into<Collection>) -> Result<Collection> {
        self.evaluate_with_context(&EvaluationContext::new(input.into()))
    }

    /// Evaluate in a prepared context
    pub fn evaluate_with_context(&self, ctx: &EvaluationContext) -> Result<Collection> {
        self.root.select(ctx)
    }

    /// Evaluate and reduce to at most one primitive value
    ///
    /// An element result yields its leaf value, if it has one. More than one
    /// item is a cardinality error.
    pub fn scalar(&self, ctx: &EvaluationContext) -> Result<Option<Primitive>> {
        let result = self.evaluate_with_context(ctx)?;
        if result.is_empty() {
            return Ok(None);
        }
        Ok(single(&result, "scalar")?.value())
    }

    /// Evaluate as a filter criterion: empty counts as `true`
    pub fn predicate(&self, ctx: &EvaluationContext) -> Result<bool> {
        self.root.predicate(ctx)
    }

    /// Whether the result is exactly the boolean `value`
    pub fn is_boolean(&self, value: bool, ctx: &EvaluationContext) -> Result<bool> {
        self.root.is_boolean(value, ctx)
    }

    /// Evaluate and require a boolean outcome; empty stays `None`
    pub fn boolean(&self, ctx: &EvaluationContext) -> Result<Option<bool>> {
        let result = self.evaluate_with_context(ctx)?;
        match result.len() {
            0 => Ok(None),
            _ => match single(&result, "boolean")?.value() {
                Some(Primitive::Boolean(b)) => Ok(Some(b)),
                _ => Err(FhirPathError::conversion("boolean", result.describe_type())),
            },
        }
    }
}

impl fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
