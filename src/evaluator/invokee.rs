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

//! Compiled expression nodes
//!
//! The parser turns source text straight into a tree of [`Invokee`]s. Each
//! node is a closure that receives the evaluation context and the still
//! unevaluated argument nodes, so a function body decides itself when (and in
//! which context) to evaluate each argument. That is what makes `where()` and
//! the short-circuiting boolean operators possible.

use std::fmt;
use std::sync::Arc;

use super::context::EvaluationContext;
use super::dispatcher;
use crate::error::Result;
use crate::model::{Collection, FhirPathValue, boolean_eval};
use crate::registry::functions::navigation;

type InvokeeFn = dyn Fn(&EvaluationContext, &[Invokee]) -> Result<Collection> + Send + Sync;

/// A compiled expression node
///
/// Cloning shares the underlying closure.
#[derive(Clone)]
pub struct Invokee(Arc<InvokeeFn>);

impl Invokee {
    /// Wrap a closure
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&EvaluationContext, &[Invokee]) -> Result<Collection> + Send + Sync + 'static,
    {
        Self(Arc::new(body))
    }

    /// Run this node with explicit argument nodes
    pub fn invoke(&self, ctx: &EvaluationContext, args: &[Invokee]) -> Result<Collection> {
        (self.0)(ctx, args)
    }

    /// Evaluate this node as a sub-expression (no arguments)
    pub fn select(&self, ctx: &EvaluationContext) -> Result<Collection> {
        self.invoke(ctx, &[])
    }

    /// Evaluate as a filter criterion: empty counts as `true`
    pub fn predicate(&self, ctx: &EvaluationContext) -> Result<bool> {
        Ok(boolean_eval(&self.select(ctx)?)?.unwrap_or(true))
    }

    /// Whether the result is exactly the boolean `value`; empty never matches
    pub fn is_boolean(&self, value: bool, ctx: &EvaluationContext) -> Result<bool> {
        Ok(boolean_eval(&self.select(ctx)?)? == Some(value))
    }

    /// A node that always yields `value`
    pub fn literal(value: impl Into<FhirPathValue>) -> Self {
        let result = Collection::singleton(value);
        Self::new(move |_, _| Ok(result.clone()))
    }

    /// The current focus (`$this`)
    pub fn this() -> Self {
        Self::new(|ctx, _| Ok(ctx.this().clone()))
    }

    /// A `%name` constant
    pub fn constant(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(move |ctx, _| ctx.resolve_constant(&name))
    }

    /// Children named `name` of every element in the focus
    pub fn member(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(move |ctx, _| Ok(navigation::member(ctx.this(), &name, ctx.config())))
    }

    /// Feed the result of `self` as focus into `next`
    pub fn then(self, next: Invokee) -> Self {
        Self::new(move |ctx, args| {
            let focus = self.select(ctx)?;
            next.invoke(&ctx.nest(focus), args)
        })
    }

    /// A function call on the current focus
    pub fn function(name: impl Into<String>, parameters: Vec<Invokee>) -> Self {
        let name = name.into();
        let mut args = Vec::with_capacity(parameters.len() + 1);
        args.push(Self::this());
        args.extend(parameters);
        Self::new(move |ctx, _| dispatcher::dispatch_function(&name, ctx, &args))
    }

    /// An operator applied to `operands`
    pub fn operator(symbol: &'static str, operands: Vec<Invokee>) -> Self {
        Self::new(move |ctx, _| dispatcher::dispatch_operator(symbol, ctx, &operands))
    }
}

impl fmt::Debug for Invokee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invokee")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> EvaluationContext {
        EvaluationContext::new(Collection::singleton(5i64))
    }

    #[test]
    fn test_literal_and_this() {
        let ctx = ctx();
        assert_eq!(Invokee::literal("a").select(&ctx).unwrap().to_strings(), vec!["a"]);
        assert_eq!(Invokee::this().select(&ctx).unwrap().to_strings(), vec!["5"]);
    }

    #[test]
    fn test_predicate_and_is_boolean_on_empty() {
        let ctx = ctx();
        let empty = Invokee::new(|_, _| Ok(Collection::new()));
        assert!(empty.predicate(&ctx).unwrap());
        assert!(!empty.is_boolean(true, &ctx).unwrap());
        assert!(!empty.is_boolean(false, &ctx).unwrap());
    }

    #[test]
    fn test_then_nests_focus() {
        let ctx = ctx();
        let chain = Invokee::literal("x").then(Invokee::this());
        assert_eq!(chain.select(&ctx).unwrap().to_strings(), vec!["x"]);
    }
}
