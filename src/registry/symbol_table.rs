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

//! Symbol table mapping `(name, arity)` to candidate implementations
//!
//! A name may have several candidates with the same arity (for example `+`
//! on integers, decimals and strings). The dispatcher scores each candidate
//! against the runtime argument types and runs the most specific one.

use rustc_hash::{FxHashMap, FxHashSet};

use super::signature::Signature;
use crate::error::{FhirPathError, Result};
use crate::evaluator::Invokee;
use crate::model::Collection;

/// Empty value propagation behavior for functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmptyPropagation {
    /// Empty focus or empty eagerly evaluated argument yields empty without
    /// running the body
    Propagate,
    /// The body decides what empty inputs mean
    Custom,
}

/// One implementation of a name
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Declared focus and parameter types
    pub signature: Signature,
    /// The implementation; receives the original argument nodes
    pub body: Invokee,
}

/// All candidates registered under one `(name, arity)` key
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    propagation: EmptyPropagation,
    candidates: Vec<Candidate>,
}

impl SymbolEntry {
    /// Empty-propagation behavior shared by all candidates
    pub fn propagation(&self) -> EmptyPropagation {
        self.propagation
    }

    /// Whether empty inputs short-circuit to an empty result
    pub fn propagates_empty(&self) -> bool {
        self.propagation == EmptyPropagation::Propagate
    }

    /// Registered candidates in registration order
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Whether any candidate leaves parameter `index` unevaluated
    pub fn is_lazy_parameter(&self, index: usize) -> bool {
        self.candidates.iter().any(|c| {
            c.signature
                .parameters
                .get(index)
                .is_some_and(|p| p.is_lazy())
        })
    }

    /// Pick the most specific candidate for the runtime arguments
    pub fn resolve(
        &self,
        name: &str,
        focus: Option<&Collection>,
        parameters: &[Option<Collection>],
    ) -> Result<&Candidate> {
        let mut best: Option<(u32, &Candidate)> = None;
        let mut ties = 0usize;

        for candidate in &self.candidates {
            let Some(score) = candidate.signature.score(focus, parameters) else {
                continue;
            };
            match best {
                Some((top, _)) if score < top => {}
                Some((top, _)) if score == top => ties += 1,
                _ => {
                    best = Some((score, candidate));
                    ties = 1;
                }
            }
        }

        match best {
            Some((_, candidate)) if ties == 1 => Ok(candidate),
            Some(_) => Err(FhirPathError::AmbiguousSignature {
                function_name: name.to_string(),
                signature: describe_call(focus, parameters),
                candidates: ties,
            }),
            None => Err(FhirPathError::NoMatchingSignature {
                function_name: name.to_string(),
                signature: describe_call(focus, parameters),
            }),
        }
    }
}

/// Describe runtime argument types for diagnostics
pub fn describe_call(focus: Option<&Collection>, parameters: &[Option<Collection>]) -> String {
    let parameter_types: Vec<String> = parameters
        .iter()
        .map(|p| match p {
            Some(collection) => collection.describe_type(),
            None => "expression".to_string(),
        })
        .collect();

    match focus {
        Some(focus) => format!(
            "on focus of type '{}' with parameters of type '{}'",
            focus.describe_type(),
            parameter_types.join(", ")
        ),
        None => format!("with operands of type '{}'", parameter_types.join(", ")),
    }
}

/// Dispatch table of all known functions and operators
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: FxHashMap<(String, usize), SymbolEntry>,
    names: FxHashSet<String>,
}

impl SymbolTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate under `name`
    ///
    /// The propagation behavior of the first candidate registered for a
    /// `(name, arity)` key applies to the whole entry.
    pub fn add(&mut self, name: &str, propagation: EmptyPropagation, signature: Signature, body: Invokee) {
        let key = (name.to_string(), signature.arity());
        let entry = self.entries.entry(key).or_insert_with(|| SymbolEntry {
            propagation,
            candidates: Vec::new(),
        });
        debug_assert_eq!(
            entry.propagation, propagation,
            "mixed empty propagation registered for '{name}'"
        );
        entry.candidates.push(Candidate { signature, body });
        self.names.insert(name.to_string());
    }

    /// Look up the entry for `name` called with `arity` parameters
    pub fn get(&self, name: &str, arity: usize) -> Option<&SymbolEntry> {
        self.entries.get(&(name.to_string(), arity))
    }

    /// Whether `name` is registered under any arity
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of `(name, arity)` entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::signature::ParamType;

    fn constant(text: &'static str) -> Invokee {
        Invokee::new(move |_, _| Ok(Collection::singleton(text)))
    }

    fn table() -> SymbolTable {
        let mut table = SymbolTable::new();
        table.add(
            "f",
            EmptyPropagation::Propagate,
            Signature::function(ParamType::Collection, &[ParamType::Integer]),
            constant("int"),
        );
        table.add(
            "f",
            EmptyPropagation::Propagate,
            Signature::function(ParamType::Collection, &[ParamType::Decimal]),
            constant("dec"),
        );
        table.add(
            "g",
            EmptyPropagation::Custom,
            Signature::function(ParamType::Collection, &[ParamType::Value]),
            constant("g1"),
        );
        table.add(
            "g",
            EmptyPropagation::Custom,
            Signature::function(ParamType::Collection, &[ParamType::Value]),
            constant("g2"),
        );
        table
    }

    #[test]
    fn test_lookup_by_name_and_arity() {
        let table = table();
        assert!(table.get("f", 1).is_some());
        assert!(table.get("f", 0).is_none());
        assert!(table.contains_name("f"));
        assert!(!table.contains_name("h"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_resolve_most_specific() {
        let table = table();
        let entry = table.get("f", 1).unwrap();
        let focus = Collection::new();

        let chosen = entry
            .resolve("f", Some(&focus), &[Some(Collection::singleton(1i64))])
            .unwrap();
        assert_eq!(chosen.signature.parameters, vec![ParamType::Integer]);
    }

    #[test]
    fn test_resolve_no_match_names_types() {
        let table = table();
        let entry = table.get("f", 1).unwrap();
        let err = entry
            .resolve("f", Some(&Collection::singleton("x")), &[Some(Collection::singleton("y"))])
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'string'"), "{message}");
        assert!(matches!(err, FhirPathError::NoMatchingSignature { .. }));
    }

    #[test]
    fn test_resolve_ambiguous() {
        let table = table();
        let entry = table.get("g", 1).unwrap();
        let err = entry
            .resolve("g", Some(&Collection::new()), &[Some(Collection::singleton(1i64))])
            .unwrap_err();
        assert!(matches!(err, FhirPathError::AmbiguousSignature { candidates: 2, .. }));
    }
}
