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

//! Tree navigation: member steps, `children()`, `descendants()`, `parent()`
//!
//! Constants in the focus have no position in a document and are skipped.

use crate::error::{FhirPathError, Result};
use crate::evaluator::{EvaluationConfig, EvaluationContext, Invokee};
use crate::model::{Collection, FhirPathValue, Node, coerce};
use crate::registry::{EmptyPropagation, ParamType as P, Signature, SymbolTable, wrap1, wrap2};

const EXTENSION: &str = "extension";
const EXTENSION_URL: &str = "url";

fn elements(focus: &Collection) -> impl Iterator<Item = &Node> {
    focus.iter().filter_map(FhirPathValue::as_element)
}

fn into_collection(nodes: impl IntoIterator<Item = Node>) -> Collection {
    nodes.into_iter().map(FhirPathValue::Element).collect()
}

fn names_a_type(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Member step `name`: the children called `name` of every element
///
/// With type-prefix matching on, a capitalised name equal to an element's
/// type selects the element itself, so `Patient.name` works on a Patient.
pub fn member(focus: &Collection, name: &str, config: &EvaluationConfig) -> Collection {
    let match_type = config.type_prefix_matching && names_a_type(name);
    let mut result = Collection::new();
    for node in elements(focus) {
        if match_type && node.type_name() == name {
            result.push(FhirPathValue::Element(node.clone()));
        } else {
            result.extend(into_collection(node.children_named(name)));
        }
    }
    result
}

/// children() - all direct children in document order
pub fn children(focus: Collection) -> Result<Collection> {
    Ok(into_collection(elements(&focus).flat_map(Node::children)))
}

/// descendants() - all nodes below the focus, depth-first pre-order
pub fn descendants(ctx: &EvaluationContext, args: &[Invokee]) -> Result<Collection> {
    let [focus] = args else {
        return Err(FhirPathError::InvalidArity {
            function_name: "descendants".to_string(),
            actual: args.len().saturating_sub(1),
        });
    };
    let focus = focus.select(ctx)?;
    let max_depth = ctx.config().max_descendant_depth;
    let mut result = Collection::new();
    for node in elements(&focus) {
        result.extend(into_collection(node.descendants(max_depth)?));
    }
    Ok(result)
}

/// parent() - the parent of every element that has one
pub fn parent(focus: Collection) -> Result<Collection> {
    Ok(into_collection(elements(&focus).filter_map(Node::parent)))
}

/// extension(url) - extensions whose `url` child equals `url`
pub fn extension(focus: Collection, url: Collection) -> Result<Collection> {
    let url = coerce::<String>(&url)?;
    let matching = elements(&focus)
        .flat_map(|node| node.children_named(EXTENSION))
        .filter(|ext| {
            ext.children_named(EXTENSION_URL)
                .iter()
                .any(|u| u.value().as_ref().and_then(|v| v.as_str()) == Some(url.as_str()))
        });
    Ok(into_collection(matching))
}

pub(crate) fn register(table: &mut SymbolTable) {
    use EmptyPropagation::Propagate;

    let on_collection = Signature::function(P::Collection, &[]);
    table.add("children", Propagate, on_collection.clone(), wrap1(children));
    table.add("descendants", Propagate, on_collection.clone(), Invokee::new(descendants));
    table.add("parent", Propagate, on_collection, wrap1(parent));
    table.add(
        "extension",
        Propagate,
        Signature::function(P::Collection, &[P::String]),
        wrap2(extension),
    );
}
