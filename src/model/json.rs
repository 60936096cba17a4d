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

//! Loading FHIR JSON into a [`DocumentTree`]
//!
//! Arrays become repeated siblings with the same name, `resourceType` names the
//! type of the object it appears in, and keys starting with `_` (primitive
//! extensions) are skipped. Leaf types come from the JSON kind.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};

use super::navigator::Node;
use super::tree::{DocumentTree, DocumentTreeBuilder, NodeId};
use super::value::{Collection, FhirPathValue, Primitive};
use crate::error::{FhirPathError, Result};

const RESOURCE_TYPE: &str = "resourceType";
const ELEMENT_TYPE: &str = "Element";

impl DocumentTree {
    /// Build a tree from a JSON object
    pub fn from_json(json: &Value) -> Result<Arc<DocumentTree>> {
        let Value::Object(object) = json else {
            return Err(FhirPathError::conversion("document", json_kind(json)));
        };
        let type_name = resource_type(object).unwrap_or(ELEMENT_TYPE);
        let mut builder = DocumentTreeBuilder::new(type_name, type_name);
        add_members(&mut builder, DocumentTree::ROOT, object)?;
        Ok(builder.build())
    }

    /// Parse JSON text and build a tree from it
    pub fn from_json_str(text: &str) -> Result<Arc<DocumentTree>> {
        let json: Value = serde_json::from_str(text)
            .map_err(|e| FhirPathError::evaluation_error(format!("Invalid JSON input: {e}")))?;
        Self::from_json(&json)
    }
}

impl Collection {
    /// A collection holding the root element of a JSON document
    pub fn from_json(json: &Value) -> Result<Collection> {
        let tree = DocumentTree::from_json(json)?;
        Ok(Collection::singleton(FhirPathValue::Element(tree.root())))
    }
}

impl From<Arc<DocumentTree>> for Node {
    fn from(tree: Arc<DocumentTree>) -> Self {
        tree.root()
    }
}

fn resource_type(object: &Map<String, Value>) -> Option<&str> {
    object.get(RESOURCE_TYPE).and_then(Value::as_str)
}

fn json_kind(json: &Value) -> &'static str {
    match json {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn add_members(
    builder: &mut DocumentTreeBuilder,
    parent: NodeId,
    object: &Map<String, Value>,
) -> Result<()> {
    for (key, value) in object {
        if key == RESOURCE_TYPE || key.starts_with('_') {
            continue;
        }
        match value {
            Value::Array(items) => {
                for item in items {
                    add_value(builder, parent, key, item)?;
                }
            }
            other => add_value(builder, parent, key, other)?,
        }
    }
    Ok(())
}

fn add_value(builder: &mut DocumentTreeBuilder, parent: NodeId, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Object(object) => {
            let type_name = resource_type(object).unwrap_or(ELEMENT_TYPE);
            let id = builder.add_child(parent, name, type_name, None);
            add_members(builder, id, object)?;
        }
        Value::Array(items) => {
            for item in items {
                add_value(builder, parent, name, item)?;
            }
        }
        leaf => {
            let primitive = leaf_primitive(leaf)?;
            builder.add_child(parent, name, primitive.type_name(), Some(primitive));
        }
    }
    Ok(())
}

fn leaf_primitive(value: &Value) -> Result<Primitive> {
    match value {
        Value::Bool(b) => Ok(Primitive::Boolean(*b)),
        Value::Number(n) => number_primitive(n),
        Value::String(s) => Ok(Primitive::String(s.clone())),
        other => Err(FhirPathError::conversion("primitive", json_kind(other))),
    }
}

fn number_primitive(number: &Number) -> Result<Primitive> {
    if let Some(i) = number.as_i64() {
        return Ok(Primitive::Integer(i));
    }
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Primitive::Decimal)
        .map_err(|_| FhirPathError::conversion("decimal", format!("number {text}")))
}
