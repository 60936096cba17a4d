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

//! Core value types for FluentPath expressions

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::navigator::Node;
use super::temporal::{PartialDateTime, PartialTime};

/// A primitive FHIR value
///
/// Type names follow the FHIR primitive names, which is also what the
/// dispatcher reports in signature mismatch errors.
#[derive(Clone, PartialEq)]
pub enum Primitive {
    /// Boolean value
    Boolean(bool),

    /// Integer value (64-bit signed)
    Integer(i64),

    /// Decimal value with arbitrary precision
    Decimal(Decimal),

    /// String value
    String(String),

    /// Date or date-time at any precision
    DateTime(PartialDateTime),

    /// Time of day at any precision
    Time(PartialTime),
}

impl Primitive {
    /// FHIR type name of this primitive
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::DateTime(_) => "dateTime",
            Self::Time(_) => "time",
        }
    }

    /// Canonical string form, as produced by `toString()`
    pub fn to_string_representation(&self) -> String {
        match self {
            Self::Boolean(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Decimal(d) => d.to_string(),
            Self::String(s) => s.clone(),
            Self::DateTime(dt) => dt.to_string(),
            Self::Time(t) => t.to_string(),
        }
    }

    /// Get the boolean if this is one
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the string if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read as a date-time: date-time values as-is, strings when they hold a
    /// valid date-time in literal form
    pub fn as_date_time(&self) -> Option<PartialDateTime> {
        match self {
            Self::DateTime(dt) => Some(dt.clone()),
            Self::String(s) => PartialDateTime::parse(s).ok(),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Boolean(b) => Value::Bool(*b),
            Self::Integer(i) => Value::Number((*i).into()),
            Self::Decimal(d) => d
                .to_string()
                .parse::<serde_json::Number>()
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(d.to_string())),
            Self::String(s) => Value::String(s.clone()),
            Self::DateTime(dt) => Value::String(dt.to_string()),
            Self::Time(t) => Value::String(t.to_string()),
        }
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "Boolean({b})"),
            Self::Integer(i) => write!(f, "Integer({i})"),
            Self::Decimal(d) => write!(f, "Decimal({d})"),
            Self::String(s) => write!(f, "String({s})"),
            Self::DateTime(dt) => write!(f, "DateTime({dt})"),
            Self::Time(t) => write!(f, "Time({t})"),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_representation())
    }
}

/// A single item of an evaluation result
///
/// Either a constant produced by the expression itself (literals, function
/// results) or a node of the input document reached through a navigator.
#[derive(Clone)]
pub enum FhirPathValue {
    /// A bare primitive that is not part of any document
    Constant(Primitive),

    /// A positioned node of the input document
    Element(Node),
}

impl FhirPathValue {
    /// Runtime type name: the primitive name for constants, the navigator's
    /// type for elements
    pub fn type_name(&self) -> &str {
        match self {
            Self::Constant(p) => p.type_name(),
            Self::Element(node) => node.type_name(),
        }
    }

    /// Element name, constants have none
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Constant(_) => None,
            Self::Element(node) => Some(node.name()),
        }
    }

    /// Primitive value carried by this item, if any
    pub fn value(&self) -> Option<Primitive> {
        match self {
            Self::Constant(p) => Some(p.clone()),
            Self::Element(node) => node.value(),
        }
    }

    /// Get the node if this item is a document element
    pub fn as_element(&self) -> Option<&Node> {
        match self {
            Self::Element(node) => Some(node),
            Self::Constant(_) => None,
        }
    }

    /// Whether this item is a document element
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element(_))
    }

    /// String form of the carried value, empty for value-less elements
    pub fn to_string_representation(&self) -> String {
        self.value()
            .map(|p| p.to_string_representation())
            .unwrap_or_default()
    }

    /// Render this item as JSON
    pub fn to_json(&self) -> Value {
        match self {
            Self::Constant(p) => p.to_json(),
            Self::Element(node) => node_to_json(node),
        }
    }
}

fn node_to_json(node: &Node) -> Value {
    let children = node.children();
    if children.is_empty() {
        return node.value().map(|p| p.to_json()).unwrap_or(Value::Null);
    }

    let mut object = serde_json::Map::new();
    if let Some(value) = node.value() {
        object.insert("value".to_string(), value.to_json());
    }
    for child in &children {
        let rendered = node_to_json(child);
        match object.get_mut(child.name()) {
            Some(Value::Array(items)) => items.push(rendered),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, rendered]);
            }
            None => {
                object.insert(child.name().to_string(), rendered);
            }
        }
    }
    Value::Object(object)
}

impl From<Primitive> for FhirPathValue {
    fn from(value: Primitive) -> Self {
        Self::Constant(value)
    }
}

impl From<Node> for FhirPathValue {
    fn from(node: Node) -> Self {
        Self::Element(node)
    }
}

impl From<bool> for FhirPathValue {
    fn from(value: bool) -> Self {
        Self::Constant(Primitive::Boolean(value))
    }
}

impl From<i64> for FhirPathValue {
    fn from(value: i64) -> Self {
        Self::Constant(Primitive::Integer(value))
    }
}

impl From<Decimal> for FhirPathValue {
    fn from(value: Decimal) -> Self {
        Self::Constant(Primitive::Decimal(value))
    }
}

impl From<String> for FhirPathValue {
    fn from(value: String) -> Self {
        Self::Constant(Primitive::String(value))
    }
}

impl From<&str> for FhirPathValue {
    fn from(value: &str) -> Self {
        Self::Constant(Primitive::String(value.to_string()))
    }
}

impl From<PartialDateTime> for FhirPathValue {
    fn from(value: PartialDateTime) -> Self {
        Self::Constant(Primitive::DateTime(value))
    }
}

impl From<PartialTime> for FhirPathValue {
    fn from(value: PartialTime) -> Self {
        Self::Constant(Primitive::Time(value))
    }
}

impl fmt::Display for FhirPathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_representation())
    }
}

/// Debug implementation for FhirPathValue - shows element position instead of the whole subtree
impl fmt::Debug for FhirPathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(p) => write!(f, "{p:?}"),
            Self::Element(node) => write!(f, "{node:?}"),
        }
    }
}

impl Serialize for FhirPathValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

/// Ordered, possibly empty sequence of values
///
/// Every expression evaluates to a collection; a single value is simply a
/// collection of one.
#[derive(Clone, Default, Serialize)]
pub struct Collection(Vec<FhirPathValue>);

impl Collection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Create a collection from a vector of values
    pub fn from_vec(values: Vec<FhirPathValue>) -> Self {
        Self(values)
    }

    /// Create a collection holding exactly one value
    pub fn singleton(value: impl Into<FhirPathValue>) -> Self {
        Self(vec![value.into()])
    }

    /// Get the number of items in the collection
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get an iterator over the items
    pub fn iter(&self) -> std::slice::Iter<'_, FhirPathValue> {
        self.0.iter()
    }

    /// Add an item to the collection
    pub fn push(&mut self, value: FhirPathValue) {
        self.0.push(value);
    }

    /// Extend the collection with items from another collection
    pub fn extend(&mut self, other: Collection) {
        self.0.extend(other.0);
    }

    /// Get the first item
    pub fn first(&self) -> Option<&FhirPathValue> {
        self.0.first()
    }

    /// Get the last item
    pub fn last(&self) -> Option<&FhirPathValue> {
        self.0.last()
    }

    /// Get the item at a zero-based position
    pub fn get(&self, index: usize) -> Option<&FhirPathValue> {
        self.0.get(index)
    }

    /// The only item, if the collection holds exactly one
    pub fn single(&self) -> Option<&FhirPathValue> {
        match self.0.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Items as a slice
    pub fn as_slice(&self) -> &[FhirPathValue] {
        &self.0
    }

    /// Convert to a vector of values
    pub fn into_vec(self) -> Vec<FhirPathValue> {
        self.0
    }

    /// String form of every item, in order
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|v| v.to_string_representation()).collect()
    }

    /// Describe the runtime type of this collection for diagnostics
    pub fn describe_type(&self) -> String {
        match self.0.as_slice() {
            [] => "empty".to_string(),
            [only] => only.type_name().to_string(),
            [first, rest @ ..] => {
                let name = first.type_name();
                if rest.iter().all(|v| v.type_name() == name) {
                    format!("collection<{name}>")
                } else {
                    "collection".to_string()
                }
            }
        }
    }
}

impl From<Vec<FhirPathValue>> for Collection {
    fn from(values: Vec<FhirPathValue>) -> Self {
        Self(values)
    }
}

impl From<FhirPathValue> for Collection {
    fn from(value: FhirPathValue) -> Self {
        Self(vec![value])
    }
}

impl From<Node> for Collection {
    fn from(node: Node) -> Self {
        Self(vec![FhirPathValue::Element(node)])
    }
}

impl FromIterator<FhirPathValue> for Collection {
    fn from_iter<I: IntoIterator<Item = FhirPathValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Collection {
    type Item = FhirPathValue;
    type IntoIter = std::vec::IntoIter<FhirPathValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a FhirPathValue;
    type IntoIter = std::slice::Iter<'a, FhirPathValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Debug implementation for Collection
impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let item_strings: Vec<String> = self.0.iter().map(|item| format!("{item:?}")).collect();
        write!(f, "[{}]", item_strings.join(", "))
    }
}
