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

//! Navigator contract over hierarchical input documents
//!
//! The engine never touches a document directly. It only moves cursors that
//! implement [`Navigator`]: step to the next sibling, step to the first child,
//! and duplicate the current position. Every other axis (children,
//! descendants, parent) is derived from those moves in [`Node`].

use std::fmt;
use std::sync::Arc;

use super::value::Primitive;
use crate::error::{FhirPathError, Result};

/// A cursor positioned on one node of a hierarchical document
///
/// Moves mutate the cursor in place and report whether they succeeded; a
/// failed move leaves the cursor where it was.
pub trait Navigator: fmt::Debug + Send + Sync {
    /// Step to the next sibling
    fn move_to_next(&mut self) -> bool;

    /// Step to the first child
    fn move_to_first_child(&mut self) -> bool;

    /// Duplicate this cursor at its current position
    fn clone_box(&self) -> Box<dyn Navigator>;

    /// Name of the current node
    fn name(&self) -> &str;

    /// Type name of the current node
    fn type_name(&self) -> &str;

    /// Primitive value of the current node, if it carries one
    fn value(&self) -> Option<Primitive>;

    /// Cursor positioned on the parent node, `None` at the root
    ///
    /// Backings that cannot walk upwards keep the default.
    fn parent(&self) -> Option<Box<dyn Navigator>> {
        None
    }
}

/// Shared handle to a fixed navigator position
///
/// Cloning a `Node` is cheap. The wrapped cursor is never moved; axes work on
/// private duplicates obtained through [`Navigator::clone_box`].
#[derive(Clone)]
pub struct Node(Arc<dyn Navigator>);

impl Node {
    /// Wrap a navigator positioned on the node of interest
    pub fn new(navigator: impl Navigator + 'static) -> Self {
        Self(Arc::new(navigator))
    }

    /// Wrap a boxed navigator
    pub fn from_box(navigator: Box<dyn Navigator>) -> Self {
        Self(Arc::from(navigator))
    }

    /// Name of the node
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Type name of the node
    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    /// Primitive value of the node
    pub fn value(&self) -> Option<Primitive> {
        self.0.value()
    }

    /// A fresh cursor starting at this node
    pub fn cursor(&self) -> Box<dyn Navigator> {
        self.0.clone_box()
    }

    /// All children in document order
    pub fn children(&self) -> Vec<Node> {
        self.collect_children(|_| true)
    }

    /// Children with the given name, in document order
    pub fn children_named(&self, name: &str) -> Vec<Node> {
        self.collect_children(|cursor| cursor.name() == name)
    }

    fn collect_children(&self, keep: impl Fn(&dyn Navigator) -> bool) -> Vec<Node> {
        let mut cursor = self.cursor();
        let mut result = Vec::new();
        if !cursor.move_to_first_child() {
            return result;
        }
        loop {
            if keep(cursor.as_ref()) {
                result.push(Node::from_box(cursor.clone_box()));
            }
            if !cursor.move_to_next() {
                break;
            }
        }
        result
    }

    /// All descendants in depth-first pre-order, excluding the node itself
    ///
    /// Walking deeper than `max_depth` levels is reported as an error so that
    /// cyclic backings cannot loop forever.
    pub fn descendants(&self, max_depth: usize) -> Result<Vec<Node>> {
        let mut result = Vec::new();
        self.collect_descendants(1, max_depth, &mut result)?;
        Ok(result)
    }

    fn collect_descendants(&self, depth: usize, max_depth: usize, out: &mut Vec<Node>) -> Result<()> {
        let children = self.children();
        if children.is_empty() {
            return Ok(());
        }
        if depth > max_depth {
            return Err(FhirPathError::evaluation_error(format!(
                "descendants() exceeded the maximum depth of {max_depth} below '{}'",
                self.name()
            )));
        }
        for child in children {
            out.push(child.clone());
            child.collect_descendants(depth + 1, max_depth, out)?;
        }
        Ok(())
    }

    /// The parent node, `None` at the root or when the backing cannot tell
    pub fn parent(&self) -> Option<Node> {
        self.0.parent().map(Node::from_box)
    }

    /// Structural equality: same name, type, value and pairwise equal children
    pub fn deep_equals(&self, other: &Node) -> bool {
        if self.name() != other.name()
            || self.type_name() != other.type_name()
            || self.value() != other.value()
        {
            return false;
        }
        let left = self.children();
        let right = other.children();
        left.len() == right.len() && left.iter().zip(&right).all(|(l, r)| l.deep_equals(r))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{}: {} = {value:?}", self.name(), self.type_name()),
            None => write!(f, "{}: {}", self.name(), self.type_name()),
        }
    }
}
