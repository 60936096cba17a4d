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

//! Arena-backed document tree
//!
//! Nodes live in one vector and refer to each other by index. A
//! [`TreeNavigator`] is just the shared tree plus a position, so duplicating a
//! cursor costs one reference-count increment.

use std::sync::Arc;

use super::navigator::{Navigator, Node};
use super::value::Primitive;

/// Index of a node inside a [`DocumentTree`]
pub type NodeId = usize;

#[derive(Debug, Clone)]
struct TreeNode {
    name: String,
    type_name: String,
    value: Option<Primitive>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// Immutable document stored as an index-linked arena
#[derive(Debug)]
pub struct DocumentTree {
    nodes: Vec<TreeNode>,
}

impl DocumentTree {
    /// Id of the root node
    pub const ROOT: NodeId = 0;

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds at least its root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Cursor on the root node
    pub fn navigator(self: &Arc<Self>) -> TreeNavigator {
        TreeNavigator {
            tree: Arc::clone(self),
            position: Self::ROOT,
        }
    }

    /// The root as a value-model node
    pub fn root(self: &Arc<Self>) -> Node {
        Node::new(self.navigator())
    }
}

/// Incremental builder for [`DocumentTree`]
///
/// Children are appended in document order.
#[derive(Debug)]
pub struct DocumentTreeBuilder {
    nodes: Vec<TreeNode>,
    last_child: Vec<Option<NodeId>>,
}

impl DocumentTreeBuilder {
    /// Start a tree with the given root
    pub fn new(root_name: impl Into<String>, root_type: impl Into<String>) -> Self {
        Self {
            nodes: vec![TreeNode {
                name: root_name.into(),
                type_name: root_type.into(),
                value: None,
                parent: None,
                first_child: None,
                next_sibling: None,
            }],
            last_child: vec![None],
        }
    }

    /// Append a child under `parent` and return its id
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not returned by this builder.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: Option<Primitive>,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            name: name.into(),
            type_name: type_name.into(),
            value,
            parent: Some(parent),
            first_child: None,
            next_sibling: None,
        });
        self.last_child.push(None);

        match self.last_child[parent] {
            Some(previous) => self.nodes[previous].next_sibling = Some(id),
            None => self.nodes[parent].first_child = Some(id),
        }
        self.last_child[parent] = Some(id);
        id
    }

    /// Freeze the tree
    pub fn build(self) -> Arc<DocumentTree> {
        Arc::new(DocumentTree { nodes: self.nodes })
    }
}

/// Cursor over a [`DocumentTree`]
#[derive(Debug, Clone)]
pub struct TreeNavigator {
    tree: Arc<DocumentTree>,
    position: NodeId,
}

impl TreeNavigator {
    /// Current position in the arena
    pub fn position(&self) -> NodeId {
        self.position
    }

    fn node(&self) -> &TreeNode {
        &self.tree.nodes[self.position]
    }
}

impl Navigator for TreeNavigator {
    fn move_to_next(&mut self) -> bool {
        match self.node().next_sibling {
            Some(next) => {
                self.position = next;
                true
            }
            None => false,
        }
    }

    fn move_to_first_child(&mut self) -> bool {
        match self.node().first_child {
            Some(child) => {
                self.position = child;
                true
            }
            None => false,
        }
    }

    fn clone_box(&self) -> Box<dyn Navigator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &str {
        &self.node().name
    }

    fn type_name(&self) -> &str {
        &self.node().type_name
    }

    fn value(&self) -> Option<Primitive> {
        self.node().value.clone()
    }

    fn parent(&self) -> Option<Box<dyn Navigator>> {
        self.node().parent.map(|parent| {
            Box::new(TreeNavigator {
                tree: Arc::clone(&self.tree),
                position: parent,
            }) as Box<dyn Navigator>
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Arc<DocumentTree> {
        let mut builder = DocumentTreeBuilder::new("Patient", "Patient");
        let name = builder.add_child(DocumentTree::ROOT, "name", "HumanName", None);
        builder.add_child(name, "given", "string", Some(Primitive::String("Jim".into())));
        builder.add_child(name, "given", "string", Some(Primitive::String("Peter".into())));
        builder.add_child(DocumentTree::ROOT, "active", "boolean", Some(Primitive::Boolean(true)));
        builder.build()
    }

    #[test]
    fn test_sibling_and_child_moves() {
        let tree = sample();
        let mut cursor = tree.navigator();
        assert!(!cursor.move_to_next());
        assert!(cursor.move_to_first_child());
        assert_eq!(cursor.name(), "name");
        assert!(cursor.move_to_next());
        assert_eq!(cursor.name(), "active");
        assert!(!cursor.move_to_next());
        assert_eq!(cursor.name(), "active");
    }

    #[test]
    fn test_clone_is_independent() {
        let tree = sample();
        let mut cursor = tree.navigator();
        let copy = cursor.clone_box();
        assert!(cursor.move_to_first_child());
        assert_eq!(copy.name(), "Patient");
        assert_eq!(cursor.name(), "name");
    }

    #[test]
    fn test_parent_axis() {
        let tree = sample();
        let root = tree.root();
        let given = root.children()[0].children_named("given");
        assert_eq!(given.len(), 2);
        let parent = given[1].parent().unwrap();
        assert_eq!(parent.name(), "name");
        assert!(root.parent().is_none());
        assert_eq!(tree.len(), 5);
    }
}
