//! Collection tree model
//!
//! Papers3 exports collections as a nested tree, but individual nodes also
//! carry their parent's identifier, and older exports list nodes flat. Both
//! shapes are accepted: [`assemble_forest`] nests flat nodes under their
//! parents and rejects any structure that is not a proper tree.

use super::errors::MigrationError;
use super::ids::SourceId;
use super::result::Result;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// A collection (container) from the source library.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerNode {
    pub uuid: SourceId,

    #[serde(default)]
    pub name: String,

    /// Identifier of the parent collection, if any
    #[serde(default)]
    pub parent: Option<String>,

    /// Ordered child collections
    #[serde(default)]
    pub children: Vec<ContainerNode>,
}

impl ContainerNode {
    /// Creates a leaf node with no parent.
    pub fn new(uuid: SourceId, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Appends a child, setting its parent link.
    pub fn with_child(mut self, mut child: ContainerNode) -> Self {
        child.parent = Some(self.uuid.as_str().to_string());
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including the node itself.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(ContainerNode::subtree_len).sum::<usize>()
    }
}

/// Turns the top-level node list of a collections document into a forest.
///
/// A top-level node whose `parent` names another top-level node is moved
/// under it, after any children it already had. Nodes are otherwise kept in
/// input order.
///
/// # Errors
///
/// Returns [`MigrationError::CyclicHierarchy`] when parent links form a loop
/// (the nodes on it can never be reached from a root) or when an identifier
/// appears again below itself.
pub fn assemble_forest(nodes: Vec<ContainerNode>) -> Result<Vec<ContainerNode>> {
    let index: HashMap<String, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.uuid.as_str().to_string(), i))
        .collect();

    let mut adopted: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut roots = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        match node.parent.as_deref().and_then(|p| index.get(p)) {
            Some(&parent) => adopted[parent].push(i),
            None => roots.push(i),
        }
    }

    let mut reached = vec![false; nodes.len()];
    let mut stack = roots.clone();
    while let Some(i) = stack.pop() {
        reached[i] = true;
        stack.extend(adopted[i].iter().copied());
    }
    let unreachable: Vec<&str> = nodes
        .iter()
        .zip(&reached)
        .filter(|(_, &seen)| !seen)
        .map(|(node, _)| node.uuid.as_str())
        .collect();
    if !unreachable.is_empty() {
        return Err(MigrationError::CyclicHierarchy(format!(
            "parent links form a loop through {}",
            unreachable.join(", ")
        )));
    }

    let mut slots: Vec<Option<ContainerNode>> = nodes.into_iter().map(Some).collect();
    let forest: Vec<ContainerNode> = roots
        .into_iter()
        .filter_map(|i| nest(i, &mut slots, &adopted))
        .collect();

    for root in &forest {
        check_ancestry(root, &mut HashSet::new())?;
    }
    Ok(forest)
}

fn nest(
    i: usize,
    slots: &mut [Option<ContainerNode>],
    adopted: &[Vec<usize>],
) -> Option<ContainerNode> {
    let mut node = slots[i].take()?;
    for &child in &adopted[i] {
        if let Some(child) = nest(child, slots, adopted) {
            node.children.push(child);
        }
    }
    Some(node)
}

fn check_ancestry<'a>(node: &'a ContainerNode, path: &mut HashSet<&'a str>) -> Result<()> {
    if !path.insert(node.uuid.as_str()) {
        return Err(MigrationError::CyclicHierarchy(format!(
            "collection {} appears inside itself",
            node.uuid
        )));
    }
    for child in &node.children {
        check_ancestry(child, path)?;
    }
    path.remove(node.uuid.as_str());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SourceId {
        SourceId::new(s).unwrap()
    }

    fn flat(uuid: &str, name: &str, parent: Option<&str>) -> ContainerNode {
        ContainerNode {
            uuid: id(uuid),
            name: name.to_string(),
            parent: parent.map(str::to_string),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_nested_tree_passes_through() {
        let tree = ContainerNode::new(id("A"), "Biology")
            .with_child(ContainerNode::new(id("B"), "Genetics"))
            .with_child(ContainerNode::new(id("C"), "Ecology"));

        let forest = assemble_forest(vec![tree.clone()]).unwrap();
        assert_eq!(forest, vec![tree]);
        assert_eq!(forest[0].subtree_len(), 3);
    }

    #[test]
    fn test_flat_nodes_are_nested_in_order() {
        let forest = assemble_forest(vec![
            flat("B", "Genetics", Some("A")),
            flat("A", "Biology", None),
            flat("C", "Ecology", Some("A")),
            flat("D", "Physics", None),
        ])
        .unwrap();

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].name, "Biology");
        let children: Vec<&str> = forest[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(children, vec!["Genetics", "Ecology"]);
        assert_eq!(forest[1].name, "Physics");
    }

    #[test]
    fn test_unknown_parent_becomes_root() {
        let forest = assemble_forest(vec![flat("B", "Orphan", Some("gone"))]).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].name, "Orphan");
    }

    #[test]
    fn test_parent_loop_is_rejected() {
        let result = assemble_forest(vec![
            flat("R", "Root", None),
            flat("A", "Loop A", Some("B")),
            flat("B", "Loop B", Some("A")),
        ]);
        let err = result.unwrap_err();
        assert!(matches!(err, MigrationError::CyclicHierarchy(_)));
        assert!(err.to_string().contains('A'));
    }

    #[test]
    fn test_self_parent_is_rejected() {
        let result = assemble_forest(vec![flat("A", "Self", Some("A"))]);
        assert!(matches!(result, Err(MigrationError::CyclicHierarchy(_))));
    }

    #[test]
    fn test_identifier_repeated_below_itself_is_rejected() {
        let inner = ContainerNode::new(id("B"), "Middle")
            .with_child(ContainerNode::new(id("A"), "Outer again"));
        let tree = ContainerNode::new(id("A"), "Outer").with_child(inner);
        let result = assemble_forest(vec![tree]);
        assert!(matches!(result, Err(MigrationError::CyclicHierarchy(_))));
    }

    #[test]
    fn test_same_identifier_in_sibling_subtrees_is_allowed() {
        let left = ContainerNode::new(id("A"), "Left").with_child(ContainerNode::new(id("X"), "Leaf"));
        let right =
            ContainerNode::new(id("B"), "Right").with_child(ContainerNode::new(id("X"), "Leaf"));
        let tree = ContainerNode::new(id("R"), "Root")
            .with_child(left)
            .with_child(right);
        assert!(assemble_forest(vec![tree]).is_ok());
    }

    #[test]
    fn test_deserialize_export_shape() {
        let node: ContainerNode = serde_json::from_value(serde_json::json!({
            "uuid": "A",
            "name": "Biology",
            "parent": null,
            "priority": 0,
            "children": [{"uuid": "B", "name": "Genetics", "parent": "A"}]
        }))
        .unwrap();
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].parent.as_deref(), Some("A"));
    }
}
