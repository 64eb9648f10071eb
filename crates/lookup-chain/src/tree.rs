//! Expression tree builder
//!
//! Scans nested call text such as `F(G(a,b),c)` one call level at a time: the
//! outermost `name(contents)` match becomes a node, its contents become the
//! substring for the next level, and the first level without a nested call is
//! split into leaf argument tokens.
//!
//! Every level records the substring it processed and, for call levels, the
//! matched call text. The resolver works purely from that metadata.

use lazy_regex::regex;
use serde::Serialize;
use std::collections::BTreeMap;

/// Index of a node inside its [`Tree`]
pub type NodeId = usize;

/// A child of a node: a nested call or a raw argument token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Child {
    Node(NodeId),
    Leaf(String),
}

/// One call in the tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Function name
    pub value: String,
    /// Owning node (`None` for the root)
    pub parent: Option<NodeId>,
    /// Arguments in textual order
    pub children: Vec<Child>,
    /// Nesting level (root = 0)
    pub level: usize,
    pub is_root: bool,
}

/// What the builder recorded for one nesting level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelMetadata {
    /// Substring scanned at this level
    pub processed_string: String,
    /// Full `name(contents)` text matched at this level, if any
    pub matched_group: Option<String>,
    /// Processed string before resolution rewrote it
    pub previous_match: Option<String>,
}

impl LevelMetadata {
    fn new(processed: &str) -> Self {
        Self {
            processed_string: processed.to_string(),
            ..Default::default()
        }
    }
}

/// Entry of the leaf frontier
pub type FrontierEntry = Child;

/// Tree of nested calls plus per-level metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    levels: BTreeMap<usize, Vec<NodeId>>,
    frontier: Vec<FrontierEntry>,
    pub(crate) metadata: Vec<LevelMetadata>,
}

impl Tree {
    /// Number of metadata levels discovered
    pub fn depth(&self) -> usize {
        self.metadata.len()
    }

    /// The root node, absent for atomic input
    pub fn root(&self) -> Option<&Node> {
        self.root.map(|id| &self.nodes[id])
    }

    /// Input without any call syntax
    pub fn is_atomic(&self) -> bool {
        self.root.is_none()
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes in creation order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Nodes at a nesting level, in creation order
    pub fn nodes_at_level(&self, level: usize) -> impl Iterator<Item = &Node> + '_ {
        self.levels
            .get(&level)
            .into_iter()
            .flatten()
            .map(move |&id| &self.nodes[id])
    }

    /// Most recently opened entries still awaiting children
    pub fn frontier(&self) -> &[FrontierEntry] {
        &self.frontier
    }

    /// Raw tokens currently on the frontier
    pub fn frontier_leaves(&self) -> impl Iterator<Item = &str> + '_ {
        self.frontier.iter().filter_map(|entry| match entry {
            Child::Leaf(token) => Some(token.as_str()),
            Child::Node(_) => None,
        })
    }

    /// Metadata for a level
    pub fn level(&self, level: usize) -> Option<&LevelMetadata> {
        self.metadata.get(level)
    }

    /// Metadata for all levels, outermost first
    pub fn metadata(&self) -> &[LevelMetadata] {
        &self.metadata
    }

    /// Level-0 processed string; after resolution this is the result
    pub fn resolved_text(&self) -> &str {
        self.metadata
            .first()
            .map(|m| m.processed_string.as_str())
            .unwrap_or("")
    }

    /// Children of a node rendered as text: function names for nested
    /// calls, raw tokens for leaves
    pub fn child_labels(&self, id: NodeId) -> Vec<String> {
        self.node(id)
            .map(|node| {
                node.children
                    .iter()
                    .map(|child| match child {
                        Child::Node(child_id) => self.nodes[*child_id].value.clone(),
                        Child::Leaf(token) => token.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        self.levels.entry(node.level).or_default().push(id);
        self.nodes.push(node);
        id
    }

    fn add_root(&mut self, value: &str) -> NodeId {
        let id = self.push_node(Node {
            value: value.to_string(),
            parent: None,
            children: Vec::new(),
            level: 0,
            is_root: true,
        });
        self.root = Some(id);
        self.frontier.push(Child::Node(id));
        id
    }

    fn add_child(&mut self, parent: NodeId, value: &str) -> NodeId {
        let level = self.nodes[parent].level + 1;
        let id = self.push_node(Node {
            value: value.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            level,
            is_root: false,
        });
        self.nodes[parent].children.push(Child::Node(id));
        self.frontier.push(Child::Node(id));
        id
    }

    fn add_leaves<I: IntoIterator<Item = String>>(&mut self, parent: NodeId, tokens: I) {
        self.nodes[parent]
            .children
            .extend(tokens.into_iter().map(Child::Leaf));
    }

    /// Pop the most recently opened node off the frontier
    fn pop_open_node(&mut self) -> Option<NodeId> {
        match self.frontier.last() {
            Some(Child::Node(id)) => {
                let id = *id;
                self.frontier.pop();
                Some(id)
            }
            _ => None,
        }
    }
}

/// Split an argument list on commas, with optional surrounding whitespace
pub(crate) fn split_arguments(text: &str) -> Option<Vec<String>> {
    let pattern = regex!(r"\s*,\s*");
    if !pattern.is_match(text) {
        return None;
    }
    Some(pattern.split(text).map(str::to_string).collect())
}

/// Sibling tokens around a nested call, e.g. `c` in `G(a,b),c`
fn outer_tokens(text: &str) -> Vec<String> {
    regex!(r"\s*,\s*")
        .split(text.trim())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the expression tree for nested call text
///
/// Input without call syntax yields a tree with no root and a single
/// metadata level holding the input.
pub fn build_tree(text: &str) -> Tree {
    let call = regex!(r"(\w+)\((.*)\)");
    let mut tree = Tree::default();
    let mut current = text.to_string();

    loop {
        tree.metadata.push(LevelMetadata::new(&current));
        let level = tree.metadata.len() - 1;

        let (whole, name, contents) = match call.captures(&current) {
            Some(caps) => match (caps.get(0), caps.get(1), caps.get(2)) {
                (Some(whole), Some(name), Some(contents)) => (whole, name, contents),
                _ => break,
            },
            None => {
                // No nested call left: the substring is an argument list
                if let Some(tokens) = split_arguments(&current) {
                    if let Some(parent) = tree.pop_open_node() {
                        tree.add_leaves(parent, tokens.iter().cloned());
                        tree.frontier.extend(tokens.into_iter().map(Child::Leaf));
                    }
                }
                break;
            }
        };

        tree.metadata[level].matched_group = Some(whole.as_str().to_string());

        if tree.root.is_none() {
            tree.add_root(name.as_str());
        } else if let Some(parent) = tree.pop_open_node() {
            tree.add_leaves(parent, outer_tokens(&current[..whole.start()]));
            tree.add_child(parent, name.as_str());
            tree.add_leaves(parent, outer_tokens(&current[whole.end()..]));
        } else {
            break;
        }

        tracing::trace!(level, function = name.as_str(), "matched call");
        current = contents.as_str().to_string();
    }

    if tree.is_atomic() {
        tracing::debug!(input = text, "no call expression found, input is atomic");
    } else {
        tracing::debug!(depth = tree.depth(), nodes = tree.nodes.len(), "built expression tree");
    }

    tree
}
