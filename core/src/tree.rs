//! Command tree data structure.
//!
//! A [`CommandTree`] owns every node in an arena; nodes refer to each other
//! by [`NodeId`]. Each node owns its children list and holds a non-owning
//! parent index, so there is no ownership cycle. The shape of the tree is
//! fixed once built: parsing only changes flag values.
//!
//! # Example
//!
//! ```
//! use command_tree_core::CommandTree;
//!
//! let mut tree = CommandTree::new("app", "Package manager");
//! let root = tree.root();
//! let add = tree.add_command(root, "add a", "Adding stuff").unwrap();
//! let package = tree.add_command(add, "package p", "Add package").unwrap();
//!
//! assert_eq!(tree.path(package), vec!["add", "package"]);
//! assert_eq!(tree.find(&["a", "p"]), Some(package));
//! assert!(tree.add_command(root, "bad_name", "").is_err());
//! ```

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::error::{Error, Result};
use crate::flags::FlagSet;
use crate::usage;

/// Default argument placeholder in the usage line.
pub const DEFAULT_ARGUMENT_HINT: &str = "[ARGS...]";

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][-A-Za-z0-9]*$").expect("static regex must compile")
});

/// Index of a node inside its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena; the root is `0`.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Splits a command name specification into its synonyms.
///
/// ```
/// use command_tree_core::split_command;
///
/// assert_eq!(split_command("delete  del d"), vec!["delete", "del", "d"]);
/// assert!(split_command("  ").is_empty());
/// ```
pub fn split_command(names: &str) -> Vec<String> {
    names.split_whitespace().map(String::from).collect()
}

/// One command in the tree.
#[derive(Debug, Clone)]
pub struct CommandNode {
    names: Vec<String>,
    description: String,
    subcommand_hint: String,
    argument_hint: String,
    flags: FlagSet,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl CommandNode {
    fn new(names: Vec<String>, description: &str, parent: Option<NodeId>) -> Self {
        let flags = FlagSet::new(names.first().cloned().unwrap_or_default());
        Self {
            names,
            description: description.to_string(),
            subcommand_hint: String::new(),
            argument_hint: DEFAULT_ARGUMENT_HINT.to_string(),
            flags,
            parent,
            children: Vec::new(),
        }
    }

    /// Synonyms in declaration order. A node that consumes no token has the
    /// single name `""`.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Canonical (first) name, used in command paths.
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }

    /// Whether reaching this node requires a command token.
    pub fn takes_token(&self) -> bool {
        !self.name().is_empty()
    }

    /// Exact, case-sensitive synonym match.
    pub fn matches(&self, token: &str) -> bool {
        self.takes_token() && self.names.iter().any(|n| n == token)
    }

    /// One-line summary.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replaces the summary.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Override for the `[COMMAND]` marker; empty means auto-generate.
    pub fn subcommand_hint(&self) -> &str {
        &self.subcommand_hint
    }

    /// Sets the `[COMMAND]` override, e.g. `"[end]"` for a single choice.
    pub fn set_subcommand_hint(&mut self, hint: impl Into<String>) {
        self.subcommand_hint = hint.into();
    }

    /// Positional-argument placeholder; empty omits it from the usage line.
    pub fn argument_hint(&self) -> &str {
        &self.argument_hint
    }

    /// Sets the positional-argument placeholder.
    pub fn set_argument_hint(&mut self, hint: impl Into<String>) {
        self.argument_hint = hint.into();
    }

    /// This node's own flags. Flags are not inherited through the tree.
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    /// Mutable access for declaring flags.
    pub fn flags_mut(&mut self) -> &mut FlagSet {
        &mut self.flags
    }

    /// Parent node; `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order, which is also match and display order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns `true` for the root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Arena of [`CommandNode`]s rooted at [`CommandTree::root`].
#[derive(Debug, Clone)]
pub struct CommandTree {
    program: String,
    nodes: Vec<CommandNode>,
}

impl CommandTree {
    /// Creates a tree whose root consumes no token.
    ///
    /// `program` is the invocation name printed at the start of every usage
    /// line.
    pub fn new(program: impl Into<String>, description: &str) -> Self {
        Self {
            program: program.into(),
            nodes: vec![CommandNode::new(vec![String::new()], description, None)],
        }
    }

    /// Program name used in usage text.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Replaces the program name used in usage text.
    pub fn set_program(&mut self, program: impl Into<String>) {
        self.program = program.into();
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a command under `parent`.
    ///
    /// `name_spec` is a whitespace separated list of synonyms, the first one
    /// canonical. An empty list creates a pass-through node: parsing enters it
    /// without consuming a token whenever no named sibling matches, so its
    /// children read as children of `parent`.
    ///
    /// Siblings may share synonyms. The first declared sibling wins during
    /// parsing, so a collision is logged as a warning but accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCommandName`] if any synonym does not match
    /// `[A-Za-z0-9][-A-Za-z0-9]*`. The tree is left unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree.
    pub fn add_command(&mut self, parent: NodeId, name_spec: &str, description: &str) -> Result<NodeId> {
        let mut names = split_command(name_spec);
        if let Some(bad) = names.iter().find(|n| !NAME_RE.is_match(n)) {
            return Err(Error::InvalidCommandName(bad.clone()));
        }
        if names.is_empty() {
            names.push(String::new());
        }

        for sibling in &self.nodes[parent.0].children {
            let sibling = &self.nodes[sibling.0];
            if let Some(shared) = names.iter().find(|n| sibling.matches(n)) {
                warn!(
                    synonym = %shared,
                    existing = %sibling.name(),
                    "Sibling commands share a synonym; the first declared one wins"
                );
            }
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(CommandNode::new(names, description, Some(parent)));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Borrows a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    /// Mutably borrows a node, e.g. to set hints.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn node_mut(&mut self, id: NodeId) -> &mut CommandNode {
        &mut self.nodes[id.0]
    }

    /// Flags of a node.
    pub fn flags(&self, id: NodeId) -> &FlagSet {
        self.node(id).flags()
    }

    /// Mutable flags of a node, for declaring options.
    pub fn flags_mut(&mut self, id: NodeId) -> &mut FlagSet {
        self.node_mut(id).flags_mut()
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Children of a node in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    /// Returns `true` if `id` is the root.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.node(id).is_root()
    }

    /// Canonical names from the root down to `id`, skipping nodes that take
    /// no token.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.map(|c| self.node(c)) {
            if node.takes_token() {
                path.push(node.name());
            }
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// Follows `tokens` from the root the same way parsing does, entering
    /// pass-through nodes as needed.
    pub fn find<S: AsRef<str>>(&self, tokens: &[S]) -> Option<NodeId> {
        let mut current = self.root();
        for token in tokens {
            loop {
                let (next, consumed) = self.route(current, token.as_ref())?;
                current = next;
                if consumed {
                    break;
                }
            }
        }
        Some(current)
    }

    /// First child of `id` that has `token` as a synonym.
    pub fn child_matching(&self, id: NodeId, token: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.node(child).matches(token))
    }

    /// Next step from `id` for `token`.
    ///
    /// A child naming `token` wins and consumes it (`true`). Failing that,
    /// the first pass-through child is entered without consuming anything
    /// (`false`).
    pub fn route(&self, id: NodeId, token: &str) -> Option<(NodeId, bool)> {
        if let Some(child) = self.child_matching(id, token) {
            return Some((child, true));
        }
        self.children(id)
            .iter()
            .copied()
            .find(|&child| !self.node(child).takes_token())
            .map(|child| (child, false))
    }

    /// Nodes below `id` in depth-first pre-order, paired with their depth
    /// relative to `id` (children are depth 1).
    pub fn descendants(&self, id: NodeId) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        self.collect_descendants(id, 1, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, depth: usize, out: &mut Vec<(NodeId, usize)>) {
        for &child in self.children(id) {
            out.push((child, depth));
            self.collect_descendants(child, depth + 1, out);
        }
    }

    /// Usage text for `id`, using this tree's program name.
    pub fn usage(&self, id: NodeId) -> String {
        usage::render_usage(self, id, &self.program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (CommandTree, NodeId, NodeId, NodeId) {
        let mut tree = CommandTree::new("app", "Example");
        let root = tree.root();
        let add = tree.add_command(root, "add a", "Adding stuff").unwrap();
        let del = tree.add_command(root, "delete del d", "Deleting stuff").unwrap();
        let pkg = tree.add_command(del, "package p", "Delete package").unwrap();
        (tree, add, del, pkg)
    }

    #[test]
    fn test_root_has_empty_sentinel_name() {
        let tree = CommandTree::new("app", "");
        let root = tree.node(tree.root());
        assert_eq!(root.names(), [""]);
        assert!(root.is_root());
        assert!(!root.takes_token());
        assert!(!root.matches(""));
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let (tree, add, del, pkg) = sample();
        assert_eq!(tree.children(tree.root()), [add, del]);
        assert_eq!(tree.parent(pkg), Some(del));
        assert_eq!(tree.node(del).names(), ["delete", "del", "d"]);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let (mut tree, add, _, _) = sample();
        for names in ["-x", "ok bad_name", "caf\u{e9}", "a.b"] {
            let err = tree.add_command(add, names, "").unwrap_err();
            assert!(matches!(err, Error::InvalidCommandName(_)), "{names}");
        }
        assert!(tree.children(add).is_empty());
        assert!(tree.add_command(add, "x-1 9lives", "").is_ok());
    }

    #[test]
    fn test_empty_names_make_pass_through_node() {
        let (mut tree, add, _, _) = sample();
        let hidden = tree.add_command(add, "  ", "").unwrap();
        let leaf = tree.add_command(hidden, "leaf", "").unwrap();
        assert!(!tree.node(hidden).takes_token());
        assert_eq!(tree.path(leaf), vec!["add", "leaf"]);
        assert_eq!(tree.find(&["add", "leaf"]), Some(leaf));
        assert_eq!(tree.route(add, "leaf"), Some((hidden, false)));
        assert_eq!(tree.route(hidden, "leaf"), Some((leaf, true)));
        assert_eq!(tree.route(hidden, "other"), None);
    }

    #[test]
    fn test_find_uses_synonyms() {
        let (tree, _, del, pkg) = sample();
        assert_eq!(tree.find(&["d"]), Some(del));
        assert_eq!(tree.find(&["del", "p"]), Some(pkg));
        assert_eq!(tree.find::<&str>(&[]), Some(tree.root()));
        assert_eq!(tree.find(&["Delete"]), None);
    }

    #[test]
    fn test_sibling_collision_is_kept_and_first_wins() {
        let (mut tree, add, _, _) = sample();
        let second = tree.add_command(tree.root(), "also a", "Collides").unwrap();
        assert_eq!(tree.child_matching(tree.root(), "a"), Some(add));
        assert_eq!(tree.child_matching(tree.root(), "also"), Some(second));
    }

    #[test]
    fn test_descendants_depths() {
        let (tree, add, del, pkg) = sample();
        assert_eq!(
            tree.descendants(tree.root()),
            vec![(add, 1), (del, 1), (pkg, 2)]
        );
        assert_eq!(tree.descendants(del), vec![(pkg, 1)]);
    }
}
