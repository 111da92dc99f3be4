//! Recursive argument routing.
//!
//! [`CommandTree::parse`] walks the tree one node at a time: it parses the
//! node's own flags, records the canonical command path and the leftover
//! positional arguments in the [`Store`], then descends into the first child
//! whose synonyms contain the next positional token. When no child names the
//! token, a pass-through child (one with no name) is entered without
//! consuming it.

use tracing::debug;

use crate::error::{Error, Result};
use crate::flags::FlagError;
use crate::store::{self, Store};
use crate::tree::{CommandTree, NodeId};

impl CommandTree {
    /// Routes `args` (without the program name) to a command.
    ///
    /// On success returns the deepest matched node. The store then holds
    /// the canonical command path under
    /// [`COMMAND_KEY`](crate::COMMAND_KEY) and the residual arguments under
    /// [`ARGS_KEY`](crate::ARGS_KEY). An unmatched token is left in the
    /// residual arguments rather than reported.
    ///
    /// # Errors
    ///
    /// - [`Error::HelpRequested`] when a node on the path sees `-h`/`-help`.
    /// - [`Error::Flag`] when a node's flags fail to parse.
    ///
    /// Both carry the usage text of the node concerned. Store entries
    /// written by ancestors before the failure are not rolled back.
    ///
    /// # Example
    ///
    /// ```
    /// use command_tree_core::{CommandTree, Options, command_path, residual_args};
    ///
    /// let mut tree = CommandTree::new("app", "");
    /// let add = tree.add_command(tree.root(), "add a", "").unwrap();
    /// let package = tree.add_command(add, "package p", "").unwrap();
    ///
    /// let mut opts = Options::new();
    /// let matched = tree.parse(&["a", "p", "extra"], &mut opts).unwrap();
    /// assert_eq!(matched, package);
    /// assert_eq!(command_path(&opts), "add package");
    /// assert_eq!(residual_args(&opts), vec!["extra"]);
    ///
    /// let err = tree.parse(&["add", "-h"], &mut opts).unwrap_err();
    /// assert!(err.is_help());
    /// ```
    pub fn parse<S: AsRef<str>>(&mut self, args: &[S], store: &mut impl Store) -> Result<NodeId> {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_owned()).collect();
        self.parse_node(self.root(), &args, store)
    }

    fn parse_node(&mut self, id: NodeId, args: &[String], store: &mut impl Store) -> Result<NodeId> {
        if let Err(source) = self.flags_mut(id).parse(args) {
            return Err(self.flag_failure(id, source));
        }
        let remaining = self.flags(id).args().to_vec();

        let node = self.node(id);
        let path = if node.is_root() {
            String::new()
        } else if node.takes_token() {
            let parent = store.get(store::COMMAND_KEY, "");
            format!("{parent} {}", node.name()).trim_start().to_string()
        } else {
            store.get(store::COMMAND_KEY, "")
        };
        store.set(store::COMMAND_KEY, &path);
        store.set(store::ARGS_KEY, &store::join_arguments(&remaining));

        debug!(command = %path, args = ?remaining, "Matched command");

        let Some(token) = remaining.first() else {
            return Ok(id);
        };
        match self.route(id, token) {
            Some((child, true)) => self.parse_node(child, &remaining[1..], store),
            Some((child, false)) => self.parse_node(child, &remaining, store),
            None => Ok(id),
        }
    }

    fn flag_failure(&self, id: NodeId, source: FlagError) -> Error {
        let command = self.path(id).join(" ");
        let usage = self.usage(id);
        if source == FlagError::HelpRequested {
            debug!(command = %command, "Help requested");
            Error::HelpRequested { command, usage }
        } else {
            debug!(command = %command, error = %source, "Flag parsing failed");
            Error::Flag {
                command,
                source,
                usage,
            }
        }
    }
}
