//! Recursive sub-command trees with per-node flags.
//!
//! This crate lets a program declare a tree of commands such as
//! `app add package` or `app delete dependency`, each with its own flags, and
//! then:
//!
//! - route a flat argument vector to the deepest matching command
//!   ([`CommandTree::parse`]),
//! - collect the leftover positional arguments into a [`Store`],
//! - render aligned usage text for any node ([`render_usage`]).
//!
//! The main types are:
//!
//! - [`CommandTree`] / [`CommandNode`] — the arena-backed tree, addressed by
//!   [`NodeId`].
//! - [`FlagSet`] — the flags owned by a single node. Flags are not inherited.
//! - [`Options`] — the bundled [`Store`], loadable from YAML or JSON.
//! - [`Error`] — construction faults, help requests and parse faults.
//!
//! # Example
//!
//! ```
//! use command_tree_core::*;
//!
//! let mut tree = CommandTree::new("app", "Package manager");
//! let root = tree.root();
//! tree.flags_mut(root).bool("version", false, "Display version").unwrap();
//!
//! let del = tree.add_command(root, "delete del d", "Deleting stuff").unwrap();
//! tree.flags_mut(del).bool("recurse", false, "Delete recursively").unwrap();
//! tree.add_command(del, "package p", "Delete package").unwrap();
//!
//! let mut opts = Options::new();
//! tree.parse(&["del", "-recurse", "p", "left-pad"], &mut opts).unwrap();
//!
//! assert_eq!(command_path(&opts), "delete package");
//! assert_eq!(residual_args(&opts), vec!["left-pad"]);
//! assert_eq!(tree.flags(del).get_bool("recurse"), Some(true));
//!
//! match tree.parse(&["-help"], &mut opts) {
//!     Err(err) if err.is_help() => assert!(err.usage().unwrap().contains("Commands:")),
//!     other => panic!("expected help, got {other:?}"),
//! }
//! ```

mod error;
mod flags;
mod parse;
mod store;
mod tree;
mod usage;

pub use error::{Error, Result};
pub use flags::{Flag, FlagError, FlagSet, FlagValue};
pub use store::{
    ARGS_KEY, COMMAND_KEY, Options, Store, command_path, join_arguments, residual_args,
    split_arguments,
};
pub use tree::{CommandNode, CommandTree, DEFAULT_ARGUMENT_HINT, NodeId, split_command};
pub use usage::{command_list, options_help, render_usage, usage_line};
