//! Usage and help text rendering.
//!
//! [`render_usage`] produces the full help screen for a node: the usage line,
//! the description, a `Commands:`/`Sub-commands:` listing of every descendant
//! and an `Options:` table. The renderer is pure; the program name is passed
//! in rather than read from the process.
//!
//! Both listings are two-column tables aligned on a shared tab stop with a
//! two-space gutter after the widest left cell. Multi-line descriptions are
//! continued under the first description character.
//!
//! # Example
//!
//! ```
//! use command_tree_core::{CommandTree, options_help};
//!
//! let mut tree = CommandTree::new("app", "Example");
//! let root = tree.root();
//! tree.flags_mut(root).bool("v", false, "Verbose output").unwrap();
//! tree.flags_mut(root).bool("verbose", false, "Verbose output").unwrap();
//! tree.flags_mut(root).string("out", "-", "Write to `file`").unwrap();
//!
//! assert_eq!(
//!     options_help(tree.flags(root)),
//!     "  -out file     Write to file (default \"-\")\n\
//!     \x20 -v, -verbose  Verbose output\n",
//! );
//! ```

use std::collections::HashMap;

use crate::flags::{Flag, FlagSet, FlagValue};
use crate::tree::{CommandTree, NodeId};

/// Spaces between the widest left cell and the right column.
const GUTTER: usize = 2;

/// Indentation per tree level and before every option row.
const INDENT: &str = "  ";

/// Two-column table with tab-stop alignment.
#[derive(Debug, Default)]
struct Table {
    rows: Vec<(String, String)>,
}

impl Table {
    fn push(&mut self, left: String, right: String) {
        self.rows.push((left, right));
    }

    fn render(&self) -> String {
        let width = self
            .rows
            .iter()
            .map(|(left, _)| left.chars().count())
            .max()
            .unwrap_or(0)
            + GUTTER;

        let mut out = String::new();
        for (left, right) in &self.rows {
            let mut lines = right.split('\n');
            let first = lines.next().unwrap_or_default();
            push_line(&mut out, &format!("{left:<width$}{first}"));
            for line in lines {
                push_line(&mut out, &format!("{:width$}{line}", ""));
            }
        }
        out
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Builds the usage line: program, path, options marker, sub-command marker
/// and argument hint.
///
/// ```
/// use command_tree_core::{CommandTree, usage_line};
///
/// let mut tree = CommandTree::new("app", "");
/// let add = tree.add_command(tree.root(), "add", "").unwrap();
/// tree.add_command(add, "package", "").unwrap();
///
/// assert_eq!(usage_line(&tree, tree.root(), "app"), "Usage: app [-h|-help] [COMMAND] [ARGS...]");
/// ```
pub fn usage_line(tree: &CommandTree, node: NodeId, program: &str) -> String {
    let current = tree.node(node);
    let mut parts = vec![program];
    parts.extend(tree.path(node));

    parts.push(if current.flags().has_flags() {
        "[OPTIONS]"
    } else {
        "[-h|-help]"
    });

    if !current.subcommand_hint().is_empty() {
        parts.push(current.subcommand_hint());
    } else if !current.children().is_empty() {
        parts.push("[COMMAND]");
    }

    if !current.argument_hint().is_empty() {
        parts.push(current.argument_hint());
    }

    format!("Usage: {}", parts.join(" "))
}

/// Renders the complete help text for `node`.
pub fn render_usage(tree: &CommandTree, node: NodeId, program: &str) -> String {
    let current = tree.node(node);
    let mut out = usage_line(tree, node, program);
    out.push('\n');

    if !current.description().is_empty() {
        out.push('\n');
        out.push_str(current.description());
        out.push('\n');
    }

    if !current.children().is_empty() {
        let title = if current.is_root() { "Commands" } else { "Sub-commands" };
        out.push_str(&format!("\n{title}:\n"));
        out.push_str(&command_list(tree, node));
    }

    if current.flags().has_flags() {
        out.push_str("\nOptions:\n");
        out.push_str(&options_help(current.flags()));
    }

    out
}

/// Lists every descendant of `node`, indented two spaces per level.
///
/// Nodes that take no token are not printed, but their children keep the
/// extra indentation level.
pub fn command_list(tree: &CommandTree, node: NodeId) -> String {
    let mut table = Table::default();
    for (id, depth) in tree.descendants(node) {
        let child = tree.node(id);
        if !child.takes_token() {
            continue;
        }
        table.push(
            format!("{}{}", INDENT.repeat(depth), child.names().join(", ")),
            child.description().to_string(),
        );
    }
    table.render()
}

/// Flags sharing one description, rendered as a single row.
struct OptionRow<'a> {
    short: Vec<&'a str>,
    long: Vec<&'a str>,
    first: &'a Flag,
}

impl<'a> OptionRow<'a> {
    fn new(flag: &'a Flag) -> Self {
        let mut row = Self {
            short: Vec::new(),
            long: Vec::new(),
            first: flag,
        };
        row.add(flag);
        row
    }

    fn add(&mut self, flag: &'a Flag) {
        if flag.name.chars().count() == 1 {
            self.short.push(&flag.name);
        } else {
            self.long.push(&flag.name);
        }
    }

    fn left(&self, placeholder: &str) -> String {
        let names: Vec<&str> = self.short.iter().chain(&self.long).copied().collect();
        let mut left = format!("{INDENT}-{}", names.join(", -"));
        if !placeholder.is_empty() {
            left.push(' ');
            left.push_str(placeholder);
        }
        left
    }
}

/// Default annotation, or `None` when the default is the zero value.
fn default_annotation(value: &FlagValue) -> Option<String> {
    if value.is_zero() {
        return None;
    }
    Some(match value {
        FlagValue::Str(s) => format!("(default {s:?})"),
        other => format!("(default {other})"),
    })
}

/// Renders the option table of a flag set.
///
/// Flags with byte-identical usage strings are merged into one row, with
/// single-character names first. Rows follow ascending flag-name order of
/// their first member. The placeholder and default of that first member
/// represent the whole row.
pub fn options_help(flags: &FlagSet) -> String {
    let mut rows: Vec<OptionRow<'_>> = Vec::new();
    let mut by_usage: HashMap<&str, usize> = HashMap::new();

    for flag in flags.iter() {
        match by_usage.get(flag.usage.as_str()) {
            Some(&index) => rows[index].add(flag),
            None => {
                by_usage.insert(&flag.usage, rows.len());
                rows.push(OptionRow::new(flag));
            }
        }
    }

    let mut table = Table::default();
    for row in &rows {
        let (placeholder, usage) = row.first.unquote_usage();
        let right = match default_annotation(&row.first.default) {
            Some(annotation) if usage.is_empty() => annotation,
            Some(annotation) => format!("{usage} {annotation}"),
            None => usage,
        };
        table.push(row.left(&placeholder), right);
    }
    table.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Kind {
        Bool,
        Str(&'static str),
    }

    fn flag_set(options: &[(&[&str], Kind, &str)]) -> FlagSet {
        let mut flags = FlagSet::new("test");
        for (names, kind, usage) in options {
            for name in *names {
                match kind {
                    Kind::Bool => flags.bool(name, false, usage).unwrap(),
                    Kind::Str(default) => flags.string(name, default, usage).unwrap(),
                };
            }
        }
        flags
    }

    #[test]
    fn test_options_help_empty() {
        assert_eq!(options_help(&FlagSet::new("x")), "");
    }

    #[test]
    fn test_options_help_single_and_pair() {
        let flags = flag_set(&[(&["a"], Kind::Bool, "a")]);
        assert_eq!(options_help(&flags), "  -a  a\n");

        let flags = flag_set(&[(&["a"], Kind::Bool, "a"), (&["b"], Kind::Bool, "b")]);
        assert_eq!(options_help(&flags), "  -a  a\n  -b  b\n");
    }

    #[test]
    fn test_options_help_value_and_default() {
        let flags = flag_set(&[(&["a"], Kind::Str("val"), "a"), (&["b"], Kind::Bool, "b")]);
        assert_eq!(
            options_help(&flags),
            "  -a string  a (default \"val\")\n  -b         b\n"
        );
    }

    #[test]
    fn test_options_help_groups_short_and_long() {
        let flags = flag_set(&[(&["a", "aa"], Kind::Bool, "a")]);
        assert_eq!(options_help(&flags), "  -a, -aa  a\n");

        let flags = flag_set(&[(&["a", "aa"], Kind::Bool, "a"), (&["first"], Kind::Bool, "b")]);
        assert_eq!(options_help(&flags), "  -a, -aa  a\n  -first   b\n");
    }

    #[test]
    fn test_options_help_short_alias_listed_first() {
        let flags = flag_set(&[
            (&["a", "aa"], Kind::Bool, "a"),
            (&["first", "f"], Kind::Bool, "b"),
        ]);
        assert_eq!(options_help(&flags), "  -a, -aa     a\n  -f, -first  b\n");

        let flags = flag_set(&[
            (&["a", "aa"], Kind::Str("val"), "a"),
            (&["first", "f"], Kind::Bool, "b"),
        ]);
        assert_eq!(
            options_help(&flags),
            "  -a, -aa string  a (default \"val\")\n  -f, -first      b\n"
        );
    }

    #[test]
    fn test_options_help_multiline_usage() {
        let flags = flag_set(&[(&["a", "aa"], Kind::Bool, "a\nb")]);
        assert_eq!(options_help(&flags), "  -a, -aa  a\n           b\n");

        let flags = flag_set(&[
            (&["a", "aa"], Kind::Bool, "a\nb"),
            (&["first"], Kind::Bool, "b\nc"),
        ]);
        assert_eq!(
            options_help(&flags),
            "  -a, -aa  a\n           b\n  -first   b\n           c\n"
        );
    }

    #[test]
    fn test_empty_description_row_is_trimmed() {
        let flags = flag_set(&[
            (&["quiet"], Kind::Bool, ""),
            (&["verbose"], Kind::Bool, "Verbose output"),
        ]);
        assert_eq!(options_help(&flags), "  -quiet\n  -verbose  Verbose output\n");

        let mut tree = CommandTree::new("app", "");
        tree.add_command(tree.root(), "bare", "").unwrap();
        tree.add_command(tree.root(), "described", "Has text").unwrap();
        assert_eq!(
            command_list(&tree, tree.root()),
            "  bare\n  described  Has text\n"
        );
    }

    #[test]
    fn test_default_suppression() {
        let mut flags = FlagSet::new("x");
        flags.string("empty", "", "e").unwrap();
        flags.int("zero", 0, "z").unwrap();
        flags.bool("on", true, "o").unwrap();
        flags.float("rate", 1.5, "r").unwrap();
        assert_eq!(
            options_help(&flags),
            "  -empty string  e\n  \
             -on            o (default true)\n  \
             -rate float    r (default 1.5)\n  \
             -zero int      z\n"
        );
    }

    fn demo_tree() -> (CommandTree, NodeId, NodeId) {
        let mut tree = CommandTree::new("app", "Example program");
        let root = tree.root();
        tree.flags_mut(root).bool("version", false, "Display version").unwrap();
        tree.add_command(root, "hello-world hello hw", "Display Hello World!").unwrap();
        let level1 = tree.add_command(root, "level1", "Only a stepping stone").unwrap();
        tree.add_command(level1, "deadend", "Nothing here").unwrap();
        let level2 = tree.add_command(level1, "level2", "Show deeper level").unwrap();
        tree.add_command(level2, "end", "Unnecessarily deep").unwrap();
        tree.node_mut(level2).set_subcommand_hint("[end]");
        (tree, level1, level2)
    }

    #[test]
    fn test_render_usage_root() {
        let (tree, _, _) = demo_tree();
        let expected = concat!(
            "Usage: app [OPTIONS] [COMMAND] [ARGS...]\n",
            "\n",
            "Example program\n",
            "\n",
            "Commands:\n",
            "  hello-world, hello, hw  Display Hello World!\n",
            "  level1                  Only a stepping stone\n",
            "    deadend               Nothing here\n",
            "    level2                Show deeper level\n",
            "      end                 Unnecessarily deep\n",
            "\n",
            "Options:\n",
            "  -version  Display version\n",
        );
        assert_eq!(render_usage(&tree, tree.root(), "app"), expected);
    }

    #[test]
    fn test_render_usage_subcommand_lists_only_descendants() {
        let (tree, level1, _) = demo_tree();
        let expected = concat!(
            "Usage: app level1 [-h|-help] [COMMAND] [ARGS...]\n",
            "\n",
            "Only a stepping stone\n",
            "\n",
            "Sub-commands:\n",
            "  deadend  Nothing here\n",
            "  level2   Show deeper level\n",
            "    end    Unnecessarily deep\n",
        );
        assert_eq!(render_usage(&tree, level1, "app"), expected);
    }

    #[test]
    fn test_render_usage_hints() {
        let (mut tree, _, level2) = demo_tree();
        assert!(render_usage(&tree, level2, "app")
            .starts_with("Usage: app level1 level2 [-h|-help] [end] [ARGS...]\n"));

        let end = tree.find(&["level1", "level2", "end"]).unwrap();
        tree.node_mut(end).set_argument_hint("");
        assert_eq!(
            render_usage(&tree, end, "app"),
            "Usage: app level1 level2 end [-h|-help]\n\nUnnecessarily deep\n"
        );
    }

    #[test]
    fn test_multiline_command_description() {
        let mut tree = CommandTree::new("app", "");
        tree.add_command(tree.root(), "x", "first\nsecond").unwrap();
        assert_eq!(command_list(&tree, tree.root()), "  x  first\n     second\n");
    }
}
