//! Key/value store that carries parse results and caller metadata.
//!
//! The parser only needs [`Store`]: string lookup with a default and string
//! assignment. [`Options`] is the bundled implementation; it also doubles as
//! the configuration layer and can be loaded from YAML or JSON.
//!
//! Two keys are reserved for parse results:
//!
//! - [`COMMAND_KEY`] holds the canonical command path, space separated
//!   (`"delete package"`). The root command is the empty string.
//! - [`ARGS_KEY`] holds the residual positional arguments encoded with
//!   [`join_arguments`]. Decode with [`split_arguments`] or read both keys
//!   through [`command_path`] and [`residual_args`].
//!
//! # Example
//!
//! ```
//! use command_tree_core::{Options, Store, join_arguments, residual_args};
//!
//! let mut opts = Options::new();
//! opts.set("cmdline-args", &join_arguments(&["a", ""]));
//! assert_eq!(residual_args(&opts), vec!["a".to_string(), String::new()]);
//! assert_eq!(opts.get("missing", "fallback"), "fallback");
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Key under which the parser stores the matched command path.
pub const COMMAND_KEY: &str = "cmdline-command";

/// Key under which the parser stores the residual positional arguments.
pub const ARGS_KEY: &str = "cmdline-args";

/// Separator and terminator used by [`join_arguments`].
const ARG_TERMINATOR: char = '\0';

/// String key/value storage used by the parser.
///
/// Implementations are not expected to be shared between concurrent parses.
pub trait Store {
    /// Returns the value for `key`, or `default` when the key is absent.
    fn get(&self, key: &str, default: &str) -> String;

    /// Assigns `value` to `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str);
}

/// Encodes arguments as a single string, each argument followed by a NUL.
///
/// An empty list encodes to `""` and a list holding one empty string to
/// `"\0"`, so the two stay distinguishable.
///
/// ```
/// use command_tree_core::join_arguments;
///
/// assert_eq!(join_arguments::<&str>(&[]), "");
/// assert_eq!(join_arguments(&[""]), "\0");
/// assert_eq!(join_arguments(&["a", "b"]), "a\0b\0");
/// ```
pub fn join_arguments<S: AsRef<str>>(args: &[S]) -> String {
    let mut joined = String::new();
    for arg in args {
        joined.push_str(arg.as_ref());
        joined.push(ARG_TERMINATOR);
    }
    joined
}

/// Decodes a string produced by [`join_arguments`].
///
/// A missing final terminator is tolerated: the trailing text is kept as the
/// last argument.
///
/// ```
/// use command_tree_core::split_arguments;
///
/// assert!(split_arguments("").is_empty());
/// assert_eq!(split_arguments("\0"), vec![String::new()]);
/// assert_eq!(split_arguments("a\0b\0"), vec!["a".to_string(), "b".to_string()]);
/// ```
pub fn split_arguments(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    let body = joined.strip_suffix(ARG_TERMINATOR).unwrap_or(joined);
    body.split(ARG_TERMINATOR).map(String::from).collect()
}

/// Reads the command path written by the last parse.
pub fn command_path(store: &impl Store) -> String {
    store.get(COMMAND_KEY, "")
}

/// Reads and decodes the residual arguments written by the last parse.
pub fn residual_args(store: &impl Store) -> Vec<String> {
    split_arguments(&store.get(ARGS_KEY, ""))
}

/// In-memory [`Store`] backed by a sorted map.
///
/// Serializes as a flat string map, so a configuration file is simply:
///
/// ```yaml
/// program-name: demo
/// greeting: hello
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options {
    values: BTreeMap<String, String>,
}

impl Options {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads options from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::Error::Io) if the file cannot be read, or
    /// [`Yaml`](crate::Error::Yaml) if it is not a flat string map.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let options = serde_yaml::from_reader(reader)?;
        Ok(options)
    }

    /// Saves options to a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::Error::Io) or [`Yaml`](crate::Error::Yaml) on
    /// write or serialization failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Parses options from a JSON object of strings.
    ///
    /// # Errors
    ///
    /// Returns [`Json`](crate::Error::Json) on malformed input.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Renders the options as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Json`](crate::Error::Json) if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Renders the options as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Yaml`](crate::Error::Yaml) if serialization fails.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Copies every entry of `other` into `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: Options) {
        self.values.extend(other.values);
    }

    /// Returns `true` if `key` has a value.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Store for Options {
    fn get(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
