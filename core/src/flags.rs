//! Per-node flag parsing.
//!
//! Every command node owns one [`FlagSet`]. Flags use the single-dash
//! convention that the rendered usage text advertises: `-name`, `--name`,
//! `-name=value` and `-name value` are all accepted, and parsing stops at the
//! first positional token or at a `--` terminator. Tokenizing is delegated to
//! [`getopts`] in long-only mode; values are converted with [`FromStr`].
//!
//! # Examples
//!
//! ```
//! use command_tree_core::FlagSet;
//!
//! let mut flags = FlagSet::new("add");
//! flags.bool("force", false, "Overwrite existing entries").unwrap();
//! flags.string("target", "", "Install into `dir`").unwrap();
//!
//! flags.parse(&["-force", "--target=/opt", "pkg"]).unwrap();
//! assert_eq!(flags.get_bool("force"), Some(true));
//! assert_eq!(flags.get_str("target"), Some("/opt"));
//! assert_eq!(flags.args(), ["pkg"]);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use getopts::{Fail, HasArg, Occur, Options, ParsingStyle};
use thiserror::Error;

/// Errors raised while defining or parsing flags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// `-h` or `-help` was given and no flag of that name is defined.
    #[error("flag: help requested")]
    HelpRequested,
    /// Any other tokenizer failure.
    #[error("bad flag syntax: {0}")]
    BadSyntax(String),
    /// No flag of this name is defined on the node.
    #[error("flag provided but not defined: -{0}")]
    Undefined(String),
    /// A flag that takes a value was the last token.
    #[error("flag needs an argument: -{0}")]
    MissingValue(String),
    /// The value could not be converted to the flag's type.
    #[error("invalid value {value:?} for flag -{name}: {reason}")]
    InvalidValue {
        /// Flag name without dashes.
        name: String,
        /// The raw value as typed.
        value: String,
        /// Conversion failure.
        reason: String,
    },
    /// The same name was defined twice on one flag set.
    #[error("flag redefined: {0}")]
    Redefined(String),
    /// The name is empty, not ASCII, starts with `-` or contains `=` or
    /// whitespace.
    #[error("invalid flag name: {0:?}")]
    InvalidName(String),
}

impl From<Fail> for FlagError {
    fn from(fail: Fail) -> Self {
        match fail {
            Fail::UnrecognizedOption(name) if name == "h" || name == "help" => Self::HelpRequested,
            Fail::UnrecognizedOption(name) => Self::Undefined(name),
            Fail::ArgumentMissing(name) => Self::MissingValue(name),
            other => Self::BadSyntax(other.to_string()),
        }
    }
}

/// Typed value held by a flag.
///
/// The variant of a flag's default fixes its type: later assignments are
/// parsed into the same variant.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    /// Switch; present means `true` unless `=value` is given.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point number.
    Float(f64),
    /// Free-form string.
    Str(String),
}

impl FlagValue {
    /// Placeholder shown after the flag name in usage text. Empty for booleans.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
        }
    }

    /// Returns `true` for boolean values.
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    /// Returns `true` for `false`, `0`, `0.0` and the empty string.
    ///
    /// ```
    /// use command_tree_core::FlagValue;
    ///
    /// assert!(FlagValue::Str(String::new()).is_zero());
    /// assert!(FlagValue::Bool(false).is_zero());
    /// assert!(!FlagValue::Int(3).is_zero());
    /// ```
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Bool(b) => !b,
            Self::Int(n) => *n == 0,
            Self::Uint(n) => *n == 0,
            Self::Float(f) => *f == 0.0,
            Self::Str(s) => s.is_empty(),
        }
    }

    /// Parses `raw` into a value of the same variant as `self`.
    fn parse_as(&self, raw: &str) -> Result<Self, String> {
        Ok(match self {
            Self::Bool(_) => Self::Bool(convert(raw)?),
            Self::Int(_) => Self::Int(convert(raw)?),
            Self::Uint(_) => Self::Uint(convert(raw)?),
            Self::Float(_) => Self::Float(convert(raw)?),
            Self::Str(_) => Self::Str(raw.to_string()),
        })
    }
}

fn convert<T>(raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e: T::Err| e.to_string())
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// A single named flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    /// Name without leading dashes.
    pub name: String,
    /// Help text. A back-quoted word names the value placeholder.
    pub usage: String,
    /// Value the flag starts with; never changed by parsing.
    pub default: FlagValue,
    /// Current value.
    pub value: FlagValue,
}

impl Flag {
    /// Returns `(placeholder, usage)` with any back-quoted placeholder
    /// extracted from the usage text.
    ///
    /// ```
    /// use command_tree_core::{Flag, FlagValue};
    ///
    /// let flag = Flag {
    ///     name: "config".into(),
    ///     usage: "Read options from `file`".into(),
    ///     default: FlagValue::Str(String::new()),
    ///     value: FlagValue::Str(String::new()),
    /// };
    /// assert_eq!(flag.unquote_usage(), ("file".to_string(), "Read options from file".to_string()));
    /// ```
    pub fn unquote_usage(&self) -> (String, String) {
        if let Some(start) = self.usage.find('`') {
            let after = &self.usage[start + 1..];
            if let Some(len) = after.find('`') {
                let placeholder = &after[..len];
                let usage = format!(
                    "{}{}{}",
                    &self.usage[..start],
                    placeholder,
                    &after[len + 1..]
                );
                return (placeholder.to_string(), usage);
            }
        }
        (self.default.type_name().to_string(), self.usage.clone())
    }

    /// Whether the flag consumes a value token.
    pub fn takes_value(&self) -> bool {
        !self.default.is_bool()
    }
}

/// Flags owned by one command node, plus the positional arguments left over
/// after the last [`parse`](FlagSet::parse).
///
/// Flags are kept sorted by name; [`visit_all`](FlagSet::visit_all) and
/// [`iter`](FlagSet::iter) yield them in ascending order.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    name: String,
    flags: BTreeMap<String, Flag>,
    actual: BTreeSet<String>,
    args: Vec<String>,
    parsed: bool,
}

impl FlagSet {
    /// Creates an empty flag set. The name is only used for diagnostics.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn define(&mut self, name: &str, default: FlagValue, usage: &str) -> Result<&mut Self, FlagError> {
        let malformed = name.is_empty()
            || !name.is_ascii()
            || name.starts_with('-')
            || name.contains('=')
            || name.contains(char::is_whitespace);
        if malformed {
            return Err(FlagError::InvalidName(name.to_string()));
        }
        if self.flags.contains_key(name) {
            return Err(FlagError::Redefined(name.to_string()));
        }
        self.flags.insert(
            name.to_string(),
            Flag {
                name: name.to_string(),
                usage: usage.to_string(),
                value: default.clone(),
                default,
            },
        );
        Ok(self)
    }

    /// Defines a boolean flag.
    pub fn bool(&mut self, name: &str, default: bool, usage: &str) -> Result<&mut Self, FlagError> {
        self.define(name, FlagValue::Bool(default), usage)
    }

    /// Defines a signed integer flag.
    pub fn int(&mut self, name: &str, default: i64, usage: &str) -> Result<&mut Self, FlagError> {
        self.define(name, FlagValue::Int(default), usage)
    }

    /// Defines an unsigned integer flag.
    pub fn uint(&mut self, name: &str, default: u64, usage: &str) -> Result<&mut Self, FlagError> {
        self.define(name, FlagValue::Uint(default), usage)
    }

    /// Defines a floating point flag.
    pub fn float(&mut self, name: &str, default: f64, usage: &str) -> Result<&mut Self, FlagError> {
        self.define(name, FlagValue::Float(default), usage)
    }

    /// Defines a string flag.
    pub fn string(&mut self, name: &str, default: &str, usage: &str) -> Result<&mut Self, FlagError> {
        self.define(name, FlagValue::Str(default.to_string()), usage)
    }

    /// Looks up a flag by name (without dashes).
    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.flags.get(name)
    }

    /// Iterates all defined flags in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }

    /// Calls `f` for every defined flag in ascending name order.
    pub fn visit_all(&self, mut f: impl FnMut(&Flag)) {
        self.flags.values().for_each(|flag| f(flag));
    }

    /// Calls `f` for every flag that was set by parsing or [`set`](FlagSet::set).
    pub fn visit(&self, mut f: impl FnMut(&Flag)) {
        self.actual
            .iter()
            .filter_map(|name| self.flags.get(name))
            .for_each(|flag| f(flag));
    }

    /// Returns `true` if at least one flag is defined.
    pub fn has_flags(&self) -> bool {
        !self.flags.is_empty()
    }

    /// Number of defined flags.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Returns `true` if no flag is defined.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Whether the flag was given on the command line or via [`set`](FlagSet::set).
    pub fn is_set(&self, name: &str) -> bool {
        self.actual.contains(name)
    }

    /// Assigns a flag from its textual form, as if it had been parsed.
    ///
    /// # Errors
    ///
    /// Returns [`FlagError::Undefined`] for unknown names and
    /// [`FlagError::InvalidValue`] when `raw` does not convert.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<(), FlagError> {
        let flag = self
            .flags
            .get_mut(name)
            .ok_or_else(|| FlagError::Undefined(name.to_string()))?;
        flag.value = flag
            .value
            .parse_as(raw)
            .map_err(|reason| FlagError::InvalidValue {
                name: name.to_string(),
                value: raw.to_string(),
                reason,
            })?;
        self.actual.insert(name.to_string());
        Ok(())
    }

    /// Declares every flag on a fresh `getopts` parser. Single-character
    /// names are short options, the rest long ones; long-only mode lets both
    /// be written with one dash.
    fn options(&self) -> Options {
        let mut options = Options::new();
        options
            .parsing_style(ParsingStyle::StopAtFirstFree)
            .long_only(true);
        for flag in self.flags.values() {
            let (short, long) = if flag.name.len() == 1 {
                (flag.name.as_str(), "")
            } else {
                ("", flag.name.as_str())
            };
            // Booleans take an optional `=value`, so `-color=false` works.
            let (hint, has_arg) = if flag.takes_value() {
                (flag.default.type_name(), HasArg::Yes)
            } else {
                ("", HasArg::Maybe)
            };
            options.opt(short, long, &flag.usage, hint, has_arg, Occur::Multi);
        }
        options
    }

    /// Parses flags from the front of `args`.
    ///
    /// Parsing stops at the first token that is not a flag (including a lone
    /// `-`) or after a `--` terminator. Everything from that point on is
    /// available through [`args`](FlagSet::args). A repeated flag keeps its
    /// last value.
    ///
    /// # Errors
    ///
    /// [`FlagError::HelpRequested`] for an undefined `-h`/`-help`, otherwise
    /// the syntax or conversion error for the first offending flag.
    pub fn parse<S: AsRef<str>>(&mut self, args: &[S]) -> Result<(), FlagError> {
        self.parsed = true;
        self.args.clear();

        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        let matches = self.options().parse(&args)?;

        let given: Vec<(String, String)> = self
            .flags
            .keys()
            .filter(|name| matches.opt_present(name))
            .map(|name| {
                let raw = matches.opt_strs(name).pop();
                (name.clone(), raw.unwrap_or_else(|| "true".to_string()))
            })
            .collect();
        for (name, raw) in given {
            self.set(&name, &raw)?;
        }

        self.args = matches.free;
        Ok(())
    }

    /// Whether [`parse`](FlagSet::parse) has been called.
    pub fn parsed(&self) -> bool {
        self.parsed
    }

    /// Positional arguments left after the last parse.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Current value of a flag.
    pub fn value(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name).map(|f| &f.value)
    }

    /// Current value of a boolean flag.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.value(name)? {
            FlagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Current value of a signed integer flag.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.value(name)? {
            FlagValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Current value of an unsigned integer flag.
    pub fn get_uint(&self, name: &str) -> Option<u64> {
        match self.value(name)? {
            FlagValue::Uint(n) => Some(*n),
            _ => None,
        }
    }

    /// Current value of a floating point flag.
    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.value(name)? {
            FlagValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Current value of a string flag.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.value(name)? {
            FlagValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlagSet {
        let mut flags = FlagSet::new("test");
        flags.bool("verbose", false, "Verbose output").unwrap();
        flags.int("depth", 1, "Recursion depth").unwrap();
        flags.uint("jobs", 0, "Parallel jobs").unwrap();
        flags.float("ratio", 0.5, "Ratio").unwrap();
        flags.string("name", "", "Name").unwrap();
        flags
    }

    #[test]
    fn test_parse_stops_at_first_positional() {
        let mut flags = sample();
        flags.parse(&["-verbose", "add", "-depth", "3"]).unwrap();

        assert_eq!(flags.get_bool("verbose"), Some(true));
        assert_eq!(flags.get_int("depth"), Some(1));
        assert_eq!(flags.args(), ["add", "-depth", "3"]);
    }

    #[test]
    fn test_parse_value_forms() {
        let mut flags = sample();
        flags
            .parse(&["--depth", "-4", "-jobs=16", "-ratio=2.25", "-name", "x y"])
            .unwrap();

        assert_eq!(flags.get_int("depth"), Some(-4));
        assert_eq!(flags.get_uint("jobs"), Some(16));
        assert_eq!(flags.get_float("ratio"), Some(2.25));
        assert_eq!(flags.get_str("name"), Some("x y"));
        assert!(flags.args().is_empty());
    }

    #[test]
    fn test_double_dash_terminates() {
        let mut flags = sample();
        flags.parse(&["-verbose", "--", "-name", "x"]).unwrap();
        assert_eq!(flags.args(), ["-name", "x"]);
    }

    #[test]
    fn test_single_dash_is_positional() {
        let mut flags = sample();
        flags.parse(&["-", "-verbose"]).unwrap();
        assert_eq!(flags.args(), ["-", "-verbose"]);
        assert_eq!(flags.get_bool("verbose"), Some(false));
    }

    #[test]
    fn test_bool_explicit_value() {
        let mut flags = sample();
        flags.bool("color", true, "Colorize").unwrap();
        flags.parse(&["-color=false"]).unwrap();
        assert_eq!(flags.get_bool("color"), Some(false));
        assert!(flags.is_set("color"));
        assert!(!flags.is_set("verbose"));

        let mut seen = Vec::new();
        flags.visit(|f| seen.push(f.name.clone()));
        assert_eq!(seen, ["color"]);
    }

    #[test]
    fn test_help_requested_when_undefined() {
        let mut flags = sample();
        assert_eq!(flags.parse(&["-h"]), Err(FlagError::HelpRequested));
        assert_eq!(flags.parse(&["--help"]), Err(FlagError::HelpRequested));
    }

    #[test]
    fn test_defined_help_flag_is_not_a_help_request() {
        let mut flags = FlagSet::new("test");
        flags.bool("help", false, "Custom help").unwrap();
        flags.parse(&["-help"]).unwrap();
        assert_eq!(flags.get_bool("help"), Some(true));
    }

    #[test]
    fn test_parse_errors() {
        let mut flags = sample();
        assert_eq!(
            flags.parse(&["-missing"]),
            Err(FlagError::Undefined("missing".to_string()))
        );
        assert_eq!(
            flags.parse(&["-name"]),
            Err(FlagError::MissingValue("name".to_string()))
        );
        assert_eq!(
            flags.parse(&["---x"]),
            Err(FlagError::Undefined("-x".to_string()))
        );
        assert!(matches!(
            flags.parse(&["-depth", "abc"]),
            Err(FlagError::InvalidValue { ref name, .. }) if name == "depth"
        ));
        assert!(matches!(
            flags.parse(&["-verbose=maybe"]),
            Err(FlagError::InvalidValue { .. })
        ));
        assert!(matches!(
            flags.parse(&["-jobs", "-1"]),
            Err(FlagError::InvalidValue { ref name, .. }) if name == "jobs"
        ));
    }

    #[test]
    fn test_repeated_flag_keeps_last_value() {
        let mut flags = sample();
        flags
            .parse(&["-depth", "2", "-depth=5", "-verbose", "-verbose=false"])
            .unwrap();
        assert_eq!(flags.get_int("depth"), Some(5));
        assert_eq!(flags.get_bool("verbose"), Some(false));
    }

    #[test]
    fn test_short_names_use_one_dash_or_two() {
        let mut flags = FlagSet::new("test");
        flags.bool("v", false, "Verbose").unwrap();
        flags.string("o", "", "Output").unwrap();
        flags.parse(&["--v", "-o", "out.txt", "rest"]).unwrap();
        assert_eq!(flags.get_bool("v"), Some(true));
        assert_eq!(flags.get_str("o"), Some("out.txt"));
        assert_eq!(flags.args(), ["rest"]);
    }

    #[test]
    fn test_define_rejects_bad_names() {
        let mut flags = sample();
        assert_eq!(
            flags.bool("verbose", true, "again").err(),
            Some(FlagError::Redefined("verbose".to_string()))
        );
        assert!(matches!(flags.bool("-x", false, ""), Err(FlagError::InvalidName(_))));
        assert!(matches!(flags.bool("a=b", false, ""), Err(FlagError::InvalidName(_))));
        assert!(matches!(flags.bool("", false, ""), Err(FlagError::InvalidName(_))));
        assert!(matches!(flags.bool("a b", false, ""), Err(FlagError::InvalidName(_))));
        assert!(matches!(flags.bool("\u{e9}", false, ""), Err(FlagError::InvalidName(_))));
    }

    #[test]
    fn test_visit_all_is_sorted() {
        let flags = sample();
        let mut names = Vec::new();
        flags.visit_all(|f| names.push(f.name.clone()));
        assert_eq!(names, ["depth", "jobs", "name", "ratio", "verbose"]);
    }

    #[test]
    fn test_parse_resets_positionals() {
        let mut flags = sample();
        flags.parse(&["a", "b"]).unwrap();
        flags.parse(&["-verbose"]).unwrap();
        assert!(flags.parsed());
        assert!(flags.args().is_empty());
    }

    #[test]
    fn test_unquote_usage_without_backquotes() {
        let flags = sample();
        let (placeholder, usage) = flags.lookup("depth").unwrap().unquote_usage();
        assert_eq!(placeholder, "int");
        assert_eq!(usage, "Recursion depth");
        let (placeholder, _) = flags.lookup("verbose").unwrap().unquote_usage();
        assert_eq!(placeholder, "");
    }
}
