//! Per-kernel target options and the fastmath override value.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KeeperError;

/// Target option enabling relaxed floating-point semantics.
pub const FASTMATH_OPTION: &str = "fastmath";

/// Target option requesting persistent caching.
pub const CACHE_OPTION: &str = "cache";

/// Key under which a decorator's `**mapping` argument is recorded.
pub const SPLAT_KEY: &str = "**";

/// Fast-math flags accepted in an explicit flag set.
pub const FASTMATH_FLAGS: &[&str] =
    &["afn", "arcp", "contract", "fast", "ninf", "nnan", "nsz", "reassoc"];

/// A single target option value, as written in the decorator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
    /// A set/list/tuple of string literals, e.g. `{"nsz", "arcp"}`.
    Flags(BTreeSet<String>),
    None,
    /// Anything that cannot be evaluated statically, kept as source text.
    Expr(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(true) => write!(f, "True"),
            OptionValue::Bool(false) => write!(f, "False"),
            OptionValue::Int(n) => write!(f, "{n}"),
            OptionValue::Str(s) => write!(f, "{s:?}"),
            OptionValue::Flags(flags) => {
                let quoted: Vec<String> = flags.iter().map(|flag| format!("{flag:?}")).collect();
                write!(f, "{{{}}}", quoted.join(", "))
            }
            OptionValue::None => write!(f, "None"),
            OptionValue::Expr(text) => write!(f, "{text}"),
        }
    }
}

/// Ordered mapping of option name to value for one kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetOptions(BTreeMap<String, OptionValue>);

impl TargetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Whether `key` is set, or could be set by an opaque `**mapping`.
    pub fn may_set(&self, key: &str) -> bool {
        self.contains(key) || self.contains(SPLAT_KEY)
    }

    /// Set `key`, returning the previous value if there was one.
    pub fn insert(&mut self, key: impl Into<String>, value: OptionValue) -> Option<OptionValue> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, OptionValue)> for TargetOptions {
    fn from_iter<T: IntoIterator<Item = (String, OptionValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Replacement value for the `fastmath` option when recompiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FastmathSetting {
    Enabled(bool),
    Flags(BTreeSet<String>),
}

impl From<FastmathSetting> for OptionValue {
    fn from(setting: FastmathSetting) -> Self {
        match setting {
            FastmathSetting::Enabled(on) => OptionValue::Bool(on),
            FastmathSetting::Flags(flags) => OptionValue::Flags(flags),
        }
    }
}

impl FromStr for FastmathSetting {
    type Err = KeeperError;

    /// Accepts `true`/`false` (any case) or a comma-separated flag list such
    /// as `nsz,arcp,contract`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return Ok(FastmathSetting::Enabled(true)),
            "false" => return Ok(FastmathSetting::Enabled(false)),
            _ => {}
        }

        let flags: BTreeSet<String> = trimmed
            .split(',')
            .map(str::trim)
            .filter(|flag| !flag.is_empty())
            .map(str::to_string)
            .collect();
        if flags.is_empty() || flags.iter().any(|flag| !FASTMATH_FLAGS.contains(&flag.as_str())) {
            return Err(KeeperError::InvalidFastmath(s.to_string()));
        }
        Ok(FastmathSetting::Flags(flags))
    }
}

/// Evaluate a decorator argument node into an [`OptionValue`].
///
/// Only literals are understood; everything else is kept as source text so
/// presence checks still work (`fastmath=config.FASTMATH` counts as set).
pub fn evaluate<D: ast_grep_core::Doc>(node: &ast_grep_core::Node<D>) -> OptionValue {
    let text = node.text().to_string();
    match node.kind().as_ref() {
        "true" => OptionValue::Bool(true),
        "false" => OptionValue::Bool(false),
        "none" => OptionValue::None,
        "integer" => text.parse().map(OptionValue::Int).unwrap_or(OptionValue::Expr(text)),
        "string" => match unquote(&text) {
            Some(inner) => OptionValue::Str(inner),
            None => OptionValue::Expr(text),
        },
        "set" | "list" | "tuple" => {
            let mut flags = BTreeSet::new();
            for element in node.children() {
                match element.kind().as_ref() {
                    "{" | "}" | "[" | "]" | "(" | ")" | "," | "comment" => {}
                    "string" => match unquote(&element.text()) {
                        Some(inner) => {
                            flags.insert(inner);
                        }
                        None => return OptionValue::Expr(text),
                    },
                    _ => return OptionValue::Expr(text),
                }
            }
            OptionValue::Flags(flags)
        }
        _ => OptionValue::Expr(text),
    }
}

/// Strip the quotes of a plain (non-f, non-byte) single-line string literal.
fn unquote(literal: &str) -> Option<String> {
    let body = literal.strip_prefix(&['r', 'R', 'u', 'U'][..]).unwrap_or(literal);
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if body.len() >= 2 * quote.len() && body.starts_with(quote) && body.ends_with(quote) {
            return Some(body[quote.len()..body.len() - quote.len()].to_string());
        }
    }
    None
}
