//! Variable resolution and display-name helpers.
//!
//! The pipeline never parses variable files itself; it consumes a
//! [`VariableResolver`] capability from the upstream collaborator. The
//! resolver replaces `${var.x}` / `${local.x}` markers where it can and
//! leaves the marker in place where it cannot, so callers can detect
//! unresolved names and fall back to declared resource names.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Default maximum length for truncated display names.
pub const DEFAULT_NAME_LEN: usize = 25;

static INTERPOLATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{(var|local)\.(\w+)\}").unwrap());

/// Capability for resolving interpolation markers in attribute strings.
pub trait VariableResolver {
    /// Replace `${var.x}` and `${local.x}` markers where resolvable.
    ///
    /// Unresolvable markers are returned unchanged inside the output string.
    fn resolve(&self, input: &str) -> String;
}

/// Resolver backed by in-memory variable and local tables.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    variables: IndexMap<String, String>,
    locals: IndexMap<String, String>,
}

impl MapResolver {
    /// Create an empty resolver (every marker stays unresolved).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable value (builder style).
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Add a local value (builder style).
    pub fn with_local(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.locals.insert(name.into(), value.into());
        self
    }
}

impl VariableResolver for MapResolver {
    fn resolve(&self, input: &str) -> String {
        INTERPOLATION_RE
            .replace_all(input, |captures: &Captures| {
                let table = match &captures[1] {
                    "var" => &self.variables,
                    _ => &self.locals,
                };
                match table.get(&captures[2]) {
                    Some(value) => value.clone(),
                    None => captures[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Whether a string still carries an unresolved interpolation marker.
pub fn contains_interpolation(value: &str) -> bool {
    value.contains("${")
}

/// Hard-truncate a name with a `...` suffix, never exceeding `max_len`.
pub fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }
    let kept: String = name.chars().take(max_len.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Title-case a display name: the first letter of every word is uppercased.
///
/// A word starts at the beginning of the string or after any non-alphabetic
/// character, so `prod-api gateway` becomes `Prod-Api Gateway`.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphabetic();
    }
    out
}
