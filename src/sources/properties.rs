//! The key-value store and its line-oriented `key=value` text format.
//!
//! The format follows the usual `.properties` file conventions, read and
//! written as UTF-8:
//!
//! - `#` or `!` as the first non-blank character starts a comment line
//! - keys end at the first unescaped `=`, `:` or whitespace
//! - a line ending in an odd number of backslashes continues on the next line
//! - `\t`, `\n`, `\r`, `\f` and `\uXXXX` escapes are decoded

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::str::FromStr;

/// An ordered mapping of string keys to string values.
///
/// This is the substrate exchanged between the backing file and a
/// [`ConfigModel`](crate::core::ConfigModel). Keys are kept sorted so that
/// saved files are deterministic.
///
/// # Examples
///
/// ```rust
/// use hotswap_props::sources::Properties;
///
/// let props: Properties = "# people\nname = Alice\nage: 30\n".parse().unwrap();
/// assert_eq!(props.get("name"), Some("Alice"));
/// assert_eq!(props.get_or("salary", "100000.0"), "100000.0");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] if a `\u` escape is malformed.
    pub fn parse(input: &str) -> Result<Self> {
        let mut properties = Self::new();
        for (line, logical) in logical_lines(input) {
            let (raw_key, raw_value) = split_key_value(&logical);
            let key = unescape(raw_key, line)?;
            let value = unescape(raw_value, line)?;
            properties.entries.insert(key, value);
        }
        Ok(properties)
    }

    /// Get the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Get the value stored under `key`, or `default` when it is absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Set `key` to `value`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Iterate over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Render the store as properties text, preceded by the given comments.
    ///
    /// Each comment is written as one or more `#` lines; embedded line breaks
    /// start a new comment line.
    pub fn to_string_with(&self, comments: &[&str]) -> String {
        let mut out = String::new();
        for comment in comments {
            write_comment(&mut out, comment);
        }
        for (key, value) in &self.entries {
            escape_into(&mut out, key, true);
            out.push('=');
            escape_into(&mut out, value, false);
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(&[]))
    }
}

impl FromStr for Properties {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Self::new();
        properties.extend(iter);
        properties
    }
}

impl<K, V> Extend<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.entries.insert(key.into(), value.into());
        }
    }
}

/// Borrowing iterator over a [`Properties`] store.
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, String, String>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Properties {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// Splits on `\n`, `\r` and `\r\n`.
struct NaturalLines<'a> {
    rest: &'a str,
}

impl<'a> Iterator for NaturalLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        match self.rest.find(['\n', '\r']) {
            Some(idx) => {
                let line = &self.rest[..idx];
                let terminator = if self.rest[idx..].starts_with("\r\n") { 2 } else { 1 };
                self.rest = &self.rest[idx + terminator..];
                Some(line)
            }
            None => {
                let line = self.rest;
                self.rest = "";
                Some(line)
            }
        }
    }
}

/// Join continuation lines and drop comments and blank lines.
///
/// Yields the 1-based line number where each logical line starts, and the
/// logical line with leading whitespace removed and escapes still raw.
fn logical_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, natural) in (NaturalLines { rest: input }).enumerate() {
        let trimmed = natural.trim_start_matches(is_blank);

        let (start, mut buffer) = match pending.take() {
            Some(open) => open,
            None => {
                if trimmed.is_empty() || trimmed.starts_with(['#', '!']) {
                    continue;
                }
                (idx + 1, String::new())
            }
        };

        let trailing_backslashes = trimmed.chars().rev().take_while(|&c| c == '\\').count();
        if trailing_backslashes % 2 == 1 {
            buffer.push_str(&trimmed[..trimmed.len() - 1]);
            pending = Some((start, buffer));
        } else {
            buffer.push_str(trimmed);
            lines.push((start, buffer));
        }
    }

    if let Some(open) = pending {
        lines.push(open);
    }
    lines
}

/// Split a logical line into its raw key and raw value.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut has_separator = false;
    let mut escaped = false;

    for (idx, c) in line.char_indices() {
        if !escaped && (c == '=' || c == ':') {
            key_end = idx;
            value_start = idx + 1;
            has_separator = true;
            break;
        }
        if !escaped && is_blank(c) {
            key_end = idx;
            value_start = idx + 1;
            break;
        }
        escaped = c == '\\' && !escaped;
    }

    let mut rest = &line[value_start..];
    loop {
        rest = rest.trim_start_matches(is_blank);
        match rest.chars().next() {
            Some(c @ ('=' | ':')) if !has_separator => {
                has_separator = true;
                rest = &rest[c.len_utf8()..];
            }
            _ => break,
        }
    }

    (&line[..key_end], rest)
}

fn parse_hex4(s: &str) -> Option<u32> {
    let digits = s.get(..4)?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

fn unescape(raw: &str, line: usize) -> Result<String> {
    let malformed = |message: &str| ConfigError::ParseError {
        line,
        message: message.to_string(),
    };

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let rest = chars.as_str();
                let high = parse_hex4(rest).ok_or_else(|| malformed("Malformed \\uxxxx encoding"))?;
                chars = rest[4..].chars();

                let decoded = if (0xD800..=0xDBFF).contains(&high) {
                    // UTF-16 surrogate pair written as two escapes
                    let rest = chars.as_str();
                    let low = rest
                        .strip_prefix("\\u")
                        .and_then(parse_hex4)
                        .filter(|low| (0xDC00..=0xDFFF).contains(low))
                        .ok_or_else(|| malformed("Unpaired surrogate in \\uxxxx encoding"))?;
                    chars = rest[6..].chars();
                    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    high
                };

                let ch = char::from_u32(decoded)
                    .ok_or_else(|| malformed("Invalid code point in \\uxxxx encoding"))?;
                out.push(ch);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

fn escape_into(out: &mut String, text: &str, is_key: bool) {
    for (idx, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            ' ' if is_key || idx == 0 => out.push_str("\\ "),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii_control() => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
}

fn write_comment(out: &mut String, comment: &str) {
    for line in (NaturalLines { rest: comment }) {
        if line.starts_with(['#', '!']) {
            out.push_str(line);
        } else {
            out.push('#');
            out.push_str(line);
        }
        out.push('\n');
    }
}
