//! Path-addressed edits on a YAML node tree.
//!
//! Values are addressed by a [`FieldPath`] such as
//! `sources.my-bq-source.project`. Reads never fail: a path that runs into
//! a missing key or a non-mapping node simply has no value. Writes create
//! missing intermediate mappings but refuse to replace a non-mapping node,
//! so a malformed document is reported rather than repaired.
//!
//! Mappings keep insertion order, so a write to an existing key leaves every
//! sibling where it was.
//!
//! [`set_path_in_text`] applies the same write to the source text instead,
//! touching only the lines that hold the value so comments, quoting and
//! layout elsewhere in the file are kept byte for byte.

use std::{fmt, str::FromStr};

use masterror::Error;
use serde_yaml::{Mapping, Value};

/// Dotted path into a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>
}

/// Dotted path with an empty segment
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid field path '{0}': segments must be non-empty")]
pub struct InvalidFieldPath(pub String);

/// Write blocked by a node that is not a mapping
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot set '{path}': '{at}' is not a mapping")]
pub struct PathConflict {
    pub path: String,
    pub at:   String
}

impl FieldPath {
    /// Build a path from raw segments
    ///
    /// Use this when a segment itself contains a dot.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect()
        }
    }

    /// Path of a field inside `sources.<source_name>`
    pub fn source_field(source_name: &str, field: &str) -> Self {
        Self::new(["sources", source_name, field])
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn prefix(&self, len: usize) -> String {
        self.segments[..len].join(".")
    }
}

impl FromStr for FieldPath {
    type Err = InvalidFieldPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<String> = s.split('.').map(String::from).collect();
        if segments.iter().any(String::is_empty) {
            return Err(InvalidFieldPath(s.to_string()));
        }
        Ok(Self {
            segments
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Read the value at `path`
pub fn get_path<'a>(doc: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments
        .iter()
        .try_fold(doc, |node, segment| node.as_mapping()?.get(segment.as_str()))
}

/// Whether a read result counts as unset
///
/// An absent path and an explicit null are the same case. Every other value,
/// the empty string included, is set.
pub fn is_unset(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Write `value` at `path`, creating missing mappings along the way
pub fn set_path(doc: &mut Value, path: &FieldPath, value: Value) -> Result<(), PathConflict> {
    let mut node = doc;
    for (depth, segment) in path.segments.iter().enumerate() {
        if node.is_null() {
            *node = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(map) = node else {
            let at = if depth == 0 {
                String::from("<root>")
            } else {
                path.prefix(depth)
            };
            return Err(PathConflict {
                path: path.to_string(),
                at
            });
        };
        let key = Value::String(segment.clone());
        if depth + 1 == path.segments.len() {
            map.insert(key, value);
            return Ok(());
        }
        node = map.entry(key).or_insert(Value::Null);
    }
    // empty path addresses the root
    *node = value;
    Ok(())
}

/// One physical line of a document
struct Line<'a> {
    indent: usize,
    /// Text after the indentation, without the line ending
    body:   &'a str,
    ending: &'a str
}

impl Line<'_> {
    /// Whether the line carries document content
    fn is_content(&self) -> bool {
        !self.body.is_empty()
            && !self.body.starts_with('#')
            && !self.body.starts_with("---")
            && !self.body.starts_with("...")
            && !self.body.starts_with('%')
    }
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    text.split_inclusive('\n')
        .map(|raw| {
            let line = raw.trim_end_matches(['\r', '\n']);
            let body = line.trim_start_matches(' ');
            Line {
                indent: line.len() - body.len(),
                body,
                ending: &raw[line.len()..]
            }
        })
        .collect()
}

/// `key: rest` split at the mapping colon
struct KeyLine<'a> {
    name:    &'a str,
    /// Key exactly as written, quotes included
    raw:     &'a str,
    value:   &'a str,
    /// Trailing comment with the whitespace before it
    comment: &'a str
}

fn split_key(body: &str) -> Option<KeyLine<'_>> {
    if body.starts_with("- ") || body == "-" || body.starts_with('?') {
        return None;
    }
    let (name, colon) = match body.chars().next()? {
        quote @ ('"' | '\'') => {
            let close = body[1..].find(quote)? + 1;
            let after = &body[close + 1..];
            let gap = after.len() - after.trim_start_matches(' ').len();
            if !after[gap..].starts_with(':') {
                return None;
            }
            (&body[1..close], close + 1 + gap)
        }
        _ => {
            let bytes = body.as_bytes();
            let colon = (0..bytes.len()).find(|&i| {
                bytes[i] == b':' && matches!(bytes.get(i + 1), None | Some(b' ' | b'\t'))
            })?;
            (body[..colon].trim_end(), colon)
        }
    };
    if name.is_empty() {
        return None;
    }
    let (value, comment) = split_comment(&body[colon + 1..]);
    Some(KeyLine {
        name,
        raw: &body[..colon],
        value,
        comment
    })
}

fn split_comment(rest: &str) -> (&str, &str) {
    let bytes = rest.as_bytes();
    let (mut single, mut double) = (false, false);
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' if !double => single = !single,
            b'"' if !single => double = !double,
            b'#' if !single && !double && (i == 0 || matches!(bytes[i - 1], b' ' | b'\t')) => {
                let start = rest[..i].trim_end_matches([' ', '\t']).len();
                return (rest[..start].trim(), &rest[start..]);
            }
            _ => {}
        }
    }
    (rest.trim(), "")
}

fn is_null_literal(value: &str) -> bool {
    matches!(value, "" | "~" | "null" | "Null" | "NULL")
}

/// First line index at or after `from` that closes a block opened at `indent`
fn block_end(lines: &[Line<'_>], from: usize, limit: usize, indent: usize) -> usize {
    (from..limit)
        .find(|&i| lines[i].is_content() && lines[i].indent <= indent)
        .unwrap_or(limit)
}

/// Write a string scalar at `path` by editing only the affected lines
///
/// Handles block-style mappings: a null value at `path` is replaced on its
/// own line with the trailing comment kept, and a missing key is inserted
/// after the last line of its parent mapping, creating missing parents the
/// same way. Every other byte of `text` is kept. Returns `None` when the
/// layout is outside that subset (flow collections, multi-line values), in
/// which case the caller has to fall back to re-serializing the tree.
pub fn set_path_in_text(text: &str, path: &FieldPath, value: &str) -> Option<String> {
    let scalar = serde_yaml::to_string(&Value::String(value.to_string())).ok()?;
    let scalar = scalar.trim_end_matches('\n');
    if scalar.contains('\n') {
        return None;
    }

    let lines = split_lines(text);
    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let last = path.segments.len().checked_sub(1)?;
    let (mut start, mut end) = (0, lines.len());
    let mut parent_indent = None;

    for (depth, segment) in path.segments.iter().enumerate() {
        let child_indent = lines[start..end]
            .iter()
            .find(|l| l.is_content())
            .map(|l| l.indent);
        let found = child_indent.and_then(|indent| {
            (start..end).find_map(|i| {
                let line = &lines[i];
                if !line.is_content() || line.indent != indent {
                    return None;
                }
                split_key(line.body)
                    .filter(|key| key.name == segment.as_str())
                    .map(|key| (i, key))
            })
        });

        let Some((idx, key)) = found else {
            let indent = child_indent.unwrap_or_else(|| parent_indent.map_or(0, |p| p + 2));
            let at = match (start..end).rev().find(|&i| lines[i].is_content()) {
                Some(i) => i + 1,
                None if parent_indent.is_none() => end,
                None => start
            };
            let mut inserted = String::new();
            for (offset, name) in path.segments[depth..].iter().enumerate() {
                let name = serde_yaml::to_string(&Value::String(name.clone())).ok()?;
                inserted.push_str(&" ".repeat(indent + offset * 2));
                inserted.push_str(name.trim_end_matches('\n'));
                inserted.push(':');
                if depth + offset == last {
                    inserted.push(' ');
                    inserted.push_str(scalar);
                }
                inserted.push_str(newline);
            }
            return Some(rebuild(text, &lines, at, at, &inserted, newline));
        };

        if depth == last {
            if !is_null_literal(key.value) {
                return None;
            }
            let line = &lines[idx];
            let replaced = format!(
                "{}{}: {}{}{}",
                " ".repeat(line.indent),
                key.raw,
                scalar,
                key.comment,
                line.ending
            );
            return Some(rebuild(text, &lines, idx, idx + 1, &replaced, newline));
        }
        if !key.value.is_empty() {
            return None;
        }
        let indent = lines[idx].indent;
        start = idx + 1;
        end = block_end(&lines, start, end, indent);
        parent_indent = Some(indent);
    }
    None
}

/// Replace lines `from..to` of `text` with `replacement`
fn rebuild(
    text: &str,
    lines: &[Line<'_>],
    from: usize,
    to: usize,
    replacement: &str,
    newline: &str
) -> String {
    let offset = |idx: usize| -> usize {
        lines[..idx]
            .iter()
            .map(|l| l.indent + l.body.len() + l.ending.len())
            .sum()
    };
    let (head, tail) = (&text[..offset(from)], &text[offset(to)..]);
    let mut out = String::with_capacity(text.len() + replacement.len() + newline.len());
    out.push_str(head);
    if !head.is_empty() && !head.ends_with('\n') {
        out.push_str(newline);
    }
    out.push_str(replacement);
    out.push_str(tail);
    out
}
