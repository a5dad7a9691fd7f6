//! In-place edits of block-style YAML
//!
//! `serde_yaml` drops comments and reflows block scalars when it writes a
//! document back. The functions here locate a scalar with a line scanner
//! and rewrite only its bytes, so comments, quoting and the layout of every
//! untouched line survive. They return `None` when the document uses a shape
//! the scanner does not follow (flow collections, multi-line scalars at the
//! target); callers check the result structurally and fall back to a full
//! rewrite.

use serde_yaml::Value;
use std::ops::Range;

/// One step of a path into a YAML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Item(usize),
}

impl Segment {
    pub fn key(name: &str) -> Self {
        Segment::Key(name.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

/// A `key:` line and where its path and value sit
#[derive(Debug, Clone)]
struct Entry {
    line: usize,
    path: Vec<Segment>,
    columns: Vec<usize>,
    /// Absolute byte range of the inline value; empty for nested or null values.
    value: Range<usize>,
}

struct Frame {
    column: usize,
    segment: Segment,
}

fn split_lines(content: &str) -> Vec<Line<'_>> {
    let mut start = 0;
    content
        .split_inclusive('\n')
        .map(|raw| {
            let text = raw.trim_end_matches('\n').trim_end_matches('\r');
            let line = Line {
                start,
                end: start + raw.len(),
                text,
            };
            start += raw.len();
            line
        })
        .collect()
}

fn is_trivia(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Splits `key: ...` into the key and the offset just past its colon.
fn split_key(rest: &str) -> Option<(&str, usize)> {
    if rest.starts_with(['{', '[', '#', '|', '>']) {
        return None;
    }
    let bytes = rest.as_bytes();
    let colon = match bytes.first() {
        Some(&quote) if quote == b'"' || quote == b'\'' => {
            let close = rest[1..].find(quote as char)? + 1;
            if bytes.get(close + 1) != Some(&b':') {
                return None;
            }
            close + 1
        }
        _ => (0..bytes.len()).find(|&i| bytes[i] == b':' && (i + 1 == bytes.len() || bytes[i + 1] == b' '))?,
    };
    let key = rest[..colon].trim_end();
    if key.contains(" #") {
        return None;
    }
    Some((key.trim_matches(|c| c == '"' || c == '\''), colon + 1))
}

fn closing_quote(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let quote = bytes[0];
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote == b'"' => i += 2,
            b'\'' if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') => i += 2,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Range of the inline scalar starting at `from`, without comment or padding.
fn scalar_range(line: &str, from: usize) -> Range<usize> {
    let rest = &line[from..];
    let start = from + (rest.len() - rest.trim_start_matches(' ').len());
    let body = &line[start..];
    let end = match body.as_bytes().first() {
        None | Some(b'#') => start,
        Some(b'"') | Some(b'\'') => closing_quote(body).map_or(line.len(), |i| start + i + 1),
        Some(_) => start + body.find(" #").unwrap_or(body.len()),
    };
    start..start + line[start..end].trim_end().len()
}

fn scan(lines: &[Line<'_>]) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut block_scalar: Option<usize> = None;

    for (index, line) in lines.iter().enumerate() {
        let text = line.text;
        let indent = text.len() - text.trim_start_matches(' ').len();
        let mut rest = &text[indent..];
        if let Some(column) = block_scalar {
            if rest.trim().is_empty() || indent > column {
                continue;
            }
            block_scalar = None;
        }
        if is_trivia(rest) || rest.starts_with("---") || rest.starts_with("...") {
            continue;
        }

        let mut column = indent;
        while rest == "-" || rest.starts_with("- ") {
            let mut next = 0;
            while let Some(top) = stack.last() {
                let previous = match top.segment {
                    Segment::Item(previous) if top.column == column => Some(previous),
                    _ => None,
                };
                if top.column > column {
                    stack.pop();
                } else if let Some(previous) = previous {
                    next = previous + 1;
                    stack.pop();
                } else {
                    break;
                }
            }
            stack.push(Frame {
                column,
                segment: Segment::Item(next),
            });
            let after = rest[1..].trim_start_matches(' ');
            column += rest.len() - after.len();
            rest = after;
        }

        let Some((key, value_offset)) = split_key(rest) else {
            continue;
        };
        while stack.last().is_some_and(|top| top.column >= column) {
            stack.pop();
        }
        stack.push(Frame {
            column,
            segment: Segment::key(key),
        });

        let local = scalar_range(text, text.len() - rest.len() + value_offset);
        if text[local.clone()].starts_with(['|', '>']) {
            block_scalar = Some(column);
        }
        entries.push(Entry {
            line: index,
            path: stack.iter().map(|f| f.segment.clone()).collect(),
            columns: stack.iter().map(|f| f.column).collect(),
            value: line.start + local.start..line.start + local.end,
        });
    }
    entries
}

/// True when `value` reads back as the same string without quotes.
fn is_plain(value: &str) -> bool {
    !value.is_empty()
        && value.trim() == value
        && !value.contains(": ")
        && !value.contains(" #")
        && matches!(serde_yaml::from_str::<Value>(value), Ok(Value::String(s)) if s == value)
}

fn double_quoted(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{}\"", escaped)
}

/// Renders `value` in the quoting style of `original`.
fn format_scalar(original: &str, value: &str) -> String {
    match original.as_bytes().first() {
        Some(b'\'') => format!("'{}'", value.replace('\'', "''")),
        Some(b'"') => double_quoted(value),
        _ if is_plain(value) => value.to_string(),
        _ => double_quoted(value),
    }
}

fn insert_at(content: &str, offset: usize, text: &str) -> String {
    let mut out = String::with_capacity(content.len() + text.len() + 1);
    out.push_str(&content[..offset]);
    if offset > 0 && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(text);
    out.push_str(&content[offset..]);
    out
}

/// Offset just past the last significant line below `entries[index]`.
fn subtree_end(lines: &[Line<'_>], entries: &[Entry], index: usize) -> usize {
    let root = &entries[index];
    let next = entries[index + 1..]
        .iter()
        .find(|e| !e.path.starts_with(&root.path))
        .map_or(lines.len(), |e| e.line);
    let mut last = next;
    while last > root.line + 1 && is_trivia(lines[last - 1].text) {
        last -= 1;
    }
    lines[last - 1].end
}

fn has_children(entries: &[Entry], index: usize) -> bool {
    entries
        .get(index + 1)
        .is_some_and(|e| e.path.len() > entries[index].path.len() && e.path.starts_with(&entries[index].path))
}

/// Replaces the scalar at `path` with `value`, keeping its quoting style and
/// any trailing comment.
pub fn replace_scalar(content: &str, path: &[Segment], value: &str) -> Option<String> {
    let lines = split_lines(content);
    let entries = scan(&lines);
    let index = entries.iter().position(|e| e.path == path)?;
    if has_children(&entries, index) {
        return None;
    }
    let range = entries[index].value.clone();
    let original = &content[range.clone()];
    if original.starts_with(['|', '>', '{', '[', '&', '*', '!']) {
        return None;
    }

    let mut replacement = format_scalar(original, value);
    if range.is_empty() {
        if content[..range.start].ends_with(':') {
            replacement.insert(0, ' ');
        }
        if content[range.start..].starts_with('#') {
            replacement.push(' ');
        }
    }
    Some(format!("{}{}{}", &content[..range.start], replacement, &content[range.end..]))
}

/// Adds `key: value` as the last entry of the mapping at `parent`.
pub fn insert_key(content: &str, parent: &[Segment], key: &str, value: &str) -> Option<String> {
    let lines = split_lines(content);
    let entries = scan(&lines);
    let index = entries.iter().position(|e| e.path == parent)?;
    let entry = &entries[index];
    if !entry.value.is_empty() {
        return None;
    }
    let first_child = entries[index + 1..]
        .iter()
        .take_while(|e| e.path.starts_with(parent))
        .find(|e| e.path.len() == parent.len() + 1);
    let column = match first_child {
        Some(child) => match child.path[parent.len()] {
            Segment::Key(_) => child.columns[parent.len()],
            Segment::Item(_) => return None,
        },
        None => entry.columns[parent.len() - 1] + 2,
    };

    let text = format!("{}{}: {}\n", " ".repeat(column), key, format_scalar("", value));
    Some(insert_at(content, subtree_end(&lines, &entries, index), &text))
}

/// Appends a mapping item with `fields` to the block sequence at `sequence`,
/// laid out like the sequence's first item.
pub fn append_item(content: &str, sequence: &[Segment], fields: &[(&str, &str)]) -> Option<String> {
    let lines = split_lines(content);
    let entries = scan(&lines);
    let index = entries.iter().position(|e| e.path == sequence)?;
    if !entries[index].value.is_empty() || fields.is_empty() {
        return None;
    }
    let depth = sequence.len();
    let first = entries[index + 1..]
        .iter()
        .take_while(|e| e.path.starts_with(sequence))
        .find(|e| {
            e.path.len() == depth + 2
                && matches!(e.path[depth], Segment::Item(_))
                && matches!(e.path[depth + 1], Segment::Key(_))
        })?;
    let dash = first.columns[depth];
    let key = first.columns[depth + 1];

    let mut text = String::new();
    for (n, (name, value)) in fields.iter().enumerate() {
        if n == 0 {
            text.push_str(&" ".repeat(dash));
            text.push('-');
            text.push_str(&" ".repeat(key.saturating_sub(dash + 1).max(1)));
        } else {
            text.push_str(&" ".repeat(key));
        }
        text.push_str(&format!("{}: {}\n", name, format_scalar("", value)));
    }
    Some(insert_at(content, subtree_end(&lines, &entries, index), &text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(keys: &[&str]) -> Vec<Segment> {
        keys.iter().map(|k| Segment::key(k)).collect()
    }

    const RUNTIMES: &str = "\
# Runtimes served by the launcher
runtimes:
  - id: spring-boot
    versions:
      - id: current-community
        name: 2.2.0.RELEASE (Community)
      - id: current-redhat
        name: \"2.2.0.RELEASE (Red Hat)\"  # shown in the UI
  - id: vert.x
    versions:
    - id: community
      name: 3.9.0
";

    fn version_name(runtime: usize, version: usize) -> Vec<Segment> {
        vec![
            Segment::key("runtimes"),
            Segment::Item(runtime),
            Segment::key("versions"),
            Segment::Item(version),
            Segment::key("name"),
        ]
    }

    #[test]
    fn test_scan_tracks_sequence_items() {
        let lines = split_lines(RUNTIMES);
        let entries = scan(&lines);
        let names: Vec<&Vec<Segment>> = entries
            .iter()
            .filter(|e| matches!(e.path.last(), Some(Segment::Key(k)) if k == "name"))
            .map(|e| &e.path)
            .collect();
        assert_eq!(names, vec![&version_name(0, 0), &version_name(0, 1), &version_name(1, 0)]);
    }

    #[test]
    fn test_replace_keeps_comment_and_quotes() {
        let updated = replace_scalar(RUNTIMES, &version_name(0, 1), "2.2.1.RELEASE (Red Hat)").unwrap();
        assert_eq!(updated, RUNTIMES.replace("2.2.0.RELEASE (Red Hat)", "2.2.1.RELEASE (Red Hat)"));
    }

    #[test]
    fn test_replace_in_compact_sequence() {
        let updated = replace_scalar(RUNTIMES, &version_name(1, 0), "4.0.0").unwrap();
        assert_eq!(updated, RUNTIMES.replace("name: 3.9.0", "name: 4.0.0"));
    }

    #[test]
    fn test_replace_quotes_values_that_would_change_type() {
        let updated = replace_scalar("version: 1.0.0\n", &path(&["version"]), "2.2").unwrap();
        assert_eq!(updated, "version: \"2.2\"\n");
    }

    #[test]
    fn test_replace_fills_empty_value() {
        let updated = replace_scalar("git:\n  ref:\n", &path(&["git", "ref"]), "2.2.1-1").unwrap();
        assert_eq!(updated, "git:\n  ref: 2.2.1-1\n");
    }

    #[test]
    fn test_block_scalar_lines_are_not_keys() {
        let content = "description: |\n  note: not a key\nnote: real\n";
        let updated = replace_scalar(content, &path(&["note"]), "changed").unwrap();
        assert_eq!(updated, "description: |\n  note: not a key\nnote: changed\n");
    }

    #[test]
    fn test_replace_refuses_block_scalar_and_parents() {
        assert!(replace_scalar("text: >-\n  folded\n", &path(&["text"]), "x").is_none());
        assert!(replace_scalar("a:\n  b: 1\n", &path(&["a"]), "x").is_none());
        assert!(replace_scalar("a: 1\n", &path(&["missing"]), "x").is_none());
    }

    #[test]
    fn test_insert_key_after_siblings() {
        let content = "source:\n  git:\n    url: https://example.com/repo  # upstream\n\nname: demo\n";
        let updated = insert_key(content, &path(&["source", "git"]), "ref", "2.2.1-3").unwrap();
        assert_eq!(
            updated,
            "source:\n  git:\n    url: https://example.com/repo  # upstream\n    ref: 2.2.1-3\n\nname: demo\n"
        );
    }

    #[test]
    fn test_insert_key_into_empty_mapping_without_trailing_newline() {
        let updated = insert_key("source:\n  git:", &path(&["source", "git"]), "ref", "1.0.0-1").unwrap();
        assert_eq!(updated, "source:\n  git:\n    ref: 1.0.0-1\n");
    }

    #[test]
    fn test_append_item_follows_layout() {
        let sequence = vec![Segment::key("runtimes"), Segment::Item(0), Segment::key("versions")];
        let updated = append_item(
            RUNTIMES,
            &sequence,
            &[("id", "previous-community"), ("name", "1.5.22.RELEASE (Community)")],
        )
        .unwrap();
        let expected = RUNTIMES.replace(
            "  - id: vert.x\n",
            "      - id: previous-community\n        name: 1.5.22.RELEASE (Community)\n  - id: vert.x\n",
        );
        assert_eq!(updated, expected);
    }

    #[test]
    fn test_append_item_needs_an_existing_item() {
        assert!(append_item("versions: []\n", &path(&["versions"]), &[("id", "x")]).is_none());
    }
}
