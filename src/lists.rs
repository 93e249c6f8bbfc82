//! List item recognition and numbering.
//!
//! Markdown nesting is measured from indentation, two columns per level. Jira
//! markup encodes nesting in the length of the marker run (`*`, `**`, `*#`),
//! with the final marker deciding between bullets and numbers.

use std::sync::LazyLock;

use regex::Regex;

/// Columns of indentation per Markdown nesting level.
pub(crate) const INDENT_UNIT: usize = 2;

static MARKDOWN_ITEM_RE: LazyLock<Regex> = lazy_regex!(
    r"^(\s*)([-*+]|\d{1,9}[.)])(?:[ \t]+(.*))?$",
    "markdown list item regex should compile",
);

static JIRA_ITEM_RE: LazyLock<Regex> = lazy_regex!(
    r"^\s*([*#-]+)[ \t]+(.*)$",
    "jira list item regex should compile",
);

/// A recognised list item line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ListLine<'a> {
    pub(crate) ordered: bool,
    pub(crate) indent: usize,
    pub(crate) content: &'a str,
}

fn indent_len(indent: &str) -> usize {
    indent
        .chars()
        .fold(0, |acc, ch| acc + if ch == '\t' { 4 } else { 1 })
}

/// Parse a Markdown bullet or numbered list item.
pub(crate) fn parse_markdown_item(line: &str) -> Option<ListLine<'_>> {
    let cap = MARKDOWN_ITEM_RE.captures(line)?;
    let indent = indent_len(cap.get(1)?.as_str()) / INDENT_UNIT;
    let marker = cap.get(2)?.as_str();
    Some(ListLine {
        ordered: marker.starts_with(|c: char| c.is_ascii_digit()),
        indent,
        content: cap.get(3).map_or("", |m| m.as_str()),
    })
}

/// Parse a Jira list item such as `** nested` or `*# numbered`.
pub(crate) fn parse_jira_item(line: &str) -> Option<ListLine<'_>> {
    let cap = JIRA_ITEM_RE.captures(line)?;
    let run = cap.get(1)?.as_str();
    Some(ListLine {
        ordered: run.ends_with('#'),
        indent: run.len() - 1,
        content: cap.get(2).map_or("", |m| m.as_str()),
    })
}

/// Assigns sequential numbers to ordered items per nesting level.
///
/// Counters for deeper levels are dropped whenever a shallower item appears,
/// and everything resets when the list is interrupted.
#[derive(Debug, Default)]
pub(crate) struct Numbering {
    counters: Vec<(usize, usize)>,
}

impl Numbering {
    fn prune_deeper(&mut self, indent: usize) {
        while self.counters.last().is_some_and(|(d, _)| *d > indent) {
            self.counters.pop();
        }
    }

    /// Record an item and return its number when it is ordered.
    pub(crate) fn next(&mut self, indent: usize, ordered: bool) -> Option<usize> {
        self.prune_deeper(indent);
        if !ordered {
            if self.counters.last().is_some_and(|(d, _)| *d == indent) {
                self.counters.pop();
            }
            return None;
        }
        match self.counters.last_mut() {
            Some((d, count)) if *d == indent => {
                *count += 1;
                Some(*count)
            }
            _ => {
                self.counters.push((indent, 1));
                Some(1)
            }
        }
    }

    pub(crate) fn reset(&mut self) { self.counters.clear(); }
}

/// Builds Jira marker runs from the kinds of the enclosing items.
#[derive(Debug, Default)]
pub(crate) struct MarkerStack {
    kinds: Vec<bool>,
}

impl MarkerStack {
    /// Marker run for an item at `indent`; missing ancestors take the item's
    /// own kind.
    pub(crate) fn marker(&mut self, indent: usize, ordered: bool) -> String {
        self.kinds.truncate(indent);
        while self.kinds.len() < indent {
            self.kinds.push(ordered);
        }
        self.kinds.push(ordered);
        self.kinds
            .iter()
            .map(|&o| if o { '#' } else { '*' })
            .collect()
    }

    pub(crate) fn reset(&mut self) { self.kinds.clear(); }
}
