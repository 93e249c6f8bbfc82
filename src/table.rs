//! Table row splitting for both dialects.
//!
//! Pipes inside links (`[text|url]`), macros (`{color:red}`), and inline code
//! never separate cells. Markdown additionally honours `\|` escapes.

use std::sync::LazyLock;

use regex::Regex;

static SEP_RE: LazyLock<Regex> = lazy_regex!(
    r"^\s*\|[\s|:-]*-[\s|:-]*\|\s*$",
    "table separator regex should compile",
);

/// Whether `line` is a Markdown header separator such as `|---|:--:|`.
#[must_use]
pub(crate) fn is_separator_row(line: &str) -> bool { SEP_RE.is_match(line) }

/// Whether `line` looks like a table row in either dialect.
#[must_use]
pub(crate) fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.len() > 1
}

/// Tracks nesting so that pipes inside inline constructs are skipped.
#[derive(Default)]
struct Nesting {
    brackets: usize,
    braces: usize,
    code: bool,
}

impl Nesting {
    /// Update state for `ch` and report whether a pipe here is a separator.
    fn observe(&mut self, ch: char) -> bool {
        match ch {
            '`' => self.code = !self.code,
            '[' if !self.code => self.brackets += 1,
            ']' if !self.code => self.brackets = self.brackets.saturating_sub(1),
            '{' if !self.code => self.braces += 1,
            '}' if !self.code => self.braces = self.braces.saturating_sub(1),
            '|' => return !self.code && self.brackets == 0 && self.braces == 0,
            _ => {}
        }
        false
    }
}

/// Split a Markdown table row into trimmed cells.
#[must_use]
pub(crate) fn split_markdown_cells(line: &str) -> Vec<String> {
    let mut s = line.trim();
    if let Some(stripped) = s.strip_prefix('|') {
        s = stripped;
    }
    if let Some(stripped) = s.strip_suffix('|')
        && !stripped.ends_with('\\')
    {
        s = stripped;
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut nesting = Nesting::default();
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&'|') {
            chars.next();
            current.push('|');
            continue;
        }
        if nesting.observe(ch) {
            cells.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    cells.push(current.trim().to_string());
    cells
}

/// Split a Jira table row into cells.
///
/// Returns the cells and whether the row is a header row, i.e. whether it
/// opens with the `||` header separator.
#[must_use]
pub(crate) fn split_jira_cells(line: &str) -> (Vec<String>, bool) {
    let s = line.trim();
    let header = s.starts_with("||");
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut nesting = Nesting::default();
    let mut started = false;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if !nesting.observe(ch) {
            current.push(ch);
            continue;
        }
        while chars.peek() == Some(&'|') {
            chars.next();
        }
        if started {
            cells.push(current.trim().to_string());
        }
        current.clear();
        started = true;
    }
    if !current.trim().is_empty() {
        cells.push(current.trim().to_string());
    }
    (cells, header)
}
