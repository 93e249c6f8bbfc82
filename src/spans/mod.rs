//! Inline span tokenizer.
//!
//! [`tokenize_spans`] scans a line left to right. At each position the
//! dialect's recognisers try to match a delimited construct; anything they do
//! not claim is accumulated as literal text. Unmatched delimiters therefore
//! survive as text and no input character is ever dropped.

mod jira;
mod markdown;

use crate::ast::{Dialect, Span, push_span};

/// Split `line` into inline spans according to `dialect`.
///
/// # Examples
///
/// ```
/// use wikimark::{Dialect, Span, tokenize_spans};
///
/// let spans = tokenize_spans("a *b*", Dialect::JiraMarkup);
/// assert_eq!(spans, vec![Span::text("a "), Span::Bold(vec![Span::text("b")])]);
/// ```
#[must_use]
pub fn tokenize_spans(line: &str, dialect: Dialect) -> Vec<Span> {
    let recognise = match dialect {
        Dialect::Markdown => markdown::recognise,
        Dialect::JiraMarkup => jira::recognise,
    };
    let mut out = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;
    while i < line.len() {
        if let Some((span, next)) = recognise(line, i) {
            push_span(&mut out, Span::text(&line[literal_start..i]));
            push_span(&mut out, span);
            i = next;
            literal_start = next;
        } else {
            i += char_len_at(line, i);
        }
    }
    push_span(&mut out, Span::text(&line[literal_start..]));
    out
}

/// A recogniser result: the span and the byte offset just past it.
type Match = Option<(Span, usize)>;

fn char_len_at(text: &str, i: usize) -> usize { text[i..].chars().next().map_or(1, char::len_utf8) }

fn prev_char(text: &str, i: usize) -> Option<char> { text[..i].chars().next_back() }

/// Match a symmetric delimiter pair such as `*x*` or `~~x~~` opening at `i`.
///
/// The opener must be followed by non-whitespace and the closer preceded by
/// non-whitespace. A closer directly followed by the marker's own character
/// is skipped so that `***x***` nests. Unless `intraword` is set, the pair may
/// not touch an alphanumeric character on the outside.
///
/// Returns the byte offsets of the closer's start and end.
fn match_symmetric(text: &str, i: usize, marker: &str, intraword: bool) -> Option<(usize, usize)> {
    if !text[i..].starts_with(marker) {
        return None;
    }
    let open_end = i + marker.len();
    let first = text[open_end..].chars().next()?;
    if first.is_whitespace() {
        return None;
    }
    if !intraword && prev_char(text, i).is_some_and(char::is_alphanumeric) {
        return None;
    }
    let lead = marker.chars().next()?;
    let mut search = open_end + first.len_utf8();
    while let Some(rel) = text[search..].find(marker) {
        let close = search + rel;
        let end = close + marker.len();
        let after = text[end..].chars().next();
        let flanked = prev_char(text, close).is_some_and(|c| !c.is_whitespace())
            && after != Some(lead)
            && (intraword || !after.is_some_and(char::is_alphanumeric));
        if flanked {
            return Some((close, end));
        }
        search = close + lead.len_utf8();
    }
    None
}

/// Wrap the tokenized content of a symmetric pair with `wrap`.
fn symmetric_span(
    text: &str,
    i: usize,
    marker: &str,
    intraword: bool,
    dialect: Dialect,
    wrap: fn(Vec<Span>) -> Span,
) -> Match {
    let (close, end) = match_symmetric(text, i, marker, intraword)?;
    let inner = &text[i + marker.len()..close];
    Some((wrap(tokenize_spans(inner, dialect)), end))
}

/// Match `open ... close` starting at `i`, returning the inner slice and the
/// end offset. The content must be non-empty.
fn match_enclosed<'a>(text: &'a str, i: usize, open: &str, close: &str) -> Option<(&'a str, usize)> {
    if !text[i..].starts_with(open) {
        return None;
    }
    let start = i + open.len();
    let first = char_len_at(text, start);
    let rel = text.get(start + first..)?.find(close)? + first;
    Some((&text[start..start + rel], start + rel + close.len()))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("*x*", "*", false, Some((2, 3)))]
    #[case("* x*", "*", false, None)]
    #[case("*x *", "*", false, None)]
    #[case("a^2^", "^", true, None)]
    #[case("^2^", "^", true, Some((2, 3)))]
    #[case("***x***", "**", false, Some((5, 7)))]
    fn symmetric_matching(
        #[case] text: &str,
        #[case] marker: &str,
        #[case] intraword: bool,
        #[case] expected: Option<(usize, usize)>,
    ) {
        assert_eq!(match_symmetric(text, 0, marker, intraword), expected);
    }

    #[test]
    fn intraword_marker_matches_mid_word() {
        assert_eq!(match_symmetric("a^2^", 1, "^", true), Some((3, 4)));
        assert_eq!(match_symmetric("a*x*", 1, "*", false), None);
    }

    #[test]
    fn enclosed_requires_content() {
        assert_eq!(match_enclosed("{{}}", 0, "{{", "}}"), None);
        assert_eq!(match_enclosed("{{a}} b", 0, "{{", "}}"), Some(("a", 5)));
    }

    #[test]
    fn unmatched_delimiters_stay_literal() {
        for dialect in [Dialect::Markdown, Dialect::JiraMarkup] {
            let text = "a *b _c [d {{e `f ~~g <sup>h !i";
            assert_eq!(tokenize_spans(text, dialect), vec![Span::text(text)]);
        }
    }

    #[test]
    fn empty_line_has_no_spans() {
        assert!(tokenize_spans("", Dialect::Markdown).is_empty());
    }
}
