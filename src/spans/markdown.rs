//! Markdown inline recognisers.

use std::sync::LazyLock;

use regex::Regex;

use super::{Match, symmetric_span, tokenize_spans};
use crate::ast::{Dialect, Span};

const MD: Dialect = Dialect::Markdown;

static AUTOLINK_RE: LazyLock<Regex> = lazy_regex!(
    r"^<([a-zA-Z][a-zA-Z0-9+.-]{1,31}:[^\s<>]*)>",
    "autolink regex should compile",
);

static HTML_TAG_RE: LazyLock<Regex> = lazy_regex!(
    r"^<(sup|sub|ins|u|cite|del|s|strike|b|strong|i|em)>",
    "inline html tag regex should compile",
);

static COLOR_SPAN_RE: LazyLock<Regex> = lazy_regex!(
    r#"^<span\s+style\s*=\s*["']\s*color\s*:\s*([^"';]+?)\s*;?\s*["']\s*>"#,
    "colour span regex should compile",
);

pub(super) fn recognise(text: &str, i: usize) -> Match {
    match text[i..].chars().next()? {
        '\\' => escape(text, i),
        '`' => code_span(text, i),
        c @ ('*' | '_') => emphasis(text, i, c),
        '~' => symmetric_span(text, i, "~~", true, MD, Span::Strikethrough),
        '!' if text[i + 1..].starts_with('[') => image(text, i),
        '[' => link(text, i),
        '<' => html_span(text, i).or_else(|| autolink(text, i)),
        _ => None,
    }
}

/// A backslash keeps the following punctuation literal; both characters are
/// carried over since Jira markup uses the same escape.
fn escape(text: &str, i: usize) -> Match {
    let next = text[i + 1..].chars().next()?;
    if !next.is_ascii_punctuation() {
        return None;
    }
    let end = i + 1 + next.len_utf8();
    Some((Span::text(&text[i..end]), end))
}

/// Inline code delimited by equal backtick runs. An unmatched run is returned
/// as literal text so its backticks cannot open a shorter span.
fn code_span(text: &str, i: usize) -> Match {
    let run = text[i..].chars().take_while(|&c| c == '`').count();
    let start = i + run;
    let mut search = start;
    while let Some(rel) = text[search..].find('`') {
        let close = search + rel;
        let close_run = text[close..].chars().take_while(|&c| c == '`').count();
        if close_run == run {
            let mut code = &text[start..close];
            if code.len() > 2 && code.starts_with(' ') && code.ends_with(' ') {
                code = &code[1..code.len() - 1];
            }
            return Some((Span::InlineCode(code.to_string()), close + run));
        }
        search = close + close_run;
    }
    Some((Span::text(&text[i..start]), start))
}

/// `**bold**`/`__bold__` and `*italic*`/`_italic_`, chosen by run length.
fn emphasis(text: &str, i: usize, marker: char) -> Match {
    let run = text[i..].chars().take_while(|&c| c == marker).count();
    let intraword = marker == '*';
    if run >= 2 {
        let double = if marker == '*' { "**" } else { "__" };
        return symmetric_span(text, i, double, intraword, MD, Span::Bold)
            .or_else(|| Some((Span::text(&text[i..i + run]), i + run)));
    }
    let single = if marker == '*' { "*" } else { "_" };
    symmetric_span(text, i, single, intraword, MD, Span::Italic)
}

/// Byte offset just past the bracket matching the `[` at `open`.
fn closing_bracket(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (off, ch) in text[open..].char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + off + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse `(destination "title")` at `open`, returning the destination and
/// the offset past the closing parenthesis.
fn destination(text: &str, open: usize) -> Option<(String, usize)> {
    if !text[open..].starts_with('(') {
        return None;
    }
    let mut depth = 0usize;
    for (off, ch) in text[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let inner = text[open + 1..open + off].trim();
                    let (dest, title) = inner.split_once(char::is_whitespace).unwrap_or((inner, ""));
                    if !is_link_title(title.trim()) {
                        return None;
                    }
                    let dest = dest
                        .strip_prefix('<')
                        .and_then(|d| d.strip_suffix('>'))
                        .unwrap_or(dest);
                    return Some((dest.to_string(), open + off + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Empty, or a `"title"`, `'title'` or `(title)`.
fn is_link_title(title: &str) -> bool {
    if title.is_empty() {
        return true;
    }
    let mut chars = title.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return false;
    };
    matches!((first, last), ('"', '"') | ('\'', '\'') | ('(', ')'))
}

fn link(text: &str, i: usize) -> Match {
    let label_end = closing_bracket(text, i)?;
    let (target, end) = destination(text, label_end)?;
    let label = &text[i + 1..label_end - 1];
    Some((
        Span::Link {
            children: tokenize_spans(label, MD),
            target,
        },
        end,
    ))
}

fn image(text: &str, i: usize) -> Match {
    let label_end = closing_bracket(text, i + 1)?;
    let (target, end) = destination(text, label_end)?;
    let alt = text[i + 2..label_end - 1].to_string();
    Some((Span::Image { alt, target }, end))
}

fn autolink(text: &str, i: usize) -> Match {
    let cap = AUTOLINK_RE.captures(&text[i..])?;
    let whole = cap.get(0)?;
    Some((Span::AutoLink(cap[1].to_string()), i + whole.end()))
}

/// Inline HTML formatting tags and `color` styled spans.
fn html_span(text: &str, i: usize) -> Match {
    let rest = &text[i..];
    if let Some(cap) = COLOR_SPAN_RE.captures(rest) {
        let open_len = cap.get(0)?.end();
        let close = rest[open_len..].find("</span>")?;
        let inner = &rest[open_len..open_len + close];
        let span = Span::Colored {
            color: cap[1].to_string(),
            children: tokenize_spans(inner, MD),
        };
        return Some((span, i + open_len + close + "</span>".len()));
    }
    let cap = HTML_TAG_RE.captures(rest)?;
    let tag = cap.get(1)?.as_str();
    let open_len = cap.get(0)?.end();
    let closing = format!("</{tag}>");
    let close = rest[open_len..].find(&closing)?;
    let children = tokenize_spans(&rest[open_len..open_len + close], MD);
    let span = match tag {
        "sup" => Span::Superscript(children),
        "sub" => Span::Subscript(children),
        "ins" | "u" => Span::Inserted(children),
        "cite" => Span::Citation(children),
        "del" | "s" | "strike" => Span::Strikethrough(children),
        "b" | "strong" => Span::Bold(children),
        _ => Span::Italic(children),
    };
    Some((span, i + open_len + close + closing.len()))
}
