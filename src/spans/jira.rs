//! Jira markup inline recognisers.

use std::sync::LazyLock;

use regex::Regex;

use super::{Match, match_enclosed, symmetric_span, tokenize_spans};
use crate::ast::{Dialect, Span, UserIdentifier};

const JIRA: Dialect = Dialect::JiraMarkup;

const SMART_LINK_SUFFIX: &str = "|smart-link";

static COLOR_RE: LazyLock<Regex> = lazy_regex!(
    r"^\{color:([^}]+)\}",
    "jira colour regex should compile",
);

static INLINE_CODE_MACRO_RE: LazyLock<Regex> = lazy_regex!(
    r"^\{(noformat|code)(?::[^}]*)?\}",
    "inline code macro regex should compile",
);

pub(super) fn recognise(text: &str, i: usize) -> Match {
    match text[i..].chars().next()? {
        '\\' => escape(text, i),
        '{' => brace_span(text, i),
        '*' => symmetric_span(text, i, "*", false, JIRA, Span::Bold),
        '_' => symmetric_span(text, i, "_", false, JIRA, Span::Italic),
        '-' => symmetric_span(text, i, "-", false, JIRA, Span::Strikethrough),
        '+' => symmetric_span(text, i, "+", false, JIRA, Span::Inserted),
        '^' => symmetric_span(text, i, "^", true, JIRA, Span::Superscript),
        '~' => symmetric_span(text, i, "~", true, JIRA, Span::Subscript),
        '?' => symmetric_span(text, i, "??", false, JIRA, Span::Citation),
        '[' => bracket(text, i),
        '!' => image(text, i),
        _ => None,
    }
}

fn escape(text: &str, i: usize) -> Match {
    let next = text[i + 1..].chars().next()?;
    if !next.is_ascii_punctuation() {
        return None;
    }
    let end = i + 1 + next.len_utf8();
    Some((Span::text(&text[i..end]), end))
}

/// `{{code}}`, `{color:c}text{color}` and single-line `{noformat}` spans.
fn brace_span(text: &str, i: usize) -> Match {
    if let Some((code, end)) = match_enclosed(text, i, "{{", "}}") {
        return Some((Span::InlineCode(code.to_string()), end));
    }
    let rest = &text[i..];
    if let Some(cap) = COLOR_RE.captures(rest) {
        let open_len = cap.get(0)?.end();
        let close = rest[open_len..].find("{color}")?;
        let span = Span::Colored {
            color: cap[1].trim().to_string(),
            children: tokenize_spans(&rest[open_len..open_len + close], JIRA),
        };
        return Some((span, i + open_len + close + "{color}".len()));
    }
    let cap = INLINE_CODE_MACRO_RE.captures(rest)?;
    let open_len = cap.get(0)?.end();
    let closing = format!("{{{}}}", &cap[1]);
    let close = rest[open_len..].find(&closing)?;
    let code = rest[open_len..open_len + close].to_string();
    Some((Span::InlineCode(code), i + open_len + close + closing.len()))
}

fn looks_like_url(s: &str) -> bool { s.contains("://") || s.starts_with("mailto:") }

/// Bracketed constructs: mentions, smart links, links and bare URLs.
fn bracket(text: &str, i: usize) -> Match {
    let close = i + text[i..].find(']')?;
    let inner = &text[i + 1..close];
    let end = close + 1;
    if let Some(user) = inner.strip_prefix('~') {
        return mention(user).map(|span| (span, end));
    }
    if let Some(body) = inner.strip_suffix(SMART_LINK_SUFFIX) {
        let (label, target) = body.split_once('|')?;
        if target.contains('|') {
            return None;
        }
        let span = Span::SmartLink {
            text: label.to_string(),
            target: target.trim().to_string(),
        };
        return Some((span, end));
    }
    match inner.split_once('|') {
        Some((label, rest)) => {
            let target = rest.trim();
            if target.is_empty() || target.contains('|') {
                return None;
            }
            if label.trim().is_empty() {
                return Some((Span::AutoLink(target.to_string()), end));
            }
            let span = Span::Link {
                children: tokenize_spans(label, JIRA),
                target: target.to_string(),
            };
            Some((span, end))
        }
        None if looks_like_url(inner.trim()) => Some((Span::AutoLink(inner.trim().to_string()), end)),
        None => None,
    }
}

fn mention(user: &str) -> Option<Span> {
    if user.is_empty() || user.contains(char::is_whitespace) {
        return None;
    }
    let id = match user.strip_prefix("accountid:") {
        Some(account) if !account.is_empty() => UserIdentifier::AccountId(account.to_string()),
        Some(_) => return None,
        None => UserIdentifier::Username(user.to_string()),
    };
    Some(Span::Mention(id))
}

/// `!url!` and `!url|param,alt=text!` images.
fn image(text: &str, i: usize) -> Match {
    let close = i + 1 + text[i + 1..].find('!')?;
    let inner = &text[i + 1..close];
    let (target, params) = inner.split_once('|').unwrap_or((inner, ""));
    if target.is_empty()
        || target.contains(char::is_whitespace)
        || !target.contains(['.', '/', ':'])
    {
        return None;
    }
    let alt = params
        .split(',')
        .find_map(|p| p.trim().strip_prefix("alt="))
        .map(|a| a.trim_matches('"').to_string())
        .unwrap_or_default();
    Some((
        Span::Image {
            alt,
            target: target.to_string(),
        },
        close + 1,
    ))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::ast::{Dialect, Span, UserIdentifier};
    use crate::spans::tokenize_spans;

    fn jira(text: &str) -> Vec<Span> { tokenize_spans(text, Dialect::JiraMarkup) }

    fn t(s: &str) -> Span { Span::text(s) }

    #[rstest]
    #[case("*b*", vec![Span::Bold(vec![t("b")])])]
    #[case("_i_", vec![Span::Italic(vec![t("i")])])]
    #[case("-s-", vec![Span::Strikethrough(vec![t("s")])])]
    #[case("+n+", vec![Span::Inserted(vec![t("n")])])]
    #[case("x^2^", vec![t("x"), Span::Superscript(vec![t("2")])])]
    #[case("H~2~O", vec![t("H"), Span::Subscript(vec![t("2")]), t("O")])]
    #[case("??c??", vec![Span::Citation(vec![t("c")])])]
    #[case("{{a*b*}}", vec![Span::InlineCode("a*b*".into())])]
    #[case("{noformat}x{noformat}", vec![Span::InlineCode("x".into())])]
    fn recognises_formatting(#[case] input: &str, #[case] expected: Vec<Span>) {
        assert_eq!(jira(input), expected);
    }

    #[rstest]
    #[case("well-known-term")]
    #[case("2020-01-02")]
    #[case("C++ and C++")]
    #[case("2*3*4")]
    #[case("a - b - c")]
    fn ambiguous_delimiters_stay_literal(#[case] input: &str) {
        assert_eq!(jira(input), vec![t(input)]);
    }

    #[rstest]
    #[case("[a|http://b|extra words]")]
    #[case("[a|http://b|c|smart-link]")]
    fn links_with_extra_segments_stay_literal(#[case] input: &str) {
        assert_eq!(jira(input), vec![t(input)]);
    }

    #[test]
    fn colour_spans() {
        assert_eq!(
            jira("{color:red}*hot*{color}"),
            vec![Span::Colored {
                color: "red".into(),
                children: vec![Span::Bold(vec![t("hot")])]
            }]
        );
    }

    #[test]
    fn mentions() {
        assert_eq!(
            jira("[~accountid:42]"),
            vec![Span::Mention(UserIdentifier::AccountId("42".into()))]
        );
        assert_eq!(
            jira("[~jdoe]"),
            vec![Span::Mention(UserIdentifier::Username("jdoe".into()))]
        );
    }

    #[test]
    fn links() {
        assert_eq!(
            jira("[Docs|http://x/y]"),
            vec![Span::Link {
                children: vec![t("Docs")],
                target: "http://x/y".into()
            }]
        );
        assert_eq!(jira("[http://x]"), vec![Span::AutoLink("http://x".into())]);
        assert_eq!(jira("[not a link]"), vec![t("[not a link]")]);
        assert_eq!(
            jira("[P|http://h/p?q=1|smart-link]"),
            vec![Span::SmartLink {
                text: "P".into(),
                target: "http://h/p?q=1".into()
            }]
        );
    }

    #[rstest]
    #[case("!pic.png!", "", "pic.png")]
    #[case("!pic.png|alt=A cat!", "A cat", "pic.png")]
    #[case("!pic.png|thumbnail,alt=Cat!", "Cat", "pic.png")]
    #[case("!http://h/x.png|width=300!", "", "http://h/x.png")]
    fn images(#[case] input: &str, #[case] alt: &str, #[case] target: &str) {
        assert_eq!(
            jira(input),
            vec![Span::Image {
                alt: alt.into(),
                target: target.into()
            }]
        );
    }

    #[test]
    fn exclamations_are_not_images() {
        assert_eq!(jira("Wow! Great!"), vec![t("Wow! Great!")]);
    }
}
