//! Heading recognition for both dialects.
//!
//! Markdown headings come in two styles: ATX (leading `#` markers) and Setext
//! (a text line underlined with `=` or `-`). Jira markup uses an `h1.` to
//! `h6.` prefix.

use std::sync::LazyLock;

use regex::Regex;

static ATX_RE: LazyLock<Regex> = lazy_regex!(
    r"^ {0,3}(#{1,6})(?:[ \t]+(.*?))?(?:[ \t]+#+)?[ \t]*$",
    "ATX heading regex should compile",
);

static JIRA_HEADING_RE: LazyLock<Regex> = lazy_regex!(
    r"^\s*h([1-6])\.[ \t]*(.*)$",
    "jira heading regex should compile",
);

/// Parse an ATX heading into its level and text.
#[must_use]
pub(crate) fn parse_atx(line: &str) -> Option<(u8, &str)> {
    let cap = ATX_RE.captures(line)?;
    let level = u8::try_from(cap.get(1)?.as_str().len()).ok()?;
    let text = cap.get(2).map_or("", |m| m.as_str());
    Some((level, text))
}

/// Parse a Jira `hN.` heading into its level and text.
#[must_use]
pub(crate) fn parse_jira(line: &str) -> Option<(u8, &str)> {
    let cap = JIRA_HEADING_RE.captures(line)?;
    let level = cap.get(1)?.as_str().parse().ok()?;
    Some((level, cap.get(2).map_or("", |m| m.as_str().trim_end())))
}

/// Detect a Setext heading formed by `line` and the following `underline`.
///
/// The underline must consist of at least three `=` (level 1) or `-`
/// (level 2) characters, indented by no more than three spaces.
#[must_use]
pub(crate) fn detect_setext_heading(line: &str, underline: Option<&str>) -> Option<u8> {
    let underline = underline?;
    if line.trim().is_empty() || prefix_width(line) > 3 || prefix_width(underline) > 3 {
        return None;
    }
    let body = underline.trim();
    let marker = body.chars().next()?;
    if marker != '=' && marker != '-' {
        return None;
    }
    if !body.chars().all(|c| c == marker) || body.len() < 3 {
        return None;
    }
    Some(if marker == '=' { 1 } else { 2 })
}

fn prefix_width(text: &str) -> usize { text.chars().take_while(|c| *c == ' ').count() }

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("# Title", Some((1, "Title")))]
    #[case("### Deep ###", Some((3, "Deep")))]
    #[case("######", Some((6, "")))]
    #[case("#hashtag", None)]
    #[case("####### seven", None)]
    fn parses_atx_headings(#[case] line: &str, #[case] expected: Option<(u8, &str)>) {
        assert_eq!(parse_atx(line), expected);
    }

    #[rstest]
    #[case("h1. Title", Some((1, "Title")))]
    #[case("h3.Compact", Some((3, "Compact")))]
    #[case("h7. Nope", None)]
    #[case("ah1. Nope", None)]
    fn parses_jira_headings(#[case] line: &str, #[case] expected: Option<(u8, &str)>) {
        assert_eq!(parse_jira(line), expected);
    }

    #[rstest]
    #[case("Heading", "===", Some(1))]
    #[case("Heading", "----   ", Some(2))]
    #[case("Heading", "--", None)]
    #[case("Heading", "-==", None)]
    #[case("", "---", None)]
    #[case("    code", "---", None)]
    fn detects_setext(#[case] line: &str, #[case] underline: &str, #[case] expected: Option<u8>) {
        assert_eq!(detect_setext_heading(line, Some(underline)), expected);
    }
}
