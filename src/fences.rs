//! Code block delimiters for both dialects.
//!
//! Markdown uses backtick or tilde fences with an optional info string. Jira
//! markup uses the `{code}` and `{noformat}` macros, where `{code}` may carry a
//! language either directly (`{code:java}`) or as a named parameter
//! (`{code:title=Example|language=java}`).

use std::sync::LazyLock;

use regex::Regex;

static FENCE_RE: LazyLock<Regex> = lazy_regex!(
    r"^(\s*)(`{3,}|~{3,})([^\r\n]*)$",
    "fence pattern regex should compile",
);

static CODE_MACRO_RE: LazyLock<Regex> = lazy_regex!(
    r"\{(code|noformat)(?::([^}]*))?\}",
    "code macro regex should compile",
);

/// Return fence components if the line starts a fenced code block.
///
/// The tuple holds the indentation, the fence run and the trailing info
/// string.
///
/// # Examples
///
/// ```rust
/// use wikimark::fences::is_fence;
/// assert_eq!(is_fence("```rust"), Some(("", "```", "rust")));
/// assert!(is_fence("not a fence").is_none());
/// ```
#[must_use]
#[rustfmt::skip]
pub fn is_fence(line: &str) -> Option<(&str, &str, &str)> {
    FENCE_RE.captures(line).map(|cap| {
        let indent = cap.get(1).map_or("", |m| m.as_str());
        let fence  = cap.get(2).map_or("", |m| m.as_str());
        let info   = cap.get(3).map_or("", |m| m.as_str());
        (indent, fence, info)
    })
}

/// An open Markdown fence awaiting its closing line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenFence {
    marker: char,
    len: usize,
}

impl OpenFence {
    /// Start tracking the fence opened by `line`, returning it with the
    /// language named in the info string.
    ///
    /// Backtick fences whose info string contains a backtick are not fences.
    pub(crate) fn open(line: &str) -> Option<(Self, Option<String>)> {
        let (_, fence, info) = is_fence(line)?;
        let marker = fence.chars().next()?;
        if marker == '`' && info.contains('`') {
            return None;
        }
        let language = info.split_whitespace().next().map(str::to_string);
        Some((
            Self {
                marker,
                len: fence.chars().count(),
            },
            language,
        ))
    }

    /// Whether `line` closes this fence: same marker, at least as long, no
    /// info string.
    pub(crate) fn closes(self, line: &str) -> bool {
        let Some((_, fence, info)) = is_fence(line) else {
            return false;
        };
        fence.starts_with(self.marker) && fence.chars().count() >= self.len && info.trim().is_empty()
    }
}

/// Shortest backtick fence that can wrap `text` without being closed early.
#[must_use]
pub(crate) fn fence_for(text: &str) -> String {
    let longest = text
        .lines()
        .filter_map(|l| {
            let run = l.trim_start().chars().take_while(|&c| c == '`').count();
            (run >= 3).then_some(run)
        })
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Which Jira macro opened a code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CodeMacroKind {
    Code,
    NoFormat,
}

impl CodeMacroKind {
    pub(crate) fn closing_tag(self) -> &'static str {
        match self {
            Self::Code => "{code}",
            Self::NoFormat => "{noformat}",
        }
    }
}

/// Opening `{code}`/`{noformat}` macro found in a line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct CodeMacro<'a> {
    /// Text preceding the opening tag.
    pub(crate) lead: &'a str,
    pub(crate) kind: CodeMacroKind,
    pub(crate) language: Option<String>,
    /// Text following the opening tag on the same line.
    pub(crate) rest: &'a str,
}

/// Parse the first Jira code macro opener in `line`.
///
/// Openers directly inside braces (`{{{code}}}`) are ignored.
pub(crate) fn parse_code_macro(line: &str) -> Option<CodeMacro<'_>> {
    let cap = CODE_MACRO_RE.captures(line)?;
    let whole = cap.get(0)?;
    let lead = &line[..whole.start()];
    if lead.ends_with('{') {
        return None;
    }
    let kind = if &cap[1] == "code" {
        CodeMacroKind::Code
    } else {
        CodeMacroKind::NoFormat
    };
    let language = match (kind, cap.get(2)) {
        (CodeMacroKind::Code, Some(params)) => code_language(params.as_str()),
        _ => None,
    };
    Some(CodeMacro {
        lead,
        kind,
        language,
        rest: &line[whole.end()..],
    })
}

fn code_language(params: &str) -> Option<String> {
    let mut bare = None;
    for param in params.split('|') {
        let param = param.trim();
        match param.split_once('=') {
            Some((key, value)) if key.trim().eq_ignore_ascii_case("language") => {
                return Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            Some(_) => {}
            None if !param.is_empty() && bare.is_none() => bare = Some(param.to_string()),
            None => {}
        }
    }
    bare
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn fence_tracks_marker_and_length() {
        let (fence, lang) = OpenFence::open("````rust").expect("fence");
        assert_eq!(lang.as_deref(), Some("rust"));
        assert!(!fence.closes("```"));
        assert!(!fence.closes("~~~~"));
        assert!(fence.closes("`````"));
    }

    #[test]
    fn backtick_info_with_backtick_is_not_a_fence() {
        assert!(OpenFence::open("``` a`b").is_none());
    }

    #[test]
    fn fence_for_outgrows_inner_fences() {
        assert_eq!(fence_for("plain"), "```");
        assert_eq!(fence_for("```\ninner\n```"), "````");
    }

    #[rstest]
    #[case("{code}", CodeMacroKind::Code, None, "")]
    #[case("{code:java}int x;", CodeMacroKind::Code, Some("java"), "int x;")]
    #[case("{code:title=A.java|language=java}", CodeMacroKind::Code, Some("java"), "")]
    #[case("{code:title=Example}", CodeMacroKind::Code, None, "")]
    #[case("{noformat}", CodeMacroKind::NoFormat, None, "")]
    fn parses_code_macros(
        #[case] line: &str,
        #[case] kind: CodeMacroKind,
        #[case] language: Option<&str>,
        #[case] rest: &str,
    ) {
        let parsed = parse_code_macro(line).expect("code macro");
        assert_eq!(parsed.kind, kind);
        assert_eq!(parsed.language.as_deref(), language);
        assert_eq!(parsed.rest, rest);
    }

    #[test]
    fn ignores_other_macros() {
        assert!(parse_code_macro("{quote}").is_none());
        assert!(parse_code_macro("use {{{code}}} here").is_none());
    }

    #[test]
    fn finds_openers_after_text() {
        let parsed = parse_code_macro("Example: {code:sh}ls").expect("code macro");
        assert_eq!(parsed.lead, "Example: ");
        assert_eq!(parsed.language.as_deref(), Some("sh"));
        assert_eq!(parsed.rest, "ls");
    }
}
