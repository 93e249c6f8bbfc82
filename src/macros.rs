//! Helper macros used across the crate.

/// Lazily compile a [`Regex`](regex::Regex) with a custom panic message.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
///
/// use regex::Regex;
/// static ISSUE_KEY: LazyLock<Regex> = wikimark::lazy_regex!(r"[A-Z]+-\d+", "issue key regex");
/// assert!(ISSUE_KEY.is_match("PROJ-12"));
/// ```
#[macro_export]
macro_rules! lazy_regex {
    ($pattern:expr, $msg:expr $(,)?) => {
        LazyLock::new(|| Regex::new($pattern).expect($msg))
    };
}
