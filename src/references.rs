//! Mention and smart-link resolution.
//!
//! A [`ReferenceResolver`] lives for a single conversion call. It asks the
//! injected [`DirectoryLookup`] for each distinct user at most once and
//! rewrites smart links into plain links with readable labels.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use tracing::{debug, warn};
use url::{Url, form_urlencoded};

use crate::{
    ast::{Block, Span, UserIdentifier, push_span},
    error::LookupError,
};

/// Replacement for a profile macro that lacks its user parameter.
pub const MALFORMED_PROFILE: &str = "[User Profile Macro (Malformed)]";

static BROWSE_RE: LazyLock<Regex> = lazy_regex!(
    r"browse/([A-Z][A-Z0-9_]*-\d+)",
    "browse link regex should compile",
);

static WIKI_PAGE_RE: LazyLock<Regex> = lazy_regex!(
    r"wiki/spaces/[^/]+/pages/\d+/([^?#]+)",
    "wiki page link regex should compile",
);

static ISSUE_PREFIX_RE: LazyLock<Regex> = lazy_regex!(
    r"^[A-Z][A-Z0-9_]*-\d+\s+",
    "issue prefix regex should compile",
);

/// Source of user display names.
///
/// Implementations may cache internally; the resolver never mutates them.
pub trait DirectoryLookup: Send + Sync {
    /// Look up the display name of `id`.
    ///
    /// Returns `Ok(None)` when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] when the directory cannot answer.
    fn lookup_user_display_name(&self, id: &UserIdentifier) -> Result<Option<String>, LookupError>;
}

/// In-memory directory keyed by raw identifier.
///
/// # Examples
///
/// ```
/// use wikimark::{DirectoryLookup, StaticDirectory, UserIdentifier};
///
/// let dir = StaticDirectory::new().with_user("42", "Ada");
/// let id = UserIdentifier::AccountId("42".into());
/// assert_eq!(dir.lookup_user_display_name(&id).unwrap(), Some("Ada".into()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: HashMap<String, String>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Add a user, returning the directory.
    #[must_use]
    pub fn with_user(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.insert(id, name);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.users.insert(id.into(), name.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticDirectory {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dir = Self::new();
        for (id, name) in iter {
            dir.insert(id, name);
        }
        dir
    }
}

impl DirectoryLookup for StaticDirectory {
    fn lookup_user_display_name(&self, id: &UserIdentifier) -> Result<Option<String>, LookupError> {
        Ok(self.users.get(id.as_str()).cloned())
    }
}

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    /// Whether the directory knew the user.
    pub found: bool,
    pub display_text: String,
}

impl ResolvedReference {
    fn found(name: &str) -> Self {
        Self {
            found: true,
            display_text: format!("@{name}"),
        }
    }

    fn fallback(display_text: String) -> Self {
        debug!(%display_text, "using fallback for unresolved user");
        Self {
            found: false,
            display_text,
        }
    }
}

/// Call-scoped reference resolver.
pub struct ReferenceResolver<'a> {
    directory: Option<&'a dyn DirectoryLookup>,
    base_url: Option<&'a str>,
    cache: HashMap<UserIdentifier, Option<String>>,
}

impl<'a> ReferenceResolver<'a> {
    #[must_use]
    pub fn new(directory: Option<&'a dyn DirectoryLookup>, base_url: Option<&'a str>) -> Self {
        Self {
            directory,
            base_url,
            cache: HashMap::new(),
        }
    }

    fn display_name(&mut self, id: &UserIdentifier) -> Option<String> {
        if let Some(cached) = self.cache.get(id) {
            return cached.clone();
        }
        let name = match self.directory {
            Some(dir) => match dir.lookup_user_display_name(id) {
                Ok(name) => name.filter(|n| !n.trim().is_empty()),
                Err(err) => {
                    warn!(user = %id, error = %err, "user lookup failed");
                    None
                }
            },
            None => {
                debug!(user = %id, "no directory configured for user lookup");
                None
            }
        };
        self.cache.insert(id.clone(), name.clone());
        name
    }

    /// Resolve an inline mention: `@Name`, or `@user_<id>` when unknown.
    pub fn resolve_user(&mut self, id: &UserIdentifier) -> ResolvedReference {
        match self.display_name(id) {
            Some(name) => ResolvedReference::found(&name),
            None => ResolvedReference::fallback(format!("@user_{id}")),
        }
    }

    /// Resolve a profile macro's user: `@Name`, `[User Profile: <id>]` when
    /// unknown, or `[User Profile: unknown_user]` without an identifier.
    pub fn resolve_profile(&mut self, id: Option<&UserIdentifier>) -> ResolvedReference {
        let Some(id) = id else {
            return ResolvedReference::fallback("[User Profile: unknown_user]".into());
        };
        match self.display_name(id) {
            Some(name) => ResolvedReference::found(&name),
            None => ResolvedReference::fallback(format!("[User Profile: {id}]")),
        }
    }

    /// Turn a smart link into a plain link with a readable label.
    #[must_use]
    pub fn resolve_smart_link(&self, text: &str, target: &str) -> Span {
        if let Some(cap) = BROWSE_RE.captures(target) {
            let key = &cap[1];
            let url = match self.base_url {
                Some(base) => format!("{}/browse/{key}", base.trim_end_matches('/')),
                None => target[..cap.get(0).map_or(target.len(), |m| m.end())].to_string(),
            };
            return link(key, url);
        }
        if let Some(cap) = WIKI_PAGE_RE.captures(target) {
            let title = decode_title(&cap[1]);
            let title = ISSUE_PREFIX_RE.replace(&title, "");
            return link(&title, target.to_string());
        }
        link(text, strip_query(target))
    }

    /// Replace every mention and smart link in `spans`, recursively.
    pub fn resolve_spans(&mut self, spans: &mut Vec<Span>) {
        let mut out = Vec::with_capacity(spans.len());
        for span in spans.drain(..) {
            let span = match span {
                Span::Mention(id) => Span::Text(self.resolve_user(&id).display_text),
                Span::SmartLink { text, target } => self.resolve_smart_link(&text, &target),
                mut other => {
                    if let Some(children) = other.children_mut() {
                        self.resolve_spans(children);
                    }
                    other
                }
            };
            push_span(&mut out, span);
        }
        *spans = out;
    }

    pub fn resolve_blocks(&mut self, blocks: &mut [Block]) {
        for block in blocks {
            for spans in block.spans_mut() {
                self.resolve_spans(spans);
            }
        }
    }
}

fn link(label: &str, target: String) -> Span {
    Span::Link {
        children: vec![Span::text(label)],
        target,
    }
}

/// Decode a URL path title: `+` becomes a space and `%XX` escapes are
/// expanded.
fn decode_title(raw: &str) -> String {
    let escaped = raw.replace('&', "%26").replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(title, _)| title.into_owned())
        .unwrap_or_default()
}

/// Drop the query string and fragment from `target`.
fn strip_query(target: &str) -> String {
    if let Ok(mut url) = Url::parse(target) {
        url.set_query(None);
        url.set_fragment(None);
        return url.into();
    }
    target
        .split(['?', '#'])
        .next()
        .unwrap_or(target)
        .to_string()
}
