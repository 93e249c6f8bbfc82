//! Utility helpers shared across integration tests.
#![allow(dead_code, reason = "each test crate uses a different subset")]

use std::sync::Arc;

use wikimark::{Converter, ConverterOptions, DirectoryLookup, LookupError, StaticDirectory, UserIdentifier};

/// Join lines into a document separated by `\n`.
macro_rules! doc {
    ($($line:expr),* $(,)?) => {
        [$($line),*].join("\n")
    };
}

/// Directory that knows nobody.
pub struct EmptyDirectory;

impl DirectoryLookup for EmptyDirectory {
    fn lookup_user_display_name(&self, _: &UserIdentifier) -> Result<Option<String>, LookupError> { Ok(None) }
}

/// Directory whose every lookup fails.
pub struct OfflineDirectory;

impl DirectoryLookup for OfflineDirectory {
    fn lookup_user_display_name(&self, id: &UserIdentifier) -> Result<Option<String>, LookupError> {
        Err(LookupError::Failed {
            identifier: id.to_string(),
            reason: "connection refused".into(),
        })
    }
}

/// Converter resolving the given `(id, name)` pairs.
pub fn converter_with_users(users: &[(&str, &str)]) -> Converter {
    let directory: StaticDirectory = users.iter().copied().collect();
    Converter::new(ConverterOptions::default()).with_directory(Arc::new(directory))
}

/// Only the letters and digits of `text`, for checking that nothing was
/// dropped.
pub fn alphanumerics(text: &str) -> String { text.chars().filter(|c| c.is_alphanumeric()).collect() }

/// Collapse all whitespace runs to single spaces.
pub fn squash_whitespace(text: &str) -> String { text.split_whitespace().collect::<Vec<_>>().join(" ") }
