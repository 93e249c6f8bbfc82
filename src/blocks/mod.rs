//! Block segmentation.
//!
//! Documents are scanned line by line. Each dialect module classifies lines
//! into [`Block`] values and tokenizes their inline content; code blocks and
//! raw passthrough lines keep their text untouched.

mod jira;
mod markdown;

use crate::ast::{Block, Dialect};

/// Split `document` into blocks according to `dialect`.
///
/// # Examples
///
/// ```
/// use wikimark::{Block, Dialect, Span, segment_blocks};
///
/// let blocks = segment_blocks("h1. Title", Dialect::JiraMarkup);
/// assert_eq!(
///     blocks,
///     vec![Block::Heading { level: 1, spans: vec![Span::text("Title")] }]
/// );
/// ```
#[must_use]
pub fn segment_blocks(document: &str, dialect: Dialect) -> Vec<Block> {
    let lines: Vec<&str> = document.lines().collect();
    match dialect {
        Dialect::Markdown => markdown::segment(&lines),
        Dialect::JiraMarkup => jira::segment(&lines),
    }
}
