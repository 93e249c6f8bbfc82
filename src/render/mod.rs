//! Rendering blocks back to text.
//!
//! Output lines are joined with `\n` and carry no trailing newline. The
//! Markdown renderer is shared with the storage-format adapter.

pub(crate) mod jira;
pub(crate) mod markdown;

use crate::ast::{Block, Dialect};

/// Render `blocks` in `dialect`.
///
/// # Examples
///
/// ```
/// use wikimark::{Dialect, render_blocks, segment_blocks};
///
/// let blocks = segment_blocks("# Title\n- **a**", Dialect::Markdown);
/// assert_eq!(render_blocks(&blocks, Dialect::JiraMarkup), "h1. Title\n* *a*");
/// ```
#[must_use]
pub fn render_blocks(blocks: &[Block], dialect: Dialect) -> String {
    match dialect {
        Dialect::Markdown => markdown::render(blocks),
        Dialect::JiraMarkup => jira::render(blocks),
    }
}
