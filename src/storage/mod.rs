//! Storage-format adapter.
//!
//! Converts wiki storage XML to Markdown, rewriting user references on the
//! way, and Markdown back to storage XML.

pub(crate) mod dom;
mod mentions;
mod transcode;
mod writer;

pub use writer::{MAX_DEPTH, html_to_storage, markdown_to_html};

use crate::{error::ConversionError, references::ReferenceResolver, render};

/// Result of converting storage XML: the rewritten markup and its Markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageMarkdown {
    /// Storage markup with user references replaced by text.
    pub html: String,
    pub markdown: String,
}

/// Convert storage XML to Markdown.
///
/// User links and profile macros are resolved through `resolver`. Page links
/// into a space other than `space_key` keep the space as a prefix.
///
/// # Errors
///
/// Returns a [`ConversionError`] when the rewritten document cannot be
/// serialized.
pub fn storage_to_markdown(
    xml: &str,
    space_key: Option<&str>,
    resolver: &mut ReferenceResolver<'_>,
) -> Result<StorageMarkdown, ConversionError> {
    let parsed = dom::parse(xml);
    let root = dom::body(&parsed);
    mentions::rewrite_user_references(&root, resolver);
    let html = dom::serialize_children(&root)?;
    let markdown = render::markdown::render(&transcode::transcode(&root, space_key));
    Ok(StorageMarkdown { html, markdown })
}

/// Markdown for `xml` without reference rewriting.
pub(crate) fn transcode_only(xml: &str, space_key: Option<&str>) -> String {
    let parsed = dom::parse(xml);
    render::markdown::render(&transcode::transcode(&dom::body(&parsed), space_key))
}

/// Convert Markdown to storage XML.
///
/// # Errors
///
/// Returns a [`ConversionError`] when the document nests deeper than
/// [`MAX_DEPTH`] or cannot be serialized.
pub fn markdown_to_storage(markdown: &str) -> Result<String, ConversionError> {
    html_to_storage(&markdown_to_html(markdown))
}
