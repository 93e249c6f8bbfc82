//! Markdown and Jira markup conversion.

use crate::{
    ast::Dialect,
    blocks::segment_blocks,
    references::{DirectoryLookup, ReferenceResolver},
    render::render_blocks,
};

/// Converts between Markdown and Jira markup.
///
/// Mentions and smart links found in Jira markup are resolved on the way to
/// Markdown; Markdown carries no references to resolve.
#[derive(Clone, Copy, Default)]
pub struct DialectConverter<'a> {
    directory: Option<&'a dyn DirectoryLookup>,
    base_url: Option<&'a str>,
}

impl<'a> DialectConverter<'a> {
    #[must_use]
    pub fn new(directory: Option<&'a dyn DirectoryLookup>, base_url: Option<&'a str>) -> Self {
        Self { directory, base_url }
    }

    /// Convert Jira markup to Markdown.
    ///
    /// # Examples
    ///
    /// ```
    /// use wikimark::DialectConverter;
    ///
    /// let md = DialectConverter::default().to_markdown("h2. Notes\n# first\n# second");
    /// assert_eq!(md, "## Notes\n1. first\n2. second");
    /// ```
    #[must_use]
    pub fn to_markdown(&self, source_markup: &str) -> String {
        let mut blocks = segment_blocks(source_markup, Dialect::JiraMarkup);
        ReferenceResolver::new(self.directory, self.base_url).resolve_blocks(&mut blocks);
        render_blocks(&blocks, Dialect::Markdown)
    }

    /// Convert Markdown to Jira markup.
    #[must_use]
    pub fn to_source_markup(&self, markdown: &str) -> String {
        render_blocks(&segment_blocks(markdown, Dialect::Markdown), Dialect::JiraMarkup)
    }
}
