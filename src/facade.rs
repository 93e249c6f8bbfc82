//! Conversion entry points.
//!
//! Every method here is total: empty input yields empty output, and
//! document-level failures fall back to a best-effort result after being
//! logged.

use std::{fmt, sync::Arc};

use tracing::error;

use crate::{
    dialect::DialectConverter,
    references::{DirectoryLookup, ReferenceResolver},
    storage::{self, StorageMarkdown},
};

/// Settings shared by every conversion of a [`Converter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConverterOptions {
    /// Base URL used to rebuild issue links found in smart links.
    pub base_url: Option<String>,
    /// Space assumed for storage documents when none is given per call.
    pub space_key: Option<String>,
}

impl ConverterOptions {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_space_key(mut self, space_key: impl Into<String>) -> Self {
        self.space_key = Some(space_key.into());
        self
    }
}

/// Converts between Markdown, Jira markup and storage XML.
///
/// A converter is cheap to clone and may be shared across threads; each call
/// keeps its own reference cache.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use wikimark::{Converter, ConverterOptions, StaticDirectory};
///
/// let converter = Converter::new(ConverterOptions::default())
///     .with_directory(Arc::new(StaticDirectory::new().with_user("42", "Ada")));
/// assert_eq!(converter.jira_markup_to_markdown("Hi [~accountid:42]"), "Hi @Ada");
/// ```
#[derive(Clone, Default)]
pub struct Converter {
    options: ConverterOptions,
    directory: Option<Arc<dyn DirectoryLookup>>,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("options", &self.options)
            .field("directory", &self.directory.is_some())
            .finish()
    }
}

impl Converter {
    #[must_use]
    pub fn new(options: ConverterOptions) -> Self {
        Self {
            options,
            directory: None,
        }
    }

    /// Use `directory` to resolve user references.
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn DirectoryLookup>) -> Self {
        self.directory = Some(directory);
        self
    }

    #[must_use]
    pub fn options(&self) -> &ConverterOptions { &self.options }

    fn directory(&self) -> Option<&dyn DirectoryLookup> { self.directory.as_deref() }

    fn dialect(&self) -> DialectConverter<'_> {
        DialectConverter::new(self.directory(), self.options.base_url.as_deref())
    }

    #[must_use]
    pub fn jira_markup_to_markdown(&self, markup: &str) -> String {
        if markup.is_empty() {
            return String::new();
        }
        self.dialect().to_markdown(markup)
    }

    #[must_use]
    pub fn markdown_to_jira_markup(&self, markdown: &str) -> String {
        if markdown.is_empty() {
            return String::new();
        }
        self.dialect().to_source_markup(markdown)
    }

    /// Convert storage XML to Markdown.
    ///
    /// `space_key` names the space the document lives in and defaults to the
    /// configured space. If the rewritten document cannot be serialized the
    /// original XML is returned as `html` alongside a best-effort Markdown.
    #[must_use]
    pub fn confluence_storage_to_markdown(&self, xml: &str, space_key: Option<&str>) -> StorageMarkdown {
        if xml.is_empty() {
            return StorageMarkdown::default();
        }
        let space_key = space_key.or(self.options.space_key.as_deref());
        let mut resolver = ReferenceResolver::new(self.directory(), self.options.base_url.as_deref());
        match storage::storage_to_markdown(xml, space_key, &mut resolver) {
            Ok(converted) => converted,
            Err(err) => {
                error!(error = %err, "storage to markdown conversion failed");
                StorageMarkdown {
                    html: xml.to_string(),
                    markdown: storage::transcode_only(xml, space_key),
                }
            }
        }
    }

    /// Convert Markdown to storage XML.
    ///
    /// On failure the intermediate HTML is returned wrapped in a paragraph.
    #[must_use]
    pub fn markdown_to_confluence_storage(&self, markdown: &str) -> String {
        if markdown.is_empty() {
            return String::new();
        }
        let html = storage::markdown_to_html(markdown);
        storage::html_to_storage(&html).unwrap_or_else(|err| {
            error!(error = %err, "markdown to storage conversion failed");
            format!("<p>{html}</p>")
        })
    }
}

/// Convert Jira markup to Markdown with a default converter.
#[must_use]
pub fn jira_markup_to_markdown(markup: Option<&str>) -> String {
    markup.map_or_else(String::new, |m| Converter::default().jira_markup_to_markdown(m))
}

/// Convert Markdown to Jira markup with a default converter.
#[must_use]
pub fn markdown_to_jira_markup(markdown: Option<&str>) -> String {
    markdown.map_or_else(String::new, |m| Converter::default().markdown_to_jira_markup(m))
}

/// Convert storage XML to Markdown with a default converter.
#[must_use]
pub fn confluence_storage_to_markdown(xml: Option<&str>, space_key: Option<&str>) -> StorageMarkdown {
    xml.map_or_else(StorageMarkdown::default, |x| {
        Converter::default().confluence_storage_to_markdown(x, space_key)
    })
}

/// Convert Markdown to storage XML with a default converter.
#[must_use]
pub fn markdown_to_confluence_storage(markdown: Option<&str>) -> String {
    markdown.map_or_else(String::new, |m| Converter::default().markdown_to_confluence_storage(m))
}
