//! Rich-text conversion between Markdown, Jira wiki markup and Confluence
//! storage XML.
//!
//! Documents are segmented into [`Block`] values carrying inline [`Span`]
//! trees, user mentions and smart links are resolved through a
//! [`DirectoryLookup`], and the result is rendered in the target format. The
//! [`Converter`] facade ties these steps together.

#[macro_use]
mod macros;

pub mod ast;
mod blocks;
pub mod dialect;
pub mod error;
pub mod facade;
pub mod fences;
mod headings;
mod lists;
pub mod references;
mod render;
mod spans;
pub mod storage;
mod table;

pub use ast::{Block, Dialect, Span, UserIdentifier, plain_text};
pub use blocks::segment_blocks;
pub use dialect::DialectConverter;
pub use error::{ConversionError, LookupError};
pub use facade::{
    Converter,
    ConverterOptions,
    confluence_storage_to_markdown,
    jira_markup_to_markdown,
    markdown_to_confluence_storage,
    markdown_to_jira_markup,
};
pub use references::{DirectoryLookup, ReferenceResolver, ResolvedReference, StaticDirectory};
pub use render::render_blocks;
pub use spans::tokenize_spans;
pub use storage::{StorageMarkdown, markdown_to_storage, storage_to_markdown};
