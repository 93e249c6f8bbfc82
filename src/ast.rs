//! Intermediate document model shared by every converter.
//!
//! A document is a flat sequence of [`Block`] values, each carrying its inline
//! content as a tree of [`Span`] values. Both are transient: they live for the
//! duration of one conversion call.

use std::fmt;

/// Markup dialect understood by the tokenizer, segmenter and renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// CommonMark-flavoured Markdown with GFM tables and strikethrough.
    Markdown,
    /// Jira wiki markup.
    JiraMarkup,
}

/// Opaque user reference embedded in source markup or storage XML.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserIdentifier {
    /// Cloud account id (`[~accountid:ID]`, `ri:account-id`).
    AccountId(String),
    /// Server user name or user key (`[~name]`, `ri:userkey`).
    Username(String),
}

impl UserIdentifier {
    /// The raw identifier without its kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AccountId(id) | Self::Username(id) => id,
        }
    }
}

impl fmt::Display for UserIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Bold(Vec<Span>),
    Italic(Vec<Span>),
    Strikethrough(Vec<Span>),
    /// Literal code; never tokenized.
    InlineCode(String),
    Superscript(Vec<Span>),
    Subscript(Vec<Span>),
    Inserted(Vec<Span>),
    Citation(Vec<Span>),
    Colored {
        color: String,
        children: Vec<Span>,
    },
    Link {
        children: Vec<Span>,
        target: String,
    },
    /// Bare URL: `<url>` in Markdown, `[url]` in Jira markup.
    AutoLink(String),
    Image {
        alt: String,
        target: String,
    },
    /// Unresolved user mention.
    Mention(UserIdentifier),
    /// Unresolved `[text|url|smart-link]` reference.
    SmartLink {
        text: String,
        target: String,
    },
}

impl Span {
    /// Convenience constructor for [`Span::Text`].
    pub fn text(s: impl Into<String>) -> Self { Self::Text(s.into()) }

    /// Nested spans of container variants.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Span>> {
        match self {
            Self::Bold(c)
            | Self::Italic(c)
            | Self::Strikethrough(c)
            | Self::Superscript(c)
            | Self::Subscript(c)
            | Self::Inserted(c)
            | Self::Citation(c)
            | Self::Colored { children: c, .. }
            | Self::Link { children: c, .. } => Some(c),
            _ => None,
        }
    }
}

/// Concatenate the visible text of `spans`, dropping all formatting.
#[must_use]
pub fn plain_text(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Text(t) | Span::InlineCode(t) | Span::AutoLink(t) => out.push_str(t),
            Span::Image { alt, .. } => out.push_str(alt),
            Span::Mention(id) => out.push_str(id.as_str()),
            Span::SmartLink { text, .. } => out.push_str(text),
            Span::Bold(c)
            | Span::Italic(c)
            | Span::Strikethrough(c)
            | Span::Superscript(c)
            | Span::Subscript(c)
            | Span::Inserted(c)
            | Span::Citation(c)
            | Span::Colored { children: c, .. }
            | Span::Link { children: c, .. } => out.push_str(&plain_text(c)),
        }
    }
    out
}

/// Append `span` to `spans`, merging adjacent text.
pub(crate) fn push_span(spans: &mut Vec<Span>, span: Span) {
    if let Span::Text(new) = &span {
        if new.is_empty() {
            return;
        }
        if let Some(Span::Text(last)) = spans.last_mut() {
            last.push_str(new);
            return;
        }
    }
    spans.push(span);
}

/// Block-level unit of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        spans: Vec<Span>,
    },
    /// A single line of running text.
    Paragraph(Vec<Span>),
    ListItem {
        ordered: bool,
        indent: usize,
        spans: Vec<Span>,
    },
    TableRow {
        header: bool,
        cells: Vec<Vec<Span>>,
    },
    /// Literal code; never tokenized.
    CodeBlock {
        language: Option<String>,
        text: String,
    },
    BlockQuote {
        lines: Vec<Vec<Span>>,
    },
    HorizontalRule,
    Blank,
    /// Unrecognised construct passed through verbatim.
    Raw(String),
}

impl Block {
    /// Mutable access to every inline span sequence carried by the block.
    pub fn spans_mut(&mut self) -> Vec<&mut Vec<Span>> {
        match self {
            Self::Heading { spans, .. } | Self::Paragraph(spans) | Self::ListItem { spans, .. } => {
                vec![spans]
            }
            Self::TableRow { cells, .. } => cells.iter_mut().collect(),
            Self::BlockQuote { lines } => lines.iter_mut().collect(),
            Self::CodeBlock { .. } | Self::HorizontalRule | Self::Blank | Self::Raw(_) => Vec::new(),
        }
    }
}
