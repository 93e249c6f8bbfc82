//! Mapping of a storage DOM onto the block model.
//!
//! Block-level elements become [`Block`] values; loose inline content at block
//! level is gathered into paragraphs. Distinct blocks are separated by blank
//! lines except for consecutive list items and table rows.

use std::mem;

use markup5ever_rcdom::{Handle, NodeData};
use tracing::debug;

use super::{
    dom::{attr, child, contains_strong, elements, is_tag, node_text, raw_text, tag},
    mentions::user_identifier,
};
use crate::ast::{Block, Span, plain_text, push_span};

const CONTAINER_TAGS: &[&str] = &[
    "html",
    "body",
    "div",
    "section",
    "article",
    "main",
    "header",
    "footer",
    "nav",
    "aside",
    "ac:layout",
    "ac:layout-section",
    "ac:layout-cell",
    "ac:rich-text-body",
];

const SKIPPED_TAGS: &[&str] = &["head", "script", "style", "ac:parameter"];

/// Block elements met inside inline content; their text is kept apart with a
/// space.
const BREAKING_TAGS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "tr", "td", "th", "table", "blockquote", "pre", "h1", "h2", "h3", "h4", "h5",
    "h6",
];

const PANEL_MACROS: &[&str] = &["info", "note", "tip", "warning", "panel", "expand"];

/// Convert the children of `root` into blocks.
pub(crate) fn transcode(root: &Handle, space_key: Option<&str>) -> Vec<Block> {
    let mut transcoder = Transcoder {
        space_key,
        blocks: Vec::new(),
        pending: Vec::new(),
        new_run: false,
    };
    transcoder.block_children(root);
    transcoder.flush();
    transcoder.blocks
}

struct Transcoder<'a> {
    space_key: Option<&'a str>,
    blocks: Vec<Block>,
    pending: Vec<Span>,
    /// The next list item or table row starts a new list or table.
    new_run: bool,
}

fn heading_level(name: &str) -> Option<u8> {
    let level: u8 = name.strip_prefix('h')?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

/// Escape `*` and word-boundary `_` so page text never reads as emphasis.
///
/// Intraword underscores (`snake_case`, `@user_5`) cannot open emphasis and
/// are left alone.
fn escape_emphasis(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let is_word = |j: Option<usize>| j.and_then(|j| chars.get(j)).is_some_and(|c| c.is_alphanumeric());
    let mut out = String::with_capacity(text.len());
    for (i, &ch) in chars.iter().enumerate() {
        let escape = match ch {
            '*' => true,
            '_' => !(is_word(i.checked_sub(1)) && is_word(Some(i + 1))),
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Text node content as Markdown text.
fn page_text(raw: &str) -> String { escape_emphasis(&collapse_whitespace(raw)) }

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    out
}

/// Strip whitespace from both ends of a span sequence.
fn trim_spans(spans: &mut Vec<Span>) {
    while let Some(Span::Text(first)) = spans.first_mut() {
        let trimmed = first.trim_start();
        if trimmed.is_empty() {
            spans.remove(0);
            continue;
        }
        *first = trimmed.to_string();
        break;
    }
    while let Some(Span::Text(last)) = spans.last_mut() {
        let trimmed = last.trim_end();
        if trimmed.is_empty() {
            spans.pop();
            continue;
        }
        *last = trimmed.to_string();
        break;
    }
}

/// Push `children` wrapped by `wrap`, moving edge whitespace outside the
/// delimiters. Whitespace-only content is pushed unwrapped.
fn styled(out: &mut Vec<Span>, mut children: Vec<Span>, wrap: impl FnOnce(Vec<Span>) -> Span) {
    if plain_text(&children).trim().is_empty() && !children.iter().any(|c| matches!(c, Span::Image { .. })) {
        for c in children {
            push_span(out, c);
        }
        return;
    }
    let leading = match children.first_mut() {
        Some(Span::Text(t)) if t.starts_with(char::is_whitespace) => {
            let ws = t.len() - t.trim_start().len();
            t.drain(..ws).collect()
        }
        _ => String::new(),
    };
    let trailing = match children.last_mut() {
        Some(Span::Text(t)) if t.ends_with(char::is_whitespace) => {
            let keep = t.trim_end().len();
            t.split_off(keep)
        }
        _ => String::new(),
    };
    children.retain(|c| !matches!(c, Span::Text(t) if t.is_empty()));
    push_span(out, Span::text(leading));
    push_span(out, wrap(children));
    push_span(out, Span::text(trailing));
}

fn parameter(node: &Handle, name: &str) -> Option<String> {
    elements(node)
        .into_iter()
        .find(|p| is_tag(p, "ac:parameter") && attr(p, "ac:name").is_some_and(|n| n.eq_ignore_ascii_case(name)))
        .map(|p| node_text(&p))
        .filter(|v| !v.is_empty())
}

fn language_from_class(class: &str) -> Option<String> {
    class
        .split_whitespace()
        .find_map(|c| c.strip_prefix("language-").or_else(|| c.strip_prefix("lang-")))
        .map(str::to_string)
}

/// `<tr>` elements of a table, skipping nested tables.
fn collect_rows(handle: &Handle, rows: &mut Vec<Handle>) {
    for c in handle.children.borrow().iter() {
        if is_tag(c, "tr") {
            rows.push(c.clone());
        } else if !is_tag(c, "table") {
            collect_rows(c, rows);
        }
    }
}

fn storage_image(node: &Handle) -> Option<Span> {
    let target = child(node, "ri:url")
        .and_then(|u| attr(&u, "ri:value"))
        .or_else(|| child(node, "ri:attachment").and_then(|a| attr(&a, "ri:filename")))?;
    Some(Span::Image {
        alt: attr(node, "ac:alt").unwrap_or_default(),
        target,
    })
}

impl Transcoder<'_> {
    fn push_block(&mut self, block: Block) {
        let new_run = mem::take(&mut self.new_run);
        let continues = !new_run
            && matches!(
                (self.blocks.last(), &block),
                (Some(Block::ListItem { .. }), Block::ListItem { .. })
                    | (Some(Block::TableRow { .. }), Block::TableRow { .. })
            );
        if !self.blocks.is_empty() && !continues {
            self.blocks.push(Block::Blank);
        }
        self.blocks.push(block);
    }

    /// Emit gathered inline content as a paragraph.
    fn flush(&mut self) {
        let mut spans = mem::take(&mut self.pending);
        trim_spans(&mut spans);
        if !spans.is_empty() {
            self.push_block(Block::Paragraph(spans));
        }
    }

    fn block_children(&mut self, node: &Handle) {
        for c in node.children.borrow().iter() {
            self.block(c);
        }
    }

    fn block(&mut self, node: &Handle) {
        let Some(name) = tag(node) else {
            if let NodeData::Text { contents } = &node.data {
                let text = page_text(&contents.borrow());
                if !(self.pending.is_empty() && text.trim().is_empty()) {
                    push_span(&mut self.pending, Span::text(text));
                }
            }
            return;
        };
        if let Some(level) = heading_level(name) {
            self.flush();
            let spans = self.inline_of(node);
            self.push_block(Block::Heading { level, spans });
            return;
        }
        match name {
            "p" => {
                self.flush();
                let spans = self.inline_of(node);
                if !spans.is_empty() {
                    self.push_block(Block::Paragraph(spans));
                }
            }
            "ul" | "ol" | "ac:task-list" => {
                self.flush();
                self.new_run = true;
                self.list(node, name == "ol", 0);
            }
            "table" => self.table(node),
            "pre" => {
                self.flush();
                let language = child(node, "code")
                    .and_then(|c| attr(&c, "class"))
                    .and_then(|class| language_from_class(&class));
                let text = raw_text(node);
                let text = text.strip_suffix('\n').unwrap_or(&text).to_string();
                self.push_block(Block::CodeBlock { language, text });
            }
            "blockquote" => self.quote(node),
            "hr" => {
                self.flush();
                self.push_block(Block::HorizontalRule);
            }
            "ac:structured-macro" => self.block_macro(node),
            _ if CONTAINER_TAGS.contains(&name) => {
                self.flush();
                self.block_children(node);
                self.flush();
            }
            _ if SKIPPED_TAGS.contains(&name) => {}
            _ => {
                let mut pending = mem::take(&mut self.pending);
                self.inline(node, &mut pending);
                self.pending = pending;
            }
        }
    }

    fn list(&mut self, node: &Handle, ordered: bool, indent: usize) {
        for item in elements(node) {
            let mut spans = Vec::new();
            let mut nested = Vec::new();
            if is_tag(&item, "ac:task") {
                let done = child(&item, "ac:task-status").is_some_and(|s| node_text(&s) == "complete");
                spans.push(Span::text(if done { "[x] " } else { "[ ] " }));
                if let Some(body) = child(&item, "ac:task-body") {
                    self.inline_children(&body, &mut spans);
                }
            } else if is_tag(&item, "li") {
                for c in item.children.borrow().iter() {
                    if is_tag(c, "ul") || is_tag(c, "ol") {
                        nested.push(c.clone());
                    } else {
                        self.inline(c, &mut spans);
                    }
                }
            } else {
                continue;
            }
            trim_spans(&mut spans);
            self.push_block(Block::ListItem {
                ordered,
                indent,
                spans,
            });
            for list in nested {
                self.list(&list, is_tag(&list, "ol"), indent + 1);
            }
        }
    }

    fn table(&mut self, node: &Handle) {
        self.flush();
        self.new_run = true;
        let mut rows = Vec::new();
        collect_rows(node, &mut rows);
        for (i, row) in rows.iter().enumerate() {
            let cells: Vec<Handle> = elements(row)
                .into_iter()
                .filter(|c| is_tag(c, "td") || is_tag(c, "th"))
                .collect();
            let header =
                i == 0 && !cells.is_empty() && cells.iter().all(|c| is_tag(c, "th") || contains_strong(c));
            let cells = cells
                .iter()
                .map(|c| {
                    if header {
                        vec![Span::text(escape_emphasis(&node_text(c)))]
                    } else {
                        self.inline_of(c)
                    }
                })
                .collect();
            self.push_block(Block::TableRow { header, cells });
        }
    }

    fn quote(&mut self, node: &Handle) {
        self.flush();
        let paragraphs: Vec<Handle> = elements(node)
            .into_iter()
            .filter(|c| is_tag(c, "p") || is_tag(c, "div"))
            .collect();
        let lines = if paragraphs.is_empty() {
            vec![self.inline_of(node)]
        } else {
            paragraphs.iter().map(|p| self.inline_of(p)).collect()
        };
        self.push_block(Block::BlockQuote { lines });
    }

    fn block_macro(&mut self, node: &Handle) {
        let name = attr(node, "ac:name").unwrap_or_default().to_ascii_lowercase();
        self.flush();
        if name == "code" || name == "noformat" {
            let language = if name == "code" {
                parameter(node, "language")
            } else {
                None
            };
            let text = child(node, "ac:plain-text-body")
                .map(|b| raw_text(&b))
                .unwrap_or_default();
            self.push_block(Block::CodeBlock {
                language,
                text: text.trim_matches('\n').to_string(),
            });
            return;
        }
        if PANEL_MACROS.contains(&name.as_str()) {
            if let Some(title) = parameter(node, "title") {
                self.push_block(Block::Paragraph(vec![Span::Bold(vec![Span::text(title)])]));
            }
        }
        if let Some(body) = child(node, "ac:rich-text-body") {
            self.block_children(&body);
            self.flush();
        } else if let Some(body) = child(node, "ac:plain-text-body") {
            self.push_block(Block::CodeBlock {
                language: None,
                text: raw_text(&body).trim_matches('\n').to_string(),
            });
        } else {
            let mut pending = Vec::new();
            self.inline_macro(&name, node, &mut pending);
            if pending.is_empty() {
                debug!(macro_name = %name, "dropping macro without body");
            }
            self.pending = pending;
        }
    }

    fn inline_of(&self, node: &Handle) -> Vec<Span> {
        let mut spans = Vec::new();
        self.inline_children(node, &mut spans);
        trim_spans(&mut spans);
        spans
    }

    fn wrapped(&self, node: &Handle) -> Vec<Span> {
        let mut spans = Vec::new();
        self.inline_children(node, &mut spans);
        spans
    }

    fn inline_children(&self, node: &Handle, out: &mut Vec<Span>) {
        for c in node.children.borrow().iter() {
            self.inline(c, out);
        }
    }

    fn inline(&self, node: &Handle, out: &mut Vec<Span>) {
        match &node.data {
            NodeData::Text { contents } => push_span(out, Span::text(page_text(&contents.borrow()))),
            NodeData::Element { .. } => self.inline_element(node, out),
            _ => {}
        }
    }

    fn inline_element(&self, node: &Handle, out: &mut Vec<Span>) {
        let name = tag(node).unwrap_or_default();
        match name {
            "strong" | "b" => styled(out, self.wrapped(node), Span::Bold),
            "em" | "i" => styled(out, self.wrapped(node), Span::Italic),
            "s" | "del" | "strike" => styled(out, self.wrapped(node), Span::Strikethrough),
            "u" | "ins" => styled(out, self.wrapped(node), Span::Inserted),
            "sup" => styled(out, self.wrapped(node), Span::Superscript),
            "sub" => styled(out, self.wrapped(node), Span::Subscript),
            "cite" => styled(out, self.wrapped(node), Span::Citation),
            "code" | "tt" => {
                let code = raw_text(node);
                if !code.is_empty() {
                    push_span(out, Span::InlineCode(code));
                }
            }
            "br" => {
                if let Some(Span::Text(last)) = out.last_mut() {
                    last.truncate(last.trim_end_matches(' ').len());
                }
                push_span(out, Span::text("\n"));
            }
            "a" => self.anchor(node, out),
            "img" => {
                if let Some(target) = attr(node, "src") {
                    let alt = attr(node, "alt").unwrap_or_default();
                    push_span(out, Span::Image { alt, target });
                }
            }
            "ac:image" => {
                if let Some(image) = storage_image(node) {
                    push_span(out, image);
                }
            }
            "ac:link" => push_span(out, self.storage_link(node)),
            "ac:emoticon" => {
                let text = attr(node, "ac:emoji-fallback")
                    .or_else(|| attr(node, "ac:name").map(|n| format!(":{n}:")))
                    .unwrap_or_default();
                push_span(out, Span::text(text));
            }
            "span" => match attr(node, "style").as_deref().and_then(style_color) {
                Some(color) => styled(out, self.wrapped(node), |children| Span::Colored { color, children }),
                None => self.inline_children(node, out),
            },
            "ac:structured-macro" => {
                let macro_name = attr(node, "ac:name").unwrap_or_default().to_ascii_lowercase();
                self.inline_macro(&macro_name, node, out);
            }
            "ac:plain-text-body" => push_span(out, Span::text(raw_text(node))),
            _ if SKIPPED_TAGS.contains(&name) => {}
            _ if BREAKING_TAGS.contains(&name) => {
                let needs_gap = match out.last() {
                    Some(Span::Text(t)) => !t.ends_with(char::is_whitespace),
                    Some(_) => true,
                    None => false,
                };
                if needs_gap {
                    push_span(out, Span::text(" "));
                }
                self.inline_children(node, out);
            }
            _ => self.inline_children(node, out),
        }
    }

    fn anchor(&self, node: &Handle, out: &mut Vec<Span>) {
        let children = self.wrapped(node);
        let Some(href) = attr(node, "href").filter(|h| !h.is_empty()) else {
            for c in children {
                push_span(out, c);
            }
            return;
        };
        let label = plain_text(&children);
        if label.trim().is_empty() || label.trim() == href {
            push_span(out, Span::AutoLink(href));
        } else {
            styled(out, children, |children| Span::Link { children, target: href });
        }
    }

    /// Text for an `ac:link` that was not a user mention.
    fn storage_link(&self, node: &Handle) -> Span {
        let body = child(node, "ac:plain-text-link-body")
            .map(|b| raw_text(&b))
            .or_else(|| child(node, "ac:link-body").map(|b| node_text(&b)))
            .filter(|t| !t.trim().is_empty());
        if let Some(body) = body {
            return Span::text(body);
        }
        if let Some(id) = child(node, "ri:user").and_then(|u| user_identifier(&u)) {
            return Span::text(format!("@user_{id}"));
        }
        if let Some(page) = child(node, "ri:page") {
            let title = attr(&page, "ri:content-title").unwrap_or_default();
            return match attr(&page, "ri:space-key").filter(|s| !s.is_empty() && Some(s.as_str()) != self.space_key) {
                Some(space) => Span::text(format!("{space}:{title}")),
                None => Span::text(title),
            };
        }
        if let Some(file) = child(node, "ri:attachment").and_then(|a| attr(&a, "ri:filename")) {
            return Span::text(file);
        }
        Span::text(node_text(node))
    }

    fn inline_macro(&self, name: &str, node: &Handle, out: &mut Vec<Span>) {
        match name {
            "status" => {
                if let Some(title) = parameter(node, "title") {
                    push_span(out, Span::text(title));
                }
            }
            "jira" => {
                if let Some(key) = parameter(node, "key") {
                    push_span(out, Span::text(key));
                }
            }
            "code" | "noformat" => {
                if let Some(body) = child(node, "ac:plain-text-body") {
                    push_span(out, Span::InlineCode(raw_text(&body)));
                }
            }
            _ => {
                if let Some(body) = child(node, "ac:rich-text-body") {
                    self.inline_children(&body, out);
                }
            }
        }
    }
}

fn style_color(style: &str) -> Option<String> {
    style.split(';').find_map(|decl| {
        let (key, value) = decl.split_once(':')?;
        (key.trim().eq_ignore_ascii_case("color") && !value.trim().is_empty()).then(|| value.trim().to_string())
    })
}
