//! Markdown block segmentation.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    ast::{Block, Dialect, Span},
    fences::OpenFence,
    headings::{detect_setext_heading, parse_atx},
    lists::parse_markdown_item,
    spans::tokenize_spans,
    table::{is_separator_row, is_table_row, split_markdown_cells},
};

pub(crate) static THEMATIC_BREAK_RE: LazyLock<Regex> = lazy_regex!(
    r"^[ ]{0,3}((?:[ \t]*\*){3,}|(?:[ \t]*-){3,}|(?:[ \t]*_){3,})[ \t]*$",
    "thematic break regex should compile",
);

static QUOTE_RE: LazyLock<Regex> = lazy_regex!(
    r"^[ ]{0,3}> ?(.*)$",
    "blockquote regex should compile",
);

static HTML_BLOCK_RE: LazyLock<Regex> = lazy_regex!(
    r"(?i)^[ ]{0,3}(?:<!--|<\?|</?(?:address|article|aside|blockquote|details|div|dl|fieldset|figure|footer|form|h[1-6]|header|hr|iframe|nav|ol|p|pre|section|summary|table|tbody|td|th|thead|tr|ul)(?:\s|/?>|$))",
    "html block regex should compile",
);

static LINK_DEFINITION_RE: LazyLock<Regex> = lazy_regex!(
    r"^[ ]{0,3}\[[^\]]+\]:\s*\S+",
    "link reference definition regex should compile",
);

fn spans(text: &str) -> Vec<Span> { tokenize_spans(text, Dialect::Markdown) }

pub(super) fn segment(lines: &[&str]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut idx = 0;
    while idx < lines.len() {
        let line = lines[idx];

        if let Some((fence, language)) = OpenFence::open(line) {
            let mut body = Vec::new();
            idx += 1;
            while idx < lines.len() && !fence.closes(lines[idx]) {
                body.push(lines[idx]);
                idx += 1;
            }
            idx += 1;
            blocks.push(Block::CodeBlock {
                language,
                text: body.join("\n"),
            });
            continue;
        }

        idx += 1;
        if line.trim().is_empty() {
            blocks.push(Block::Blank);
        } else if let Some((level, text)) = parse_atx(line) {
            blocks.push(Block::Heading {
                level,
                spans: spans(text),
            });
        } else if THEMATIC_BREAK_RE.is_match(line) {
            blocks.push(Block::HorizontalRule);
        } else if let Some(cap) = QUOTE_RE.captures(line) {
            let mut quoted = vec![spans(&cap[1])];
            while let Some(cap) = lines.get(idx).and_then(|l| QUOTE_RE.captures(l)) {
                quoted.push(spans(&cap[1]));
                idx += 1;
            }
            blocks.push(Block::BlockQuote { lines: quoted });
        } else if is_table_row(line) {
            let header = !is_separator_row(line)
                && lines.get(idx).is_some_and(|next| is_separator_row(next));
            if header {
                idx += 1;
            }
            let cells = split_markdown_cells(line).iter().map(|c| spans(c)).collect();
            blocks.push(Block::TableRow { header, cells });
        } else if let Some(item) = parse_markdown_item(line) {
            blocks.push(Block::ListItem {
                ordered: item.ordered,
                indent: item.indent,
                spans: spans(item.content),
            });
        } else if HTML_BLOCK_RE.is_match(line) || LINK_DEFINITION_RE.is_match(line) {
            blocks.push(Block::Raw(line.to_string()));
        } else if let Some(level) = detect_setext_heading(line, lines.get(idx).copied()) {
            idx += 1;
            blocks.push(Block::Heading {
                level,
                spans: spans(line.trim()),
            });
        } else {
            blocks.push(Block::Paragraph(spans(line)));
        }
    }
    blocks
}
