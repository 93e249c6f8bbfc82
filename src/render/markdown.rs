//! Markdown renderer.

use crate::{
    ast::{Block, Span},
    fences::fence_for,
    lists::{INDENT_UNIT, Numbering},
};

/// Longest run of consecutive backticks in `text`.
fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

fn code_span(code: &str) -> String {
    let ticks = "`".repeat(longest_backtick_run(code) + 1);
    if code.starts_with('`') || code.ends_with('`') {
        format!("{ticks} {code} {ticks}")
    } else {
        format!("{ticks}{code}{ticks}")
    }
}

fn wrap(out: &mut String, open: &str, children: &[Span], close: &str) {
    out.push_str(open);
    render_into(out, children);
    out.push_str(close);
}

fn render_into(out: &mut String, spans: &[Span]) {
    for span in spans {
        match span {
            Span::Text(t) => out.push_str(t),
            Span::Bold(c) => wrap(out, "**", c, "**"),
            Span::Italic(c) => wrap(out, "*", c, "*"),
            Span::Strikethrough(c) => wrap(out, "~~", c, "~~"),
            Span::InlineCode(code) => out.push_str(&code_span(code)),
            Span::Superscript(c) => wrap(out, "<sup>", c, "</sup>"),
            Span::Subscript(c) => wrap(out, "<sub>", c, "</sub>"),
            Span::Inserted(c) => wrap(out, "<ins>", c, "</ins>"),
            Span::Citation(c) => wrap(out, "<cite>", c, "</cite>"),
            Span::Colored { color, children } => {
                wrap(out, &format!("<span style=\"color:{color}\">"), children, "</span>");
            }
            Span::Link { children, target } => wrap(out, "[", children, &format!("]({target})")),
            Span::AutoLink(target) => {
                out.push('<');
                out.push_str(target);
                out.push('>');
            }
            Span::Image { alt, target } => out.push_str(&format!("![{alt}]({target})")),
            Span::Mention(id) => {
                out.push_str("@user_");
                out.push_str(id.as_str());
            }
            Span::SmartLink { text, target } => out.push_str(&format!("[{text}]({target})")),
        }
    }
}

/// Render inline spans as Markdown.
pub(crate) fn render_spans(spans: &[Span]) -> String {
    let mut out = String::new();
    render_into(&mut out, spans);
    out
}

/// Escape pipes and line breaks that would otherwise split a cell.
fn escape_cell(spans: &mut [Span]) {
    for span in spans {
        match span {
            Span::Text(text) => *text = text.replace('|', r"\|").replace('\n', "<br>"),
            Span::InlineCode(code) => *code = code.replace('|', r"\|"),
            other => {
                if let Some(children) = other.children_mut() {
                    escape_cell(children);
                }
            }
        }
    }
}

fn table_row(cells: &[Vec<Span>]) -> String {
    let cells: Vec<String> = cells
        .iter()
        .map(|c| {
            let mut cell = c.clone();
            escape_cell(&mut cell);
            render_spans(&cell)
        })
        .collect();
    format!("|{}|", cells.join("|"))
}

fn separator_row(columns: usize) -> String {
    format!("|{}|", vec!["---"; columns.max(1)].join("|"))
}

fn code_block(language: Option<&str>, text: &str) -> String {
    let fence = fence_for(text);
    let info = language.unwrap_or("");
    if text.is_empty() {
        format!("{fence}{info}\n{fence}")
    } else {
        format!("{fence}{info}\n{text}\n{fence}")
    }
}

/// Render `blocks` as Markdown.
pub(crate) fn render(blocks: &[Block]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut numbering = Numbering::default();
    let mut prev: Option<&Block> = None;
    for block in blocks {
        if !matches!(block, Block::ListItem { .. }) {
            numbering.reset();
        }
        match block {
            Block::Heading { level, spans } => {
                lines.push(format!("{} {}", "#".repeat(usize::from(*level)), render_spans(spans)));
            }
            Block::Paragraph(spans) => lines.push(render_spans(spans)),
            Block::ListItem {
                ordered,
                indent,
                spans,
            } => {
                let marker = numbering
                    .next(*indent, *ordered)
                    .map_or_else(|| "-".to_string(), |n| format!("{n}."));
                let pad = " ".repeat(indent * INDENT_UNIT);
                lines.push(format!("{pad}{marker} {}", render_spans(spans)));
            }
            Block::TableRow { header, cells } => {
                lines.push(table_row(cells));
                if *header {
                    lines.push(separator_row(cells.len()));
                }
            }
            Block::CodeBlock { language, text } => {
                lines.push(code_block(language.as_deref(), text));
            }
            Block::BlockQuote { lines: quoted } => {
                for line in quoted {
                    let text = render_spans(line);
                    lines.push(if text.is_empty() { ">".into() } else { format!("> {text}") });
                }
            }
            Block::HorizontalRule => {
                // A rule directly under text would turn it into a heading.
                if matches!(prev, Some(Block::Paragraph(_))) {
                    lines.push(String::new());
                }
                lines.push("---".into());
            }
            Block::Blank => lines.push(String::new()),
            Block::Raw(raw) => lines.push(raw.clone()),
        }
        prev = Some(block);
    }
    lines.join("\n")
}
