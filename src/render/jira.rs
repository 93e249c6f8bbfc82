//! Jira markup renderer.

use crate::{
    ast::{Block, Span, UserIdentifier},
    lists::MarkerStack,
};

fn wrap(out: &mut String, open: &str, children: &[Span], close: &str) {
    out.push_str(open);
    render_into(out, children);
    out.push_str(close);
}

fn render_into(out: &mut String, spans: &[Span]) {
    for span in spans {
        match span {
            Span::Text(t) => out.push_str(t),
            Span::Bold(c) => wrap(out, "*", c, "*"),
            Span::Italic(c) => wrap(out, "_", c, "_"),
            Span::Strikethrough(c) => wrap(out, "-", c, "-"),
            Span::InlineCode(code) => {
                out.push_str("{{");
                out.push_str(code);
                out.push_str("}}");
            }
            Span::Superscript(c) => wrap(out, "^", c, "^"),
            Span::Subscript(c) => wrap(out, "~", c, "~"),
            Span::Inserted(c) => wrap(out, "+", c, "+"),
            Span::Citation(c) => wrap(out, "??", c, "??"),
            Span::Colored { color, children } => {
                wrap(out, &format!("{{color:{color}}}"), children, "{color}");
            }
            Span::Link { children, target } => wrap(out, "[", children, &format!("|{target}]")),
            Span::AutoLink(target) => out.push_str(&format!("[{target}]")),
            Span::Image { alt, target } if alt.is_empty() => out.push_str(&format!("!{target}!")),
            Span::Image { alt, target } => out.push_str(&format!("!{target}|alt={alt}!")),
            Span::Mention(UserIdentifier::AccountId(id)) => {
                out.push_str(&format!("[~accountid:{id}]"));
            }
            Span::Mention(UserIdentifier::Username(name)) => out.push_str(&format!("[~{name}]")),
            Span::SmartLink { text, target } => {
                out.push_str(&format!("[{text}|{target}|smart-link]"));
            }
        }
    }
}

/// Render inline spans as Jira markup.
pub(crate) fn render_spans(spans: &[Span]) -> String {
    let mut out = String::new();
    render_into(&mut out, spans);
    out
}

fn table_row(header: bool, cells: &[Vec<Span>]) -> String {
    let sep = if header { "||" } else { "|" };
    // `||` inside a row would read as a header separator.
    let cells: Vec<String> = cells
        .iter()
        .map(|c| match render_spans(c) {
            cell if cell.is_empty() => " ".to_string(),
            cell => cell,
        })
        .collect();
    format!("{sep}{}{sep}", cells.join(sep))
}

/// Render `blocks` as Jira markup.
pub(crate) fn render(blocks: &[Block]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut markers = MarkerStack::default();
    for block in blocks {
        if !matches!(block, Block::ListItem { .. }) {
            markers.reset();
        }
        match block {
            Block::Heading { level, spans } => {
                lines.push(format!("h{level}. {}", render_spans(spans)));
            }
            Block::Paragraph(spans) => lines.push(render_spans(spans)),
            Block::ListItem {
                ordered,
                indent,
                spans,
            } => {
                let marker = markers.marker(*indent, *ordered);
                lines.push(format!("{marker} {}", render_spans(spans)));
            }
            Block::TableRow { header, cells } => lines.push(table_row(*header, cells)),
            Block::CodeBlock { language, text } => {
                let open = language
                    .as_deref()
                    .map_or_else(|| "{code}".to_string(), |l| format!("{{code:{l}}}"));
                lines.push(format!("{open}\n{text}\n{{code}}"));
            }
            Block::BlockQuote { lines: quoted } => match quoted.as_slice() {
                [single] => lines.push(format!("bq. {}", render_spans(single))),
                _ => {
                    lines.push("{quote}".into());
                    lines.extend(quoted.iter().map(|l| render_spans(l)));
                    lines.push("{quote}".into());
                }
            },
            Block::HorizontalRule => lines.push("----".into()),
            Block::Blank => lines.push(String::new()),
            Block::Raw(raw) => lines.push(raw.clone()),
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Span { Span::text(s) }

    #[test]
    fn renders_every_span_kind() {
        let spans = vec![
            Span::Bold(vec![t("b")]),
            Span::Italic(vec![t("i")]),
            Span::Strikethrough(vec![t("s")]),
            Span::InlineCode("c".into()),
            Span::Superscript(vec![t("p")]),
            Span::Subscript(vec![t("q")]),
            Span::Inserted(vec![t("n")]),
            Span::Citation(vec![t("o")]),
        ];
        assert_eq!(render_spans(&spans), "*b*_i_-s-{{c}}^p^~q~+n+??o??");
    }

    #[test]
    fn renders_links_images_and_references() {
        let spans = vec![
            Span::Link {
                children: vec![t("Docs")],
                target: "http://x".into(),
            },
            t(" "),
            Span::Image {
                alt: "cat".into(),
                target: "c.png".into(),
            },
            t(" "),
            Span::Mention(UserIdentifier::AccountId("42".into())),
            t(" "),
            Span::Colored {
                color: "red".into(),
                children: vec![t("r")],
            },
        ];
        assert_eq!(
            render_spans(&spans),
            "[Docs|http://x] !c.png|alt=cat! [~accountid:42] {color:red}r{color}"
        );
    }

    #[test]
    fn nested_list_markers_follow_ancestors() {
        let item = |ordered, indent, s: &str| Block::ListItem {
            ordered,
            indent,
            spans: vec![t(s)],
        };
        let blocks = vec![item(false, 0, "a"), item(true, 1, "b"), item(false, 0, "c")];
        assert_eq!(render(&blocks), "* a\n*# b\n* c");
    }

    #[test]
    fn quotes_choose_form_by_length() {
        let one = vec![Block::BlockQuote {
            lines: vec![vec![t("x")]],
        }];
        let two = vec![Block::BlockQuote {
            lines: vec![vec![t("x")], vec![t("y")]],
        }];
        assert_eq!(render(&one), "bq. x");
        assert_eq!(render(&two), "{quote}\nx\ny\n{quote}");
    }

    #[test]
    fn tables_and_code() {
        let blocks = vec![
            Block::TableRow {
                header: true,
                cells: vec![vec![t("A")], vec![t("B")]],
            },
            Block::TableRow {
                header: false,
                cells: vec![vec![t("1")], vec![t("2")]],
            },
            Block::CodeBlock {
                language: None,
                text: "x".into(),
            },
        ];
        assert_eq!(render(&blocks), "||A||B||\n|1|2|\n{code}\nx\n{code}");
    }

    #[test]
    fn empty_cells_keep_their_column() {
        let row = Block::TableRow {
            header: false,
            cells: vec![vec![t("1")], vec![], vec![t("3")]],
        };
        assert_eq!(render(&[row]), "|1| |3|");
    }
}
