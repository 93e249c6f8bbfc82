//! Jira markup block segmentation.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    ast::{Block, Dialect, Span},
    fences::parse_code_macro,
    headings::parse_jira,
    lists::parse_jira_item,
    spans::tokenize_spans,
    table::{is_table_row, split_jira_cells},
};

const QUOTE_TAG: &str = "{quote}";

static BQ_RE: LazyLock<Regex> = lazy_regex!(r"^\s*bq\.[ \t]?(.*)$", "bq regex should compile");

static RULE_RE: LazyLock<Regex> = lazy_regex!(r"^\s*-{4,}\s*$", "rule regex should compile");

static MACRO_LINE_RE: LazyLock<Regex> = lazy_regex!(
    r"^\s*\{[A-Za-z][\w-]*(?::[^}]*)?\}\s*$",
    "macro line regex should compile",
);

fn spans(text: &str) -> Vec<Span> { tokenize_spans(text, Dialect::JiraMarkup) }

/// Index of the first line at or after `from` containing `tag`.
fn find_closing(lines: &[&str], from: usize, tag: &str) -> Option<usize> {
    (from..lines.len()).find(|&j| lines[j].contains(tag))
}

fn push_trailing(blocks: &mut Vec<Block>, trailing: &str) {
    if !trailing.trim().is_empty() {
        blocks.push(Block::Paragraph(spans(trailing)));
    }
}

/// Collect the body of a multi-line macro: the text after the opener, the
/// lines in between and the text before the closing tag. Returns the body and
/// whatever follows the closing tag.
fn macro_body<'a>(
    lines: &[&'a str],
    open_rest: &'a str,
    start: usize,
    close: usize,
    tag: &str,
) -> (Vec<&'a str>, &'a str) {
    let mut body = Vec::new();
    if !open_rest.trim().is_empty() {
        body.push(open_rest);
    }
    body.extend_from_slice(&lines[start..close]);
    let (before, after) = lines[close].split_once(tag).unwrap_or((lines[close], ""));
    if !before.trim().is_empty() {
        body.push(before);
    }
    (body, after)
}

pub(super) fn segment(lines: &[&str]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut idx = 0;
    while idx < lines.len() {
        let line = lines[idx];
        idx += 1;

        // Mid-line openers start a block only when closed on a later line.
        let code = parse_code_macro(line).filter(|c| {
            let tag = c.kind.closing_tag();
            c.lead.trim().is_empty() || (!c.rest.contains(tag) && find_closing(lines, idx, tag).is_some())
        });
        if let Some(code) = code {
            let tag = code.kind.closing_tag();
            push_trailing(&mut blocks, code.lead.trim_end());
            if let Some((inline, trailing)) = code.rest.split_once(tag) {
                blocks.push(Block::CodeBlock {
                    language: code.language,
                    text: inline.to_string(),
                });
                push_trailing(&mut blocks, trailing);
                continue;
            }
            let Some(close) = find_closing(lines, idx, tag) else {
                blocks.push(Block::Raw(line.to_string()));
                continue;
            };
            let (body, trailing) = macro_body(lines, code.rest, idx, close, tag);
            blocks.push(Block::CodeBlock {
                language: code.language,
                text: body.join("\n"),
            });
            push_trailing(&mut blocks, trailing);
            idx = close + 1;
            continue;
        }

        if let Some(rest) = line.trim_start().strip_prefix(QUOTE_TAG) {
            if let Some((inline, trailing)) = rest.split_once(QUOTE_TAG) {
                blocks.push(Block::BlockQuote {
                    lines: vec![spans(inline.trim())],
                });
                push_trailing(&mut blocks, trailing);
                continue;
            }
            if let Some(close) = find_closing(lines, idx, QUOTE_TAG) {
                let (body, trailing) = macro_body(lines, rest, idx, close, QUOTE_TAG);
                blocks.push(Block::BlockQuote {
                    lines: body.iter().map(|l| spans(l.trim())).collect(),
                });
                push_trailing(&mut blocks, trailing);
                idx = close + 1;
                continue;
            }
            blocks.push(Block::Raw(line.to_string()));
            continue;
        }

        let block = if line.trim().is_empty() {
            Block::Blank
        } else if let Some((level, text)) = parse_jira(line) {
            Block::Heading {
                level,
                spans: spans(text),
            }
        } else if let Some(cap) = BQ_RE.captures(line) {
            Block::BlockQuote {
                lines: vec![spans(cap[1].trim_end())],
            }
        } else if RULE_RE.is_match(line) {
            Block::HorizontalRule
        } else if is_table_row(line) {
            let (cells, header) = split_jira_cells(line);
            Block::TableRow {
                header,
                cells: cells.iter().map(|c| spans(c)).collect(),
            }
        } else if let Some(item) = parse_jira_item(line) {
            Block::ListItem {
                ordered: item.ordered,
                indent: item.indent,
                spans: spans(item.content),
            }
        } else if MACRO_LINE_RE.is_match(line) {
            Block::Raw(line.to_string())
        } else {
            Block::Paragraph(spans(line))
        };
        blocks.push(block);
    }
    blocks
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::blocks::segment_blocks;

    fn jira(doc: &str) -> Vec<Block> { segment_blocks(doc, Dialect::JiraMarkup) }

    fn t(s: &str) -> Span { Span::text(s) }

    #[rstest]
    #[case("{code:java}\nint x;\n{code}", Some("java"), "int x;")]
    #[case("{code:title=A.java|language=java}\na\nb\n{code}", Some("java"), "a\nb")]
    #[case("{noformat}\n*raw* _text_\n{noformat}", None, "*raw* _text_")]
    #[case("{code}one line{code}", None, "one line")]
    fn code_macros(#[case] input: &str, #[case] language: Option<&str>, #[case] text: &str) {
        assert_eq!(
            jira(input),
            vec![Block::CodeBlock {
                language: language.map(str::to_string),
                text: text.into()
            }]
        );
    }

    #[test]
    fn code_macro_opened_after_text() {
        assert_eq!(
            jira("Example: {code:sh}\n*x* [a|http://b]\n{code}"),
            vec![
                Block::Paragraph(vec![t("Example:")]),
                Block::CodeBlock {
                    language: Some("sh".into()),
                    text: "*x* [a|http://b]".into()
                }
            ]
        );
    }

    #[test]
    fn stray_mid_line_code_tag_is_text() {
        assert_eq!(jira("see {code} here"), vec![Block::Paragraph(vec![t("see {code} here")])]);
    }

    #[test]
    fn unterminated_code_macro_is_raw() {
        assert_eq!(
            jira("{code}\n*b*"),
            vec![Block::Raw("{code}".into()), Block::Paragraph(vec![Span::Bold(vec![t("b")])])]
        );
    }

    #[test]
    fn header_and_data_rows() {
        assert_eq!(
            jira("||A||B||\n|1|2|"),
            vec![
                Block::TableRow {
                    header: true,
                    cells: vec![vec![t("A")], vec![t("B")]]
                },
                Block::TableRow {
                    header: false,
                    cells: vec![vec![t("1")], vec![t("2")]]
                },
            ]
        );
    }

    #[test]
    fn lists_nest_by_marker_run() {
        let shape: Vec<_> = jira("* a\n*# b\n## c\n- d")
            .into_iter()
            .map(|b| match b {
                Block::ListItem {
                    ordered, indent, ..
                } => (ordered, indent),
                other => panic!("unexpected block {other:?}"),
            })
            .collect();
        assert_eq!(shape, vec![(false, 0), (true, 1), (true, 1), (false, 0)]);
    }

    #[test]
    fn quotes() {
        assert_eq!(
            jira("bq. said"),
            vec![Block::BlockQuote {
                lines: vec![vec![t("said")]]
            }]
        );
        assert_eq!(
            jira("{quote}\nfirst\nsecond\n{quote}"),
            vec![Block::BlockQuote {
                lines: vec![vec![t("first")], vec![t("second")]]
            }]
        );
        assert_eq!(
            jira("{quote}inline{quote}"),
            vec![Block::BlockQuote {
                lines: vec![vec![t("inline")]]
            }]
        );
    }

    #[test]
    fn headings_rules_and_macros() {
        assert_eq!(
            jira("h3. Sub\n----\n{toc}\n\ntext"),
            vec![
                Block::Heading {
                    level: 3,
                    spans: vec![t("Sub")]
                },
                Block::HorizontalRule,
                Block::Raw("{toc}".into()),
                Block::Blank,
                Block::Paragraph(vec![t("text")]),
            ]
        );
    }
}
