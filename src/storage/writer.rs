//! Markdown to storage XML.
//!
//! Markdown is rendered to HTML with `pulldown-cmark`, parsed back into a DOM
//! and written out element by element. Code blocks become `code` macros and
//! images become `ac:image` elements; block constructs without a storage
//! counterpart are kept as escaped HTML inside a paragraph.

use html_escape::{encode_double_quoted_attribute, encode_text};
use markup5ever_rcdom::{Handle, NodeData};
use pulldown_cmark::{Options, Parser, html};

use super::dom::{self, attr, child, raw_text, tag};
use crate::error::ConversionError;

/// Deepest element nesting accepted when writing storage XML.
pub const MAX_DEPTH: usize = 100;

const PASSTHROUGH_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "table",
    "thead",
    "tbody",
    "tfoot",
    "tr",
    "th",
    "td",
    "blockquote",
    "strong",
    "em",
    "b",
    "i",
    "code",
    "sup",
    "sub",
    "u",
    "span",
    "a",
];

const UNSUPPORTED_BLOCK_TAGS: &[&str] = &[
    "div", "details", "summary", "section", "article", "aside", "figure", "form", "iframe", "dl", "nav", "header",
    "footer", "fieldset", "video", "audio",
];

const ALLOWED_ATTRS: &[&str] = &["href", "title", "style", "colspan", "rowspan", "start"];

const CODE_MACRO_OPEN: &str = r#"<ac:structured-macro ac:name="code">"#;

/// Render Markdown to HTML with tables and strikethrough enabled.
#[must_use]
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let mut out = String::new();
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

/// Convert an HTML fragment into storage XML.
///
/// # Errors
///
/// Returns [`ConversionError::NestingTooDeep`] for documents nested deeper
/// than [`MAX_DEPTH`], or a serialization error when an unsupported block
/// cannot be re-serialized.
pub fn html_to_storage(html: &str) -> Result<String, ConversionError> {
    let parsed = dom::parse(html);
    let mut out = String::new();
    write_children(&dom::body(&parsed), 0, &mut out)?;
    Ok(out.trim_end().to_string())
}

fn write_children(node: &Handle, depth: usize, out: &mut String) -> Result<(), ConversionError> {
    for c in node.children.borrow().iter() {
        write_node(c, depth + 1, out)?;
    }
    Ok(())
}

fn write_node(node: &Handle, depth: usize, out: &mut String) -> Result<(), ConversionError> {
    if depth > MAX_DEPTH {
        return Err(ConversionError::NestingTooDeep { limit: MAX_DEPTH });
    }
    match &node.data {
        NodeData::Text { contents } => out.push_str(&encode_text(&**contents.borrow())),
        NodeData::Element { .. } => write_element(node, depth, out)?,
        _ => {}
    }
    Ok(())
}

fn write_element(node: &Handle, depth: usize, out: &mut String) -> Result<(), ConversionError> {
    let name = tag(node).unwrap_or_default();
    match name {
        "pre" => write_code_macro(node, out),
        "img" => write_image(node, out),
        "br" | "hr" => {
            out.push('<');
            out.push_str(name);
            out.push_str(" />");
        }
        "del" | "s" | "strike" => write_wrapped(node, "s", depth, out)?,
        "ins" => write_wrapped(node, "u", depth, out)?,
        "input" => {}
        _ if PASSTHROUGH_TAGS.contains(&name) => {
            write_open(node, name, out);
            write_children(node, depth, out)?;
            write_close(name, out);
        }
        _ if UNSUPPORTED_BLOCK_TAGS.contains(&name) => {
            out.push_str("<p>");
            out.push_str(&encode_text(&dom::serialize_node(node)?));
            out.push_str("</p>");
        }
        _ => write_children(node, depth, out)?,
    }
    Ok(())
}

fn write_open(node: &Handle, name: &str, out: &mut String) {
    out.push('<');
    out.push_str(name);
    for key in ALLOWED_ATTRS {
        if let Some(value) = attr(node, key) {
            out.push_str(&format!(" {key}=\"{}\"", encode_double_quoted_attribute(&value)));
        }
    }
    out.push('>');
}

fn write_close(name: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Write the children of `node` inside a bare `name` element.
fn write_wrapped(node: &Handle, name: &str, depth: usize, out: &mut String) -> Result<(), ConversionError> {
    out.push('<');
    out.push_str(name);
    out.push('>');
    write_children(node, depth, out)?;
    write_close(name, out);
    Ok(())
}

fn write_code_macro(pre: &Handle, out: &mut String) {
    let language = child(pre, "code")
        .and_then(|c| attr(&c, "class"))
        .and_then(|class| {
            class
                .split_whitespace()
                .find_map(|c| c.strip_prefix("language-"))
                .map(str::to_string)
        });
    let text = raw_text(pre);
    let text = text.strip_suffix('\n').unwrap_or(&text);
    out.push_str(CODE_MACRO_OPEN);
    if let Some(language) = language {
        out.push_str(r#"<ac:parameter ac:name="language">"#);
        out.push_str(&encode_text(&language));
        out.push_str("</ac:parameter>");
    }
    out.push_str("<ac:plain-text-body><![CDATA[");
    out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
    out.push_str("]]></ac:plain-text-body></ac:structured-macro>");
}

fn write_image(img: &Handle, out: &mut String) {
    let Some(src) = attr(img, "src") else {
        return;
    };
    out.push_str("<ac:image");
    if let Some(alt) = attr(img, "alt").filter(|a| !a.is_empty()) {
        out.push_str(&format!(" ac:alt=\"{}\"", encode_double_quoted_attribute(&alt)));
    }
    out.push_str(&format!(
        "><ri:url ri:value=\"{}\" /></ac:image>",
        encode_double_quoted_attribute(&src)
    ));
}
