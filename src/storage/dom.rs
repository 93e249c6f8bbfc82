//! DOM helpers over `markup5ever_rcdom`.
//!
//! Storage XML is loaded with the HTML parser after two rewrites: CDATA
//! sections become escaped text and self-closing `ac:`/`ri:` elements are
//! expanded, since the HTML tokenizer ignores the `/>` on unknown elements.

use std::{cell::RefCell, rc::Rc, sync::LazyLock};

use html5ever::{
    driver::ParseOpts,
    parse_document,
    serialize::{SerializeOpts, TraversalScope, serialize},
    tendril::{StrTendril, TendrilSink},
};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use regex::Regex;

use crate::error::ConversionError;

static CDATA_RE: LazyLock<Regex> = lazy_regex!(r"(?s)<!\[CDATA\[(.*?)\]\]>", "CDATA regex should compile");

static SELF_CLOSING_RE: LazyLock<Regex> = lazy_regex!(
    r"<((?:ac|ri):[A-Za-z0-9_-]+)((?:\s+[^<>]*?)?)\s*/>",
    "self-closing element regex should compile",
);

/// Rewrite storage XML into something the HTML parser keeps intact.
pub(crate) fn prepare(xml: &str) -> String {
    let text = CDATA_RE.replace_all(xml, |cap: &regex::Captures<'_>| {
        html_escape::encode_text(&cap[1]).into_owned()
    });
    SELF_CLOSING_RE.replace_all(&text, "<$1$2></$1>").into_owned()
}

/// Parse a storage or HTML fragment into a DOM.
pub(crate) fn parse(xml: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(prepare(xml))
}

/// The `<body>` element of `dom`, or the document node when absent.
pub(crate) fn body(dom: &RcDom) -> Handle {
    find_first(&dom.document, "body").unwrap_or_else(|| dom.document.clone())
}

/// Serialize the children of `handle` back to markup.
pub(crate) fn serialize_children(handle: &Handle) -> Result<String, ConversionError> {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..SerializeOpts::default()
    };
    serialize(&mut bytes, &SerializableHandle::from(handle.clone()), opts)?;
    Ok(String::from_utf8(bytes)?)
}

/// Serialize `handle` including its own tag.
pub(crate) fn serialize_node(handle: &Handle) -> Result<String, ConversionError> {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..SerializeOpts::default()
    };
    serialize(&mut bytes, &SerializableHandle::from(handle.clone()), opts)?;
    Ok(String::from_utf8(bytes)?)
}

/// Local tag name of an element.
pub(crate) fn tag(handle: &Handle) -> Option<&str> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

pub(crate) fn is_tag(handle: &Handle, wanted: &str) -> bool {
    tag(handle).is_some_and(|t| t.eq_ignore_ascii_case(wanted))
}

/// Value of the attribute `name` on an element.
pub(crate) fn attr(handle: &Handle, name: &str) -> Option<String> {
    let NodeData::Element { attrs, .. } = &handle.data else {
        return None;
    };
    attrs
        .borrow()
        .iter()
        .find(|a| a.name.local.as_ref().eq_ignore_ascii_case(name))
        .map(|a| a.value.to_string())
}

/// Element children of `handle`.
pub(crate) fn elements(handle: &Handle) -> Vec<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .filter(|c| matches!(c.data, NodeData::Element { .. }))
        .cloned()
        .collect()
}

/// First element child named `wanted`.
pub(crate) fn child(handle: &Handle, wanted: &str) -> Option<Handle> {
    elements(handle).into_iter().find(|c| is_tag(c, wanted))
}

/// First descendant element named `wanted`, depth first.
pub(crate) fn find_first(handle: &Handle, wanted: &str) -> Option<Handle> {
    for c in handle.children.borrow().iter() {
        if is_tag(c, wanted) {
            return Some(c.clone());
        }
        if let Some(found) = find_first(c, wanted) {
            return Some(found);
        }
    }
    None
}

/// Collect every element named `wanted` under `handle`, in document order.
pub(crate) fn find_all(handle: &Handle, wanted: &str, out: &mut Vec<Handle>) {
    if is_tag(handle, wanted) {
        out.push(handle.clone());
    }
    for c in handle.children.borrow().iter() {
        find_all(c, wanted, out);
    }
}

/// Returns `true` if `handle` contains a `<b>` or `<strong>` descendant.
pub(crate) fn contains_strong(handle: &Handle) -> bool {
    if is_tag(handle, "strong") || is_tag(handle, "b") {
        return true;
    }
    handle.children.borrow().iter().any(contains_strong)
}

/// Text content of a node with whitespace runs collapsed to single spaces.
pub(crate) fn node_text(handle: &Handle) -> String {
    let mut out = String::new();
    let mut last_space = false;
    collect_text(handle, &mut out, &mut last_space);
    out.trim().to_string()
}

fn collect_text(handle: &Handle, out: &mut String, last_space: &mut bool) {
    match &handle.data {
        NodeData::Text { contents } => {
            for ch in contents.borrow().chars() {
                if ch.is_whitespace() {
                    *last_space = true;
                } else {
                    if *last_space && !out.is_empty() {
                        out.push(' ');
                    }
                    out.push(ch);
                    *last_space = false;
                }
            }
        }
        NodeData::Element { .. } | NodeData::Document => {
            for c in handle.children.borrow().iter() {
                collect_text(c, out, last_space);
            }
        }
        _ => {}
    }
}

/// Text content of a node exactly as written, for code bodies.
pub(crate) fn raw_text(handle: &Handle) -> String {
    let mut out = String::new();
    collect_raw(handle, &mut out);
    out
}

fn collect_raw(handle: &Handle, out: &mut String) {
    match &handle.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        NodeData::Element { .. } if is_tag(handle, "br") => out.push('\n'),
        NodeData::Element { .. } | NodeData::Document => {
            for c in handle.children.borrow().iter() {
                collect_raw(c, out);
            }
        }
        _ => {}
    }
}

/// Replace `node` in its parent with a text node holding `text`.
pub(crate) fn replace_with_text(node: &Handle, text: &str) {
    let Some(parent) = node.parent.take().and_then(|weak| weak.upgrade()) else {
        return;
    };
    let replacement = Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    });
    replacement.parent.set(Some(Rc::downgrade(&parent)));
    let mut children = parent.children.borrow_mut();
    if let Some(pos) = children.iter().position(|c| Rc::ptr_eq(c, node)) {
        children[pos] = replacement;
    }
}
