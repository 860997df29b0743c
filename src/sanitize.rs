//! HTML sanitizer (§4.9): a pure transform from a parsed HTML document to a
//! serialized, sanitized HTML byte buffer. Operates on an `html5ever`/
//! `markup5ever_rcdom` tree directly (rather than `scraper`'s read-only
//! `Html`/`Selector` API) because sanitization needs node removal and
//! attribute clearing, not just traversal.

use std::rc::Rc;

use html5ever::driver::ParseOpts;
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

const STRIPPED_TAGS: [&str; 3] = ["head", "script", "style"];

/// A parsed HTML document, ready for title extraction and/or sanitization.
pub struct ParsedHtml {
    dom: RcDom,
}

impl ParsedHtml {
    pub fn parse(input: &str) -> Self {
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(input);
        Self { dom }
    }

    /// First `<title>` element's first text child, tolerating a missing or
    /// empty title (§9 "HTML title extraction").
    pub fn first_title_text(&self) -> Option<String> {
        let title_node = find_node(&self.dom.document, |node| is_element_named(node, "title"))?;
        let children = title_node.children.borrow();
        let first_child = children.first()?;
        match &first_child.data {
            NodeData::Text { contents } => Some(contents.borrow().to_string()),
            _ => None,
        }
    }

    /// Strip `head`/`script`/`style` elements, doctype and comment nodes,
    /// and every remaining element's attributes; serialize the result.
    ///
    /// Idempotent: sanitizing an already-sanitized document is a no-op
    /// beyond re-serialization (§8 fixpoint property).
    pub fn sanitize(&self) -> String {
        for tag in STRIPPED_TAGS {
            remove_all_by_tag_name(&self.dom.document, tag);
        }
        strip_attributes_and_metanodes(&self.dom.document);
        serialize_handle(&self.dom.document)
    }
}

/// Sanitize a standalone HTML fragment/document in one call.
pub fn sanitize_html(input: &str) -> String {
    ParsedHtml::parse(input).sanitize()
}

/// First node in pre-order traversal (including `root` itself) satisfying
/// `pred` (§4.9).
pub fn find_node(root: &Handle, pred: impl Fn(&Handle) -> bool + Copy) -> Option<Handle> {
    if pred(root) {
        return Some(root.clone());
    }
    for child in root.children.borrow().iter() {
        if let Some(found) = find_node(child, pred) {
            return Some(found);
        }
    }
    None
}

fn is_element_named(node: &Handle, tag: &str) -> bool {
    matches!(&node.data, NodeData::Element { name, .. } if name.local.as_ref() == tag)
}

fn detach(node: &Handle) {
    if let Some(parent_weak) = node.parent.take() {
        if let Some(parent) = parent_weak.upgrade() {
            parent.children.borrow_mut().retain(|sibling| !Rc::ptr_eq(sibling, node));
        }
    }
}

fn remove_all_by_tag_name(node: &Handle, tag: &str) {
    let children: Vec<Handle> = node.children.borrow().clone();
    for child in children {
        if is_element_named(&child, tag) {
            detach(&child);
        } else {
            remove_all_by_tag_name(&child, tag);
        }
    }
}

fn strip_attributes_and_metanodes(node: &Handle) {
    let children: Vec<Handle> = node.children.borrow().clone();
    for child in children {
        match &child.data {
            NodeData::Doctype { .. } | NodeData::Comment { .. } => {
                detach(&child);
            }
            NodeData::Element { attrs, .. } => {
                attrs.borrow_mut().clear();
                strip_attributes_and_metanodes(&child);
            }
            _ => {
                strip_attributes_and_metanodes(&child);
            }
        }
    }
}

fn serialize_handle(root: &Handle) -> String {
    let mut buf = Vec::new();
    let serializable: SerializableHandle = root.clone().into();
    serialize(&mut buf, &serializable, SerializeOpts::default()).expect("serializing an in-memory DOM cannot fail");
    String::from_utf8_lossy(&buf).into_owned()
}

/// Tag-name helper retained for symmetry with the Go original's
/// `QualName`-based element matching; unused outside tests today.
#[allow(dead_code)]
fn qual_name_matches(name: &QualName, tag: &str) -> bool {
    name.local.as_ref() == tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_head_script_style_and_attributes() {
        let input = "<html><head><title>T</title></head><body class=\"x\"><script>evil()</script><style>.a{}</style><p onclick=\"x\">hi</p></body></html>";
        let out = sanitize_html(input);
        assert!(!out.contains("<head>"));
        assert!(!out.contains("<script"));
        assert!(!out.contains("<style"));
        assert!(!out.contains("class="));
        assert!(!out.contains("onclick"));
        assert!(out.contains("<p>hi</p>"));
    }

    #[test]
    fn sanitize_is_idempotent() {
        let input = "<html><head><title>T</title></head><body><p class=\"x\">hi</p></body></html>";
        let once = sanitize_html(input);
        let twice = sanitize_html(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn drops_comments_and_doctype() {
        let input = "<!DOCTYPE html><html><body><!-- hidden -->hi</body></html>";
        let out = sanitize_html(input);
        assert!(!out.contains("<!--"));
        assert!(!out.to_uppercase().contains("DOCTYPE"));
    }

    #[test]
    fn title_extraction_tolerates_missing_title() {
        let parsed = ParsedHtml::parse("<html><body>no title here</body></html>");
        assert_eq!(parsed.first_title_text(), None);
    }

    #[test]
    fn title_extraction_reads_first_text_child() {
        let parsed = ParsedHtml::parse("<html><head><title>Hello</title></head><body></body></html>");
        assert_eq!(parsed.first_title_text(), Some("Hello".to_string()));
    }
}
