//! Markup → [`Fragment`] via the html5ever tree builder.
//!
//! html5ever applies the HTML5 error-recovery rules, so stray end tags,
//! unclosed elements and overlapping formatting tags are repaired instead of
//! aborting. The resulting `RcDom` is walked once and copied into our arena;
//! comments, doctypes and processing instructions are dropped.

use super::node::{Element, Fragment, NodeId, NodeKind};
use crate::error::NormalizeError;
use html5ever::tendril::TendrilSink;
use html5ever::{parse_fragment, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::debug;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

impl Fragment {
    /// Parse an HTML fragment as if it appeared inside `<body>`.
    ///
    /// Malformed nesting is tolerated and auto-closed. Fails only when the
    /// tree builder yields no fragment container at all.
    pub fn parse(markup: &str) -> Result<Fragment, NormalizeError> {
        let context = QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from("body"),
        );
        let dom: RcDom = parse_fragment(RcDom::default(), ParseOpts::default(), context, vec![])
            .one(markup);

        // Fragment parsing puts the parsed nodes under a synthetic <html>.
        let container = dom
            .document
            .children
            .borrow()
            .iter()
            .find(|h| matches!(h.data, NodeData::Element { .. }))
            .cloned()
            .ok_or_else(|| NormalizeError::MalformedMarkup {
                detail: "tree builder produced no fragment container".into(),
            })?;

        let mut fragment = Fragment::new();
        let root = fragment.root();
        let mut stack: Vec<(Handle, NodeId)> = container
            .children
            .borrow()
            .iter()
            .rev()
            .map(|h| (h.clone(), root))
            .collect();

        while let Some((handle, parent)) = stack.pop() {
            let Some(kind) = convert(&handle) else {
                continue;
            };
            let id = match kind {
                NodeKind::Text(t) => fragment.create_text(t),
                NodeKind::Element(el) => fragment.insert_element(el),
                NodeKind::Root => continue,
            };
            fragment.append(parent, id);
            stack.extend(handle.children.borrow().iter().rev().map(|h| (h.clone(), id)));
        }

        debug!(nodes = fragment.descendants(root).len(), "parsed fragment");
        Ok(fragment)
    }

    /// Parse raw bytes, which must be UTF-8.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Fragment, NormalizeError> {
        let markup = std::str::from_utf8(bytes).map_err(|e| NormalizeError::MalformedMarkup {
            detail: format!("input is not valid UTF-8: {e}"),
        })?;
        Self::parse(markup)
    }
}

fn convert(handle: &Handle) -> Option<NodeKind> {
    match &handle.data {
        NodeData::Text { contents } => Some(NodeKind::Text(contents.borrow().to_string())),
        NodeData::Element { name, attrs, .. } => {
            let mut el = Element::new(name.local.to_string());
            for attr in attrs.borrow().iter() {
                let key = attr.name.local.to_string();
                // First occurrence wins, as in the browser.
                if el.attr(&key).is_none() {
                    el.set_attr(&key, attr.value.to_string());
                }
            }
            Some(NodeKind::Element(el))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Role;

    #[test]
    fn parses_nested_structure() {
        let f = Fragment::parse("<div class=\"a\"><p>Hi <b>there</b></p></div>").unwrap();
        let div = f.first_element_child(f.root()).unwrap();
        assert_eq!(f.tag(div), Some("div"));
        assert_eq!(f.element(div).unwrap().attr("class"), Some("a"));
        let p = f.children(div)[0];
        assert_eq!(f.role(p), Some(Role::Paragraph));
        assert_eq!(f.text_content(p), "Hi there");
    }

    #[test]
    fn stray_end_tag_is_ignored() {
        let f = Fragment::parse("<p><span>New Content</em></span> <br></p>").unwrap();
        let p = f.first_element_child(f.root()).unwrap();
        let tags: Vec<_> = f
            .significant_children(p)
            .into_iter()
            .filter_map(|c| f.tag(c))
            .collect();
        assert_eq!(tags, vec!["span", "br"]);
    }

    #[test]
    fn end_br_becomes_a_line_break() {
        let f = Fragment::parse("<p>a</br>b</p>").unwrap();
        let p = f.first_element_child(f.root()).unwrap();
        assert_eq!(f.role(f.children(p)[1]), Some(Role::Break));
    }

    #[test]
    fn comments_are_dropped() {
        let f = Fragment::parse("<p>a<!-- hidden -->b</p>").unwrap();
        let p = f.first_element_child(f.root()).unwrap();
        assert!(f.children(p).iter().all(|&c| f.is_text(c)));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let err = Fragment::parse_bytes(&[0x3c, 0x70, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedMarkup { .. }));
    }

    #[test]
    fn empty_markup_yields_empty_fragment() {
        let f = Fragment::parse("").unwrap();
        assert!(f.children(f.root()).is_empty());
    }
}
