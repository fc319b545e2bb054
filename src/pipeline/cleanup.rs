//! Decorative markup removal.
//!
//! Three small passes that run between the structural stages: drop images,
//! flatten inline spans that are not heading markers, and strip paragraph
//! styling once lists have been rebuilt from it.

use crate::config::NormalizeConfig;
use crate::dom::{Fragment, NodeId, Role, TextStyle};
use tracing::debug;

/// Attributes dropped from paragraphs after list reconstruction.
const DECORATIVE_PARAGRAPH_ATTRS: &[&str] = &["style", "align"];

/// Delete every image under `scope`. Returns the number removed.
pub fn strip_images(fragment: &mut Fragment, scope: NodeId) -> usize {
    let images = fragment.find_all(scope, |el| el.role() == Role::Image);
    for &img in &images {
        fragment.decompose(img);
    }
    debug!("Removed {} images", images.len());
    images.len()
}

/// Unwrap spans that are not heading markers and strip `class` from the
/// ones that are. Returns the number of spans unwrapped.
pub fn strip_spans(fragment: &mut Fragment, scope: NodeId, config: &NormalizeConfig) -> usize {
    let spans = fragment.find_all(scope, |el| el.role() == Role::TextStyle(TextStyle::Span));
    let mut unwrapped = 0;
    for span in spans {
        let is_marker = fragment
            .element(span)
            .is_some_and(|el| config.is_heading_marker(el));
        if is_marker {
            if let Some(el) = fragment.element_mut(span) {
                el.remove_attr("class");
            }
        } else {
            fragment.unwrap(span);
            unwrapped += 1;
        }
    }
    debug!("Unwrapped {} decorative spans", unwrapped);
    unwrapped
}

/// Drop alignment and inline style from every paragraph under `scope`.
pub fn strip_paragraph_styling(fragment: &mut Fragment, scope: NodeId) {
    for p in fragment.find_all(scope, |el| el.role() == Role::Paragraph) {
        if let Some(el) = fragment.element_mut(p) {
            for attr in DECORATIVE_PARAGRAPH_ATTRS {
                el.remove_attr(attr);
            }
        }
    }
}

/// Re-tag legacy `b` elements as `strong`. Returns the number re-tagged.
pub fn canonicalize_bold(fragment: &mut Fragment, scope: NodeId) -> usize {
    let legacy = fragment.find_all(scope, |el| el.tag() == "b");
    for &b in &legacy {
        if let Some(el) = fragment.element_mut(b) {
            el.set_tag("strong");
        }
    }
    legacy.len()
}
