//! Pull synthesized headings out of the paragraphs they landed in.
//!
//! A heading replaces its span in place, so it often sits inside a `p`.
//! The paragraph is split around it: the leading part stays in the original
//! `p`, the trailing part moves into a new `p` after the heading. Empty
//! halves are dropped.

use crate::dom::{Fragment, NodeId, Role};
use tracing::debug;

/// Split paragraphs around every nested `h3`/`h4` under `scope`. Returns the
/// number of headings moved.
pub fn extract_headings(fragment: &mut Fragment, scope: NodeId) -> usize {
    let headings = fragment.find_all(scope, |el| matches!(el.role(), Role::Heading(3 | 4)));
    let mut moved = 0;

    for heading in headings {
        let Some(paragraph) = fragment.parent(heading) else {
            continue;
        };
        if fragment.role(paragraph) != Some(Role::Paragraph) || !fragment.is_attached(heading) {
            continue;
        }

        let trailing: Vec<NodeId> = match fragment.position(heading) {
            Some(pos) => fragment.children(paragraph)[pos + 1..].to_vec(),
            None => continue,
        };

        fragment.insert_after(paragraph, heading);
        let tail = fragment.create_element("p");
        fragment.insert_after(heading, tail);
        for node in trailing {
            fragment.append(tail, node);
        }

        for half in [paragraph, tail] {
            if fragment.first_significant_child(half).is_none() {
                fragment.decompose(half);
            }
        }
        moved += 1;
    }

    debug!("Extracted {} headings from paragraphs", moved);
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(inner: &str) -> (String, usize) {
        let mut f = Fragment::new();
        let scope = f.create_element("div");
        f.append(f.root(), scope);
        // Parsing would hoist the headings out of the paragraph, so build it.
        let parsed = Fragment::parse(inner).unwrap();
        copy_into(&parsed, parsed.root(), &mut f, scope);
        let moved = extract_headings(&mut f, scope);
        (f.inner_html(scope), moved)
    }

    /// Rebuild `<x>` placeholders as headings: `x3` → `h3`, `x4` → `h4`.
    fn copy_into(src: &Fragment, from: NodeId, dst: &mut Fragment, to: NodeId) {
        for &child in src.children(from) {
            let id = match (src.text(child), src.tag(child)) {
                (Some(t), _) => dst.create_text(t),
                (None, Some(tag)) => dst.create_element(&tag.replace('x', "h")),
                _ => continue,
            };
            dst.append(to, id);
            copy_into(src, child, dst, id);
        }
    }

    #[test]
    fn heading_between_text_splits_paragraph() {
        let (html, n) = run("<p>before<x4>Title</x4>after</p>");
        assert_eq!(html, "<p>before</p><h4>Title</h4><p>after</p>");
        assert_eq!(n, 1);
    }

    #[test]
    fn sole_heading_leaves_no_empty_paragraphs() {
        let (html, _) = run("<p> <x3>Major</x3> </p>");
        assert_eq!(html, "<h3>Major</h3>");
    }

    #[test]
    fn consecutive_headings_keep_order() {
        let (html, n) = run("<p><x3>Major</x3><x4>Minor</x4>Body</p>");
        assert_eq!(html, "<h3>Major</h3><h4>Minor</h4><p>Body</p>");
        assert_eq!(n, 2);
    }

    #[test]
    fn headings_outside_paragraphs_stay() {
        let (html, n) = run("<x3>Top</x3><p>Body</p>");
        assert_eq!(html, "<h3>Top</h3><p>Body</p>");
        assert_eq!(n, 0);
    }
}
