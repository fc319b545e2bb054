//! Heading synthesis: replace a classified span by real `h3`/`h4` elements.

use super::classify::HeadingSpan;
use crate::dom::{Fragment, NodeId, Role};

/// Headings created for one span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Synthesized {
    pub major: Option<NodeId>,
    pub minor: Option<NodeId>,
    /// A trailing line break was consumed.
    pub break_removed: bool,
}

/// Insert the headings right after the outer boundary (major before minor),
/// drop a line break that directly follows them, then remove the boundary.
pub fn synthesize(fragment: &mut Fragment, heading: &HeadingSpan) -> Synthesized {
    let mut out = Synthesized::default();
    let mut last = heading.outer;

    if let Some(text) = &heading.major {
        let h3 = fragment.create_element_with_text("h3", text);
        fragment.insert_after(last, h3);
        out.major = Some(h3);
        last = h3;
    }
    if let Some(text) = &heading.minor {
        let h4 = fragment.create_element_with_text("h4", text);
        fragment.insert_after(last, h4);
        out.minor = Some(h4);
        last = h4;
    }

    if let Some(next) = fragment.next_significant_sibling(last) {
        if fragment.role(next) == Some(Role::Break) {
            fragment.decompose(next);
            out.break_removed = true;
        }
    }

    fragment.decompose(heading.outer);
    out
}
