//! Span classification: is a heading-marker span really a heading?
//!
//! The authoring tool never emitted heading tags. A heading is a coloured
//! `span`, optionally wrapped in (or wrapping) `strong`/`em`, standing alone
//! in its paragraph or followed by a line break. Classification is pure: it
//! inspects the tree and never mutates it.
//!
//! ## Shapes recognised
//!
//! ```text
//! dual      <span><strong>Major</strong><br>Minor</span>
//! single    <span>Text</span>
//! double    <span><em>Text</em></span>          <em><span>Text</span></em>
//! triple    <span><strong><em>Text</em></strong></span>
//!           <strong><span><em>Text</em></span></strong>
//! ```

use crate::dom::{collapse_whitespace, Fragment, NodeId, Role};

/// Outcome of classifying one heading-marker span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The span does not look like a heading and must be left as-is.
    NoHeading,
    Heading(HeadingSpan),
}

/// Text payloads of a recognised heading and the node that wraps them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingSpan {
    /// Rendered as `h3`.
    pub major: Option<String>,
    /// Rendered as `h4`.
    pub minor: Option<String>,
    /// Outermost wrapper; replaced by the synthesized headings.
    pub outer: NodeId,
}

/// Wrapper chain around the heading text, outermost first. Never deeper
/// than three levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nesting {
    Single {
        wrapper: NodeId,
    },
    Double {
        outer: NodeId,
        inner: NodeId,
    },
    Triple {
        outer: NodeId,
        middle: NodeId,
        inner: NodeId,
    },
}

impl Nesting {
    fn outer(self) -> NodeId {
        match self {
            Nesting::Single { wrapper } => wrapper,
            Nesting::Double { outer, .. } | Nesting::Triple { outer, .. } => outer,
        }
    }

    fn inner(self) -> NodeId {
        match self {
            Nesting::Single { wrapper } => wrapper,
            Nesting::Double { inner, .. } | Nesting::Triple { inner, .. } => inner,
        }
    }

    fn nodes(self) -> Vec<NodeId> {
        match self {
            Nesting::Single { wrapper } => vec![wrapper],
            Nesting::Double { outer, inner } => vec![outer, inner],
            Nesting::Triple {
                outer,
                middle,
                inner,
            } => vec![outer, middle, inner],
        }
    }

    /// Add a new outermost level; `None` once the chain is three deep.
    fn wrap(self, new_outer: NodeId) -> Option<Nesting> {
        match self {
            Nesting::Single { wrapper } => Some(Nesting::Double {
                outer: new_outer,
                inner: wrapper,
            }),
            Nesting::Double { outer, inner } => Some(Nesting::Triple {
                outer: new_outer,
                middle: outer,
                inner,
            }),
            Nesting::Triple { .. } => None,
        }
    }
}

/// Classify a heading-marker `span`.
///
/// Precedence: the dual-heading shape wins over everything else; then the
/// inner wrappers are resolved, then bold/italic ancestors are climbed, and
/// only then is the anchor checked.
pub fn classify(fragment: &Fragment, span: NodeId) -> Classification {
    let content = content_children(fragment, span);

    if content.len() > 1 {
        return classify_dual(fragment, span, &content);
    }

    let Some(&first) = content.first() else {
        return Classification::NoHeading;
    };

    let nesting = match fragment.role(first) {
        Some(role) if role.is_emphasis() => {
            match content_children(fragment, first).first().copied() {
                Some(inner) if fragment.role(inner).is_some_and(Role::is_emphasis) => {
                    Nesting::Triple {
                        outer: span,
                        middle: first,
                        inner,
                    }
                }
                _ => Nesting::Double {
                    outer: span,
                    inner: first,
                },
            }
        }
        None if fragment.is_text(first) => Nesting::Single { wrapper: span },
        _ => return Classification::NoHeading,
    };

    let nesting = climb_ancestors(fragment, nesting);

    if !is_anchored(fragment, nesting.outer()) {
        return Classification::NoHeading;
    }

    let text = collapse_whitespace(&fragment.text_content(nesting.inner()));
    if text.is_empty() {
        return Classification::NoHeading;
    }

    let bold = nesting
        .nodes()
        .into_iter()
        .any(|n| fragment.role(n).is_some_and(Role::is_bold));

    let (major, minor) = if bold {
        (Some(text), None)
    } else {
        (None, Some(text))
    };
    Classification::Heading(HeadingSpan {
        major,
        minor,
        outer: nesting.outer(),
    })
}

/// Significant children that carry content; line breaks are separators.
fn content_children(fragment: &Fragment, id: NodeId) -> Vec<NodeId> {
    fragment
        .significant_children(id)
        .into_iter()
        .filter(|&c| fragment.role(c) != Some(Role::Break))
        .collect()
}

/// `<span><strong>Major</strong><br>Minor</span>`: the first bold child is
/// the major heading, everything else the minor one.
fn classify_dual(fragment: &Fragment, span: NodeId, content: &[NodeId]) -> Classification {
    // Without a bold run this is an inline coloured phrase, not a heading.
    let Some(bold) = content
        .iter()
        .copied()
        .find(|&c| fragment.role(c).is_some_and(Role::is_bold))
    else {
        return Classification::NoHeading;
    };

    let major = Some(collapse_whitespace(&fragment.text_content(bold))).filter(|t| !t.is_empty());

    let rest: String = fragment
        .children(span)
        .iter()
        .copied()
        .filter(|&c| c != bold)
        .map(|c| match fragment.role(c) {
            Some(Role::Break) => " ".to_string(),
            _ => fragment.text_content(c),
        })
        .collect();
    let minor = Some(collapse_whitespace(&rest)).filter(|t| !t.is_empty());

    if major.is_none() && minor.is_none() {
        return Classification::NoHeading;
    }
    Classification::Heading(HeadingSpan {
        major,
        minor,
        outer: span,
    })
}

/// Headings are sometimes authored inside-out (`<strong><span>..</span></strong>`).
/// Climb into bold/italic parents while the current outer node is their only
/// content, up to the three-level cap.
fn climb_ancestors(fragment: &Fragment, mut nesting: Nesting) -> Nesting {
    loop {
        let outer = nesting.outer();
        let Some(parent) = fragment.parent(outer) else {
            return nesting;
        };
        if !fragment.role(parent).is_some_and(Role::is_emphasis) {
            return nesting;
        }
        if fragment.significant_children(parent) != [outer] {
            return nesting;
        }
        match nesting.wrap(parent) {
            Some(wrapped) => nesting = wrapped,
            None => return nesting,
        }
    }
}

/// The outer node must be followed by a line break, or be the only content
/// of its paragraph. Headings synthesized earlier in the same paragraph are
/// not content: they are split out of it afterwards.
fn is_anchored(fragment: &Fragment, outer: NodeId) -> bool {
    match fragment.next_significant_sibling(outer) {
        Some(next) => fragment.role(next) == Some(Role::Break),
        None => fragment.parent(outer).is_some_and(|parent| {
            let content: Vec<NodeId> = fragment
                .significant_children(parent)
                .into_iter()
                .filter(|&c| !matches!(fragment.role(c), Some(Role::Heading(3 | 4))))
                .collect();
            fragment.role(parent) == Some(Role::Paragraph) && content == [outer]
        }),
    }
}
