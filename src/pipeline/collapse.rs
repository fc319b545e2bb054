//! Structural collapse of generic grouping containers.
//!
//! Articles pasted through several editor generations come wrapped in
//! layers of `div`s. Each direct grouping child of the content region is
//! resolved by the arity and role of its significant children:
//!
//! | children              | action                                   |
//! |-----------------------|------------------------------------------|
//! | none                  | decompose                                |
//! | one grouping          | unwrap, then resolve the child           |
//! | one text / text-style | replace with a `p` holding the child     |
//! | one of anything else  | unwrap, recorded as unresolved           |
//! | several               | unwrap, then resolve grouping children   |
//!
//! Every step removes one container, so the worklist always drains.

use crate::dom::{Fragment, NodeId, Role};
use tracing::{debug, warn};

/// What the collapser did to one content region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseReport {
    pub removed: usize,
    pub unwrapped: usize,
    pub paragraphs: usize,
    /// Tag names of single children no rule covers.
    pub unresolved: Vec<String>,
}

/// Resolve every direct grouping container under `content`.
pub fn collapse_containers(fragment: &mut Fragment, content: NodeId) -> CollapseReport {
    let mut report = CollapseReport::default();
    let mut work = grouping_children(fragment, content);

    while let Some(container) = work.pop() {
        if !fragment.is_attached(container) {
            continue;
        }
        let significant = fragment.significant_children(container);
        match significant.as_slice() {
            [] => {
                fragment.decompose(container);
                report.removed += 1;
            }
            [child] => {
                let child = *child;
                match fragment.role(child) {
                    Some(Role::Grouping) => {
                        fragment.unwrap(container);
                        report.unwrapped += 1;
                        work.push(child);
                    }
                    None | Some(Role::TextStyle(_)) => {
                        let p = fragment.create_element("p");
                        fragment.insert_before(container, p);
                        fragment.append(p, child);
                        fragment.decompose(container);
                        report.paragraphs += 1;
                    }
                    Some(_) => {
                        let tag = fragment.tag(child).unwrap_or_default().to_string();
                        warn!("Unresolved structural case: container with single <{}>", tag);
                        fragment.unwrap(container);
                        report.unwrapped += 1;
                        report.unresolved.push(tag);
                    }
                }
            }
            _ => {
                let nested = grouping_children(fragment, container);
                fragment.unwrap(container);
                report.unwrapped += 1;
                work.extend(nested);
            }
        }
    }

    debug!(
        "Collapsed containers: {} removed, {} unwrapped, {} paragraphs",
        report.removed, report.unwrapped, report.paragraphs
    );
    report
}

/// Grouping children in reverse document order, so popping the worklist
/// visits them front to back.
fn grouping_children(fragment: &Fragment, id: NodeId) -> Vec<NodeId> {
    fragment
        .children(id)
        .iter()
        .rev()
        .copied()
        .filter(|&c| fragment.role(c) == Some(Role::Grouping))
        .collect()
}
