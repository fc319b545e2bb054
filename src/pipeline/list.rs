//! List reconstruction from indented paragraphs.
//!
//! Bullet lists were authored as paragraphs with a left margin. Each
//! contiguous run of such paragraphs becomes one `ul`, one `li` per
//! paragraph, in the original order.

use crate::config::NormalizeConfig;
use crate::dom::{Fragment, NodeId, Role};
use tracing::debug;

/// Lists built under one scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListReport {
    pub lists: usize,
    pub items: usize,
}

/// Fold every run of list-marked paragraphs under `scope` into a list.
pub fn rebuild_lists(fragment: &mut Fragment, scope: NodeId, config: &NormalizeConfig) -> ListReport {
    let mut report = ListReport::default();
    let paragraphs = fragment.find_all(scope, |el| el.role() == Role::Paragraph);

    for p in paragraphs {
        if !fragment.is_attached(p) || !is_candidate(fragment, p, config) {
            continue;
        }
        let list = fragment.create_element("ul");
        if let Some(el) = fragment.element_mut(list) {
            el.set_attr("style", config.list_style());
        }
        fragment.insert_before(p, list);
        report.lists += 1;

        let mut current = Some(p);
        while let Some(item) = current.filter(|&c| is_candidate(fragment, c, config)) {
            current = fragment.next_significant_sibling(item);
            let li = fragment.create_element("li");
            fragment.move_children(item, li);
            fragment.append(list, li);
            fragment.decompose(item);
            report.items += 1;
        }
    }

    debug!("Rebuilt {} lists with {} items", report.lists, report.items);
    report
}

fn is_candidate(fragment: &Fragment, id: NodeId, config: &NormalizeConfig) -> bool {
    fragment.element(id).is_some_and(|el| config.is_list_item(el))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ITEM: &str = r#"style="margin-left: 40px;""#;

    fn run(inner: &str) -> (String, ListReport) {
        let mut f = Fragment::parse(&format!("<div>{inner}</div>")).unwrap();
        let scope = f.first_element_child(f.root()).unwrap();
        let r = rebuild_lists(&mut f, scope, &NormalizeConfig::default());
        (f.inner_html(scope), r)
    }

    #[test]
    fn contiguous_run_becomes_one_list() {
        let (html, r) = run(&format!("<p {ITEM}>one</p>\n<p {ITEM}>two</p>\n<p>after</p>"));
        assert_eq!(
            html,
            "<ul style=\"list-style-type: square;\"><li>one</li><li>two</li></ul>\n\n<p>after</p>"
        );
        assert_eq!(r, ListReport { lists: 1, items: 2 });
    }

    #[test]
    fn gap_starts_a_new_list() {
        let (html, r) = run(&format!("<p {ITEM}>a</p><p>gap</p><p {ITEM}>b</p>"));
        assert_eq!(
            html,
            "<ul style=\"list-style-type: square;\"><li>a</li></ul><p>gap</p>\
             <ul style=\"list-style-type: square;\"><li>b</li></ul>"
        );
        assert_eq!(r, ListReport { lists: 2, items: 2 });
    }

    #[test]
    fn item_keeps_inline_markup() {
        let (html, _) = run(&format!("<p {ITEM}><strong>Ship</strong>: faster</p>"));
        assert_eq!(
            html,
            "<ul style=\"list-style-type: square;\"><li><strong>Ship</strong>: faster</li></ul>"
        );
    }

    #[test]
    fn other_indentation_is_not_a_list() {
        let (html, r) = run(r#"<p style="margin-left: 80px;">deep</p>"#);
        assert_eq!(html, r#"<p style="margin-left: 80px;">deep</p>"#);
        assert_eq!(r, ListReport::default());
    }
}
