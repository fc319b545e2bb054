//! [`Fragment`] → HTML text.

use super::node::{Fragment, NodeId, NodeKind};

/// Elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text children are written verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl Fragment {
    /// The whole fragment as markup.
    pub fn to_html(&self) -> String {
        self.inner_html(self.root())
    }

    /// Markup of `id` including its own tags.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Markup of the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Root => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeKind::Text(text) => {
                let raw = self
                    .parent(id)
                    .and_then(|p| self.tag(p))
                    .is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t));
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&html_escape::encode_text(text));
                }
            }
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(el.tag());
                for (key, value) in el.attrs() {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.tag()) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(el.tag());
                out.push('>');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_simple_markup() {
        let src = "<div class=\"patch-note\"><p>a<br>b</p><img src=\"x.png\"></div>";
        let f = Fragment::parse(src).unwrap();
        assert_eq!(f.to_html(), src);
    }

    #[test]
    fn escapes_text_and_attributes() {
        let mut f = Fragment::new();
        let p = f.create_element_with_text("p", "a < b & c");
        f.element_mut(p).unwrap().set_attr("title", "say \"hi\"");
        f.append(f.root(), p);
        assert_eq!(
            f.to_html(),
            "<p title=\"say &quot;hi&quot;\">a &lt; b &amp; c</p>"
        );
    }

    #[test]
    fn script_contents_are_raw() {
        let f = Fragment::parse("<script>if (a < b) {}</script>").unwrap();
        assert_eq!(f.to_html(), "<script>if (a < b) {}</script>");
    }

    #[test]
    fn outer_and_inner_html() {
        let f = Fragment::parse("<ul><li>one</li><li>two</li></ul>").unwrap();
        let ul = f.first_element_child(f.root()).unwrap();
        assert_eq!(f.inner_html(ul), "<li>one</li><li>two</li>");
        assert_eq!(f.outer_html(ul), "<ul><li>one</li><li>two</li></ul>");
    }
}
