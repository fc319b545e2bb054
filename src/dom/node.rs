//! Arena-backed node storage and the mutation primitives every stage uses.
//!
//! A [`Fragment`] owns all of its nodes in one `Vec`. Nodes are addressed by
//! a [`NodeId`]; the parent link is a plain index lookup, never ownership.
//! Detaching a node leaves its slot (and its subtree) in the arena but makes
//! it unreachable from the root, which is what "decompose" means here.

use super::role::Role;

/// Handle to a node inside one [`Fragment`].
///
/// Ids are only meaningful for the fragment that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element: tag name, resolved role and attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    role: Role,
    attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into().to_ascii_lowercase();
        let role = Role::from_tag(&tag);
        Self {
            tag,
            role,
            attrs: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Rename the element. The role is resolved again from the new tag.
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into().to_ascii_lowercase();
        self.role = Role::from_tag(&self.tag);
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.attrs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute, replacing the value in place if the key exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        let idx = self.attrs.iter().position(|(k, _)| *k == name)?;
        Some(self.attrs.remove(idx).1)
    }

    /// True if the whitespace-separated `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The fragment container itself. Exactly one per fragment.
    Root,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Slot {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// One parsed document fragment.
///
/// Produced fresh per normalization; never shares nodes with another
/// fragment, so independent fragments can be processed on different threads.
#[derive(Debug, Clone)]
pub struct Fragment {
    slots: Vec<Slot>,
}

impl Default for Fragment {
    fn default() -> Self {
        Self::new()
    }
}

impl Fragment {
    /// An empty fragment holding only its root container.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    // ── Node access ──────────────────────────────────────────────────────

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.slots[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.slots[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.slots[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.slots[id.0].kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.slots[id.0].kind, NodeKind::Text(_))
    }

    /// Role of an element node; `None` for text and the root.
    pub fn role(&self, id: NodeId) -> Option<Role> {
        self.element(id).map(Element::role)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::tag)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id.0].children
    }

    // ── Construction ─────────────────────────────────────────────────────

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(Element::new(tag)))
    }

    /// Create a detached element with a single text child.
    pub fn create_element_with_text(&mut self, tag: &str, text: &str) -> NodeId {
        let el = self.create_element(tag);
        let t = self.create_text(text);
        self.append(el, t);
        el
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    /// Store a fully built element as a new detached node.
    pub(crate) fn insert_element(&mut self, el: Element) -> NodeId {
        self.alloc(NodeKind::Element(el))
    }

    // ── Mutation ─────────────────────────────────────────────────────────

    /// Remove `id` from its parent and hand it back to the caller.
    ///
    /// The subtree stays intact and can be re-inserted elsewhere.
    pub fn detach(&mut self, id: NodeId) -> NodeId {
        if let Some(parent) = self.slots[id.0].parent.take() {
            self.slots[parent.0].children.retain(|&c| c != id);
        }
        id
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(!self.is_ancestor_or_self(child, parent));
        self.detach(child);
        self.slots[child.0].parent = Some(parent);
        self.slots[parent.0].children.push(child);
    }

    /// Insert `node` immediately before `reference`. No-op if `reference`
    /// has no parent.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        self.insert_at_offset(reference, node, 0);
    }

    /// Insert `node` immediately after `reference`. No-op if `reference`
    /// has no parent.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        self.insert_at_offset(reference, node, 1);
    }

    fn insert_at_offset(&mut self, reference: NodeId, node: NodeId, offset: usize) {
        if reference == node {
            return;
        }
        self.detach(node);
        let Some(parent) = self.parent(reference) else {
            return;
        };
        let Some(pos) = self.position(reference) else {
            return;
        };
        self.slots[node.0].parent = Some(parent);
        self.slots[parent.0].children.insert(pos + offset, node);
    }

    /// Replace `id` with its children, in order, at the same position.
    pub fn unwrap(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let Some(pos) = self.position(id) else {
            return;
        };
        let children = std::mem::take(&mut self.slots[id.0].children);
        for &child in &children {
            self.slots[child.0].parent = Some(parent);
        }
        let siblings = &mut self.slots[parent.0].children;
        siblings.splice(pos..=pos, children);
        self.slots[id.0].parent = None;
    }

    /// Delete `id` and its whole subtree from the document.
    pub fn decompose(&mut self, id: NodeId) {
        self.detach(id);
    }

    /// Move every child of `from` to the end of `to`, preserving order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.slots[from.0].children);
        for child in children {
            self.slots[child.0].parent = Some(to);
            self.slots[to.0].children.push(child);
        }
    }

    // ── Navigation ───────────────────────────────────────────────────────

    /// Index of `id` among its parent's children.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.slots[parent.0].children.iter().position(|&c| c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let pos = self.position(id)?;
        self.slots[parent.0].children.get(pos + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let pos = self.position(id)?;
        pos.checked_sub(1)
            .and_then(|p| self.slots[parent.0].children.get(p).copied())
    }

    /// A node is insignificant only when it is text made of nothing but
    /// spaces and newlines.
    pub fn is_significant(&self, id: NodeId) -> bool {
        match &self.slots[id.0].kind {
            NodeKind::Text(t) => !t.trim_matches([' ', '\n']).is_empty(),
            _ => true,
        }
    }

    pub fn next_significant_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let pos = self.position(id)?;
        self.slots[parent.0].children[pos + 1..]
            .iter()
            .copied()
            .find(|&c| self.is_significant(c))
    }

    pub fn first_significant_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.is_significant(c))
    }

    pub fn significant_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_significant(c))
            .collect()
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.element(c).is_some())
    }

    /// True while `id` is reachable from the fragment root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root() {
                return true;
            }
            match self.parent(current) {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == candidate {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// All descendants of `scope` in document (pre-)order, excluding `scope`.
    ///
    /// Returned as a snapshot so callers can mutate the tree while walking it.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Snapshot of every element under `scope` accepted by `predicate`.
    pub fn find_all(&self, scope: NodeId, predicate: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(&predicate))
            .collect()
    }

    /// First element under `scope` with the given tag and, if set, class.
    pub fn find_element(&self, scope: NodeId, tag: &str, class: Option<&str>) -> Option<NodeId> {
        self.descendants(scope).into_iter().find(|&id| {
            self.element(id).is_some_and(|el| {
                el.tag() == tag && class.is_none_or(|c| el.has_class(c))
            })
        })
    }

    /// Concatenated text of every text node under `id` (or `id` itself).
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(t) = self.text(id) {
            return t.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.text(d))
            .collect()
    }
}
