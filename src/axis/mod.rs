//! Structural axis walking.
//!
//! Pure read-only functions that compute the next tree node along a named
//! axis, applying two adjustments the raw sibling/child links do not make:
//!
//! - **Entity-reference transparency**: an `EntityRef` wrapper is never a
//!   navigation target. Walking into a node's children descends through
//!   wrappers to real content; walking off the end of a wrapper's child list
//!   continues with the wrapper's own sibling. Navigation therefore reflects
//!   the *expanded* content model.
//! - **Child-validity filtering** ([`is_valid_child`]): Document and
//!   DocumentFragment nodes expose only the child kinds the XPath data model
//!   permits there, even if storage holds others.
//!
//! Documents without entity references (the overwhelmingly common case) take
//! a fast path: every function below is then a plain link read.

use crate::tree::{Document, NodeId, NodeKind};

/// Returns the parent of `node`, skipping entity-reference wrappers so the
/// result is a node navigation could actually sit on.
#[must_use]
pub fn parent_of(doc: &Document, node: NodeId) -> Option<NodeId> {
    let parent = doc.parent(node);
    if !doc.has_entity_refs() {
        return parent;
    }
    parent_tail(doc, parent)
}

fn parent_tail(doc: &Document, mut parent: Option<NodeId>) -> Option<NodeId> {
    while let Some(p) = parent {
        if !matches!(doc.kind(p), NodeKind::EntityRef { .. }) {
            break;
        }
        parent = doc.parent(p);
    }
    parent
}

/// Returns the first child of `node`, descending into entity-reference
/// wrappers until real content is found.
#[must_use]
pub fn first_child_of(doc: &Document, node: NodeId) -> Option<NodeId> {
    let child = doc.first_child(node);
    if !doc.has_entity_refs() {
        return child;
    }
    first_child_tail(doc, child)
}

fn first_child_tail(doc: &Document, mut child: Option<NodeId>) -> Option<NodeId> {
    while let Some(c) = child {
        if !matches!(doc.kind(c), NodeKind::EntityRef { .. }) {
            break;
        }
        child = doc.first_child(c);
    }
    child
}

/// Returns the next sibling of `node` in the expanded content model: at the
/// end of an entity-reference wrapper's child list the walk continues with
/// the wrapper's own next sibling, and a sibling that is itself a wrapper is
/// entered.
#[must_use]
pub fn next_sibling_of(doc: &Document, node: NodeId) -> Option<NodeId> {
    let sibling = doc.next_sibling(node);
    if !doc.has_entity_refs() {
        return sibling;
    }
    next_sibling_tail(doc, node, sibling)
}

fn next_sibling_tail(
    doc: &Document,
    mut node: NodeId,
    mut sibling: Option<NodeId>,
) -> Option<NodeId> {
    while sibling.is_none() {
        let Some(parent) = doc.parent(node) else {
            return None;
        };
        if !matches!(doc.kind(parent), NodeKind::EntityRef { .. }) {
            return None;
        }
        node = parent;
        sibling = doc.next_sibling(node);
    }
    while let Some(s) = sibling {
        if !matches!(doc.kind(s), NodeKind::EntityRef { .. }) {
            break;
        }
        sibling = doc.first_child(s);
    }
    sibling
}

/// Returns the previous sibling of `node` in the expanded content model.
/// Mirror image of [`next_sibling_of`]: wrappers are exited at their start
/// and entered at their last child.
#[must_use]
pub fn prev_sibling_of(doc: &Document, node: NodeId) -> Option<NodeId> {
    let sibling = doc.prev_sibling(node);
    if !doc.has_entity_refs() {
        return sibling;
    }
    prev_sibling_tail(doc, node, sibling)
}

fn prev_sibling_tail(
    doc: &Document,
    mut node: NodeId,
    mut sibling: Option<NodeId>,
) -> Option<NodeId> {
    while sibling.is_none() {
        let Some(parent) = doc.parent(node) else {
            return None;
        };
        if !matches!(doc.kind(parent), NodeKind::EntityRef { .. }) {
            return None;
        }
        node = parent;
        sibling = doc.prev_sibling(node);
    }
    while let Some(s) = sibling {
        if !matches!(doc.kind(s), NodeKind::EntityRef { .. }) {
            break;
        }
        sibling = doc.last_child(s);
    }
    sibling
}

/// Returns whether `child` is a kind the navigation layer exposes as a
/// child of `parent`.
///
/// Element parents accept everything; a Document accepts only
/// Element/ProcessingInstruction/Comment; a DocumentFragment accepts
/// element-content kinds plus text-like kinds. All other parents expose no
/// children.
#[must_use]
pub fn is_valid_child(doc: &Document, parent: NodeId, child: NodeId) -> bool {
    match doc.kind(parent) {
        NodeKind::Element { .. } => true,
        NodeKind::Document => matches!(
            doc.kind(child),
            NodeKind::Element { .. }
                | NodeKind::ProcessingInstruction { .. }
                | NodeKind::Comment { .. }
        ),
        NodeKind::DocumentFragment => matches!(
            doc.kind(child),
            NodeKind::Element { .. }
                | NodeKind::Text { .. }
                | NodeKind::CData { .. }
                | NodeKind::ProcessingInstruction { .. }
                | NodeKind::Comment { .. }
                | NodeKind::Whitespace { .. }
                | NodeKind::SignificantWhitespace { .. }
        ),
        NodeKind::Attribute { .. }
        | NodeKind::Text { .. }
        | NodeKind::CData { .. }
        | NodeKind::Whitespace { .. }
        | NodeKind::SignificantWhitespace { .. }
        | NodeKind::Comment { .. }
        | NodeKind::ProcessingInstruction { .. }
        | NodeKind::EntityRef { .. }
        | NodeKind::Entity { .. } => false,
    }
}

/// Returns `true` if `bottom` is a descendant of `top`, counting an
/// attribute's owner element as its parent.
#[must_use]
pub fn is_descendant(doc: &Document, top: NodeId, bottom: NodeId) -> bool {
    let mut current = bottom;
    while let Some(parent) = doc.parent(current) {
        if parent == top {
            return true;
        }
        current = parent;
    }
    false
}

/// Returns `true` if `right` is a later sibling of `left` in the same raw
/// child list.
#[must_use]
pub fn is_following_sibling(doc: &Document, left: NodeId, right: NodeId) -> bool {
    let mut current = doc.next_sibling(left);
    while let Some(s) = current {
        if s == right {
            return true;
        }
        current = doc.next_sibling(s);
    }
    false
}
