//! Text run coalescing.
//!
//! The XPath data model treats a maximal run of adjacent text-like sibling
//! nodes (Text, CDATA, Whitespace, SignificantWhitespace) as one logical
//! text node. This module finds the physical boundaries of such a run and
//! computes its concatenated value.
//!
//! A cursor parked anywhere inside a run must behave as if it sat on the
//! run's first physical node — the cursor layer calls [`run_start`] to
//! *calibrate* before any read, compare, or text-targeted edit, because an
//! earlier edit may have created a new text node immediately before the
//! cursor's current node (mutations never re-anchor outstanding cursors).

use crate::axis;
use crate::tree::{Document, NodeId};

/// Returns `true` if the node is one of the four text-like kinds.
#[must_use]
pub fn is_text(doc: &Document, node: NodeId) -> bool {
    doc.kind(node).is_text()
}

/// Returns the first node of the maximal text-like run containing `node`.
///
/// If `node` is not text-like, or has no text-like previous sibling, the
/// result is `node` itself. Sibling steps are entity-reference transparent,
/// so a run can span wrapper boundaries.
#[must_use]
pub fn run_start(doc: &Document, node: NodeId) -> NodeId {
    let mut start = node;
    let mut current = axis::prev_sibling_of(doc, start);
    while let Some(prev) = current {
        if !is_text(doc, prev) {
            break;
        }
        start = prev;
        current = axis::prev_sibling_of(doc, start);
    }
    start
}

/// Returns the last node of the maximal text-like run containing `node`.
#[must_use]
pub fn run_end(doc: &Document, node: NodeId) -> NodeId {
    let mut end = node;
    let mut current = axis::next_sibling_of(doc, end);
    while let Some(next) = current {
        if !is_text(doc, next) {
            break;
        }
        end = next;
        current = axis::next_sibling_of(doc, end);
    }
    end
}

/// Returns the concatenated value of the run containing `node`, members in
/// sibling order.
///
/// This is the logical text value at the position, as opposed to the value
/// of one underlying storage node.
#[must_use]
pub fn run_value(doc: &Document, node: NodeId) -> String {
    let start = run_start(doc, node);
    let mut value = String::new();
    let mut current = Some(start);
    while let Some(n) = current {
        if !is_text(doc, n) {
            break;
        }
        if let Some(content) = doc.node_text(n) {
            value.push_str(content);
        }
        current = axis::next_sibling_of(doc, n);
    }
    value
}
