//! Document-order comparison.
//!
//! Determines the relative position of two tree nodes in the total order
//! induced by preorder traversal, with attribute nodes ordered immediately
//! before their owner element's children. The algorithm walks both ancestor
//! chains to equal depth, then scans sibling lists from the common parent —
//! O(depth + siblings-between), never O(tree size).
//!
//! Namespace positions are handled one level up, in the cursor layer: their
//! order against arbitrary other positions is not transitive with sibling
//! comparison, so anything but an identical position compares as
//! [`Order::Unrelated`].

use crate::tree::{Document, NodeId};

/// Relative document-order position of one cursor against another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    /// Both cursors sit on the identical position.
    Same,
    /// The first position precedes the second in document order.
    Before,
    /// The first position follows the second in document order.
    After,
    /// The positions share no common root (detached subtrees, different
    /// documents, or a namespace position against anything else).
    Unrelated,
}

/// Compares two distinct nodes that hang off the same owner.
///
/// Attribute nodes come before any child node of the owner; two attributes
/// order by their index in the owner's collection.
fn compare_siblings(doc: &Document, node1: NodeId, node2: NodeId) -> Order {
    debug_assert_ne!(node1, node2, "identical nodes are handled by compare");

    let attr1 = doc.kind(node1).is_attribute();
    let attr2 = doc.kind(node2).is_attribute();
    if attr1 {
        if attr2 {
            // Scan the owner's collection; whichever appears first wins.
            let Some(owner) = doc.parent(node1) else {
                return Order::Unrelated;
            };
            for &attr in doc.attributes(owner) {
                if attr == node1 {
                    return Order::Before;
                }
                if attr == node2 {
                    return Order::After;
                }
            }
            return Order::Unrelated;
        }
        return Order::Before;
    }
    if attr2 {
        return Order::After;
    }

    // Neither is an attribute: scan node1's following siblings for node2.
    let mut next = doc.next_sibling(node1);
    while let Some(n) = next {
        if n == node2 {
            return Order::Before;
        }
        next = doc.next_sibling(n);
    }
    Order::After
}

/// Depth of `node`: the number of owner steps up to a parentless node.
/// Attributes take one pseudo-parent step to their owner element.
fn depth_of(doc: &Document, node: NodeId) -> usize {
    let mut depth = 0;
    let mut current = doc.parent(node);
    while let Some(n) = current {
        depth += 1;
        current = doc.parent(n);
    }
    depth
}

/// Compares two calibrated, non-namespace positions for document order.
///
/// Callers are responsible for text-run calibration and for the
/// identical-position short-circuit; `compare` assumes `node1 != node2`.
#[must_use]
pub fn compare(doc: &Document, node1: NodeId, node2: NodeId) -> Order {
    debug_assert_ne!(node1, node2);

    let parent1 = doc.parent(node1);
    let parent2 = doc.parent(node2);
    if parent1 == parent2 {
        return match parent1 {
            // Two parentless nodes share no order.
            None => Order::Unrelated,
            Some(_) => compare_siblings(doc, node1, node2),
        };
    }

    let mut node1 = node1;
    let mut node2 = node2;
    let mut parent1 = parent1;
    let mut parent2 = parent2;
    let depth1 = depth_of(doc, node1);
    let depth2 = depth_of(doc, node2);

    if depth2 > depth1 {
        for _ in depth1..depth2 {
            let Some(p) = doc.parent(node2) else { break };
            node2 = p;
        }
        if node1 == node2 {
            // node1 is an ancestor of the original node2.
            return Order::Before;
        }
        parent2 = doc.parent(node2);
    } else if depth1 > depth2 {
        for _ in depth2..depth1 {
            let Some(p) = doc.parent(node1) else { break };
            node1 = p;
        }
        if node1 == node2 {
            return Order::After;
        }
        parent1 = doc.parent(node1);
    }

    // Walk both chains in lock-step until they meet.
    while let (Some(p1), Some(p2)) = (parent1, parent2) {
        if p1 == p2 {
            debug_assert_ne!(node1, node2);
            return compare_siblings(doc, node1, node2);
        }
        node1 = p1;
        node2 = p2;
        parent1 = doc.parent(node1);
        parent2 = doc.parent(node2);
    }
    Order::Unrelated
}
