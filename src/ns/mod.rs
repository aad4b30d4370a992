//! Namespace scope resolution.
//!
//! Namespace declarations are attributes in the reserved xmlns namespace
//! (`xmlns="…"` / `xmlns:p="…"`). The navigator synthesizes namespace
//! positions from them during namespace-axis traversal; they are never
//! physical children of the element whose axis yields them.
//!
//! Two quirks of the model are load-bearing and preserved deliberately:
//!
//! - Within one element, declarations enumerate in **reverse attribute
//!   order** (namespace axis order is reverse document order). The
//!   ancestor-continuation and shadowing logic below depends on scanning in
//!   this order.
//! - An enumeration never yields two entries for the same prefix: a
//!   declaration is suppressed when a nearer element on the path back to
//!   the start already declared that prefix ([`path_has_duplicate`]).
//!
//! Every document also carries the implicit `xml` prefix binding. The `All`
//! scope yields it as the final entry unless an explicit `xmlns:xml`
//! declaration already appeared.

use crate::tree::{Document, NodeId, NodeKind, XMLNS_URI, XML_URI};
use crate::util::dict::SymbolId;

/// Enumeration policy for the namespace axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Only declarations physically on the start element.
    Local,
    /// Declarations on the start element and its ancestors, without the
    /// implicit `xml` binding.
    ExcludeXml,
    /// Everything in scope, with the implicit `xml` binding yielded last
    /// when no explicit declaration shadows it.
    All,
}

/// Depth cap for the duplicate-suppression walk. The walk is O(depth) per
/// candidate and O(depth²) for a full `All` enumeration; the cap bounds
/// pathological ancestor chains.
pub const MAX_SCOPE_DEPTH: usize = 1024;

/// One entry produced by namespace-axis enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NsEntry {
    /// A physical declaration attribute: its owner element and its index in
    /// the owner's collection.
    Decl {
        /// Element whose collection physically holds the declaration.
        owner: NodeId,
        /// Index of the declaration within that collection.
        index: usize,
    },
    /// The document's implicit `xmlns:xml` binding.
    XmlVirtual,
}

/// Returns the URI declared for `prefix` at `node`, walking the ancestor
/// chain from the nearest containing element outward; nearest declaration
/// wins. Falls back to the fixed `xml` and `xmlns` bindings; returns `None`
/// for an undeclared prefix. The empty prefix looks up the default
/// namespace declaration.
#[must_use]
pub fn lookup<'d>(doc: &'d Document, node: NodeId, prefix: &str) -> Option<&'d str> {
    // The local-name symbol a matching declaration would carry: the prefix
    // itself, or "xmlns" for the default declaration.
    let local = if prefix.is_empty() {
        Some(doc.sym_xmlns())
    } else {
        doc.symbol(prefix)
    };

    if let Some(local) = local {
        let mut element = nearest_element(doc, node);
        while let Some(e) = element {
            if let Some((_, attr)) = doc.find_attribute(e, local, Some(doc.sym_xmlns_uri())) {
                return doc.node_text(attr);
            }
            element = parent_element(doc, e);
        }
    }

    match prefix {
        "xml" => Some(XML_URI),
        "xmlns" => Some(XMLNS_URI),
        _ => None,
    }
}

/// Finds the declaration position for `prefix` visible at `element`,
/// walking ancestors. Used to park a cursor on a namespace node.
#[must_use]
pub fn find_decl(doc: &Document, element: NodeId, prefix: &str) -> Option<(NodeId, usize)> {
    let local = if prefix.is_empty() {
        Some(doc.sym_xmlns())
    } else {
        doc.symbol(prefix)
    }?;

    let mut current = Some(element);
    while let Some(e) = current {
        if let Some((index, _)) = doc.find_attribute(e, local, Some(doc.sym_xmlns_uri())) {
            return Some((e, index));
        }
        current = parent_element(doc, e);
    }
    None
}

/// Returns the first namespace entry for `element` under `scope`, or `None`
/// if the axis is empty.
#[must_use]
pub fn first_namespace(doc: &Document, element: NodeId, scope: Scope) -> Option<NsEntry> {
    if !doc.kind(element).is_element() {
        return None;
    }
    match scope {
        Scope::Local => {
            let index = first_local(doc, element)?;
            Some(NsEntry::Decl {
                owner: element,
                index,
            })
        }
        Scope::ExcludeXml => {
            let (mut owner, mut index) = first_global(doc, element)?;
            // Skip explicit xmlns:xml declarations.
            while decl_local(doc, owner, index) == doc.sym_xml() {
                (owner, index) = next_global(doc, owner, index)?;
            }
            Some(NsEntry::Decl { owner, index })
        }
        Scope::All => match first_global(doc, element) {
            Some((owner, index)) => Some(NsEntry::Decl { owner, index }),
            None => Some(NsEntry::XmlVirtual),
        },
    }
}

/// Returns the entry after `current` in the enumeration started at
/// `ns_parent` under `scope`, or `None` when the axis is exhausted.
///
/// `current` must be an entry previously produced for the same
/// `ns_parent`; the virtual `xml` binding is always last.
#[must_use]
pub fn next_namespace(
    doc: &Document,
    current: NsEntry,
    ns_parent: NodeId,
    scope: Scope,
) -> Option<NsEntry> {
    let NsEntry::Decl {
        owner: mut current_owner,
        index: mut current_index,
    } = current
    else {
        return None;
    };

    match scope {
        Scope::Local => {
            // The local axis never leaves the start element.
            if current_owner != ns_parent {
                return None;
            }
            let index = next_local(doc, current_owner, current_index)?;
            Some(NsEntry::Decl {
                owner: current_owner,
                index,
            })
        }
        Scope::ExcludeXml => loop {
            (current_owner, current_index) = next_global(doc, current_owner, current_index)?;
            let local = decl_local(doc, current_owner, current_index);
            if local == doc.sym_xml() {
                continue;
            }
            if path_has_duplicate(doc, Some(current_owner), ns_parent, local) {
                continue;
            }
            return Some(NsEntry::Decl {
                owner: current_owner,
                index: current_index,
            });
        },
        Scope::All => loop {
            match next_global(doc, current_owner, current_index) {
                Some((owner, index)) => {
                    (current_owner, current_index) = (owner, index);
                    let local = decl_local(doc, current_owner, current_index);
                    if path_has_duplicate(doc, Some(current_owner), ns_parent, local) {
                        continue;
                    }
                    return Some(NsEntry::Decl {
                        owner: current_owner,
                        index: current_index,
                    });
                }
                None => {
                    // Physical declarations exhausted. The implicit xml
                    // binding closes the axis unless an explicit xmlns:xml
                    // anywhere on the path already covered it.
                    if path_has_duplicate(doc, None, ns_parent, doc.sym_xml()) {
                        return None;
                    }
                    return Some(NsEntry::XmlVirtual);
                }
            }
        },
    }
}

/// Captures the ambient namespace bindings in scope at `node`: prefix → URI,
/// nearest declaration winning, with the implicit `xml` binding included.
/// The streaming writer resolves prefixed content against this capture.
#[must_use]
pub fn scope_at(doc: &Document, node: NodeId) -> Vec<(String, String)> {
    let mut bindings: Vec<(String, String)> = Vec::new();
    let mut element = nearest_element(doc, node);
    while let Some(e) = element {
        for &attr in doc.attributes(e) {
            let Some(name) = doc.name_of(attr) else {
                continue;
            };
            if !doc.is_namespace_decl(name) {
                continue;
            }
            let prefix = if name.prefix.is_some() {
                doc.resolve(name.local)
            } else {
                ""
            };
            if bindings.iter().any(|(p, _)| p == prefix) {
                continue; // a nearer element already bound this prefix
            }
            let uri = doc.node_text(attr).unwrap_or_default();
            bindings.push((prefix.to_string(), uri.to_string()));
        }
        element = parent_element(doc, e);
    }
    if !bindings.iter().any(|(p, _)| p == "xml") {
        bindings.push(("xml".to_string(), XML_URI.to_string()));
    }
    bindings
}

// --- Internal walks ---

/// Nearest ancestor-or-self element; attributes contribute their owner.
fn nearest_element(doc: &Document, node: NodeId) -> Option<NodeId> {
    let mut current = Some(node);
    while let Some(n) = current {
        if doc.kind(n).is_element() {
            return Some(n);
        }
        current = doc.parent(n);
    }
    None
}

/// Parent of `element` if that parent is itself an element.
fn parent_element(doc: &Document, element: NodeId) -> Option<NodeId> {
    let parent = doc.parent(element)?;
    match doc.kind(parent) {
        NodeKind::Element { .. } => Some(parent),
        _ => None,
    }
}

/// The local-name symbol of the declaration at `(owner, index)`. For a
/// prefixed declaration this is the declared prefix; for the default
/// declaration it is `xmlns` itself.
#[allow(clippy::expect_used)]
fn decl_local(doc: &Document, owner: NodeId, index: usize) -> SymbolId {
    let attr = doc.attributes(owner)[index];
    doc.name_of(attr).expect("attribute node has a name").local
}

/// Last declaration on `element` (reverse attribute order ⇒ first on the
/// axis), if any.
fn first_local(doc: &Document, element: NodeId) -> Option<usize> {
    let attributes = doc.attributes(element);
    (0..attributes.len()).rev().find(|&i| {
        doc.name_of(attributes[i])
            .is_some_and(|n| doc.is_namespace_decl(n))
    })
}

/// Next declaration on `element` scanning backwards from `index`.
fn next_local(doc: &Document, element: NodeId, index: usize) -> Option<usize> {
    let attributes = doc.attributes(element);
    (0..index.min(attributes.len())).rev().find(|&i| {
        doc.name_of(attributes[i])
            .is_some_and(|n| doc.is_namespace_decl(n))
    })
}

/// First declaration on `element` or the nearest ancestor element carrying
/// one.
fn first_global(doc: &Document, element: NodeId) -> Option<(NodeId, usize)> {
    let mut current = Some(element);
    while let Some(e) = current {
        if let Some(index) = first_local(doc, e) {
            return Some((e, index));
        }
        current = parent_element(doc, e);
    }
    None
}

/// Declaration after `(owner, index)` continuing into ancestor elements.
fn next_global(doc: &Document, owner: NodeId, index: usize) -> Option<(NodeId, usize)> {
    if let Some(i) = next_local(doc, owner, index) {
        return Some((owner, i));
    }
    let mut current = parent_element(doc, owner);
    while let Some(e) = current {
        if let Some(i) = first_local(doc, e) {
            return Some((e, i));
        }
        current = parent_element(doc, e);
    }
    None
}

/// Returns `true` if any element strictly between `bottom` (inclusive) and
/// `top` (exclusive; `None` = walk to the root) declares `local` — i.e. a
/// nearer declaration shadows the candidate. The walk is capped at
/// [`MAX_SCOPE_DEPTH`] levels.
fn path_has_duplicate(
    doc: &Document,
    top: Option<NodeId>,
    bottom: NodeId,
    local: SymbolId,
) -> bool {
    let mut current = Some(bottom);
    let mut steps = 0usize;
    while let Some(e) = current {
        if Some(e) == top || steps >= MAX_SCOPE_DEPTH {
            break;
        }
        if doc
            .find_attribute(e, local, Some(doc.sym_xmlns_uri()))
            .is_some()
        {
            return true;
        }
        current = parent_element(doc, e);
        steps += 1;
    }
    false
}
