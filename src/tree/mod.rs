//! Arena-based XML document tree.
//!
//! This module implements the core tree representation using arena allocation
//! with typed indices. All nodes live in a contiguous `Vec<NodeData>` owned by
//! the `Document`, and are referenced by `NodeId` — a newtype over
//! `NonZeroU32`.
//!
//! This design provides O(1) node access, cache-friendly layout, no reference
//! counting overhead, and safe bulk deallocation (drop the `Document` and
//! everything is freed).
//!
//! # Architecture
//!
//! Parent and sibling links are arena indices, never owning pointers, which
//! side-steps the ownership cycles a node↔parent web would otherwise create.
//! Nodes are never freed individually: `detach` unlinks a node from its
//! parent but leaves it in the arena, so a stale `NodeId` held by an
//! outstanding cursor always reads safely — "is this node still in the
//! document" is a reachability question answered by [`Document::is_attached`],
//! not a dangling-pointer hazard.
//!
//! Attributes are arena nodes too ([`NodeKind::Attribute`]), held in their
//! owner element's ordered collection rather than in the sibling list. An
//! attribute's `parent` link is its owner element. This gives attributes
//! stable identity, which the cursor layer leans on to revalidate cached
//! attribute indices after concurrent edits.

mod node;

pub use node::{Name, NodeKind};

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::util::dict::{Dict, SymbolId};

/// The reserved URI bound to the `xml` prefix in every document.
pub const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// The reserved URI that namespace-declaration attributes live in.
pub const XMLNS_URI: &str = "http://www.w3.org/2000/xmlns/";

/// A typed index into the document's node arena.
///
/// `NodeId` is a newtype over `NonZeroU32`, meaning it can never be zero
/// and `Option<NodeId>` has the same size as `NodeId` (niche optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    /// Returns the raw index as a `usize` for indexing into the arena.
    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// Process-unique identity of one document.
///
/// Cursors remember the `DocId` they were created against; every operation
/// that takes a second cursor or a `&Document` compares identities and
/// rejects cross-document mixing before doing anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocId(u64);

static NEXT_DOC_ID: AtomicU64 = AtomicU64::new(1);

impl DocId {
    fn next() -> Self {
        Self(NEXT_DOC_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Storage for a single node in the document arena.
///
/// Each node stores its kind (element, text, comment, etc.) and links to
/// parent, children, and siblings for tree navigation. Access individual
/// nodes via [`Document::node`].
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is (element, text, comment, etc.) and its payload.
    pub kind: NodeKind,
    /// Parent node, if any. For attribute nodes this is the owner element.
    /// The document root node has no parent.
    pub parent: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append).
    pub last_child: Option<NodeId>,
    /// Next sibling. Always `None` for attribute nodes.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling. Always `None` for attribute nodes.
    pub prev_sibling: Option<NodeId>,
    /// Immutability flag. Mutation of this node, or of any node whose
    /// ancestor chain contains a flagged node, is rejected.
    pub read_only: bool,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
            read_only: false,
        }
    }
}

/// An XML document.
///
/// The `Document` owns all nodes in an arena plus the string dictionary
/// their names are interned in, and provides the raw structural primitives
/// the navigation layers build on. All tree operations go through
/// `&Document` (navigation) or `&mut Document` (mutation).
///
/// # Examples
///
/// ```
/// use domnav::Document;
///
/// let mut doc = Document::new();
/// let root = doc.root();
/// let elem = doc.create_element(None, "root", None);
/// doc.append_child(root, elem);
/// assert_eq!(doc.local_name(elem), Some("root"));
/// ```
#[derive(Debug)]
pub struct Document {
    /// The node arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<NodeData>,
    /// The document root node id (the Document node, not the root element).
    root: NodeId,
    /// Interned strings for names, prefixes, and namespace URIs.
    dict: Dict,
    /// Process-unique identity for cross-document rejection.
    id: DocId,
    /// Set once any `EntityRef` node is created; the axis walker takes the
    /// plain-link fast path while this is false.
    has_entity_refs: bool,
    /// Mapping from ID attribute values to element nodes, for
    /// [`element_by_id`](Document::element_by_id).
    id_map: HashMap<String, NodeId>,
    /// Interned `"xml"`.
    sym_xml: SymbolId,
    /// Interned `"xmlns"`.
    sym_xmlns: SymbolId,
    /// Interned reserved xml namespace URI.
    sym_xml_uri: SymbolId,
    /// Interned reserved xmlns namespace URI.
    sym_xmlns_uri: SymbolId,
    /// The document-owned `xmlns:xml` attribute node yielded by the
    /// namespace axis for the implicit `xml` binding. Created eagerly at
    /// construction; read-only; never attached to an element.
    namespace_xml: NodeId,
}

impl Document {
    /// Creates a new empty document.
    ///
    /// The document contains the root Document node plus the implicit
    /// `xmlns:xml` declaration node.
    #[must_use]
    pub fn new() -> Self {
        let mut dict = Dict::new();
        let sym_xml = dict.intern("xml");
        let sym_xmlns = dict.intern("xmlns");
        let sym_xml_uri = dict.intern(XML_URI);
        let sym_xmlns_uri = dict.intern(XMLNS_URI);

        let mut nodes = Vec::with_capacity(64);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(NodeData::new(NodeKind::Document));
        // Index 1: the document root node
        nodes.push(NodeData::new(NodeKind::Document));
        let root = NodeId::from_index(1);
        // Index 2: the implicit xmlns:xml declaration node
        let mut xml_decl = NodeData::new(NodeKind::Attribute {
            name: Name {
                prefix: Some(sym_xmlns),
                local: sym_xml,
                namespace: Some(sym_xmlns_uri),
            },
            value: XML_URI.to_string(),
        });
        xml_decl.read_only = true;
        nodes.push(xml_decl);
        let namespace_xml = NodeId::from_index(2);

        Self {
            nodes,
            root,
            dict,
            id: DocId::next(),
            has_entity_refs: false,
            id_map: HashMap::new(),
            sym_xml,
            sym_xmlns,
            sym_xml_uri,
            sym_xmlns_uri,
            namespace_xml,
        }
    }

    /// Returns the document root node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns this document's process-unique identity.
    #[must_use]
    pub fn doc_id(&self) -> DocId {
        self.id
    }

    /// Returns the root element of the document (the single top-level element).
    ///
    /// Returns `None` if the document has no element children.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| self.node(id).kind.is_element())
    }

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a valid node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    /// Returns a mutable reference to the `NodeData` for the given node.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the kind of the given node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Returns `true` once the document contains any entity reference node.
    ///
    /// The axis walker uses this as a fast path: while false, sibling and
    /// child reads are plain link loads with no wrapper handling.
    #[must_use]
    pub fn has_entity_refs(&self) -> bool {
        self.has_entity_refs
    }

    // --- Interning ---

    /// Interns a string in this document's dictionary.
    pub fn intern(&mut self, s: &str) -> SymbolId {
        self.dict.intern(s)
    }

    /// Looks up an interned string without interning it.
    ///
    /// Returns `None` if the string was never interned in this document —
    /// in which case no node in the document can carry it as a name part.
    #[must_use]
    pub fn symbol(&self, s: &str) -> Option<SymbolId> {
        self.dict.get(s)
    }

    /// Resolves an interned symbol back to its string.
    #[must_use]
    pub fn resolve(&self, id: SymbolId) -> &str {
        self.dict.resolve(id)
    }

    /// Interns the parts of a qualified name.
    pub fn intern_name(
        &mut self,
        prefix: Option<&str>,
        local: &str,
        namespace: Option<&str>,
    ) -> Name {
        Name {
            prefix: prefix.map(|p| self.dict.intern(p)),
            local: self.dict.intern(local),
            namespace: namespace.map(|ns| self.dict.intern(ns)),
        }
    }

    /// Interned `"xml"`.
    #[must_use]
    pub fn sym_xml(&self) -> SymbolId {
        self.sym_xml
    }

    /// Interned `"xmlns"`.
    #[must_use]
    pub fn sym_xmlns(&self) -> SymbolId {
        self.sym_xmlns
    }

    /// Interned reserved xml namespace URI (`http://www.w3.org/XML/1998/namespace`).
    #[must_use]
    pub fn sym_xml_uri(&self) -> SymbolId {
        self.sym_xml_uri
    }

    /// Interned reserved xmlns URI (`http://www.w3.org/2000/xmlns/`).
    #[must_use]
    pub fn sym_xmlns_uri(&self) -> SymbolId {
        self.sym_xmlns_uri
    }

    /// The document-owned `xmlns:xml` attribute node representing the
    /// implicit `xml` prefix binding on the namespace axis.
    #[must_use]
    pub fn namespace_xml_node(&self) -> NodeId {
        self.namespace_xml
    }

    // --- Names and values ---

    /// Returns the qualified name of an element or attribute node.
    #[must_use]
    pub fn name_of(&self, id: NodeId) -> Option<Name> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. } | NodeKind::Attribute { name, .. } => Some(*name),
            _ => None,
        }
    }

    /// Returns the local name of an element or attribute node as a string.
    #[must_use]
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name_of(id).map(|n| self.resolve(n.local))
    }

    /// Formats a `Name` as `prefix:local` (or just `local` without a prefix).
    #[must_use]
    pub fn qualified_name(&self, name: Name) -> String {
        match name.prefix {
            Some(p) => format!("{}:{}", self.resolve(p), self.resolve(name.local)),
            None => self.resolve(name.local).to_string(),
        }
    }

    /// Returns `true` if `name` names a namespace-declaration attribute
    /// (`xmlns="…"` or `xmlns:p="…"`): its namespace URI is the reserved
    /// xmlns URI.
    #[must_use]
    pub fn is_namespace_decl(&self, name: Name) -> bool {
        name.namespace == Some(self.sym_xmlns_uri)
    }

    /// Returns the text payload of a node: content of text-like and comment
    /// nodes, data of a processing instruction, value of an attribute.
    #[must_use]
    pub fn node_text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { content }
            | NodeKind::CData { content }
            | NodeKind::Whitespace { content }
            | NodeKind::SignificantWhitespace { content }
            | NodeKind::Comment { content } => Some(content),
            NodeKind::ProcessingInstruction { data, .. } => data.as_deref(),
            NodeKind::Attribute { value, .. } => Some(value),
            NodeKind::Document
            | NodeKind::DocumentFragment
            | NodeKind::Element { .. }
            | NodeKind::EntityRef { .. }
            | NodeKind::Entity { .. } => None,
        }
    }

    /// Returns the concatenated text content of a node and all its
    /// descendants (text-like nodes only; comments and PIs do not
    /// contribute).
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result);
        result
    }

    fn collect_text(&self, id: NodeId, buf: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text { content }
            | NodeKind::CData { content }
            | NodeKind::Whitespace { content }
            | NodeKind::SignificantWhitespace { content } => {
                buf.push_str(content);
            }
            NodeKind::Attribute { value, .. } => {
                buf.push_str(value);
            }
            NodeKind::Comment { .. } | NodeKind::ProcessingInstruction { .. } => {}
            NodeKind::Document
            | NodeKind::DocumentFragment
            | NodeKind::Element { .. }
            | NodeKind::EntityRef { .. }
            | NodeKind::Entity { .. } => {
                for child in self.children(id) {
                    self.collect_text(child, buf);
                }
            }
        }
    }

    // --- Attributes ---

    /// Returns the ordered attribute collection of an element node.
    ///
    /// Returns an empty slice for non-element nodes.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Finds an attribute on `element` by interned local name and namespace.
    ///
    /// Returns the attribute's current index in the collection together with
    /// its node id.
    #[must_use]
    pub fn find_attribute(
        &self,
        element: NodeId,
        local: SymbolId,
        namespace: Option<SymbolId>,
    ) -> Option<(usize, NodeId)> {
        self.attributes(element)
            .iter()
            .enumerate()
            .find(|(_, &attr)| {
                self.name_of(attr)
                    .is_some_and(|n| n.local == local && n.namespace == namespace)
            })
            .map(|(i, &attr)| (i, attr))
    }

    /// Returns the current index of `attribute` within `element`'s
    /// collection, or `None` if it is no longer there.
    #[must_use]
    pub fn attribute_index_of(&self, element: NodeId, attribute: NodeId) -> Option<usize> {
        self.attributes(element).iter().position(|&a| a == attribute)
    }

    /// Appends an attribute node to an element's collection.
    ///
    /// The attribute's parent link becomes the owner element.
    pub fn append_attribute(&mut self, element: NodeId, attribute: NodeId) {
        debug_assert!(self.node(element).kind.is_element());
        debug_assert!(self.node(attribute).kind.is_attribute());
        debug_assert!(
            self.node(attribute).parent.is_none(),
            "attribute already has an owner; remove it first"
        );
        self.node_mut(attribute).parent = Some(element);
        if let NodeKind::Element { attributes, .. } = &mut self.node_mut(element).kind {
            attributes.push(attribute);
        }
    }

    /// Removes the attribute at `index` from an element's collection.
    ///
    /// Returns the removed attribute node id (now ownerless), or `None` if
    /// `index` is out of bounds or the node is not an element.
    pub fn remove_attribute_at(&mut self, element: NodeId, index: usize) -> Option<NodeId> {
        let removed = match &mut self.node_mut(element).kind {
            NodeKind::Element { attributes, .. } if index < attributes.len() => {
                Some(attributes.remove(index))
            }
            _ => None,
        };
        if let Some(attr) = removed {
            self.node_mut(attr).parent = None;
        }
        removed
    }

    /// Replaces the value of an attribute node.
    pub fn set_attribute_value(&mut self, attribute: NodeId, new_value: &str) {
        if let NodeKind::Attribute { value, .. } = &mut self.node_mut(attribute).kind {
            new_value.clone_into(value);
        }
    }

    /// Rebinds the namespace component of an element or attribute name.
    /// Used by the streaming writer once the in-scope declarations for a
    /// finished element are known.
    pub(crate) fn set_name_namespace(&mut self, id: NodeId, namespace: Option<SymbolId>) {
        match &mut self.node_mut(id).kind {
            NodeKind::Element { name, .. } | NodeKind::Attribute { name, .. } => {
                name.namespace = namespace;
            }
            _ => {}
        }
    }

    /// Replaces the content of a text-like or comment node, or the data of
    /// a processing instruction.
    pub fn set_text(&mut self, id: NodeId, new_content: &str) {
        match &mut self.node_mut(id).kind {
            NodeKind::Text { content }
            | NodeKind::CData { content }
            | NodeKind::Whitespace { content }
            | NodeKind::SignificantWhitespace { content }
            | NodeKind::Comment { content } => new_content.clone_into(content),
            NodeKind::ProcessingInstruction { data, .. } => {
                *data = Some(new_content.to_string());
            }
            NodeKind::Document
            | NodeKind::DocumentFragment
            | NodeKind::Element { .. }
            | NodeKind::Attribute { .. }
            | NodeKind::EntityRef { .. }
            | NodeKind::Entity { .. } => {}
        }
    }

    // --- Read-only marking ---

    /// Marks a node immutable (or clears the mark).
    pub fn set_read_only(&mut self, id: NodeId, read_only: bool) {
        self.node_mut(id).read_only = read_only;
    }

    /// Returns this node's own immutability flag.
    #[must_use]
    pub fn is_read_only(&self, id: NodeId) -> bool {
        self.node(id).read_only
    }

    /// Returns `true` if this node or any node on its ancestor chain
    /// (owner element for attributes) is marked immutable.
    #[must_use]
    pub fn effective_read_only(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(n) = current {
            if self.node(n).read_only {
                return true;
            }
            current = self.node(n).parent;
        }
        false
    }

    // --- Attachment ---

    /// Returns `true` if the node is still reachable from the document
    /// root by walking parent links (owner element for attributes).
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.node(current).parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    // --- ID lookup ---

    /// Associates an ID value with an element node.
    ///
    /// Subsequent calls to [`element_by_id`](Document::element_by_id) will
    /// return the associated node.
    pub fn set_id(&mut self, id: &str, node: NodeId) {
        self.id_map.insert(id.to_string(), node);
    }

    /// Looks up an element by its ID attribute value.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.id_map.get(id).copied()
    }

    // --- Navigation ---

    /// Returns the parent of a node (owner element for attributes).
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over a node and its ancestors (walking up to root).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns an iterator over all descendants of a node (depth-first).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    // --- Node creation ---

    /// Allocates a new node in the arena and returns its `NodeId`.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        if matches!(kind, NodeKind::EntityRef { .. }) {
            self.has_entity_refs = true;
        }
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        NodeId::from_index(index)
    }

    /// Creates an element node.
    pub fn create_element(
        &mut self,
        prefix: Option<&str>,
        local: &str,
        namespace: Option<&str>,
    ) -> NodeId {
        let name = self.intern_name(prefix, local, namespace);
        self.create_node(NodeKind::Element {
            name,
            attributes: Vec::new(),
        })
    }

    /// Creates an attribute node (not yet owned by any element).
    pub fn create_attribute(
        &mut self,
        prefix: Option<&str>,
        local: &str,
        namespace: Option<&str>,
        value: &str,
    ) -> NodeId {
        let name = self.intern_name(prefix, local, namespace);
        self.create_node(NodeKind::Attribute {
            name,
            value: value.to_string(),
        })
    }

    /// Creates a namespace-declaration attribute.
    ///
    /// `prefix` of `Some("p")` produces `xmlns:p="uri"`; `None` produces the
    /// default declaration `xmlns="uri"`.
    pub fn create_namespace_decl(&mut self, prefix: Option<&str>, uri: &str) -> NodeId {
        let name = match prefix {
            Some(p) => Name {
                prefix: Some(self.sym_xmlns),
                local: self.dict.intern(p),
                namespace: Some(self.sym_xmlns_uri),
            },
            None => Name {
                prefix: None,
                local: self.sym_xmlns,
                namespace: Some(self.sym_xmlns_uri),
            },
        };
        self.create_node(NodeKind::Attribute {
            name,
            value: uri.to_string(),
        })
    }

    /// Creates a text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::Text {
            content: content.to_string(),
        })
    }

    /// Creates a CDATA section node.
    pub fn create_cdata(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::CData {
            content: content.to_string(),
        })
    }

    /// Creates an ignorable-whitespace node.
    pub fn create_whitespace(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::Whitespace {
            content: content.to_string(),
        })
    }

    /// Creates a significant-whitespace node.
    pub fn create_significant_whitespace(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::SignificantWhitespace {
            content: content.to_string(),
        })
    }

    /// Creates a comment node.
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::Comment {
            content: content.to_string(),
        })
    }

    /// Creates a processing-instruction node.
    pub fn create_pi(&mut self, target: &str, data: Option<&str>) -> NodeId {
        self.create_node(NodeKind::ProcessingInstruction {
            target: target.to_string(),
            data: data.map(str::to_string),
        })
    }

    /// Creates an entity-reference wrapper node. Its children are the
    /// expansion content.
    pub fn create_entity_ref(&mut self, name: &str) -> NodeId {
        self.create_node(NodeKind::EntityRef {
            name: name.to_string(),
        })
    }

    /// Creates a document fragment node.
    pub fn create_fragment(&mut self) -> NodeId {
        self.create_node(NodeKind::DocumentFragment)
    }

    // --- Mutation ---

    /// Appends a child node to the end of a parent's child list.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `child` already has a parent or is an
    /// attribute node. Detach it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            self.node(child).parent.is_none(),
            "child already has a parent; detach it first"
        );
        debug_assert!(
            !self.node(child).kind.is_attribute(),
            "attribute nodes belong in an element's collection"
        );

        self.node_mut(child).parent = Some(parent);

        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
            self.node_mut(parent).last_child = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
            self.node_mut(parent).last_child = Some(child);
        }
    }

    /// Inserts `new_child` before `reference` in the parent's child list.
    ///
    /// # Panics
    ///
    /// Panics if `reference` has no parent or if `new_child` already has a parent.
    #[allow(clippy::expect_used)]
    pub fn insert_before(&mut self, reference: NodeId, new_child: NodeId) {
        debug_assert!(
            self.node(new_child).parent.is_none(),
            "new_child already has a parent; detach it first"
        );

        let parent = self
            .node(reference)
            .parent
            .expect("reference has no parent");
        self.node_mut(new_child).parent = Some(parent);

        if let Some(prev) = self.node(reference).prev_sibling {
            self.node_mut(prev).next_sibling = Some(new_child);
            self.node_mut(new_child).prev_sibling = Some(prev);
        } else {
            self.node_mut(parent).first_child = Some(new_child);
        }

        self.node_mut(new_child).next_sibling = Some(reference);
        self.node_mut(reference).prev_sibling = Some(new_child);
    }

    /// Inserts `new_child` after `reference` in the parent's child list.
    ///
    /// # Panics
    ///
    /// Panics if `reference` has no parent or if `new_child` already has a parent.
    #[allow(clippy::expect_used)]
    pub fn insert_after(&mut self, reference: NodeId, new_child: NodeId) {
        match self.node(reference).next_sibling {
            Some(next) => self.insert_before(next, new_child),
            None => {
                let parent = self
                    .node(reference)
                    .parent
                    .expect("reference has no parent");
                self.append_child(parent, new_child);
            }
        }
    }

    /// Prepends a child node as the first child of a parent.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(first) = self.first_child(parent) {
            self.insert_before(first, child);
        } else {
            self.append_child(parent, child);
        }
    }

    /// Detaches a node from its parent and removes it from the tree.
    ///
    /// The node remains allocated in the arena but is unreachable.
    pub fn remove_node(&mut self, id: NodeId) {
        self.detach(id);
    }

    /// Detaches a node from its parent (but does not free it from the arena).
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };

        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }

        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        self.node_mut(id).parent = None;
        self.node_mut(id).prev_sibling = None;
        self.node_mut(id).next_sibling = None;
    }

    /// Returns the total number of nodes in the arena (excluding the
    /// placeholder and the implicit `xmlns:xml` node).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 2
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Depth-first iterator over all descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        // Try to go deeper first
        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        // Try next sibling
        if let Some(sibling) = self.doc.next_sibling(current) {
            self.next = Some(sibling);
            return Some(current);
        }

        // Walk up to find an ancestor with a next sibling
        let mut ancestor = self.doc.parent(current);
        while let Some(anc) = ancestor {
            if anc == self.root {
                self.next = None;
                return Some(current);
            }
            if let Some(sibling) = self.doc.next_sibling(anc) {
                self.next = Some(sibling);
                return Some(current);
            }
            ancestor = self.doc.parent(anc);
        }

        self.next = None;
        Some(current)
    }
}
