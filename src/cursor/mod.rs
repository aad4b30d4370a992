//! The cursor (navigator) over a document.
//!
//! A [`Cursor`] is a movable position indicator, distinct from the tree's
//! own node ids. It presents the arena tree through the XPath node model:
//! coalesced text runs, synthesized namespace positions, document-order
//! comparison. Cursors are cheap values — cloning one duplicates the
//! position, never the tree — and hold no borrow of the document: every
//! operation takes `&Document` (reads and moves) or `&mut Document` (edits),
//! so the borrow checker enforces the exclusive-during-call access model.
//!
//! Cursors are weak: mutating the tree through one cursor can invalidate the
//! position cached by another. Read paths revalidate rather than trust the
//! cached attribute index, and operations on a provably detached node fail
//! with [`Error::Detached`](crate::Error::Detached) instead of producing
//! undefined results.

use crate::axis;
use crate::edit::{self, NodeWriter};
use crate::error::Error;
use crate::ns::{self, NsEntry, Scope};
use crate::order::{self, Order};
use crate::text;
use crate::tree::{DocId, Document, NodeId, NodeKind};

/// The simplified node model a cursor reports, distinct from the tree's
/// physical [`NodeKind`]: CDATA reports as text, Document and
/// DocumentFragment report as the root kind, and namespace positions have a
/// kind of their own even though no physical namespace nodes exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// A document or document-fragment position.
    Root,
    /// An element position.
    Element,
    /// An attribute position (never a namespace declaration).
    Attribute,
    /// A synthesized namespace position.
    Namespace,
    /// A text or CDATA position (calibrated to its run start).
    Text,
    /// A significant-whitespace position.
    SignificantWhitespace,
    /// An ignorable-whitespace position.
    Whitespace,
    /// A processing-instruction position.
    ProcessingInstruction,
    /// A comment position.
    Comment,
}

/// A movable position over one document.
///
/// # Examples
///
/// ```
/// use domnav::{Cursor, Document};
///
/// let mut doc = Document::new();
/// let root = doc.root();
/// let a = doc.create_element(None, "a", None);
/// doc.append_child(root, a);
///
/// let mut cursor = Cursor::document_root(&doc);
/// assert!(cursor.move_to_first_child(&doc));
/// assert!(!cursor.move_to_next(&doc));
/// assert!(cursor.move_to_parent(&doc));
/// ```
#[derive(Debug, Clone)]
pub struct Cursor {
    /// Identity of the owning document.
    doc: DocId,
    /// Current position: a tree node, an attribute node, or (with
    /// `ns_parent` set) a namespace-declaration node.
    node: NodeId,
    /// Cached index of the current attribute in its owner's collection.
    /// A hint only — revalidated before every dependent operation.
    attr_index: usize,
    /// Set when positioned on a namespace node: the element whose
    /// namespace axis produced it (not the declaring ancestor).
    ns_parent: Option<NodeId>,
}

impl Cursor {
    /// Creates a cursor positioned on `node`.
    #[must_use]
    pub fn new(doc: &Document, node: NodeId) -> Self {
        let mut cursor = Self {
            doc: doc.doc_id(),
            node,
            attr_index: 0,
            ns_parent: None,
        };
        cursor.reset_position(doc, node);
        cursor
    }

    /// Creates a cursor positioned on the document root node.
    #[must_use]
    pub fn document_root(doc: &Document) -> Self {
        Self::new(doc, doc.root())
    }

    /// The tree node underlying the current position, after calibration.
    #[must_use]
    pub fn node_id(&self, doc: &Document) -> NodeId {
        self.calibrated(doc)
    }

    /// Repositions on `node`, rebuilding the attribute-index cache and
    /// namespace parent the way a fresh cursor would.
    pub(crate) fn reset_position(&mut self, doc: &Document, node: NodeId) {
        debug_assert_eq!(self.doc, doc.doc_id(), "cursor switched documents");
        self.node = node;
        self.ns_parent = None;
        self.attr_index = 0;
        if doc.kind(node).is_attribute() {
            if let Some(owner) = doc.parent(node) {
                if let Some(index) = doc.attribute_index_of(owner, node) {
                    self.attr_index = index;
                }
                if doc.name_of(node).is_some_and(|n| doc.is_namespace_decl(n)) {
                    self.ns_parent = Some(owner);
                }
            }
        }
    }

    fn same_doc(&self, doc: &Document) -> bool {
        self.doc == doc.doc_id()
    }

    fn ensure_doc(&self, doc: &Document) -> Result<(), Error> {
        if self.same_doc(doc) {
            Ok(())
        } else {
            Err(Error::CrossDocument)
        }
    }

    /// Returns `true` while the cursor sits on a namespace position.
    #[must_use]
    pub fn is_namespace_position(&self) -> bool {
        self.ns_parent.is_some()
    }

    // --- Calibration ---

    /// Repositions the cursor to the first physical node of its coalesced
    /// text run, if it sits on a text-like node with a text-like previous
    /// sibling.
    ///
    /// Read and compare operations behave as if calibrated automatically;
    /// edits targeting text positions calibrate explicitly, because a prior
    /// edit may have created a new text node immediately before this
    /// cursor's node (mutations never re-anchor outstanding cursors).
    pub fn calibrate(&mut self, doc: &Document) {
        let start = self.calibrated(doc);
        if start != self.node {
            self.reset_position(doc, start);
        }
    }

    /// The run-start node this position calibrates to, without persisting.
    fn calibrated(&self, doc: &Document) -> NodeId {
        if self.ns_parent.is_none() && text::is_text(doc, self.node) {
            text::run_start(doc, self.node)
        } else {
            self.node
        }
    }

    // --- Attribute index revalidation ---

    /// Verifies the cached attribute index still addresses the current
    /// attribute node, re-scanning the owner's collection if not.
    ///
    /// Returns the attribute's current index, or `None` when the attribute
    /// has been removed from its owner (a detached position).
    fn validated_attr_index(&self, doc: &Document) -> Option<usize> {
        let owner = doc.parent(self.node)?;
        let attributes = doc.attributes(owner);
        if attributes.get(self.attr_index) == Some(&self.node) {
            return Some(self.attr_index);
        }
        doc.attribute_index_of(owner, self.node)
    }

    // --- Type and name reads ---

    /// The node type at this position, in the simplified view model.
    #[must_use]
    pub fn node_type(&self, doc: &Document) -> NodeType {
        if self.ns_parent.is_some() {
            return NodeType::Namespace;
        }
        match doc.kind(self.calibrated(doc)) {
            NodeKind::Document | NodeKind::DocumentFragment => NodeType::Root,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Attribute { .. } => NodeType::Attribute,
            NodeKind::Text { .. } | NodeKind::CData { .. } => NodeType::Text,
            NodeKind::Whitespace { .. } => NodeType::Whitespace,
            NodeKind::SignificantWhitespace { .. } => NodeType::SignificantWhitespace,
            NodeKind::Comment { .. } => NodeType::Comment,
            NodeKind::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
            // Navigation never parks on entity wrappers or definitions.
            NodeKind::EntityRef { .. } | NodeKind::Entity { .. } => NodeType::Root,
        }
    }

    /// The local name at this position.
    ///
    /// Namespace positions report their declared prefix (empty for the
    /// default declaration); elements and attributes their local name;
    /// processing instructions their target; everything else the empty
    /// string.
    #[must_use]
    pub fn local_name<'d>(&self, doc: &'d Document) -> &'d str {
        let node = self.calibrated(doc);
        match doc.kind(node) {
            NodeKind::Element { name, .. } => doc.resolve(name.local),
            NodeKind::Attribute { name, .. } => {
                if doc.is_namespace_decl(*name) {
                    // xmlns:p declares "p"; the default declaration has no
                    // prefix to report.
                    if name.prefix.is_some() {
                        doc.resolve(name.local)
                    } else {
                        ""
                    }
                } else {
                    doc.resolve(name.local)
                }
            }
            NodeKind::ProcessingInstruction { target, .. } => target,
            _ => "",
        }
    }

    /// The namespace URI at this position. Namespace positions report the
    /// empty string; so do nodes without a namespace.
    #[must_use]
    pub fn namespace_uri<'d>(&self, doc: &'d Document) -> &'d str {
        let node = self.calibrated(doc);
        match doc.kind(node) {
            NodeKind::Attribute { name, .. } if doc.is_namespace_decl(*name) => "",
            NodeKind::Element { name, .. } | NodeKind::Attribute { name, .. } => name
                .namespace
                .map_or("", |ns| doc.resolve(ns)),
            _ => "",
        }
    }

    /// The namespace prefix at this position. Namespace positions report
    /// the empty string.
    #[must_use]
    pub fn prefix<'d>(&self, doc: &'d Document) -> &'d str {
        let node = self.calibrated(doc);
        match doc.kind(node) {
            NodeKind::Attribute { name, .. } if doc.is_namespace_decl(*name) => "",
            NodeKind::Element { name, .. } | NodeKind::Attribute { name, .. } => {
                name.prefix.map_or("", |p| doc.resolve(p))
            }
            _ => "",
        }
    }

    /// The qualified name at this position (`prefix:local`, or the target
    /// for processing instructions). Namespace positions report the
    /// declared prefix.
    #[must_use]
    pub fn name(&self, doc: &Document) -> String {
        let node = self.calibrated(doc);
        match doc.kind(node) {
            NodeKind::Element { name, .. } => doc.qualified_name(*name),
            NodeKind::Attribute { name, .. } => {
                if doc.is_namespace_decl(*name) {
                    if name.prefix.is_some() {
                        doc.resolve(name.local).to_string()
                    } else {
                        String::new()
                    }
                } else {
                    doc.qualified_name(*name)
                }
            }
            NodeKind::ProcessingInstruction { target, .. } => target.clone(),
            _ => String::new(),
        }
    }

    /// The logical value at this position.
    ///
    /// Text-like positions return the concatenated value of their coalesced
    /// run; elements and fragments the concatenated text of their
    /// descendants; a document position the text of its root element;
    /// attribute and namespace positions the attribute value.
    #[must_use]
    pub fn value(&self, doc: &Document) -> String {
        let node = self.calibrated(doc);
        match doc.kind(node) {
            NodeKind::Element { .. } | NodeKind::DocumentFragment => doc.text_content(node),
            NodeKind::Document => doc
                .root_element()
                .map(|e| doc.text_content(e))
                .unwrap_or_default(),
            NodeKind::Text { .. }
            | NodeKind::CData { .. }
            | NodeKind::Whitespace { .. }
            | NodeKind::SignificantWhitespace { .. } => text::run_value(doc, node),
            NodeKind::Attribute { value, .. } => value.clone(),
            NodeKind::Comment { content } => content.clone(),
            NodeKind::ProcessingInstruction { data, .. } => {
                data.clone().unwrap_or_default()
            }
            NodeKind::EntityRef { .. } | NodeKind::Entity { .. } => String::new(),
        }
    }

    /// Returns `len` characters of the logical value starting at character
    /// offset `start`, clamping `len` to the value's end.
    ///
    /// # Errors
    ///
    /// [`Error::ArgumentOutOfRange`] if `start` is past the end of the
    /// value.
    pub fn value_range(
        &self,
        doc: &Document,
        start: usize,
        len: usize,
    ) -> Result<String, Error> {
        let value = self.value(doc);
        let char_count = value.chars().count();
        if start > char_count {
            return Err(Error::ArgumentOutOfRange("start is past the end of the value"));
        }
        Ok(value.chars().skip(start).take(len).collect())
    }

    /// Returns `true` if this element position has children.
    #[must_use]
    pub fn has_children(&self, doc: &Document) -> bool {
        if self.ns_parent.is_some() {
            return false;
        }
        match doc.kind(self.node) {
            NodeKind::Element { .. } => axis::first_child_of(doc, self.node).is_some(),
            NodeKind::Document | NodeKind::DocumentFragment => {
                let mut child = axis::first_child_of(doc, self.node);
                while let Some(c) = child {
                    if axis::is_valid_child(doc, self.node, c) {
                        return true;
                    }
                    child = axis::next_sibling_of(doc, c);
                }
                false
            }
            _ => false,
        }
    }

    /// Returns `true` if this element position carries any regular
    /// attribute (namespace declarations do not count).
    #[must_use]
    pub fn has_attributes(&self, doc: &Document) -> bool {
        doc.attributes(self.node).iter().any(|&attr| {
            doc.name_of(attr)
                .is_some_and(|n| !doc.is_namespace_decl(n))
        })
    }

    /// Returns `true` for an element position with no children.
    #[must_use]
    pub fn is_empty_element(&self, doc: &Document) -> bool {
        doc.kind(self.node).is_element() && doc.first_child(self.node).is_none()
    }

    // --- Position comparison ---

    /// Returns `true` if both cursors sit on the identical position after
    /// calibration: two cursors parked anywhere inside the same text run
    /// compare equal.
    #[must_use]
    pub fn is_same_position(&self, doc: &Document, other: &Cursor) -> bool {
        self.same_doc(doc)
            && self.doc == other.doc
            && self.calibrated(doc) == other.calibrated(doc)
            && self.ns_parent == other.ns_parent
    }

    /// Compares this position against `other` in document order.
    ///
    /// Namespace positions compare [`Order::Same`] only against their exact
    /// duplicate; any other pairing involving a namespace position is
    /// conservatively [`Order::Unrelated`] (namespace order is not
    /// transitive with sibling order). Cross-document comparisons are
    /// always `Unrelated`.
    #[must_use]
    pub fn compare_position(&self, doc: &Document, other: &Cursor) -> Order {
        if !self.same_doc(doc) || self.doc != other.doc {
            return Order::Unrelated;
        }
        let node1 = self.calibrated(doc);
        let node2 = other.calibrated(doc);
        if node1 == node2 && self.ns_parent == other.ns_parent {
            return Order::Same;
        }
        if self.ns_parent.is_some() || other.ns_parent.is_some() {
            return Order::Unrelated;
        }
        order::compare(doc, node1, node2)
    }

    /// Returns `true` if `other`'s position is a descendant of this one
    /// (an attribute counts as a descendant of its owner element).
    #[must_use]
    pub fn is_descendant(&self, doc: &Document, other: &Cursor) -> bool {
        self.same_doc(doc)
            && self.doc == other.doc
            && axis::is_descendant(doc, self.node, other.node)
    }

    // --- Movement ---

    /// Adopts `other`'s position. Fails (without moving) if the cursors
    /// belong to different documents.
    pub fn move_to(&mut self, doc: &Document, other: &Cursor) -> bool {
        if !self.same_doc(doc) || self.doc != other.doc {
            return false;
        }
        self.node = other.node;
        self.attr_index = other.attr_index;
        self.ns_parent = other.ns_parent;
        true
    }

    /// Moves to the element registered under `id`, if any.
    pub fn move_to_id(&mut self, doc: &Document, id: &str) -> bool {
        if !self.same_doc(doc) {
            return false;
        }
        match doc.element_by_id(id) {
            Some(element) => {
                self.node = element;
                self.ns_parent = None;
                true
            }
            None => false,
        }
    }

    /// Moves to the parent position. From an attribute this is the owner
    /// element; from a namespace position it is the element whose axis
    /// produced it, not the declaring ancestor.
    pub fn move_to_parent(&mut self, doc: &Document) -> bool {
        if let Some(ns_parent) = self.ns_parent {
            self.node = ns_parent;
            self.ns_parent = None;
            self.attr_index = 0;
            return true;
        }
        // Attribute parent links already point at the owner element.
        match axis::parent_of(doc, self.node) {
            Some(parent) => {
                self.node = parent;
                true
            }
            None => false,
        }
    }

    /// Moves to the top of the tree this position hangs off (the document
    /// root when attached, the detached subtree's top otherwise).
    pub fn move_to_root(&mut self, doc: &Document) {
        let mut current = self.node;
        if let Some(ns_parent) = self.ns_parent {
            // The namespace position's path to the root runs through the
            // element it was produced for.
            current = ns_parent;
        }
        while let Some(parent) = doc.parent(current) {
            current = parent;
        }
        self.node = current;
        self.ns_parent = None;
        self.attr_index = 0;
    }

    /// Moves to the first child in the simplified model. Element positions
    /// expose every stored child; document and fragment positions only
    /// their valid child kinds.
    pub fn move_to_first_child(&mut self, doc: &Document) -> bool {
        if self.ns_parent.is_some() {
            return false;
        }
        let child = match doc.kind(self.node) {
            NodeKind::Element { .. } => axis::first_child_of(doc, self.node),
            NodeKind::Document | NodeKind::DocumentFragment => {
                let mut child = axis::first_child_of(doc, self.node);
                while let Some(c) = child {
                    if axis::is_valid_child(doc, self.node, c) {
                        break;
                    }
                    child = axis::next_sibling_of(doc, c);
                }
                child
            }
            _ => None,
        };
        match child {
            Some(c) => {
                self.node = c;
                true
            }
            None => false,
        }
    }

    /// Moves to the next sibling position, skipping the remainder of the
    /// current text run and any child kinds the parent does not expose.
    pub fn move_to_next(&mut self, doc: &Document) -> bool {
        let mut sibling = match axis::next_sibling_of(doc, self.node) {
            Some(s) => s,
            None => return false,
        };
        if text::is_text(doc, sibling) && text::is_text(doc, self.node) {
            // The sibling continues this position's logical run: skip to
            // whatever follows the run.
            match axis::next_sibling_of(doc, text::run_end(doc, sibling)) {
                Some(s) => sibling = s,
                None => return false,
            }
        }
        let Some(parent) = axis::parent_of(doc, sibling) else {
            return false;
        };
        while !axis::is_valid_child(doc, parent, sibling) {
            match axis::next_sibling_of(doc, sibling) {
                Some(s) => sibling = s,
                None => return false,
            }
        }
        self.node = sibling;
        true
    }

    /// Moves to the previous sibling position, landing on the start of a
    /// preceding text run rather than inside it.
    pub fn move_to_previous(&mut self, doc: &Document) -> bool {
        let mut sibling = match axis::prev_sibling_of(doc, self.node) {
            Some(s) => s,
            None => return false,
        };
        if text::is_text(doc, sibling) {
            if text::is_text(doc, self.node) {
                // Same logical run: skip to whatever precedes it.
                match axis::prev_sibling_of(doc, text::run_start(doc, sibling)) {
                    Some(s) => sibling = s,
                    None => return false,
                }
            } else {
                sibling = text::run_start(doc, sibling);
            }
        }
        let Some(parent) = axis::parent_of(doc, sibling) else {
            return false;
        };
        while !axis::is_valid_child(doc, parent, sibling) {
            match axis::prev_sibling_of(doc, sibling) {
                Some(s) => sibling = s,
                None => return false,
            }
        }
        self.node = sibling;
        true
    }

    /// Moves to the first valid sibling of this position's parent.
    /// Attribute and namespace positions reject the move.
    pub fn move_to_first(&mut self, doc: &Document) -> bool {
        if doc.kind(self.node).is_attribute() {
            return false;
        }
        let Some(parent) = axis::parent_of(doc, self.node) else {
            return false;
        };
        let mut sibling = match axis::first_child_of(doc, parent) {
            Some(s) => s,
            None => return false,
        };
        while !axis::is_valid_child(doc, parent, sibling) {
            match axis::next_sibling_of(doc, sibling) {
                Some(s) => sibling = s,
                None => return false,
            }
        }
        self.node = sibling;
        true
    }

    /// Moves to the first child element named `(local, namespace)`.
    pub fn move_to_child(&mut self, doc: &Document, local: &str, namespace: Option<&str>) -> bool {
        if doc.kind(self.node).is_attribute() {
            return false;
        }
        let Some(target) = interned_name(doc, local, namespace) else {
            return false;
        };
        let mut child = axis::first_child_of(doc, self.node);
        while let Some(c) = child {
            if element_matches(doc, c, target) {
                self.node = c;
                return true;
            }
            child = axis::next_sibling_of(doc, c);
        }
        false
    }

    /// Moves to the next sibling element named `(local, namespace)`.
    pub fn move_to_next_named(
        &mut self,
        doc: &Document,
        local: &str,
        namespace: Option<&str>,
    ) -> bool {
        let Some(target) = interned_name(doc, local, namespace) else {
            return false;
        };
        let mut sibling = axis::next_sibling_of(doc, self.node);
        while let Some(s) = sibling {
            if element_matches(doc, s, target) {
                self.node = s;
                return true;
            }
            sibling = axis::next_sibling_of(doc, s);
        }
        false
    }

    /// Moves to the next element named `(local, namespace)` in document
    /// order, optionally stopping (exclusive) at `end`'s position.
    ///
    /// For an attribute or namespace `end`, the barrier is the first node
    /// past the owner element's subtree.
    pub fn move_to_following(
        &mut self,
        doc: &Document,
        local: &str,
        namespace: Option<&str>,
        end: Option<&Cursor>,
    ) -> bool {
        if !self.same_doc(doc) {
            return false;
        }
        let past_following = match end {
            Some(end) => {
                if end.doc != self.doc {
                    return false;
                }
                if doc.kind(end.node).is_attribute() {
                    let Some(owner) = doc.parent(end.node) else {
                        return false;
                    };
                    match past_subtree(doc, owner) {
                        Some(past) => Some(past),
                        None => return false,
                    }
                } else {
                    Some(end.node)
                }
            }
            None => None,
        };
        let Some(target) = interned_name(doc, local, namespace) else {
            return false;
        };

        let mut following = self.node;
        if doc.kind(following).is_attribute() {
            match doc.parent(following) {
                Some(owner) => following = owner,
                None => return false,
            }
        }
        loop {
            // Preorder step: first child, else next sibling, else climb.
            if let Some(child) = doc.first_child(following) {
                following = child;
            } else {
                loop {
                    if let Some(sibling) = doc.next_sibling(following) {
                        following = sibling;
                        break;
                    }
                    match doc.parent(following) {
                        Some(parent) => following = parent,
                        None => return false,
                    }
                }
            }
            if Some(following) == past_following {
                return false;
            }
            if element_matches(doc, following, target) {
                self.node = following;
                self.ns_parent = None;
                return true;
            }
        }
    }

    // --- Attribute axis ---

    /// Returns the value of the named regular attribute on this element
    /// position.
    #[must_use]
    pub fn get_attribute<'d>(
        &self,
        doc: &'d Document,
        local: &str,
        namespace: Option<&str>,
    ) -> Option<&'d str> {
        let local = doc.symbol(local)?;
        let namespace = match namespace {
            Some(uri) => Some(doc.symbol(uri)?),
            None => None,
        };
        let (_, attr) = doc.find_attribute(self.node, local, namespace)?;
        if doc.name_of(attr).is_some_and(|n| doc.is_namespace_decl(n)) {
            return None;
        }
        doc.node_text(attr)
    }

    /// Moves to the named attribute of this element position. Namespace
    /// declarations are not addressable this way.
    pub fn move_to_attribute(
        &mut self,
        doc: &Document,
        local: &str,
        namespace: Option<&str>,
    ) -> bool {
        let Some(local) = doc.symbol(local) else {
            return false;
        };
        let namespace = match namespace {
            Some(uri) => match doc.symbol(uri) {
                Some(sym) => Some(sym),
                None => return false,
            },
            None => None,
        };
        let Some((index, attr)) = doc.find_attribute(self.node, local, namespace) else {
            return false;
        };
        if doc.name_of(attr).is_some_and(|n| doc.is_namespace_decl(n)) {
            return false;
        }
        self.node = attr;
        self.attr_index = index;
        true
    }

    /// Moves to the first regular attribute of this element position.
    pub fn move_to_first_attribute(&mut self, doc: &Document) -> bool {
        let attributes = doc.attributes(self.node);
        for (i, &attr) in attributes.iter().enumerate() {
            if doc.name_of(attr).is_some_and(|n| !doc.is_namespace_decl(n)) {
                self.node = attr;
                self.attr_index = i;
                return true;
            }
        }
        false
    }

    /// Moves to the next regular attribute in the owner's collection,
    /// revalidating the cached index first.
    pub fn move_to_next_attribute(&mut self, doc: &Document) -> bool {
        if self.ns_parent.is_some() || !doc.kind(self.node).is_attribute() {
            return false;
        }
        let Some(index) = self.validated_attr_index(doc) else {
            return false;
        };
        let Some(owner) = doc.parent(self.node) else {
            return false;
        };
        let attributes = doc.attributes(owner);
        for (i, &attr) in attributes.iter().enumerate().skip(index + 1) {
            if doc.name_of(attr).is_some_and(|n| !doc.is_namespace_decl(n)) {
                self.node = attr;
                self.attr_index = i;
                return true;
            }
        }
        false
    }

    // --- Namespace axis ---

    /// Returns the URI declared for `prefix` at this position, walking the
    /// ancestor chain; the empty prefix looks up the default namespace.
    /// The fixed `xml` and `xmlns` bindings always resolve.
    #[must_use]
    pub fn lookup_namespace<'d>(&self, doc: &'d Document, prefix: &str) -> Option<&'d str> {
        ns::lookup(doc, self.node, prefix)
    }

    /// Moves to the namespace position for `prefix` visible at this element
    /// position. `"xmlns"` itself is never addressable; `"xml"` lands on
    /// the implicit binding when no explicit declaration exists.
    pub fn move_to_namespace(&mut self, doc: &Document, prefix: &str) -> bool {
        if prefix == "xmlns" {
            return false;
        }
        if !doc.kind(self.node).is_element() {
            return false;
        }
        if let Some((owner, index)) = ns::find_decl(doc, self.node, prefix) {
            let attr = doc.attributes(owner)[index];
            self.ns_parent = Some(self.node);
            self.node = attr;
            self.attr_index = index;
            return true;
        }
        if prefix == "xml" {
            self.ns_parent = Some(self.node);
            self.node = doc.namespace_xml_node();
            self.attr_index = 0;
            return true;
        }
        false
    }

    /// Moves to the first namespace position of this element under `scope`.
    pub fn move_to_first_namespace(&mut self, doc: &Document, scope: Scope) -> bool {
        let Some(entry) = ns::first_namespace(doc, self.node, scope) else {
            return false;
        };
        let element = self.node;
        self.apply_ns_entry(doc, entry, element);
        true
    }

    /// Moves to the next namespace position under `scope`, continuing the
    /// enumeration started with
    /// [`move_to_first_namespace`](Cursor::move_to_first_namespace).
    pub fn move_to_next_namespace(&mut self, doc: &Document, scope: Scope) -> bool {
        let Some(ns_parent) = self.ns_parent else {
            return false;
        };
        let current = if self.node == doc.namespace_xml_node() {
            NsEntry::XmlVirtual
        } else {
            // Revalidate the cached index before advancing from it.
            let Some(index) = self.validated_attr_index(doc) else {
                return false;
            };
            let Some(owner) = doc.parent(self.node) else {
                return false;
            };
            NsEntry::Decl { owner, index }
        };
        let Some(next) = ns::next_namespace(doc, current, ns_parent, scope) else {
            return false;
        };
        self.apply_ns_entry(doc, next, ns_parent);
        true
    }

    fn apply_ns_entry(&mut self, doc: &Document, entry: NsEntry, ns_parent: NodeId) {
        match entry {
            NsEntry::Decl { owner, index } => {
                self.node = doc.attributes(owner)[index];
                self.attr_index = index;
            }
            NsEntry::XmlVirtual => {
                self.node = doc.namespace_xml_node();
                self.attr_index = 0;
            }
        }
        self.ns_parent = Some(ns_parent);
    }

    // --- Descendant element iteration ---

    /// Iterates over descendant elements matching `(local, namespace)`;
    /// `local` of `None` matches any local name. With `match_self` the
    /// start position itself is tested first. Attribute and namespace
    /// positions yield nothing.
    pub fn descendant_elements<'d>(
        &self,
        doc: &'d Document,
        local: Option<&str>,
        namespace: Option<&str>,
        match_self: bool,
    ) -> DescendantElements<'d> {
        // A name that was never interned cannot match any element.
        let local_sym = local.map(|l| doc.symbol(l));
        let namespace_sym = namespace.map(|n| doc.symbol(n));
        let dead = matches!(local_sym, Some(None))
            || matches!(namespace_sym, Some(None))
            || doc.kind(self.node).is_attribute();
        DescendantElements {
            doc,
            doc_id: self.doc,
            root: self.node,
            next: if dead {
                None
            } else if match_self {
                Some(self.node)
            } else {
                doc.first_child(self.node)
            },
            local: local_sym.flatten(),
            namespace: namespace_sym.flatten(),
            dead,
        }
    }

    // --- Edits ---

    /// Replaces the logical value at this position.
    ///
    /// Text positions calibrate and collapse their run to a single node;
    /// element positions replace their children with one text node;
    /// attribute, comment, and processing-instruction positions replace
    /// their payload.
    pub fn set_value(&mut self, doc: &mut Document, value: &str) -> Result<(), Error> {
        self.ensure_doc(doc)?;
        self.calibrate(doc);
        edit::set_value(doc, self, value)
    }

    /// Opens a writer that prepends streamed content as the first children
    /// of this position. Valid on element, document, and fragment
    /// positions.
    pub fn prepend_child<'d>(&self, doc: &'d mut Document) -> Result<NodeWriter<'d>, Error> {
        self.ensure_doc(doc)?;
        edit::open_child_writer(doc, self.node, true)
    }

    /// Opens a writer that appends streamed content as the last children of
    /// this position. Valid on element, document, and fragment positions.
    pub fn append_child<'d>(&self, doc: &'d mut Document) -> Result<NodeWriter<'d>, Error> {
        self.ensure_doc(doc)?;
        edit::open_child_writer(doc, self.node, false)
    }

    /// Opens a writer that inserts streamed content before this position
    /// (before its whole text run for a text position).
    pub fn insert_before<'d>(&mut self, doc: &'d mut Document) -> Result<NodeWriter<'d>, Error> {
        self.ensure_doc(doc)?;
        self.calibrate(doc);
        edit::open_sibling_writer(doc, self.node, edit::SiblingSide::Before)
    }

    /// Opens a writer that inserts streamed content after this position
    /// (after its whole text run for a text position).
    pub fn insert_after<'d>(&self, doc: &'d mut Document) -> Result<NodeWriter<'d>, Error> {
        self.ensure_doc(doc)?;
        let anchor = if text::is_text(doc, self.node) {
            text::run_end(doc, self.node)
        } else {
            self.node
        };
        edit::open_sibling_writer(doc, anchor, edit::SiblingSide::After)
    }

    /// Opens a writer that appends streamed attributes to this element
    /// position.
    pub fn append_attributes<'d>(&self, doc: &'d mut Document) -> Result<NodeWriter<'d>, Error> {
        self.ensure_doc(doc)?;
        edit::open_attribute_writer(doc, self.node)
    }

    /// Opens a writer whose streamed content replaces the sibling range
    /// from this position through `end` (inclusive; text endpoints extend
    /// to their full runs). `end` must be this node or a true following
    /// sibling.
    pub fn replace_range<'d>(
        &mut self,
        doc: &'d mut Document,
        end: &Cursor,
    ) -> Result<NodeWriter<'d>, Error> {
        self.ensure_doc(doc)?;
        if end.doc != self.doc {
            return Err(Error::CrossDocument);
        }
        self.calibrate(doc);
        let end_node = end.calibrated(doc);
        edit::open_replace_writer(doc, self.node, end_node)
    }

    /// Deletes the sibling range from this position through `end`
    /// (inclusive; text endpoints extend to their full runs), then
    /// repositions this cursor on the nearest surviving ancestor.
    ///
    /// The whole range is validated before the first node is unlinked: a
    /// read-only member anywhere in the range fails the entire operation.
    pub fn delete_range(&mut self, doc: &mut Document, end: &Cursor) -> Result<(), Error> {
        self.ensure_doc(doc)?;
        if end.doc != self.doc {
            return Err(Error::CrossDocument);
        }
        self.calibrate(doc);
        let end_node = end.calibrated(doc);
        let parent = edit::delete_range(doc, self, end_node)?;
        self.reset_position(doc, parent);
        Ok(())
    }

    /// Deletes the node at this position (the whole run for a text
    /// position; the attribute for an attribute position), then
    /// repositions this cursor on the nearest surviving ancestor.
    pub fn delete_self(&mut self, doc: &mut Document) -> Result<(), Error> {
        self.ensure_doc(doc)?;
        self.calibrate(doc);
        let parent = edit::delete_self(doc, self)?;
        self.reset_position(doc, parent);
        Ok(())
    }

    // Internal accessors for the mutation engine.
    pub(crate) fn raw_node(&self) -> NodeId {
        self.node
    }

    pub(crate) fn raw_ns_parent(&self) -> Option<NodeId> {
        self.ns_parent
    }

    pub(crate) fn revalidated_attr_index(&self, doc: &Document) -> Option<usize> {
        self.validated_attr_index(doc)
    }
}

/// A resolved (local, namespace) pair for name matching.
#[derive(Clone, Copy)]
struct TargetName {
    local: crate::util::dict::SymbolId,
    namespace: Option<crate::util::dict::SymbolId>,
}

/// Resolves a name query against the dictionary, or `None` when a part was
/// never interned (and therefore cannot match).
fn interned_name(doc: &Document, local: &str, namespace: Option<&str>) -> Option<TargetName> {
    let local = doc.symbol(local)?;
    let namespace = match namespace {
        Some(uri) => Some(doc.symbol(uri)?),
        None => None,
    };
    Some(TargetName { local, namespace })
}

fn element_matches(doc: &Document, node: NodeId, target: TargetName) -> bool {
    match doc.kind(node) {
        NodeKind::Element { name, .. } => {
            name.local == target.local && name.namespace == target.namespace
        }
        _ => false,
    }
}

/// First node after `node`'s subtree in document order.
fn past_subtree(doc: &Document, node: NodeId) -> Option<NodeId> {
    let mut current = node;
    loop {
        if let Some(sibling) = doc.next_sibling(current) {
            return Some(sibling);
        }
        current = doc.parent(current)?;
    }
}

/// Iterator over descendant elements matching a name query.
///
/// Yields cursors positioned on each match, in document order.
pub struct DescendantElements<'d> {
    doc: &'d Document,
    doc_id: DocId,
    root: NodeId,
    next: Option<NodeId>,
    local: Option<crate::util::dict::SymbolId>,
    namespace: Option<crate::util::dict::SymbolId>,
    dead: bool,
}

impl DescendantElements<'_> {
    fn matches(&self, node: NodeId) -> bool {
        match self.doc.kind(node) {
            NodeKind::Element { name, .. } => {
                self.local.is_none_or(|l| name.local == l) && name.namespace == self.namespace
            }
            _ => false,
        }
    }

    /// Preorder successor within the subtree rooted at `self.root`.
    fn advance(&self, node: NodeId) -> Option<NodeId> {
        if let Some(child) = self.doc.first_child(node) {
            return Some(child);
        }
        let mut current = node;
        loop {
            if current == self.root {
                return None;
            }
            if let Some(sibling) = self.doc.next_sibling(current) {
                return Some(sibling);
            }
            current = self.doc.parent(current)?;
        }
    }
}

impl Iterator for DescendantElements<'_> {
    type Item = Cursor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.dead {
            return None;
        }
        let mut current = self.next?;
        loop {
            let is_match = self.matches(current);
            let successor = self.advance(current);
            if is_match {
                self.next = successor;
                return Some(Cursor {
                    doc: self.doc_id,
                    node: current,
                    attr_index: 0,
                    ns_parent: None,
                });
            }
            current = successor?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::XML_URI;

    /// `<a id="1" class="c"><!--x-->t1<b/>t2 t3</a>` where t2/t3 are
    /// adjacent text nodes forming one logical run.
    struct Fixture {
        doc: Document,
        a: NodeId,
        comment: NodeId,
        t1: NodeId,
        b: NodeId,
        t2: NodeId,
        t3: NodeId,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element(None, "a", None);
        doc.append_child(root, a);
        let id = doc.create_attribute(None, "id", None, "1");
        let class = doc.create_attribute(None, "class", None, "c");
        doc.append_attribute(a, id);
        doc.append_attribute(a, class);
        let comment = doc.create_comment("x");
        let t1 = doc.create_text("t1");
        let b = doc.create_element(None, "b", None);
        let t2 = doc.create_text("t2 ");
        let t3 = doc.create_cdata("t3");
        doc.append_child(a, comment);
        doc.append_child(a, t1);
        doc.append_child(a, b);
        doc.append_child(a, t2);
        doc.append_child(a, t3);
        Fixture {
            doc,
            a,
            comment,
            t1,
            b,
            t2,
            t3,
        }
    }

    #[test]
    fn test_document_root_type() {
        let f = fixture();
        let cursor = Cursor::document_root(&f.doc);
        assert_eq!(cursor.node_type(&f.doc), NodeType::Root);
    }

    #[test]
    fn test_move_to_first_child_and_back() {
        let f = fixture();
        let mut cursor = Cursor::document_root(&f.doc);
        assert!(cursor.move_to_first_child(&f.doc));
        assert_eq!(cursor.local_name(&f.doc), "a");
        assert!(cursor.move_to_parent(&f.doc));
        assert_eq!(cursor.node_type(&f.doc), NodeType::Root);
        assert!(!cursor.move_to_parent(&f.doc));
    }

    #[test]
    fn test_sibling_walk_coalesces_text() {
        let f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.comment);
        assert!(cursor.move_to_next(&f.doc));
        assert_eq!(cursor.node_id(&f.doc), f.t1);
        assert!(cursor.move_to_next(&f.doc));
        assert_eq!(cursor.node_id(&f.doc), f.b);
        assert!(cursor.move_to_next(&f.doc));
        // Lands on the run start, and the run is one logical position.
        assert_eq!(cursor.node_id(&f.doc), f.t2);
        assert!(!cursor.move_to_next(&f.doc));
    }

    #[test]
    fn test_move_to_previous_lands_on_run_start() {
        let f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.t3);
        // t3 is inside the t2-t3 run; previous position is b.
        assert!(cursor.move_to_previous(&f.doc));
        assert_eq!(cursor.node_id(&f.doc), f.b);
        assert!(cursor.move_to_previous(&f.doc));
        assert_eq!(cursor.node_id(&f.doc), f.t1);
    }

    #[test]
    fn test_cursors_in_same_run_are_same_position() {
        let f = fixture();
        let on_start = Cursor::new(&f.doc, f.t2);
        let on_tail = Cursor::new(&f.doc, f.t3);
        assert!(on_start.is_same_position(&f.doc, &on_tail));
        assert_eq!(
            on_start.compare_position(&f.doc, &on_tail),
            Order::Same
        );
    }

    #[test]
    fn test_calibrate_persists_run_start() {
        let f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.t3);
        cursor.calibrate(&f.doc);
        assert_eq!(cursor.raw_node(), f.t2);
    }

    #[test]
    fn test_run_value_reads_whole_run() {
        let f = fixture();
        let cursor = Cursor::new(&f.doc, f.t3);
        assert_eq!(cursor.value(&f.doc), "t2 t3");
        assert_eq!(cursor.node_type(&f.doc), NodeType::Text);
    }

    #[test]
    fn test_value_range() {
        let f = fixture();
        let cursor = Cursor::new(&f.doc, f.t2);
        assert_eq!(cursor.value_range(&f.doc, 0, 2).unwrap(), "t2");
        assert_eq!(cursor.value_range(&f.doc, 3, 100).unwrap(), "t3");
        assert!(matches!(
            cursor.value_range(&f.doc, 99, 1),
            Err(Error::ArgumentOutOfRange(_))
        ));
    }

    #[test]
    fn test_element_and_document_value() {
        let f = fixture();
        let on_a = Cursor::new(&f.doc, f.a);
        assert_eq!(on_a.value(&f.doc), "t1t2 t3");
        let on_root = Cursor::document_root(&f.doc);
        assert_eq!(on_root.value(&f.doc), "t1t2 t3");
    }

    #[test]
    fn test_attribute_axis() {
        let f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.a);
        assert!(cursor.has_attributes(&f.doc));
        assert!(cursor.move_to_first_attribute(&f.doc));
        assert_eq!(cursor.local_name(&f.doc), "id");
        assert_eq!(cursor.node_type(&f.doc), NodeType::Attribute);
        assert!(cursor.move_to_next_attribute(&f.doc));
        assert_eq!(cursor.local_name(&f.doc), "class");
        assert_eq!(cursor.value(&f.doc), "c");
        assert!(!cursor.move_to_next_attribute(&f.doc));
    }

    #[test]
    fn test_move_to_attribute_by_name() {
        let f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.a);
        assert!(cursor.move_to_attribute(&f.doc, "class", None));
        assert_eq!(cursor.value(&f.doc), "c");
        assert!(cursor.move_to_parent(&f.doc));
        assert_eq!(cursor.node_id(&f.doc), f.a);
        assert!(!cursor.move_to_attribute(&f.doc, "missing", None));
        assert_eq!(cursor.get_attribute(&f.doc, "id", None), Some("1"));
    }

    #[test]
    fn test_stale_attribute_index_is_revalidated() {
        let mut f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.a);
        assert!(cursor.move_to_attribute(&f.doc, "class", None));

        // Another actor removes the attribute before this one; the cached
        // index now points past the shifted collection, and the re-scan
        // finds "class" at its new index.
        let id_attr = f.doc.attributes(f.a)[0];
        f.doc.remove_attribute_at(f.a, 0);
        assert!(!cursor.move_to_next_attribute(&f.doc));
        assert_eq!(cursor.local_name(&f.doc), "class");

        // Append another attribute after it; the revalidated walk reaches
        // the new entry.
        f.doc.append_attribute(f.a, id_attr);
        assert!(cursor.move_to_next_attribute(&f.doc));
        assert_eq!(cursor.local_name(&f.doc), "id");
    }

    #[test]
    fn test_detached_attribute_walk_fails_cleanly() {
        let mut f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.a);
        assert!(cursor.move_to_attribute(&f.doc, "id", None));
        f.doc.remove_attribute_at(f.a, 0);
        assert!(!cursor.move_to_next_attribute(&f.doc));
    }

    #[test]
    fn test_move_to_first_rejects_attribute_position() {
        let f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.a);
        assert!(cursor.move_to_attribute(&f.doc, "id", None));
        assert!(!cursor.move_to_first(&f.doc));
    }

    #[test]
    fn test_move_to_first_lands_on_first_valid_sibling() {
        let f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.t3);
        assert!(cursor.move_to_first(&f.doc));
        assert_eq!(cursor.node_id(&f.doc), f.comment);
    }

    #[test]
    fn test_document_children_filter_whitespace() {
        let mut doc = Document::new();
        let root = doc.root();
        let ws = doc.create_whitespace("\n");
        let elem = doc.create_element(None, "e", None);
        doc.append_child(root, ws);
        doc.append_child(root, elem);

        let mut cursor = Cursor::document_root(&doc);
        assert!(cursor.move_to_first_child(&doc));
        // The whitespace node is not a valid document child; navigation
        // starts at the element.
        assert_eq!(cursor.node_id(&doc), elem);
        assert!(!cursor.move_to_next(&doc));
    }

    #[test]
    fn test_compare_position_attributes_before_children() {
        let f = fixture();
        let mut on_attr = Cursor::new(&f.doc, f.a);
        assert!(on_attr.move_to_attribute(&f.doc, "class", None));
        let on_child = Cursor::new(&f.doc, f.t1);
        assert_eq!(on_attr.compare_position(&f.doc, &on_child), Order::Before);
        assert_eq!(on_child.compare_position(&f.doc, &on_attr), Order::After);
    }

    #[test]
    fn test_compare_position_reflexive_on_clone() {
        let f = fixture();
        let cursor = Cursor::new(&f.doc, f.b);
        let clone = cursor.clone();
        assert_eq!(cursor.compare_position(&f.doc, &clone), Order::Same);
        assert!(cursor.is_same_position(&f.doc, &clone));
    }

    #[test]
    fn test_cross_document_is_rejected() {
        let f = fixture();
        let other_doc = Document::new();
        let foreign = Cursor::document_root(&other_doc);
        let mut local = Cursor::document_root(&f.doc);

        assert!(!local.move_to(&f.doc, &foreign));
        assert!(!local.is_same_position(&f.doc, &foreign));
        assert_eq!(
            local.compare_position(&f.doc, &foreign),
            Order::Unrelated
        );
    }

    #[test]
    fn test_move_to_adopts_position() {
        let f = fixture();
        let on_b = Cursor::new(&f.doc, f.b);
        let mut cursor = Cursor::document_root(&f.doc);
        assert!(cursor.move_to(&f.doc, &on_b));
        assert!(cursor.is_same_position(&f.doc, &on_b));
    }

    #[test]
    fn test_move_to_id() {
        let mut f = fixture();
        f.doc.set_id("main", f.b);
        let mut cursor = Cursor::document_root(&f.doc);
        assert!(cursor.move_to_id(&f.doc, "main"));
        assert_eq!(cursor.node_id(&f.doc), f.b);
        assert!(!cursor.move_to_id(&f.doc, "missing"));
    }

    #[test]
    fn test_move_to_root_from_namespace_position() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(None, "e", None);
        doc.append_child(root, e);

        let mut cursor = Cursor::new(&doc, e);
        assert!(cursor.move_to_namespace(&doc, "xml"));
        cursor.move_to_root(&doc);
        assert_eq!(cursor.node_id(&doc), root);
    }

    #[test]
    fn test_namespace_lookup_and_move() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element(None, "a", None);
        let b = doc.create_element(None, "b", None);
        doc.append_child(root, a);
        doc.append_child(a, b);
        let decl = doc.create_namespace_decl(Some("p"), "urn:1");
        doc.append_attribute(a, decl);

        let mut cursor = Cursor::new(&doc, b);
        assert_eq!(cursor.lookup_namespace(&doc, "p"), Some("urn:1"));

        // The namespace position's parent is b (the start element), not
        // the declaring ancestor a.
        assert!(cursor.move_to_namespace(&doc, "p"));
        assert_eq!(cursor.node_type(&doc), NodeType::Namespace);
        assert_eq!(cursor.local_name(&doc), "p");
        assert_eq!(cursor.value(&doc), "urn:1");
        assert!(cursor.move_to_parent(&doc));
        assert_eq!(cursor.node_id(&doc), b);
    }

    #[test]
    fn test_move_to_namespace_xmlns_is_unaddressable() {
        let f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.a);
        assert!(!cursor.move_to_namespace(&f.doc, "xmlns"));
    }

    #[test]
    fn test_namespace_axis_all_yields_xml_last() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element(None, "a", None);
        doc.append_child(root, a);
        let decl = doc.create_namespace_decl(Some("p"), "urn:1");
        doc.append_attribute(a, decl);

        let mut cursor = Cursor::new(&doc, a);
        assert!(cursor.move_to_first_namespace(&doc, Scope::All));
        assert_eq!(cursor.local_name(&doc), "p");
        assert_eq!(cursor.value(&doc), "urn:1");
        assert!(cursor.move_to_next_namespace(&doc, Scope::All));
        assert_eq!(cursor.local_name(&doc), "xml");
        assert_eq!(cursor.value(&doc), XML_URI);
        assert!(!cursor.move_to_next_namespace(&doc, Scope::All));
    }

    #[test]
    fn test_namespace_axis_shadowing() {
        // <a xmlns:p="urn:1"><b xmlns:p="urn:2"/></a> from b.
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element(None, "a", None);
        let b = doc.create_element(None, "b", None);
        doc.append_child(root, a);
        doc.append_child(a, b);
        let outer = doc.create_namespace_decl(Some("p"), "urn:1");
        doc.append_attribute(a, outer);
        let inner = doc.create_namespace_decl(Some("p"), "urn:2");
        doc.append_attribute(b, inner);

        let mut cursor = Cursor::new(&doc, b);
        assert_eq!(cursor.lookup_namespace(&doc, "p"), Some("urn:2"));
        assert!(cursor.move_to_first_namespace(&doc, Scope::ExcludeXml));
        assert_eq!(cursor.value(&doc), "urn:2");
        // The outer urn:1 declaration is shadowed and never yielded.
        assert!(!cursor.move_to_next_namespace(&doc, Scope::ExcludeXml));
    }

    #[test]
    fn test_default_namespace_position_reports_empty_name() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(None, "e", None);
        doc.append_child(root, e);
        let decl = doc.create_namespace_decl(None, "urn:default");
        doc.append_attribute(e, decl);

        let mut cursor = Cursor::new(&doc, e);
        assert!(cursor.move_to_namespace(&doc, ""));
        assert_eq!(cursor.local_name(&doc), "");
        assert_eq!(cursor.name(&doc), "");
        assert_eq!(cursor.namespace_uri(&doc), "");
        assert_eq!(cursor.value(&doc), "urn:default");
    }

    #[test]
    fn test_namespace_position_compares_unrelated() {
        let f = fixture();
        let mut on_ns = Cursor::new(&f.doc, f.a);
        assert!(on_ns.move_to_namespace(&f.doc, "xml"));
        let on_b = Cursor::new(&f.doc, f.b);
        assert_eq!(on_ns.compare_position(&f.doc, &on_b), Order::Unrelated);
        let clone = on_ns.clone();
        assert_eq!(on_ns.compare_position(&f.doc, &clone), Order::Same);
    }

    #[test]
    fn test_move_to_child_and_next_named() {
        let mut doc = Document::new();
        let root = doc.root();
        let list = doc.create_element(None, "list", None);
        doc.append_child(root, list);
        let item1 = doc.create_element(None, "item", None);
        let sep = doc.create_comment("sep");
        let item2 = doc.create_element(None, "item", None);
        doc.append_child(list, item1);
        doc.append_child(list, sep);
        doc.append_child(list, item2);

        let mut cursor = Cursor::new(&doc, list);
        assert!(cursor.move_to_child(&doc, "item", None));
        assert_eq!(cursor.node_id(&doc), item1);
        assert!(cursor.move_to_next_named(&doc, "item", None));
        assert_eq!(cursor.node_id(&doc), item2);
        assert!(!cursor.move_to_next_named(&doc, "item", None));
    }

    #[test]
    fn test_move_to_child_unknown_name_fails_fast() {
        let f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.a);
        // "never-interned" was never interned in this document, so the
        // match short-circuits without scanning.
        assert!(!cursor.move_to_child(&f.doc, "never-interned", None));
    }

    #[test]
    fn test_move_to_following() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element(None, "a", None);
        doc.append_child(root, a);
        let nested = doc.create_element(None, "target", None);
        let sibling = doc.create_element(None, "target", None);
        doc.append_child(a, nested);
        doc.append_child(root, sibling);

        let mut cursor = Cursor::new(&doc, a);
        assert!(cursor.move_to_following(&doc, "target", None, None));
        assert_eq!(cursor.node_id(&doc), nested);
        assert!(cursor.move_to_following(&doc, "target", None, None));
        assert_eq!(cursor.node_id(&doc), sibling);
        assert!(!cursor.move_to_following(&doc, "target", None, None));
    }

    #[test]
    fn test_move_to_following_respects_end_barrier() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element(None, "a", None);
        let barrier = doc.create_element(None, "stop", None);
        let target = doc.create_element(None, "target", None);
        doc.append_child(root, a);
        doc.append_child(root, barrier);
        doc.append_child(root, target);

        let end = Cursor::new(&doc, barrier);
        let mut cursor = Cursor::new(&doc, a);
        assert!(!cursor.move_to_following(&doc, "target", None, Some(&end)));
        // Cursor did not move.
        assert_eq!(cursor.node_id(&doc), a);
    }

    #[test]
    fn test_descendant_elements() {
        let mut doc = Document::new();
        let root = doc.root();
        let top = doc.create_element(None, "item", None);
        doc.append_child(root, top);
        let nested1 = doc.create_element(None, "item", None);
        let other = doc.create_element(None, "other", None);
        doc.append_child(top, nested1);
        doc.append_child(top, other);
        let nested2 = doc.create_element(None, "item", None);
        doc.append_child(other, nested2);

        let cursor = Cursor::new(&doc, top);
        let found: Vec<NodeId> = cursor
            .descendant_elements(&doc, Some("item"), None, false)
            .map(|c| c.node_id(&doc))
            .collect();
        assert_eq!(found, vec![nested1, nested2]);

        let with_self: Vec<NodeId> = cursor
            .descendant_elements(&doc, Some("item"), None, true)
            .map(|c| c.node_id(&doc))
            .collect();
        assert_eq!(with_self, vec![top, nested1, nested2]);

        // Any-name query.
        let all: Vec<NodeId> = cursor
            .descendant_elements(&doc, None, None, false)
            .map(|c| c.node_id(&doc))
            .collect();
        assert_eq!(all, vec![nested1, other, nested2]);
    }

    #[test]
    fn test_is_descendant() {
        let f = fixture();
        let on_a = Cursor::new(&f.doc, f.a);
        let on_b = Cursor::new(&f.doc, f.b);
        assert!(on_a.is_descendant(&f.doc, &on_b));
        assert!(!on_b.is_descendant(&f.doc, &on_a));
    }

    #[test]
    fn test_has_children_and_empty_element() {
        let f = fixture();
        let on_a = Cursor::new(&f.doc, f.a);
        let on_b = Cursor::new(&f.doc, f.b);
        assert!(on_a.has_children(&f.doc));
        assert!(!on_b.has_children(&f.doc));
        assert!(on_b.is_empty_element(&f.doc));
        assert!(!on_a.is_empty_element(&f.doc));
    }

    #[test]
    fn test_prefixed_element_reads() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(Some("svg"), "rect", Some("http://www.w3.org/2000/svg"));
        doc.append_child(root, e);

        let cursor = Cursor::new(&doc, e);
        assert_eq!(cursor.local_name(&doc), "rect");
        assert_eq!(cursor.prefix(&doc), "svg");
        assert_eq!(cursor.name(&doc), "svg:rect");
        assert_eq!(cursor.namespace_uri(&doc), "http://www.w3.org/2000/svg");
    }

    #[test]
    fn test_comment_and_pi_reads() {
        let mut doc = Document::new();
        let root = doc.root();
        let comment = doc.create_comment("note");
        let pi = doc.create_pi("style", Some("href=x"));
        doc.append_child(root, comment);
        doc.append_child(root, pi);

        let on_comment = Cursor::new(&doc, comment);
        assert_eq!(on_comment.node_type(&doc), NodeType::Comment);
        assert_eq!(on_comment.value(&doc), "note");
        assert_eq!(on_comment.name(&doc), "");

        let on_pi = Cursor::new(&doc, pi);
        assert_eq!(on_pi.node_type(&doc), NodeType::ProcessingInstruction);
        assert_eq!(on_pi.local_name(&doc), "style");
        assert_eq!(on_pi.value(&doc), "href=x");
    }
}
