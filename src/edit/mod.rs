//! The mutation engine.
//!
//! High-level edit requests (prepend/append child, insert/replace/delete
//! sibling ranges, attribute appends, value replacement) are translated into
//! sequences of primitive tree operations. Content-bearing edits go through
//! a push-style [`NodeWriter`]: preconditions are validated when the writer
//! opens, streamed content accumulates under a detached staging fragment in
//! the same arena, and `finish` splices it in atomically. An error mid-
//! stream — or dropping the writer without finishing — leaves the staged
//! fragment detached and discarded; the tree is never partially spliced.
//!
//! The writer captures the ambient namespace scope at the edit point, so
//! qualified names streamed with a prefix but no declaration of their own
//! resolve against the surrounding document context. Namespace resolution
//! for an element is deferred to its `end_element`, which is what lets
//! `<p:item xmlns:p="…">` stream naturally as a start tag followed by its
//! declaration attribute.
//!
//! Range deletes are immediate (no content streams in): the whole
//! contiguous range is validated — including a read-only check on every
//! member — before the first node is unlinked.

use crate::axis;
use crate::cursor::Cursor;
use crate::error::Error;
use crate::ns;
use crate::text;
use crate::tree::{Document, NodeId, NodeKind};
use crate::util::qname::split_qname;

/// Which side of the anchor a sibling insertion lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SiblingSide {
    Before,
    After,
}

/// The splice a writer performs when it finishes.
#[derive(Debug, Clone, Copy)]
enum WriterOp {
    /// Streamed nodes become the first children of `parent`.
    PrependChild { parent: NodeId },
    /// Streamed nodes become the last children of `parent`.
    AppendChild { parent: NodeId },
    /// Streamed nodes are inserted immediately before `anchor`.
    InsertBefore { anchor: NodeId },
    /// Streamed nodes are inserted immediately after `anchor`.
    InsertAfter { anchor: NodeId },
    /// Streamed attributes are appended to `element`'s collection.
    AppendAttributes { element: NodeId },
    /// Streamed nodes replace the sibling range `[start, end]`.
    ReplaceRange { start: NodeId, end: NodeId },
}

// --- Direct operations ---

/// Replaces the logical value at the cursor's (already calibrated)
/// position. See `Cursor::set_value` for the surface contract.
pub(crate) fn set_value(doc: &mut Document, cursor: &Cursor, value: &str) -> Result<(), Error> {
    let node = cursor.raw_node();
    if cursor.raw_ns_parent().is_some() {
        return Err(Error::InvalidPosition);
    }
    match doc.kind(node) {
        NodeKind::Attribute { name, .. } => {
            if doc.is_namespace_decl(*name) {
                return Err(Error::InvalidPosition);
            }
            if doc.effective_read_only(node) {
                return Err(Error::ReadOnly);
            }
            doc.set_attribute_value(node, value);
            Ok(())
        }
        NodeKind::Text { .. }
        | NodeKind::CData { .. }
        | NodeKind::Whitespace { .. }
        | NodeKind::SignificantWhitespace { .. } => {
            if doc.effective_read_only(node) {
                return Err(Error::ReadOnly);
            }
            // Collapse the run to its first node before replacing the value.
            let end = text::run_end(doc, node);
            if end != node {
                let first_tail = doc
                    .next_sibling(node)
                    .ok_or(Error::InvalidPosition)?;
                let range = collect_range(doc, first_tail, end)?;
                if range.iter().any(|&n| doc.effective_read_only(n)) {
                    return Err(Error::ReadOnly);
                }
                for n in range {
                    doc.detach(n);
                }
            }
            doc.set_text(node, value);
            Ok(())
        }
        NodeKind::Element { .. } => {
            if doc.effective_read_only(node) {
                return Err(Error::ReadOnly);
            }
            // Element value replacement: all children give way to one text
            // node holding the new value.
            while let Some(child) = doc.first_child(node) {
                doc.detach(child);
            }
            let new_text = doc.create_text(value);
            doc.append_child(node, new_text);
            Ok(())
        }
        NodeKind::Comment { .. } | NodeKind::ProcessingInstruction { .. } => {
            if doc.effective_read_only(node) {
                return Err(Error::ReadOnly);
            }
            doc.set_text(node, value);
            Ok(())
        }
        NodeKind::Document
        | NodeKind::DocumentFragment
        | NodeKind::EntityRef { .. }
        | NodeKind::Entity { .. } => Err(Error::InvalidPosition),
    }
}

/// Deletes the node at the cursor's (calibrated) position — the whole run
/// for text, the attribute for an attribute position. Returns the nearest
/// surviving ancestor for the cursor to reposition on.
pub(crate) fn delete_self(doc: &mut Document, cursor: &Cursor) -> Result<NodeId, Error> {
    let node = cursor.raw_node();
    delete_at(doc, cursor, node, node)
}

/// Deletes the sibling range from the cursor's (calibrated) position
/// through `end` (calibrated; text endpoints extend to their run end).
/// Returns the nearest surviving ancestor.
pub(crate) fn delete_range(
    doc: &mut Document,
    cursor: &Cursor,
    end: NodeId,
) -> Result<NodeId, Error> {
    let node = cursor.raw_node();
    if node == end {
        return delete_at(doc, cursor, node, end);
    }
    let end = if text::is_text(doc, end) {
        text::run_end(doc, end)
    } else {
        end
    };
    if !axis::is_following_sibling(doc, node, end) {
        return Err(Error::InvalidPosition);
    }
    delete_to_following_sibling(doc, node, end)
}

/// Single-position delete: dispatches on the node kind, extending text
/// positions to their full run.
fn delete_at(
    doc: &mut Document,
    cursor: &Cursor,
    node: NodeId,
    end: NodeId,
) -> Result<NodeId, Error> {
    match doc.kind(node) {
        NodeKind::Attribute { name, .. } => {
            if doc.is_namespace_decl(*name) || cursor.raw_ns_parent().is_some() {
                return Err(Error::InvalidPosition);
            }
            let index = cursor
                .revalidated_attr_index(doc)
                .ok_or(Error::Detached)?;
            if doc.effective_read_only(node) {
                return Err(Error::ReadOnly);
            }
            let owner = doc.parent(node).ok_or(Error::Detached)?;
            doc.remove_attribute_at(owner, index);
            Ok(owner)
        }
        NodeKind::Text { .. }
        | NodeKind::CData { .. }
        | NodeKind::Whitespace { .. }
        | NodeKind::SignificantWhitespace { .. } => {
            let run_end = text::run_end(doc, end);
            delete_to_following_sibling(doc, node, run_end)
        }
        NodeKind::Element { .. }
        | NodeKind::ProcessingInstruction { .. }
        | NodeKind::Comment { .. } => delete_to_following_sibling(doc, node, end),
        NodeKind::Document
        | NodeKind::DocumentFragment
        | NodeKind::EntityRef { .. }
        | NodeKind::Entity { .. } => Err(Error::InvalidPosition),
    }
}

/// Collects the inclusive sibling span `[start, end]`, failing if `end`
/// is not reachable along the sibling list.
fn collect_range(doc: &Document, start: NodeId, end: NodeId) -> Result<Vec<NodeId>, Error> {
    let mut range = vec![start];
    let mut current = start;
    while current != end {
        current = doc.next_sibling(current).ok_or(Error::InvalidPosition)?;
        range.push(current);
    }
    Ok(range)
}

/// Detaches the whole contiguous span `[start, end]` atomically: every
/// member is checked for read-only before the first unlink.
fn delete_to_following_sibling(
    doc: &mut Document,
    start: NodeId,
    end: NodeId,
) -> Result<NodeId, Error> {
    let parent = doc.parent(start).ok_or(Error::Detached)?;
    let range = collect_range(doc, start, end)?;
    if range.iter().any(|&n| doc.effective_read_only(n)) {
        return Err(Error::ReadOnly);
    }
    for n in range {
        doc.detach(n);
    }
    Ok(parent)
}

// --- Writer opening ---

/// Opens a writer that prepends or appends children of `target`.
pub(crate) fn open_child_writer(
    doc: &mut Document,
    target: NodeId,
    prepend: bool,
) -> Result<NodeWriter<'_>, Error> {
    match doc.kind(target) {
        NodeKind::Element { .. } | NodeKind::Document | NodeKind::DocumentFragment => {}
        _ => return Err(Error::InvalidPosition),
    }
    if doc.effective_read_only(target) {
        return Err(Error::ReadOnly);
    }
    let op = if prepend {
        WriterOp::PrependChild { parent: target }
    } else {
        WriterOp::AppendChild { parent: target }
    };
    Ok(NodeWriter::open(doc, op, target))
}

/// Opens a writer that inserts siblings next to `anchor`.
pub(crate) fn open_sibling_writer(
    doc: &mut Document,
    anchor: NodeId,
    side: SiblingSide,
) -> Result<NodeWriter<'_>, Error> {
    match doc.kind(anchor) {
        NodeKind::Attribute { .. } | NodeKind::Document | NodeKind::DocumentFragment => {
            return Err(Error::InvalidPosition)
        }
        _ => {}
    }
    let parent = doc.parent(anchor).ok_or(Error::Detached)?;
    if doc.effective_read_only(parent) {
        return Err(Error::ReadOnly);
    }
    let op = match side {
        SiblingSide::Before => WriterOp::InsertBefore { anchor },
        SiblingSide::After => WriterOp::InsertAfter { anchor },
    };
    Ok(NodeWriter::open(doc, op, parent))
}

/// Opens a writer that appends attributes to `element`.
pub(crate) fn open_attribute_writer(
    doc: &mut Document,
    element: NodeId,
) -> Result<NodeWriter<'_>, Error> {
    if !doc.kind(element).is_element() {
        return Err(Error::InvalidPosition);
    }
    if doc.effective_read_only(element) {
        return Err(Error::ReadOnly);
    }
    Ok(NodeWriter::open(
        doc,
        WriterOp::AppendAttributes { element },
        element,
    ))
}

/// Opens a writer whose content replaces the sibling range `[start, end]`
/// (both already calibrated; text endpoints extend to their run ends here).
pub(crate) fn open_replace_writer(
    doc: &mut Document,
    start: NodeId,
    end: NodeId,
) -> Result<NodeWriter<'_>, Error> {
    let end = if start == end {
        match doc.kind(start) {
            NodeKind::Attribute { .. } | NodeKind::Document | NodeKind::DocumentFragment => {
                return Err(Error::InvalidPosition)
            }
            kind if kind.is_text() => text::run_end(doc, end),
            _ => end,
        }
    } else {
        let end = if text::is_text(doc, end) {
            text::run_end(doc, end)
        } else {
            end
        };
        if !axis::is_following_sibling(doc, start, end) {
            return Err(Error::InvalidPosition);
        }
        end
    };
    let parent = doc.parent(start).ok_or(Error::Detached)?;
    // Validate the whole range up front; the writer re-walks it on finish.
    let range = collect_range(doc, start, end)?;
    if range.iter().any(|&n| doc.effective_read_only(n)) {
        return Err(Error::ReadOnly);
    }
    Ok(NodeWriter::open(
        doc,
        WriterOp::ReplaceRange { start, end },
        parent,
    ))
}

// --- The writer ---

/// A push-style writer streaming content into an edit point.
///
/// Obtained from a cursor's edit entry points. Content accumulates under a
/// detached staging fragment; [`finish`](NodeWriter::finish) validates and
/// splices it in. Dropping the writer without finishing discards the staged
/// content and leaves the tree untouched.
///
/// # Examples
///
/// ```
/// use domnav::{Cursor, Document};
///
/// let mut doc = Document::new();
/// let cursor = Cursor::document_root(&doc);
///
/// let mut writer = cursor.append_child(&mut doc).unwrap();
/// writer.start_element("item").unwrap();
/// writer.text("payload").unwrap();
/// writer.end_element().unwrap();
/// writer.finish().unwrap();
///
/// let mut check = Cursor::document_root(&doc);
/// assert!(check.move_to_first_child(&doc));
/// assert_eq!(check.local_name(&doc), "item");
/// ```
pub struct NodeWriter<'d> {
    doc: &'d mut Document,
    op: WriterOp,
    /// Detached staging fragment streamed content builds under.
    fragment: NodeId,
    /// Currently open elements, outermost first.
    open_elements: Vec<NodeId>,
    /// Ambient prefix → URI bindings captured at the edit point, nearest
    /// declaration first.
    ambient: Vec<(String, String)>,
    /// Attribute nodes streamed to an [`AppendAttributes`](WriterOp) writer.
    pending_attrs: Vec<NodeId>,
}

impl<'d> NodeWriter<'d> {
    fn open(doc: &'d mut Document, op: WriterOp, scope_node: NodeId) -> Self {
        let ambient = ns::scope_at(doc, scope_node);
        let fragment = doc.create_fragment();
        Self {
            doc,
            op,
            fragment,
            open_elements: Vec::new(),
            ambient,
            pending_attrs: Vec::new(),
        }
    }

    fn is_attribute_writer(&self) -> bool {
        matches!(self.op, WriterOp::AppendAttributes { .. })
    }

    /// The node streamed content currently appends under.
    fn current_parent(&self) -> NodeId {
        self.open_elements.last().copied().unwrap_or(self.fragment)
    }

    fn append_content(&mut self, node: NodeId) -> Result<(), Error> {
        if self.is_attribute_writer() {
            return Err(Error::InvalidPosition);
        }
        let parent = self.current_parent();
        self.doc.append_child(parent, node);
        Ok(())
    }

    /// Starts an element. The qualified name's prefix is resolved when the
    /// element ends, so its own `xmlns` attributes participate.
    pub fn start_element(&mut self, qname: &str) -> Result<(), Error> {
        if self.is_attribute_writer() {
            return Err(Error::InvalidPosition);
        }
        let (prefix, local) = split_qname(qname);
        if local.is_empty() {
            return Err(Error::ArgumentOutOfRange("element name must not be empty"));
        }
        let element = self.doc.create_element(prefix, local, None);
        let parent = self.current_parent();
        self.doc.append_child(parent, element);
        self.open_elements.push(element);
        Ok(())
    }

    /// Writes an attribute. On content writers this must come before any
    /// child content of the open element; on an attribute writer it appends
    /// to the target element when the writer finishes.
    ///
    /// `xmlns` and `xmlns:p` names declare namespaces; the declarations
    /// shadow ambient bindings for the rest of the element's subtree.
    pub fn attribute(&mut self, qname: &str, value: &str) -> Result<(), Error> {
        let (prefix, local) = split_qname(qname);
        if local.is_empty() {
            return Err(Error::ArgumentOutOfRange("attribute name must not be empty"));
        }
        if !self.is_attribute_writer() {
            // Attributes must precede the open element's content.
            match self.open_elements.last() {
                Some(&element) if self.doc.first_child(element).is_none() => {}
                _ => return Err(Error::InvalidPosition),
            }
        }

        let is_decl = prefix == Some("xmlns") || (prefix.is_none() && local == "xmlns");
        let attr = if is_decl {
            let declared = if prefix.is_some() { Some(local) } else { None };
            self.doc.create_namespace_decl(declared, value)
        } else {
            self.doc.create_attribute(prefix, local, None, value)
        };

        if self.is_attribute_writer() {
            self.pending_attrs.push(attr);
        } else if let Some(&element) = self.open_elements.last() {
            self.doc.append_attribute(element, attr);
        }
        Ok(())
    }

    /// Writes a text node.
    pub fn text(&mut self, content: &str) -> Result<(), Error> {
        let node = self.doc.create_text(content);
        self.append_content(node)
    }

    /// Writes a CDATA section.
    pub fn cdata(&mut self, content: &str) -> Result<(), Error> {
        let node = self.doc.create_cdata(content);
        self.append_content(node)
    }

    /// Writes an ignorable-whitespace node.
    pub fn whitespace(&mut self, content: &str) -> Result<(), Error> {
        let node = self.doc.create_whitespace(content);
        self.append_content(node)
    }

    /// Writes a significant-whitespace node.
    pub fn significant_whitespace(&mut self, content: &str) -> Result<(), Error> {
        let node = self.doc.create_significant_whitespace(content);
        self.append_content(node)
    }

    /// Writes a comment node.
    pub fn comment(&mut self, content: &str) -> Result<(), Error> {
        let node = self.doc.create_comment(content);
        self.append_content(node)
    }

    /// Writes a processing instruction.
    pub fn processing_instruction(&mut self, target: &str, data: Option<&str>) -> Result<(), Error> {
        let node = self.doc.create_pi(target, data);
        self.append_content(node)
    }

    /// Writes an entity-reference wrapper node.
    pub fn entity_ref(&mut self, name: &str) -> Result<(), Error> {
        let node = self.doc.create_entity_ref(name);
        self.append_content(node)
    }

    /// Closes the innermost open element, resolving its namespace and those
    /// of its attributes against the declarations now in scope.
    pub fn end_element(&mut self) -> Result<(), Error> {
        let Some(element) = self.open_elements.pop() else {
            return Err(Error::InvalidPosition);
        };
        self.resolve_element(element)
    }

    /// Resolves the namespace of `element` and its regular attributes.
    /// `element` has been popped; `self.open_elements` holds its ancestors.
    fn resolve_element(&mut self, element: NodeId) -> Result<(), Error> {
        // Element name: prefixed → declared binding required; unprefixed →
        // in-scope default namespace, if any.
        let name = self.doc.name_of(element).ok_or(Error::InvalidPosition)?;
        let prefix = name.prefix.map(|p| self.doc.resolve(p).to_string());
        let uri = match prefix.as_deref() {
            Some(p) => Some(
                self.resolve_prefix(Some(element), p)
                    .ok_or_else(|| Error::UndeclaredPrefix(p.to_string()))?,
            ),
            None => self.resolve_prefix(Some(element), ""),
        };
        let uri_sym = uri.map(|u| self.doc.intern(&u));
        self.doc.set_name_namespace(element, uri_sym);

        // Attributes: unprefixed regular attributes never take the default
        // namespace; prefixed ones resolve like the element name.
        let attrs: Vec<NodeId> = self.doc.attributes(element).to_vec();
        for attr in attrs {
            let Some(attr_name) = self.doc.name_of(attr) else {
                continue;
            };
            if self.doc.is_namespace_decl(attr_name) {
                continue;
            }
            if let Some(p) = attr_name.prefix {
                let p = self.doc.resolve(p).to_string();
                let uri = self
                    .resolve_prefix(Some(element), &p)
                    .ok_or_else(|| Error::UndeclaredPrefix(p.clone()))?;
                let uri_sym = self.doc.intern(&uri);
                self.doc.set_name_namespace(attr, Some(uri_sym));
            }
        }
        Ok(())
    }

    /// Resolves `prefix` (empty string = default namespace) against the
    /// writer-local declarations — on `innermost` and the still-open
    /// elements — then the ambient scope. An empty declared URI unbinds.
    fn resolve_prefix(&self, innermost: Option<NodeId>, prefix: &str) -> Option<String> {
        let chain = innermost
            .into_iter()
            .chain(self.open_elements.iter().rev().copied());
        for element in chain {
            for &attr in self.doc.attributes(element) {
                let Some(name) = self.doc.name_of(attr) else {
                    continue;
                };
                if !self.doc.is_namespace_decl(name) {
                    continue;
                }
                let declared = if name.prefix.is_some() {
                    self.doc.resolve(name.local)
                } else {
                    ""
                };
                if declared == prefix {
                    let uri = self.doc.node_text(attr).unwrap_or_default();
                    return (!uri.is_empty()).then(|| uri.to_string());
                }
            }
        }
        // The ambient capture always carries the implicit xml binding.
        self.ambient
            .iter()
            .find(|(p, _)| p == prefix)
            .and_then(|(_, uri)| (!uri.is_empty()).then(|| uri.clone()))
    }

    /// Validates the streamed content and splices it in atomically.
    ///
    /// Returns the first spliced node, or `None` when nothing was written
    /// (a replace with no content is a plain delete; other operations
    /// become no-ops).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPosition`] if an element is still open; the errors
    /// of the attribute-writer resolution; and, for replace, the range
    /// errors re-checked at splice time. On error nothing is spliced.
    pub fn finish(mut self) -> Result<Option<NodeId>, Error> {
        if !self.open_elements.is_empty() {
            return Err(Error::InvalidPosition);
        }

        if let WriterOp::AppendAttributes { element } = self.op {
            // Resolve pending regular attributes against the pending
            // declarations plus the element's ambient scope.
            let pending = std::mem::take(&mut self.pending_attrs);
            for &attr in &pending {
                let Some(name) = self.doc.name_of(attr) else {
                    continue;
                };
                if self.doc.is_namespace_decl(name) {
                    continue;
                }
                if let Some(p) = name.prefix {
                    let p = self.doc.resolve(p).to_string();
                    let uri = self
                        .resolve_pending_prefix(&pending, &p)
                        .ok_or_else(|| Error::UndeclaredPrefix(p.clone()))?;
                    let uri_sym = self.doc.intern(&uri);
                    self.doc.set_name_namespace(attr, Some(uri_sym));
                }
            }
            let first = pending.first().copied();
            for attr in pending {
                self.doc.append_attribute(element, attr);
            }
            return Ok(first);
        }

        let children: Vec<NodeId> = self.doc.children(self.fragment).collect();

        match self.op {
            WriterOp::PrependChild { parent } => {
                let anchor = self.doc.first_child(parent);
                for &child in &children {
                    self.doc.detach(child);
                    match anchor {
                        Some(a) => self.doc.insert_before(a, child),
                        None => self.doc.append_child(parent, child),
                    }
                }
            }
            WriterOp::AppendChild { parent } => {
                for &child in &children {
                    self.doc.detach(child);
                    self.doc.append_child(parent, child);
                }
            }
            WriterOp::InsertBefore { anchor } => {
                if self.doc.parent(anchor).is_none() {
                    return Err(Error::Detached);
                }
                for &child in &children {
                    self.doc.detach(child);
                    self.doc.insert_before(anchor, child);
                }
            }
            WriterOp::InsertAfter { anchor } => {
                if self.doc.parent(anchor).is_none() {
                    return Err(Error::Detached);
                }
                let mut reference = anchor;
                for &child in &children {
                    self.doc.detach(child);
                    self.doc.insert_after(reference, child);
                    reference = child;
                }
            }
            WriterOp::ReplaceRange { start, end } => {
                let parent = self.doc.parent(start).ok_or(Error::Detached)?;
                let before = self.doc.prev_sibling(start);
                // Re-walk the range under the exclusive borrow; open-time
                // validation already vetted it.
                let range = collect_range(self.doc, start, end)?;
                if range.iter().any(|&n| self.doc.effective_read_only(n)) {
                    return Err(Error::ReadOnly);
                }
                for n in range {
                    self.doc.detach(n);
                }
                let mut reference = before;
                for &child in &children {
                    self.doc.detach(child);
                    match reference {
                        Some(r) => self.doc.insert_after(r, child),
                        None => self.doc.prepend_child(parent, child),
                    }
                    reference = Some(child);
                }
            }
            WriterOp::AppendAttributes { .. } => unreachable!("handled above"),
        }
        Ok(children.first().copied())
    }

    /// Prefix resolution for the attribute writer: pending declarations
    /// first, then the target element's ambient scope.
    fn resolve_pending_prefix(&self, pending: &[NodeId], prefix: &str) -> Option<String> {
        for &attr in pending {
            let Some(name) = self.doc.name_of(attr) else {
                continue;
            };
            if !self.doc.is_namespace_decl(name) {
                continue;
            }
            let declared = if name.prefix.is_some() {
                self.doc.resolve(name.local)
            } else {
                ""
            };
            if declared == prefix {
                let uri = self.doc.node_text(attr).unwrap_or_default();
                return (!uri.is_empty()).then(|| uri.to_string());
            }
        }
        // The ambient capture always carries the implicit xml binding.
        self.ambient
            .iter()
            .find(|(p, _)| p == prefix)
            .and_then(|(_, uri)| (!uri.is_empty()).then(|| uri.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Cursor;
    use crate::tree::XMLNS_URI;

    /// `<list><item/>alpha<!--sep-->beta gamma</list>` where beta/gamma are
    /// adjacent text nodes.
    struct Fixture {
        doc: Document,
        list: NodeId,
        item: NodeId,
        alpha: NodeId,
        sep: NodeId,
        beta: NodeId,
        gamma: NodeId,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let root = doc.root();
        let list = doc.create_element(None, "list", None);
        doc.append_child(root, list);
        let item = doc.create_element(None, "item", None);
        let alpha = doc.create_text("alpha");
        let sep = doc.create_comment("sep");
        let beta = doc.create_text("beta ");
        let gamma = doc.create_text("gamma");
        doc.append_child(list, item);
        doc.append_child(list, alpha);
        doc.append_child(list, sep);
        doc.append_child(list, beta);
        doc.append_child(list, gamma);
        Fixture {
            doc,
            list,
            item,
            alpha,
            sep,
            beta,
            gamma,
        }
    }

    fn child_names(doc: &Document, parent: NodeId) -> Vec<String> {
        doc.children(parent)
            .map(|c| match doc.kind(c) {
                NodeKind::Element { name, .. } => doc.resolve(name.local).to_string(),
                NodeKind::Text { content } => format!("#text:{content}"),
                NodeKind::Comment { content } => format!("#comment:{content}"),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_append_child_writer() {
        let mut f = fixture();
        let cursor = Cursor::new(&f.doc, f.list);
        let mut writer = cursor.append_child(&mut f.doc).unwrap();
        writer.start_element("tail").unwrap();
        writer.text("x").unwrap();
        writer.end_element().unwrap();
        let first = writer.finish().unwrap().unwrap();

        assert_eq!(f.doc.last_child(f.list), Some(first));
        assert_eq!(f.doc.local_name(first), Some("tail"));
        assert_eq!(f.doc.text_content(first), "x");
    }

    #[test]
    fn test_prepend_child_preserves_stream_order() {
        let mut f = fixture();
        let cursor = Cursor::new(&f.doc, f.list);
        let mut writer = cursor.prepend_child(&mut f.doc).unwrap();
        writer.start_element("first").unwrap();
        writer.end_element().unwrap();
        writer.start_element("second").unwrap();
        writer.end_element().unwrap();
        writer.finish().unwrap();

        let names = child_names(&f.doc, f.list);
        assert_eq!(names[0], "first");
        assert_eq!(names[1], "second");
        assert_eq!(names[2], "item");
    }

    #[test]
    fn test_child_writer_rejects_text_position() {
        let mut f = fixture();
        let cursor = Cursor::new(&f.doc, f.alpha);
        assert!(matches!(
            cursor.append_child(&mut f.doc),
            Err(Error::InvalidPosition)
        ));
    }

    #[test]
    fn test_insert_after_text_position_lands_after_run() {
        let mut f = fixture();
        // Cursor parked mid-run; insertion goes after the whole run.
        let cursor = Cursor::new(&f.doc, f.beta);
        let mut writer = cursor.insert_after(&mut f.doc).unwrap();
        writer.comment("end").unwrap();
        writer.finish().unwrap();

        assert!(matches!(
            f.doc.kind(f.doc.last_child(f.list).unwrap()),
            NodeKind::Comment { .. }
        ));
        assert_eq!(f.doc.next_sibling(f.gamma), f.doc.last_child(f.list));
    }

    #[test]
    fn test_insert_before_text_position_calibrates_first() {
        let mut f = fixture();
        // Cursor on the run tail; insertion goes before the run start.
        let mut cursor = Cursor::new(&f.doc, f.gamma);
        let mut writer = cursor.insert_before(&mut f.doc).unwrap();
        writer.comment("lead").unwrap();
        writer.finish().unwrap();

        let lead = f.doc.prev_sibling(f.beta).unwrap();
        assert!(matches!(f.doc.kind(lead), NodeKind::Comment { .. }));
        assert_eq!(f.doc.next_sibling(f.sep), Some(lead));
    }

    #[test]
    fn test_sibling_writer_rejects_attribute_position() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(None, "e", None);
        doc.append_child(root, e);
        let attr = doc.create_attribute(None, "id", None, "1");
        doc.append_attribute(e, attr);

        let mut cursor = Cursor::new(&doc, e);
        assert!(cursor.move_to_attribute(&doc, "id", None));
        assert!(matches!(
            cursor.insert_after(&mut doc),
            Err(Error::InvalidPosition)
        ));
        assert!(matches!(
            cursor.insert_before(&mut doc),
            Err(Error::InvalidPosition)
        ));
    }

    #[test]
    fn test_dropped_writer_discards_content() {
        let mut f = fixture();
        let before = child_names(&f.doc, f.list);
        let cursor = Cursor::new(&f.doc, f.list);
        let mut writer = cursor.append_child(&mut f.doc).unwrap();
        writer.start_element("junk").unwrap();
        writer.text("never spliced").unwrap();
        drop(writer);

        assert_eq!(child_names(&f.doc, f.list), before);
    }

    #[test]
    fn test_finish_with_open_element_fails_without_splicing() {
        let mut f = fixture();
        let before = child_names(&f.doc, f.list);
        let cursor = Cursor::new(&f.doc, f.list);
        let mut writer = cursor.append_child(&mut f.doc).unwrap();
        writer.start_element("unclosed").unwrap();
        assert!(matches!(writer.finish(), Err(Error::InvalidPosition)));
        assert_eq!(child_names(&f.doc, f.list), before);
    }

    #[test]
    fn test_attribute_writer() {
        let mut f = fixture();
        let cursor = Cursor::new(&f.doc, f.item);
        let mut writer = cursor.append_attributes(&mut f.doc).unwrap();
        writer.attribute("id", "i1").unwrap();
        writer.attribute("class", "c1").unwrap();
        writer.finish().unwrap();

        let attrs = f.doc.attributes(f.item);
        assert_eq!(attrs.len(), 2);
        assert_eq!(f.doc.local_name(attrs[0]), Some("id"));
        assert_eq!(f.doc.node_text(attrs[1]), Some("c1"));
    }

    #[test]
    fn test_attribute_writer_rejects_content() {
        let mut f = fixture();
        let cursor = Cursor::new(&f.doc, f.item);
        let mut writer = cursor.append_attributes(&mut f.doc).unwrap();
        assert!(matches!(writer.text("nope"), Err(Error::InvalidPosition)));
        assert!(matches!(
            writer.start_element("nope"),
            Err(Error::InvalidPosition)
        ));
    }

    #[test]
    fn test_attributes_must_precede_content() {
        let mut f = fixture();
        let cursor = Cursor::new(&f.doc, f.list);
        let mut writer = cursor.append_child(&mut f.doc).unwrap();
        writer.start_element("e").unwrap();
        writer.attribute("ok", "1").unwrap();
        writer.text("content").unwrap();
        assert!(matches!(
            writer.attribute("late", "2"),
            Err(Error::InvalidPosition)
        ));
    }

    #[test]
    fn test_writer_resolves_own_declaration() {
        // <p:item xmlns:p="urn:w"> — the declaration follows the start tag
        // in stream order, as it does in serialized XML.
        let mut f = fixture();
        let cursor = Cursor::new(&f.doc, f.list);
        let mut writer = cursor.append_child(&mut f.doc).unwrap();
        writer.start_element("p:item").unwrap();
        writer.attribute("xmlns:p", "urn:w").unwrap();
        writer.end_element().unwrap();
        let new = writer.finish().unwrap().unwrap();

        let name = f.doc.name_of(new).unwrap();
        assert_eq!(f.doc.resolve(name.local), "item");
        assert_eq!(name.namespace.map(|n| f.doc.resolve(n)), Some("urn:w"));
    }

    #[test]
    fn test_writer_resolves_ambient_prefix() {
        // The edit point sits inside <outer xmlns:a="urn:ambient">; content
        // written with prefix a needs no declaration of its own.
        let mut doc = Document::new();
        let root = doc.root();
        let outer = doc.create_element(None, "outer", None);
        doc.append_child(root, outer);
        let decl = doc.create_namespace_decl(Some("a"), "urn:ambient");
        doc.append_attribute(outer, decl);

        let cursor = Cursor::new(&doc, outer);
        let mut writer = cursor.append_child(&mut doc).unwrap();
        writer.start_element("a:child").unwrap();
        writer.end_element().unwrap();
        let new = writer.finish().unwrap().unwrap();

        let name = doc.name_of(new).unwrap();
        assert_eq!(
            name.namespace.map(|n| doc.resolve(n)),
            Some("urn:ambient")
        );
    }

    #[test]
    fn test_writer_undeclared_prefix_fails() {
        let mut f = fixture();
        let cursor = Cursor::new(&f.doc, f.list);
        let mut writer = cursor.append_child(&mut f.doc).unwrap();
        writer.start_element("ghost:item").unwrap();
        assert!(matches!(
            writer.end_element(),
            Err(Error::UndeclaredPrefix(p)) if p == "ghost"
        ));
    }

    #[test]
    fn test_writer_default_namespace_applies_to_elements_only() {
        let mut f = fixture();
        let cursor = Cursor::new(&f.doc, f.list);
        let mut writer = cursor.append_child(&mut f.doc).unwrap();
        writer.start_element("e").unwrap();
        writer.attribute("xmlns", "urn:default").unwrap();
        writer.attribute("plain", "v").unwrap();
        writer.end_element().unwrap();
        let new = writer.finish().unwrap().unwrap();

        let name = f.doc.name_of(new).unwrap();
        assert_eq!(
            name.namespace.map(|n| f.doc.resolve(n)),
            Some("urn:default")
        );
        // The unprefixed attribute stays namespace-less; the declaration
        // itself lives in the reserved xmlns namespace.
        let attrs: Vec<NodeId> = f.doc.attributes(new).to_vec();
        let decl_name = f.doc.name_of(attrs[0]).unwrap();
        assert_eq!(
            decl_name.namespace.map(|n| f.doc.resolve(n)),
            Some(XMLNS_URI)
        );
        let plain_name = f.doc.name_of(attrs[1]).unwrap();
        assert_eq!(plain_name.namespace, None);
    }

    #[test]
    fn test_nested_elements_inherit_writer_declarations() {
        let mut f = fixture();
        let cursor = Cursor::new(&f.doc, f.list);
        let mut writer = cursor.append_child(&mut f.doc).unwrap();
        writer.start_element("outer").unwrap();
        writer.attribute("xmlns:n", "urn:nested").unwrap();
        writer.start_element("n:inner").unwrap();
        writer.end_element().unwrap();
        writer.end_element().unwrap();
        let outer = writer.finish().unwrap().unwrap();

        let inner = f.doc.first_child(outer).unwrap();
        let name = f.doc.name_of(inner).unwrap();
        assert_eq!(
            name.namespace.map(|n| f.doc.resolve(n)),
            Some("urn:nested")
        );
    }

    #[test]
    fn test_replace_range_splices_streamed_content() {
        let mut f = fixture();
        // Replace [alpha .. gamma-run] with one comment.
        let mut start = Cursor::new(&f.doc, f.alpha);
        let end = Cursor::new(&f.doc, f.beta);
        let mut writer = start.replace_range(&mut f.doc, &end).unwrap();
        writer.comment("replaced").unwrap();
        let first = writer.finish().unwrap().unwrap();

        let names = child_names(&f.doc, f.list);
        assert_eq!(names, vec!["item".to_string(), "#comment:replaced".to_string()]);
        assert_eq!(f.doc.next_sibling(f.item), Some(first));
        assert!(!f.doc.is_attached(f.alpha));
        assert!(!f.doc.is_attached(f.gamma));
    }

    #[test]
    fn test_replace_range_with_no_content_deletes() {
        let mut f = fixture();
        let mut start = Cursor::new(&f.doc, f.sep);
        let end = Cursor::new(&f.doc, f.beta);
        let writer = start.replace_range(&mut f.doc, &end).unwrap();
        assert_eq!(writer.finish().unwrap(), None);

        let names = child_names(&f.doc, f.list);
        assert_eq!(
            names,
            vec!["item".to_string(), "#text:alpha".to_string()]
        );
    }

    #[test]
    fn test_replace_range_rejects_non_following_end() {
        let mut f = fixture();
        let mut start = Cursor::new(&f.doc, f.sep);
        let end = Cursor::new(&f.doc, f.alpha);
        assert!(matches!(
            start.replace_range(&mut f.doc, &end),
            Err(Error::InvalidPosition)
        ));
    }

    #[test]
    fn test_delete_range_removes_span_and_relinks() {
        let mut f = fixture();
        let mut start = Cursor::new(&f.doc, f.alpha);
        let end = Cursor::new(&f.doc, f.sep);
        start.delete_range(&mut f.doc, &end).unwrap();

        // alpha and sep are gone; item now links straight to the beta run.
        assert_eq!(f.doc.next_sibling(f.item), Some(f.beta));
        assert_eq!(f.doc.prev_sibling(f.beta), Some(f.item));
        assert!(!f.doc.is_attached(f.alpha));
        assert!(!f.doc.is_attached(f.sep));
        // The cursor repositioned to the surviving parent.
        assert_eq!(start.node_id(&f.doc), f.list);
    }

    #[test]
    fn test_delete_range_read_only_member_is_atomic() {
        let mut f = fixture();
        f.doc.set_read_only(f.sep, true);
        let mut start = Cursor::new(&f.doc, f.alpha);
        let end = Cursor::new(&f.doc, f.beta);
        assert!(matches!(
            start.delete_range(&mut f.doc, &end),
            Err(Error::ReadOnly)
        ));
        // Nothing was unlinked.
        assert!(f.doc.is_attached(f.alpha));
        assert!(f.doc.is_attached(f.sep));
        assert!(f.doc.is_attached(f.beta));
        assert_eq!(start.node_id(&f.doc), f.alpha);
    }

    #[test]
    fn test_delete_self_text_removes_whole_run() {
        let mut f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.gamma);
        cursor.delete_self(&mut f.doc).unwrap();

        assert!(!f.doc.is_attached(f.beta));
        assert!(!f.doc.is_attached(f.gamma));
        assert_eq!(f.doc.last_child(f.list), Some(f.sep));
        assert_eq!(cursor.node_id(&f.doc), f.list);
    }

    #[test]
    fn test_delete_self_attribute() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(None, "e", None);
        doc.append_child(root, e);
        let attr = doc.create_attribute(None, "id", None, "1");
        doc.append_attribute(e, attr);

        let mut cursor = Cursor::new(&doc, e);
        assert!(cursor.move_to_attribute(&doc, "id", None));
        cursor.delete_self(&mut doc).unwrap();
        assert!(doc.attributes(e).is_empty());
        assert_eq!(cursor.node_id(&doc), e);
    }

    #[test]
    fn test_delete_self_on_document_fails() {
        let mut f = fixture();
        let mut cursor = Cursor::document_root(&f.doc);
        assert!(matches!(
            cursor.delete_self(&mut f.doc),
            Err(Error::InvalidPosition)
        ));
    }

    #[test]
    fn test_set_value_on_attribute() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(None, "e", None);
        doc.append_child(root, e);
        let attr = doc.create_attribute(None, "id", None, "old");
        doc.append_attribute(e, attr);

        let mut cursor = Cursor::new(&doc, e);
        assert!(cursor.move_to_attribute(&doc, "id", None));
        cursor.set_value(&mut doc, "new").unwrap();
        assert_eq!(doc.node_text(attr), Some("new"));
    }

    #[test]
    fn test_set_value_collapses_text_run() {
        let mut f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.gamma);
        cursor.set_value(&mut f.doc, "joined").unwrap();

        // The run collapsed to its first node carrying the new value.
        assert_eq!(f.doc.node_text(f.beta), Some("joined"));
        assert!(!f.doc.is_attached(f.gamma));
        assert_eq!(cursor.value(&f.doc), "joined");
    }

    #[test]
    fn test_set_value_on_element_replaces_children() {
        let mut f = fixture();
        let mut cursor = Cursor::new(&f.doc, f.list);
        cursor.set_value(&mut f.doc, "flat").unwrap();

        let children: Vec<NodeId> = f.doc.children(f.list).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(f.doc.node_text(children[0]), Some("flat"));
        assert!(!f.doc.is_attached(f.item));
    }

    #[test]
    fn test_set_value_read_only_fails() {
        let mut f = fixture();
        f.doc.set_read_only(f.alpha, true);
        let mut cursor = Cursor::new(&f.doc, f.alpha);
        assert!(matches!(
            cursor.set_value(&mut f.doc, "x"),
            Err(Error::ReadOnly)
        ));
        assert_eq!(f.doc.node_text(f.alpha), Some("alpha"));
    }

    #[test]
    fn test_set_value_on_namespace_position_fails() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(None, "e", None);
        doc.append_child(root, e);

        let mut cursor = Cursor::new(&doc, e);
        assert!(cursor.move_to_namespace(&doc, "xml"));
        assert!(matches!(
            cursor.set_value(&mut doc, "x"),
            Err(Error::InvalidPosition)
        ));
    }

    #[test]
    fn test_cross_document_edit_is_rejected() {
        let mut f = fixture();
        let foreign_doc = Document::new();
        let foreign = Cursor::document_root(&foreign_doc);
        let mut local = Cursor::new(&f.doc, f.alpha);
        assert!(matches!(
            local.delete_range(&mut f.doc, &foreign),
            Err(Error::CrossDocument)
        ));
    }

    #[test]
    fn test_read_only_parent_rejects_child_writer() {
        let mut f = fixture();
        f.doc.set_read_only(f.list, true);
        let cursor = Cursor::new(&f.doc, f.item);
        assert!(matches!(
            cursor.append_child(&mut f.doc),
            Err(Error::ReadOnly)
        ));
        assert!(matches!(
            cursor.insert_after(&mut f.doc),
            Err(Error::InvalidPosition) | Err(Error::ReadOnly)
        ));
    }
}
