//! Node type definitions.
//!
//! The `NodeKind` enum represents all node types in an XML document tree.
//! Each variant carries the node-type-specific payload (e.g., element name
//! and attribute collection, text content). The set is closed and matched
//! exhaustively throughout the crate; adding a kind means updating every
//! match site deliberately.

use super::NodeId;
use crate::util::dict::SymbolId;

/// An interned qualified name: prefix, local name, and namespace URI.
///
/// All three components are `SymbolId`s into the owning document's
/// dictionary, so comparing two `Name`s is a handful of integer compares —
/// never a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name {
    /// Namespace prefix (e.g., `svg` in `svg:rect`), if any.
    pub prefix: Option<SymbolId>,
    /// The local part of the name.
    pub local: SymbolId,
    /// Namespace URI after resolution, if any.
    pub namespace: Option<SymbolId>,
}

/// The kind of an XML node and its associated data.
///
/// This enum carries the payload for each node type. Navigation links
/// (parent, children, siblings) are stored in `NodeData`, not here.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document node — there is exactly one per `Document`.
    Document,

    /// A document fragment: a parentless container of sibling nodes. Also
    /// used as the staging area for streamed edits before they are spliced.
    DocumentFragment,

    /// An element node, e.g., `<div class="x">`.
    Element {
        /// The element's qualified name.
        name: Name,
        /// Ordered attribute collection: ids of `Attribute` nodes, in
        /// insertion order. Name-uniqueness is the tree builder's problem,
        /// not enforced here.
        attributes: Vec<NodeId>,
    },

    /// An attribute node. Attribute nodes live in their owner element's
    /// collection, never in a sibling list; their `parent` link is the
    /// owner element.
    Attribute {
        /// The attribute's qualified name. Namespace declarations
        /// (`xmlns="…"`, `xmlns:p="…"`) are attributes whose name places
        /// them in the reserved xmlns namespace.
        name: Name,
        /// The attribute value.
        value: String,
    },

    /// A text node containing character data.
    Text {
        /// The text content.
        content: String,
    },

    /// A CDATA section, e.g., `<![CDATA[...]]>`.
    CData {
        /// The CDATA content (no escaping applied).
        content: String,
    },

    /// An ignorable whitespace run.
    Whitespace {
        /// The whitespace characters.
        content: String,
    },

    /// Whitespace inside mixed content that a loader marked significant.
    SignificantWhitespace {
        /// The whitespace characters.
        content: String,
    },

    /// A comment node, e.g., `<!-- ... -->`.
    Comment {
        /// The comment text (without the `<!--` and `-->` delimiters).
        content: String,
    },

    /// A processing instruction, e.g., `<?target data?>`.
    ProcessingInstruction {
        /// The PI target (e.g., `"xml-stylesheet"`).
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },

    /// An entity reference wrapper (e.g., `&chap1;` left unexpanded in
    /// storage). Its children are the expansion; navigation passes through
    /// the wrapper transparently.
    EntityRef {
        /// The entity name (without `&` and `;`).
        name: String,
    },

    /// An entity definition. Inert storage — never a valid navigation
    /// child.
    Entity {
        /// The entity name.
        name: String,
    },
}

impl NodeKind {
    /// Returns `true` for the four text-like kinds that coalesce into one
    /// logical text node: Text, CDATA, Whitespace, SignificantWhitespace.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Self::Text { .. }
                | Self::CData { .. }
                | Self::Whitespace { .. }
                | Self::SignificantWhitespace { .. }
        )
    }

    /// Returns `true` if this is an element node.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }

    /// Returns `true` if this is an attribute node.
    #[must_use]
    pub fn is_attribute(&self) -> bool {
        matches!(self, Self::Attribute { .. })
    }
}
