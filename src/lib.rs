//! # domnav
//!
//! Cursor-based XPath-style navigation and editing over a mutable, in-memory
//! XML tree. The tree is an arena of nodes addressed by typed indices; a
//! [`Cursor`] presents it through the XPath data model — adjacent text-like
//! nodes merge into single logical text nodes, namespace declarations appear
//! as synthesized namespace positions, and two independent cursors can be
//! compared for document order. Structural edits stream through a
//! [`NodeWriter`] instead of direct tree-splice calls.
//!
//! ## Quick Start
//!
//! ```
//! use domnav::{Cursor, Document};
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! let item = doc.create_element(None, "item", None);
//! let text = doc.create_text("hello");
//! doc.append_child(root, item);
//! doc.append_child(item, text);
//!
//! let mut cursor = Cursor::document_root(&doc);
//! assert!(cursor.move_to_first_child(&doc));
//! assert_eq!(cursor.local_name(&doc), "item");
//! assert_eq!(cursor.value(&doc), "hello");
//! ```

pub mod axis;
pub mod cursor;
pub mod edit;
pub mod error;
pub mod ns;
pub mod order;
pub mod text;
pub mod tree;
pub mod util;

// Re-export primary types at the crate root for convenience.
pub use cursor::{Cursor, NodeType};
pub use edit::NodeWriter;
pub use error::Error;
pub use ns::Scope;
pub use order::Order;
pub use tree::{Document, Name, NodeId, NodeKind};
