//! Error types for cursor navigation and editing.
//!
//! Every error here is local and synchronous: it is detected before any
//! partial mutation is applied, so a failed edit leaves the tree exactly as
//! it was. Operations are deterministic — retrying an [`Error::InvalidPosition`]
//! or [`Error::ReadOnly`] failure without changing the input will not succeed,
//! so callers are expected to report rather than loop.

/// The error type for navigation and mutation operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The operation is not defined for the cursor's current node kind —
    /// e.g., inserting a sibling next to an attribute position.
    #[error("operation is not valid for the cursor's current position")]
    InvalidPosition,

    /// Attempted mutation of an immutable node, one of its ancestors, or a
    /// member of a delete/replace range.
    #[error("node is read-only and cannot be modified")]
    ReadOnly,

    /// The position is no longer reachable from its document root. This
    /// includes an attribute that is no longer in its owner's collection
    /// after a failed re-scan.
    #[error("node is detached from the document")]
    Detached,

    /// The operation mixed cursors or nodes from different documents.
    #[error("cursors belong to different documents")]
    CrossDocument,

    /// A numeric argument was negative or past the end of the value it
    /// indexes into.
    #[error("argument out of range: {0}")]
    ArgumentOutOfRange(&'static str),

    /// The operation was requested against a position variant that does not
    /// support it.
    #[error("operation not supported: {0}")]
    NotSupported(&'static str),

    /// A qualified name used a prefix with no binding in the writer or in
    /// the ambient scope captured at the edit point.
    #[error("namespace prefix '{0}' is not declared in scope")]
    UndeclaredPrefix(String),
}
