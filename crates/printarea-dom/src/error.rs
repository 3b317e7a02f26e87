//! Error types for tree operations

use thiserror::Error;

use crate::tree::NodeId;

/// Result type for tree operations
pub type Result<T> = std::result::Result<T, DomError>;

/// Errors that can occur while mutating or loading an element tree
#[derive(Error, Debug)]
pub enum DomError {
    /// The node cannot hold children (text and comment nodes)
    #[error("Node {0} cannot have children")]
    NotAContainer(NodeId),

    /// Inserting the node would make it its own ancestor
    #[error("Node {child} is an ancestor of {parent}")]
    Cycle { parent: NodeId, child: NodeId },

    /// The reference node has no parent to insert next to
    #[error("Node {0} is detached")]
    Detached(NodeId),

    /// The root node cannot be moved
    #[error("The root node cannot be moved")]
    RootImmovable,

    /// IO error while reading markup
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
