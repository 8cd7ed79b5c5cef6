use shared::NodeId;
use thiserror::Error;

/// Loader failure (network or parse)
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to load {url}: {reason}")]
pub struct LoadError {
    pub url: String,
    pub reason: String,
}

impl LoadError {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapError {
    #[error("node {0} not found")]
    UnknownNode(NodeId),
    #[error("cannot snap an object to itself")]
    SameObject,
    #[error("snap point {index} on {node} is already used")]
    PointUsed { node: NodeId, index: usize },
    #[error("snap point {index} on {node} does not exist")]
    PointOutOfRange { node: NodeId, index: usize },
    #[error("objects already belong to different snapped groups")]
    AlreadyGrouped,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error("no placement target container in the scene")]
    MissingTargetContainer,
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("node {0} not found")]
    UnknownNode(NodeId),
    #[error("snap failed: {0}")]
    Snap(#[from] SnapError),
}

pub type Result<T> = std::result::Result<T, PlacementError>;
