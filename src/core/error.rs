// ============================================================================
// spark-vdom - Errors
// ============================================================================

use thiserror::Error;

use super::types::NodeId;

/// Errors raised by the reactive runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// A chain of effect runs exceeded the configured depth bound.
    /// Usually an effect that keeps writing to something it reads.
    #[error("maximum update depth exceeded ({depth}); an effect is likely re-triggering itself")]
    MaxUpdateDepth { depth: u32 },

    /// A record rejected a write to a field it does not have.
    #[error("unknown field: {field}")]
    UnknownField { field: String },

    /// The effect was disposed and can no longer run.
    #[error("effect has been disposed")]
    Disposed,
}

/// Errors reported by a host-tree adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("unknown host node {0}")]
    UnknownNode(NodeId),

    #[error("host node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("no `{event}` listener registered on host node {node}")]
    ListenerNotFound { node: NodeId, event: String },

    /// Adapter-specific failure.
    #[error("host error: {0}")]
    Host(String),
}

/// Errors raised while mounting or reconciling a tree description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Reactive(#[from] ReactiveError),

    /// A previous description was reconciled before it was ever realized.
    #[error("`<{tag}>` has no host node; it was never mounted")]
    NotMounted { tag: String },

    /// The application state is still shared with a render in progress.
    #[error("application is still rendering and cannot be unmounted")]
    StillRendering,
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
