// ============================================================================
// spark-vdom - Core Module
// Identities, errors, configuration, and context for the reactive runtime
// ============================================================================

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use config::{configure, current_config, with_config, RuntimeConfig};
pub use constants::*;
pub use context::{effect_depth, is_tracking, is_untracking, with_context, ReactiveContext};
pub use error::{HostError, ReactiveError, RenderError};
pub use types::{DepKey, EffectId, NodeId, TargetId};
