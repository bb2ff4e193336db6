// ============================================================================
// spark-vdom - A Reactive Virtual Tree Renderer for Rust
// ============================================================================
//
// Field-level reactive records, synchronous effects, and a positional
// reconciler that keeps a host tree in sync with a render function.
// ============================================================================

#[macro_use]
mod macros;

pub mod core;
pub mod pipeline;
pub mod primitives;
pub mod reactivity;
pub mod renderer;
pub mod vdom;

// Re-export core items at crate root for ergonomic access
pub use crate::core::config::{configure, current_config, with_config, RuntimeConfig};
pub use crate::core::constants;
pub use crate::core::context::{effect_depth, is_tracking, is_untracking, with_context, ReactiveContext};
pub use crate::core::error::{HostError, ReactiveError, RenderError};
pub use crate::core::types::{DepKey, EffectId, NodeId, TargetId};

// Reactive primitives
pub use primitives::effect::{dispose_effect, effect_tracking, watch_effect, Effect, EffectFn};
pub use primitives::reactive::{reactive, Reactive, Record};

// Dependency tracking
pub use reactivity::registry::{get_subscriber_set, registry_entry_count, subscriber_count};
pub use reactivity::tracking::{notify_write, track_read, untrack};

// Tree descriptions
pub use vdom::{h, Children, Event, EventHandler, PropValue, Props, VNode};

// Rendering
pub use pipeline::{mount_application, App, Component};
pub use renderer::{
    mount, reconcile, unmount, EventDispatch, HostAdapter, HostOp, MemoryHost, Renderer,
};

// =============================================================================
// TESTS
// =============================================================================
