// ============================================================================
// spark-vdom - Reactivity Module
// Dependency registry, read tracking, and write notification
// ============================================================================

pub mod registry;
pub mod tracking;

// Re-export main tracking functions
pub use registry::{
    get_subscriber_set, registry_entry_count, subscriber_count, DependencyRegistry, SubscriberSet,
};
pub use tracking::{notify_write, track_read, untrack};
