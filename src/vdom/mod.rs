// ============================================================================
// spark-vdom - Tree Description Module
// Nodes, children, and property values
// ============================================================================

pub mod node;
pub mod props;

pub use node::{h, Children, VNode};
pub use props::{Event, EventHandler, PropValue, Props};
