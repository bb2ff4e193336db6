// ============================================================================
// spark-vdom - Host Adapter
// The environment-specific primitives the renderer drives
// ============================================================================

use crate::core::error::HostError;
use crate::core::types::NodeId;
use crate::vdom::{EventHandler, PropValue};

/// Primitives of a host tree (a DOM, a terminal widget tree, a test double).
///
/// The renderer only ever talks to the host through this trait. Node handles
/// are opaque [`NodeId`]s minted by `create_node`.
pub trait HostAdapter {
    fn create_node(&mut self, tag: &str) -> Result<NodeId, HostError>;

    fn set_property(&mut self, node: NodeId, key: &str, value: &PropValue)
        -> Result<(), HostError>;

    fn remove_property(&mut self, node: NodeId, key: &str) -> Result<(), HostError>;

    /// Replace the node's text content.
    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), HostError>;

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError>;

    /// Put `new_child` where `old_child` is and detach `old_child`.
    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), HostError>;

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), HostError>;

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;
}

/// Hosts that can report their listeners, so events can be dispatched
/// without holding a borrow of the host while handlers run.
pub trait EventDispatch {
    /// Listeners for `event` on `node`, in registration order.
    fn listeners(&self, node: NodeId, event: &str) -> Vec<EventHandler>;
}
