// ============================================================================
// spark-vdom - Memory Host
// Headless host tree that records every mutation
// ============================================================================
//
// Used by tests and benches, and by embedders that want a host tree without
// an environment behind it. Every adapter call is validated and appended to
// an operation log, so reconciliation can be asserted call-by-call.
// ============================================================================

use std::collections::HashMap;
use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::core::error::HostError;
use crate::core::types::NodeId;
use crate::vdom::{EventHandler, PropValue};

use super::host::{EventDispatch, HostAdapter};

// =============================================================================
// OPERATION LOG
// =============================================================================

/// One recorded host mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    CreateNode { node: NodeId, tag: String },
    SetProperty { node: NodeId, key: String, value: String },
    RemoveProperty { node: NodeId, key: String },
    SetText { node: NodeId, text: String },
    AppendChild { parent: NodeId, child: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
    ReplaceChild { parent: NodeId, new_child: NodeId, old_child: NodeId },
    AddEventListener { node: NodeId, event: String },
    RemoveEventListener { node: NodeId, event: String },
}

// =============================================================================
// NODES
// =============================================================================

#[derive(Debug, Default)]
struct HostNode {
    tag: String,
    properties: IndexMap<String, PropValue>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    listeners: IndexMap<String, Vec<EventHandler>>,
}

/// In-memory host tree.
///
/// Detached nodes stay addressable (a reconciler may re-attach them), they
/// simply have no parent.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: HashMap<NodeId, HostNode>,
    next_id: u64,
    ops: Vec<HostOp>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container node without recording it, for use as a mount point.
    pub fn create_root(&mut self, tag: &str) -> NodeId {
        self.alloc(tag)
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        self.next_id += 1;
        let id = NodeId::from_raw(self.next_id);
        self.nodes.insert(
            id,
            HostNode {
                tag: tag.to_owned(),
                ..HostNode::default()
            },
        );
        id
    }

    fn node(&self, id: NodeId) -> Result<&HostNode, HostError> {
        self.nodes.get(&id).ok_or(HostError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut HostNode, HostError> {
        self.nodes.get_mut(&id).ok_or(HostError::UnknownNode(id))
    }

    fn detach(&mut self, child: NodeId) -> Result<(), HostError> {
        if let Some(parent) = self.node(child)?.parent {
            self.node_mut(parent)?.children.retain(|c| *c != child);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    // =========================================================================
    // OPERATION LOG
    // =========================================================================

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Take the recorded operations, leaving the log empty.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.tag.as_str())
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.text.as_str())
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(&node).map_or(&[], |n| n.children.as_slice())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn property(&self, node: NodeId, key: &str) -> Option<&PropValue> {
        self.nodes.get(&node)?.properties.get(key)
    }

    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.nodes
            .get(&node)
            .and_then(|n| n.listeners.get(event))
            .map_or(0, Vec::len)
    }

    /// Serialize a subtree as markup, properties in key order. Listeners are
    /// not rendered.
    ///
    /// ```
    /// use spark_vdom::{HostAdapter, MemoryHost};
    ///
    /// let mut host = MemoryHost::new();
    /// let root = host.create_root("body");
    /// let p = host.create_node("p").unwrap();
    /// host.set_property(p, "class", &"lead".into()).unwrap();
    /// host.set_text(p, "hi").unwrap();
    /// host.append_child(root, p).unwrap();
    ///
    /// assert_eq!(host.to_markup(root), r#"<body><p class="lead">hi</p></body>"#);
    /// ```
    pub fn to_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(&node) else {
            return;
        };
        let _ = write!(out, "<{}", n.tag);
        let mut properties: Vec<_> = n.properties.iter().collect();
        properties.sort_unstable_by(|a, b| a.0.cmp(b.0));
        for (key, value) in properties {
            let _ = write!(out, " {key}=\"{value}\"");
        }
        out.push('>');
        out.push_str(&n.text);
        for child in &n.children {
            self.write_markup(*child, out);
        }
        let _ = write!(out, "</{}>", n.tag);
    }
}

// =============================================================================
// ADAPTER
// =============================================================================

impl HostAdapter for MemoryHost {
    fn create_node(&mut self, tag: &str) -> Result<NodeId, HostError> {
        let node = self.alloc(tag);
        self.ops.push(HostOp::CreateNode {
            node,
            tag: tag.to_owned(),
        });
        Ok(node)
    }

    fn set_property(
        &mut self,
        node: NodeId,
        key: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        self.node_mut(node)?
            .properties
            .insert(key.to_owned(), value.clone());
        self.ops.push(HostOp::SetProperty {
            node,
            key: key.to_owned(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_property(&mut self, node: NodeId, key: &str) -> Result<(), HostError> {
        self.node_mut(node)?.properties.shift_remove(key);
        self.ops.push(HostOp::RemoveProperty {
            node,
            key: key.to_owned(),
        });
        Ok(())
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), HostError> {
        text.clone_into(&mut self.node_mut(node)?.text);
        self.ops.push(HostOp::SetText {
            node,
            text: text.to_owned(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        self.node(parent)?;
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.ops.push(HostOp::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        if self.node(child)?.parent != Some(parent) {
            return Err(HostError::NotAChild { parent, child });
        }
        self.detach(child)?;
        self.ops.push(HostOp::RemoveChild { parent, child });
        Ok(())
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), HostError> {
        let not_a_child = HostError::NotAChild {
            parent,
            child: old_child,
        };
        if !self.node(parent)?.children.contains(&old_child) {
            return Err(not_a_child);
        }
        self.node(new_child)?;
        // Already in place
        if new_child == old_child {
            return Ok(());
        }

        self.detach(new_child)?;
        // Detaching may have shifted siblings if new_child was one of them
        let slot = self
            .node_mut(parent)?
            .children
            .iter_mut()
            .find(|c| **c == old_child)
            .ok_or(not_a_child)?;
        *slot = new_child;
        self.node_mut(new_child)?.parent = Some(parent);
        self.node_mut(old_child)?.parent = None;
        self.ops.push(HostOp::ReplaceChild {
            parent,
            new_child,
            old_child,
        });
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), HostError> {
        self.node_mut(node)?
            .listeners
            .entry(event.to_owned())
            .or_default()
            .push(handler);
        self.ops.push(HostOp::AddEventListener {
            node,
            event: event.to_owned(),
        });
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        let listeners = self.node_mut(node)?.listeners.get_mut(event);
        let removed = listeners.and_then(|list| {
            let index = list.iter().position(|h| h.ptr_eq(handler))?;
            Some(list.remove(index))
        });
        if removed.is_none() {
            return Err(HostError::ListenerNotFound {
                node,
                event: event.to_owned(),
            });
        }
        self.ops.push(HostOp::RemoveEventListener {
            node,
            event: event.to_owned(),
        });
        Ok(())
    }
}

impl EventDispatch for MemoryHost {
    fn listeners(&self, node: NodeId, event: &str) -> Vec<EventHandler> {
        self.nodes
            .get(&node)
            .and_then(|n| n.listeners.get(event))
            .cloned()
            .unwrap_or_default()
    }
}

// =============================================================================
// TESTS
// =============================================================================
