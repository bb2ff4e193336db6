// ============================================================================
// spark-vdom - Tree Description
// One node of a render pass: tag, properties, children
// ============================================================================

use crate::core::types::NodeId;

use super::props::{PropValue, Props};

// =============================================================================
// CHILDREN
// =============================================================================

/// Children of a node: a single text payload or a sequence of nodes, never
/// both.
#[derive(Debug, Clone, PartialEq)]
pub enum Children {
    Text(String),
    Nodes(Vec<VNode>),
}

impl Children {
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Nodes(_) => None,
        }
    }

    pub fn as_nodes(&self) -> Option<&[VNode]> {
        match self {
            Self::Nodes(nodes) => Some(nodes),
            Self::Text(_) => None,
        }
    }
}

impl Default for Children {
    fn default() -> Self {
        Self::Nodes(Vec::new())
    }
}

impl From<&str> for Children {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Children {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<VNode>> for Children {
    fn from(nodes: Vec<VNode>) -> Self {
        Self::Nodes(nodes)
    }
}

impl<const N: usize> From<[VNode; N]> for Children {
    fn from(nodes: [VNode; N]) -> Self {
        Self::Nodes(nodes.into())
    }
}

impl From<()> for Children {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

// =============================================================================
// VNODE
// =============================================================================

/// A tree description node.
///
/// Built fresh every render. `el` is filled in by the renderer when the node
/// is realized in the host tree and carried forward by reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct VNode {
    pub tag: String,
    pub props: Props,
    pub children: Children,
    pub(crate) el: Option<NodeId>,
}

impl VNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            props: Props::new(),
            children: Children::default(),
            el: None,
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: impl Into<Children>) -> Self {
        self.children = children.into();
        self
    }

    /// Host node this description is realized as, if mounted
    pub fn el(&self) -> Option<NodeId> {
        self.el
    }

    pub fn is_mounted(&self) -> bool {
        self.el.is_some()
    }

    /// Number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + match &self.children {
            Children::Text(_) => 0,
            Children::Nodes(nodes) => nodes.iter().map(VNode::node_count).sum(),
        }
    }
}

/// Build a tree description node.
///
/// # Example
///
/// ```
/// use spark_vdom::{h, props, Children};
///
/// let node = h("div", props! { "id" => "app" }, vec![h("p", props!(), "hello")]);
/// assert_eq!(node.tag, "div");
/// assert_eq!(node.children.as_nodes().map(|c| c.len()), Some(1));
/// ```
pub fn h(tag: impl Into<String>, props: Props, children: impl Into<Children>) -> VNode {
    VNode {
        tag: tag.into(),
        props,
        children: children.into(),
        el: None,
    }
}
