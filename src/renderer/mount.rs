// ============================================================================
// spark-vdom - Mount
// Full construction and teardown of host subtrees
// ============================================================================

use crate::core::config::{current_config, RuntimeConfig};
use crate::core::error::{RenderError, Result};
use crate::core::types::NodeId;
use crate::vdom::{Children, EventHandler, PropValue, VNode};

use super::host::HostAdapter;

// =============================================================================
// RENDERER
// =============================================================================

/// Drives a host adapter from tree descriptions.
///
/// Holds the host for the duration of one render pass together with the
/// configuration that decides which property keys are event keys.
pub struct Renderer<'h, H: HostAdapter + ?Sized> {
    pub(crate) host: &'h mut H,
    pub(crate) config: RuntimeConfig,
}

impl<'h, H: HostAdapter + ?Sized> Renderer<'h, H> {
    /// Renderer using the current thread's runtime configuration.
    pub fn new(host: &'h mut H) -> Self {
        Self::with_config(host, current_config())
    }

    pub fn with_config(host: &'h mut H, config: RuntimeConfig) -> Self {
        Self { host, config }
    }

    pub fn host(&self) -> &H {
        &*self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut *self.host
    }

    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    /// Construct `vnode` and its whole subtree, then append it to `container`.
    pub fn mount(&mut self, vnode: &mut VNode, container: NodeId) -> Result<NodeId> {
        let el = self.create(vnode)?;
        self.host.append_child(container, el)?;
        tracing::debug!(tag = %vnode.tag, node = %el, container = %container, "mounted");
        Ok(el)
    }

    /// Construct `vnode` and its subtree without attaching the root anywhere.
    ///
    /// Children are attached to their parent before the parent is attached,
    /// so a subtree lands in the host tree with a single append.
    pub fn create(&mut self, vnode: &mut VNode) -> Result<NodeId> {
        let el = self.host.create_node(&vnode.tag)?;
        vnode.el = Some(el);

        for (key, value) in &vnode.props {
            self.apply_prop(el, key, value)?;
        }

        match &mut vnode.children {
            Children::Text(text) => self.host.set_text(el, text)?,
            Children::Nodes(children) => {
                for child in children {
                    self.mount(child, el)?;
                }
            }
        }

        Ok(el)
    }

    // =========================================================================
    // TEARDOWN
    // =========================================================================

    /// Detach `vnode` from `container` and remove every listener in its
    /// subtree. The description forgets its host nodes.
    pub fn unmount(&mut self, vnode: &mut VNode, container: NodeId) -> Result<()> {
        let el = host_node(vnode)?;
        self.host.remove_child(container, el)?;
        self.teardown(vnode)?;
        forget(vnode);
        tracing::debug!(tag = %vnode.tag, node = %el, container = %container, "unmounted");
        Ok(())
    }

    /// Remove the listeners registered for `vnode` and its descendants.
    ///
    /// Nodes that were never realized are skipped.
    pub fn teardown(&mut self, vnode: &VNode) -> Result<()> {
        let Some(el) = vnode.el else {
            return Ok(());
        };

        for (key, value) in &vnode.props {
            if let Some((event, handler)) = listener(&self.config, key, value) {
                self.host.remove_event_listener(el, &event, handler)?;
            }
        }

        if let Children::Nodes(children) = &vnode.children {
            for child in children {
                self.teardown(child)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // PROPERTIES
    // =========================================================================

    /// Set a property, or register a listener for event keys holding a handler.
    pub(crate) fn apply_prop(&mut self, el: NodeId, key: &str, value: &PropValue) -> Result<()> {
        match listener(&self.config, key, value) {
            Some((event, handler)) => self.host.add_event_listener(el, &event, handler.clone())?,
            None => self.host.set_property(el, key, value)?,
        }
        Ok(())
    }

    /// Undo `apply_prop` for a value that was previously applied.
    pub(crate) fn retract_prop(&mut self, el: NodeId, key: &str, value: &PropValue) -> Result<()> {
        match listener(&self.config, key, value) {
            Some((event, handler)) => self.host.remove_event_listener(el, &event, handler)?,
            None => self.host.remove_property(el, key)?,
        }
        Ok(())
    }

    /// Whether `value` under `key` is routed to a listener.
    pub(crate) fn is_listener(&self, key: &str, value: &PropValue) -> bool {
        listener(&self.config, key, value).is_some()
    }
}

/// Event name and handler when `key` is an event key holding a handler.
/// Event keys with any other value are plain properties.
fn listener<'v>(
    config: &RuntimeConfig,
    key: &str,
    value: &'v PropValue,
) -> Option<(String, &'v EventHandler)> {
    let handler = value.as_handler()?;
    let event = config.event_name(key)?;
    Some((event, handler))
}

pub(crate) fn host_node(vnode: &VNode) -> Result<NodeId> {
    vnode.el.ok_or_else(|| RenderError::NotMounted {
        tag: vnode.tag.clone(),
    })
}

fn forget(vnode: &mut VNode) {
    vnode.el = None;
    if let Children::Nodes(children) = &mut vnode.children {
        children.iter_mut().for_each(forget);
    }
}

// =============================================================================
// FREE FUNCTIONS
// =============================================================================

/// Fully construct `vnode` into `container`.
pub fn mount<H: HostAdapter + ?Sized>(
    host: &mut H,
    vnode: &mut VNode,
    container: NodeId,
) -> Result<NodeId> {
    Renderer::new(host).mount(vnode, container)
}

/// Remove a mounted `vnode` from `container`.
pub fn unmount<H: HostAdapter + ?Sized>(
    host: &mut H,
    vnode: &mut VNode,
    container: NodeId,
) -> Result<()> {
    Renderer::new(host).unmount(vnode, container)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::memory::{HostOp, MemoryHost};
    use crate::vdom::{h, Props};

    fn props(pairs: &[(&str, PropValue)]) -> Props {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn mount_builds_subtree_before_attaching() {
        let mut host = MemoryHost::new();
        let root = host.create_root("body");
        let mut tree = h(
            "div",
            props(&[("id", "app".into())]),
            vec![h("p", Props::new(), "hi")],
        );

        let el = mount(&mut host, &mut tree, root).unwrap();

        let p = tree.children.as_nodes().unwrap()[0].el().unwrap();
        assert_eq!(tree.el(), Some(el));
        assert_eq!(
            host.take_ops(),
            vec![
                HostOp::CreateNode { node: el, tag: "div".into() },
                HostOp::SetProperty { node: el, key: "id".into(), value: "app".into() },
                HostOp::CreateNode { node: p, tag: "p".into() },
                HostOp::SetText { node: p, text: "hi".into() },
                HostOp::AppendChild { parent: el, child: p },
                HostOp::AppendChild { parent: root, child: el },
            ]
        );
        assert_eq!(host.to_markup(root), r#"<body><div id="app"><p>hi</p></div></body>"#);
    }

    #[test]
    fn event_keys_become_listeners() {
        let mut host = MemoryHost::new();
        let root = host.create_root("body");
        let mut tree = h(
            "button",
            props(&[
                ("onClick", PropValue::handler(|_| {})),
                ("online", "yes".into()),
                ("onHover", "not a handler".into()),
            ]),
            "go",
        );

        let el = mount(&mut host, &mut tree, root).unwrap();

        assert_eq!(host.listener_count(el, "click"), 1);
        assert_eq!(host.property(el, "onClick"), None);
        assert_eq!(host.property(el, "online"), Some(&PropValue::from("yes")));
        assert_eq!(host.property(el, "onHover"), Some(&PropValue::from("not a handler")));
    }

    #[test]
    fn unmount_detaches_and_removes_listeners() {
        let mut host = MemoryHost::new();
        let root = host.create_root("body");
        let mut tree = h(
            "ul",
            Props::new(),
            vec![h("li", props(&[("onClick", PropValue::handler(|_| {}))]), "a")],
        );
        mount(&mut host, &mut tree, root).unwrap();
        let li = tree.children.as_nodes().unwrap()[0].el().unwrap();

        unmount(&mut host, &mut tree, root).unwrap();

        assert!(host.children(root).is_empty());
        assert_eq!(host.listener_count(li, "click"), 0);
        assert!(!tree.is_mounted());
        assert!(!tree.children.as_nodes().unwrap()[0].is_mounted());
    }

    #[test]
    fn unmount_requires_mounted_tree() {
        let mut host = MemoryHost::new();
        let root = host.create_root("body");
        let mut tree = h("div", Props::new(), ());

        assert_eq!(
            unmount(&mut host, &mut tree, root),
            Err(RenderError::NotMounted { tag: "div".into() })
        );
    }

    #[test]
    fn custom_prefix() {
        let mut host = MemoryHost::new();
        let root = host.create_root("body");
        let config = RuntimeConfig::new().with_event_prefix("on:");
        let mut tree = h("a", props(&[("on:Press", PropValue::handler(|_| {}))]), ());

        let el = Renderer::with_config(&mut host, config).mount(&mut tree, root).unwrap();
        assert_eq!(host.listener_count(el, "press"), 1);
    }
}
