// ============================================================================
// spark-vdom - Patch
// Positional reconciliation between two tree descriptions
// ============================================================================
//
// Children are matched by index only. Lists that reorder or insert in the
// middle are patched position by position, which is correct but not minimal.
// ============================================================================

use crate::core::error::Result;
use crate::core::types::NodeId;
use crate::vdom::{Children, Props, VNode};

use super::host::HostAdapter;
use super::mount::{host_node, Renderer};

impl<H: HostAdapter + ?Sized> Renderer<'_, H> {
    /// Bring the host subtree realized from `prev` in line with `next`.
    ///
    /// `prev` must be mounted under `parent`. On success `next` carries the
    /// host nodes and becomes the description to diff against next time.
    pub fn reconcile(&mut self, prev: &VNode, next: &mut VNode, parent: NodeId) -> Result<()> {
        let el = host_node(prev)?;

        if prev.tag != next.tag {
            tracing::debug!(from = %prev.tag, to = %next.tag, node = %el, "tag changed; replacing subtree");
            let fresh = self.create(next)?;
            self.host.replace_child(parent, fresh, el)?;
            self.teardown(prev)?;
            return Ok(());
        }

        next.el = Some(el);
        self.patch_props(el, &prev.props, &next.props)?;
        self.patch_children(el, &prev.children, &mut next.children)
    }

    fn patch_props(&mut self, el: NodeId, prev: &Props, next: &Props) -> Result<()> {
        for (key, value) in next {
            match prev.get(key) {
                Some(old) if old == value => {}
                Some(old) => {
                    // Listeners are replaced, never stacked
                    if self.is_listener(key, old) || self.is_listener(key, value) {
                        self.retract_prop(el, key, old)?;
                    }
                    self.apply_prop(el, key, value)?;
                }
                None => self.apply_prop(el, key, value)?,
            }
        }

        for (key, old) in prev {
            if !next.contains_key(key) {
                self.retract_prop(el, key, old)?;
            }
        }
        Ok(())
    }

    fn patch_children(&mut self, el: NodeId, prev: &Children, next: &mut Children) -> Result<()> {
        match (prev, next) {
            (Children::Text(old), Children::Text(new)) => {
                if old != new {
                    self.host.set_text(el, new)?;
                }
            }
            (Children::Nodes(old), Children::Text(new)) => {
                for child in old {
                    self.host.remove_child(el, host_node(child)?)?;
                    self.teardown(child)?;
                }
                self.host.set_text(el, new)?;
            }
            (Children::Text(_), Children::Nodes(new)) => {
                self.host.set_text(el, "")?;
                for child in new {
                    self.mount(child, el)?;
                }
            }
            (Children::Nodes(old), Children::Nodes(new)) => {
                let common = old.len().min(new.len());

                for (prev_child, next_child) in old.iter().zip(new.iter_mut()) {
                    self.reconcile(prev_child, next_child, el)?;
                }
                for child in &mut new[common..] {
                    self.mount(child, el)?;
                }
                for child in &old[common..] {
                    self.host.remove_child(el, host_node(child)?)?;
                    self.teardown(child)?;
                }

                if old.len() != new.len() {
                    tracing::trace!(node = %el, from = old.len(), to = new.len(), "child count changed");
                }
            }
        }
        Ok(())
    }
}

/// Reconcile `prev` into `next` under `parent` using the current configuration.
///
/// # Example
///
/// ```
/// use spark_vdom::{h, mount, props, reconcile, MemoryHost};
///
/// let mut host = MemoryHost::new();
/// let root = host.create_root("body");
///
/// let mut prev = h("p", props!(), "0");
/// mount(&mut host, &mut prev, root).unwrap();
/// host.clear_ops();
///
/// let mut next = h("p", props!(), "1");
/// reconcile(&mut host, &prev, &mut next, root).unwrap();
///
/// assert_eq!(host.ops().len(), 1);
/// assert_eq!(next.el(), prev.el());
/// ```
pub fn reconcile<H: HostAdapter + ?Sized>(
    host: &mut H,
    prev: &VNode,
    next: &mut VNode,
    parent: NodeId,
) -> Result<()> {
    Renderer::new(host).reconcile(prev, next, parent)
}

// =============================================================================
// TESTS
// =============================================================================
