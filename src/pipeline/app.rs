// ============================================================================
// spark-vdom - Application Mount
// First render constructs, later renders reconcile, all inside one effect
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::constants::RENDER_EFFECT;
use crate::core::error::{RenderError, Result};
use crate::core::types::NodeId;
use crate::primitives::effect::{spawn_effect, Effect, EffectFn};
use crate::renderer::{EventDispatch, HostAdapter, Renderer};
use crate::vdom::{Event, VNode};

// =============================================================================
// COMPONENT
// =============================================================================

/// Something that produces a fresh tree description on every render.
///
/// Reactive reads made while rendering decide when the application
/// re-renders.
pub trait Component {
    fn render(&self) -> VNode;
}

impl<F> Component for F
where
    F: Fn() -> VNode,
{
    fn render(&self) -> VNode {
        self()
    }
}

// =============================================================================
// STATE
// =============================================================================

struct AppState<H> {
    host: H,
    container: NodeId,
    previous: Option<VNode>,
    is_mounted: bool,
    last_error: Option<RenderError>,
    renders: u64,
}

impl<H: HostAdapter> AppState<H> {
    fn commit(&mut self, mut next: VNode) {
        let result = {
            let mut renderer = Renderer::new(&mut self.host);
            match self.previous.as_ref() {
                Some(prev) if self.is_mounted => renderer.reconcile(prev, &mut next, self.container),
                _ => renderer.mount(&mut next, self.container).map(|_| ()),
            }
        };

        match result {
            Ok(()) => {
                self.renders += 1;
                tracing::debug!(
                    render = self.renders,
                    root = ?next.el(),
                    first = !self.is_mounted,
                    "render committed"
                );
                self.previous = Some(next);
                self.is_mounted = true;
            }
            Err(err) => {
                // Keep the last good tree so the next render diffs against it
                tracing::error!(error = %err, "render failed");
                self.last_error = Some(err);
            }
        }
    }
}

// =============================================================================
// APP
// =============================================================================

/// A mounted application.
///
/// Owns the host and the render effect. Dropping the `App` stops rendering
/// but leaves the host tree as it is; use [`App::unmount`] to take it down.
pub struct App<H: HostAdapter + 'static> {
    state: Rc<RefCell<AppState<H>>>,
    effect: Effect,
}

/// Mount `component` into `container` and keep it in sync with the reactive
/// state it reads.
///
/// The first render fully constructs the tree. Every later render is
/// triggered by a write to a field the previous render read, and is
/// reconciled against the previous description.
///
/// # Errors
///
/// Returns the first render's error if the initial mount fails. The host has
/// been moved into the application by then and is dropped with it, along with
/// any partial tree it holds. To inspect a host after a failed mount, drive it
/// with [`Renderer`](crate::renderer::Renderer) directly.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use spark_vdom::{h, mount_application, props, reactive, MemoryHost};
///
/// let state = reactive(HashMap::from([("count".to_string(), 0)]));
/// let mut host = MemoryHost::new();
/// let root = host.create_root("body");
///
/// let app = mount_application(
///     {
///         let state = state.clone();
///         move || h("p", props!(), state.get("count").unwrap_or_default().to_string())
///     },
///     host,
///     root,
/// )
/// .unwrap();
///
/// state.set("count", 1).unwrap();
/// assert_eq!(app.with_host(|host| host.to_markup(root)), "<body><p>1</p></body>");
/// ```
pub fn mount_application<C, H>(component: C, host: H, container: NodeId) -> Result<App<H>>
where
    C: Component + 'static,
    H: HostAdapter + 'static,
{
    let state = Rc::new(RefCell::new(AppState {
        host,
        container,
        previous: None,
        is_mounted: false,
        last_error: None,
        renders: 0,
    }));

    let render: EffectFn = {
        let state = state.clone();
        Box::new(move || {
            // Rendering runs user code; the state is only borrowed to commit
            let next = component.render();
            state.borrow_mut().commit(next);
        })
    };
    let effect = spawn_effect(RENDER_EFFECT, render)?;

    {
        let mut state = state.borrow_mut();
        if !state.is_mounted {
            let err = state.last_error.take().unwrap_or(RenderError::NotMounted {
                tag: String::from("root"),
            });
            return Err(err);
        }
    }

    tracing::debug!(container = %container, effect = effect.id().as_u64(), "application mounted");
    Ok(App { state, effect })
}

impl<H: HostAdapter + 'static> App<H> {
    /// Borrow the host. Do not call back into the app from `f`.
    pub fn with_host<T>(&self, f: impl FnOnce(&H) -> T) -> T {
        f(&self.state.borrow().host)
    }

    /// Mutably borrow the host, e.g. to clear a recorded operation log.
    pub fn with_host_mut<T>(&self, f: impl FnOnce(&mut H) -> T) -> T {
        f(&mut self.state.borrow_mut().host)
    }

    pub fn container(&self) -> NodeId {
        self.state.borrow().container
    }

    /// Host node of the current root description
    pub fn root_node(&self) -> Option<NodeId> {
        self.state.borrow().previous.as_ref().and_then(VNode::el)
    }

    pub fn is_mounted(&self) -> bool {
        self.state.borrow().is_mounted
    }

    /// Number of successfully committed renders, including the first mount
    pub fn render_count(&self) -> u64 {
        self.state.borrow().renders
    }

    /// Take the error of the most recent failed render, if any.
    pub fn take_error(&self) -> Option<RenderError> {
        self.state.borrow_mut().last_error.take()
    }

    /// Render again now, without waiting for a write.
    pub fn rerender(&self) -> Result<()> {
        self.effect.run()?;
        match self.take_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Tear the application down and give the host back.
    ///
    /// Stops the render effect, detaches the root from the container and
    /// removes every listener the tree registered.
    pub fn unmount(self) -> Result<H> {
        let App { state, effect } = self;
        effect.dispose();
        drop(effect);

        let mut state = Rc::try_unwrap(state)
            .map_err(|_| RenderError::StillRendering)?
            .into_inner();

        if let Some(mut root) = state.previous.take() {
            Renderer::new(&mut state.host).unmount(&mut root, state.container)?;
        }
        state.is_mounted = false;
        tracing::debug!(container = %state.container, "application unmounted");
        Ok(state.host)
    }
}

impl<H: HostAdapter + EventDispatch + 'static> App<H> {
    /// Deliver `event` to the listeners registered on `node`.
    ///
    /// Listeners run after the host borrow is released, so they are free to
    /// write reactive state and trigger a re-render. Returns how many
    /// listeners ran.
    pub fn dispatch(&self, node: NodeId, event: &str) -> usize {
        let listeners = self.state.borrow().host.listeners(node, event);
        let payload = Event {
            name: event.to_owned(),
            target: node,
        };

        tracing::trace!(node = %node, event, listeners = listeners.len(), "dispatching");
        for listener in &listeners {
            listener.call(&payload);
        }
        listeners.len()
    }
}

impl<H: HostAdapter + 'static> fmt::Debug for App<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("App")
            .field("container", &state.container)
            .field("is_mounted", &state.is_mounted)
            .field("renders", &state.renders)
            .field("effect", &self.effect.id())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::HostError;
    use crate::primitives::reactive::{reactive, Reactive};
    use crate::renderer::{HostOp, MemoryHost};
    use crate::vdom::{h, PropValue, Props};
    use std::collections::HashMap;

    type State = Reactive<HashMap<String, i64>>;

    fn state(count: i64) -> State {
        reactive(HashMap::from([("count".to_string(), count)]))
    }

    fn counter(state: State) -> impl Fn() -> VNode {
        move || {
            let count = state.get("count").unwrap_or_default();
            h("p", Props::new(), count.to_string())
        }
    }

    #[test]
    fn first_render_mounts() {
        let s = state(0);
        let mut host = MemoryHost::new();
        let root = host.create_root("body");

        let app = mount_application(counter(s.clone()), host, root).unwrap();

        assert!(app.is_mounted());
        assert_eq!(app.render_count(), 1);
        assert_eq!(app.with_host(|h| h.to_markup(root)), "<body><p>0</p></body>");
    }

    #[test]
    fn write_reconciles_with_single_text_update() {
        let s = state(0);
        let mut host = MemoryHost::new();
        let root = host.create_root("body");
        let app = mount_application(counter(s.clone()), host, root).unwrap();
        let p = app.root_node().unwrap();
        app.with_host_mut(MemoryHost::clear_ops);

        s.set("count", 1).unwrap();

        assert_eq!(
            app.with_host_mut(MemoryHost::take_ops),
            vec![HostOp::SetText { node: p, text: "1".into() }]
        );
        assert_eq!(app.root_node(), Some(p));
        assert_eq!(app.render_count(), 2);
    }

    #[test]
    fn dispatch_runs_listeners_that_write_state() {
        let s = state(0);
        let mut host = MemoryHost::new();
        let root = host.create_root("body");
        let app = mount_application(
            {
                let s = s.clone();
                move || {
                    let count = s.get("count").unwrap_or_default();
                    let click = PropValue::handler({
                        let s = s.clone();
                        move |_| {
                            let _ = s.update("count", |v| v.copied().unwrap_or_default() + 1);
                        }
                    });
                    let props: Props = [("onClick".to_string(), click)].into_iter().collect();
                    h("button", props, count.to_string())
                }
            },
            host,
            root,
        )
        .unwrap();
        let button = app.root_node().unwrap();

        assert_eq!(app.dispatch(button, "click"), 1);
        assert_eq!(app.dispatch(button, "click"), 1);

        assert_eq!(s.peek("count"), Some(2));
        // Handlers are fresh closures each render, so the listener is swapped
        assert_eq!(app.with_host(|h| h.listener_count(button, "click")), 1);
        assert_eq!(app.with_host(|h| h.text(button).map(str::to_owned)), Some("2".into()));
    }

    #[test]
    fn unmount_returns_host_and_stops_rendering() {
        let s = state(0);
        let mut host = MemoryHost::new();
        let root = host.create_root("body");
        let app = mount_application(counter(s.clone()), host, root).unwrap();

        let host = app.unmount().unwrap();
        assert!(host.children(root).is_empty());

        s.set("count", 5).unwrap();
        assert!(host.children(root).is_empty());
    }

    struct FailingHost(MemoryHost);

    impl HostAdapter for FailingHost {
        fn create_node(&mut self, tag: &str) -> std::result::Result<NodeId, HostError> {
            if tag == "broken" {
                return Err(HostError::Host("cannot create <broken>".into()));
            }
            self.0.create_node(tag)
        }
        fn set_property(&mut self, node: NodeId, key: &str, value: &PropValue) -> std::result::Result<(), HostError> {
            self.0.set_property(node, key, value)
        }
        fn remove_property(&mut self, node: NodeId, key: &str) -> std::result::Result<(), HostError> {
            self.0.remove_property(node, key)
        }
        fn set_text(&mut self, node: NodeId, text: &str) -> std::result::Result<(), HostError> {
            self.0.set_text(node, text)
        }
        fn append_child(&mut self, parent: NodeId, child: NodeId) -> std::result::Result<(), HostError> {
            self.0.append_child(parent, child)
        }
        fn remove_child(&mut self, parent: NodeId, child: NodeId) -> std::result::Result<(), HostError> {
            self.0.remove_child(parent, child)
        }
        fn replace_child(&mut self, parent: NodeId, new_child: NodeId, old_child: NodeId) -> std::result::Result<(), HostError> {
            self.0.replace_child(parent, new_child, old_child)
        }
        fn add_event_listener(&mut self, node: NodeId, event: &str, handler: crate::vdom::EventHandler) -> std::result::Result<(), HostError> {
            self.0.add_event_listener(node, event, handler)
        }
        fn remove_event_listener(&mut self, node: NodeId, event: &str, handler: &crate::vdom::EventHandler) -> std::result::Result<(), HostError> {
            self.0.remove_event_listener(node, event, handler)
        }
    }

    fn tagged(state: State) -> impl Fn() -> VNode {
        move || match state.get("count").unwrap_or_default() {
            1 => h("broken", Props::new(), ()),
            n => h("p", Props::new(), n.to_string()),
        }
    }

    #[test]
    fn first_mount_error_is_returned() {
        let s = state(1);
        let mut inner = MemoryHost::new();
        let root = inner.create_root("body");

        let err = mount_application(tagged(s.clone()), FailingHost(inner), root).unwrap_err();
        assert_eq!(err, RenderError::Host(HostError::Host("cannot create <broken>".into())));
    }

    #[test]
    fn failed_first_mount_releases_application() {
        let s = state(1);
        let mut inner = MemoryHost::new();
        let root = inner.create_root("body");
        let marker = Rc::new(());

        let view = {
            let marker = marker.clone();
            let render = tagged(s.clone());
            move || {
                let _ = &marker;
                render()
            }
        };
        assert!(mount_application(view, FailingHost(inner), root).is_err());

        // The render closure, its state, and the host are gone
        assert_eq!(Rc::strong_count(&marker), 1);
        assert_eq!(crate::reactivity::registry::subscriber_count(s.id(), "count"), 0);
    }

    #[test]
    fn later_error_keeps_last_good_tree() {
        let s = state(0);
        let mut inner = MemoryHost::new();
        let root = inner.create_root("body");
        let app = mount_application(tagged(s.clone()), FailingHost(inner), root).unwrap();

        s.set("count", 1).unwrap();
        assert!(matches!(app.take_error(), Some(RenderError::Host(_))));
        assert_eq!(app.render_count(), 1);

        s.set("count", 2).unwrap();
        assert_eq!(app.take_error(), None);
        assert_eq!(app.with_host(|h| h.0.to_markup(root)), "<body><p>2</p></body>");
    }
}
