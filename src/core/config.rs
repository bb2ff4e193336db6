// ============================================================================
// spark-vdom - Runtime Configuration
// Per-thread knobs for the reactive runtime and the renderer
// ============================================================================

use std::borrow::Cow;

use super::constants::{DEFAULT_EVENT_PREFIX, DEFAULT_MAX_UPDATE_DEPTH};
use super::context::with_context;

/// Runtime configuration, stored in the thread-local reactive context.
///
/// # Example
///
/// ```
/// use spark_vdom::{configure, current_config, RuntimeConfig};
///
/// configure(RuntimeConfig::default().with_max_update_depth(16));
/// assert_eq!(current_config().max_update_depth, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Bound on nested effect runs, and on the number of passes a single
    /// self-invalidating effect may take before giving up.
    pub max_update_depth: u32,

    /// Property prefix routed to event listeners instead of properties.
    pub event_prefix: Cow<'static, str>,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self {
            max_update_depth: DEFAULT_MAX_UPDATE_DEPTH,
            event_prefix: Cow::Borrowed(DEFAULT_EVENT_PREFIX),
        }
    }

    /// Set the update depth bound. Zero is clamped to one.
    pub fn with_max_update_depth(mut self, depth: u32) -> Self {
        self.max_update_depth = depth.max(1);
        self
    }

    pub fn with_event_prefix(mut self, prefix: impl Into<Cow<'static, str>>) -> Self {
        self.event_prefix = prefix.into();
        self
    }

    /// Resolve a property key to an event name, if it is an event key.
    ///
    /// A key is an event key when it starts with the prefix and the next
    /// character is not a lowercase ASCII letter, so `onClick` and `on-tap`
    /// route to listeners while `online` stays a plain property.
    pub fn event_name(&self, key: &str) -> Option<String> {
        let rest = key.strip_prefix(self.event_prefix.as_ref())?;
        let first = rest.chars().next()?;
        if first.is_ascii_lowercase() {
            return None;
        }
        let name = rest.trim_start_matches(['-', '_', ':']);
        if name.is_empty() {
            return None;
        }
        Some(name.to_lowercase())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace the runtime configuration for the current thread.
pub fn configure(config: RuntimeConfig) {
    tracing::debug!(
        max_update_depth = config.max_update_depth,
        event_prefix = %config.event_prefix,
        "runtime configured"
    );
    with_context(|ctx| ctx.set_config(config));
}

/// Snapshot of the current thread's runtime configuration.
pub fn current_config() -> RuntimeConfig {
    with_context(|ctx| ctx.config())
}

/// Run `f` with `config` installed, restoring the previous configuration after.
pub fn with_config<T>(config: RuntimeConfig, f: impl FnOnce() -> T) -> T {
    struct Restore(Option<RuntimeConfig>);

    impl Drop for Restore {
        fn drop(&mut self) {
            if let Some(previous) = self.0.take() {
                with_context(|ctx| ctx.set_config(previous));
            }
        }
    }

    let previous = with_context(|ctx| ctx.set_config(config));
    let _restore = Restore(Some(previous));
    f()
}
