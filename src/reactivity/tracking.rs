// ============================================================================
// spark-vdom - Dependency Tracking
// Recording reads against the active effect and notifying on writes
// ============================================================================
//
// Borrow scoping matters here: subscribers are collected out of the registry
// first, and only then run, so an effect may freely read and write reactive
// data (and therefore touch the registry) while we iterate.
// ============================================================================

use std::rc::Rc;

use crate::core::context::{settle_chain, with_context};
use crate::core::error::ReactiveError;
use crate::core::types::{DepKey, TargetId};
use crate::primitives::effect::{run_effect, EffectInner};

// =============================================================================
// TRACK READ - Register dependency when reading a field
// =============================================================================

/// Track a read of `(target, field)`, subscribing the innermost running
/// effect. Reads outside any effect, or inside `untrack`, record nothing.
pub fn track_read(target: TargetId, field: &str) {
    with_context(|ctx| {
        if ctx.is_untracking() {
            return;
        }
        let Some(effect) = ctx.active_effect() else {
            return;
        };

        let key = DepKey::new(target, field);
        if effect.record_dep(key.clone()) {
            let added = ctx.registry.borrow_mut().subscribe(&key, &effect);
            if added {
                tracing::trace!(effect = effect.id().as_u64(), dep = %key, "subscribed");
            }
        }
    });
}

// =============================================================================
// NOTIFY WRITE - Run every subscriber of a written field
// =============================================================================

/// Notify the subscribers of `(target, field)` that it was written.
///
/// Every current subscriber runs to completion, in registration order, before
/// this returns. An effect that is itself running is re-run after its current
/// pass instead of being re-entered.
///
/// Returns `MaxUpdateDepth` if the chain of runs this write set off exceeded
/// the configured bound.
pub fn notify_write(target: TargetId, field: &str) -> Result<(), ReactiveError> {
    // BORROW SAFETY: collect first, the registry borrow ends here
    let subscribers: Vec<Rc<EffectInner>> =
        with_context(|ctx| ctx.registry.borrow_mut().subscribers(target, field));

    if !subscribers.is_empty() {
        tracing::debug!(
            target = target.as_u64(),
            field,
            subscribers = subscribers.len(),
            "notifying"
        );
    }

    for effect in subscribers {
        if with_context(|ctx| ctx.has_pending_error()) {
            break;
        }
        run_effect(&effect);
    }

    settle_chain()
}

// =============================================================================
// UNTRACK
// =============================================================================

/// Run `f` without recording any reads as dependencies.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use spark_vdom::{reactive, untrack, watch_effect};
///
/// let state = reactive(HashMap::from([("a".to_string(), 1)]));
/// let effect = watch_effect({
///     let state = state.clone();
///     move || {
///         let _ = untrack(|| state.get("a"));
///     }
/// })
/// .unwrap();
///
/// assert_eq!(effect.dependency_count(), 0);
/// ```
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    struct Restore(bool);

    impl Drop for Restore {
        fn drop(&mut self) {
            with_context(|ctx| ctx.set_untracking(self.0));
        }
    }

    let _restore = Restore(with_context(|ctx| ctx.set_untracking(true)));
    f()
}

// =============================================================================
// TESTS
// =============================================================================
