// ============================================================================
// spark-vdom - Effect System
// Computations that re-run when the fields they read are written
// ============================================================================
//
// Effects are the only reactions in this crate. Each run:
// - pushes the effect onto the context's effect stack so reads attribute to it
// - collects the (target, field) pairs read during the run
// - unsubscribes from pairs the previous run read but this one did not
//
// An effect notified while it is already running is marked DIRTY and re-runs
// once the current pass finishes, bounded by the configured update depth.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexSet;

use crate::core::constants::*;
use crate::core::context::{settle_chain, try_with_context, with_context};
use crate::core::error::ReactiveError;
use crate::core::types::{DepKey, EffectId};

// =============================================================================
// TYPE ALIASES
// =============================================================================

/// Effect function signature
pub type EffectFn = Box<dyn FnMut()>;

// =============================================================================
// EFFECT INNER
// =============================================================================

/// The inner effect implementation, shared between the `Effect` handle, the
/// effect stack, and (weakly) the dependency registry.
pub struct EffectInner {
    id: EffectId,

    /// Flags bitmask for state tracking
    flags: Cell<u32>,

    /// The effect function; `None` once disposed
    func: RefCell<Option<EffectFn>>,

    /// Dependencies read during the most recent run
    deps: RefCell<IndexSet<DepKey>>,

    /// Completed runs
    run_count: Cell<u64>,

    /// Live `Effect` handles; the stack and notification snapshots don't count
    handles: Cell<usize>,
}

impl EffectInner {
    pub(crate) fn new(effect_type: u32, func: EffectFn) -> Rc<Self> {
        Rc::new(Self {
            id: with_context(|ctx| ctx.allocate_effect_id()),
            flags: Cell::new(effect_type | DIRTY),
            func: RefCell::new(Some(func)),
            deps: RefCell::new(IndexSet::new()),
            run_count: Cell::new(0),
            handles: Cell::new(0),
        })
    }

    /// An effect with a no-op body that never ran.
    #[cfg(test)]
    pub(crate) fn detached() -> Rc<Self> {
        Self::new(EFFECT, Box::new(|| {}))
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    fn set_status(&self, status: u32) {
        self.set_flags((self.flags() & STATUS_MASK) | status);
    }

    pub fn is_dirty(&self) -> bool {
        self.flags() & DIRTY != 0
    }

    pub fn is_updating(&self) -> bool {
        self.flags() & REACTION_IS_UPDATING != 0
    }

    pub fn is_destroyed(&self) -> bool {
        self.flags() & DESTROYED != 0
    }

    pub fn has_run(&self) -> bool {
        self.flags() & EFFECT_RAN != 0
    }

    pub(crate) fn mark_dirty(&self) {
        self.set_status(DIRTY);
    }

    pub fn run_count(&self) -> u64 {
        self.run_count.get()
    }

    pub fn dep_count(&self) -> usize {
        self.deps.borrow().len()
    }

    pub fn depends_on(&self, key: &DepKey) -> bool {
        self.deps.borrow().contains(key)
    }

    /// Record a dependency for the current run. Returns true if it is new.
    pub(crate) fn record_dep(&self, key: DepKey) -> bool {
        self.deps.borrow_mut().insert(key)
    }

    // =========================================================================
    // EXECUTION
    // =========================================================================

    /// Run the effect function once with this effect on top of the stack.
    fn execute(self: &Rc<Self>) {
        self.set_status(CLEAN);
        self.set_flags(self.flags() | REACTION_IS_UPDATING);

        let previous = self.deps.replace(IndexSet::new());
        // Reads inside the body always track, even when the write that
        // triggered this run happened under `untrack`
        let untracking = with_context(|ctx| {
            ctx.push_effect(self.clone());
            ctx.set_untracking(false)
        });

        // Pops the stack and installs dependencies even if the body panics
        let _guard = RunGuard {
            effect: self,
            previous,
            untracking,
        };

        let mut func = self.func.borrow_mut();
        if let Some(func) = func.as_mut() {
            func();
        }
    }

    /// Unsubscribe from every dependency and drop the function.
    fn release(&self) {
        let deps = self.deps.take();
        unsubscribe_all(self.id, deps.iter());

        // Dropped outside any context borrow: captured handles may touch it
        let func = self.func.try_borrow_mut().ok().and_then(|mut f| f.take());
        drop(func);
    }
}

impl fmt::Debug for EffectInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectInner")
            .field("id", &self.id)
            .field("flags", &format_args!("{:#b}", self.flags()))
            .field("deps", &self.dep_count())
            .field("run_count", &self.run_count())
            .finish()
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        let deps = self.deps.take();
        if !deps.is_empty() {
            try_with_context(|ctx| {
                if let Ok(mut registry) = ctx.registry.try_borrow_mut() {
                    for key in &deps {
                        registry.unsubscribe(key, self.id);
                    }
                }
            });
        }
    }
}

struct RunGuard<'a> {
    effect: &'a Rc<EffectInner>,
    previous: IndexSet<DepKey>,
    untracking: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let effect = self.effect;
        with_context(|ctx| {
            ctx.pop_effect();
            ctx.set_untracking(self.untracking);
        });
        effect.set_flags((effect.flags() & !REACTION_IS_UPDATING) | EFFECT_RAN);
        effect.run_count.set(effect.run_count.get() + 1);

        if effect.is_destroyed() {
            // Disposed from inside its own run
            unsubscribe_all(effect.id, self.previous.iter());
            effect.release();
            return;
        }

        let stale: Vec<DepKey> = {
            let current = effect.deps.borrow();
            self.previous
                .iter()
                .filter(|key| !current.contains(*key))
                .cloned()
                .collect()
        };
        if !stale.is_empty() {
            tracing::trace!(effect = effect.id.as_u64(), stale = stale.len(), "dropping stale dependencies");
            unsubscribe_all(effect.id, stale.iter());
        }
    }
}

fn unsubscribe_all<'a>(id: EffectId, keys: impl Iterator<Item = &'a DepKey>) {
    with_context(|ctx| {
        let mut registry = ctx.registry.borrow_mut();
        for key in keys {
            registry.unsubscribe(key, id);
        }
    });
}

// =============================================================================
// RUN EFFECT
// =============================================================================

/// Run an effect, re-running while it keeps getting dirtied.
///
/// Failures are recorded in the context; callers surface them with
/// `settle_chain`.
pub(crate) fn run_effect(effect: &Rc<EffectInner>) {
    if effect.is_destroyed() {
        return;
    }

    // Already on the stack: finish the current pass first, then run again
    if effect.is_updating() {
        effect.mark_dirty();
        return;
    }

    let (depth, max_depth, aborted) = with_context(|ctx| {
        (ctx.effect_depth(), ctx.max_update_depth(), ctx.has_pending_error())
    });
    if aborted {
        return;
    }
    if depth as u32 >= max_depth {
        exceed_depth(effect, max_depth);
        return;
    }

    let mut passes = 0;
    loop {
        passes += 1;
        if passes > max_depth {
            exceed_depth(effect, max_depth);
            return;
        }

        tracing::trace!(effect = effect.id.as_u64(), pass = passes, depth, "running effect");
        effect.execute();

        if effect.is_destroyed() || !effect.is_dirty() {
            return;
        }
        if with_context(|ctx| ctx.has_pending_error()) {
            return;
        }
    }
}

fn exceed_depth(effect: &EffectInner, max_depth: u32) {
    tracing::error!(
        effect = effect.id.as_u64(),
        max_depth,
        "maximum update depth exceeded; aborting notification chain"
    );
    with_context(|ctx| ctx.record_error(ReactiveError::MaxUpdateDepth { depth: max_depth }));
}

/// Create an effect and run it once immediately.
pub(crate) fn spawn_effect(effect_type: u32, func: EffectFn) -> Result<Effect, ReactiveError> {
    let inner = EffectInner::new(EFFECT | effect_type, func);
    run_effect(&inner);
    let effect = Effect::from_inner(inner);
    settle_chain()?;
    Ok(effect)
}

/// Dispose an effect: it never runs again and leaves the registry.
pub fn dispose_effect(effect: &Rc<EffectInner>) {
    if effect.is_destroyed() {
        return;
    }
    effect.set_flags(effect.flags() | DESTROYED);
    tracing::debug!(effect = effect.id.as_u64(), "effect disposed");

    // A running effect is released by its RunGuard
    if !effect.is_updating() {
        effect.release();
    }
}

// =============================================================================
// EFFECT WRAPPER
// =============================================================================

/// Public effect handle.
///
/// Dropping the last handle disposes the effect, so keep it alive for as long
/// as the effect should keep reacting.
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    fn from_inner(inner: Rc<EffectInner>) -> Self {
        inner.handles.set(inner.handles.get() + 1);
        Self { inner }
    }

    pub fn inner(&self) -> &Rc<EffectInner> {
        &self.inner
    }

    pub fn id(&self) -> EffectId {
        self.inner.id
    }

    /// Run the effect again now, regardless of whether anything changed.
    pub fn run(&self) -> Result<(), ReactiveError> {
        if self.inner.is_destroyed() {
            return Err(ReactiveError::Disposed);
        }
        run_effect(&self.inner);
        settle_chain()
    }

    pub fn dispose(&self) {
        dispose_effect(&self.inner);
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_destroyed()
    }

    /// How many times the effect function has run
    pub fn run_count(&self) -> u64 {
        self.inner.run_count()
    }

    /// Number of (target, field) pairs read during the last run
    pub fn dependency_count(&self) -> usize {
        self.inner.dep_count()
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self::from_inner(self.inner.clone())
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        let handles = self.inner.handles.get().saturating_sub(1);
        self.inner.handles.set(handles);
        if handles == 0 {
            self.dispose();
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Effect").field(&self.inner).finish()
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Run `f` now and again every time a reactive field it read is written.
///
/// Reads are attributed to the innermost running effect, so an effect created
/// inside another one tracks its own reads only.
///
/// Returns an error if the initial run triggered a chain that exceeded the
/// configured update depth.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::collections::HashMap;
/// use std::rc::Rc;
/// use spark_vdom::{reactive, watch_effect};
///
/// let state = reactive(HashMap::from([("count".to_string(), 0)]));
/// let seen = Rc::new(Cell::new(0));
///
/// let _effect = watch_effect({
///     let state = state.clone();
///     let seen = seen.clone();
///     move || seen.set(state.get("count").unwrap_or_default())
/// })
/// .unwrap();
///
/// state.set("count", 5).unwrap();
/// assert_eq!(seen.get(), 5);
/// ```
#[must_use = "dropping the Effect disposes it"]
pub fn watch_effect<F>(f: F) -> Result<Effect, ReactiveError>
where
    F: FnMut() + 'static,
{
    spawn_effect(USER_EFFECT, Box::new(f))
}

/// Check if we're currently inside a running effect.
pub fn effect_tracking() -> bool {
    with_context(|ctx| ctx.has_active_effect())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactivity::tracking::{notify_write, track_read};
    use crate::core::types::TargetId;

    fn target() -> TargetId {
        with_context(|ctx| ctx.allocate_target_id())
    }

    #[test]
    fn runs_once_on_creation() {
        let runs = Rc::new(Cell::new(0));
        let effect = watch_effect({
            let runs = runs.clone();
            move || runs.set(runs.get() + 1)
        })
        .unwrap();

        assert_eq!(runs.get(), 1);
        assert_eq!(effect.run_count(), 1);
        assert!(effect.inner().has_run());
        assert!(!effect_tracking());
    }

    #[test]
    fn tracked_read_reruns_on_notify() {
        let t = target();
        let runs = Rc::new(Cell::new(0));
        let _effect = watch_effect({
            let runs = runs.clone();
            move || {
                track_read(t, "x");
                runs.set(runs.get() + 1);
            }
        })
        .unwrap();

        notify_write(t, "x").unwrap();
        notify_write(t, "x").unwrap();
        assert_eq!(runs.get(), 3);

        notify_write(t, "y").unwrap();
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn dispose_stops_reruns_and_unsubscribes() {
        let t = target();
        let runs = Rc::new(Cell::new(0));
        let effect = watch_effect({
            let runs = runs.clone();
            move || {
                track_read(t, "x");
                runs.set(runs.get() + 1);
            }
        })
        .unwrap();
        assert_eq!(effect.dependency_count(), 1);

        effect.dispose();
        assert!(effect.is_disposed());
        assert_eq!(effect.dependency_count(), 0);

        notify_write(t, "x").unwrap();
        assert_eq!(runs.get(), 1);
        assert_eq!(effect.run(), Err(ReactiveError::Disposed));
    }

    #[test]
    fn dropping_last_handle_disposes() {
        let t = target();
        let runs = Rc::new(Cell::new(0));
        {
            let _effect = watch_effect({
                let runs = runs.clone();
                move || {
                    track_read(t, "x");
                    runs.set(runs.get() + 1);
                }
            })
            .unwrap();
        }
        notify_write(t, "x").unwrap();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn stack_restored_after_panic() {
        let result = std::panic::catch_unwind(|| {
            let _effect = watch_effect(|| panic!("boom"));
        });
        assert!(result.is_err());
        assert!(!effect_tracking());
    }
}
