// ============================================================================
// spark-vdom - Reactive Context
// Thread-local state for tracking the current effect and the dependency graph
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::config::RuntimeConfig;
use super::error::ReactiveError;
use super::types::{EffectId, TargetId};
use crate::primitives::effect::EffectInner;
use crate::reactivity::registry::DependencyRegistry;

// =============================================================================
// REACTIVE CONTEXT
// =============================================================================

/// Thread-local reactive context holding all global state for reactivity.
pub struct ReactiveContext {
    // =========================================================================
    // EFFECT TRACKING
    // =========================================================================
    /// Effects currently executing, innermost last. Reads are attributed to
    /// the top of the stack.
    pub effect_stack: RefCell<Vec<Rc<EffectInner>>>,

    /// Whether reads are currently untracked (inside `untrack`)
    pub untracking: Cell<bool>,

    // =========================================================================
    // DEPENDENCY GRAPH
    // =========================================================================
    /// (target, field) -> subscribers
    pub registry: RefCell<DependencyRegistry>,

    // =========================================================================
    // IDENTITY COUNTERS
    // =========================================================================
    pub next_target_id: Cell<u64>,
    pub next_effect_id: Cell<u64>,

    // =========================================================================
    // FAILURE + CONFIG
    // =========================================================================
    /// Error raised somewhere inside the current notification chain, surfaced
    /// by the outermost write or effect run.
    pub pending_error: RefCell<Option<ReactiveError>>,

    pub config: RefCell<RuntimeConfig>,
}

impl ReactiveContext {
    pub fn new() -> Self {
        Self {
            effect_stack: RefCell::new(Vec::new()),
            untracking: Cell::new(false),
            registry: RefCell::new(DependencyRegistry::new()),
            next_target_id: Cell::new(1),
            next_effect_id: Cell::new(1),
            pending_error: RefCell::new(None),
            config: RefCell::new(RuntimeConfig::default()),
        }
    }

    // =========================================================================
    // EFFECT TRACKING
    // =========================================================================

    pub fn push_effect(&self, effect: Rc<EffectInner>) {
        self.effect_stack.borrow_mut().push(effect);
    }

    pub fn pop_effect(&self) -> Option<Rc<EffectInner>> {
        self.effect_stack.borrow_mut().pop()
    }

    /// The innermost running effect
    pub fn active_effect(&self) -> Option<Rc<EffectInner>> {
        self.effect_stack.borrow().last().cloned()
    }

    pub fn has_active_effect(&self) -> bool {
        !self.effect_stack.borrow().is_empty()
    }

    /// Number of effects currently executing (nesting depth)
    pub fn effect_depth(&self) -> usize {
        self.effect_stack.borrow().len()
    }

    /// Set untracking mode, returning previous value
    pub fn set_untracking(&self, value: bool) -> bool {
        self.untracking.replace(value)
    }

    pub fn is_untracking(&self) -> bool {
        self.untracking.get()
    }

    // =========================================================================
    // IDENTITIES
    // =========================================================================

    pub fn allocate_target_id(&self) -> TargetId {
        let id = self.next_target_id.get();
        self.next_target_id.set(id + 1);
        TargetId::from_raw(id)
    }

    pub fn allocate_effect_id(&self) -> EffectId {
        let id = self.next_effect_id.get();
        self.next_effect_id.set(id + 1);
        EffectId::from_raw(id)
    }

    // =========================================================================
    // PENDING ERROR
    // =========================================================================

    /// Record an error for the current chain. The first error wins.
    pub fn record_error(&self, error: ReactiveError) {
        let mut slot = self.pending_error.borrow_mut();
        if slot.is_none() {
            *slot = Some(error);
        }
    }

    pub fn has_pending_error(&self) -> bool {
        self.pending_error.borrow().is_some()
    }

    pub fn peek_error(&self) -> Option<ReactiveError> {
        self.pending_error.borrow().clone()
    }

    pub fn take_error(&self) -> Option<ReactiveError> {
        self.pending_error.borrow_mut().take()
    }

    // =========================================================================
    // CONFIG
    // =========================================================================

    pub fn config(&self) -> RuntimeConfig {
        self.config.borrow().clone()
    }

    /// Replace the config, returning the previous one
    pub fn set_config(&self, config: RuntimeConfig) -> RuntimeConfig {
        self.config.replace(config)
    }

    pub fn max_update_depth(&self) -> u32 {
        self.config.borrow().max_update_depth
    }
}

impl Default for ReactiveContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// THREAD-LOCAL ACCESS
// =============================================================================

thread_local! {
    static CONTEXT: ReactiveContext = ReactiveContext::new();
}

/// Access the thread-local reactive context.
///
/// Never call user code from inside `f`: the context's cells may be borrowed.
pub fn with_context<R>(f: impl FnOnce(&ReactiveContext) -> R) -> R {
    CONTEXT.with(f)
}

/// Like [`with_context`], but returns `None` once the thread-local has been
/// torn down. Used from `Drop` impls that may run during thread exit.
pub fn try_with_context<R>(f: impl FnOnce(&ReactiveContext) -> R) -> Option<R> {
    CONTEXT.try_with(f).ok()
}

/// Resolve the outcome of a notification chain.
///
/// The outermost caller (no effect running) takes the pending error; nested
/// callers only observe it, so it still reaches the outermost caller.
pub(crate) fn settle_chain() -> Result<(), ReactiveError> {
    with_context(|ctx| {
        let error = if ctx.has_active_effect() {
            ctx.peek_error()
        } else {
            ctx.take_error()
        };
        match error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    })
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Check if reads are currently tracked (inside an effect, not untracking)
pub fn is_tracking() -> bool {
    with_context(|ctx| ctx.has_active_effect() && !ctx.is_untracking())
}

/// Check if currently untracking
pub fn is_untracking() -> bool {
    with_context(|ctx| ctx.is_untracking())
}

/// Current effect nesting depth
pub fn effect_depth() -> usize {
    with_context(|ctx| ctx.effect_depth())
}

// =============================================================================
// TESTS
// =============================================================================
