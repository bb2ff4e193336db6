// ============================================================================
// spark-vdom - Constants
// Effect state flags and runtime defaults
// ============================================================================

// =============================================================================
// EFFECT TYPE FLAGS
// =============================================================================

/// Reaction is an effect (the only kind of reaction in this crate)
pub const EFFECT: u32 = 1 << 0;

/// Effect was created by `watch_effect` directly
pub const USER_EFFECT: u32 = 1 << 1;

/// Effect drives a mounted application (render + reconcile)
pub const RENDER_EFFECT: u32 = 1 << 2;

// =============================================================================
// EFFECT STATE FLAGS
// =============================================================================

/// Effect is up-to-date with its dependencies
pub const CLEAN: u32 = 1 << 10;

/// Effect was notified and must run again
pub const DIRTY: u32 = 1 << 11;

/// Effect is currently executing its function
pub const REACTION_IS_UPDATING: u32 = 1 << 13;

/// Effect has been disposed and will never run again
pub const DESTROYED: u32 = 1 << 14;

/// Effect has completed at least one run
pub const EFFECT_RAN: u32 = 1 << 16;

// =============================================================================
// STATUS MASK (for clearing status bits)
// =============================================================================

/// Mask to clear the status bits (CLEAN, DIRTY)
pub const STATUS_MASK: u32 = !(DIRTY | CLEAN);

// =============================================================================
// RUNTIME DEFAULTS
// =============================================================================

/// Default bound on nested effect runs and on re-run passes of one effect.
pub const DEFAULT_MAX_UPDATE_DEPTH: u32 = 100;

/// Default property prefix that marks an event listener (`onClick` -> `click`).
pub const DEFAULT_EVENT_PREFIX: &str = "on";

// =============================================================================
// TESTS
// =============================================================================
