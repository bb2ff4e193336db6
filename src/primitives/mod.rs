// ============================================================================
// spark-vdom - Primitives Module
// Reactive wrapper and effects
// ============================================================================

pub mod effect;
pub mod reactive;

// Re-export for convenience
pub use effect::{dispose_effect, effect_tracking, watch_effect, Effect, EffectFn, EffectInner};
pub use reactive::{reactive, Reactive, Record};
