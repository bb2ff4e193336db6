// ============================================================================
// spark-vdom - Type Definitions
// Identities shared by the reactive graph and the renderer
// ============================================================================

use std::fmt;
use std::rc::Rc;

// =============================================================================
// IDENTITIES
// =============================================================================
//
// Rust has no object identity for plain values, so every reactive wrapper and
// every effect gets a numeric identity from the thread-local context. The
// dependency registry is keyed on these, never on the data itself.
// =============================================================================

/// Identity of a reactive wrapper (the "target object" of a dependency).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(u64);

impl TargetId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Identity of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EffectId(u64);

impl EffectId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Opaque handle to a node realized in the host tree.
///
/// Host adapters hand these out from `create_node` and map them to whatever
/// their real nodes are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// DEPENDENCY KEY
// =============================================================================

/// A `(target, field)` pair: one entry in the dependency registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepKey {
    pub target: TargetId,
    pub field: Rc<str>,
}

impl DepKey {
    pub fn new(target: TargetId, field: impl Into<Rc<str>>) -> Self {
        Self {
            target,
            field: field.into(),
        }
    }
}

impl fmt::Display for DepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target.0, self.field)
    }
}
