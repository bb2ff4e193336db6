// ============================================================================
// spark-vdom - Renderer Module
// Host adapter, construction, and reconciliation
// ============================================================================

pub mod host;
pub mod memory;
pub mod mount;
pub mod patch;

pub use host::{EventDispatch, HostAdapter};
pub use memory::{HostOp, MemoryHost};
pub use mount::{mount, unmount, Renderer};
pub use patch::reconcile;
