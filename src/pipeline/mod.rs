// ============================================================================
// spark-vdom - Pipeline Module
// Mounting an application and keeping it rendered
// ============================================================================

pub mod app;

pub use app::{mount_application, App, Component};
