// ============================================================================
// spark-vdom - Properties
// Property values carried by tree descriptions
// ============================================================================

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::core::types::NodeId;

/// Properties of a node, in insertion order.
pub type Props = IndexMap<String, PropValue>;

// =============================================================================
// EVENTS
// =============================================================================

/// An event delivered to a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Normalized event name (`click`, not `onClick`)
    pub name: String,
    /// Host node the event was dispatched on
    pub target: NodeId,
}

/// Shared event listener. Two handlers are equal only if they are the same
/// allocation.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

// =============================================================================
// PROP VALUE
// =============================================================================

/// A property value. Primitives compare by value, handlers by identity.
#[derive(Debug, Clone)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(EventHandler),
}

impl PropValue {
    /// Wrap a closure as an event handler value.
    pub fn handler(f: impl Fn(&Event) + 'static) -> Self {
        Self::Handler(EventHandler::new(f))
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Self::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Attribute-style rendering; handlers render as a placeholder.
impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Handler(_) => f.write_str("[handler]"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for PropValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for PropValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        Self::Handler(value)
    }
}
