// ============================================================================
// spark-vdom - Reactive Wrapper
// Field-level read tracking and write notification over a plain record
// ============================================================================
//
// Rust has no property interception, so the wrapper is explicit: reads go
// through `get(field)` and writes through `set(field, value)`. Dependencies
// are keyed on the wrapper's identity plus the field name, so two wrappers
// over equal data never share subscribers.
// ============================================================================

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::core::context::{try_with_context, with_context};
use crate::core::error::ReactiveError;
use crate::core::types::TargetId;
use crate::reactivity::tracking::{notify_write, track_read};

// =============================================================================
// RECORD
// =============================================================================

/// A plain data object addressable by field name.
///
/// Implemented for string-keyed maps. Structs implement it by hand, usually
/// with an enum as `Value`, and reject unknown fields on write.
pub trait Record {
    type Value: Clone;

    /// Borrow the value of `field`, if present.
    fn field(&self, field: &str) -> Option<&Self::Value>;

    /// Write `field`, returning the previous value.
    fn set_field(
        &mut self,
        field: &str,
        value: Self::Value,
    ) -> Result<Option<Self::Value>, ReactiveError>;
}

impl<V: Clone, S: BuildHasher> Record for HashMap<String, V, S> {
    type Value = V;

    fn field(&self, field: &str) -> Option<&V> {
        self.get(field)
    }

    fn set_field(&mut self, field: &str, value: V) -> Result<Option<V>, ReactiveError> {
        Ok(self.insert(field.to_owned(), value))
    }
}

impl<V: Clone> Record for BTreeMap<String, V> {
    type Value = V;

    fn field(&self, field: &str) -> Option<&V> {
        self.get(field)
    }

    fn set_field(&mut self, field: &str, value: V) -> Result<Option<V>, ReactiveError> {
        Ok(self.insert(field.to_owned(), value))
    }
}

impl<V: Clone, S: BuildHasher> Record for IndexMap<String, V, S> {
    type Value = V;

    fn field(&self, field: &str) -> Option<&V> {
        self.get(field)
    }

    fn set_field(&mut self, field: &str, value: V) -> Result<Option<V>, ReactiveError> {
        Ok(self.insert(field.to_owned(), value))
    }
}

// =============================================================================
// REACTIVE
// =============================================================================

struct ReactiveInner<R> {
    id: TargetId,
    raw: RefCell<R>,
}

impl<R> Drop for ReactiveInner<R> {
    fn drop(&mut self) {
        // The registry must not outlive the identity it is keyed on
        let id = self.id;
        try_with_context(|ctx| {
            if let Ok(mut registry) = ctx.registry.try_borrow_mut() {
                registry.forget_target(id);
            }
        });
    }
}

/// Reactive handle over a record.
///
/// Cloning the handle shares the record and its identity. Reads inside a
/// running effect subscribe that effect to the field; writes run every
/// subscriber of the field before returning.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use spark_vdom::reactive;
///
/// let state = reactive(HashMap::from([("count".to_string(), 1)]));
/// state.set("count", 2).unwrap();
/// assert_eq!(state.get("count"), Some(2));
/// assert_eq!(state.get("missing"), None);
/// ```
pub struct Reactive<R: Record> {
    inner: Rc<ReactiveInner<R>>,
}

impl<R: Record> Reactive<R> {
    pub fn new(raw: R) -> Self {
        let id = with_context(|ctx| ctx.allocate_target_id());
        Self {
            inner: Rc::new(ReactiveInner {
                id,
                raw: RefCell::new(raw),
            }),
        }
    }

    /// Identity used as the registry target
    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    /// Whether two handles wrap the same record
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read `field`, tracking it as a dependency of the running effect.
    ///
    /// Missing fields are tracked too, so a later write that adds the field
    /// still notifies.
    pub fn get(&self, field: &str) -> Option<R::Value> {
        track_read(self.inner.id, field);
        self.peek(field)
    }

    /// Read `field` without tracking.
    pub fn peek(&self, field: &str) -> Option<R::Value> {
        self.inner.raw.borrow().field(field).cloned()
    }

    /// Write `field`, then synchronously run every subscriber of it.
    ///
    /// Every write notifies, even when the value did not change.
    pub fn set(&self, field: &str, value: R::Value) -> Result<(), ReactiveError> {
        self.inner.raw.borrow_mut().set_field(field, value)?;
        notify_write(self.inner.id, field)
    }

    /// Compute a new value from the current one (read untracked) and write it.
    pub fn update(
        &self,
        field: &str,
        f: impl FnOnce(Option<&R::Value>) -> R::Value,
    ) -> Result<(), ReactiveError> {
        let value = {
            let raw = self.inner.raw.borrow();
            f(raw.field(field))
        };
        self.set(field, value)
    }

    /// Untracked access to the whole record.
    ///
    /// Do not write through this handle from inside `f`.
    pub fn with_raw<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(&self.inner.raw.borrow())
    }
}

impl<R: Record> Clone for Reactive<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Record + fmt::Debug> fmt::Debug for Reactive<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("id", &self.inner.id)
            .field("raw", &self.inner.raw.borrow())
            .finish()
    }
}

/// Wrap a plain record for field-level tracking.
pub fn reactive<R: Record>(raw: R) -> Reactive<R> {
    Reactive::new(raw)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::effect::watch_effect;
    use crate::reactivity::registry::{registry_entry_count, subscriber_count};
    use std::cell::Cell;

    fn counter(count: i64) -> Reactive<HashMap<String, i64>> {
        reactive(HashMap::from([("count".to_string(), count)]))
    }

    #[test]
    fn get_and_set() {
        let state = counter(1);
        assert_eq!(state.get("count"), Some(1));

        state.set("count", 2).unwrap();
        assert_eq!(state.peek("count"), Some(2));

        state.update("count", |v| v.copied().unwrap_or_default() + 10).unwrap();
        assert_eq!(state.peek("count"), Some(12));
    }

    #[test]
    fn clones_share_identity() {
        let a = counter(0);
        let b = a.clone();
        let c = counter(0);

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());

        b.set("count", 9).unwrap();
        assert_eq!(a.peek("count"), Some(9));
    }

    #[test]
    fn effect_reruns_once_per_write() {
        let state = counter(0);
        let runs = Rc::new(Cell::new(0));
        let _effect = watch_effect({
            let state = state.clone();
            let runs = runs.clone();
            move || {
                let _ = state.get("count");
                runs.set(runs.get() + 1);
            }
        })
        .unwrap();

        state.set("count", 1).unwrap();
        state.set("count", 1).unwrap();
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn reading_missing_field_subscribes_for_later_insert() {
        let state: Reactive<BTreeMap<String, String>> = reactive(BTreeMap::new());
        let seen = Rc::new(RefCell::new(None));
        let _effect = watch_effect({
            let state = state.clone();
            let seen = seen.clone();
            move || *seen.borrow_mut() = state.get("name")
        })
        .unwrap();

        assert_eq!(*seen.borrow(), None);
        state.set("name", "spark".into()).unwrap();
        assert_eq!(seen.borrow().as_deref(), Some("spark"));
    }

    #[test]
    fn peek_and_with_raw_are_untracked() {
        let state = counter(3);
        let _effect = watch_effect({
            let state = state.clone();
            move || {
                let _ = state.peek("count");
                let _ = state.with_raw(|raw| raw.len());
            }
        })
        .unwrap();

        assert_eq!(subscriber_count(state.id(), "count"), 0);
    }

    #[test]
    fn dropping_wrapper_forgets_its_entries() {
        let before = registry_entry_count();
        let effect = {
            let state = counter(0);
            let effect = watch_effect({
                let state = state.clone();
                move || {
                    let _ = state.get("count");
                }
            })
            .unwrap();
            assert_eq!(registry_entry_count(), before + 1);
            effect
        };

        // The effect still holds a clone of the wrapper
        assert_eq!(registry_entry_count(), before + 1);
        drop(effect);
        assert_eq!(registry_entry_count(), before);
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Field {
        Int(i64),
        Text(String),
    }

    #[derive(Debug)]
    struct Profile {
        age: Field,
        name: Field,
    }

    impl Record for Profile {
        type Value = Field;

        fn field(&self, field: &str) -> Option<&Field> {
            match field {
                "age" => Some(&self.age),
                "name" => Some(&self.name),
                _ => None,
            }
        }

        fn set_field(&mut self, field: &str, value: Field) -> Result<Option<Field>, ReactiveError> {
            let slot = match field {
                "age" => &mut self.age,
                "name" => &mut self.name,
                _ => {
                    return Err(ReactiveError::UnknownField {
                        field: field.to_owned(),
                    })
                }
            };
            Ok(Some(std::mem::replace(slot, value)))
        }
    }

    #[test]
    fn struct_record_rejects_unknown_fields() {
        let profile = reactive(Profile {
            age: Field::Int(30),
            name: Field::Text("Ada".into()),
        });

        profile.set("age", Field::Int(31)).unwrap();
        assert_eq!(profile.get("age"), Some(Field::Int(31)));

        let err = profile.set("email", Field::Text("x".into())).unwrap_err();
        assert_eq!(
            err,
            ReactiveError::UnknownField {
                field: "email".into()
            }
        );
    }
}
