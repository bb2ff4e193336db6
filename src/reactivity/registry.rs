// ============================================================================
// spark-vdom - Dependency Registry
// (target, field) -> set of subscribed effects
// ============================================================================
//
// Two-level table: target identity -> field name -> subscriber set. The
// registry never owns the observed data or the effects; subscribers are held
// weakly and whole targets are forgotten when their reactive wrapper drops.
// ============================================================================

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::core::context::with_context;
use crate::core::types::{DepKey, EffectId, TargetId};
use crate::primitives::effect::EffectInner;

// =============================================================================
// SUBSCRIBER SET
// =============================================================================

/// Effects subscribed to one `(target, field)` pair, in registration order.
///
/// Keyed by effect identity, so registering the same effect twice is a no-op.
#[derive(Default)]
pub struct SubscriberSet {
    subscribers: IndexMap<EffectId, Weak<EffectInner>>,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect. Returns false if it was already subscribed.
    pub fn insert(&mut self, effect: &Rc<EffectInner>) -> bool {
        let id = effect.id();
        if self.subscribers.contains_key(&id) {
            return false;
        }
        self.subscribers.insert(id, Rc::downgrade(effect));
        true
    }

    /// Remove an effect, keeping the order of the rest.
    pub fn remove(&mut self, id: EffectId) -> bool {
        self.subscribers.shift_remove(&id).is_some()
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.subscribers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn ids(&self) -> Vec<EffectId> {
        self.subscribers.keys().copied().collect()
    }

    /// Drop entries whose effect no longer exists
    pub fn prune_dead(&mut self) {
        self.subscribers.retain(|_, weak| weak.strong_count() > 0);
    }

    /// Upgrade every live subscriber, in registration order.
    pub fn live(&self) -> Vec<Rc<EffectInner>> {
        self.subscribers.values().filter_map(Weak::upgrade).collect()
    }
}

// =============================================================================
// DEPENDENCY REGISTRY
// =============================================================================

#[derive(Default)]
pub struct DependencyRegistry {
    targets: HashMap<TargetId, HashMap<Rc<str>, SubscriberSet>>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the subscriber set for `(target, field)`, creating it if absent.
    pub fn subscriber_set(&mut self, target: TargetId, field: &str) -> &mut SubscriberSet {
        self.entry(&DepKey::new(target, field))
    }

    fn entry(&mut self, key: &DepKey) -> &mut SubscriberSet {
        self.targets
            .entry(key.target)
            .or_default()
            .entry(key.field.clone())
            .or_default()
    }

    pub fn get(&self, target: TargetId, field: &str) -> Option<&SubscriberSet> {
        self.targets.get(&target)?.get(field)
    }

    /// Subscribe `effect` to `key`. Returns false if it already was.
    pub fn subscribe(&mut self, key: &DepKey, effect: &Rc<EffectInner>) -> bool {
        self.entry(key).insert(effect)
    }

    /// Unsubscribe an effect from `key`, pruning entries left empty.
    pub fn unsubscribe(&mut self, key: &DepKey, effect: EffectId) -> bool {
        let Some(fields) = self.targets.get_mut(&key.target) else {
            return false;
        };
        let Some(set) = fields.get_mut(key.field.as_ref()) else {
            return false;
        };

        let removed = set.remove(effect);
        if set.is_empty() {
            fields.remove(key.field.as_ref());
        }
        if fields.is_empty() {
            self.targets.remove(&key.target);
        }
        removed
    }

    /// Live subscribers of `(target, field)`, in registration order.
    ///
    /// Dead weak entries are pruned on the way.
    pub fn subscribers(&mut self, target: TargetId, field: &str) -> Vec<Rc<EffectInner>> {
        match self.targets.get_mut(&target).and_then(|fields| fields.get_mut(field)) {
            Some(set) => {
                set.prune_dead();
                set.live()
            }
            None => Vec::new(),
        }
    }

    pub fn subscriber_count(&self, target: TargetId, field: &str) -> usize {
        self.get(target, field).map_or(0, SubscriberSet::len)
    }

    /// Drop every entry belonging to `target`. Returns how many were removed.
    pub fn forget_target(&mut self, target: TargetId) -> usize {
        self.targets.remove(&target).map_or(0, |fields| fields.len())
    }

    /// Number of `(target, field)` entries
    pub fn entry_count(&self) -> usize {
        self.targets.values().map(HashMap::len).sum()
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}

// =============================================================================
// THREAD-LOCAL CONVENIENCE
// =============================================================================

/// Subscriber identities for `(target, field)`, creating the entry if absent.
pub fn get_subscriber_set(target: TargetId, field: &str) -> Vec<EffectId> {
    with_context(|ctx| ctx.registry.borrow_mut().subscriber_set(target, field).ids())
}

/// Number of effects subscribed to `(target, field)`.
pub fn subscriber_count(target: TargetId, field: &str) -> usize {
    with_context(|ctx| ctx.registry.borrow().subscriber_count(target, field))
}

/// Number of live `(target, field)` entries on this thread.
pub fn registry_entry_count() -> usize {
    with_context(|ctx| ctx.registry.borrow().entry_count())
}

// =============================================================================
// TESTS
// =============================================================================
