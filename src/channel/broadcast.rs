//! Broadcast channel with priority-ordered, mutation-safe delivery.
//!
//! [`Channel`] keeps its listeners as weak references together with a cached
//! priority-sorted order. The cache is invalidated by every mutation (dirty
//! flag) and rebuilt lazily, at most once per raise. Delivery always walks an
//! immutable snapshot of that order, so a listener may unregister itself or
//! any other listener mid-broadcast without disturbing the deliveries already
//! scheduled for the current raise.
//!
//! With [`Channel::with_replay`] the channel additionally remembers the most
//! recently raised value and replays it, exactly once, to every listener that
//! registers afterwards.

use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

use log::{error, trace};

use crate::channel::listener::{Listener, Subscription};

/// Erase a listener reference down to its data pointer, which is the
/// channel-wide identity of the listener.
fn erased_ptr<T>(listener: &dyn Listener<T>) -> *const () {
    listener as *const dyn Listener<T> as *const ()
}

fn erased_weak_ptr<T>(listener: &Weak<dyn Listener<T>>) -> *const () {
    Weak::as_ptr(listener) as *const ()
}

struct RegisteredListener<T> {
    listener: Weak<dyn Listener<T>>,
    /// Monotonic registration sequence, the tie-break for equal priorities.
    seq: u64,
}

struct ListenerRegistry<T> {
    entries: Vec<RegisteredListener<T>>,
    /// Priority-descending order over `entries`, valid while `dirty` is false.
    sorted: Vec<Weak<dyn Listener<T>>>,
    dirty: bool,
    next_seq: u64,
}

impl<T> ListenerRegistry<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            sorted: Vec::new(),
            dirty: true,
            next_seq: 0,
        }
    }

    fn contains(&self, ptr: *const ()) -> bool {
        self.entries
            .iter()
            .any(|e| erased_weak_ptr(&e.listener) == ptr && e.listener.strong_count() > 0)
    }

    /// Drop dead listeners, then sort the remainder descending by priority.
    /// Equal priorities keep registration order (stable, explicit tie-break).
    fn rebuild_sorted(&mut self) {
        self.entries.retain(|e| e.listener.strong_count() > 0);
        let mut ordered: Vec<(i32, u64, Weak<dyn Listener<T>>)> = self
            .entries
            .iter()
            .filter_map(|e| {
                e.listener
                    .upgrade()
                    .map(|l| (l.priority(), e.seq, Weak::clone(&e.listener)))
            })
            .collect();
        ordered.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        self.sorted = ordered.into_iter().map(|(_, _, w)| w).collect();
        self.dirty = false;
    }
}

struct ValueCache<T> {
    /// Explicit default factory; `Some` means replay/caching is enabled.
    default_fn: Option<Box<dyn Fn() -> T>>,
    last: Option<T>,
}

/// Generic broadcast primitive carrying values of type `T` to all registered
/// listeners, highest priority first.
///
/// All methods take `&self`; internal state lives behind `RefCell` so that
/// listeners may call back into the channel (register/unregister) from inside
/// their own notification. The channel is single-threaded by design.
pub struct Channel<T: Clone> {
    registry: RefCell<ListenerRegistry<T>>,
    cache: RefCell<ValueCache<T>>,
}

impl<T: Clone + 'static> Channel<T> {
    /// Create a channel without a last-value cache.
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(ListenerRegistry::new()),
            cache: RefCell::new(ValueCache {
                default_fn: None,
                last: None,
            }),
        }
    }

    /// Create a channel that caches the most recent value and replays it to
    /// late subscribers. `default_fn` supplies the value reported by
    /// [`Channel::last_value`] before anything has been raised.
    pub fn with_replay(default_fn: impl Fn() -> T + 'static) -> Self {
        Self {
            registry: RefCell::new(ListenerRegistry::new()),
            cache: RefCell::new(ValueCache {
                default_fn: Some(Box::new(default_fn)),
                last: None,
            }),
        }
    }

    /// Register a listener. No-op if the same listener is already present.
    ///
    /// If replay is enabled and a value has been raised, the listener
    /// immediately receives that value exactly once. The replay happens
    /// outside any in-progress raise snapshot.
    pub fn register(&self, listener: &Rc<dyn Listener<T>>) {
        {
            let mut registry = self.registry.borrow_mut();
            if registry.contains(Rc::as_ptr(listener) as *const ()) {
                return;
            }
            let seq = registry.next_seq;
            registry.next_seq += 1;
            registry.entries.push(RegisteredListener {
                listener: Rc::downgrade(listener),
                seq,
            });
            registry.dirty = true;
        }
        // Late-subscriber replay, delivered after the registry borrow ends so
        // the listener may freely call back into the channel.
        let replay = self.cache.borrow().last.clone();
        if let Some(value) = replay {
            trace!("replaying cached value to late subscriber");
            listener.on_raised(&value);
        }
    }

    /// Remove a listener by identity. No-op if absent.
    pub fn unregister(&self, listener: &dyn Listener<T>) {
        let ptr = erased_ptr(listener);
        let mut registry = self.registry.borrow_mut();
        let before = registry.entries.len();
        registry
            .entries
            .retain(|e| erased_weak_ptr(&e.listener) != ptr);
        if registry.entries.len() != before {
            registry.dirty = true;
        }
    }

    /// Register `listener` and return an RAII guard that unregisters it when
    /// dropped.
    pub fn subscribe(self: &Rc<Self>, listener: Rc<dyn Listener<T>>) -> Subscription<T> {
        self.register(&listener);
        Subscription::new(Rc::clone(self), listener)
    }

    /// Raise `value` to every live listener, highest priority first.
    ///
    /// The sorted order is rebuilt at most once per call, and delivery walks a
    /// snapshot taken before the first notification. A panicking listener is
    /// logged and skipped; the broadcast continues and the panic never reaches
    /// the caller.
    pub fn raise(&self, value: T) {
        self.cache_value(&value);
        let snapshot = self.snapshot();
        trace!("raising value to {} listener(s)", snapshot.len());
        for weak in &snapshot {
            let Some(listener) = weak.upgrade() else {
                continue;
            };
            if catch_unwind(AssertUnwindSafe(|| listener.on_raised(&value))).is_err() {
                error!("listener panicked during raise; continuing with remaining listeners");
            }
        }
    }

    /// The most recently raised value, the configured default if nothing has
    /// been raised yet, or `None` when the channel was built without replay.
    pub fn last_value(&self) -> Option<T> {
        let cache = self.cache.borrow();
        match (&cache.default_fn, &cache.last) {
            (None, _) => None,
            (Some(_), Some(value)) => Some(value.clone()),
            (Some(default_fn), None) => Some(default_fn()),
        }
    }

    /// Whether this channel caches and replays its last value.
    pub fn replay_enabled(&self) -> bool {
        self.cache.borrow().default_fn.is_some()
    }

    /// Number of distinct live listeners currently registered.
    pub fn listener_count(&self) -> usize {
        self.registry
            .borrow()
            .entries
            .iter()
            .filter(|e| e.listener.strong_count() > 0)
            .count()
    }

    /// Whether `listener` is currently registered.
    pub fn contains(&self, listener: &dyn Listener<T>) -> bool {
        self.registry.borrow().contains(erased_ptr(listener))
    }

    /// Remove every listener.
    pub fn clear(&self) {
        let mut registry = self.registry.borrow_mut();
        registry.entries.clear();
        registry.sorted.clear();
        registry.dirty = true;
    }

    /// Rebuild the sorted order if dirty and return a snapshot of it.
    pub(crate) fn snapshot(&self) -> Vec<Weak<dyn Listener<T>>> {
        let mut registry = self.registry.borrow_mut();
        if registry.dirty {
            registry.rebuild_sorted();
        }
        registry.sorted.clone()
    }

    /// Store `value` in the last-value cache when replay is enabled.
    pub(crate) fn cache_value(&self, value: &T) {
        let mut cache = self.cache.borrow_mut();
        if cache.default_fn.is_some() {
            cache.last = Some(value.clone());
        }
    }
}

impl<T: Clone + 'static> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}
