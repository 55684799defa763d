//! Input handler contract and registry.
//!
//! An [`InputHandler`] declares the context it serves, a priority, an active
//! flag, and one `handle_*` method per input category returning whether the
//! input was consumed. Handlers are shared as `Rc<dyn InputHandler>`;
//! identity is the allocation, so two handlers with equal priority and
//! context are still distinct registrations.
//!
//! [`HandlerRegistry`] keeps handlers indexed both by context bucket and by
//! priority bucket, and resolves the ordered dispatch chain for a context:
//! the context's own handlers plus the [`InputContext::FALLBACK`] handlers,
//! deduplicated, inactive ones dropped, priority-descending with
//! registration-order tie-break.

use std::collections::BTreeMap;
use std::rc::Rc;

use log::debug;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::input::context::InputContext;
use crate::input::sample::{ActionSample, CombatSample, MovementSample, UiSample};

/// Context- and priority-aware consumer of routed input.
///
/// The default `handle_*` implementations consume nothing, so a handler only
/// overrides the categories it cares about. Returning `true` stops delivery
/// to lower-priority handlers for that one input instance.
pub trait InputHandler {
    /// The context this handler serves. Handlers for
    /// [`InputContext::FALLBACK`] also run (after the context's own handlers
    /// of equal priority) while any other context is active.
    fn supported_context(&self) -> InputContext;

    /// Dispatch order. Higher values run earlier.
    fn priority(&self) -> i32 {
        0
    }

    /// Inactive handlers are skipped during chain resolution.
    fn is_active(&self) -> bool {
        true
    }

    fn handle_movement(&self, _sample: &MovementSample) -> bool {
        false
    }

    fn handle_combat(&self, _sample: &CombatSample) -> bool {
        false
    }

    fn handle_ui(&self, _sample: &UiSample) -> bool {
        false
    }

    fn handle_action(&self, _sample: &ActionSample) -> bool {
        false
    }
}

pub type HandlerRef = Rc<dyn InputHandler>;

fn handler_ptr(handler: &dyn InputHandler) -> *const () {
    handler as *const dyn InputHandler as *const ()
}

#[derive(Clone)]
struct IndexedHandler {
    handler: HandlerRef,
    /// Registration sequence, the tie-break for equal priorities.
    seq: u64,
}

/// Bookkeeping for registered handlers: a master list plus two consistent
/// indexes, by context bucket and by priority bucket.
///
/// Context buckets are pre-created for every [`InputContext`] variant; a
/// handler reporting a context without a bucket would be skipped with a debug
/// log rather than rejected.
pub struct HandlerRegistry {
    entries: Vec<IndexedHandler>,
    by_context: FxHashMap<InputContext, Vec<IndexedHandler>>,
    by_priority: BTreeMap<i32, Vec<HandlerRef>>,
    next_seq: u64,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        let mut by_context = FxHashMap::default();
        for context in InputContext::ALL {
            by_context.insert(context, Vec::new());
        }
        Self {
            entries: Vec::new(),
            by_context,
            by_priority: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Register a handler in both indexes. No-op on duplicates.
    pub fn register(&mut self, handler: &HandlerRef) {
        let ptr = Rc::as_ptr(handler) as *const ();
        if self
            .entries
            .iter()
            .any(|e| Rc::as_ptr(&e.handler) as *const () == ptr)
        {
            return;
        }
        let indexed = IndexedHandler {
            handler: Rc::clone(handler),
            seq: self.next_seq,
        };
        self.next_seq += 1;

        let context = handler.supported_context();
        match self.by_context.get_mut(&context) {
            Some(bucket) => bucket.push(indexed.clone()),
            // Buckets exist for every variant, so this only fires if the
            // handler lies about its context between calls.
            None => debug!("no bucket for context {context}; handler not indexed by context"),
        }
        self.by_priority
            .entry(handler.priority())
            .or_default()
            .push(Rc::clone(handler));
        self.entries.push(indexed);

        debug!(
            "registered input handler (context: {context}, priority: {})",
            handler.priority()
        );
    }

    /// Remove a handler from the master list and both indexes. No-op if
    /// absent.
    pub fn unregister(&mut self, handler: &dyn InputHandler) {
        let ptr = handler_ptr(handler);
        let before = self.entries.len();
        self.entries
            .retain(|e| Rc::as_ptr(&e.handler) as *const () != ptr);
        if self.entries.len() == before {
            return;
        }
        for bucket in self.by_context.values_mut() {
            bucket.retain(|e| Rc::as_ptr(&e.handler) as *const () != ptr);
        }
        self.by_priority.retain(|_, bucket| {
            bucket.retain(|h| Rc::as_ptr(h) as *const () != ptr);
            !bucket.is_empty()
        });
        debug!("unregistered input handler");
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, handler: &dyn InputHandler) -> bool {
        let ptr = handler_ptr(handler);
        self.entries
            .iter()
            .any(|e| Rc::as_ptr(&e.handler) as *const () == ptr)
    }

    /// Handlers sharing one priority value, in registration order.
    pub fn handlers_at(&self, priority: i32) -> &[HandlerRef] {
        self.by_priority
            .get(&priority)
            .map(|bucket| bucket.as_slice())
            .unwrap_or(&[])
    }

    /// Handlers registered for one context, in registration order.
    pub fn for_context(&self, context: InputContext) -> Vec<HandlerRef> {
        self.by_context
            .get(&context)
            .map(|bucket| bucket.iter().map(|e| Rc::clone(&e.handler)).collect())
            .unwrap_or_default()
    }

    /// Number of registered handlers that currently report active.
    pub fn active_len(&self) -> usize {
        self.entries.iter().filter(|e| e.handler.is_active()).count()
    }

    /// Resolve the ordered dispatch chain for `context`: the context's
    /// handlers unioned with the fallback handlers (when `context` is not the
    /// fallback itself), deduplicated by identity, inactive handlers dropped,
    /// ordered descending by priority with registration order breaking ties.
    ///
    /// Returns an owned chain so callers do not hold the registry borrowed
    /// while dispatching.
    pub fn chain_for(&self, context: InputContext) -> SmallVec<[HandlerRef; 8]> {
        let mut candidates: SmallVec<[&IndexedHandler; 8]> = SmallVec::new();
        let buckets = [
            Some(context),
            (context != InputContext::FALLBACK).then_some(InputContext::FALLBACK),
        ];
        for bucket_context in buckets.into_iter().flatten() {
            match self.by_context.get(&bucket_context) {
                Some(bucket) => candidates.extend(bucket.iter()),
                None => debug!("no handler bucket for context {bucket_context}; skipped"),
            }
        }

        let mut chain: SmallVec<[&IndexedHandler; 8]> = SmallVec::new();
        for candidate in candidates {
            if !candidate.handler.is_active() {
                continue;
            }
            let ptr = Rc::as_ptr(&candidate.handler) as *const ();
            if chain
                .iter()
                .any(|c| Rc::as_ptr(&c.handler) as *const () == ptr)
            {
                continue;
            }
            chain.push(candidate);
        }
        chain.sort_by(|a, b| {
            b.handler
                .priority()
                .cmp(&a.handler.priority())
                .then(a.seq.cmp(&b.seq))
        });
        chain.into_iter().map(|c| Rc::clone(&c.handler)).collect()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
