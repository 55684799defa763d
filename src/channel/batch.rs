//! Host-polled batched dispatch.
//!
//! [`Channel::raise_batched`] snapshots the delivery order exactly like
//! [`Channel::raise`], but hands the snapshot back to the caller as a
//! [`RaiseBatch`]. The host drives delivery with [`RaiseBatch::step`], one
//! listener per call, and may spread the steps across ticks or stop early.
//! Dropping the batch cancels every remaining delivery; there is no implicit
//! continuation.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Weak;

use log::error;

use crate::channel::broadcast::Channel;
use crate::channel::listener::Listener;

/// In-progress batched broadcast. Created by [`Channel::raise_batched`].
///
/// The snapshot is fixed at creation: listeners registered afterwards are not
/// part of this batch, and listeners dropped afterwards are skipped.
pub struct RaiseBatch<T: Clone> {
    value: T,
    pending: VecDeque<Weak<dyn Listener<T>>>,
    delivered: usize,
}

impl<T: Clone + 'static> Channel<T> {
    /// Start a batched broadcast of `value`.
    ///
    /// Caches the value (if replay is enabled) and rebuilds the sorted order
    /// if dirty, exactly as [`Channel::raise`] does, but performs no delivery
    /// yet.
    pub fn raise_batched(&self, value: T) -> RaiseBatch<T> {
        self.cache_value(&value);
        RaiseBatch {
            pending: self.snapshot().into(),
            value,
            delivered: 0,
        }
    }
}

impl<T: Clone + 'static> RaiseBatch<T> {
    /// Deliver the batched value to the next live listener.
    ///
    /// Returns `true` when a delivery happened, `false` when the batch is
    /// exhausted. A panicking listener is logged, counted as delivered, and
    /// does not poison the batch.
    pub fn step(&mut self) -> bool {
        while let Some(weak) = self.pending.pop_front() {
            let Some(listener) = weak.upgrade() else {
                continue;
            };
            if catch_unwind(AssertUnwindSafe(|| listener.on_raised(&self.value))).is_err() {
                error!("listener panicked during batched raise; continuing");
            }
            self.delivered += 1;
            return true;
        }
        false
    }

    /// Deliver to every remaining listener and return the total delivered.
    pub fn finish(mut self) -> usize {
        while self.step() {}
        self.delivered
    }

    /// Number of deliveries performed so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Upper bound on the deliveries still pending (dropped listeners are
    /// only discovered when stepped over).
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Whether every snapshot entry has been stepped over.
    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }
}
