//! Dispatch observability.
//!
//! The router can be given a [`DispatchSink`] at construction; after every
//! routed input call it records a [`DispatchReport`] with the per-call
//! latency and consumption outcome. Sinks must never block dispatch:
//! [`ChannelSink`] satisfies this by pushing reports into an unbounded
//! crossbeam channel that a consumer (typically another thread) drains at
//! its own pace.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::trace;

use crate::input::context::InputContext;
use crate::input::sample::InputCategory;

/// Outcome of one routed input call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchReport {
    pub category: InputCategory,
    /// Context that was active while the chain was resolved.
    pub context: InputContext,
    /// Wall-clock time spent broadcasting and walking the handler chain.
    pub duration: Duration,
    /// Whether any handler consumed the input.
    pub consumed: bool,
    /// Handlers invoked before consumption or chain exhaustion, including
    /// handlers that panicked.
    pub handlers_visited: usize,
}

/// Receiver of dispatch reports. Implementations must return promptly;
/// blocking here stalls input dispatch for the whole tick.
pub trait DispatchSink {
    fn record(&self, report: &DispatchReport);
}

/// Sink that forwards reports over an unbounded crossbeam channel.
///
/// `unbounded` guarantees the send never blocks; if the receiver has been
/// dropped the report is discarded.
pub struct ChannelSink {
    sender: Sender<DispatchReport>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    pub fn new() -> (Self, Receiver<DispatchReport>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl DispatchSink for ChannelSink {
    fn record(&self, report: &DispatchReport) {
        if self.sender.send(*report).is_err() {
            trace!("dispatch report dropped; receiver disconnected");
        }
    }
}
