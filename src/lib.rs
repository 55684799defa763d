//! Signalrelay library.
//!
//! A synchronous, single-threaded event and input-routing core for games:
//! typed broadcast channels with priority-ordered delivery, and an input
//! router that multiplexes per-tick input samples to context-aware handlers.
//!
//! - [`channel`] – generic broadcast channels, listeners, subscriptions
//! - [`input`] – input samples, contexts, handlers, and the router
//! - [`config`] – INI-backed configuration for the router
//! - [`telemetry`] – optional dispatch observability sink

pub mod channel;
pub mod config;
pub mod input;
pub mod telemetry;
