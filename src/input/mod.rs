//! Input routing.
//!
//! Raw input samples arrive once per tick from an external sampler and are
//! multiplexed to the correct set of handlers for the active operating
//! context, in priority order, until one of them consumes the input.
//!
//! Submodules:
//! - [`context`] – the [`InputContext`] operating modes
//! - [`sample`] – immutable per-tick input sample records
//! - [`state`] – last accepted sample per category and the validity gate
//! - [`handler`] – the [`InputHandler`] contract and [`HandlerRegistry`]
//! - [`router`] – the [`InputRouter`] orchestrator
//!
//! [`InputContext`]: context::InputContext
//! [`InputHandler`]: handler::InputHandler
//! [`HandlerRegistry`]: handler::HandlerRegistry
//! [`InputRouter`]: router::InputRouter

pub mod context;
pub mod handler;
pub mod router;
pub mod sample;
pub mod state;

pub use context::InputContext;
pub use handler::{HandlerRef, HandlerRegistry, InputHandler};
pub use router::{InputRouter, RouterChannels};
pub use sample::{
    ActionSample, Axis2, CombatSample, InputAction, InputCategory, InputSample, MovementSample,
    UiSample,
};
pub use state::InputState;
