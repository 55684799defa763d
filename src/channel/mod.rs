//! Typed broadcast channels.
//!
//! A [`Channel`] carries one value type to every registered [`Listener`],
//! highest priority first. Channels are the decoupling seam of the crate:
//! producers raise values without knowing who receives them, and consumers
//! attach without knowing who produces.
//!
//! Submodules:
//! - [`broadcast`] – the [`Channel`] itself: registry, ordering, replay
//! - [`listener`] – the [`Listener`] trait, [`FnListener`] adapter, and the
//!   [`Subscription`] RAII guard
//! - [`batch`] – [`RaiseBatch`], a host-polled alternative to [`Channel::raise`]
//!
//! See each submodule for semantics and example usage.

pub mod batch;
pub mod broadcast;
pub mod listener;

pub use batch::RaiseBatch;
pub use broadcast::Channel;
pub use listener::{FnListener, Listener, Subscription};
