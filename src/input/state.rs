//! Last accepted input per category and the routing validity gate.
//!
//! The router keeps one [`InputState`] and updates it with every sample that
//! passes the enabled/validity checks, so gameplay code can poll "what was
//! the last movement input" without subscribing to a channel.

use crate::input::context::InputContext;
use crate::input::sample::{ActionSample, CombatSample, MovementSample, UiSample};

/// Snapshot of the most recent accepted sample per input category.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    pub movement: Option<MovementSample>,
    pub combat: Option<CombatSample>,
    pub ui: Option<UiSample>,
    pub action: Option<ActionSample>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validity gate consulted before any routing. Input is rejected while a
    /// loading screen is up; every other context accepts.
    pub fn accepts(&self, context: InputContext) -> bool {
        !matches!(context, InputContext::Loading)
    }

    /// Timestamp of the newest accepted sample across all categories.
    pub fn latest_timestamp(&self) -> Option<f64> {
        [
            self.movement.map(|s| s.timestamp),
            self.combat.map(|s| s.timestamp),
            self.ui.map(|s| s.timestamp),
            self.action.map(|s| s.timestamp),
        ]
        .into_iter()
        .flatten()
        .fold(None, |acc, t| Some(acc.map_or(t, |a: f64| a.max(t))))
    }
}
