//! Input operating contexts.
//!
//! Exactly one [`InputContext`] is active on a router at any time. The
//! context gates which handlers are eligible for routed input; handlers
//! registered for [`InputContext::Gameplay`] additionally serve as the
//! fallback chain whenever another context is active.
//!
//! Transitions are unrestricted: any context may follow any other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete operating mode gating input routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InputContext {
    /// Normal play. Also the fallback chain for every other context.
    #[default]
    Gameplay,
    /// Menu navigation (title screen, inventory, settings).
    Menu,
    /// Non-interactive sequence; most gameplay handlers stay inactive.
    Cutscene,
    /// Game paused.
    Pause,
    /// Loading screen; the router rejects input entirely in this context.
    Loading,
    /// Debug/console overlay.
    Debug,
}

impl InputContext {
    /// Every context, in declaration order. Used to pre-create registry
    /// buckets so no context can be missing one.
    pub const ALL: [InputContext; 6] = [
        InputContext::Gameplay,
        InputContext::Menu,
        InputContext::Cutscene,
        InputContext::Pause,
        InputContext::Loading,
        InputContext::Debug,
    ];

    /// The fallback context whose handlers are appended to every chain.
    pub const FALLBACK: InputContext = InputContext::Gameplay;

    /// Lowercase name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            InputContext::Gameplay => "gameplay",
            InputContext::Menu => "menu",
            InputContext::Cutscene => "cutscene",
            InputContext::Pause => "pause",
            InputContext::Loading => "loading",
            InputContext::Debug => "debug",
        }
    }
}

impl fmt::Display for InputContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gameplay" => Ok(InputContext::Gameplay),
            "menu" => Ok(InputContext::Menu),
            "cutscene" => Ok(InputContext::Cutscene),
            "pause" => Ok(InputContext::Pause),
            "loading" => Ok(InputContext::Loading),
            "debug" => Ok(InputContext::Debug),
            other => Err(format!("unknown input context: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_gameplay() {
        assert_eq!(InputContext::default(), InputContext::Gameplay);
        assert_eq!(InputContext::FALLBACK, InputContext::Gameplay);
    }

    #[test]
    fn test_all_contains_every_variant_once() {
        assert_eq!(InputContext::ALL.len(), 6);
        for (i, a) in InputContext::ALL.iter().enumerate() {
            for b in &InputContext::ALL[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_name_round_trip() {
        for context in InputContext::ALL {
            assert_eq!(context.as_str().parse::<InputContext>(), Ok(context));
        }
        assert_eq!("  Menu ".parse::<InputContext>(), Ok(InputContext::Menu));
        assert!("attract_mode".parse::<InputContext>().is_err());
    }
}
