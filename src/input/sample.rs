//! Per-tick input sample records.
//!
//! An external sampler reads devices once per tick and hands the router one
//! sample per category. Samples are immutable `Copy` values stamped with the
//! host's clock (seconds since startup), so they can be stored, compared, and
//! serialized for input-trace recording without aliasing concerns.

use serde::{Deserialize, Serialize};

/// 2D axis pair: analog stick, mouse delta, or digital navigation vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Axis2 {
    pub x: f32,
    pub y: f32,
}

impl Axis2 {
    pub const ZERO: Axis2 = Axis2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared magnitude; used for dead-zone style threshold checks.
    pub fn magnitude_sq(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }
}

/// Logical input actions, abstracted from physical bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    Jump,
    Fire,
    Aim,
    Reload,
    Interact,
    Run,
    Crouch,
    Submit,
    Cancel,
    Pause,
    Special,
}

/// The four input categories the router multiplexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputCategory {
    Movement,
    Combat,
    Ui,
    Action,
}

/// Locomotion input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MovementSample {
    /// Desired movement direction (stick / WASD), unit range per axis.
    pub move_axis: Axis2,
    /// Camera look delta.
    pub look_axis: Axis2,
    pub running: bool,
    pub crouching: bool,
    pub jumping: bool,
    /// Capture time, seconds since host startup.
    pub timestamp: f64,
}

impl MovementSample {
    pub fn new(
        move_axis: Axis2,
        look_axis: Axis2,
        running: bool,
        crouching: bool,
        jumping: bool,
        timestamp: f64,
    ) -> Self {
        Self {
            move_axis,
            look_axis,
            running,
            crouching,
            jumping,
            timestamp,
        }
    }
}

/// Combat input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatSample {
    pub firing: bool,
    pub aiming: bool,
    pub reloading: bool,
    pub interacting: bool,
    /// Aim direction delta, already sensitivity-scaled by the sampler.
    pub aim_axis: Axis2,
    /// Capture time, seconds since host startup.
    pub timestamp: f64,
}

impl CombatSample {
    pub fn new(
        firing: bool,
        aiming: bool,
        reloading: bool,
        interacting: bool,
        aim_axis: Axis2,
        timestamp: f64,
    ) -> Self {
        Self {
            firing,
            aiming,
            reloading,
            interacting,
            aim_axis,
            timestamp,
        }
    }
}

/// UI navigation input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UiSample {
    pub navigate: Axis2,
    pub submit: bool,
    pub cancel: bool,
    pub pause: bool,
    /// Capture time, seconds since host startup.
    pub timestamp: f64,
}

impl UiSample {
    pub fn new(navigate: Axis2, submit: bool, cancel: bool, pause: bool, timestamp: f64) -> Self {
        Self {
            navigate,
            submit,
            cancel,
            pause,
            timestamp,
        }
    }
}

/// Generic single-action input: one logical action with press state and an
/// analog value (1.0 for digital inputs).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionSample {
    pub action: InputAction,
    pub pressed: bool,
    pub value: f32,
    /// Capture time, seconds since host startup.
    pub timestamp: f64,
}

impl ActionSample {
    pub fn new(action: InputAction, pressed: bool, value: f32, timestamp: f64) -> Self {
        Self {
            action,
            pressed,
            value,
            timestamp,
        }
    }

    /// Digital press/release with an implied value of 1.0.
    pub fn button(action: InputAction, pressed: bool, timestamp: f64) -> Self {
        Self::new(action, pressed, 1.0, timestamp)
    }
}

/// Tagged union over the four sample categories, for callers that hand the
/// router a heterogeneous stream instead of calling the per-category methods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputSample {
    Movement(MovementSample),
    Combat(CombatSample),
    Ui(UiSample),
    Action(ActionSample),
}

impl InputSample {
    pub fn category(&self) -> InputCategory {
        match self {
            InputSample::Movement(_) => InputCategory::Movement,
            InputSample::Combat(_) => InputCategory::Combat,
            InputSample::Ui(_) => InputCategory::Ui,
            InputSample::Action(_) => InputCategory::Action,
        }
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            InputSample::Movement(s) => s.timestamp,
            InputSample::Combat(s) => s.timestamp,
            InputSample::Ui(s) => s.timestamp,
            InputSample::Action(s) => s.timestamp,
        }
    }
}
