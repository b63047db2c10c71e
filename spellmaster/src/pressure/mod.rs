//! Pressure: the bias store and the controller that tunes it

pub mod bias;
pub mod controller;

pub use bias::{clamp, BiasStore};
pub use controller::{ControllerState, PressureController};
