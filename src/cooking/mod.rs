// src/cooking/mod.rs — Guided cooking sessions: state, timers, commands

pub mod controller;
pub mod engine;
pub mod messages;
pub mod ports;
pub mod types;

pub use controller::{CommandReply, SessionController, TimerAdjust};
pub use engine::{CookingEngine, TickOutcome};
