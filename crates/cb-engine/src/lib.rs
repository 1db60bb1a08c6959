//! cb-engine: the scenario engines and the store that wraps them.
//!
//! - action: action requests, recorded events, bounded logs
//! - code_blue: the scripted code-blue engine driven by a diagnosis
//! - titration: the ventilator/FiO2 titration engine driven by a config
//! - engine: the `ScenarioEngine` trait both implement
//! - store: cached snapshots and synchronous subscribers

pub mod action;
pub mod code_blue;
pub mod engine;
pub mod store;
pub mod titration;

pub use action::{ACTION_LOG_CAPACITY, Action, ActionEvent, ActionLog, BoundedLog};
pub use code_blue::{CodeBlueSnapshot, LossFlags, SimEngine, SimState};
pub use engine::ScenarioEngine;
pub use store::SimStore;
pub use titration::{TitrationAction, TitrationEngine, TitrationSnapshot};
