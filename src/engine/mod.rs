mod client;
mod error;
mod events;
mod install;
mod netconvert;
mod runner;
pub mod traci;

pub use client::{
    NetworkBounds, SimulationEngine, SimulationFrame, TrafficLightState, VehicleState,
};
pub use error::EngineError;
pub use events::{EngineCommand, EngineEvent, FinishReason};
pub use install::SumoInstallation;
pub use netconvert::compile_network;
pub use runner::{RunConfig, run_simulation};
pub use traci::TraciEngine;
