#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver that wires the world and its systems into a frame loop.

pub mod arena;
pub mod input;
pub mod simulation;

pub use simulation::{Outcome, Simulation, SimulationSeeds};
