//! Circuit management for the simulator connection

mod circuit;

pub use circuit::CircuitManager;
