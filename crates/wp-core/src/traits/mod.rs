//! Core trait definitions

mod network;

pub use network::Network;
