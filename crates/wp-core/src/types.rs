//! Core domain types

use std::fmt;
use std::net::SocketAddr;

use wp_protocol::{AgentId, CircuitCode, SessionId};

/// Identity the client authenticated with at login.
///
/// Reused unchanged when the client hops to another simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentCredentials {
    /// Avatar the client is logged in as
    pub agent_id: AgentId,
    /// Session handed out by the login service
    pub session_id: SessionId,
}

impl AgentCredentials {
    /// Create new credentials
    pub fn new(agent_id: AgentId, session_id: SessionId) -> Self {
        Self {
            agent_id,
            session_id,
        }
    }
}

/// The circuit currently bound to a simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitInfo {
    /// Code the circuit was opened with
    pub code: CircuitCode,
    /// Simulator endpoint
    pub endpoint: SocketAddr,
}

impl fmt::Display for CircuitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.endpoint, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_info_display() {
        let info = CircuitInfo {
            code: CircuitCode(99),
            endpoint: "10.0.0.5:9000".parse().unwrap(),
        };
        assert_eq!(format!("{}", info), "10.0.0.5:9000 (circuit-99)");
    }
}
