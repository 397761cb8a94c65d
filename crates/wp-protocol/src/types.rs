//! Identifier and geometry types shared across the protocol

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use uuid::Uuid;

/// Identifies the avatar (agent) a client logs in as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    /// Create an agent ID from a UUID
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a random agent ID
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated session identifier handed out at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a session ID from a UUID
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a random session ID
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Code binding a UDP circuit to an authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CircuitCode(pub u32);

impl fmt::Display for CircuitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "circuit-{}", self.0)
    }
}

/// 64-bit handle addressing a region on the grid.
///
/// The upper 32 bits hold the global X coordinate of the region's south-west
/// corner in meters, the lower 32 bits the global Y coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionHandle(pub u64);

impl RegionHandle {
    /// Create a handle from its raw value
    pub fn new(handle: u64) -> Self {
        Self(handle)
    }

    /// Create a handle from global grid coordinates in meters
    pub fn from_global(x: u32, y: u32) -> Self {
        Self(((x as u64) << 32) | y as u64)
    }

    /// Global X coordinate in meters
    pub fn global_x(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Global Y coordinate in meters
    pub fn global_y(&self) -> u32 {
        self.0 as u32
    }

    /// Get the raw handle value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.global_x(), self.global_y())
    }
}

/// Position or direction inside a region, in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    /// Create a new vector
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Unit vector along the X axis
    pub const UNIT_X: Vector3 = Vector3::new(1.0, 0.0, 0.0);
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}, {}>", self.x, self.y, self.z)
    }
}
