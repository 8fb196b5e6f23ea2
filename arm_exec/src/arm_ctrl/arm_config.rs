//! Arm configuration structures
//!
//! All joint angles are absolute: both the proximal and forearm angles are
//! measured from the base frame's horizontal axis, following the right hand
//! rule about the joint axes.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The instantaneous configuration of the arm, as measured by the sensing
/// collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    /// Absolute angle of the proximal joint.
    ///
    /// Units: radians
    pub proximal_rad: f64,

    /// Absolute angle of the forearm joint.
    ///
    /// Units: radians
    pub forearm_rad: f64,

    /// Rate of the proximal joint.
    ///
    /// Units: radians/second
    pub proximal_rate_rads: f64,

    /// Rate of the forearm joint.
    ///
    /// Units: radians/second
    pub forearm_rate_rads: f64,
}

/// A pair of absolute joint angles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    /// Units: radians
    pub proximal_rad: f64,

    /// Units: radians
    pub forearm_rad: f64,
}

/// A point in the arm's base frame, with the origin on the proximal joint
/// axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CartesianPoint {
    /// Units: meters
    pub x_m: f64,

    /// Units: meters
    pub y_m: f64,
}

/// Voltage demands for the two joint motors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmVoltages {
    /// Units: volts
    pub proximal_v: f64,

    /// Units: volts
    pub forearm_v: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointState {
    /// A state with the given angles and both joints at rest.
    pub fn at_rest(angles: JointAngles) -> Self {
        Self {
            proximal_rad: angles.proximal_rad,
            forearm_rad: angles.forearm_rad,
            proximal_rate_rads: 0.0,
            forearm_rate_rads: 0.0,
        }
    }

    /// Get the joint angles of this state.
    pub fn angles(&self) -> JointAngles {
        JointAngles {
            proximal_rad: self.proximal_rad,
            forearm_rad: self.forearm_rad,
        }
    }

    /// Returns true if every element of the state is finite.
    pub fn is_finite(&self) -> bool {
        self.proximal_rad.is_finite()
            && self.forearm_rad.is_finite()
            && self.proximal_rate_rads.is_finite()
            && self.forearm_rate_rads.is_finite()
    }
}

impl JointAngles {
    pub fn new(proximal_rad: f64, forearm_rad: f64) -> Self {
        Self { proximal_rad, forearm_rad }
    }

    pub fn is_finite(&self) -> bool {
        self.proximal_rad.is_finite() && self.forearm_rad.is_finite()
    }
}

impl CartesianPoint {
    pub fn new(x_m: f64, y_m: f64) -> Self {
        Self { x_m, y_m }
    }

    /// Distance of the point from the base frame origin.
    pub fn radius_m(&self) -> f64 {
        // Both slices are 2D so the norm is always defined
        util::maths::norm(&[0.0, 0.0], &[self.x_m, self.y_m]).unwrap_or(std::f64::NAN)
    }

    pub fn is_finite(&self) -> bool {
        self.x_m.is_finite() && self.y_m.is_finite()
    }
}

impl ArmVoltages {
    pub fn new(proximal_v: f64, forearm_v: f64) -> Self {
        Self { proximal_v, forearm_v }
    }

    /// Zero voltage on both joints.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_finite(&self) -> bool {
        self.proximal_v.is_finite() && self.forearm_v.is_finite()
    }
}
