//! Arm kinematics calculations
//!
//! Forward kinematics maps the absolute joint angles onto the end effector
//! position in the arm's base frame:
//!
//! ```text
//! x = L1 cos(θ1) + L2 cos(θ2)
//! y = L1 sin(θ1) + L2 sin(θ2)
//! ```
//!
//! Inverse kinematics uses the law of cosines on the triangle formed by the two
//! links and the line from the proximal joint to the target. The solution
//! branch is fixed: the proximal angle is offset above the line to the target
//! and the forearm angle below it, so exactly one configuration is returned.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};

use util::maths::clamp_unit_with_slack;

// Internal imports
use super::{CartesianPoint, JointAngles, JointState};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Amount by which an `acos` argument may exceed `[-1, 1]` through rounding
/// alone. Targets exactly on the edge of the reachable annulus land here.
const ACOS_SLACK: f64 = 1e-12;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Link lengths of the arm. Fixed for the lifetime of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmGeometry {
    /// Length of the proximal link, between the proximal and forearm joints.
    ///
    /// Units: meters
    proximal_length_m: f64,

    /// Length of the forearm link, between the forearm joint and the end
    /// effector.
    ///
    /// Units: meters
    forearm_length_m: f64,
}

/// Stateless forward and inverse kinematics solver for the two link arm.
#[derive(Debug, Clone, Copy)]
pub struct KinematicsSolver {
    geometry: ArmGeometry,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur during kinematics calculations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KinematicsError {
    #[error(
        "Target at {radius_m:.4} m from the base is out of reach, the reachable range is \
        [{min_m:.4}, {max_m:.4}] m"
    )]
    OutOfReach {
        radius_m: f64,
        min_m: f64,
        max_m: f64,
    },

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmGeometry {
    /// Create a new geometry, rejecting non-positive or non-finite lengths.
    pub fn new(proximal_length_m: f64, forearm_length_m: f64) -> Result<Self, KinematicsError> {
        for (name, length_m) in [
            ("proximal", proximal_length_m),
            ("forearm", forearm_length_m),
        ] {
            if !length_m.is_finite() || length_m <= 0.0 {
                return Err(KinematicsError::DegenerateGeometry(format!(
                    "{} link length must be positive, found {}",
                    name, length_m
                )));
            }
        }

        Ok(Self {
            proximal_length_m,
            forearm_length_m,
        })
    }

    pub fn proximal_length_m(&self) -> f64 {
        self.proximal_length_m
    }

    pub fn forearm_length_m(&self) -> f64 {
        self.forearm_length_m
    }

    /// Smallest reachable distance from the base, `|L1 - L2|`.
    pub fn min_reach_m(&self) -> f64 {
        (self.proximal_length_m - self.forearm_length_m).abs()
    }

    /// Largest reachable distance from the base, `L1 + L2`.
    pub fn max_reach_m(&self) -> f64 {
        self.proximal_length_m + self.forearm_length_m
    }
}

impl KinematicsSolver {
    pub fn new(geometry: ArmGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &ArmGeometry {
        &self.geometry
    }

    /// Position of the end effector for the given joint state.
    pub fn forward(&self, state: &JointState) -> CartesianPoint {
        self.forward_angles(&state.angles())
    }

    /// Position of the end effector for the given joint angles.
    pub fn forward_angles(&self, angles: &JointAngles) -> CartesianPoint {
        let l1 = self.geometry.proximal_length_m;
        let l2 = self.geometry.forearm_length_m;

        CartesianPoint {
            x_m: l1 * angles.proximal_rad.cos() + l2 * angles.forearm_rad.cos(),
            y_m: l1 * angles.proximal_rad.sin() + l2 * angles.forearm_rad.sin(),
        }
    }

    /// Joint angles which place the end effector at the given point.
    ///
    /// All failure cases are detected before any trigonometry is evaluated,
    /// so a NaN is never returned.
    pub fn inverse(&self, target: &CartesianPoint) -> Result<JointAngles, KinematicsError> {
        let l1 = self.geometry.proximal_length_m;
        let l2 = self.geometry.forearm_length_m;

        if !target.is_finite() {
            return Err(KinematicsError::DegenerateGeometry(format!(
                "target ({}, {}) is not finite",
                target.x_m, target.y_m
            )));
        }

        // Goals on the vertical axis are rejected even though atan2 is defined
        // there, matching the atan(y/x) singularity of the joint formula.
        if target.x_m == 0.0 {
            return Err(KinematicsError::DegenerateGeometry(format!(
                "target ({}, {}) lies on the vertical axis (x = 0)",
                target.x_m, target.y_m
            )));
        }

        let r_m = target.radius_m();
        let r_sq = r_m.powi(2);

        let out_of_reach = || KinematicsError::OutOfReach {
            radius_m: r_m,
            min_m: self.geometry.min_reach_m(),
            max_m: self.geometry.max_reach_m(),
        };

        // Law of cosines for the angle at the proximal joint between the
        // target line and the proximal link, and the matching angle at the
        // target between the target line and the forearm link.
        let proximal_cos = clamp_unit_with_slack(
            (r_sq + l1.powi(2) - l2.powi(2)) / (2.0 * r_m * l1),
            ACOS_SLACK,
        )
        .ok_or_else(out_of_reach)?;

        let forearm_cos = clamp_unit_with_slack(
            (r_sq + l2.powi(2) - l1.powi(2)) / (2.0 * r_m * l2),
            ACOS_SLACK,
        )
        .ok_or_else(out_of_reach)?;

        // atan2 agrees with atan(y/x) for x > 0 and keeps goals behind the base
        // (x < 0) in their own quadrant.
        let bearing_rad = target.y_m.atan2(target.x_m);

        let angles = JointAngles {
            proximal_rad: bearing_rad + proximal_cos.acos(),
            forearm_rad: bearing_rad - forearm_cos.acos(),
        };

        trace!(
            "IK ({:.4}, {:.4}) -> proximal {:.4} rad, forearm {:.4} rad",
            target.x_m,
            target.y_m,
            angles.proximal_rad,
            angles.forearm_rad
        );

        Ok(angles)
    }
}
