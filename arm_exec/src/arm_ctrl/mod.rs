//! Arm control module
//!
//! Drives the two link arm from a goal position to closed-loop motor voltages:
//! inverse kinematics gives the target joint angles, a trapezoidal profile per
//! joint gives time-indexed setpoints, and the feedback controller turns the
//! setpoint and measured state into voltages on every control cycle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod arm_config;
pub mod controller;
pub mod dynamics;
mod io;
pub mod kinematics;
mod params;
pub mod profile;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use arm_config::*;
pub use io::*;
pub use params::*;
pub use profile::{ArmSetpoint, TrapezoidSetpoint};
pub use state::*;

#[cfg(test)]
pub(crate) use params::tests::test_params;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Invalid arm parameters: {0}")]
    InvalidParams(String),

    #[error("Goal rejected: {0}")]
    GoalRejected(#[from] profile::ProfileError),

    #[error("The measured joint state is not finite: {0:?}")]
    InvalidMeasurement(JointState),

    #[error("The profile produced a non-finite setpoint: {0:?}")]
    NonFiniteSetpoint(ArmSetpoint),

    #[error("Joint I/O failed: {0}")]
    JointIo(#[from] JointIoError),
}
