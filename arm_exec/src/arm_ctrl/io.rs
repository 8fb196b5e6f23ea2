//! Sensing and actuation interfaces of the arm
//!
//! The control loop never owns hardware directly. It is handed one
//! [`JointSensor`] and one [`JointActuator`] at construction, which may be the
//! real motor controllers, the simulated arm, or test doubles.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{ArmVoltages, JointState};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Source of the measured joint state.
pub trait JointSensor {
    /// Read the current angles and rates of both joints.
    fn read_joint_state(&mut self) -> Result<JointState, JointIoError>;
}

/// Sink for the motor voltage demands.
///
/// Implementors are responsible for limiting the demands to what the hardware
/// can deliver.
pub trait JointActuator {
    fn write_voltages(&mut self, voltages: &ArmVoltages) -> Result<(), JointIoError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum JointIoError {
    #[error("Could not read the joint state: {0}")]
    Sensor(String),

    #[error("Could not write the joint voltages: {0}")]
    Actuator(String),

    #[error("The joint hardware is not connected")]
    NotConnected,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T: JointSensor + ?Sized> JointSensor for Box<T> {
    fn read_joint_state(&mut self) -> Result<JointState, JointIoError> {
        (**self).read_joint_state()
    }
}

impl<T: JointActuator + ?Sized> JointActuator for Box<T> {
    fn write_voltages(&mut self, voltages: &ArmVoltages) -> Result<(), JointIoError> {
        (**self).write_voltages(voltages)
    }
}
