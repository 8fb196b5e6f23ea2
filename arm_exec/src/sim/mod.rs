//! # Simulated arm
//!
//! A simple plant model of the arm used when no hardware is present. The arm
//! is integrated with the same joint-space dynamics the controller uses for
//! its feed-forward, plus viscous damping at the joints. Voltage demands are
//! clamped to the supply voltage, and when both demands are zero the joint
//! brakes hold the arm still.
//!
//! The plant is shared between a [`SimSensor`] and a [`SimActuator`] so that
//! the control loop can be given independent sensing and actuation handles.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{cell::RefCell, rc::Rc};

use log::trace;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::arm_ctrl::{
    dynamics::{ArmDynamics, DynamicsParams},
    kinematics::ArmGeometry,
    ArmVoltages, JointActuator, JointAngles, JointIoError, JointSensor, JointState,
};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated arm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    /// Mass properties and motor constants of the simulated arm. These may
    /// differ from the ones given to the controller to simulate model error.
    pub dynamics: DynamicsParams,

    /// Viscous friction at each joint.
    ///
    /// Units: newton meters/(radians/second)
    #[serde(default)]
    pub proximal_damping_nms: f64,

    /// Units: newton meters/(radians/second)
    #[serde(default)]
    pub forearm_damping_nms: f64,

    /// Maximum magnitude of the voltage applied to either motor.
    ///
    /// Units: volts
    pub supply_voltage_v: f64,

    /// If true the joints are held still whenever both voltage demands are
    /// zero.
    #[serde(default)]
    pub brake_on_zero: bool,

    /// Joint angles at the start of the simulation.
    #[serde(default)]
    pub initial_angles: JointAngles,
}

/// The simulated arm plant.
#[derive(Debug, Clone)]
pub struct SimArm {
    params: SimParams,
    dynamics: ArmDynamics,

    state: JointState,

    /// Voltages currently applied, after clamping.
    voltages: ArmVoltages,

    /// Total simulated time.
    ///
    /// Units: seconds
    time_s: f64,
}

/// A simulated arm shared by several handles.
pub type SharedSimArm = Rc<RefCell<SimArm>>;

/// Joint sensor reading the simulated arm state.
#[derive(Debug, Clone)]
pub struct SimSensor {
    arm: SharedSimArm,
}

/// Joint actuator applying voltages to the simulated arm.
#[derive(Debug, Clone)]
pub struct SimActuator {
    arm: SharedSimArm,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Invalid simulation parameters: {0}")]
    InvalidParams(String),

    #[error("The simulated arm's mass matrix is singular at {0:?}")]
    SingularMassMatrix(JointState),

    #[error("Invalid simulation time step: {0} s")]
    InvalidTimeStep(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimArm {
    /// Create a new simulated arm at rest in its initial configuration.
    pub fn new(geometry: &ArmGeometry, params: SimParams) -> Result<Self, SimError> {
        let d = &params.dynamics;

        if !d.has_mass() {
            return Err(SimError::InvalidParams(
                "the simulated arm must have mass".into(),
            ));
        }
        if d.proximal_volts_per_nm <= 0.0 || d.forearm_volts_per_nm <= 0.0 {
            return Err(SimError::InvalidParams(
                "motor torque constants must be positive".into(),
            ));
        }
        if !(params.supply_voltage_v > 0.0) {
            return Err(SimError::InvalidParams(format!(
                "supply voltage must be positive, found {} V",
                params.supply_voltage_v
            )));
        }
        if !params.initial_angles.is_finite() {
            return Err(SimError::InvalidParams(
                "initial joint angles must be finite".into(),
            ));
        }

        let dynamics = ArmDynamics::new(geometry, params.dynamics);
        let state = JointState::at_rest(params.initial_angles);

        Ok(Self {
            params,
            dynamics,
            state,
            voltages: ArmVoltages::zero(),
            time_s: 0.0,
        })
    }

    /// Wrap the arm so it can be shared by a sensor and an actuator.
    pub fn into_shared(self) -> SharedSimArm {
        Rc::new(RefCell::new(self))
    }

    pub fn state(&self) -> &JointState {
        &self.state
    }

    pub fn voltages(&self) -> &ArmVoltages {
        &self.voltages
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    /// Apply voltages to the motors, clamped to the supply voltage.
    pub fn apply(&mut self, voltages: &ArmVoltages) {
        let v_max = self.params.supply_voltage_v;
        self.voltages = ArmVoltages {
            proximal_v: clamp(voltages.proximal_v, -v_max, v_max),
            forearm_v: clamp(voltages.forearm_v, -v_max, v_max),
        };
    }

    /// Advance the simulation by `dt_s` seconds under the applied voltages.
    ///
    /// Uses semi-implicit Euler integration: rates are updated first and the
    /// new rates are used to update the angles.
    pub fn step(&mut self, dt_s: f64) -> Result<(), SimError> {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return Err(SimError::InvalidTimeStep(dt_s));
        }
        self.time_s += dt_s;

        if self.params.brake_on_zero && self.voltages == ArmVoltages::zero() {
            self.state.proximal_rate_rads = 0.0;
            self.state.forearm_rate_rads = 0.0;
            return Ok(());
        }

        let rates = Vector2::new(self.state.proximal_rate_rads, self.state.forearm_rate_rads);
        let damping = Vector2::new(
            self.params.proximal_damping_nms * rates[0],
            self.params.forearm_damping_nms * rates[1],
        );
        let torque_nm = self.dynamics.motor_torque(&self.voltages, &self.state) - damping;

        let accel_rads2 = self
            .dynamics
            .forward_dynamics(&self.state, &torque_nm)
            .ok_or(SimError::SingularMassMatrix(self.state))?;

        self.state.proximal_rate_rads += accel_rads2[0] * dt_s;
        self.state.forearm_rate_rads += accel_rads2[1] * dt_s;
        self.state.proximal_rad += self.state.proximal_rate_rads * dt_s;
        self.state.forearm_rad += self.state.forearm_rate_rads * dt_s;

        trace!("SimArm t = {:.3} s, state {:?}", self.time_s, self.state);

        Ok(())
    }
}

impl SimSensor {
    pub fn new(arm: SharedSimArm) -> Self {
        Self { arm }
    }
}

impl SimActuator {
    pub fn new(arm: SharedSimArm) -> Self {
        Self { arm }
    }
}

impl JointSensor for SimSensor {
    fn read_joint_state(&mut self) -> Result<JointState, JointIoError> {
        self.arm
            .try_borrow()
            .map(|arm| *arm.state())
            .map_err(|e| JointIoError::Sensor(e.to_string()))
    }
}

impl JointActuator for SimActuator {
    fn write_voltages(&mut self, voltages: &ArmVoltages) -> Result<(), JointIoError> {
        self.arm
            .try_borrow_mut()
            .map(|mut arm| arm.apply(voltages))
            .map_err(|e| JointIoError::Actuator(e.to_string()))
    }
}
