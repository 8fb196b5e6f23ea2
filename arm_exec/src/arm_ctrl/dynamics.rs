//! # Joint-space dynamics of the two link arm
//!
//! The arm is modelled as two rigid links moving in a vertical plane, using
//! the same absolute angle convention as the kinematics. In joint space the
//! generalised torques are
//!
//! ```text
//! τ = M(θ) α + C(θ, ω) + G(θ)
//! ```
//!
//! where, with `c = m2 L1 r2`,
//!
//! ```text
//! M = | m1 r1² + I1 + m2 L1²     c cos(θ1 - θ2) |
//!     | c cos(θ1 - θ2)           m2 r2² + I2    |
//!
//! C = |  c sin(θ1 - θ2) ω2² |      G = | (m1 r1 + m2 L1) g cos θ1 |
//!     | -c sin(θ1 - θ2) ω1² |          | m2 r2 g cos θ2           |
//! ```
//!
//! `r1`, `r2` are the distances from each joint to its link's centre of mass
//! and `I1`, `I2` the link inertias about their centres of mass. The coupling
//! terms in `M` and `C` are what distinguish a double jointed arm from two
//! independent joints.
//!
//! Motor voltage is related to the joint torque and rate by a linear model,
//! `V = kτ τ + kω ω`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use super::{kinematics::ArmGeometry, ArmSetpoint, ArmVoltages, JointState};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mass properties and motor constants of the arm.
///
/// The default (all zero) describes a massless arm, for which every torque
/// and feed-forward voltage is zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsParams {
    // ---- PROXIMAL LINK ----
    /// Units: kilograms
    pub proximal_mass_kg: f64,

    /// Distance from the proximal joint to the proximal link's centre of mass.
    ///
    /// Units: meters
    pub proximal_com_m: f64,

    /// Inertia of the proximal link about its centre of mass.
    ///
    /// Units: kilogram meters^2
    pub proximal_inertia_kgm2: f64,

    // ---- FOREARM LINK ----
    /// Units: kilograms
    pub forearm_mass_kg: f64,

    /// Distance from the forearm joint to the forearm link's centre of mass.
    ///
    /// Units: meters
    pub forearm_com_m: f64,

    /// Inertia of the forearm link about its centre of mass.
    ///
    /// Units: kilogram meters^2
    pub forearm_inertia_kgm2: f64,

    // ---- ENVIRONMENT ----
    /// Units: meters/second^2
    pub gravity_ms2: f64,

    // ---- MOTORS ----
    /// Voltage needed per unit of proximal joint torque.
    ///
    /// Units: volts/newton meter
    pub proximal_volts_per_nm: f64,

    /// Voltage needed per unit of forearm joint torque.
    ///
    /// Units: volts/newton meter
    pub forearm_volts_per_nm: f64,

    /// Back EMF of the proximal motor per unit of joint rate.
    ///
    /// Units: volts/(radians/second)
    pub proximal_volts_per_rads: f64,

    /// Back EMF of the forearm motor per unit of joint rate.
    ///
    /// Units: volts/(radians/second)
    pub forearm_volts_per_rads: f64,
}

/// Dynamics model of the arm.
#[derive(Debug, Clone, Copy)]
pub struct ArmDynamics {
    proximal_length_m: f64,
    params: DynamicsParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DynamicsParams {
    /// Returns true if the parameters describe an arm with mass, i.e. one for
    /// which the dynamics terms are not all zero.
    pub fn has_mass(&self) -> bool {
        self.proximal_mass_kg != 0.0 || self.forearm_mass_kg != 0.0
    }
}

impl ArmDynamics {
    pub fn new(geometry: &ArmGeometry, params: DynamicsParams) -> Self {
        Self {
            proximal_length_m: geometry.proximal_length_m(),
            params,
        }
    }

    pub fn params(&self) -> &DynamicsParams {
        &self.params
    }

    /// The joint-space mass matrix at the given angles.
    pub fn mass_matrix(&self, state: &JointState) -> Matrix2<f64> {
        let p = &self.params;
        let coupling = self.coupling() * (state.proximal_rad - state.forearm_rad).cos();

        Matrix2::new(
            p.proximal_mass_kg * p.proximal_com_m.powi(2)
                + p.proximal_inertia_kgm2
                + p.forearm_mass_kg * self.proximal_length_m.powi(2),
            coupling,
            coupling,
            p.forearm_mass_kg * p.forearm_com_m.powi(2) + p.forearm_inertia_kgm2,
        )
    }

    /// Coriolis and centrifugal torques at the given state.
    pub fn coriolis(&self, state: &JointState) -> Vector2<f64> {
        let k = self.coupling() * (state.proximal_rad - state.forearm_rad).sin();

        Vector2::new(
            k * state.forearm_rate_rads.powi(2),
            -k * state.proximal_rate_rads.powi(2),
        )
    }

    /// Torques needed to hold the arm still against gravity.
    pub fn gravity(&self, state: &JointState) -> Vector2<f64> {
        let p = &self.params;

        Vector2::new(
            (p.proximal_mass_kg * p.proximal_com_m + p.forearm_mass_kg * self.proximal_length_m)
                * p.gravity_ms2
                * state.proximal_rad.cos(),
            p.forearm_mass_kg * p.forearm_com_m * p.gravity_ms2 * state.forearm_rad.cos(),
        )
    }

    /// Torques producing the given joint accelerations from the given state.
    pub fn inverse_dynamics(&self, state: &JointState, accel_rads2: &Vector2<f64>) -> Vector2<f64> {
        self.mass_matrix(state) * accel_rads2 + self.coriolis(state) + self.gravity(state)
    }

    /// Joint accelerations produced by the given torques from the given state.
    ///
    /// Returns `None` if the mass matrix is singular, which is the case for a
    /// massless arm.
    pub fn forward_dynamics(
        &self,
        state: &JointState,
        torque_nm: &Vector2<f64>,
    ) -> Option<Vector2<f64>> {
        self.mass_matrix(state)
            .try_inverse()
            .map(|m_inv| m_inv * (torque_nm - self.coriolis(state) - self.gravity(state)))
    }

    /// Feed-forward voltages which track the setpoint on an ideal arm.
    pub fn feedforward(&self, setpoint: &ArmSetpoint) -> ArmVoltages {
        let state = JointState {
            proximal_rad: setpoint.proximal.position_rad,
            forearm_rad: setpoint.forearm.position_rad,
            proximal_rate_rads: setpoint.proximal.velocity_rads,
            forearm_rate_rads: setpoint.forearm.velocity_rads,
        };
        let accel_rads2 = Vector2::new(
            setpoint.proximal.acceleration_rads2,
            setpoint.forearm.acceleration_rads2,
        );

        let torque_nm = self.inverse_dynamics(&state, &accel_rads2);

        ArmVoltages {
            proximal_v: self.params.proximal_volts_per_nm * torque_nm[0]
                + self.params.proximal_volts_per_rads * state.proximal_rate_rads,
            forearm_v: self.params.forearm_volts_per_nm * torque_nm[1]
                + self.params.forearm_volts_per_rads * state.forearm_rate_rads,
        }
    }

    /// Joint torques produced by the motors under the given voltages, the
    /// inverse of the voltage model. A joint with no torque constant produces
    /// no torque.
    pub fn motor_torque(&self, voltages: &ArmVoltages, state: &JointState) -> Vector2<f64> {
        let p = &self.params;
        let torque = |volts: f64, volts_per_nm: f64, volts_per_rads: f64, rate_rads: f64| {
            if volts_per_nm == 0.0 {
                0.0
            } else {
                (volts - volts_per_rads * rate_rads) / volts_per_nm
            }
        };

        Vector2::new(
            torque(
                voltages.proximal_v,
                p.proximal_volts_per_nm,
                p.proximal_volts_per_rads,
                state.proximal_rate_rads,
            ),
            torque(
                voltages.forearm_v,
                p.forearm_volts_per_nm,
                p.forearm_volts_per_rads,
                state.forearm_rate_rads,
            ),
        )
    }

    /// Magnitude of the cross-joint inertia, `m2 L1 r2`.
    fn coupling(&self) -> f64 {
        self.params.forearm_mass_kg * self.proximal_length_m * self.params.forearm_com_m
    }
}
