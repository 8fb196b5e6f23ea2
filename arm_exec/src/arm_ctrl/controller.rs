//! # Arm feedback controller
//!
//! The double jointed arm controller computes motor voltages from the measured
//! and demanded joint states. Each joint has its own proportional-derivative
//! feedback law on the position and velocity errors. When a dynamics model is
//! supplied a feed-forward term is added which accounts for the coupling
//! between the joints and for gravity, see [`super::dynamics`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{dynamics::ArmDynamics, ArmSetpoint, ArmVoltages, JointState};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Feedback gains for both joints.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackGains {
    /// Proximal position gain
    ///
    /// Units: volts/radian
    pub proximal_k_p: f64,

    /// Proximal velocity gain
    ///
    /// Units: volts/(radian/second)
    pub proximal_k_d: f64,

    /// Forearm position gain
    ///
    /// Units: volts/radian
    pub forearm_k_p: f64,

    /// Forearm velocity gain
    ///
    /// Units: volts/(radian/second)
    pub forearm_k_d: f64,
}

/// Tracking errors of both joints, demanded minus measured.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct JointErrors {
    pub proximal_rad: f64,
    pub forearm_rad: f64,
    pub proximal_rate_rads: f64,
    pub forearm_rate_rads: f64,
}

/// The double jointed arm controller.
#[derive(Debug, Clone, Copy)]
pub struct ArmFeedbackController {
    gains: FeedbackGains,

    /// Model used for feed-forward, `None` for pure feedback.
    dynamics: Option<ArmDynamics>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointErrors {
    /// Errors between the setpoint and the measured state.
    pub fn between(measured: &JointState, setpoint: &ArmSetpoint) -> Self {
        Self {
            proximal_rad: setpoint.proximal.position_rad - measured.proximal_rad,
            forearm_rad: setpoint.forearm.position_rad - measured.forearm_rad,
            proximal_rate_rads: setpoint.proximal.velocity_rads - measured.proximal_rate_rads,
            forearm_rate_rads: setpoint.forearm.velocity_rads - measured.forearm_rate_rads,
        }
    }
}

impl FeedbackGains {
    /// Returns true if every gain is a finite number.
    pub fn is_finite(&self) -> bool {
        self.proximal_k_p.is_finite()
            && self.proximal_k_d.is_finite()
            && self.forearm_k_p.is_finite()
            && self.forearm_k_d.is_finite()
    }
}

impl ArmFeedbackController {
    /// Create a new controller.
    ///
    /// Passing a dynamics model enables the coupled feed-forward term. A model
    /// of a massless arm contributes nothing and is dropped.
    pub fn new(gains: FeedbackGains, dynamics: Option<ArmDynamics>) -> Self {
        Self {
            gains,
            dynamics: dynamics.filter(|d| d.params().has_mass()),
        }
    }

    pub fn gains(&self) -> &FeedbackGains {
        &self.gains
    }

    /// Returns true if the controller includes the dynamics feed-forward.
    pub fn has_feedforward(&self) -> bool {
        self.dynamics.is_some()
    }

    /// Calculate the voltage demands for the measured state and setpoint.
    pub fn calculate(&self, measured: &JointState, setpoint: &ArmSetpoint) -> ArmVoltages {
        let err = JointErrors::between(measured, setpoint);
        let g = &self.gains;

        let feedback = ArmVoltages {
            proximal_v: g.proximal_k_p * err.proximal_rad + g.proximal_k_d * err.proximal_rate_rads,
            forearm_v: g.forearm_k_p * err.forearm_rad + g.forearm_k_d * err.forearm_rate_rads,
        };

        match self.dynamics {
            Some(ref d) => {
                let ff = d.feedforward(setpoint);
                ArmVoltages {
                    proximal_v: feedback.proximal_v + ff.proximal_v,
                    forearm_v: feedback.forearm_v + ff.forearm_v,
                }
            }
            None => feedback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm_ctrl::{
        dynamics::DynamicsParams, kinematics::ArmGeometry, profile::TrapezoidSetpoint,
        JointAngles,
    };

    const TOL: f64 = 1e-12;

    fn gains() -> FeedbackGains {
        FeedbackGains {
            proximal_k_p: 10.0,
            proximal_k_d: 1.0,
            forearm_k_p: 6.0,
            forearm_k_d: 0.5,
        }
    }

    fn setpoint(proximal: (f64, f64), forearm: (f64, f64)) -> ArmSetpoint {
        ArmSetpoint {
            proximal: TrapezoidSetpoint {
                position_rad: proximal.0,
                velocity_rads: proximal.1,
                acceleration_rads2: 0.0,
            },
            forearm: TrapezoidSetpoint {
                position_rad: forearm.0,
                velocity_rads: forearm.1,
                acceleration_rads2: 0.0,
            },
        }
    }

    #[test]
    fn test_zero_error() {
        let ctrl = ArmFeedbackController::new(gains(), None);
        let measured = JointState {
            proximal_rad: 0.7,
            forearm_rad: -0.2,
            proximal_rate_rads: 1.1,
            forearm_rate_rads: -0.4,
        };

        let v = ctrl.calculate(&measured, &setpoint((0.7, 1.1), (-0.2, -0.4)));
        assert_eq!(v, ArmVoltages::zero());
    }

    #[test]
    fn test_pd_law() {
        let ctrl = ArmFeedbackController::new(gains(), None);
        let measured = JointState {
            proximal_rad: 0.5,
            forearm_rad: 0.0,
            proximal_rate_rads: 0.0,
            forearm_rate_rads: 1.0,
        };

        let v = ctrl.calculate(&measured, &setpoint((0.6, 0.2), (-0.1, 0.0)));

        // 10 * 0.1 + 1 * 0.2
        assert!((v.proximal_v - 1.2).abs() < TOL);
        // 6 * -0.1 + 0.5 * -1.0
        assert!((v.forearm_v + 1.1).abs() < TOL);
    }

    #[test]
    fn test_joints_independent_without_dynamics() {
        let ctrl = ArmFeedbackController::new(gains(), None);
        let sp = setpoint((0.6, 0.0), (0.0, 0.0));

        // Moving the forearm does not change the proximal demand
        let a = ctrl.calculate(&JointState::at_rest(JointAngles::new(0.5, 0.0)), &sp);
        let b = ctrl.calculate(&JointState::at_rest(JointAngles::new(0.5, 1.0)), &sp);
        assert_eq!(a.proximal_v, b.proximal_v);
    }

    #[test]
    fn test_massless_dynamics_dropped() {
        let geom = ArmGeometry::new(0.5, 0.4).unwrap();
        let ctrl = ArmFeedbackController::new(
            gains(),
            Some(ArmDynamics::new(&geom, DynamicsParams::default())),
        );
        assert!(!ctrl.has_feedforward());
    }

    #[test]
    fn test_feedforward_holds_against_gravity() {
        let geom = ArmGeometry::new(0.5, 0.4).unwrap();
        let params = DynamicsParams {
            proximal_mass_kg: 2.0,
            proximal_com_m: 0.25,
            forearm_mass_kg: 1.0,
            forearm_com_m: 0.2,
            gravity_ms2: 9.81,
            proximal_volts_per_nm: 0.5,
            forearm_volts_per_nm: 0.8,
            ..Default::default()
        };
        let ctrl = ArmFeedbackController::new(gains(), Some(ArmDynamics::new(&geom, params)));
        assert!(ctrl.has_feedforward());

        // Zero tracking error with the arm horizontal: only the gravity
        // feed-forward remains.
        let v = ctrl.calculate(
            &JointState::at_rest(JointAngles::new(0.0, 0.0)),
            &setpoint((0.0, 0.0), (0.0, 0.0)),
        );
        assert!((v.proximal_v - 0.5 * (2.0 * 0.25 + 0.5) * 9.81).abs() < 1e-9);
        assert!((v.forearm_v - 0.8 * 0.2 * 9.81).abs() < 1e-9);

        // Accelerating the forearm needs extra proximal torque through the
        // coupling inertia, m2 L1 r2 = 0.1
        let mut accel = setpoint((0.0, 0.0), (0.0, 0.0));
        accel.forearm.acceleration_rads2 = 1.0;
        let w = ctrl.calculate(&JointState::at_rest(JointAngles::new(0.0, 0.0)), &accel);
        assert!((w.proximal_v - v.proximal_v - 0.5 * 0.1).abs() < 1e-9);
    }
}
