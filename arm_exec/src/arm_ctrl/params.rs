//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{
    controller::FeedbackGains,
    dynamics::DynamicsParams,
    kinematics::{ArmGeometry, KinematicsError},
    profile::{JointConstraints, MotionConstraints, ProfileError},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for arm control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----
    /// Length of the proximal link, from the shoulder to the elbow.
    ///
    /// Units: meters
    pub proximal_length_m: f64,

    /// Length of the forearm link, from the elbow to the end effector.
    ///
    /// Units: meters
    pub forearm_length_m: f64,

    // ---- CAPABILITIES ----
    /// Units: radians/second
    pub proximal_max_rate_rads: f64,

    /// Units: radians/second^2
    pub proximal_max_accel_rads2: f64,

    /// Units: radians/second
    pub forearm_max_rate_rads: f64,

    /// Units: radians/second^2
    pub forearm_max_accel_rads2: f64,

    // ---- CONTROLLER ----
    /// Units: volts/radian
    pub proximal_k_p: f64,

    /// Units: volts/(radian/second)
    pub proximal_k_d: f64,

    /// Units: volts/radian
    pub forearm_k_p: f64,

    /// Units: volts/(radian/second)
    pub forearm_k_d: f64,

    /// Optional dynamics model for the feed-forward term. When the table is
    /// missing the controller is the plain per-joint PD.
    #[serde(default)]
    pub dynamics: DynamicsParams,

    // ---- TIMING ----
    /// Period of the control loop, which is also the step in profile time
    /// taken on each cycle.
    ///
    /// Units: seconds
    #[serde(default = "default_control_period_s")]
    pub control_period_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    pub fn geometry(&self) -> Result<ArmGeometry, KinematicsError> {
        ArmGeometry::new(self.proximal_length_m, self.forearm_length_m)
    }

    pub fn constraints(&self) -> Result<JointConstraints, ProfileError> {
        Ok(JointConstraints {
            proximal: MotionConstraints::new(
                self.proximal_max_rate_rads,
                self.proximal_max_accel_rads2,
            )?,
            forearm: MotionConstraints::new(
                self.forearm_max_rate_rads,
                self.forearm_max_accel_rads2,
            )?,
        })
    }

    pub fn gains(&self) -> FeedbackGains {
        FeedbackGains {
            proximal_k_p: self.proximal_k_p,
            proximal_k_d: self.proximal_k_d,
            forearm_k_p: self.forearm_k_p,
            forearm_k_d: self.forearm_k_d,
        }
    }
}

fn default_control_period_s() -> f64 {
    0.02
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use util::params;

    /// Parameters of the reference arm used across the arm_ctrl tests.
    pub(crate) fn test_params() -> Params {
        Params {
            proximal_length_m: 0.5,
            forearm_length_m: 0.4,
            proximal_max_rate_rads: 2.0,
            proximal_max_accel_rads2: 4.0,
            forearm_max_rate_rads: 2.0,
            forearm_max_accel_rads2: 4.0,
            proximal_k_p: 12.0,
            proximal_k_d: 1.5,
            forearm_k_p: 12.0,
            forearm_k_d: 1.5,
            dynamics: DynamicsParams::default(),
            control_period_s: 0.02,
        }
    }

    #[test]
    fn test_load_without_dynamics() {
        let p: Params = params::from_toml_str(
            r#"
            proximal_length_m = 0.5
            forearm_length_m = 0.4
            proximal_max_rate_rads = 2.0
            proximal_max_accel_rads2 = 4.0
            forearm_max_rate_rads = 3.0
            forearm_max_accel_rads2 = 6.0
            proximal_k_p = 12.0
            proximal_k_d = 1.5
            forearm_k_p = 10.0
            forearm_k_d = 1.0
            "#,
        )
        .unwrap();

        assert_eq!(p.control_period_s, 0.02);
        assert!(!p.dynamics.has_mass());
        assert_eq!(p.geometry().unwrap().max_reach_m(), 0.9);
        assert_eq!(p.constraints().unwrap().forearm.max_velocity_rads(), 3.0);
        assert_eq!(p.gains().forearm_k_p, 10.0);
    }

    #[test]
    fn test_load_with_dynamics() {
        let p: Params = params::from_toml_str(
            r#"
            proximal_length_m = 0.5
            forearm_length_m = 0.4
            proximal_max_rate_rads = 2.0
            proximal_max_accel_rads2 = 4.0
            forearm_max_rate_rads = 2.0
            forearm_max_accel_rads2 = 4.0
            proximal_k_p = 12.0
            proximal_k_d = 1.5
            forearm_k_p = 12.0
            forearm_k_d = 1.5
            control_period_s = 0.01

            [dynamics]
            proximal_mass_kg = 2.0
            proximal_com_m = 0.25
            forearm_mass_kg = 1.0
            forearm_com_m = 0.2
            gravity_ms2 = 9.81
            "#,
        )
        .unwrap();

        assert_eq!(p.control_period_s, 0.01);
        assert!(p.dynamics.has_mass());
        assert_eq!(p.dynamics.forearm_inertia_kgm2, 0.0);
    }

    #[test]
    fn test_invalid_values() {
        let mut p = test_params();
        p.forearm_length_m = 0.0;
        assert!(p.geometry().is_err());

        let mut p = test_params();
        p.proximal_max_accel_rads2 = -1.0;
        assert!(p.constraints().is_err());
    }
}
