//! # Motion profiles
//!
//! Each joint follows its own trapezoidal velocity profile: accelerate at the
//! maximum acceleration up to the maximum velocity, cruise, then decelerate so
//! that the joint arrives at rest on the target. If the move is too short to
//! reach the maximum velocity the cruise phase vanishes and the profile is
//! triangular.
//!
//! Profiles are pure functions of the time since the start of the move, so
//! they can be queried in any order and restarted freely.
//!
//! The two joints are profiled independently and so will usually finish at
//! different times.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{
    kinematics::{KinematicsError, KinematicsSolver},
    CartesianPoint, JointAngles,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Velocity and acceleration limits for one joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionConstraints {
    /// Units: radians/second
    max_velocity_rads: f64,

    /// Units: radians/second^2
    max_acceleration_rads2: f64,
}

/// Motion constraints for both joints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointConstraints {
    pub proximal: MotionConstraints,
    pub forearm: MotionConstraints,
}

/// The state of a single joint at some time along its profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrapezoidSetpoint {
    /// Units: radians
    pub position_rad: f64,

    /// Units: radians/second
    pub velocity_rads: f64,

    /// Nominal acceleration of the profile at this time, zero outside the
    /// profile.
    ///
    /// Units: radians/second^2
    pub acceleration_rads2: f64,
}

/// The setpoint for both joints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmSetpoint {
    pub proximal: TrapezoidSetpoint,
    pub forearm: TrapezoidSetpoint,
}

/// A trapezoidal profile for a single joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidProfile {
    start_rad: f64,
    end_rad: f64,

    /// +1 or -1, the direction of travel.
    direction: f64,

    /// Highest velocity reached, either the maximum velocity or the triangular
    /// peak.
    peak_velocity_rads: f64,
    acceleration_rads2: f64,

    accel_duration_s: f64,
    cruise_duration_s: f64,
    total_duration_s: f64,

    shape: ProfileShape,
}

/// Profiles for both joints, starting at the same instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePair {
    pub proximal: TrapezoidProfile,
    pub forearm: TrapezoidProfile,
}

/// Builds profile pairs between arm configurations.
#[derive(Debug, Clone, Copy)]
pub struct MotionProfileGenerator {
    solver: KinematicsSolver,
    constraints: JointConstraints,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The shape of a velocity profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileShape {
    /// Start and end are the same, the joint never moves.
    Stationary,

    /// Accelerate then immediately decelerate, the maximum velocity is never
    /// reached.
    Triangular,

    /// Accelerate, cruise at the maximum velocity, decelerate.
    Trapezoidal,
}

/// Errors which can occur while building profiles.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("Invalid motion constraints: {0}")]
    InvalidConstraints(String),

    #[error("Profile endpoint is not finite (start {start_rad}, end {end_rad})")]
    NonFiniteEndpoint { start_rad: f64, end_rad: f64 },

    #[error("Profile from {start_rad} to {end_rad} has no finite duration")]
    UnboundedDuration { start_rad: f64, end_rad: f64 },

    #[error("Could not find the profile endpoints: {0}")]
    Kinematics(#[from] KinematicsError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionConstraints {
    /// Create new constraints, rejecting non-positive or non-finite limits.
    pub fn new(max_velocity_rads: f64, max_acceleration_rads2: f64) -> Result<Self, ProfileError> {
        if !max_velocity_rads.is_finite() || max_velocity_rads <= 0.0 {
            return Err(ProfileError::InvalidConstraints(format!(
                "maximum velocity must be positive, found {}",
                max_velocity_rads
            )));
        }
        if !max_acceleration_rads2.is_finite() || max_acceleration_rads2 <= 0.0 {
            return Err(ProfileError::InvalidConstraints(format!(
                "maximum acceleration must be positive, found {}",
                max_acceleration_rads2
            )));
        }

        Ok(Self {
            max_velocity_rads,
            max_acceleration_rads2,
        })
    }

    pub fn max_velocity_rads(&self) -> f64 {
        self.max_velocity_rads
    }

    pub fn max_acceleration_rads2(&self) -> f64 {
        self.max_acceleration_rads2
    }
}

impl JointConstraints {
    /// The same constraints on both joints.
    pub fn uniform(constraints: MotionConstraints) -> Self {
        Self {
            proximal: constraints,
            forearm: constraints,
        }
    }
}

impl TrapezoidSetpoint {
    /// A setpoint at rest at the given position.
    pub fn at_rest(position_rad: f64) -> Self {
        Self {
            position_rad,
            velocity_rads: 0.0,
            acceleration_rads2: 0.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position_rad.is_finite()
            && self.velocity_rads.is_finite()
            && self.acceleration_rads2.is_finite()
    }
}

impl ArmSetpoint {
    pub fn is_finite(&self) -> bool {
        self.proximal.is_finite() && self.forearm.is_finite()
    }
}

impl TrapezoidProfile {
    /// Build a profile from `start_rad` to `end_rad`, starting and ending at
    /// rest.
    pub fn new(
        start_rad: f64,
        end_rad: f64,
        constraints: &MotionConstraints,
    ) -> Result<Self, ProfileError> {
        if !start_rad.is_finite() || !end_rad.is_finite() {
            return Err(ProfileError::NonFiniteEndpoint { start_rad, end_rad });
        }

        let displacement_rad = end_rad - start_rad;
        if !displacement_rad.is_finite() {
            return Err(ProfileError::UnboundedDuration { start_rad, end_rad });
        }

        let distance_rad = displacement_rad.abs();
        let max_vel = constraints.max_velocity_rads;
        let max_acc = constraints.max_acceleration_rads2;

        // Distance covered accelerating to the maximum velocity then
        // decelerating back to rest.
        let full_speed_distance_rad = max_vel.powi(2) / max_acc;

        let (shape, peak_velocity_rads, accel_duration_s, cruise_duration_s) =
            if distance_rad == 0.0 {
                (ProfileShape::Stationary, 0.0, 0.0, 0.0)
            } else if distance_rad >= full_speed_distance_rad {
                (
                    ProfileShape::Trapezoidal,
                    max_vel,
                    max_vel / max_acc,
                    (distance_rad - full_speed_distance_rad) / max_vel,
                )
            } else {
                let accel_duration_s = (distance_rad / max_acc).sqrt();
                (
                    ProfileShape::Triangular,
                    max_acc * accel_duration_s,
                    accel_duration_s,
                    0.0,
                )
            };

        let total_duration_s = 2.0 * accel_duration_s + cruise_duration_s;
        if !total_duration_s.is_finite() {
            return Err(ProfileError::UnboundedDuration { start_rad, end_rad });
        }

        Ok(Self {
            start_rad,
            end_rad,
            direction: if displacement_rad < 0.0 { -1.0 } else { 1.0 },
            peak_velocity_rads,
            acceleration_rads2: max_acc,
            accel_duration_s,
            cruise_duration_s,
            total_duration_s,
            shape,
        })
    }

    /// Get the setpoint at `time_s` seconds after the start of the profile.
    ///
    /// Times before the start return the start state, times after the end
    /// return the end state, both at rest.
    pub fn query(&self, time_s: f64) -> TrapezoidSetpoint {
        if time_s <= 0.0 {
            return TrapezoidSetpoint::at_rest(self.start_rad);
        }
        if time_s >= self.total_duration_s {
            return TrapezoidSetpoint::at_rest(self.end_rad);
        }

        let acc = self.acceleration_rads2;
        let t_acc = self.accel_duration_s;
        let accel_distance_rad = 0.5 * acc * t_acc.powi(2);

        // Distance, speed and acceleration along the direction of travel
        let (distance_rad, speed_rads, accel_rads2) = if time_s < t_acc {
            (0.5 * acc * time_s.powi(2), acc * time_s, acc)
        } else if time_s < t_acc + self.cruise_duration_s {
            (
                accel_distance_rad + self.peak_velocity_rads * (time_s - t_acc),
                self.peak_velocity_rads,
                0.0,
            )
        } else {
            let t_dec = time_s - t_acc - self.cruise_duration_s;
            (
                accel_distance_rad
                    + self.peak_velocity_rads * self.cruise_duration_s
                    + self.peak_velocity_rads * t_dec
                    - 0.5 * acc * t_dec.powi(2),
                self.peak_velocity_rads - acc * t_dec,
                -acc,
            )
        };

        TrapezoidSetpoint {
            position_rad: self.start_rad + self.direction * distance_rad,
            velocity_rads: self.direction * speed_rads,
            acceleration_rads2: self.direction * accel_rads2,
        }
    }

    /// Duration of the profile.
    ///
    /// Units: seconds
    pub fn total_duration_s(&self) -> f64 {
        self.total_duration_s
    }

    pub fn shape(&self) -> ProfileShape {
        self.shape
    }

    /// Highest speed reached along the profile.
    ///
    /// Units: radians/second
    pub fn peak_velocity_rads(&self) -> f64 {
        self.peak_velocity_rads
    }

    pub fn start_rad(&self) -> f64 {
        self.start_rad
    }

    pub fn end_rad(&self) -> f64 {
        self.end_rad
    }
}

impl ProfilePair {
    /// Get the setpoint for both joints at `time_s` seconds after the start.
    pub fn query(&self, time_s: f64) -> ArmSetpoint {
        ArmSetpoint {
            proximal: self.proximal.query(time_s),
            forearm: self.forearm.query(time_s),
        }
    }

    /// Time at which the slower joint arrives.
    ///
    /// Units: seconds
    pub fn total_duration_s(&self) -> f64 {
        self.proximal.total_duration_s.max(self.forearm.total_duration_s)
    }

    /// Joint angles at the end of the profiles.
    pub fn end_angles(&self) -> JointAngles {
        JointAngles::new(self.proximal.end_rad, self.forearm.end_rad)
    }
}

impl MotionProfileGenerator {
    pub fn new(solver: KinematicsSolver, constraints: JointConstraints) -> Self {
        Self {
            solver,
            constraints,
        }
    }

    pub fn constraints(&self) -> &JointConstraints {
        &self.constraints
    }

    /// Build profiles moving the end effector from `start` to `end`.
    ///
    /// Both points go through inverse kinematics, then each joint is profiled
    /// independently in joint space.
    pub fn build_pair(
        &self,
        start: &CartesianPoint,
        end: &CartesianPoint,
    ) -> Result<ProfilePair, ProfileError> {
        let start_angles = self.solver.inverse(start)?;
        let end_angles = self.solver.inverse(end)?;

        self.build_pair_from_joints(&start_angles, &end_angles)
    }

    /// Build profiles moving the joints from `start` to `end`.
    pub fn build_pair_from_joints(
        &self,
        start: &JointAngles,
        end: &JointAngles,
    ) -> Result<ProfilePair, ProfileError> {
        Ok(ProfilePair {
            proximal: TrapezoidProfile::new(
                start.proximal_rad,
                end.proximal_rad,
                &self.constraints.proximal,
            )?,
            forearm: TrapezoidProfile::new(
                start.forearm_rad,
                end.forearm_rad,
                &self.constraints.forearm,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm_ctrl::kinematics::ArmGeometry;

    const TOL: f64 = 1e-9;

    fn constraints(max_vel: f64, max_acc: f64) -> MotionConstraints {
        MotionConstraints::new(max_vel, max_acc).unwrap()
    }

    #[test]
    fn test_constraint_validation() {
        assert!(MotionConstraints::new(2.0, 4.0).is_ok());
        assert!(matches!(
            MotionConstraints::new(0.0, 4.0),
            Err(ProfileError::InvalidConstraints(_))
        ));
        assert!(matches!(
            MotionConstraints::new(2.0, -1.0),
            Err(ProfileError::InvalidConstraints(_))
        ));
        assert!(matches!(
            MotionConstraints::new(f64::INFINITY, 4.0),
            Err(ProfileError::InvalidConstraints(_))
        ));
    }

    #[test]
    fn test_boundaries() {
        let p = TrapezoidProfile::new(0.5, -1.5, &constraints(2.0, 4.0)).unwrap();
        let total = p.total_duration_s();

        for &t in &[-10.0, -1e-9, 0.0] {
            assert_eq!(p.query(t), TrapezoidSetpoint::at_rest(0.5));
        }
        for &t in &[total, total + 1e-9, total + 10.0] {
            assert_eq!(p.query(t), TrapezoidSetpoint::at_rest(-1.5));
        }

        // Deterministic, repeated queries agree
        let mid = 0.37 * total;
        assert_eq!(p.query(mid), p.query(mid));
    }

    #[test]
    fn test_trapezoidal_shape() {
        // Triangular peak would be sqrt(2 * 4) = 2.83 rad/s, above the limit
        let p = TrapezoidProfile::new(0.0, 2.0, &constraints(2.0, 4.0)).unwrap();

        assert_eq!(p.shape(), ProfileShape::Trapezoidal);
        assert_eq!(p.peak_velocity_rads(), 2.0);

        // 0.5 s accelerating, 0.5 s cruising, 0.5 s decelerating
        assert!((p.total_duration_s() - 1.5).abs() < TOL);

        let cruise = p.query(0.75);
        assert!((cruise.velocity_rads - 2.0).abs() < TOL);
        assert!((cruise.position_rad - 1.0).abs() < TOL);
        assert_eq!(cruise.acceleration_rads2, 0.0);

        let accel = p.query(0.25);
        assert!((accel.velocity_rads - 1.0).abs() < TOL);
        assert!((accel.position_rad - 0.125).abs() < TOL);
        assert_eq!(accel.acceleration_rads2, 4.0);

        // Velocity never exceeds the limit
        for i in 0..=150 {
            let sp = p.query(i as f64 * 0.01);
            assert!(sp.velocity_rads <= 2.0 + TOL);
        }
    }

    #[test]
    fn test_triangular_shape() {
        let p = TrapezoidProfile::new(1.0, 0.75, &constraints(2.0, 4.0)).unwrap();

        assert_eq!(p.shape(), ProfileShape::Triangular);
        assert!(p.peak_velocity_rads() < 2.0);

        // 0.25 rad at 4 rad/s^2: 0.25 s each way
        assert!((p.total_duration_s() - 0.5).abs() < TOL);

        let peak = p.query(0.25);
        assert!((peak.velocity_rads + 1.0).abs() < TOL);
        assert!((peak.position_rad - 0.875).abs() < TOL);

        // Arrives at rest exactly on the target
        let just_before = p.query(0.5 - 1e-6);
        assert!((just_before.position_rad - 0.75).abs() < 1e-9);
        assert!(just_before.velocity_rads.abs() < 1e-5);
        assert_eq!(p.query(0.5), TrapezoidSetpoint::at_rest(0.75));
    }

    #[test]
    fn test_stationary_shape() {
        let p = TrapezoidProfile::new(0.3, 0.3, &constraints(2.0, 4.0)).unwrap();

        assert_eq!(p.shape(), ProfileShape::Stationary);
        assert_eq!(p.total_duration_s(), 0.0);
        assert_eq!(p.query(1.0), TrapezoidSetpoint::at_rest(0.3));
    }

    #[test]
    fn test_continuity() {
        let p = TrapezoidProfile::new(-0.4, 1.9, &constraints(1.5, 3.0)).unwrap();
        let dt = 1e-4;
        let mut prev = p.query(0.0);
        let mut t = dt;

        while t < p.total_duration_s() + dt {
            let sp = p.query(t);
            assert!((sp.position_rad - prev.position_rad).abs() < 1.5 * dt + 1e-9);
            assert!((sp.velocity_rads - prev.velocity_rads).abs() < 3.0 * dt + 1e-9);
            prev = sp;
            t += dt;
        }
    }

    #[test]
    fn test_non_finite_endpoint() {
        assert!(matches!(
            TrapezoidProfile::new(0.0, f64::NAN, &constraints(2.0, 4.0)),
            Err(ProfileError::NonFiniteEndpoint { .. })
        ));

        // Finite endpoints whose displacement overflows would never complete
        assert!(matches!(
            TrapezoidProfile::new(-1e308, 1e308, &constraints(2.0, 4.0)),
            Err(ProfileError::UnboundedDuration { .. })
        ));
        assert!(TrapezoidProfile::new(-1e3, 1e3, &constraints(2.0, 4.0))
            .unwrap()
            .total_duration_s()
            .is_finite());
    }

    #[test]
    fn test_end_to_end_pair() {
        let solver = KinematicsSolver::new(ArmGeometry::new(0.5, 0.4).unwrap());
        let gen = MotionProfileGenerator::new(
            solver,
            JointConstraints::uniform(constraints(2.0, 4.0)),
        );

        let goal = CartesianPoint::new(0.6, 0.3);
        let goal_angles = solver.inverse(&goal).unwrap();

        let reached = solver.forward_angles(&goal_angles);
        assert!((reached.x_m - 0.6).abs() < 1e-6);
        assert!((reached.y_m - 0.3).abs() < 1e-6);

        let pair = gen
            .build_pair_from_joints(&JointAngles::new(0.0, 0.0), &goal_angles)
            .unwrap();
        let total = pair.total_duration_s();
        assert!(total.is_finite() && total > 0.0);

        let start = pair.query(0.0);
        assert_eq!(start.proximal, TrapezoidSetpoint::at_rest(0.0));
        assert_eq!(start.forearm, TrapezoidSetpoint::at_rest(0.0));

        let end = pair.query(total);
        assert_eq!(end.proximal, TrapezoidSetpoint::at_rest(goal_angles.proximal_rad));
        assert_eq!(end.forearm, TrapezoidSetpoint::at_rest(goal_angles.forearm_rad));
        assert_eq!(pair.end_angles(), goal_angles);

        // The proximal move is long enough to cruise, the forearm move is not
        assert_eq!(pair.proximal.shape(), ProfileShape::Trapezoidal);
        assert_eq!(pair.forearm.shape(), ProfileShape::Triangular);
        assert!(pair.forearm.total_duration_s() < pair.proximal.total_duration_s());
    }

    #[test]
    fn test_build_pair_cartesian() {
        let solver = KinematicsSolver::new(ArmGeometry::new(0.5, 0.4).unwrap());
        let gen = MotionProfileGenerator::new(
            solver,
            JointConstraints::uniform(constraints(2.0, 4.0)),
        );

        let start = CartesianPoint::new(0.7, 0.1);
        let end = CartesianPoint::new(0.6, 0.3);
        let pair = gen.build_pair(&start, &end).unwrap();

        let start_angles = solver.inverse(&start).unwrap();
        assert_eq!(pair.query(0.0).proximal.position_rad, start_angles.proximal_rad);
        assert_eq!(pair.end_angles(), solver.inverse(&end).unwrap());

        assert!(matches!(
            gen.build_pair(&start, &CartesianPoint::new(2.0, 0.0)),
            Err(ProfileError::Kinematics(KinematicsError::OutOfReach { .. }))
        ));
    }
}
