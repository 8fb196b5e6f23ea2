//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use super::{
    controller::{ArmFeedbackController, JointErrors},
    dynamics::ArmDynamics,
    kinematics::KinematicsSolver,
    profile::{MotionProfileGenerator, ProfileError, ProfilePair},
    ArmCtrlError, ArmSetpoint, ArmVoltages, CartesianPoint, JointActuator, JointAngles,
    JointSensor, JointState, Params,
};
use comms_if::tc::arm_ctrl::ArmCmd;
use util::{module::State, time::cycles_to_seconds};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state.
///
/// Owns the sensing and actuation handles it is constructed with, and the
/// profile currently being tracked.
pub struct ArmCtrl<S, A> {
    params: Params,

    solver: KinematicsSolver,
    generator: MotionProfileGenerator,
    controller: ArmFeedbackController,

    sensor: S,
    actuator: A,

    mode: ArmMode,

    /// Profile being tracked, only `Some` while in `ArmMode::Tracking`.
    profile: Option<ProfilePair>,

    /// Number of cycles processed since the current profile started.
    num_profile_cycles: u64,
}

/// Input data to Arm Control.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// The command to be executed, or `None` if there is no new command on
    /// this cycle.
    pub cmd: Option<ArmCmd>,
}

/// Voltages written to the actuator on this cycle, `None` if nothing was
/// written.
pub type OutputData = Option<ArmVoltages>;

/// Status report for ArmCtrl processing.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// Mode at the end of the cycle.
    pub mode: ArmMode,

    /// Time into the current profile.
    ///
    /// Units: seconds
    pub elapsed_s: f64,

    /// Setpoint tracked on this cycle.
    pub setpoint: ArmSetpoint,

    /// Joint state measured on this cycle.
    pub measured: JointState,

    /// Setpoint minus measured state.
    pub errors: JointErrors,

    /// A goal was received on this cycle and rejected.
    pub goal_rejected: bool,

    /// The profile finished on this cycle and the arm returned to idle.
    pub profile_complete: bool,

    /// A stop was executed on this cycle.
    pub stopped: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Modes of the arm controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArmMode {
    /// No motion, nothing is written to the actuator.
    Idle,

    /// Following a profile towards a goal.
    Tracking,
}

impl Default for ArmMode {
    fn default() -> Self {
        ArmMode::Idle
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<S, A> ArmCtrl<S, A>
where
    S: JointSensor,
    A: JointActuator,
{
    /// Create a new arm controller in `Idle`.
    ///
    /// The parameters are validated here. Invalid geometry, constraints, gains
    /// or control period are rejected with `ArmCtrlError::InvalidParams`.
    pub fn new(params: Params, sensor: S, actuator: A) -> Result<Self, ArmCtrlError> {
        let geometry = params
            .geometry()
            .map_err(|e| ArmCtrlError::InvalidParams(e.to_string()))?;
        let constraints = params
            .constraints()
            .map_err(|e| ArmCtrlError::InvalidParams(e.to_string()))?;

        if !(params.control_period_s.is_finite() && params.control_period_s > 0.0) {
            return Err(ArmCtrlError::InvalidParams(format!(
                "control period must be positive, found {} s",
                params.control_period_s
            )));
        }

        let gains = params.gains();
        if !gains.is_finite() {
            return Err(ArmCtrlError::InvalidParams(format!(
                "feedback gains must be finite, found {:?}",
                gains
            )));
        }

        let solver = KinematicsSolver::new(geometry);
        let controller = ArmFeedbackController::new(
            gains,
            Some(ArmDynamics::new(&geometry, params.dynamics)),
        );

        debug!(
            "ArmCtrl created, reach [{:.3}, {:.3}] m, feed-forward {}",
            geometry.min_reach_m(),
            geometry.max_reach_m(),
            if controller.has_feedforward() { "on" } else { "off" }
        );

        Ok(Self {
            solver,
            generator: MotionProfileGenerator::new(solver, constraints),
            controller,
            params,
            sensor,
            actuator,
            mode: ArmMode::Idle,
            profile: None,
            num_profile_cycles: 0,
        })
    }

    pub fn mode(&self) -> ArmMode {
        self.mode
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn solver(&self) -> &KinematicsSolver {
        &self.solver
    }

    /// The profile currently being tracked, if any.
    pub fn profile(&self) -> Option<&ProfilePair> {
        self.profile.as_ref()
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Bring the arm to a safe state.
    ///
    /// Behaves exactly like a stop command: a single zero voltage demand is
    /// written and the controller returns to idle.
    pub fn make_safe(&mut self) -> Result<(), ArmCtrlError> {
        warn!("ArmCtrl making safe");
        self.stop()
    }

    /// Write zero voltage once and drop any profile.
    fn stop(&mut self) -> Result<(), ArmCtrlError> {
        self.enter_idle();
        self.actuator.write_voltages(&ArmVoltages::zero())?;
        Ok(())
    }

    fn enter_idle(&mut self) {
        if self.mode != ArmMode::Idle {
            info!("ArmCtrl mode: {:?} -> Idle", self.mode);
        }
        self.mode = ArmMode::Idle;
        self.profile = None;
        self.num_profile_cycles = 0;
    }

    /// Try to start a new profile from the measured state towards the goal.
    ///
    /// On failure the current profile is left untouched.
    fn start_goal(&mut self, cmd: &ArmCmd, measured: &JointState) -> Result<(), ArmCtrlError> {
        let target = match *cmd {
            ArmCmd::Goal { x_m, y_m } => self
                .solver
                .inverse(&CartesianPoint::new(x_m, y_m))
                .map_err(ProfileError::from)?,
            ArmCmd::Joints {
                proximal_rad,
                forearm_rad,
            } => JointAngles::new(proximal_rad, forearm_rad),
            ArmCmd::Stop => return Ok(()),
        };

        let profile = self
            .generator
            .build_pair_from_joints(&measured.angles(), &target)?;

        info!(
            "ArmCtrl new goal {:?}: target ({:.4}, {:.4}) rad, duration {:.3} s",
            cmd,
            target.proximal_rad,
            target.forearm_rad,
            profile.total_duration_s()
        );
        if self.mode != ArmMode::Tracking {
            info!("ArmCtrl mode: {:?} -> Tracking", self.mode);
        }

        self.profile = Some(profile);
        self.num_profile_cycles = 0;
        self.mode = ArmMode::Tracking;

        Ok(())
    }
}

impl<S, A> State for ArmCtrl<S, A>
where
    S: JointSensor,
    A: JointActuator,
{
    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = ArmCtrlError;

    /// Perform cyclic processing of Arm Control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut report = StatusReport::default();

        // A stop does not need a measurement, so handle it before the sensor
        // is read.
        if let Some(ArmCmd::Stop) = input_data.cmd {
            info!("ArmCtrl stop commanded");
            self.stop()?;
            report.mode = self.mode;
            report.stopped = true;
            return Ok((Some(ArmVoltages::zero()), report));
        }

        let measured = self.sensor.read_joint_state()?;
        if !measured.is_finite() {
            return Err(ArmCtrlError::InvalidMeasurement(measured));
        }
        report.measured = measured;

        if let Some(ref cmd) = input_data.cmd {
            if let Err(e) = self.start_goal(cmd, &measured) {
                warn!("ArmCtrl {:?}: {}", cmd, e);
                report.goal_rejected = true;
            }
        }

        let profile = match self.profile {
            Some(p) if self.mode == ArmMode::Tracking => p,
            _ => {
                report.mode = self.mode;
                return Ok((None, report));
            }
        };

        let elapsed_s = cycles_to_seconds(self.num_profile_cycles, self.params.control_period_s);
        report.elapsed_s = elapsed_s;

        if elapsed_s > profile.total_duration_s() {
            info!("ArmCtrl profile complete after {:.3} s", elapsed_s);
            self.stop()?;
            report.mode = self.mode;
            report.profile_complete = true;
            return Ok((Some(ArmVoltages::zero()), report));
        }

        let setpoint = profile.query(elapsed_s);
        if !setpoint.is_finite() {
            self.stop()?;
            return Err(ArmCtrlError::NonFiniteSetpoint(setpoint));
        }

        let voltages = self.controller.calculate(&measured, &setpoint);
        self.actuator.write_voltages(&voltages)?;
        self.num_profile_cycles += 1;

        trace!(
            "ArmCtrl t = {:.3} s, setpoint ({:.4}, {:.4}) rad, output ({:.3}, {:.3}) V",
            elapsed_s,
            setpoint.proximal.position_rad,
            setpoint.forearm.position_rad,
            voltages.proximal_v,
            voltages.forearm_v
        );

        report.mode = self.mode;
        report.setpoint = setpoint;
        report.errors = JointErrors::between(&measured, &setpoint);

        Ok((Some(voltages), report))
    }
}
