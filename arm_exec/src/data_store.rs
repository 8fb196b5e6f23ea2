//! # Data Store

use log::{info, warn};
use serde::Serialize;

use crate::arm_ctrl::{self, ArmMode, ArmVoltages, JointState};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the arm has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    MakeSafeTc,
    ArmCtrlFault,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// Session elapsed time at the start of the cycle
    pub sim_time_s: f64,

    // Safe mode variables
    /// Determines if the arm is in safe mode.
    pub safe: bool,

    /// Gives the reason for the arm being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    /// Set when ArmCtrl must be made safe before the end of the cycle.
    pub arm_ctrl_make_safe: bool,

    // ArmCtrl
    pub arm_ctrl_input: arm_ctrl::InputData,
    pub arm_ctrl_output: arm_ctrl::OutputData,
    pub arm_ctrl_status_rpt: arm_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

/// One row of the per-cycle archive.
#[derive(Debug, Clone, Serialize)]
pub struct CycleRecord {
    pub time_s: f64,
    pub safe: bool,
    pub mode: ArmMode,
    pub profile_time_s: f64,

    pub meas_proximal_rad: f64,
    pub meas_forearm_rad: f64,
    pub meas_proximal_rate_rads: f64,
    pub meas_forearm_rate_rads: f64,

    pub dem_proximal_rad: f64,
    pub dem_forearm_rad: f64,
    pub dem_proximal_rate_rads: f64,
    pub dem_forearm_rate_rads: f64,

    pub proximal_v: f64,
    pub forearm_v: f64,

    pub goal_rejected: bool,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the arm into safe mode with the given cause.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            // Drop anything already queued for ArmCtrl this cycle
            self.arm_ctrl_input = arm_ctrl::InputData::default();
            self.arm_ctrl_make_safe = true;
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// To remove safe mode the provided cause must match the initial reason
    /// for safe mode being enabled, otherwise the root cause is returned as
    /// the error. If safe mode was not enabled `Ok(())` is returned.
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), SafeModeCause> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) if root_cause != cause => Err(root_cause),
            _ => {
                self.safe = false;
                self.safe_cause = None;
                info!("Make unsafe requested, root cause match, safe mode disabled");
                Ok(())
            }
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle.
    pub fn cycle_start(&mut self) {
        self.arm_ctrl_input = arm_ctrl::InputData::default();
        self.arm_ctrl_output = None;
        self.arm_ctrl_status_rpt = arm_ctrl::StatusReport::default();

        self.sim_time_s = util::session::try_get_elapsed_seconds().unwrap_or(0.0);
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }

    /// Build the archive record for this cycle.
    ///
    /// `measured` is the latest arm state, which is used rather than the
    /// state in the status report so that cycles in which ArmCtrl did not
    /// read its sensor are still archived meaningfully.
    pub fn cycle_record(&self, measured: &JointState) -> CycleRecord {
        let rpt = &self.arm_ctrl_status_rpt;
        let voltages = self.arm_ctrl_output.unwrap_or_else(ArmVoltages::zero);

        CycleRecord {
            time_s: self.sim_time_s,
            safe: self.safe,
            mode: rpt.mode,
            profile_time_s: rpt.elapsed_s,
            meas_proximal_rad: measured.proximal_rad,
            meas_forearm_rad: measured.forearm_rad,
            meas_proximal_rate_rads: measured.proximal_rate_rads,
            meas_forearm_rate_rads: measured.forearm_rate_rads,
            dem_proximal_rad: rpt.setpoint.proximal.position_rad,
            dem_forearm_rad: rpt.setpoint.forearm.position_rad,
            dem_proximal_rate_rads: rpt.setpoint.proximal.velocity_rads,
            dem_forearm_rate_rads: rpt.setpoint.forearm.velocity_rads,
            proximal_v: voltages.proximal_v,
            forearm_v: voltages.forearm_v,
            goal_rejected: rpt.goal_rejected,
        }
    }
}
