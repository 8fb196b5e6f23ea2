//! # Telecommand processor module
//!
//! The telecommand processor handles TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use arm_lib::data_store::{DataStore, SafeModeCause};
use comms_if::tc::{arm_ctrl::ArmCmd, Tc};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules. While in
/// safe mode only stop commands reach ArmCtrl.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc) {
    match tc {
        Tc::MakeSafe => {
            debug!("Recieved MakeSafe command");
            ds.make_safe(SafeModeCause::MakeSafeTc);
        }
        Tc::MakeUnsafe => {
            debug!("Recieved MakeUnsafe command");
            // Every current cause can be cleared by the operator
            let cause = ds.safe_cause.unwrap_or(SafeModeCause::MakeSafeTc);
            ds.make_unsafe(cause).ok();
        }
        Tc::ArmCtrl(ArmCmd::Stop) => ds.arm_ctrl_input.cmd = Some(ArmCmd::Stop),
        Tc::ArmCtrl(cmd) => {
            if ds.safe {
                warn!("Cannot execute {:?} in safe mode", cmd);
            } else if ds.arm_ctrl_input.cmd == Some(ArmCmd::Stop) {
                warn!("Stop pending this cycle, {:?} ignored", cmd);
            } else {
                ds.arm_ctrl_input.cmd = Some(*cmd);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_arm_cmd_forwarded() {
        let mut ds = DataStore::default();
        let goal = ArmCmd::Goal { x_m: 0.6, y_m: 0.3 };

        exec(&mut ds, &Tc::ArmCtrl(goal));
        assert_eq!(ds.arm_ctrl_input.cmd, Some(goal));
    }

    #[test]
    fn test_safe_mode_blocks_goals() {
        let mut ds = DataStore::default();

        exec(&mut ds, &Tc::MakeSafe);
        assert!(ds.safe);
        assert!(ds.arm_ctrl_make_safe);

        exec(&mut ds, &Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.6, y_m: 0.3 }));
        assert_eq!(ds.arm_ctrl_input.cmd, None);

        exec(&mut ds, &Tc::ArmCtrl(ArmCmd::Stop));
        assert_eq!(ds.arm_ctrl_input.cmd, Some(ArmCmd::Stop));

        exec(&mut ds, &Tc::MakeUnsafe);
        assert!(!ds.safe);
    }

    #[test]
    fn test_goal_does_not_replace_stop() {
        let mut ds = DataStore::default();

        exec(&mut ds, &Tc::ArmCtrl(ArmCmd::Stop));
        exec(&mut ds, &Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.6, y_m: 0.3 }));
        assert_eq!(ds.arm_ctrl_input.cmd, Some(ArmCmd::Stop));

        // The goal is accepted once the stop has been consumed
        ds.cycle_start();
        exec(&mut ds, &Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.6, y_m: 0.3 }));
        assert_eq!(
            ds.arm_ctrl_input.cmd,
            Some(ArmCmd::Goal { x_m: 0.6, y_m: 0.3 })
        );
    }

    #[test]
    fn test_unsafe_clears_fault() {
        let mut ds = DataStore::default();
        ds.make_safe(SafeModeCause::ArmCtrlFault);

        exec(&mut ds, &Tc::MakeUnsafe);
        assert!(!ds.safe);
    }
}
