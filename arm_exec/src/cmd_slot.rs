//! # Command slot
//!
//! Hands telecommands from a producer (the stdin thread or the script
//! interpreter) to the main loop, which takes one command per cycle.
//!
//! Goals coalesce: a goal posted while another goal is still waiting at the
//! back of the slot replaces it, so the arm is only ever sent the latest
//! target. Every other command (stop, make safe, make unsafe) is queued in
//! order and is never overwritten by a later post.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use log::debug;

use comms_if::tc::{arm_ctrl::ArmCmd, Tc};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Command handoff shared between the command producer and the main loop.
///
/// Cloning the slot gives another handle to the same pending commands.
#[derive(Debug, Clone, Default)]
pub struct CmdSlot {
    pending: Arc<Mutex<VecDeque<Tc>>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a new command.
    ///
    /// A goal replaces an unread goal at the back of the slot. Goals queued
    /// before a stop or safe command are kept, as are all non-goal commands.
    pub fn post(&self, tc: Tc) {
        let mut pending = self.lock();

        if is_goal(&tc) {
            if let Some(back) = pending.back_mut() {
                if is_goal(back) {
                    debug!("Unread goal {:?} overwritten", back);
                    *back = tc;
                    return;
                }
            }
        }

        pending.push_back(tc);
    }

    /// Take the oldest pending command.
    pub fn take(&self) -> Option<Tc> {
        self.lock().pop_front()
    }

    /// Returns true if there is an unread command in the slot.
    pub fn is_pending(&self) -> bool {
        !self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Tc>> {
        // A poisoned slot still holds a valid queue, so carry on using it
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn is_goal(tc: &Tc) -> bool {
    matches!(tc, Tc::ArmCtrl(ArmCmd::Goal { .. }) | Tc::ArmCtrl(ArmCmd::Joints { .. }))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;

    #[test]
    fn test_take_empties() {
        let slot = CmdSlot::new();
        assert_eq!(slot.take(), None);

        slot.post(Tc::MakeSafe);
        assert!(slot.is_pending());
        assert_eq!(slot.take(), Some(Tc::MakeSafe));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_latest_goal_wins() {
        let slot = CmdSlot::new();
        slot.post(Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.6, y_m: 0.3 }));
        slot.post(Tc::ArmCtrl(ArmCmd::Joints {
            proximal_rad: 1.0,
            forearm_rad: 0.2,
        }));
        slot.post(Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.5, y_m: 0.1 }));

        assert_eq!(
            slot.take(),
            Some(Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.5, y_m: 0.1 }))
        );
        assert!(!slot.is_pending());
    }

    #[test]
    fn test_stop_not_overwritten_by_goal() {
        let slot = CmdSlot::new();
        slot.post(Tc::ArmCtrl(ArmCmd::Stop));
        slot.post(Tc::MakeSafe);
        slot.post(Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.6, y_m: 0.3 }));

        assert_eq!(slot.take(), Some(Tc::ArmCtrl(ArmCmd::Stop)));
        assert_eq!(slot.take(), Some(Tc::MakeSafe));
        assert_eq!(
            slot.take(),
            Some(Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.6, y_m: 0.3 }))
        );
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_goal_before_stop_kept() {
        let slot = CmdSlot::new();
        slot.post(Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.6, y_m: 0.3 }));
        slot.post(Tc::ArmCtrl(ArmCmd::Stop));
        slot.post(Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.5, y_m: 0.1 }));

        assert_eq!(
            slot.take(),
            Some(Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.6, y_m: 0.3 }))
        );
        assert_eq!(slot.take(), Some(Tc::ArmCtrl(ArmCmd::Stop)));
        assert_eq!(
            slot.take(),
            Some(Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.5, y_m: 0.1 }))
        );
    }

    #[test]
    fn test_cross_thread() {
        let slot = CmdSlot::new();
        let producer = slot.clone();

        thread::spawn(move || {
            producer.post(Tc::ArmCtrl(ArmCmd::Joints {
                proximal_rad: 1.0,
                forearm_rad: -0.5,
            }))
        })
        .join()
        .unwrap();

        assert_eq!(
            slot.take(),
            Some(Tc::ArmCtrl(ArmCmd::Joints {
                proximal_rad: 1.0,
                forearm_rad: -0.5
            }))
        );
    }
}
