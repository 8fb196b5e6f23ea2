//! # Arm control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::{clap::AppSettings, StructOpt};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be completed by arm control.
///
/// Goal commands interrupt any motion in progress, the new motion starts from the arm's measured
/// joint state.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
#[structopt(name = "arm")]
pub enum ArmCmd {
    /// Move the end effector to a point in the arm's base frame.
    ///
    /// The joint angles are found using inverse kinematics. Goals outside the arm's reach are
    /// rejected and the arm continues its previous motion.
    #[structopt(name = "goal", setting = AppSettings::AllowNegativeNumbers)]
    Goal {
        /// Horizontal distance of the end effector from the proximal joint in meters.
        x_m: f64,

        /// Vertical distance of the end effector from the proximal joint in meters.
        y_m: f64,
    },

    /// Move both joints to absolute angles, skipping inverse kinematics.
    #[structopt(name = "joints", setting = AppSettings::AllowNegativeNumbers)]
    Joints {
        /// Proximal joint absolute angle in radians.
        ///
        /// Follows the right hand rule about the joint axis, zero is horizontal.
        proximal_rad: f64,

        /// Forearm joint absolute angle in radians.
        ///
        /// Measured from the same horizontal as the proximal angle, not relative to the proximal
        /// link.
        forearm_rad: f64,
    },

    /// Stop the arm, commanding zero voltage to both joints and discarding the current motion.
    #[structopt(name = "stop")]
    Stop,
}
