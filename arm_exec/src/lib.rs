//! # Arm library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to
//! access items defined inside the arm crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control module - turns goal positions into joint voltage demands
pub mod arm_ctrl;

/// Command slot - hands the latest telecommand to the main loop
pub mod cmd_slot;

/// Global data store for the executable
pub mod data_store;

/// Executable parameters
pub mod params;

/// Simulated arm - plant model standing in for the arm hardware
pub mod sim;

/// Standard input client - reads operator commands from the terminal
pub mod stdin_client;
