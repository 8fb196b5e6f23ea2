//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications 
//! interface. Telecommands can be parsed from JSON (as used in scripts) or from
//! a command line (as typed into the executable's console).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod arm_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use structopt::StructOpt;
use thiserror::Error;

// Internal
use arm_ctrl::ArmCmd;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the arm by the operator.
///
/// In JSON the type is given by the `type` field and any data in the
/// `payload` field, for example:
///
/// ```json
/// {"type": "ArmCtrl", "payload": {"Goal": {"x_m": 0.6, "y_m": 0.3}}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Tc {
    /// Put the exec into safe mode, stopping the arm.
    MakeSafe,

    /// Leave safe mode.
    MakeUnsafe,

    /// Command for arm control.
    ArmCtrl(ArmCmd)
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC command line is empty")]
    EmptyLine,

    #[error("TC command line is invalid: {0}")]
    InvalidCommandLine(structopt::clap::Error)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {

    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }

    /// Serialise the TC into a JSON packet.
    pub fn to_json(&self) -> Result<String, TcParseError> {
        serde_json::to_string(self).map_err(TcParseError::InvalidJson)
    }

    /// Parse a new TC from a whitespace separated command line.
    ///
    /// `safe` and `unsafe` map onto the safe mode TCs, anything else is
    /// parsed as an arm command, for example `goal 0.6 -0.3` or `stop`.
    pub fn from_command_line(line: &str) -> Result<Self, TcParseError> {
        let mut words = line.split_whitespace().peekable();

        match words.peek() {
            None => Err(TcParseError::EmptyLine),
            Some(&"safe") => Ok(Tc::MakeSafe),
            Some(&"unsafe") => Ok(Tc::MakeUnsafe),
            Some(_) => ArmCmd::from_iter_safe(std::iter::once("arm").chain(words))
                .map(Tc::ArmCtrl)
                .map_err(TcParseError::InvalidCommandLine)
        }
    }
}
