//! # Standard input client
//!
//! Reads operator commands from standard input on a background thread, one
//! command per line, and posts them into a [`CmdSlot`] for the main loop.
//! Lines are parsed with [`Tc::from_command_line`], for example:
//!
//! ```text
//! goal 0.6 0.3
//! joints 1.2 -0.4
//! stop
//! safe
//! unsafe
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    io::{self, BufRead, BufReader},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use log::{info, warn};

use crate::cmd_slot::CmdSlot;
use comms_if::tc::{Tc, TcParseError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct StdinClient {
    bg_jh: Option<JoinHandle<()>>,

    /// Cleared by the background thread when its input ends.
    bg_open: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StdinClient {
    /// Start reading commands from standard input into `slot`.
    pub fn start(slot: CmdSlot) -> Result<Self, io::Error> {
        Self::from_reader(BufReader::new(io::stdin()), slot)
    }

    /// Start reading commands from any buffered reader into `slot`.
    pub fn from_reader<R>(reader: R, slot: CmdSlot) -> Result<Self, io::Error>
    where
        R: BufRead + Send + 'static,
    {
        let bg_open = Arc::new(AtomicBool::new(true));
        let bg_open_clone = bg_open.clone();

        let bg_jh = thread::Builder::new()
            .name("stdin_client".into())
            .spawn(move || bg_thread(reader, slot, bg_open_clone))?;

        Ok(Self {
            bg_jh: Some(bg_jh),
            bg_open,
        })
    }

    /// Returns false once the input has been closed.
    pub fn is_open(&self) -> bool {
        self.bg_open.load(Ordering::Relaxed)
    }

    /// Wait for the background thread to reach the end of its input.
    pub fn join(mut self) {
        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                warn!("StdinClient background thread panicked");
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Background thread, parses each line and posts valid commands to the slot.
fn bg_thread<R: BufRead>(reader: R, slot: CmdSlot, open: Arc<AtomicBool>) {
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("Could not read from stdin: {}", e);
                break;
            }
        };

        match Tc::from_command_line(&line) {
            Ok(tc) => {
                info!("Command received: {:?}", tc);
                slot.post(tc);
            }
            Err(TcParseError::EmptyLine) => (),
            Err(e) => warn!("Could not parse command \"{}\": {}", line.trim(), e),
        }
    }

    info!("Command input closed");
    open.store(false, Ordering::Relaxed);
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tc::arm_ctrl::ArmCmd;
    use std::io::Cursor;

    #[test]
    fn test_reads_until_closed() {
        let slot = CmdSlot::new();
        let client = StdinClient::from_reader(
            Cursor::new("goal 0.6 0.3\n\nnot a command\njoints 0.1 -0.2\n"),
            slot.clone(),
        )
        .unwrap();

        client.join();

        // Both goals coalesce into the latest one
        assert_eq!(
            slot.take(),
            Some(Tc::ArmCtrl(ArmCmd::Joints {
                proximal_rad: 0.1,
                forearm_rad: -0.2
            }))
        );
    }

    #[test]
    fn test_piped_stop_kept() {
        let slot = CmdSlot::new();
        let client = StdinClient::from_reader(
            Cursor::new("goal 0.6 0.3\nstop\ngoal 0.5 0.1\n"),
            slot.clone(),
        )
        .unwrap();

        client.join();

        assert_eq!(
            slot.take(),
            Some(Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.6, y_m: 0.3 }))
        );
        assert_eq!(slot.take(), Some(Tc::ArmCtrl(ArmCmd::Stop)));
        assert_eq!(
            slot.take(),
            Some(Tc::ArmCtrl(ArmCmd::Goal { x_m: 0.5, y_m: 0.1 }))
        );
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_closed_flag() {
        let slot = CmdSlot::new();
        let client = StdinClient::from_reader(Cursor::new("safe\n"), slot.clone()).unwrap();

        let open = client.bg_open.clone();
        client.join();

        assert!(!open.load(Ordering::Relaxed));
        assert_eq!(slot.take(), Some(Tc::MakeSafe));
    }
}
