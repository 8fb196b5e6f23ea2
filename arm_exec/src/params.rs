//! Parameters structure for the arm executable

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::sim::SimParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the arm executable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmExecParams {
    /// If true a CSV record of every cycle is written to the session archive.
    #[serde(default = "default_archive_enabled")]
    pub archive_enabled: bool,

    /// Number of consecutive cycle overruns after which the arm is made safe.
    /// Zero disables the check.
    #[serde(default)]
    pub max_consec_cycle_overruns: u64,

    /// The simulated arm driven by the executable.
    pub sim: SimParams,
}

fn default_archive_enabled() -> bool {
    true
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load() {
        let p: ArmExecParams = util::params::from_toml_str(
            r#"
            max_consec_cycle_overruns = 10

            [sim]
            supply_voltage_v = 12.0
            proximal_damping_nms = 0.05

            [sim.dynamics]
            proximal_mass_kg = 2.0
            proximal_volts_per_nm = 0.5
            forearm_volts_per_nm = 0.8

            [sim.initial_angles]
            proximal_rad = 1.5
            forearm_rad = 0.0
            "#,
        )
        .unwrap();

        assert!(p.archive_enabled);
        assert_eq!(p.max_consec_cycle_overruns, 10);
        assert_eq!(p.sim.supply_voltage_v, 12.0);
        assert!(!p.sim.brake_on_zero);
        assert_eq!(p.sim.forearm_damping_nms, 0.0);
        assert_eq!(p.sim.initial_angles.proximal_rad, 1.5);
        assert_eq!(p.sim.dynamics.forearm_mass_kg, 0.0);
    }
}
