//! Simulation failure types.
//!
//! Only genuine simulation failures live here. Normal terminations (DUT
//! finish, timeout, quiescence) are reported through
//! [`RunOutcome`](crate::kernel::RunOutcome), and programmer errors (a handle
//! from a different kernel) panic.

use tandem_model::SimTime;

/// Errors that can end a simulation run abnormally.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A time step failed to converge within the delta-cycle bound.
    ///
    /// `dirty` names the observables that still had staged writes when the
    /// bound was hit; these are the candidates feeding the loop.
    #[error("combinational loop at {time}: no convergence after {max_deltas} delta cycles (still dirty: {dirty:?})")]
    CombinationalLoop {
        /// The wall time at which the delta loop diverged.
        time: SimTime,
        /// The configured per-step delta bound that was exceeded.
        max_deltas: u32,
        /// Registration names of the observables still dirty at the bound.
        dirty: Vec<String>,
    },

    /// The DUT reported a next time slot earlier than the current time.
    ///
    /// Simulation time is strictly non-decreasing; a model that asks to go
    /// backwards is broken and the run cannot continue deterministically.
    #[error("DUT time reversal: reported next slot {reported} while at {now}")]
    TimeReversal {
        /// The slot the DUT reported.
        reported: SimTime,
        /// The kernel's current time.
        now: SimTime,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinational_loop_display() {
        let e = SimError::CombinationalLoop {
            time: SimTime::new(40),
            max_deltas: 1000,
            dirty: vec!["a".into(), "b".into()],
        };
        let msg = e.to_string();
        assert!(msg.contains("t=40"));
        assert!(msg.contains("1000"));
        assert!(msg.contains("\"a\""));
        assert!(msg.contains("\"b\""));
    }

    #[test]
    fn time_reversal_display() {
        let e = SimError::TimeReversal {
            reported: SimTime::new(10),
            now: SimTime::new(25),
        };
        assert_eq!(
            e.to_string(),
            "DUT time reversal: reported next slot t=10 while at t=25"
        );
    }
}
