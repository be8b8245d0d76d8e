//! The capability contract the kernel requires from a DUT.
//!
//! The DUT is an externally compiled hardware model with its own internal
//! event queue. The kernel never looks inside it; it drives the model through
//! this small, fixed surface plus the raw port cells captured at port
//! registration.

use crate::time::SimTime;

/// An externally compiled hardware model under test.
///
/// The kernel calls [`eval`](DutModel::eval) during the EVAL phase of each
/// delta cycle and consults [`events_pending`](DutModel::events_pending) /
/// [`next_time_slot`](DutModel::next_time_slot) when arbitrating the next
/// wall time between the testbench queue and the model's internal queue.
///
/// Port memory is *not* part of this trait: boundary signals are raw scalar
/// cells (`*mut T` for inputs, `*const T` for outputs) whose addresses must
/// stay stable for the model's lifetime. The kernel touches them only during
/// COMMIT (input write-through) and SAMPLE (output capture).
pub trait DutModel {
    /// Informs the model that global simulation time has advanced to `now`.
    ///
    /// Called by the kernel exactly when it sets its own clock, before any
    /// event at `now` fires. Models with internal event queues need this to
    /// know which of their slots are due during [`eval`](DutModel::eval).
    fn set_time(&mut self, now: SimTime);

    /// Evaluates one round of internal activity at the current time.
    fn eval(&mut self);

    /// Returns true iff the model has time-based internal events queued.
    fn events_pending(&self) -> bool;

    /// Returns the earliest internal event time.
    ///
    /// Only meaningful when [`events_pending`](DutModel::events_pending)
    /// returns true.
    fn next_time_slot(&self) -> SimTime;

    /// Returns true once the model has raised its finish flag.
    fn finished(&self) -> bool;

    /// Terminate-side cleanup, called once when the run ends.
    fn finalize(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal model: no internal events, never finishes.
    struct Inert {
        now: SimTime,
        evals: u32,
        finalized: bool,
    }

    impl DutModel for Inert {
        fn set_time(&mut self, now: SimTime) {
            self.now = now;
        }

        fn eval(&mut self) {
            self.evals += 1;
        }

        fn events_pending(&self) -> bool {
            false
        }

        fn next_time_slot(&self) -> SimTime {
            SimTime::ZERO
        }

        fn finished(&self) -> bool {
            false
        }

        fn finalize(&mut self) {
            self.finalized = true;
        }
    }

    #[test]
    fn trait_is_object_safe() {
        let mut m = Inert {
            now: SimTime::ZERO,
            evals: 0,
            finalized: false,
        };
        let dut: &mut dyn DutModel = &mut m;
        dut.set_time(SimTime::new(9));
        dut.eval();
        assert!(!dut.events_pending());
        assert!(!dut.finished());
        dut.finalize();
        assert_eq!(m.now, SimTime::new(9));
        assert_eq!(m.evals, 1);
        assert!(m.finalized);
    }
}
