//! The waveform sink contract.
//!
//! Waveform writing is an external collaborator: the kernel only promises to
//! call [`dump`](WaveformSink::dump) once per converged time step (plus an
//! initial time-zero snapshot when the run does not begin with a time-zero
//! step). What a sink does with those timestamps — VCD, FST, nothing — is
//! its own business.

use crate::time::SimTime;

/// Receives one notification per converged time step.
///
/// The sequence of times passed to `dump` is monotonically non-decreasing;
/// a wall time is repeated when a timed action re-arms itself at the current
/// time and forces another step at the same timestamp.
pub trait WaveformSink {
    /// Records the state of the world at `time`.
    fn dump(&mut self, time: SimTime);
}

/// A sink that discards every notification.
///
/// Use this when a run does not record waveforms.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl WaveformSink for NullSink {
    fn dump(&mut self, _time: SimTime) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_accepts_dumps() {
        let mut sink = NullSink;
        sink.dump(SimTime::ZERO);
        sink.dump(SimTime::new(100));
    }

    #[test]
    fn sink_is_object_safe() {
        struct Trace(Vec<u64>);
        impl WaveformSink for Trace {
            fn dump(&mut self, time: SimTime) {
                self.0.push(time.raw());
            }
        }

        let mut trace = Trace(Vec::new());
        let sink: &mut dyn WaveformSink = &mut trace;
        sink.dump(SimTime::new(5));
        sink.dump(SimTime::new(10));
        assert_eq!(trace.0, vec![5, 10]);
    }
}
