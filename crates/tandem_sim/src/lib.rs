//! Time-stratified delta-cycle co-simulation kernel.
//!
//! This crate couples a host testbench to an externally compiled hardware
//! model (the DUT): it drives the model's inputs, observes its outputs, and
//! runs user-defined reactive processes with the commit/evaluate/sample/
//! react discipline of an HDL simulator, while merging the testbench's timed
//! events with the model's own internal time slots into one deterministic
//! timeline.
//!
//! # Architecture
//!
//! - `port` — input ports, output ports, and internal signals with
//!   non-blocking write semantics and edge detection
//! - `queue` — the testbench timed-event min-heap (FIFO within a timestamp)
//! - `process` — the append-only registry of reactive callbacks
//! - `kernel` — the five-phase delta-cycle loop and the time-arbitration
//!   outer loop
//! - `error` — simulation failure types
//!
//! # Usage
//!
//! ```ignore
//! use tandem_sim::{CosimKernel, Testbench};
//!
//! let mut kernel = CosimKernel::new();
//! let clk = unsafe { kernel.input("clk", model.clk_cell()) };
//! let count = unsafe { kernel.output("count", model.count_cell()) };
//!
//! kernel.process(&[clk.id()], move |tb: &mut Testbench<'_>| {
//!     if tb.posedge(clk) {
//!         println!("{}: counter = {}", tb.now(), tb.val(count));
//!     }
//! });
//! kernel.schedule_at(5u64, move |tb: &mut Testbench<'_>| toggle(tb, clk));
//!
//! let summary = kernel.run(&mut model, &mut sink, 1_000u64)?;
//! println!("ended: {:?}", summary.outcome);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod kernel;
pub mod port;
pub mod process;
mod queue;

pub use error::SimError;
pub use kernel::{CosimKernel, RunOutcome, RunSummary, Testbench};
pub use port::{InputHandle, OutputHandle, Readable, SignalHandle, SignalId, Writable};
pub use process::ProcessId;

pub use tandem_model::{DutModel, NullSink, Scalar, ScalarKind, SimTime, WaveformSink};

/// Configuration for a [`CosimKernel`].
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Maximum delta cycles per time step before a combinational loop is
    /// diagnosed.
    pub max_deltas_per_step: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_deltas_per_step: 1_000,
        }
    }
}
