//! Boundary contracts for the Tandem co-simulation kernel.
//!
//! This crate defines the vocabulary shared between the scheduling kernel
//! (`tandem_sim`) and external integrations — DUT wrappers and waveform
//! sinks — without pulling in the kernel itself:
//!
//! - `time` — unitless simulation timestamps
//! - `scalar` — the bool/u8/u16/u32/u64 port value family
//! - `dut` — the capability surface a hardware model must provide
//! - `sink` — the waveform notification contract
//!
//! A DUT integration (for example a wrapper over a Verilated model) depends
//! only on this crate; the kernel drives any [`DutModel`] through the same
//! five-phase delta-cycle discipline.

#![warn(missing_docs)]

pub mod dut;
pub mod scalar;
pub mod sink;
pub mod time;

pub use dut::DutModel;
pub use scalar::{Scalar, ScalarKind};
pub use sink::{NullSink, WaveformSink};
pub use time::SimTime;
