//! Unitless simulation time.
//!
//! [`SimTime`] is the timestamp shared by the testbench event queue and the
//! DUT's internal time slots. The scheduler is unitless: the time unit and
//! resolution are whatever the DUT was compiled with, and the kernel only
//! ever compares and adds timestamps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// A point in simulation time.
///
/// Ordering is the plain integer ordering; the kernel guarantees that the
/// sequence of times it visits is monotonically non-decreasing. Delta cycles
/// are *not* part of the timestamp — they are an inner-loop counter owned by
/// the kernel, so two deltas at the same wall time compare equal here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    /// Time zero, where every run starts.
    pub const ZERO: SimTime = SimTime(0);

    /// Creates a timestamp from a raw tick count.
    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Returns the raw tick count.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Adds a delay, saturating at the maximum representable time.
    pub const fn saturating_add(self, delay: u64) -> Self {
        Self(self.0.saturating_add(delay))
    }
}

impl From<u64> for SimTime {
    fn from(ticks: u64) -> Self {
        Self(ticks)
    }
}

impl Add<u64> for SimTime {
    type Output = SimTime;

    fn add(self, delay: u64) -> SimTime {
        SimTime(self.0 + delay)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}
