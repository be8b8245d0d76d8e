//! The co-simulation kernel: delta-cycle inner loop and time arbitration.
//!
//! [`CosimKernel`] owns every observable, timed action, and process. A run
//! alternates two loops:
//!
//! - the **outer loop** picks the next wall time as the minimum of the
//!   testbench event queue and the DUT's own next time slot, fires the due
//!   testbench actions, and hands the step to the inner loop;
//! - the **inner loop** repeats COMMIT → EVAL → SAMPLE → REACT until no
//!   staged write remains, mirroring the stratified event regions of an HDL
//!   simulator at the co-simulation boundary.
//!
//! Everything is single-threaded and cooperative: callbacks run to
//! completion, the kernel is the only writer of simulation time, and DUT
//! memory is touched only during COMMIT (input write-through) and SAMPLE
//! (output capture).

use serde::{Deserialize, Serialize};

use tandem_model::{DutModel, Scalar, SimTime, WaveformSink};

use crate::error::SimError;
use crate::port::{
    DutCell, InputHandle, OutputHandle, Readable, SignalHandle, SignalId, SignalTable, Writable,
};
use crate::process::{ProcessId, ProcessRegistry};
use crate::queue::EventQueue;
use crate::SimConfig;

/// How a completed run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The DUT raised its finish flag; the final delta completed and the
    /// waveform was dumped before exit.
    DutFinished,
    /// The next event would land past the requested timeout. Events at
    /// exactly the timeout still fire.
    Timeout,
    /// Both event timelines ran dry.
    Quiescent,
}

/// Summary of a completed run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// The wall time of the last executed time step.
    pub final_time: SimTime,
    /// Why the run ended.
    pub outcome: RunOutcome,
    /// Number of time steps executed (same wall time counted once per
    /// outer-loop iteration).
    pub time_steps: u64,
    /// Total delta cycles across all time steps.
    pub total_deltas: u64,
}

/// The context handed to process callbacks and timed actions.
///
/// Reads see the committed/sampled picture of the current delta; writes
/// stage into buffers consumed by the next COMMIT, so the order in which
/// callbacks run within a delta never affects the value the DUT sees — only
/// the last write to a signal within a delta survives.
pub struct Testbench<'a> {
    signals: &'a mut SignalTable,
    queue: &'a mut EventQueue,
    now: SimTime,
}

impl<'a> Testbench<'a> {
    pub(crate) fn new(
        signals: &'a mut SignalTable,
        queue: &'a mut EventQueue,
        now: SimTime,
    ) -> Self {
        Self {
            signals,
            queue,
            now,
        }
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// The visible value of a port or signal.
    pub fn val<T: Scalar>(&self, p: impl Readable<T>) -> T {
        T::from_raw(self.signals.get(p.id()).val_raw())
    }

    /// The visible value one delta boundary ago.
    pub fn prev<T: Scalar>(&self, p: impl Readable<T>) -> T {
        T::from_raw(self.signals.get(p.id()).prev_raw())
    }

    /// True iff the value changed across the current delta boundary.
    pub fn changed<T: Scalar>(&self, p: impl Readable<T>) -> bool {
        self.signals.get(p.id()).changed()
    }

    /// Zero→nonzero transition in the current delta.
    pub fn posedge<T: Scalar>(&self, p: impl Readable<T>) -> bool {
        self.signals.get(p.id()).posedge()
    }

    /// Nonzero→zero transition in the current delta.
    pub fn negedge<T: Scalar>(&self, p: impl Readable<T>) -> bool {
        self.signals.get(p.id()).negedge()
    }

    /// Stages a write; applied at the next COMMIT. A later write to the same
    /// signal within this delta wins.
    pub fn write<T: Scalar>(&mut self, p: impl Writable<T>, value: T) {
        self.signals.stage_write(p.id(), value.to_raw());
    }

    /// Schedules an action at an absolute time. A time already in the past
    /// is coerced to now ("as soon as possible at or after now").
    pub fn schedule_at<F>(&mut self, time: impl Into<SimTime>, action: F)
    where
        F: FnOnce(&mut Testbench<'_>) + 'static,
    {
        let time = time.into().max(self.now);
        self.queue.schedule(time, Box::new(action));
    }

    /// Schedules an action `delay` ticks from now.
    pub fn schedule_after<F>(&mut self, delay: u64, action: F)
    where
        F: FnOnce(&mut Testbench<'_>) + 'static,
    {
        let time = self.now.saturating_add(delay);
        self.queue.schedule(time, Box::new(action));
    }
}

/// The co-simulation scheduling kernel.
///
/// Construct with [`new`](CosimKernel::new) or
/// [`with_config`](CosimKernel::with_config), register ports, signals,
/// processes and stimulus, then [`run`](CosimKernel::run) against a DUT and
/// a waveform sink. The kernel exclusively owns all registered state; user
/// code holds `Copy` handles.
pub struct CosimKernel {
    signals: SignalTable,
    queue: EventQueue,
    processes: ProcessRegistry,
    now: SimTime,
    max_deltas_per_step: u32,
    total_deltas: u64,
}

impl Default for CosimKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl CosimKernel {
    /// Creates a kernel with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Creates a kernel with an explicit configuration.
    pub fn with_config(config: SimConfig) -> Self {
        Self {
            signals: SignalTable::new(),
            queue: EventQueue::new(),
            processes: ProcessRegistry::new(),
            now: SimTime::ZERO,
            max_deltas_per_step: config.max_deltas_per_step,
            total_deltas: 0,
        }
    }

    /// Registers an input port over a DUT memory cell.
    ///
    /// The port's initial visible value is read from the cell. Writes stage
    /// into the port and reach the cell only during COMMIT.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null, properly aligned, valid for reads and writes,
    /// with its pointee initialized, for the lifetime of this kernel, and
    /// nothing else may write the cell while the kernel is alive.
    pub unsafe fn input<T: Scalar>(
        &mut self,
        name: impl Into<String>,
        ptr: *mut T,
    ) -> InputHandle<T> {
        debug_assert!(!ptr.is_null());
        // SAFETY: forwarded from this function's contract.
        let id = unsafe { self.signals.add_input(name.into(), DutCell::erase(ptr)) };
        InputHandle::new(id)
    }

    /// Registers an output port over a DUT memory cell.
    ///
    /// The testbench-visible value is the snapshot captured during SAMPLE,
    /// lagging DUT memory by at most one delta boundary.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null, properly aligned, valid for reads, with its
    /// pointee initialized, for the lifetime of this kernel.
    pub unsafe fn output<T: Scalar>(
        &mut self,
        name: impl Into<String>,
        ptr: *const T,
    ) -> OutputHandle<T> {
        debug_assert!(!ptr.is_null());
        // SAFETY: forwarded from this function's contract; the cell is only
        // ever read for an output port.
        let id = unsafe {
            self.signals
                .add_output(name.into(), DutCell::erase(ptr.cast_mut()))
        };
        OutputHandle::new(id)
    }

    /// Registers a testbench-private signal with input-style write
    /// discipline (derived clocks, reference-model registers).
    pub fn signal<T: Scalar>(&mut self, name: impl Into<String>, initial: T) -> SignalHandle<T> {
        let id = self.signals.add_internal(name.into(), initial.to_raw());
        SignalHandle::new(id)
    }

    /// Registers a process that fires whenever any observable in its
    /// sensitivity list changes during a delta.
    pub fn process<F>(&mut self, sensitivity: &[SignalId], callback: F) -> ProcessId
    where
        F: FnMut(&mut Testbench<'_>) + 'static,
    {
        let pid = self.processes.add(Box::new(callback), false);
        for &sid in sensitivity {
            self.signals.get_mut(sid).add_dependent(pid);
        }
        pid
    }

    /// Registers a process that fires every delta.
    pub fn always<F>(&mut self, callback: F) -> ProcessId
    where
        F: FnMut(&mut Testbench<'_>) + 'static,
    {
        self.processes.add(Box::new(callback), true)
    }

    /// Schedules an action at an absolute time; a past time is coerced to
    /// now.
    pub fn schedule_at<F>(&mut self, time: impl Into<SimTime>, action: F)
    where
        F: FnOnce(&mut Testbench<'_>) + 'static,
    {
        let time = time.into().max(self.now);
        self.queue.schedule(time, Box::new(action));
    }

    /// Schedules an action `delay` ticks from now.
    pub fn schedule_after<F>(&mut self, delay: u64, action: F)
    where
        F: FnOnce(&mut Testbench<'_>) + 'static,
    {
        let time = self.now.saturating_add(delay);
        self.queue.schedule(time, Box::new(action));
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// The visible value of a port or signal.
    pub fn val<T: Scalar>(&self, p: impl Readable<T>) -> T {
        T::from_raw(self.signals.get(p.id()).val_raw())
    }

    /// The visible value one delta boundary ago.
    pub fn prev<T: Scalar>(&self, p: impl Readable<T>) -> T {
        T::from_raw(self.signals.get(p.id()).prev_raw())
    }

    /// Zero→nonzero transition in the most recent delta.
    pub fn posedge<T: Scalar>(&self, p: impl Readable<T>) -> bool {
        self.signals.get(p.id()).posedge()
    }

    /// Nonzero→zero transition in the most recent delta.
    pub fn negedge<T: Scalar>(&self, p: impl Readable<T>) -> bool {
        self.signals.get(p.id()).negedge()
    }

    /// Stages a write outside any callback (initial stimulus); it is
    /// committed in the first delta of the next time step.
    pub fn write<T: Scalar>(&mut self, p: impl Writable<T>, value: T) {
        self.signals.stage_write(p.id(), value.to_raw());
    }

    /// Overrides the per-step delta-cycle bound.
    pub fn set_max_delta(&mut self, max: u32) {
        self.max_deltas_per_step = max;
    }

    /// Number of registered observables.
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Number of registered processes.
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// Number of timed events currently queued.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Runs the simulation until the DUT finishes, the timeout is passed,
    /// or both event timelines run dry.
    ///
    /// `dut.finalize()` is called exactly once, whatever the outcome. A
    /// combinational loop (no convergence within the delta bound) aborts the
    /// run with an error naming the still-dirty observables.
    pub fn run(
        &mut self,
        dut: &mut dyn DutModel,
        sink: &mut dyn WaveformSink,
        timeout: impl Into<SimTime>,
    ) -> Result<RunSummary, SimError> {
        let timeout = timeout.into();
        let mut time_steps = 0u64;
        let result = self.drive(dut, sink, timeout, &mut time_steps);
        dut.finalize();
        let outcome = result?;
        log::debug!(
            "run ended at {} after {time_steps} steps / {} deltas ({outcome:?})",
            self.now,
            self.total_deltas
        );
        Ok(RunSummary {
            final_time: self.now,
            outcome,
            time_steps,
            total_deltas: self.total_deltas,
        })
    }

    /// The outer time-arbitration loop.
    fn drive(
        &mut self,
        dut: &mut dyn DutModel,
        sink: &mut dyn WaveformSink,
        timeout: SimTime,
        time_steps: &mut u64,
    ) -> Result<RunOutcome, SimError> {
        // Initial snapshot, unless the first step will dump time zero itself.
        if self.next_wall_time(&*dut) != Some(SimTime::ZERO) {
            sink.dump(SimTime::ZERO);
        }

        loop {
            if dut.finished() {
                return Ok(RunOutcome::DutFinished);
            }
            let Some(t) = self.next_wall_time(&*dut) else {
                return Ok(RunOutcome::Quiescent);
            };
            if t < self.now {
                return Err(SimError::TimeReversal {
                    reported: t,
                    now: self.now,
                });
            }
            if t > timeout {
                return Ok(RunOutcome::Timeout);
            }

            self.now = t;
            dut.set_time(t);
            self.fire_due_events(t);
            let deltas = self.settle(dut)?;
            log::trace!("{t}: converged after {deltas} deltas");
            sink.dump(t);
            *time_steps += 1;

            if dut.finished() {
                return Ok(RunOutcome::DutFinished);
            }
        }
    }

    /// The earliest pending wall time across both timelines, testbench
    /// winning ties so the DUT sees a consistent input picture first.
    fn next_wall_time(&self, dut: &dyn DutModel) -> Option<SimTime> {
        let t_tb = self.queue.next_time();
        let t_dut = if dut.events_pending() {
            Some(dut.next_time_slot())
        } else {
            None
        };
        match (t_tb, t_dut) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fires every testbench event due at exactly `t`, in FIFO order per
    /// timestamp. The batch is snapshotted first: an action that re-arms
    /// itself at the current time runs in the next outer-loop iteration at
    /// the same wall time, never in this drain.
    fn fire_due_events(&mut self, t: SimTime) {
        let mut batch = Vec::new();
        while let Some(ev) = self.queue.pop_due(t) {
            batch.push(ev.action);
        }
        if batch.is_empty() {
            return;
        }
        log::debug!("{t}: firing {} timed event(s)", batch.len());
        let Self {
            signals,
            queue,
            now,
            ..
        } = self;
        let mut tb = Testbench::new(signals, queue, *now);
        for action in batch {
            action(&mut tb);
        }
    }

    /// The inner delta-cycle loop: runs the phase pipeline until no staged
    /// work remains, or fails with a combinational-loop diagnostic past the
    /// configured bound.
    fn settle(&mut self, dut: &mut dyn DutModel) -> Result<u32, SimError> {
        let t = self.now;
        let mut delta = 0u32;
        loop {
            // Phase 1: COMMIT — promote staged writes, write inputs through
            // to DUT memory, establish this delta's edge baseline.
            let commit = self.signals.commit_all();

            // Phase 2: EVAL. Mandatory on the first delta of a step even
            // with no stimulus: DUT-internal clocks schedule work on their
            // own.
            let dut_due = dut.events_pending() && dut.next_time_slot() <= t;
            if delta == 0 || commit.inputs_committed || commit.internals_changed || dut_due {
                dut.eval();
            }

            // Phase 3: SAMPLE — capture DUT outputs post-evaluation.
            self.signals.sample_all();

            // Phase 4: REACT — distribute triggers, run processes.
            self.react();

            self.total_deltas += 1;
            delta += 1;

            // Phase 5: CONVERGE.
            if !self.signals.any_dirty() {
                return Ok(delta);
            }
            if delta >= self.max_deltas_per_step {
                return Err(SimError::CombinationalLoop {
                    time: t,
                    max_deltas: self.max_deltas_per_step,
                    dirty: self.signals.dirty_names(),
                });
            }
        }
    }

    /// Trigger distribution and process invocation for one delta.
    fn react(&mut self) {
        self.processes.clear_triggers();
        for obs in self.signals.iter() {
            if obs.changed() {
                for &pid in obs.dependents() {
                    self.processes.trigger(pid);
                }
            }
        }
        let Self {
            signals,
            queue,
            processes,
            now,
            ..
        } = self;
        let mut tb = Testbench::new(signals, queue, *now);
        processes.run_triggered(&mut tb);
    }
}
