//! Port and signal objects carrying NBA semantics across the DUT boundary.
//!
//! Three observable variants share one capability set (change and edge
//! detection, dependent-process lists):
//!
//! - [`InputPort`] — testbench→DUT; buffers writes, applies them on COMMIT
//!   with write-through to the DUT's memory cell.
//! - [`OutputPort`] — DUT→testbench; captured from DUT memory on SAMPLE,
//!   read-only from the testbench.
//! - [`InternalSignal`] — testbench-private state with the same write
//!   discipline as an input but no DUT cell (derived clocks, reference
//!   models, cross-process coordination).
//!
//! User code holds typed, `Copy`, non-owning handles; all state lives in the
//! kernel's [`SignalTable`]. The [`Writable`] marker is implemented only for
//! input and internal handles, so driving an output port is rejected at the
//! API surface rather than at runtime.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use tandem_model::{Scalar, ScalarKind};

use crate::process::ProcessId;

/// Opaque ID of an observable in the kernel's flat table.
///
/// The table is append-only during a run, so IDs stay valid for the life of
/// the kernel that issued them. Using a handle with a different kernel is a
/// programmer error and panics on first use.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SignalId(u32);

impl SignalId {
    pub(crate) fn from_raw(index: u32) -> Self {
        Self(index)
    }

    pub(crate) fn as_raw(self) -> u32 {
        self.0
    }
}

/// A raw DUT memory cell, erased over the scalar width family.
///
/// This is the only type in the crate that dereferences DUT memory. Inputs
/// are written exclusively during COMMIT; outputs are read exclusively
/// during SAMPLE.
#[derive(Clone, Copy, Debug)]
pub(crate) enum DutCell {
    Bool(*mut bool),
    U8(*mut u8),
    U16(*mut u16),
    U32(*mut u32),
    U64(*mut u64),
}

impl DutCell {
    /// Erases a typed cell pointer into the tagged representation.
    pub(crate) fn erase<T: Scalar>(ptr: *mut T) -> Self {
        match T::KIND {
            ScalarKind::Bool => DutCell::Bool(ptr.cast()),
            ScalarKind::U8 => DutCell::U8(ptr.cast()),
            ScalarKind::U16 => DutCell::U16(ptr.cast()),
            ScalarKind::U32 => DutCell::U32(ptr.cast()),
            ScalarKind::U64 => DutCell::U64(ptr.cast()),
        }
    }

    pub(crate) fn kind(self) -> ScalarKind {
        match self {
            DutCell::Bool(_) => ScalarKind::Bool,
            DutCell::U8(_) => ScalarKind::U8,
            DutCell::U16(_) => ScalarKind::U16,
            DutCell::U32(_) => ScalarKind::U32,
            DutCell::U64(_) => ScalarKind::U64,
        }
    }

    /// Reads the cell, zero-extended to the raw representation.
    ///
    /// # Safety
    ///
    /// The pointer must be valid for reads and the pointee initialized, per
    /// the registration contract on `CosimKernel::input`/`output`.
    pub(crate) unsafe fn read(self) -> u64 {
        match self {
            DutCell::Bool(p) => *p as u64,
            DutCell::U8(p) => *p as u64,
            DutCell::U16(p) => *p as u64,
            DutCell::U32(p) => *p as u64,
            DutCell::U64(p) => *p,
        }
    }

    /// Writes a raw value into the cell, truncating to the cell's width.
    ///
    /// # Safety
    ///
    /// The pointer must be valid for writes, per the registration contract
    /// on `CosimKernel::input`.
    pub(crate) unsafe fn write(self, raw: u64) {
        match self {
            DutCell::Bool(p) => *p = raw & 1 != 0,
            DutCell::U8(p) => *p = raw as u8,
            DutCell::U16(p) => *p = raw as u16,
            DutCell::U32(p) => *p = raw as u32,
            DutCell::U64(p) => *p = raw,
        }
    }
}

/// Testbench→DUT port state. Writes stage into `pending`; COMMIT promotes
/// them and writes through to the cell. Between deltas, `*cell == current`.
#[derive(Debug)]
pub(crate) struct InputPort {
    cell: DutCell,
    pending: u64,
    dirty: bool,
    current: u64,
    previous: u64,
}

/// DUT→testbench port state. `sampled` lags the cell by at most one delta
/// boundary; the testbench only ever sees post-EVAL snapshots.
#[derive(Debug)]
pub(crate) struct OutputPort {
    cell: DutCell,
    sampled: u64,
    previous: u64,
}

/// Testbench-private state with input-style write discipline and no cell.
#[derive(Debug)]
pub(crate) struct InternalSignal {
    pending: u64,
    dirty: bool,
    current: u64,
    previous: u64,
}

#[derive(Debug)]
pub(crate) enum Body {
    Input(InputPort),
    Output(OutputPort),
    Internal(InternalSignal),
}

/// One entry in the kernel's flat observable table: the value state plus the
/// reversed sensitivity edges (IDs of processes to trigger on change).
#[derive(Debug)]
pub(crate) struct Observable {
    name: String,
    dependents: Vec<ProcessId>,
    body: Body,
}

impl Observable {
    /// The registration name, used in diagnostics.
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn dependents(&self) -> &[ProcessId] {
        &self.dependents
    }

    pub(crate) fn add_dependent(&mut self, pid: ProcessId) {
        self.dependents.push(pid);
    }

    /// The currently visible value (committed for inputs/internals, last
    /// sample for outputs).
    pub(crate) fn val_raw(&self) -> u64 {
        match &self.body {
            Body::Input(p) => p.current,
            Body::Output(p) => p.sampled,
            Body::Internal(s) => s.current,
        }
    }

    /// The visible value one delta boundary ago.
    pub(crate) fn prev_raw(&self) -> u64 {
        match &self.body {
            Body::Input(p) => p.previous,
            Body::Output(p) => p.previous,
            Body::Internal(s) => s.previous,
        }
    }

    /// True iff the visible value changed across the current delta boundary.
    pub(crate) fn changed(&self) -> bool {
        self.val_raw() != self.prev_raw()
    }

    /// Zero→nonzero transition across the current delta boundary.
    pub(crate) fn posedge(&self) -> bool {
        self.prev_raw() == 0 && self.val_raw() != 0
    }

    /// Nonzero→zero transition across the current delta boundary.
    pub(crate) fn negedge(&self) -> bool {
        self.prev_raw() != 0 && self.val_raw() == 0
    }

    /// True iff a staged write has not yet been committed.
    pub(crate) fn is_dirty(&self) -> bool {
        match &self.body {
            Body::Input(p) => p.dirty,
            Body::Output(_) => false,
            Body::Internal(s) => s.dirty,
        }
    }
}

/// What a COMMIT pass did, for the kernel's EVAL decision.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CommitOutcome {
    /// At least one input port's staged write was promoted (and written
    /// through to DUT memory).
    pub inputs_committed: bool,
    /// At least one internal signal's visible value changed.
    pub internals_changed: bool,
}

/// The kernel-owned flat table of all observables.
#[derive(Debug, Default)]
pub(crate) struct SignalTable {
    observables: Vec<Observable>,
}

impl SignalTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.observables.len()
    }

    /// Registers an input port over a DUT cell.
    ///
    /// # Safety
    ///
    /// `cell` must be valid for reads and writes, with its pointee
    /// initialized, for the lifetime of this table.
    pub(crate) unsafe fn add_input(&mut self, name: String, cell: DutCell) -> SignalId {
        // SAFETY: forwarded from this function's contract.
        let initial = unsafe { cell.read() };
        self.push(Observable {
            name,
            dependents: Vec::new(),
            body: Body::Input(InputPort {
                cell,
                pending: initial,
                dirty: false,
                current: initial,
                previous: initial,
            }),
        })
    }

    /// Registers an output port over a DUT cell.
    ///
    /// # Safety
    ///
    /// `cell` must be valid for reads, with its pointee initialized, for the
    /// lifetime of this table.
    pub(crate) unsafe fn add_output(&mut self, name: String, cell: DutCell) -> SignalId {
        // SAFETY: forwarded from this function's contract.
        let initial = unsafe { cell.read() };
        self.push(Observable {
            name,
            dependents: Vec::new(),
            body: Body::Output(OutputPort {
                cell,
                sampled: initial,
                previous: initial,
            }),
        })
    }

    /// Registers a testbench-private signal with an explicit initial value.
    pub(crate) fn add_internal(&mut self, name: String, initial: u64) -> SignalId {
        self.push(Observable {
            name,
            dependents: Vec::new(),
            body: Body::Internal(InternalSignal {
                pending: initial,
                dirty: false,
                current: initial,
                previous: initial,
            }),
        })
    }

    fn push(&mut self, obs: Observable) -> SignalId {
        let id = SignalId::from_raw(self.observables.len() as u32);
        self.observables.push(obs);
        id
    }

    /// # Panics
    ///
    /// Panics if `id` was issued by a different kernel.
    pub(crate) fn get(&self, id: SignalId) -> &Observable {
        &self.observables[id.as_raw() as usize]
    }

    pub(crate) fn get_mut(&mut self, id: SignalId) -> &mut Observable {
        &mut self.observables[id.as_raw() as usize]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Observable> {
        self.observables.iter()
    }

    /// Stages a write. The visible value and DUT memory are untouched until
    /// the next COMMIT; a second write in the same delta overwrites the
    /// first (non-blocking assignment collapsing).
    ///
    /// # Panics
    ///
    /// Panics if `id` names an output port. Unreachable through the typed
    /// handle API, which has no `Writable` impl for outputs.
    pub(crate) fn stage_write(&mut self, id: SignalId, raw: u64) {
        match &mut self.get_mut(id).body {
            Body::Input(p) => {
                p.pending = raw;
                p.dirty = true;
            }
            Body::Internal(s) => {
                s.pending = raw;
                s.dirty = true;
            }
            Body::Output(_) => panic!("cannot drive an output port"),
        }
    }

    /// Phase 1: promotes staged writes to visible values, writing through to
    /// DUT memory for inputs, and establishes the edge baseline for this
    /// delta on every input and internal signal.
    pub(crate) fn commit_all(&mut self) -> CommitOutcome {
        let mut outcome = CommitOutcome::default();
        for obs in &mut self.observables {
            match &mut obs.body {
                Body::Input(p) => {
                    p.previous = p.current;
                    if p.dirty {
                        p.current = p.pending & p.cell.kind().mask();
                        // SAFETY: cell validity per the `add_input` contract.
                        unsafe { p.cell.write(p.current) };
                        p.dirty = false;
                        outcome.inputs_committed = true;
                    }
                }
                Body::Internal(s) => {
                    s.previous = s.current;
                    if s.dirty {
                        s.current = s.pending;
                        s.dirty = false;
                        if s.current != s.previous {
                            outcome.internals_changed = true;
                        }
                    }
                }
                Body::Output(_) => {}
            }
        }
        outcome
    }

    /// Phase 3: captures every output port from DUT memory. This is the only
    /// point at which DUT outputs enter the testbench observation window.
    pub(crate) fn sample_all(&mut self) {
        for obs in &mut self.observables {
            if let Body::Output(p) = &mut obs.body {
                p.previous = p.sampled;
                // SAFETY: cell validity per the `add_output` contract.
                p.sampled = unsafe { p.cell.read() } & p.cell.kind().mask();
            }
        }
    }

    /// True iff any input or internal signal has an uncommitted write.
    pub(crate) fn any_dirty(&self) -> bool {
        self.observables.iter().any(Observable::is_dirty)
    }

    /// Names of all observables with uncommitted writes, for the
    /// combinational-loop diagnostic.
    pub(crate) fn dirty_names(&self) -> Vec<String> {
        self.observables
            .iter()
            .filter(|o| o.is_dirty())
            .map(|o| o.name().to_string())
            .collect()
    }
}

/// Read access to an observable's visible value and edges.
///
/// Implemented by all three handle kinds; the type parameter recovers the
/// registered scalar type from the erased table entry.
pub trait Readable<T: Scalar>: Copy {
    /// The table ID behind this handle, usable in sensitivity lists.
    fn id(self) -> SignalId;
}

/// Write access (staging only). Deliberately not implemented for
/// [`OutputHandle`]: DUT memory has a single writer, the COMMIT phase.
pub trait Writable<T: Scalar>: Readable<T> {}

/// Handle to a registered [`InputPort`].
#[derive(Debug)]
pub struct InputHandle<T: Scalar> {
    id: SignalId,
    _marker: PhantomData<fn() -> T>,
}

/// Handle to a registered [`OutputPort`].
#[derive(Debug)]
pub struct OutputHandle<T: Scalar> {
    id: SignalId,
    _marker: PhantomData<fn() -> T>,
}

/// Handle to a registered [`InternalSignal`].
#[derive(Debug)]
pub struct SignalHandle<T: Scalar> {
    id: SignalId,
    _marker: PhantomData<fn() -> T>,
}

macro_rules! handle_impls {
    ($handle:ident) => {
        impl<T: Scalar> $handle<T> {
            pub(crate) fn new(id: SignalId) -> Self {
                Self {
                    id,
                    _marker: PhantomData,
                }
            }

            /// The table ID behind this handle, usable in sensitivity lists.
            pub fn id(self) -> SignalId {
                self.id
            }
        }

        impl<T: Scalar> Clone for $handle<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T: Scalar> Copy for $handle<T> {}

        impl<T: Scalar> Readable<T> for $handle<T> {
            fn id(self) -> SignalId {
                self.id
            }
        }
    };
}

handle_impls!(InputHandle);
handle_impls!(OutputHandle);
handle_impls!(SignalHandle);

impl<T: Scalar> Writable<T> for InputHandle<T> {}
impl<T: Scalar> Writable<T> for SignalHandle<T> {}
