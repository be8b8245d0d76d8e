//! The process registry: user callbacks and their trigger flags.
//!
//! Processes are append-only for the life of the kernel. Sensitivity is
//! stored reversed — each observable records the IDs of its dependent
//! processes — so trigger distribution costs O(changed observables × fanout)
//! rather than a scan of every process's sensitivity list. The registry only
//! keeps the callbacks and a parallel vector of transient per-delta flags.

use serde::{Deserialize, Serialize};

use crate::kernel::Testbench;

/// Opaque ID of a registered process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ProcessId(u32);

impl ProcessId {
    pub(crate) fn from_raw(index: u32) -> Self {
        Self(index)
    }

    pub(crate) fn as_raw(self) -> u32 {
        self.0
    }
}

/// A reactive callback, invoked once per delta in which it is triggered.
pub(crate) type ProcessFn = Box<dyn FnMut(&mut Testbench<'_>)>;

struct ProcessEntry {
    callback: ProcessFn,
    /// Runs every delta regardless of trigger flags.
    always_active: bool,
}

/// Append-only registry of processes plus their transient trigger flags.
#[derive(Default)]
pub(crate) struct ProcessRegistry {
    entries: Vec<ProcessEntry>,
    triggered: Vec<bool>,
}

impl ProcessRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, callback: ProcessFn, always_active: bool) -> ProcessId {
        let id = ProcessId::from_raw(self.entries.len() as u32);
        self.entries.push(ProcessEntry {
            callback,
            always_active,
        });
        self.triggered.push(false);
        id
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Zeroes every trigger flag; called at the start of each REACT phase.
    pub(crate) fn clear_triggers(&mut self) {
        self.triggered.fill(false);
    }

    /// Flags one process for invocation this delta. Idempotent.
    pub(crate) fn trigger(&mut self, pid: ProcessId) {
        self.triggered[pid.as_raw() as usize] = true;
    }

    /// Invokes every flagged or always-active process, in registration
    /// order. Callbacks run to completion; there are no suspension points
    /// within a delta.
    pub(crate) fn run_triggered(&mut self, tb: &mut Testbench<'_>) {
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            if self.triggered[idx] || entry.always_active {
                (entry.callback)(tb);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Testbench;
    use crate::port::SignalTable;
    use crate::queue::EventQueue;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tandem_model::SimTime;

    fn with_testbench(f: impl FnOnce(&mut Testbench<'_>)) {
        let mut signals = SignalTable::new();
        let mut queue = EventQueue::new();
        let mut tb = Testbench::new(&mut signals, &mut queue, SimTime::ZERO);
        f(&mut tb);
    }

    #[test]
    fn ids_are_sequential() {
        let mut reg = ProcessRegistry::new();
        let a = reg.add(Box::new(|_| {}), false);
        let b = reg.add(Box::new(|_| {}), true);
        assert_eq!(a.as_raw(), 0);
        assert_eq!(b.as_raw(), 1);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn trigger_is_idempotent_and_clear_resets() {
        let count = Rc::new(RefCell::new(0));
        let mut reg = ProcessRegistry::new();
        let c = Rc::clone(&count);
        let a = reg.add(Box::new(move |_| *c.borrow_mut() += 1), false);

        reg.trigger(a);
        reg.trigger(a);
        with_testbench(|tb| reg.run_triggered(tb));
        assert_eq!(*count.borrow(), 1);

        reg.clear_triggers();
        with_testbench(|tb| reg.run_triggered(tb));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn only_flagged_processes_run() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut reg = ProcessRegistry::new();
        let l1 = Rc::clone(&log);
        let a = reg.add(Box::new(move |_| l1.borrow_mut().push("a")), false);
        let l2 = Rc::clone(&log);
        let _b = reg.add(Box::new(move |_| l2.borrow_mut().push("b")), false);

        reg.trigger(a);
        with_testbench(|tb| reg.run_triggered(tb));
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn always_active_runs_without_trigger() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut reg = ProcessRegistry::new();
        let l1 = Rc::clone(&log);
        let _a = reg.add(Box::new(move |_| l1.borrow_mut().push("always")), true);

        with_testbench(|tb| reg.run_triggered(tb));
        assert_eq!(*log.borrow(), vec!["always"]);
    }

    #[test]
    fn invocation_follows_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut reg = ProcessRegistry::new();
        for name in ["p0", "p1", "p2"] {
            let l = Rc::clone(&log);
            reg.add(Box::new(move |_| l.borrow_mut().push(name)), false);
        }
        // Trigger out of order; invocation order must not follow it.
        reg.trigger(ProcessId::from_raw(2));
        reg.trigger(ProcessId::from_raw(0));
        with_testbench(|tb| reg.run_triggered(tb));
        assert_eq!(*log.borrow(), vec!["p0", "p2"]);
    }
}
