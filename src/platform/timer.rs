//! Deferred tasks (status auto-revert)

use std::cell::RefCell;
use std::rc::Rc;

/// Runs a task once after a delay. Single-threaded; tasks are not `Send`.
pub trait Scheduler {
    fn after(&self, delay_ms: u32, task: Box<dyn FnOnce()>);
}

/// Scheduler that queues tasks until `run_pending` is called.
///
/// Used on native builds (no event loop) and to drive timers in tests.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    pending: Rc<RefCell<Vec<(u32, Box<dyn FnOnce()>)>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Delays of the queued tasks, in scheduling order
    pub fn delays(&self) -> Vec<u32> {
        self.pending.borrow().iter().map(|(d, _)| *d).collect()
    }

    /// Run every queued task, including ones queued while running
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // Take the batch first so tasks may schedule more work
            let batch: Vec<_> = self.pending.borrow_mut().drain(..).collect();
            if batch.is_empty() {
                return ran;
            }
            for (_, task) in batch {
                task();
                ran += 1;
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay_ms: u32, task: Box<dyn FnOnce()>) {
        self.pending.borrow_mut().push((delay_ms, task));
    }
}
