use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::collab::{Collaborators, Compiler};
use crate::error::ComputeError;
use crate::scheduler::mailbox::PriorityMailbox;
use crate::scheduler::state::CompiledUnits;
use crate::scheduler::task::PriorityTask;
use crate::unit::Unit;

/// Background compilation scheduler.
///
/// One walker thread compiles every unit in order. Priority tasks preempt
/// the walk: a task for an already compiled unit is replayed at once on its
/// own thread, anything else goes through a single-slot mailbox the walker
/// checks before each unit.
pub struct Scheduler {
    pub(super) shared: Arc<Shared>,
}

/// State shared by the walker and every ephemeral servicing thread.
pub(super) struct Shared {
    pub(super) units: OnceLock<Vec<Unit>>,
    pub(super) collaborators: Collaborators,
    pub(super) compiled: CompiledUnits,
    pub(super) mailbox: PriorityMailbox,
    /// Set once the walker has completed its pass and drained the mailbox.
    pub(super) finished: Mutex<bool>,
    pub(super) finished_changed: Condvar,
    /// Held by the single thread draining the mailbox after the walk.
    pub(super) draining: AtomicBool,
    pub(super) shutdown: AtomicBool,
}

impl Shared {
    pub(super) fn units(&self) -> &[Unit] {
        self.units.get().map(Vec::as_slice).unwrap_or_default()
    }

    pub(super) fn compiler(&self) -> &dyn Compiler {
        self.collaborators.compiler.as_ref()
    }

    pub(super) fn is_stopping(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub(super) fn lock_finished(&self) -> MutexGuard<'_, bool> {
        self.finished.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the drainer role. Only one thread services the mailbox once the
    /// walker has finished.
    pub(super) fn try_begin_draining(&self) -> bool {
        self.draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(super) fn end_draining(&self) {
        self.draining.store(false, Ordering::SeqCst);
    }
}

impl Scheduler {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            shared: Arc::new(Shared {
                units: OnceLock::new(),
                collaborators,
                compiled: CompiledUnits::default(),
                mailbox: PriorityMailbox::default(),
                finished: Mutex::new(false),
                finished_changed: Condvar::new(),
                draining: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
            }),
        }
    }

    /// Take ownership of the units and spawn the walker.
    pub fn start(&self, units: Vec<Unit>) -> Result<(), ComputeError> {
        let count = units.len();
        self.shared
            .units
            .set(units)
            .map_err(|_| ComputeError::AlreadyStarted)?;

        let shared = Arc::clone(&self.shared);
        spawn("slidesmith-walker", move || shared.walk())?;
        info!(units = count, "Scheduler started");
        Ok(())
    }

    /// Ask for `task.unit` to be compiled and streamed to `task.sink` ahead
    /// of the walk. Returns immediately.
    pub fn set_priority_task(&self, task: PriorityTask) -> Result<(), ComputeError> {
        if let Some(units) = self.shared.units.get() {
            if task.unit >= units.len() {
                return Err(ComputeError::UnitOutOfRange(task.unit));
            }
        }

        if !task.is_regeneration() && self.shared.compiled.contains(task.unit) {
            debug!(unit = task.unit, page = task.page, "Replaying compiled unit");
            let shared = Arc::clone(&self.shared);
            return spawn("slidesmith-replay", move || shared.service(&task));
        }

        let (unit, page, kind) = (task.unit, task.page, task.kind);
        if self.shared.mailbox.put(Arc::new(task)).is_some() {
            debug!(unit, page, ?kind, "Replaced pending priority task");
        } else {
            debug!(unit, page, ?kind, "Queued priority task");
        }

        let finished = self.shared.lock_finished();
        if !*finished {
            return Ok(());
        }
        drop(finished);

        if self.shared.is_stopping() {
            debug!(unit, "Scheduler stopped, priority task left pending");
            return Ok(());
        }
        if !self.shared.try_begin_draining() {
            debug!(unit, "Drainer already running, it will pick the task up");
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        spawn("slidesmith-drain", move || shared.drain()).map_err(|e| {
            self.shared.end_draining();
            e
        })
    }

    /// Stop the walker before its next unit. A compile in progress runs to
    /// completion.
    pub fn stop(&self) {
        info!("Scheduler stop requested");
        self.shared.shutdown.store(true, Ordering::Release);
    }

    pub fn units(&self) -> &[Unit] {
        self.shared.units()
    }

    pub fn unit(&self, index: usize) -> Option<&Unit> {
        self.shared.units().get(index)
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.shared.collaborators
    }

    pub fn is_compiled(&self, unit: usize) -> bool {
        self.shared.compiled.contains(unit)
    }

    /// Sorted snapshot of the compiled-unit tracker.
    pub fn compiled_units(&self) -> Vec<usize> {
        self.shared.compiled.snapshot()
    }

    pub fn pending_task(&self) -> Option<Arc<PriorityTask>> {
        self.shared.mailbox.peek()
    }

    /// Whether the walker has completed its pass and found the mailbox empty.
    pub fn is_finished(&self) -> bool {
        *self.shared.lock_finished()
    }

    /// Block until the walker finishes or `timeout` elapses. Returns whether
    /// it finished.
    pub fn wait_finished(&self, timeout: Duration) -> Result<bool, ComputeError> {
        let guard = self
            .shared
            .finished
            .lock()
            .map_err(|e| ComputeError::LockPoisoned(format!("finished flag: {}", e)))?;
        let (guard, _) = self
            .shared
            .finished_changed
            .wait_timeout_while(guard, timeout, |finished| !*finished)
            .map_err(|e| ComputeError::LockPoisoned(format!("finished flag: {}", e)))?;
        Ok(*guard)
    }
}

fn spawn<F>(name: &str, f: F) -> Result<(), ComputeError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new().name(name.to_string()).spawn(f)?;
    Ok(())
}
