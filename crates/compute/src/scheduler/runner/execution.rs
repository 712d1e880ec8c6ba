use tracing::{debug, error, info};

use super::core::Shared;

impl Shared {
    /// The walker: compile every unit in order, servicing priority tasks
    /// before each one.
    pub(super) fn walk(&self) {
        let units = self.units();
        info!(units = units.len(), "Walker started");

        for unit in units {
            if self.is_stopping() {
                info!(unit = unit.index(), "Walker stopped");
                break;
            }

            while self.drain_once() {}

            if self.compiled.contains(unit.index()) {
                debug!(unit = unit.index(), "Unit already compiled");
                continue;
            }
            match self.compile_silent(unit) {
                Ok(()) => {
                    self.compiled.insert(unit.index());
                    debug!(unit = unit.index(), "Unit compiled");
                }
                Err(e) => error!(unit = unit.index(), error = %e, "Unit failed to compile"),
            }
        }

        self.finish();
        info!(compiled = self.compiled.len(), "Walker finished");
    }

    /// Service the pending priority task, if any, then clear the mailbox
    /// unless the task was replaced meanwhile. Returns whether a task was
    /// found.
    pub(super) fn drain_once(&self) -> bool {
        let Some(task) = self.mailbox.peek() else {
            return false;
        };
        self.service(&task);
        if !self.mailbox.clear_if(&task) {
            debug!(unit = task.unit, "Priority task replaced while being serviced");
        }
        true
    }

    /// Drain on behalf of a walker that has already finished. The caller
    /// holds the drainer role; it is released here.
    ///
    /// `set_priority_task` writes the mailbox before it tries to take the
    /// role, so after releasing it the mailbox is checked once more: a task
    /// written while the role was still held would otherwise be stranded.
    pub(super) fn drain(&self) {
        debug!("Draining priority tasks");
        loop {
            while !self.is_stopping() && self.drain_once() {}
            self.end_draining();

            if self.is_stopping() || self.mailbox.is_empty() || !self.try_begin_draining() {
                return;
            }
        }
    }

    /// Mark the walker finished, but only once the mailbox is empty under
    /// the finished lock. `set_priority_task` writes the mailbox before it
    /// reads the flag, so a task is either seen here or triggers a new
    /// draining thread.
    fn finish(&self) {
        loop {
            while !self.is_stopping() && self.drain_once() {}

            let mut finished = self.lock_finished();
            if self.mailbox.is_empty() || self.is_stopping() {
                *finished = true;
                self.finished_changed.notify_all();
                return;
            }
        }
    }
}
