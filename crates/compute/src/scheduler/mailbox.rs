use std::sync::Arc;

use arc_swap::ArcSwapOption;

use super::task::PriorityTask;

/// Single-slot holder of the pending priority task. The latest write wins.
///
/// The servicing side takes the task without clearing the slot and, once
/// done, clears it only if it still holds that same task. A task written
/// while another was being serviced therefore survives the clear.
#[derive(Debug, Default)]
pub struct PriorityMailbox {
    slot: ArcSwapOption<PriorityTask>,
}

impl PriorityMailbox {
    /// Store `task`, returning the pending task it displaced.
    pub fn put(&self, task: Arc<PriorityTask>) -> Option<Arc<PriorityTask>> {
        self.slot.swap(Some(task))
    }

    /// The pending task, left in place.
    pub fn peek(&self) -> Option<Arc<PriorityTask>> {
        self.slot.load_full()
    }

    /// Empty the slot if it still holds `task` (by identity).
    pub fn clear_if(&self, task: &Arc<PriorityTask>) -> bool {
        let previous = self.slot.compare_and_swap(task, None::<Arc<PriorityTask>>);
        match &*previous {
            Some(p) => Arc::ptr_eq(p, task),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slot.load().is_none()
    }
}
