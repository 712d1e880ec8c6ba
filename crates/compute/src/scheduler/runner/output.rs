use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::category::CategoryManager;
use crate::error::ComputeError;
use crate::scheduler::task::{PriorityTask, TaskKind};
use crate::sink::RenderedVariant;
use crate::unit::Unit;
use crate::variant::Variant;

use super::core::Shared;

impl Shared {
    pub(super) fn service(&self, task: &PriorityTask) {
        match self.units().get(task.unit) {
            Some(unit) => {
                let result = match task.kind {
                    TaskKind::Load => self.compile_with_output(unit, task),
                    TaskKind::RegenerateBackground => self.regenerate_backgrounds(unit, task),
                };
                if let Err(e) = result {
                    error!(unit = task.unit, kind = ?task.kind, error = %e, "Priority task failed");
                }
            }
            None => warn!(unit = task.unit, "Dropping priority task for unknown unit"),
        }
        task.sink.complete();
    }

    /// Baseline pass without streaming: generate each category once and
    /// compile every variant.
    pub(super) fn compile_silent(&self, unit: &Unit) -> Result<(), ComputeError> {
        let compiler = self.compiler();
        unit.baseline_artifact(compiler)?;
        for manager in unit.categories() {
            manager.generate(compiler)?;
            let failed: Vec<Arc<Variant>> = manager
                .all_variants()
                .into_iter()
                .filter(|v| v.artifact(compiler).is_none())
                .collect();
            prune(unit, manager, failed);
        }
        Ok(())
    }

    /// Stream every category of `unit` to the task's sink, replaying stored
    /// variants when the unit is already compiled and generating them
    /// otherwise.
    pub(super) fn compile_with_output(&self, unit: &Unit, task: &PriorityTask) -> Result<(), ComputeError> {
        debug!(unit = unit.index(), page = task.page, "Compiling with output");
        unit.baseline_artifact(self.compiler())?;
        for manager in unit.categories() {
            let replay = self.compiled.contains(unit.index());
            self.stream_category(unit, manager, task, replay)?;
        }
        self.compiled.insert(unit.index());
        Ok(())
    }

    /// Rebuild only the Background category. The unit leaves the tracker
    /// for the duration and returns to it afterwards; readers on the replay
    /// path are not excluded meanwhile.
    pub(super) fn regenerate_backgrounds(&self, unit: &Unit, task: &PriorityTask) -> Result<(), ComputeError> {
        debug!(unit = unit.index(), "Regenerating backgrounds");
        let was_compiled = self.compiled.remove(unit.index());
        let manager = unit.background_improvements();
        manager.invalidate();
        self.stream_category(unit, manager, task, false)?;
        if was_compiled {
            self.compiled.insert(unit.index());
        }
        Ok(())
    }

    fn stream_category(
        &self,
        unit: &Unit,
        manager: &CategoryManager,
        task: &PriorityTask,
        replay: bool,
    ) -> Result<(), ComputeError> {
        let mut failed = Vec::new();
        let mut deliver = |variant: &Arc<Variant>| self.deliver(variant, task, &mut failed);
        if replay {
            for variant in manager.all_variants() {
                deliver(&variant);
            }
        } else {
            manager.generate_streaming(self.compiler(), &mut deliver)?;
        }
        // Pruned only now so the iteration above sees a stable list.
        prune(unit, manager, failed);
        Ok(())
    }

    fn deliver(&self, variant: &Arc<Variant>, task: &PriorityTask, failed: &mut Vec<Arc<Variant>>) {
        let Some(artifact) = variant.artifact(self.compiler()) else {
            failed.push(Arc::clone(variant));
            return;
        };
        if task.sink.is_cancelled() {
            return;
        }
        match self.collaborators.renderer.render_page(&artifact, task.page) {
            Ok(image) => task.sink.dispatch(RenderedVariant {
                unit: task.unit,
                page: task.page,
                category: variant.category(),
                generation: variant.generation(),
                image,
            }),
            Err(e) => warn!(variant = variant.name(), page = task.page, error = %e, "Page render failed"),
        }
    }
}

fn prune(unit: &Unit, manager: &CategoryManager, failed: Vec<Arc<Variant>>) {
    for variant in failed {
        if manager.remove_variant(&variant) {
            warn!(
                unit = unit.index(),
                category = %manager.kind(),
                variant = variant.name(),
                "Pruned variant that failed to compile"
            );
        }
    }
}
