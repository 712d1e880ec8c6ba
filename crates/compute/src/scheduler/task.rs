use std::sync::Arc;

use crate::sink::OutputSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Compile and stream every category of the unit.
    Load,
    /// Rebuild and stream only the unit's Background category.
    RegenerateBackground,
}

/// A request to compile one unit now and stream its variants to `sink`.
#[derive(Debug, Clone)]
pub struct PriorityTask {
    pub unit: usize,
    /// Page rendered from every variant.
    pub page: usize,
    pub sink: Arc<OutputSink>,
    pub kind: TaskKind,
}

impl PriorityTask {
    pub fn load(unit: usize, page: usize, sink: Arc<OutputSink>) -> Self {
        Self {
            unit,
            page,
            sink,
            kind: TaskKind::Load,
        }
    }

    pub fn regenerate_backgrounds(unit: usize, page: usize, sink: Arc<OutputSink>) -> Self {
        Self {
            unit,
            page,
            sink,
            kind: TaskKind::RegenerateBackground,
        }
    }

    pub fn is_regeneration(&self) -> bool {
        self.kind == TaskKind::RegenerateBackground
    }
}
