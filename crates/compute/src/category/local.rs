use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use slidesmith_core::FrameCode;
use tracing::debug;

use super::{CategoryKind, Generators, Improvements, VariantList};
use crate::collab::Compiler;
use crate::error::ComputeError;

/// Layout rewrites of the frame body, one variant per applicable improver.
#[derive(Debug)]
pub struct LocalImprovements {
    variants: VariantList,
    selected: AtomicUsize,
    original: FrameCode,
    generators: Arc<Generators>,
}

impl LocalImprovements {
    pub fn new(stem: &str, original: FrameCode, generators: Arc<Generators>) -> Self {
        Self {
            variants: VariantList::new(CategoryKind::Local, stem),
            selected: AtomicUsize::new(0),
            original,
            generators,
        }
    }
}

impl Improvements for LocalImprovements {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Local
    }

    fn variants(&self) -> &VariantList {
        &self.variants
    }

    fn produce(&self, _compiler: &dyn Compiler, emit: &mut dyn FnMut(FrameCode)) -> Result<(), ComputeError> {
        for improver in &self.generators.improvers {
            match improver.improve(&self.original) {
                Some(code) => emit(code),
                None => debug!(unit = self.variants.stem(), improver = improver.name(), "Improver does not apply"),
            }
        }
        Ok(())
    }

    fn current_selection(&self) -> usize {
        self.selected.load(Ordering::Acquire)
    }

    fn store_selection(&self, index: usize) {
        self.selected.store(index, Ordering::Release);
    }

    fn reset_selection(&self) {
        self.store_selection(0);
    }

    fn apply(&self, chosen: &FrameCode, target: &mut FrameCode) {
        target.header = chosen.header.clone();
        target.base_code = chosen.base_code.clone();
    }
}
