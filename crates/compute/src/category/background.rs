use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use slidesmith_beautify::FrameProgress;
use slidesmith_core::FrameCode;
use tracing::warn;

use super::{CategoryKind, Generators, Improvements, VariantList};
use crate::collab::Compiler;
use crate::error::ComputeError;
use crate::variant::LazyArtifact;

/// Synthesized backgrounds sized to the unit's baseline page.
#[derive(Debug)]
pub struct BackgroundImprovements {
    unit: usize,
    variants: VariantList,
    selected: AtomicUsize,
    baseline: Arc<LazyArtifact>,
    generators: Arc<Generators>,
    res_dir: PathBuf,
    width: u32,
    progress: FrameProgress,
}

impl BackgroundImprovements {
    pub fn new(
        unit: usize,
        stem: &str,
        baseline: Arc<LazyArtifact>,
        generators: Arc<Generators>,
        res_dir: PathBuf,
        width: u32,
        progress: FrameProgress,
    ) -> Self {
        Self {
            unit,
            variants: VariantList::new(CategoryKind::Background, stem),
            selected: AtomicUsize::new(0),
            baseline,
            generators,
            res_dir,
            width,
            progress,
        }
    }

    fn image_path(&self, index: usize) -> PathBuf {
        self.res_dir.join(format!("{}_bg{index}.png", self.variants.stem()))
    }
}

impl Improvements for BackgroundImprovements {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Background
    }

    fn variants(&self) -> &VariantList {
        &self.variants
    }

    fn produce(&self, compiler: &dyn Compiler, emit: &mut dyn FnMut(FrameCode)) -> Result<(), ComputeError> {
        let baseline = self
            .baseline
            .compile(compiler)
            .map_err(|source| ComputeError::BaselineCompilation { unit: self.unit, source })?;
        let resolution = baseline.page_size.scaled_resolution(self.width);

        for (index, synthesizer) in self.generators.backgrounds.iter().enumerate() {
            let path = self.image_path(index);
            if let Err(e) = synthesizer.synthesize(&path, resolution, Some(self.progress)) {
                warn!(unit = self.unit, path = %path.display(), error = %e, "Background synthesis failed");
                continue;
            }
            emit(FrameCode {
                bg_img_path: path.display().to_string(),
                ..self.baseline.code().clone()
            });
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
        target.bg_img_path = chosen.bg_img_path.clone();
    }
}
