use std::path::PathBuf;
use std::sync::Arc;

use slidesmith_beautify::FrameProgress;
use slidesmith_core::{FrameCode, SourceDocument};

use crate::category::{
    BackgroundImprovements, CategoryKind, CategoryManager, GlobalContext, GlobalImprovements, Generators,
    LocalImprovements,
};
use crate::collab::{Artifact, Compiler};
use crate::error::ComputeError;
use crate::variant::LazyArtifact;

/// What every unit of a document shares.
#[derive(Debug, Clone)]
pub struct UnitContext {
    /// Scratch directory; backgrounds go to its `res` subdirectory.
    pub work_dir: PathBuf,
    pub unit_count: usize,
    pub background_width: u32,
    pub generators: Arc<Generators>,
    pub global: Arc<GlobalContext>,
}

/// One frame of the document: its baseline plus three category managers.
#[derive(Debug)]
pub struct Unit {
    index: usize,
    name: String,
    baseline: Arc<LazyArtifact>,
    local: CategoryManager,
    background: CategoryManager,
    global: CategoryManager,
}

impl Unit {
    pub fn new(index: usize, name: impl Into<String>, code: FrameCode, ctx: &UnitContext) -> Self {
        let name = name.into();
        let baseline = Arc::new(LazyArtifact::new(format!("{name}_org"), code.clone()));
        let progress = FrameProgress {
            index,
            count: ctx.unit_count,
        };

        let local = LocalImprovements::new(&name, code.clone(), Arc::clone(&ctx.generators));
        let background = BackgroundImprovements::new(
            index,
            &name,
            Arc::clone(&baseline),
            Arc::clone(&ctx.generators),
            ctx.work_dir.join("res"),
            ctx.background_width,
            progress,
        );
        let global = GlobalImprovements::new(&name, code, Arc::clone(&ctx.global));

        Self {
            index,
            name,
            baseline,
            local: CategoryManager::Local(local),
            background: CategoryManager::Background(background),
            global: CategoryManager::Global(global),
        }
    }

    /// One unit per frame of `doc`, in document order.
    pub fn from_document(doc: &SourceDocument, ctx: &UnitContext) -> Vec<Unit> {
        doc.frames()
            .iter()
            .map(|frame| {
                let code = FrameCode::new(doc.header(), frame.code.as_str());
                Unit::new(frame.index, frame.name.as_str(), code, ctx)
            })
            .collect()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn original_code(&self) -> &FrameCode {
        self.baseline.code()
    }

    /// The baseline artifact, compiled on first access. A baseline that does
    /// not compile leaves the unit unusable.
    pub fn baseline_artifact(&self, compiler: &dyn Compiler) -> Result<Arc<Artifact>, ComputeError> {
        self.baseline
            .compile(compiler)
            .map_err(|source| ComputeError::BaselineCompilation {
                unit: self.index,
                source,
            })
    }

    pub fn page_count(&self, compiler: &dyn Compiler) -> Result<usize, ComputeError> {
        Ok(self.baseline_artifact(compiler)?.page_count)
    }

    pub fn local_improvements(&self) -> &CategoryManager {
        &self.local
    }

    pub fn background_improvements(&self) -> &CategoryManager {
        &self.background
    }

    pub fn global_improvements(&self) -> &CategoryManager {
        &self.global
    }

    pub fn category(&self, kind: CategoryKind) -> &CategoryManager {
        match kind {
            CategoryKind::Local => &self.local,
            CategoryKind::Background => &self.background,
            CategoryKind::Global => &self.global,
        }
    }

    /// The managers in delivery order.
    pub fn categories(&self) -> [&CategoryManager; 3] {
        [&self.local, &self.background, &self.global]
    }

    /// The original frame with every category's current selection applied.
    pub fn improved_code(&self) -> FrameCode {
        let mut code = self.original_code().clone();
        for manager in self.categories() {
            manager.decorate(&mut code);
        }
        code
    }
}
