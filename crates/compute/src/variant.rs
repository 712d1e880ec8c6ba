use std::sync::{Arc, OnceLock};

use slidesmith_core::FrameCode;
use tracing::debug;

use crate::category::CategoryKind;
use crate::collab::{Artifact, CompileJob, Compiler};
use crate::error::CompileError;

pub type CompileOutcome = Result<Arc<Artifact>, Arc<CompileError>>;

/// Frame source compiled at most once, on first access.
///
/// Concurrent first accesses block on the same compile. The outcome,
/// success or failure, is kept; a failed compile is never retried.
#[derive(Debug)]
pub struct LazyArtifact {
    job_name: String,
    code: FrameCode,
    outcome: OnceLock<CompileOutcome>,
}

impl LazyArtifact {
    pub fn new(job_name: impl Into<String>, code: FrameCode) -> Self {
        Self {
            job_name: job_name.into(),
            code,
            outcome: OnceLock::new(),
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn code(&self) -> &FrameCode {
        &self.code
    }

    pub fn compile(&self, compiler: &dyn Compiler) -> CompileOutcome {
        self.outcome
            .get_or_init(|| {
                let source = self.code.full_source();
                debug!(job = %self.job_name, "Compiling variant");
                compiler
                    .compile(CompileJob {
                        name: &self.job_name,
                        source: &source,
                    })
                    .map(Arc::new)
                    .map_err(Arc::new)
            })
            .clone()
    }

    /// Whether a compile has run, regardless of its outcome.
    pub fn is_compiled(&self) -> bool {
        self.outcome.get().is_some()
    }
}

/// One candidate rendering of a unit within one category.
#[derive(Debug)]
pub struct Variant {
    category: CategoryKind,
    generation: usize,
    inner: LazyArtifact,
}

impl Variant {
    pub fn new(category: CategoryKind, generation: usize, job_name: String, code: FrameCode) -> Self {
        Self {
            category,
            generation,
            inner: LazyArtifact::new(job_name, code),
        }
    }

    pub fn category(&self) -> CategoryKind {
        self.category
    }

    /// Position in generation order within the category.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn name(&self) -> &str {
        self.inner.job_name()
    }

    pub fn code(&self) -> &FrameCode {
        self.inner.code()
    }

    pub fn is_compiled(&self) -> bool {
        self.inner.is_compiled()
    }

    /// The compiled artifact, or `None` when this variant does not compile.
    pub fn artifact(&self, compiler: &dyn Compiler) -> Option<Arc<Artifact>> {
        match self.inner.compile(compiler) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                debug!(variant = self.name(), error = %e, "Variant failed to compile");
                None
            }
        }
    }
}
