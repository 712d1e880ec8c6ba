use std::path::PathBuf;
use std::sync::Arc;

use slidesmith_core::CoreError;
use thiserror::Error;

/// Failure of the external compile collaborator.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("compilation of {job} failed with status {status:?} (see {log})")]
    Failed {
        job: String,
        status: Option<i32>,
        log: PathBuf,
    },

    #[error("no output produced at {0}")]
    MissingOutput(PathBuf),
}

/// Failure of the external page rasterizer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rasterizer failed: {0}")]
    Failed(String),

    #[error("image decoding error: {0}")]
    Decode(#[from] image::ImageError),
}

/// Error type for the scheduler and the document model built on it.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("scheduler already started")]
    AlreadyStarted,

    #[error("baseline of unit {unit} failed to compile: {source}")]
    BaselineCompilation {
        unit: usize,
        #[source]
        source: Arc<CompileError>,
    },

    #[error("alternative {index} out of range (max {max})")]
    InvalidAlternative { index: usize, max: usize },

    #[error("unit {0} out of range")]
    UnitOutOfRange(usize),

    #[error("no page is currently shown")]
    NoCurrentPage,

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("document error: {0}")]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}
