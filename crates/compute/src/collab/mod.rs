//! External collaborators of the scheduler: the compiler that turns frame
//! source into a paged artifact and the rasterizer that renders one page.
//!
//! Both are opaque blocking calls. The process-backed implementations shell
//! out to a LaTeX engine and to `pdftoppm`; tests substitute in-memory fakes.

mod latex;
mod pdftoppm;

use std::path::PathBuf;
use std::sync::Arc;

use slidesmith_core::PageSize;

use crate::error::{CompileError, RenderError};

pub use latex::{parse_page_count, prepare_work_dir, LatexCompiler};
pub use pdftoppm::PdftoppmRenderer;

/// One rendered page.
pub type RasterImage = image::RgbaImage;

/// The result of a successful compile.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub pdf_path: PathBuf,
    pub page_count: usize,
    pub page_size: PageSize,
}

/// Source handed to a [`Compiler`].
#[derive(Debug, Clone, Copy)]
pub struct CompileJob<'a> {
    /// Deterministic job name, unique per unit, category and generation.
    pub name: &'a str,
    pub source: &'a str,
}

pub trait Compiler: Send + Sync {
    /// Compile a standalone document. May block for seconds.
    fn compile(&self, job: CompileJob<'_>) -> Result<Artifact, CompileError>;
}

pub trait PageRenderer: Send + Sync {
    /// Rasterize zero-based `page` of `artifact`.
    fn render_page(&self, artifact: &Artifact, page: usize) -> Result<RasterImage, RenderError>;
}

/// The pair of collaborators shared by every thread of a scheduler.
#[derive(Clone)]
pub struct Collaborators {
    pub compiler: Arc<dyn Compiler>,
    pub renderer: Arc<dyn PageRenderer>,
}

impl Collaborators {
    pub fn new(compiler: Arc<dyn Compiler>, renderer: Arc<dyn PageRenderer>) -> Self {
        Self { compiler, renderer }
    }
}
