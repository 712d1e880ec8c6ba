pub mod category;
pub mod collab;
pub mod document;
pub mod error;
pub mod scheduler;
pub mod sink;
pub mod unit;
pub mod variant;

pub use category::{
    CategoryKind, CategoryManager, GlobalContext, Generators, Improvements, VariantList,
};
pub use collab::{
    prepare_work_dir, Artifact, Collaborators, CompileJob, Compiler, LatexCompiler, PageRenderer,
    PdftoppmRenderer, RasterImage,
};
pub use document::Document;
pub use error::{CompileError, ComputeError, RenderError};
pub use scheduler::{PriorityTask, Scheduler, TaskKind};
pub use sink::{ActiveSink, OutputSink, RenderedVariant, SinkReceivers};
pub use unit::{Unit, UnitContext};
pub use variant::{LazyArtifact, Variant};
