//! Page-by-page navigation over a document whose frames compile in the
//! background.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use slidesmith_beautify::RandomPalette;
use slidesmith_core::{BeautifierConfig, SourceDocument};
use tracing::info;

use crate::category::{CategoryManager, GlobalContext, Generators};
use crate::collab::{prepare_work_dir, Collaborators, LatexCompiler, PdftoppmRenderer, RasterImage};
use crate::error::ComputeError;
use crate::scheduler::{PriorityTask, Scheduler};
use crate::sink::{ActiveSink, OutputSink};
use crate::unit::{Unit, UnitContext};

/// An open Beamer document.
///
/// Moving to a page makes the page's unit the scheduler's priority and
/// routes its variants to the sink passed along; the previously installed
/// sink is cancelled.
pub struct Document {
    source: SourceDocument,
    work_dir: PathBuf,
    scheduler: Scheduler,
    global: Arc<GlobalContext>,
    active_sink: ActiveSink,
    /// Current unit; `-1` before the first page, `unit_count` past the last.
    current: isize,
    /// Last shown page per unit, with the same out-of-range conventions.
    pages: Vec<isize>,
}

impl Document {
    /// Load `path`, prepare its scratch directory next to it and start
    /// compiling with the external LaTeX and rasterizer programs.
    pub fn open(path: impl AsRef<Path>, config: &BeautifierConfig) -> Result<Self, ComputeError> {
        let path = path.as_ref();
        let source = SourceDocument::load(path)?;
        let src_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let work_dir = prepare_work_dir(src_dir, config)?;

        let collaborators = Collaborators::new(
            Arc::new(LatexCompiler::new(work_dir.clone(), config)),
            Arc::new(PdftoppmRenderer::new(config)),
        );
        let global = GlobalContext::synthesize(&RandomPalette::default(), config.palette_count);
        Self::build(
            source,
            work_dir,
            config,
            collaborators,
            Arc::new(Generators::default()),
            Arc::new(global),
        )
    }

    /// Assemble a document from already prepared parts and start its
    /// scheduler.
    pub fn build(
        source: SourceDocument,
        work_dir: PathBuf,
        config: &BeautifierConfig,
        collaborators: Collaborators,
        generators: Arc<Generators>,
        global: Arc<GlobalContext>,
    ) -> Result<Self, ComputeError> {
        let ctx = UnitContext {
            work_dir: work_dir.clone(),
            unit_count: source.frames().len(),
            background_width: config.background_width,
            generators,
            global: Arc::clone(&global),
        };
        let units = Unit::from_document(&source, &ctx);
        let count = units.len();

        let scheduler = Scheduler::new(collaborators);
        scheduler.start(units)?;
        info!(document = source.name(), frames = count, work_dir = %work_dir.display(), "Document opened");

        Ok(Self {
            source,
            work_dir,
            scheduler,
            global,
            active_sink: ActiveSink::default(),
            current: -1,
            pages: vec![-1; count],
        })
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn unit_count(&self) -> usize {
        self.pages.len()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn global_context(&self) -> &Arc<GlobalContext> {
        &self.global
    }

    /// The unit and page last shown, if the cursor is on one.
    pub fn position(&self) -> Option<(usize, usize)> {
        let unit = usize::try_from(self.current).ok()?;
        let page = usize::try_from(*self.pages.get(unit)?).ok()?;
        Some((unit, page))
    }

    /// Advance one page, crossing into the next unit at the end of the
    /// current one. Returns the baseline rendering of the new page, or
    /// `None` past the last page.
    pub fn next_page(&mut self, sink: OutputSink) -> Result<Option<RasterImage>, ComputeError> {
        let sink = self.active_sink.install(sink);
        let count = self.pages.len() as isize;
        self.current = self.current.max(0);

        while self.current < count {
            let unit = self.current as usize;
            let pages = self.page_count(unit)? as isize;
            let next = (self.pages[unit] + 1).min(pages);
            self.pages[unit] = next;
            if next < pages {
                return self.show(unit, next as usize, sink).map(Some);
            }
            self.current += 1;
        }
        Ok(None)
    }

    /// Step back one page, crossing into the previous unit at the start of
    /// the current one. Returns `None` before the first page.
    pub fn prev_page(&mut self, sink: OutputSink) -> Result<Option<RasterImage>, ComputeError> {
        let sink = self.active_sink.install(sink);
        let count = self.pages.len() as isize;
        self.current = self.current.min(count - 1);

        while self.current >= 0 {
            let unit = self.current as usize;
            let pages = self.page_count(unit)? as isize;
            let prev = (self.pages[unit].min(pages) - 1).max(-1);
            self.pages[unit] = prev;
            if prev >= 0 {
                return self.show(unit, prev as usize, sink).map(Some);
            }
            self.current -= 1;
        }
        Ok(None)
    }

    /// Discard and rebuild the backgrounds of the current unit, streaming
    /// the new ones to `sink`.
    pub fn regenerate_backgrounds(&mut self, sink: OutputSink) -> Result<(), ComputeError> {
        let (unit, page) = self.position().ok_or(ComputeError::NoCurrentPage)?;
        let sink = self.active_sink.install(sink);
        self.scheduler
            .set_priority_task(PriorityTask::regenerate_backgrounds(unit, page, sink))
    }

    pub fn current_unit(&self) -> Option<&Unit> {
        let (unit, _) = self.position()?;
        self.scheduler.unit(unit)
    }

    pub fn current_local_improvements(&self) -> Option<&CategoryManager> {
        self.current_unit().map(Unit::local_improvements)
    }

    pub fn current_background_improvements(&self) -> Option<&CategoryManager> {
        self.current_unit().map(Unit::background_improvements)
    }

    pub fn current_global_improvements(&self) -> Option<&CategoryManager> {
        self.current_unit().map(Unit::global_improvements)
    }

    /// The full document source with every unit's selections applied.
    pub fn improved_source(&self) -> String {
        let frames: Vec<String> = self
            .scheduler
            .units()
            .iter()
            .map(|unit| unit.improved_code().frame_source())
            .collect();
        let color_defs = self.global.selected_palette().unwrap_or_default();
        self.source.improved_source(&frames, color_defs)
    }

    /// Write [`improved_source`](Self::improved_source) to `path`, adding a
    /// `.tex` extension when it has none.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<PathBuf, ComputeError> {
        let mut path = path.as_ref().to_path_buf();
        if path.extension().map_or(true, |ext| ext != "tex") {
            path.as_mut_os_string().push(".tex");
        }
        std::fs::write(&path, self.improved_source())?;
        info!(path = %path.display(), "Saved improved document");
        Ok(path)
    }

    /// Cancel the active sink and stop the walker.
    pub fn close(&self) {
        self.active_sink.cancel();
        self.scheduler.stop();
    }

    fn page_count(&self, unit: usize) -> Result<usize, ComputeError> {
        let unit = self.scheduler.unit(unit).ok_or(ComputeError::UnitOutOfRange(unit))?;
        unit.page_count(self.scheduler.collaborators().compiler.as_ref())
    }

    fn show(&self, unit: usize, page: usize, sink: Arc<OutputSink>) -> Result<RasterImage, ComputeError> {
        self.scheduler.set_priority_task(PriorityTask::load(unit, page, sink))?;
        let collaborators = self.scheduler.collaborators();
        let artifact = self
            .scheduler
            .unit(unit)
            .ok_or(ComputeError::UnitOutOfRange(unit))?
            .baseline_artifact(collaborators.compiler.as_ref())?;
        Ok(collaborators.renderer.render_page(&artifact, page)?)
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        self.close();
    }
}
