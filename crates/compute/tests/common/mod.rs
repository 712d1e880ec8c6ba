//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};

use slidesmith_beautify::{BackgroundSynthesizer, FrameProgress, SynthesisError};
use slidesmith_compute::{
    Artifact, CategoryKind, Collaborators, CompileError, CompileJob, Compiler, GlobalContext, Generators,
    OutputSink, PageRenderer, RasterImage, RenderError, RenderedVariant, Unit, UnitContext,
};
use slidesmith_core::{FrameCode, PageSize};

pub const TIMEOUT: Duration = Duration::from_secs(10);

pub const HEADER: &str = "\\documentclass{beamer}";
pub const LIST_FRAME: &str = "\\begin{frame}\n\\begin{itemize}\n\\item a\n\\item b\n\\end{itemize}\n\\end{frame}\n";

/// Blocks one job until released, announcing when it is reached.
pub struct Gate {
    job: String,
    entered: Sender<()>,
    release: Receiver<()>,
}

/// Handle the test keeps to observe and open a [`Gate`].
pub struct GateHandle {
    pub entered: Receiver<()>,
    release: Sender<()>,
}

impl GateHandle {
    pub fn wait_entered(&self) {
        self.entered.recv_timeout(TIMEOUT).expect("gated job never started");
    }

    pub fn open(&self) {
        let _ = self.release.send(());
    }
}

pub fn gate(job: &str) -> (Gate, GateHandle) {
    let (entered_tx, entered_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    (
        Gate {
            job: job.to_string(),
            entered: entered_tx,
            release: release_rx,
        },
        GateHandle {
            entered: entered_rx,
            release: release_tx,
        },
    )
}

/// Records every job. Page count is one more than the number of `\pause`
/// commands; sources containing `fail_on` and the job named `fail_job` do
/// not compile.
#[derive(Default)]
pub struct FakeCompiler {
    jobs: Mutex<Vec<String>>,
    fail_on: Option<String>,
    fail_job: Option<String>,
    gate: Option<Gate>,
}

impl FakeCompiler {
    pub fn failing_on(pattern: &str) -> Self {
        Self {
            fail_on: Some(pattern.to_string()),
            ..Self::default()
        }
    }

    pub fn failing_job(name: &str) -> Self {
        Self {
            fail_job: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn gated(gate: Gate) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn jobs(&self) -> Vec<String> {
        self.jobs.lock().unwrap().clone()
    }

    /// Baseline jobs in compile order.
    pub fn baselines(&self) -> Vec<String> {
        self.jobs().into_iter().filter(|j| j.ends_with("_org")).collect()
    }
}

impl Compiler for FakeCompiler {
    fn compile(&self, job: CompileJob<'_>) -> Result<Artifact, CompileError> {
        if let Some(gate) = self.gate.as_ref().filter(|g| g.job == job.name) {
            let _ = gate.entered.send(());
            let _ = gate.release.recv_timeout(TIMEOUT);
        }
        self.jobs.lock().unwrap().push(job.name.to_string());
        let failing = self.fail_on.as_deref().is_some_and(|p| job.source.contains(p))
            || self.fail_job.as_deref() == Some(job.name);
        if failing {
            return Err(CompileError::MissingOutput(PathBuf::from(format!("{}.pdf", job.name))));
        }
        Ok(Artifact {
            pdf_path: PathBuf::from(format!("{}.pdf", job.name)),
            page_count: job.source.matches("\\pause").count() + 1,
            page_size: PageSize::default(),
        })
    }
}

#[derive(Default)]
pub struct FakeRenderer {
    renders: AtomicUsize,
}

impl FakeRenderer {
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl PageRenderer for FakeRenderer {
    fn render_page(&self, artifact: &Artifact, page: usize) -> Result<RasterImage, RenderError> {
        if page >= artifact.page_count {
            return Err(RenderError::PageOutOfRange {
                page,
                count: artifact.page_count,
            });
        }
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(RasterImage::new(2, 1))
    }
}

/// Pretends to write a background, taking `delay` to do so; records the
/// requested paths.
#[derive(Default)]
pub struct FakeBackground {
    pub paths: Mutex<Vec<PathBuf>>,
    delay: Duration,
}

impl FakeBackground {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

impl BackgroundSynthesizer for FakeBackground {
    fn synthesize(
        &self,
        path: &Path,
        _resolution: (u32, u32),
        _progress: Option<FrameProgress>,
    ) -> Result<(), SynthesisError> {
        std::thread::sleep(self.delay);
        self.paths.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

pub fn generators(backgrounds: usize) -> Arc<Generators> {
    slow_generators(backgrounds, Duration::ZERO)
}

/// Like [`generators`], each background taking `delay` to synthesize.
pub fn slow_generators(backgrounds: usize, delay: Duration) -> Arc<Generators> {
    Arc::new(Generators {
        improvers: slidesmith_beautify::default_improvers(),
        backgrounds: (0..backgrounds)
            .map(|_| Box::new(FakeBackground::slow(delay)) as Box<dyn BackgroundSynthesizer>)
            .collect(),
    })
}

pub fn palettes() -> Arc<GlobalContext> {
    Arc::new(GlobalContext::new(vec![
        "\\definecolor{RandomColor1}{RGB}{10,20,30}".into(),
        "\\definecolor{RandomColor1}{RGB}{40,50,60}".into(),
    ]))
}

/// `count` identical list frames named `u0`, `u1`, ...
pub fn units(count: usize, backgrounds: usize, work_dir: &Path) -> Vec<Unit> {
    units_with(count, generators(backgrounds), work_dir)
}

pub fn units_with(count: usize, generators: Arc<Generators>, work_dir: &Path) -> Vec<Unit> {
    let ctx = UnitContext {
        work_dir: work_dir.to_path_buf(),
        unit_count: count,
        background_width: 64,
        generators,
        global: palettes(),
    };
    (0..count)
        .map(|i| Unit::new(i, format!("u{i}"), FrameCode::new(HEADER, LIST_FRAME), &ctx))
        .collect()
}

pub fn collaborators(compiler: &Arc<FakeCompiler>, renderer: &Arc<FakeRenderer>) -> Collaborators {
    Collaborators::new(compiler.clone(), renderer.clone())
}

/// A sink recording every delivery, whatever its category, in arrival order.
pub fn recording_sink() -> (OutputSink, Arc<Mutex<Vec<RenderedVariant>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let slot = |seen: &Arc<Mutex<Vec<RenderedVariant>>>| {
        let seen = Arc::clone(seen);
        move |v: RenderedVariant| seen.lock().unwrap().push(v)
    };
    (OutputSink::new(slot(&seen), slot(&seen), slot(&seen)), seen)
}

pub fn categories(seen: &Mutex<Vec<RenderedVariant>>) -> Vec<(CategoryKind, usize)> {
    seen.lock().unwrap().iter().map(|v| (v.category, v.generation)).collect()
}

pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
