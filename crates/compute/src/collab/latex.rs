use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Local;
use slidesmith_core::{BeautifierConfig, PageSize};
use tracing::{debug, info, warn};

use super::{Artifact, CompileJob, Compiler};
use crate::error::CompileError;

/// Runs a LaTeX engine in non-stop mode inside the scratch directory.
#[derive(Debug, Clone)]
pub struct LatexCompiler {
    program: String,
    work_dir: PathBuf,
    logs_dir: PathBuf,
    page_size: PageSize,
}

impl LatexCompiler {
    /// `work_dir` is normally the result of [`prepare_work_dir`].
    pub fn new(work_dir: impl Into<PathBuf>, config: &BeautifierConfig) -> Self {
        let work_dir = work_dir.into();
        Self {
            program: config.latex_program.clone(),
            logs_dir: work_dir.join(&config.logs_dir_name),
            work_dir,
            page_size: config.page_size,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

impl Compiler for LatexCompiler {
    fn compile(&self, job: CompileJob<'_>) -> Result<Artifact, CompileError> {
        let tex_path = self.work_dir.join(format!("{}.tex", job.name));
        fs::write(&tex_path, job.source)?;

        debug!(job = job.name, program = %self.program, "Compiling");
        let output = Command::new(&self.program)
            .arg(format!("-output-directory={}", self.work_dir.display()))
            .arg("-interaction=nonstopmode")
            .arg(&tex_path)
            .current_dir(&self.work_dir)
            .output()?;

        fs::create_dir_all(&self.logs_dir)?;
        let timestamp = Local::now().format("%y%m%d-%H%M%S");
        let log_path = self.logs_dir.join(format!("{timestamp}-{}.txt", job.name));
        let mut log = output.stdout.clone();
        log.extend_from_slice(&output.stderr);
        fs::write(&log_path, &log)?;

        if !output.status.success() {
            return Err(CompileError::Failed {
                job: job.name.to_string(),
                status: output.status.code(),
                log: log_path,
            });
        }

        let pdf_path = self.work_dir.join(format!("{}.pdf", job.name));
        if !pdf_path.is_file() {
            return Err(CompileError::MissingOutput(pdf_path));
        }

        let page_count = parse_page_count(&String::from_utf8_lossy(&output.stdout)).unwrap_or_else(|| {
            warn!(job = job.name, "Page count missing from compiler output, assuming 1");
            1
        });

        Ok(Artifact {
            pdf_path,
            page_count,
            page_size: self.page_size,
        })
    }
}

/// Page count from a TeX engine's `Output written on x.pdf (N pages, ...)`
/// summary line.
pub fn parse_page_count(log: &str) -> Option<usize> {
    let at = log.rfind("Output written on")?;
    let rest = &log[at..];
    let open = rest.find('(')?;
    let digits: String = rest[open + 1..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Create the scratch directory next to the source document.
///
/// On first creation every sibling file that is not TeX source, and every
/// sibling directory, is copied in so relative includes keep resolving. An
/// existing scratch directory is reused as is.
pub fn prepare_work_dir(src_dir: &Path, config: &BeautifierConfig) -> std::io::Result<PathBuf> {
    let work_dir = src_dir.join(&config.work_dir_name);
    if !work_dir.exists() {
        fs::create_dir_all(&work_dir)?;
        for entry in fs::read_dir(src_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path == work_dir {
                continue;
            }
            let target = work_dir.join(entry.file_name());
            if path.is_dir() {
                copy_dir_all(&path, &target)?;
            } else if !is_tex_file(&path) {
                fs::copy(&path, &target)?;
            }
        }
        info!(path = %work_dir.display(), "Created work directory");
    }
    fs::create_dir_all(work_dir.join(&config.logs_dir_name))?;
    Ok(work_dir)
}

fn is_tex_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().split('.').skip(1).any(|part| part == "tex"))
        .unwrap_or(false)
}

fn copy_dir_all(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}
