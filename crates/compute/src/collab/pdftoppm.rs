use std::path::PathBuf;
use std::process::Command;

use slidesmith_core::BeautifierConfig;
use tracing::debug;

use super::{Artifact, PageRenderer, RasterImage};
use crate::error::RenderError;

/// Rasterizes pages with poppler's `pdftoppm`, writing one PNG per request
/// next to the artifact.
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    program: String,
    dpi: u32,
}

impl PdftoppmRenderer {
    pub fn new(config: &BeautifierConfig) -> Self {
        Self {
            program: config.renderer_program.clone(),
            dpi: config.render_dpi(),
        }
    }

    fn output_prefix(artifact: &Artifact, page: usize) -> PathBuf {
        let stem = artifact
            .pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        artifact.pdf_path.with_file_name(format!("{stem}_p{page}"))
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render_page(&self, artifact: &Artifact, page: usize) -> Result<RasterImage, RenderError> {
        if page >= artifact.page_count {
            return Err(RenderError::PageOutOfRange {
                page,
                count: artifact.page_count,
            });
        }

        let prefix = Self::output_prefix(artifact, page);
        // pdftoppm numbers pages from one.
        let number = (page + 1).to_string();
        debug!(pdf = %artifact.pdf_path.display(), page, dpi = self.dpi, "Rendering page");
        let output = Command::new(&self.program)
            .args(["-f", &number, "-l", &number])
            .args(["-r", &self.dpi.to_string()])
            .args(["-png", "-singlefile"])
            .arg(&artifact.pdf_path)
            .arg(&prefix)
            .output()?;

        if !output.status.success() {
            return Err(RenderError::Failed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let png = prefix.with_extension("png");
        Ok(image::open(&png)?.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidesmith_core::PageSize;

    fn artifact(pages: usize) -> Artifact {
        Artifact {
            pdf_path: PathBuf::from("/tmp/work/deck_frame1_l0.pdf"),
            page_count: pages,
            page_size: PageSize::default(),
        }
    }

    #[test]
    fn rejects_pages_past_the_end() {
        let renderer = PdftoppmRenderer::new(&BeautifierConfig::default());
        let err = renderer.render_page(&artifact(2), 2).unwrap_err();
        assert!(matches!(err, RenderError::PageOutOfRange { page: 2, count: 2 }));
    }

    #[test]
    fn prefix_sits_next_to_pdf() {
        let prefix = PdftoppmRenderer::output_prefix(&artifact(1), 0);
        assert_eq!(prefix, PathBuf::from("/tmp/work/deck_frame1_l0_p0"));
    }
}
