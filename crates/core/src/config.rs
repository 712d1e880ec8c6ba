use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Page geometry in TeX points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// Beamer's default 4:3 paper (128mm x 96mm).
    pub const BEAMER_DEFAULT: PageSize = PageSize {
        width: 364.19,
        height: 273.14,
    };

    /// Pixel resolution with the longer side scaled to `long_side` pixels.
    pub fn scaled_resolution(&self, long_side: u32) -> (u32, u32) {
        let long = self.width.max(self.height);
        let short = self.width.min(self.height);
        if long <= 0.0 {
            return (long_side, long_side);
        }
        let scaled = (long_side as f64 * short / long).round() as u32;
        if self.width >= self.height {
            (long_side, scaled.max(1))
        } else {
            (scaled.max(1), long_side)
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::BEAMER_DEFAULT
    }
}

/// Settings for the compile/render collaborators and the variant generators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeautifierConfig {
    /// Name of the scratch directory created next to the source document.
    #[serde(default = "default_work_dir_name")]
    pub work_dir_name: String,
    /// Name of the compile-log subdirectory inside the scratch directory.
    #[serde(default = "default_logs_dir_name")]
    pub logs_dir_name: String,
    /// LaTeX engine invoked for every compile.
    #[serde(default = "default_latex_program")]
    pub latex_program: String,
    /// PDF rasterizer invoked for every rendered page.
    #[serde(default = "default_renderer_program")]
    pub renderer_program: String,
    /// Raster zoom relative to 72 dpi.
    #[serde(default = "default_render_zoom")]
    pub render_zoom: f64,
    /// Number of palettes synthesized per document.
    #[serde(default = "default_palette_count")]
    pub palette_count: usize,
    /// Width in pixels of synthesized background images.
    #[serde(default = "default_background_width")]
    pub background_width: u32,
    /// Page geometry assumed when the compiler cannot report one.
    #[serde(default)]
    pub page_size: PageSize,
}

fn default_work_dir_name() -> String { ".bb-temp".into() }
fn default_logs_dir_name() -> String { "bb-logs".into() }
fn default_latex_program() -> String { "xelatex".into() }
fn default_renderer_program() -> String { "pdftoppm".into() }
fn default_render_zoom() -> f64 { 4.0 }
fn default_palette_count() -> usize { 4 }
fn default_background_width() -> u32 { 1920 }

impl Default for BeautifierConfig {
    fn default() -> Self {
        Self {
            work_dir_name: default_work_dir_name(),
            logs_dir_name: default_logs_dir_name(),
            latex_program: default_latex_program(),
            renderer_program: default_renderer_program(),
            render_zoom: default_render_zoom(),
            palette_count: default_palette_count(),
            background_width: default_background_width(),
            page_size: PageSize::default(),
        }
    }
}

impl BeautifierConfig {
    /// Parse config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides.
    ///
    /// Convention: `SLIDESMITH_KEY` overrides `key`, e.g.
    /// `SLIDESMITH_LATEX_PROGRAM` -> `latex_program`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SLIDESMITH_WORK_DIR_NAME") {
            self.work_dir_name = v;
        }
        if let Ok(v) = std::env::var("SLIDESMITH_LATEX_PROGRAM") {
            self.latex_program = v;
        }
        if let Ok(v) = std::env::var("SLIDESMITH_RENDERER_PROGRAM") {
            self.renderer_program = v;
        }
        if let Ok(v) = std::env::var("SLIDESMITH_RENDER_ZOOM") {
            if let Ok(zoom) = v.parse::<f64>() {
                self.render_zoom = zoom;
            }
        }
        if let Ok(v) = std::env::var("SLIDESMITH_PALETTE_COUNT") {
            if let Ok(n) = v.parse::<usize>() {
                self.palette_count = n;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.work_dir_name.is_empty() {
            return Err(ConfigError::Invalid("work_dir_name must not be empty".into()));
        }
        if !(self.render_zoom > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "render_zoom must be positive, got {}",
                self.render_zoom
            )));
        }
        if self.background_width == 0 {
            return Err(ConfigError::Invalid("background_width must be positive".into()));
        }
        Ok(())
    }

    /// Rasterizer resolution in dots per inch.
    pub fn render_dpi(&self) -> u32 {
        (72.0 * self.render_zoom).round() as u32
    }
}
