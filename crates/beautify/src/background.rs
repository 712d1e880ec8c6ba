//! Synthesized background images.

use std::path::Path;

use image::{Rgb, RgbImage};
use rand::Rng;
use thiserror::Error;

use crate::color::RgbRandomizer;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid resolution {0}x{1}")]
    InvalidResolution(u32, u32),
}

/// Position of a frame within its presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameProgress {
    /// Zero-based frame index.
    pub index: usize,
    pub count: usize,
}

/// Writes a background image that can be included behind a frame.
pub trait BackgroundSynthesizer: Send + Sync {
    /// Render the background to `path` at `resolution` (width, height).
    fn synthesize(
        &self,
        path: &Path,
        resolution: (u32, u32),
        progress: Option<FrameProgress>,
    ) -> Result<(), SynthesisError>;
}

/// Backgrounds in the order their variants are generated.
pub fn default_backgrounds() -> Vec<Box<dyn BackgroundSynthesizer>> {
    vec![
        Box::new(RandomCirclesBackground::new(RgbRandomizer::pink_shades())),
        Box::new(RandomCirclesBackground::new(RgbRandomizer::green_shades())),
        Box::new(RandomCirclesBackground::new(RgbRandomizer::purple_shades())),
    ]
}

#[derive(Debug, Clone, Copy)]
struct Circle {
    x: i64,
    y: i64,
    r: i64,
}

impl Circle {
    fn collides(&self, other: &Circle, margin: i64) -> bool {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let reach = self.r + other.r + margin;
        dx * dx + dy * dy < reach * reach
    }
}

/// Randomly placed, non-overlapping translucent circles on white, with an
/// optional progress strip along the bottom edge.
#[derive(Debug, Clone)]
pub struct RandomCirclesBackground {
    colors: RgbRandomizer,
}

impl RandomCirclesBackground {
    const RADIUS_MIN: i64 = 30;
    const RADIUS_MAX: i64 = 60;
    const MARGIN: i64 = 30;
    const OPACITY: u16 = 128;
    const MAX_FAILED_PLACEMENTS: u32 = 5;

    const COLUMNS: usize = 100;
    const COLUMN_WIDTH: u32 = 5;
    const SMALL_COLUMN: (u32, u32) = (20, 40);
    const LARGE_COLUMN: (u32, u32) = (80, 120);
    const LARGE_COLUMNS: usize = 15;
    const MEDIUM_COLUMNS: usize = 8;

    pub fn new(colors: RgbRandomizer) -> Self {
        Self { colors }
    }

    pub fn render<R: Rng + ?Sized>(
        &self,
        resolution: (u32, u32),
        progress: Option<FrameProgress>,
        rng: &mut R,
    ) -> Result<RgbImage, SynthesisError> {
        let (width, height) = resolution;
        if width == 0 || height == 0 {
            return Err(SynthesisError::InvalidResolution(width, height));
        }

        let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
        for circle in self.place_circles(width as i64, height as i64, rng) {
            let color = self.colors.sample(rng).as_rgb();
            blend_circle(&mut img, circle, color, Self::OPACITY);
        }

        if let Some(progress) = progress {
            let heights = Self::progress_columns(progress, rng);
            draw_columns(&mut img, &heights, Self::COLUMN_WIDTH);
        }
        Ok(img)
    }

    fn place_circles<R: Rng + ?Sized>(&self, width: i64, height: i64, rng: &mut R) -> Vec<Circle> {
        let mut circles: Vec<Circle> = Vec::new();
        let mut failed = 0;

        while failed < Self::MAX_FAILED_PLACEMENTS {
            let r = rng.gen_range(Self::RADIUS_MIN..=Self::RADIUS_MAX);
            let lo = Self::MARGIN + r;
            let (hi_x, hi_y) = (width - r - Self::MARGIN, height - r - Self::MARGIN);
            if hi_x < lo || hi_y < lo {
                failed += 1;
                continue;
            }
            let candidate = Circle {
                x: rng.gen_range(lo..=hi_x),
                y: rng.gen_range(lo..=hi_y),
                r,
            };
            if circles.iter().any(|c| c.collides(&candidate, Self::MARGIN)) {
                failed += 1;
            } else {
                failed = 0;
                circles.push(candidate);
            }
        }
        circles
    }

    /// Column heights: small everywhere, large around the frame's position,
    /// ramping up on both sides of the large block.
    fn progress_columns<R: Rng + ?Sized>(progress: FrameProgress, rng: &mut R) -> Vec<u32> {
        let n = Self::COLUMNS;
        let mut heights: Vec<u32> = (0..n)
            .map(|_| rng.gen_range(Self::SMALL_COLUMN.0..=Self::SMALL_COLUMN.1))
            .collect();

        let mid = if progress.count > 1 {
            (progress.index * n + (progress.count - 1) / 2) / (progress.count - 1)
        } else {
            0
        };
        let half = Self::LARGE_COLUMNS / 2;
        let large_hi = (mid + half).min(n);
        let large_lo = mid.saturating_sub(half).min(large_hi);
        for h in &mut heights[large_lo..large_hi] {
            *h = rng.gen_range(Self::LARGE_COLUMN.0..=Self::LARGE_COLUMN.1);
        }

        let ramp_len = Self::MEDIUM_COLUMNS;
        let left: Vec<usize> = (large_lo.saturating_sub(ramp_len)..large_lo).collect();
        let right: Vec<usize> = (large_hi..(large_hi + ramp_len).min(n)).rev().collect();
        for side in [left, right] {
            let mut lo = Self::SMALL_COLUMN.1;
            let mut hi = (Self::SMALL_COLUMN.1 + Self::LARGE_COLUMN.0) / 2;
            let cap = (Self::LARGE_COLUMN.0 + Self::LARGE_COLUMN.1) / 2;
            for idx in side {
                heights[idx] = rng.gen_range(lo..=hi);
                lo = (lo + 5).min(hi);
                hi = (hi + 3).min(cap);
            }
        }
        heights
    }
}

impl BackgroundSynthesizer for RandomCirclesBackground {
    fn synthesize(
        &self,
        path: &Path,
        resolution: (u32, u32),
        progress: Option<FrameProgress>,
    ) -> Result<(), SynthesisError> {
        let img = self.render(resolution, progress, &mut rand::thread_rng())?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        img.save(path)?;
        Ok(())
    }
}

fn blend_circle(img: &mut RgbImage, c: Circle, color: [u8; 3], alpha: u16) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let r2 = c.r * c.r;
    for y in (c.y - c.r).max(0)..(c.y + c.r + 1).min(h) {
        for x in (c.x - c.r).max(0)..(c.x + c.r + 1).min(w) {
            let (dx, dy) = (x - c.x, y - c.y);
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let px = img.get_pixel_mut(x as u32, y as u32);
            for (dst, src) in px.0.iter_mut().zip(color) {
                let blended = (src as u16 * alpha + *dst as u16 * (255 - alpha)) / 255;
                *dst = blended as u8;
            }
        }
    }
}

fn draw_columns(img: &mut RgbImage, heights: &[u32], column_width: u32) {
    let (w, h) = (img.width(), img.height());
    let x_start = (w as f64 * 0.1).round() as u32;
    let x_end = (w as f64 * 0.9).round() as u32;
    let step = ((x_end - x_start) / heights.len().max(1) as u32).max(1);
    let bottom = (h as f64 * 0.95).round() as u32;

    for (i, &col_h) in heights.iter().enumerate() {
        let x0 = x_start + i as u32 * step;
        for x in x0..(x0 + column_width).min(w) {
            for y in bottom.saturating_sub(col_h)..bottom.min(h) {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
    }
}
