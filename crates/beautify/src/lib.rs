//! Improvement generators for presentation frames.
//!
//! Three families, one per improvement category:
//! - [`improver`]: content rewrites of a frame's body (layout changes)
//! - [`background`]: synthesized background images
//! - [`palette`]: document-wide color palettes

pub mod background;
pub mod color;
pub mod improver;
pub mod palette;

pub use background::{
    default_backgrounds, BackgroundSynthesizer, FrameProgress, RandomCirclesBackground,
    SynthesisError,
};
pub use color::{RandomColor, RgbRandomizer};
pub use improver::{default_improvers, ContentImprover, ItemizeIndentIncrease, ListToTable};
pub use palette::{PaletteSynthesizer, RandomPalette};
