use rand::Rng;

use crate::color::{RandomColor, RgbRandomizer};

/// Produces document-wide color definitions.
pub trait PaletteSynthesizer: Send + Sync {
    /// LaTeX color definitions to be placed right after the document header.
    fn synthesize(&self) -> String;
}

const PALETTE_SLOTS: [&str; 4] = ["primary", "secondary", "tertiary", "quaternary"];

/// Four related random colors wired into the Beamer palette slots.
#[derive(Debug, Clone)]
pub struct RandomPalette {
    base: RgbRandomizer,
}

impl Default for RandomPalette {
    fn default() -> Self {
        Self {
            base: RgbRandomizer::new(50..=200, 50..=200, 50..=200),
        }
    }
}

impl RandomPalette {
    pub fn synthesize_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let c1 = self.base.sample(rng);
        let c2 = c1.similar(20, rng);
        let c3 = c2.similar(30, rng);
        let c4 = c3.similar(20, rng);
        palette_defs(&[c1, c2, c3, c4])
    }
}

impl PaletteSynthesizer for RandomPalette {
    fn synthesize(&self) -> String {
        self.synthesize_with(&mut rand::thread_rng())
    }
}

fn palette_defs(colors: &[RandomColor; 4]) -> String {
    let mut lines: Vec<String> = colors
        .iter()
        .enumerate()
        .map(|(i, c)| c.latex_definition(&format!("RandomColor{}", i + 1)))
        .collect();

    for (i, (slot, color)) in PALETTE_SLOTS.iter().zip(colors).enumerate() {
        let fg = if color.is_dark() { "white" } else { "black" };
        lines.push(format!(
            "\\setbeamercolor{{palette {slot}}}{{bg=RandomColor{}, fg={fg}}}",
            i + 1
        ));
    }
    lines.push("\\setbeamercolor{structure}{fg=RandomColor1}".to_string());
    lines.join("\n")
}
