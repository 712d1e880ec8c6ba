use std::ops::RangeInclusive;

use rand::Rng;

/// Per-channel ranges from which random RGB colors are drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbRandomizer {
    pub red: RangeInclusive<u8>,
    pub green: RangeInclusive<u8>,
    pub blue: RangeInclusive<u8>,
}

impl RgbRandomizer {
    pub const fn new(
        red: RangeInclusive<u8>,
        green: RangeInclusive<u8>,
        blue: RangeInclusive<u8>,
    ) -> Self {
        Self { red, green, blue }
    }

    pub fn pink_shades() -> Self {
        Self::new(240..=255, 190..=210, 190..=210)
    }

    pub fn green_shades() -> Self {
        Self::new(190..=210, 245..=255, 220..=240)
    }

    pub fn purple_shades() -> Self {
        Self::new(220..=240, 220..=240, 245..=255)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> RandomColor {
        RandomColor {
            red: rng.gen_range(self.red.clone()),
            green: rng.gen_range(self.green.clone()),
            blue: rng.gen_range(self.blue.clone()),
        }
    }
}

impl Default for RgbRandomizer {
    fn default() -> Self {
        Self::new(0..=255, 0..=255, 0..=255)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RandomColor {
    pub fn as_rgb(&self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }

    /// `\definecolor` statement naming this color.
    pub fn latex_definition(&self, name: &str) -> String {
        format!(
            "\\definecolor{{{name}}}{{RGB}}{{{},{},{}}}",
            self.red, self.green, self.blue
        )
    }

    pub fn is_dark(&self) -> bool {
        (self.red as u32 + self.green as u32 + self.blue as u32) < 3 * 128
    }

    /// A color whose channels are drawn between the current value and
    /// `current + change` (clamped to the channel range).
    pub fn similar<R: Rng + ?Sized>(&self, change: i16, rng: &mut R) -> RandomColor {
        let shift = |c: u8| {
            let moved = (c as i16 + change).clamp(0, 255) as u8;
            if change < 0 {
                moved..=c
            } else {
                c..=moved
            }
        };
        RgbRandomizer::new(shift(self.red), shift(self.green), shift(self.blue)).sample(rng)
    }
}
