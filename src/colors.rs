//! Terminal colours for the status bands.

use crossterm::style::Color;

use crate::fields::StatusBand;

/// Nothing done yet
pub const CRIMSON: Color = Color::Rgb { r: 255, g: 8, b: 68 };
/// Under a quarter
pub const ORANGE: Color = Color::Rgb { r: 255, g: 107, b: 53 };
pub const GOLD: Color = Color::Rgb { r: 255, g: 215, b: 0 };
pub const LIME: Color = Color::Rgb { r: 168, g: 224, b: 99 };
/// Three quarters and up
pub const BRIGHT_GREEN: Color = Color::Rgb { r: 86, g: 240, b: 0 };

pub fn band_color(band: StatusBand) -> Color {
    match band {
        StatusBand::Idle => CRIMSON,
        StatusBand::Low => ORANGE,
        StatusBand::Mid => GOLD,
        StatusBand::High => LIME,
        StatusBand::Top => BRIGHT_GREEN,
    }
}
