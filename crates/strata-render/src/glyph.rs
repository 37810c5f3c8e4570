//! Glyph ramps: ordered character sequences mapping intensity to a
//! character, sparse to dense.
//!
//! A ramp only changes which character represents a value. It never
//! feeds back into the scalar field.

/// Default ramp.
pub const STANDARD: &str = " .:-=+*#%@";
/// High-resolution ASCII ramp.
pub const DENSE: &str = " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";
/// Unicode shade blocks.
pub const BLOCKS: &str = " ░▒▓█";
/// Five-step ramp.
pub const MINIMAL: &str = " .oO@";
/// Braille dot ramp.
pub const DOTS: &str = " ⠁⠃⠇⠏⠟⠿⡿⣿";

/// Every named ramp, in menu order.
pub const NAMED_RAMPS: &[(&str, &str)] = &[
    ("standard", STANDARD),
    ("dense", DENSE),
    ("blocks", BLOCKS),
    ("minimal", MINIMAL),
    ("dots", DOTS),
];

/// Resolve a ramp selection to its characters.
///
/// Known names (case-insensitive) map to the built-in ramps. Any other
/// non-empty string is used literally. An empty selection falls back to
/// [`STANDARD`].
pub fn resolve_ramp(selection: &str) -> Vec<char> {
    let trimmed = selection.trim();
    let chars = NAMED_RAMPS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
        .map_or(selection, |(_, ramp)| *ramp);
    if chars.is_empty() {
        STANDARD.chars().collect()
    } else {
        chars.chars().collect()
    }
}

/// Map a value to a ramp character.
///
/// The value is clamped to `[0, 1]` (non-finite counts as 0) and indexes
/// `floor(v * (len - 1))`. An empty ramp yields a space.
pub fn glyph_for(value: f64, ramp: &[char]) -> char {
    let Some(&first) = ramp.first() else {
        return ' ';
    };
    let clamped = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let last = ramp.len().saturating_sub(1);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = (clamped * last as f64).floor() as usize;
    ramp.get(index).copied().unwrap_or(first)
}
