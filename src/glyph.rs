/// Edge length of the normalized glyph fed to the classifier.
pub const GLYPH_SIZE: usize = 28;

/// Edge length of the resampled ink patch embedded in the glyph frame.
pub const CROP_SIZE: usize = 20;

/// Canvas pixels darker than this count as ink.
pub const INK_THRESHOLD: u8 = 128;

/// Intensity of an untouched canvas pixel.
pub const CANVAS_BACKGROUND: u8 = 255;

/// A normalized glyph: 28x28, single channel, intensity-inverted relative to
/// the canvas (ink bright, background 0).
pub type Glyph = [[u8; GLYPH_SIZE]; GLYPH_SIZE];

/// Output of the normalizer, carrying the pre-inversion ink-pixel count the
/// scribble guard needs alongside the glyph itself.
#[derive(Debug, Clone)]
pub struct NormalizedInk {
    pub glyph: Glyph,
    pub ink_pixels: usize,
}
