use crate::glyph::{NormalizedInk, INK_THRESHOLD};
use image::GrayImage;

/// Decides whether a normalized glyph is a genuine character attempt.
///
/// A user who notices a mistake scribbles over it; heavy coverage must not be
/// misread as a new glyph. The pre-inversion ink count from the bounding-box
/// scan is summed with the bright pixels of the final inverted glyph, and the
/// combined count is weighed against a quarter of the canvas area.
pub fn should_classify(canvas: &GrayImage, ink: &NormalizedInk) -> bool {
    let bright = ink
        .glyph
        .iter()
        .flatten()
        .filter(|&&v| v > INK_THRESHOLD)
        .count();

    let area = canvas.width() as usize * canvas.height() as usize;
    ink.ink_pixels + bright <= area / 4
}
