use crate::glyph::{Glyph, NormalizedInk, CROP_SIZE, GLYPH_SIZE, INK_THRESHOLD};
use image::{imageops, GrayImage};
use tracing::debug;

/// Converts a raw canvas snapshot into a normalized glyph.
///
/// Returns `None` when the canvas carries no usable ink; the attempt is then
/// ignored by the caller, it is not an error.
pub fn normalize(canvas: &GrayImage) -> Option<NormalizedInk> {
    let (canvas_width, canvas_height) = canvas.dimensions();

    // 1. Bounding box over ink pixels
    let mut min_x = canvas_width as i64;
    let mut min_y = canvas_height as i64;
    let mut max_x = 0i64;
    let mut max_y = 0i64;
    let mut ink_pixels = 0usize;

    for (x, y, pixel) in canvas.enumerate_pixels() {
        if pixel.0[0] < INK_THRESHOLD {
            min_x = min_x.min(x as i64);
            min_y = min_y.min(y as i64);
            max_x = max_x.max(x as i64);
            max_y = max_y.max(y as i64);
            ink_pixels += 1;
        }
    }

    if ink_pixels == 0 {
        debug!("canvas carries no ink");
        return None;
    }

    // One-pixel inward shrink inherited from the shipped recognizer. Strokes
    // thinner than three pixels collapse the box and read as no ink.
    min_x += 1;
    min_y += 1;
    max_x -= 1;
    max_y -= 1;
    if min_x >= max_x || min_y >= max_y {
        debug!("ink box collapsed under the boundary shrink");
        return None;
    }

    // 2. Square crop centered on the box, translated to stay inside the canvas
    let box_width = max_x - min_x;
    let box_height = max_y - min_y;
    let center_x = min_x + box_width / 2;
    let center_y = min_y + box_height / 2;
    let edge = box_width.max(box_height);

    let mut left = center_x - edge / 2;
    let mut top = center_y - edge / 2;
    if left + edge > canvas_width as i64 {
        left = canvas_width as i64 - edge;
    }
    if top + edge > canvas_height as i64 {
        top = canvas_height as i64 - edge;
    }
    let left = left.max(0) as u32;
    let top = top.max(0) as u32;

    let crop = imageops::crop_imm(canvas, left, top, edge as u32, edge as u32).to_image();

    // 3. Area-average down to the ink patch, invert to the training convention
    let scaled = imageops::thumbnail(&crop, CROP_SIZE as u32, CROP_SIZE as u32);

    // 4. Embed centered in the glyph frame; background after inversion is 0
    let mut glyph: Glyph = [[0u8; GLYPH_SIZE]; GLYPH_SIZE];
    let margin = (GLYPH_SIZE - CROP_SIZE) / 2;
    for (x, y, pixel) in scaled.enumerate_pixels() {
        glyph[y as usize + margin][x as usize + margin] = 255 - pixel.0[0];
    }

    Some(NormalizedInk { glyph, ink_pixels })
}
