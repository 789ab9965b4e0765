use crate::color::Color;
use crate::img::Frame;

/// Replaces every pixel within `tolerance` of `target` with `replacement`,
/// in one pass over the pixel buffer.
///
/// The source alpha channel is kept on replaced pixels; pixels outside the
/// tolerance are copied bit-exactly. Pure function: the input frame is left
/// untouched, and frames can be processed in parallel because nothing is
/// shared. Tolerance 0 replaces exact matches only; 255 replaces everything
/// (per-channel metric, see [`Color::matches`]).
pub fn replace(frame: &Frame, target: Color, replacement: Color, tolerance: u8) -> Frame {
    let mut pixels = frame.pixels.clone();
    for pixel in pixels.chunks_exact_mut(4) {
        if target.matches(pixel, tolerance) {
            pixel[0] = replacement.red;
            pixel[1] = replacement.green;
            pixel[2] = replacement.blue;
        }
    }
    Frame {
        width: frame.width,
        height: frame.height,
        pixels,
    }
}
