use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use gif::DisposalMethod;

use crate::error::{DecodeError, EncodeError};

/// NeuQuant speed for frames that exceed 256 colors. 1 is slowest/best,
/// 30 is fastest.
const QUANT_SPEED: i32 = 10;

/// One full-canvas frame, RGBA, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
}

impl Frame {
    /// A frame filled with a single opaque color.
    pub fn solid(width: u16, height: u16, rgb: [u8; 3]) -> Self {
        let pixels = [rgb[0], rgb[1], rgb[2], 255].repeat(width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// RGBA of the pixel at (x, y).
    pub fn pixel(&self, x: u16, y: u16) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// An ordered frame sequence decoded from one GIF. All frames share the
/// logical screen dimensions.
#[derive(Debug, Clone)]
pub struct Animation {
    pub width: u16,
    pub height: u16,
    pub frames: Vec<Frame>,
    /// Native per-frame display time, in milliseconds.
    pub delays_ms: Vec<u16>,
}

impl Animation {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Decodes a GIF into full-canvas frames.
///
/// GIF frames may be partial rects with a disposal method; each one is
/// composited onto a persistent canvas so that every returned [`Frame`]
/// stands on its own.
pub fn decode(path: &Path) -> Result<Animation, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options.read_info(file).map_err(|source| DecodeError::Gif {
        path: path.to_path_buf(),
        source,
    })?;

    let width = decoder.width();
    let height = decoder.height();
    let mut canvas = vec![0u8; width as usize * height as usize * 4];
    let mut frames = Vec::new();
    let mut delays_ms = Vec::new();

    loop {
        let frame = match decoder.read_next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(source) => {
                return Err(DecodeError::Gif {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let snapshot = (frame.dispose == DisposalMethod::Previous).then(|| canvas.clone());
        blit(&mut canvas, width, height, frame);
        frames.push(Frame {
            width,
            height,
            pixels: canvas.clone(),
        });
        delays_ms.push(frame.delay.saturating_mul(10));

        match frame.dispose {
            DisposalMethod::Background => clear_rect(&mut canvas, width, height, frame),
            DisposalMethod::Previous => {
                if let Some(snapshot) = snapshot {
                    canvas = snapshot;
                }
            }
            DisposalMethod::Any | DisposalMethod::Keep => {}
        }
    }

    if frames.is_empty() {
        return Err(DecodeError::NoFrames {
            path: path.to_path_buf(),
        });
    }
    Ok(Animation {
        width,
        height,
        frames,
        delays_ms,
    })
}

/// Copies the opaque pixels of a decoded frame rect onto the canvas.
fn blit(canvas: &mut [u8], width: u16, height: u16, frame: &gif::Frame) {
    let width = width as usize;
    let height = height as usize;
    for row in 0..frame.height as usize {
        let y = frame.top as usize + row;
        if y >= height {
            break;
        }
        for col in 0..frame.width as usize {
            let x = frame.left as usize + col;
            if x >= width {
                break;
            }
            let src = (row * frame.width as usize + col) * 4;
            let pixel = &frame.buffer[src..src + 4];
            if pixel[3] != 0 {
                let dst = (y * width + x) * 4;
                canvas[dst..dst + 4].copy_from_slice(pixel);
            }
        }
    }
}

/// Resets the frame rect to transparent, for `DisposalMethod::Background`.
fn clear_rect(canvas: &mut [u8], width: u16, height: u16, frame: &gif::Frame) {
    let width = width as usize;
    let height = height as usize;
    for row in 0..frame.height as usize {
        let y = frame.top as usize + row;
        if y >= height {
            break;
        }
        for col in 0..frame.width as usize {
            let x = frame.left as usize + col;
            if x >= width {
                break;
            }
            let dst = (y * width + x) * 4;
            canvas[dst..dst + 4].fill(0);
        }
    }
}

/// Encodes `frames` as an infinitely looping GIF at `dest`, each frame shown
/// for `duration_ms` (rounded to GIF's native 10 ms unit).
///
/// The file is written to a temporary name in the destination directory and
/// persisted only after the last frame, so an interrupted run never leaves a
/// truncated GIF under the final name.
pub fn encode(frames: &[Frame], duration_ms: u16, dest: &Path) -> Result<(), EncodeError> {
    let first = frames.first().ok_or(EncodeError::EmptySequence)?;
    for (index, frame) in frames.iter().enumerate() {
        if frame.width != first.width || frame.height != first.height {
            return Err(EncodeError::DimensionMismatch {
                index,
                width: first.width,
                height: first.height,
                got_width: frame.width,
                got_height: frame.height,
            });
        }
    }

    let io_err = |source: std::io::Error| EncodeError::Io {
        path: dest.to_path_buf(),
        source,
    };
    let gif_err = |source: gif::EncodingError| EncodeError::Gif {
        path: dest.to_path_buf(),
        source,
    };

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    let delay = ((u32::from(duration_ms) + 5) / 10) as u16;

    let mut writer = BufWriter::new(tmp.as_file());
    {
        let mut encoder =
            gif::Encoder::new(&mut writer, first.width, first.height, &[]).map_err(gif_err)?;
        encoder.set_repeat(gif::Repeat::Infinite).map_err(gif_err)?;
        for frame in frames {
            let mut out = palettize(frame);
            out.delay = delay;
            encoder.write_frame(&out).map_err(gif_err)?;
        }
    }
    writer.flush().map_err(io_err)?;
    drop(writer);

    tmp.persist(dest)
        .map_err(|err| io_err(err.error))
        .map(|_| ())
}

/// Converts an RGBA frame to indexed color. Frames with at most 256 distinct
/// colors get an exact palette; anything larger is quantized with NeuQuant,
/// which may shift colors slightly.
fn palettize(frame: &Frame) -> gif::Frame<'static> {
    match exact_palette(frame) {
        Some(indexed) => indexed,
        None => {
            let mut rgba = frame.pixels.clone();
            gif::Frame::from_rgba_speed(frame.width, frame.height, &mut rgba, QUANT_SPEED)
        }
    }
}

/// Builds an exact palette, or `None` when the frame needs more than 256
/// slots (counting one for transparency).
fn exact_palette(frame: &Frame) -> Option<gif::Frame<'static>> {
    let mut palette: Vec<u8> = Vec::new();
    let mut lookup: HashMap<[u8; 3], u8> = HashMap::new();
    let mut transparent: Option<u8> = None;
    let mut indices = Vec::with_capacity(frame.pixels.len() / 4);

    for pixel in frame.pixels.chunks_exact(4) {
        let index = if pixel[3] == 0 {
            match transparent {
                Some(index) => index,
                None => {
                    if palette.len() >= 256 * 3 {
                        return None;
                    }
                    let index = (palette.len() / 3) as u8;
                    palette.extend_from_slice(&[0, 0, 0]);
                    transparent = Some(index);
                    index
                }
            }
        } else {
            let rgb = [pixel[0], pixel[1], pixel[2]];
            match lookup.get(&rgb) {
                Some(&index) => index,
                None => {
                    if palette.len() >= 256 * 3 {
                        return None;
                    }
                    let index = (palette.len() / 3) as u8;
                    palette.extend_from_slice(&rgb);
                    lookup.insert(rgb, index);
                    index
                }
            }
        };
        indices.push(index);
    }

    let mut indexed = gif::Frame::default();
    indexed.width = frame.width;
    indexed.height = frame.height;
    indexed.buffer = Cow::Owned(indices);
    indexed.palette = Some(palette);
    indexed.transparent = transparent;
    Some(indexed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trip_preserves_frames_and_delay() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.gif");
        let frames = vec![
            Frame::solid(4, 4, [255, 0, 0]),
            Frame::solid(4, 4, [0, 0, 255]),
        ];

        encode(&frames, 100, &dest).unwrap();
        let animation = decode(&dest).unwrap();

        assert_eq!(animation.frame_count(), 2);
        assert_eq!((animation.width, animation.height), (4, 4));
        assert_eq!(animation.frames, frames);
        assert_eq!(animation.delays_ms, vec![100, 100]);
    }

    #[test]
    fn duration_rounds_to_ten_ms() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.gif");
        encode(&[Frame::solid(2, 2, [1, 2, 3])], 48, &dest).unwrap();
        assert_eq!(decode(&dest).unwrap().delays_ms, vec![50]);
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.gif");
        assert!(matches!(
            encode(&[], 100, &dest),
            Err(EncodeError::EmptySequence)
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.gif");
        let frames = vec![Frame::solid(4, 4, [0, 0, 0]), Frame::solid(4, 2, [0, 0, 0])];
        assert!(matches!(
            encode(&frames, 100, &dest),
            Err(EncodeError::DimensionMismatch { index: 1, .. })
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn transparency_survives_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.gif");
        let mut frame = Frame::solid(3, 3, [10, 20, 30]);
        // Punch a transparent hole in the middle.
        let hole = (3 + 1) * 4;
        frame.pixels[hole..hole + 4].fill(0);

        encode(&[frame], 100, &dest).unwrap();
        let animation = decode(&dest).unwrap();

        assert_eq!(animation.frames[0].pixel(1, 1)[3], 0);
        assert_eq!(animation.frames[0].pixel(0, 0), [10, 20, 30, 255]);
    }

    #[test]
    fn oversized_palette_falls_back_to_quantization() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.gif");
        // 300 distinct colors forces the NeuQuant path.
        let mut frame = Frame::solid(30, 10, [0, 0, 0]);
        for (i, pixel) in frame.pixels.chunks_exact_mut(4).enumerate() {
            pixel[0] = (i % 256) as u8;
            pixel[1] = (i / 256) as u8;
        }

        encode(&[frame], 100, &dest).unwrap();
        let animation = decode(&dest).unwrap();
        assert_eq!(animation.frame_count(), 1);
        assert_eq!((animation.width, animation.height), (30, 10));
    }

    #[test]
    fn recolor_end_to_end() {
        use crate::color::Color;
        use crate::replace::replace;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.gif");
        let frames = vec![
            Frame::solid(4, 4, [255, 0, 0]),
            Frame::solid(4, 4, [255, 0, 0]),
        ];

        let processed: Vec<Frame> = frames
            .iter()
            .map(|f| replace(f, Color::new(255, 0, 0), Color::new(0, 255, 0), 10))
            .collect();
        encode(&processed, 100, &dest).unwrap();

        let animation = decode(&dest).unwrap();
        assert_eq!(animation.frame_count(), 2);
        assert_eq!(animation.delays_ms, vec![100, 100]);
        for frame in &animation.frames {
            assert_eq!(*frame, Frame::solid(4, 4, [0, 255, 0]));
        }
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.gif");
        assert!(matches!(decode(&missing), Err(DecodeError::Open { .. })));
    }

    #[test]
    fn garbage_input_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.gif");
        std::fs::write(&path, b"definitely not a gif").unwrap();
        assert!(matches!(decode(&path), Err(DecodeError::Gif { .. })));
    }
}
