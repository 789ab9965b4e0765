use std::path::PathBuf;

use thiserror::Error;

/// Problems with user-supplied values, caught before any file is touched.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid color '{0}': expected '#RRGGBB', 'RRGGBB' or 'R G B'")]
    Color(String),
    #[error("invalid channel value '{0}': must be an integer in 0..=255")]
    Channel(String),
    #[error("tolerance must be non-negative, got {0}")]
    NegativeTolerance(i64),
    #[error("output name '{0}' must not contain a path; use --output-dir to pick a directory")]
    OutputWithPath(String),
}

/// Failures while reading an input animation.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Gif {
        path: PathBuf,
        source: gif::DecodingError,
    },
    #[error("{path} contains no frames")]
    NoFrames { path: PathBuf },
}

/// Failures while assembling and writing the output animation.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot encode an empty frame sequence")]
    EmptySequence,
    #[error("frame {index} is {got_width}x{got_height}, expected {width}x{height}")]
    DimensionMismatch {
        index: usize,
        width: u16,
        height: u16,
        got_width: u16,
        got_height: u16,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Gif {
        path: PathBuf,
        source: gif::EncodingError,
    },
}
