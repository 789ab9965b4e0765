//! Replace a color in GIF animations, within a numeric tolerance.
//!
//! The library splits into the core — [`img`] (frame extraction/assembly)
//! and [`replace`] (the per-pixel substitution) — and the collaborators the
//! CLI uses: [`color`] parsing and [`output`] path construction.

pub mod color;
pub mod error;
pub mod img;
pub mod output;
pub mod replace;

pub use color::Color;
pub use img::{Animation, Frame};
