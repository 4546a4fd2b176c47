//! Handwritten-character recognition core for puzzle-grid cells.
//!
//! Converts the freehand ink raster of a single drawing cell into a canonical
//! 28x28 glyph, filters out correction scribbles, and classifies the glyph
//! with a small frozen convolutional network to produce a display label.
//!
//! The stroke-capture widget, puzzle generation, and model training live
//! outside this crate; it only reads canvas snapshots handed to it at
//! stroke release.

pub mod error;
pub mod glyph;
pub mod guard;
pub mod inception;
pub mod lenet;
pub mod network;
pub mod normalize;
pub mod recognizer;

pub use error::{ModelError, RecognizeError, Result};
pub use glyph::{Glyph, NormalizedInk, CANVAS_BACKGROUND, CROP_SIZE, GLYPH_SIZE, INK_THRESHOLD};
pub use guard::should_classify;
pub use network::{Architecture, Network, NetworkConfig};
pub use normalize::normalize;
pub use recognizer::{LabelSet, Recognizer, StrokeOutcome};

/// CPU backend used for inference at stroke release.
pub type InferenceBackend = burn::backend::NdArray<f32, i32>;
