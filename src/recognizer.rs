use std::sync::OnceLock;

use burn::prelude::Backend;
use image::{DynamicImage, GrayImage};
use tracing::{debug, warn};

use crate::error::{RecognizeError, Result};
use crate::glyph::{Glyph, CANVAS_BACKGROUND, GLYPH_SIZE};
use crate::guard;
use crate::network::{Architecture, Network, NetworkConfig};
use crate::normalize;

/// Which labels a deployment recognizes; fixes both the number of classes and
/// the display offset of class 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSet {
    Digits,
    Letters,
}

impl LabelSet {
    pub fn num_classes(&self) -> usize {
        match self {
            LabelSet::Digits => 10,
            LabelSet::Letters => 26,
        }
    }

    /// Maps a class index to its display character.
    pub fn label(&self, class: usize) -> char {
        let base = match self {
            LabelSet::Digits => b'0',
            LabelSet::Letters => b'A',
        };
        debug_assert!(class < self.num_classes());
        (base + class as u8) as char
    }
}

/// Outcome of a stroke-release attempt. `NoInk` and `ScribbleCleared` are
/// normal control flow, not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeOutcome {
    NoInk,
    ScribbleCleared,
    Recognized(char),
}

/// The recognition service. Explicitly constructed and passed to whoever owns
/// the drawing cells; there is no process-wide instance.
///
/// The network is decoded from the weight blob on first use, exactly once per
/// service. A blob that fails to decode is logged once and every later
/// classification reports `ModelUnavailable`.
pub struct Recognizer<B: Backend> {
    config: NetworkConfig,
    labels: LabelSet,
    weights: Vec<u8>,
    device: B::Device,
    network: OnceLock<Option<Network<B>>>,
}

impl<B: Backend> Recognizer<B> {
    pub fn new(
        architecture: Architecture,
        labels: LabelSet,
        weights: impl Into<Vec<u8>>,
        device: B::Device,
    ) -> Self {
        Self {
            config: NetworkConfig::new(architecture, labels.num_classes()),
            labels,
            weights: weights.into(),
            device,
            network: OnceLock::new(),
        }
    }

    /// Builds a service around an already-loaded network.
    pub fn with_network(network: Network<B>, labels: LabelSet, device: B::Device) -> Self {
        let config = NetworkConfig::new(network.architecture(), labels.num_classes());
        let cell = OnceLock::new();
        let _ = cell.set(Some(network));
        Self {
            config,
            labels,
            weights: Vec::new(),
            device,
            network: cell,
        }
    }

    fn network(&self) -> Option<&Network<B>> {
        self.network
            .get_or_init(|| match Network::load(&self.config, &self.weights, &self.device) {
                Ok(network) => {
                    debug!("network ready");
                    Some(network)
                }
                Err(err) => {
                    warn!("failed to load network weights: {err}");
                    None
                }
            })
            .as_ref()
    }

    /// Classifies an already-normalized 28x28 grayscale glyph image.
    ///
    /// Normalization and the scribble guard happen before this entry point;
    /// see [`Recognizer::handle_stroke`] for the full stroke-release path.
    pub fn recognize(&self, image: &DynamicImage) -> Result<char> {
        let (width, height) = (image.width(), image.height());
        if width != GLYPH_SIZE as u32 || height != GLYPH_SIZE as u32 {
            warn!(width, height, "invalid image geometry");
            return Err(RecognizeError::InvalidGeometry { width, height });
        }

        let DynamicImage::ImageLuma8(gray) = image else {
            warn!("invalid pixel format");
            return Err(RecognizeError::InvalidFormat);
        };

        let mut glyph: Glyph = [[0; GLYPH_SIZE]; GLYPH_SIZE];
        for (x, y, pixel) in gray.enumerate_pixels() {
            glyph[y as usize][x as usize] = pixel.0[0];
        }

        self.classify(&glyph)
    }

    /// The stroke-release entry point: normalize, weigh the scribble guard,
    /// then classify. On a guard veto the canvas is reset to background and
    /// the caller should drop any previously displayed label.
    pub fn handle_stroke(&self, canvas: &mut GrayImage) -> Result<StrokeOutcome> {
        let Some(ink) = normalize::normalize(canvas) else {
            return Ok(StrokeOutcome::NoInk);
        };

        if !guard::should_classify(canvas, &ink) {
            debug!("scribble detected, clearing cell");
            for pixel in canvas.pixels_mut() {
                pixel.0[0] = CANVAS_BACKGROUND;
            }
            return Ok(StrokeOutcome::ScribbleCleared);
        }

        self.classify(&ink.glyph).map(StrokeOutcome::Recognized)
    }

    fn classify(&self, glyph: &Glyph) -> Result<char> {
        let network = self.network().ok_or(RecognizeError::ModelUnavailable)?;
        let class = network.infer(glyph, &self.device);
        Ok(self.labels.label(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use image::Luma;

    type B = NdArray<f32, i32>;

    fn stub_recognizer(labels: LabelSet) -> Recognizer<B> {
        let device = Default::default();
        let config = NetworkConfig::new(Architecture::LeNetStyle, labels.num_classes());
        let network = Network::init(&config, &device);
        Recognizer::with_network(network, labels, device)
    }

    #[test]
    fn label_offsets_per_deployment() {
        assert_eq!(LabelSet::Letters.label(0), 'A');
        assert_eq!(LabelSet::Letters.label(3), 'D');
        assert_eq!(LabelSet::Digits.label(3), '3');
        assert_eq!(LabelSet::Digits.label(9), '9');
    }

    #[test]
    fn wrong_geometry_is_rejected() {
        let image = DynamicImage::new_luma8(30, 30);
        assert_eq!(
            stub_recognizer(LabelSet::Letters).recognize(&image),
            Err(RecognizeError::InvalidGeometry {
                width: 30,
                height: 30
            })
        );
    }

    #[test]
    fn wrong_format_is_rejected() {
        let image = DynamicImage::new_rgb8(28, 28);
        assert_eq!(
            stub_recognizer(LabelSet::Letters).recognize(&image),
            Err(RecognizeError::InvalidFormat)
        );
    }

    #[test]
    fn recognition_is_deterministic() {
        let recognizer = stub_recognizer(LabelSet::Letters);
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(
            28,
            28,
            Luma([CANVAS_BACKGROUND]),
        ));

        let first = recognizer.recognize(&image).expect("stub model recognizes");
        let second = recognizer.recognize(&image).expect("stub model recognizes");
        assert_eq!(first, second);
        assert!(first.is_ascii_uppercase());
    }

    #[test]
    fn corrupt_weights_surface_as_model_unavailable() {
        let recognizer = Recognizer::<B>::new(
            Architecture::LeNetStyle,
            LabelSet::Digits,
            vec![0xba, 0xad],
            Default::default(),
        );
        let image = DynamicImage::new_luma8(28, 28);
        assert_eq!(
            recognizer.recognize(&image),
            Err(RecognizeError::ModelUnavailable)
        );
        // The failed load is recorded; later calls stay unavailable.
        assert_eq!(
            recognizer.recognize(&image),
            Err(RecognizeError::ModelUnavailable)
        );
    }

    #[test]
    fn empty_canvas_is_a_no_op() {
        let recognizer = stub_recognizer(LabelSet::Digits);
        let mut canvas = GrayImage::from_pixel(100, 100, Luma([CANVAS_BACKGROUND]));
        assert_eq!(
            recognizer.handle_stroke(&mut canvas),
            Ok(StrokeOutcome::NoInk)
        );
    }

    #[test]
    fn scribble_clears_the_canvas_without_touching_the_model() {
        // Broken weights: any classifier call would err with ModelUnavailable.
        let recognizer = Recognizer::<B>::new(
            Architecture::LeNetStyle,
            LabelSet::Digits,
            Vec::new(),
            Default::default(),
        );

        let mut canvas = GrayImage::from_pixel(100, 100, Luma([CANVAS_BACKGROUND]));
        for y in 20..80 {
            for x in 20..80 {
                canvas.put_pixel(x, y, Luma([0]));
            }
        }

        assert_eq!(
            recognizer.handle_stroke(&mut canvas),
            Ok(StrokeOutcome::ScribbleCleared)
        );
        assert!(canvas.pixels().all(|p| p.0[0] == CANVAS_BACKGROUND));
    }

    #[test]
    fn modest_glyph_reaches_the_classifier() {
        let recognizer = stub_recognizer(LabelSet::Digits);
        let mut canvas = GrayImage::from_pixel(100, 100, Luma([CANVAS_BACKGROUND]));
        for y in 40..60 {
            for x in 40..60 {
                canvas.put_pixel(x, y, Luma([0]));
            }
        }

        let outcome = recognizer
            .handle_stroke(&mut canvas)
            .expect("stub model classifies");
        assert!(matches!(outcome, StrokeOutcome::Recognized(c) if c.is_ascii_digit()));
        // The canvas is left alone on a successful classification.
        assert_eq!(canvas.get_pixel(50, 50).0[0], 0);
    }
}
