use burn::module::Module;
use burn::prelude::Backend;
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Record, Recorder};
use burn::tensor::Tensor;
use tracing::warn;

use crate::error::ModelError;
use crate::glyph::{Glyph, GLYPH_SIZE};
use crate::inception::{Inception, InceptionConfig};
use crate::lenet::{LeNet, LeNetConfig};

/// The closed set of frozen topologies a deployment can ship. The weight blob
/// must match the selected variant; there is no self-describing format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    LeNetStyle,
    InceptionStyle,
}

#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    pub architecture: Architecture,
    pub num_classes: usize,
}

impl NetworkConfig {
    pub fn new(architecture: Architecture, num_classes: usize) -> Self {
        Self {
            architecture,
            num_classes,
        }
    }
}

/// A loaded classifier. Both variants share the same contract: a 28x28
/// single-channel glyph in, one score per class out.
pub enum Network<B: Backend> {
    LeNet(LeNet<B>),
    Inception(Inception<B>),
}

impl<B: Backend> Network<B> {
    /// Initializes the selected topology with untrained parameters.
    pub fn init(config: &NetworkConfig, device: &B::Device) -> Self {
        match config.architecture {
            Architecture::LeNetStyle => {
                Network::LeNet(LeNetConfig::new(config.num_classes).init(device))
            }
            Architecture::InceptionStyle => {
                Network::Inception(InceptionConfig::new(config.num_classes).init(device))
            }
        }
    }

    /// Decodes a serialized weight blob into the selected topology.
    pub fn load(
        config: &NetworkConfig,
        weights: &[u8],
        device: &B::Device,
    ) -> Result<Self, ModelError> {
        let network = match config.architecture {
            Architecture::LeNetStyle => Network::LeNet(
                LeNetConfig::new(config.num_classes)
                    .init(device)
                    .load_record(decode_record(weights, device)?),
            ),
            Architecture::InceptionStyle => Network::Inception(
                InceptionConfig::new(config.num_classes)
                    .init(device)
                    .load_record(decode_record(weights, device)?),
            ),
        };

        Ok(network)
    }

    pub fn architecture(&self) -> Architecture {
        match self {
            Network::LeNet(_) => Architecture::LeNetStyle,
            Network::Inception(_) => Architecture::InceptionStyle,
        }
    }

    /// Runs a forward pass and returns the predicted class index.
    pub fn infer(&self, glyph: &Glyph, device: &B::Device) -> usize {
        let mut image = [[0.0f32; GLYPH_SIZE]; GLYPH_SIZE];
        for y in 0..GLYPH_SIZE {
            for x in 0..GLYPH_SIZE {
                image[y][x] = glyph[y][x] as f32 / 255.0;
            }
        }

        let tensor = Tensor::<B, 2>::from_floats(image, device).unsqueeze();

        let output = match self {
            Network::LeNet(model) => model.forward(tensor),
            Network::Inception(model) => model.forward(tensor),
        };

        let scores = output
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .expect("score vector is f32");

        if scores.is_empty() {
            warn!("classifier produced no scores");
            return 0;
        }

        argmax(&scores)
    }
}

/// Decodes a weight blob into a module record. The bin recorder panics on
/// truncated or malformed input, so the decode runs behind an unwind fence
/// and any failure surfaces as a typed error.
fn decode_record<B: Backend, R: Record<B>>(
    weights: &[u8],
    device: &B::Device,
) -> Result<R, ModelError> {
    let bytes = weights.to_vec();
    let device = device.clone();

    std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
        BinBytesRecorder::<FullPrecisionSettings, Vec<u8>>::default().load(bytes, &device)
    }))
    .map_err(|_| ModelError::Decode("malformed weight blob".to_string()))?
    .map_err(|err| ModelError::Decode(err.to_string()))
}

/// Index of the largest score; ties resolve to the lowest index so that
/// prediction stays deterministic.
fn argmax(scores: &[f32]) -> usize {
    let mut best = 0;
    for (index, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = index;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32, i32>;

    #[test]
    fn argmax_prefers_the_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.5, 1.0, 1.0, 0.2]), 1);
        assert_eq!(argmax(&[2.0, 2.0]), 0);
        assert_eq!(argmax(&[-1.0]), 0);
    }

    #[test]
    fn lenet_predicts_within_the_class_range() {
        let device = Default::default();
        let config = NetworkConfig::new(Architecture::LeNetStyle, 10);
        let network = Network::<B>::init(&config, &device);

        let glyph = [[0u8; GLYPH_SIZE]; GLYPH_SIZE];
        assert!(network.infer(&glyph, &device) < 10);
    }

    #[test]
    fn inception_honors_the_same_contract() {
        let device = Default::default();
        let config = NetworkConfig::new(Architecture::InceptionStyle, 26);
        let network = Network::<B>::init(&config, &device);

        let mut glyph = [[0u8; GLYPH_SIZE]; GLYPH_SIZE];
        glyph[14][14] = 255;
        assert!(network.infer(&glyph, &device) < 26);
    }

    #[test]
    fn inference_is_deterministic() {
        let device = Default::default();
        let config = NetworkConfig::new(Architecture::LeNetStyle, 10);
        let network = Network::<B>::init(&config, &device);

        let mut glyph = [[0u8; GLYPH_SIZE]; GLYPH_SIZE];
        for x in 8..20 {
            glyph[14][x] = 255;
        }
        assert_eq!(
            network.infer(&glyph, &device),
            network.infer(&glyph, &device)
        );
    }

    #[test]
    fn corrupt_weight_blob_is_rejected() {
        let device = Default::default();
        let config = NetworkConfig::new(Architecture::LeNetStyle, 10);
        let result = Network::<B>::load(&config, &[0xde, 0xad, 0xbe, 0xef], &device);
        assert!(result.is_err());
    }
}
