use std::path::Path;

use ndarray::Array1;
use tch::{vision::resnet, Device};

use crate::core::{network::Network, preprocess::Pipeline, similarity::Embedding, ImageEmbedder, EMBEDDING_DIM};
use crate::error::{AppError, Result};

/// ImageNet ResNet-50 with its classification head removed.
///
/// The pooled 2048-wide activation is used as the image embedding.
#[derive(Debug)]
pub struct ResNetEmbedder {
    network: Network,
}

impl ResNetEmbedder {
    /// Load pretrained ImageNet weights (`.ot`) from `weights`
    pub fn load<P: AsRef<Path>>(weights: P, device: Device) -> Result<Self> {
        let network = Network::load(weights.as_ref(), device, Pipeline::EMBEDDER, |p| {
            resnet::resnet50_no_final_layer(p)
        })?;
        Ok(Self { network })
    }
}

impl ImageEmbedder for ResNetEmbedder {
    fn embed(&self, image: &[u8]) -> Result<Embedding> {
        let output = self.network.forward(image)?.flatten(0, -1);
        let embedding = Vec::<f32>::try_from(output)?;

        if embedding.len() != EMBEDDING_DIM {
            return Err(AppError::Model(format!(
                "embedding has {} values, expected {}",
                embedding.len(),
                EMBEDDING_DIM
            )));
        }

        Ok(Array1::from(embedding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::network::tests::gradient_png;
    use tch::nn;

    fn untrained() -> ResNetEmbedder {
        let vs = nn::VarStore::new(Device::Cpu);
        let net = resnet::resnet50_no_final_layer(&vs.root());
        ResNetEmbedder {
            network: Network::from_var_store(vs, net, Pipeline::EMBEDDER),
        }
    }

    #[test]
    fn test_missing_weights_fail() {
        let err = ResNetEmbedder::load("does/not/exist.ot", Device::Cpu).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_embedding_length_and_determinism() {
        let model = untrained();
        let bytes = gradient_png(64, 48);
        let first = model.embed(&bytes).unwrap();
        let second = model.embed(&bytes).unwrap();

        assert_eq!(first.len(), EMBEDDING_DIM);
        assert_eq!(first, second);
    }

    #[test]
    fn test_any_aspect_ratio_gives_full_vector() {
        let model = untrained();
        assert_eq!(model.embed(&gradient_png(20, 90)).unwrap().len(), EMBEDDING_DIM);
    }

    #[test]
    fn test_invalid_image_fails() {
        assert!(matches!(untrained().embed(b"garbage"), Err(AppError::Image(_))));
    }

    #[test]
    fn test_pretrained_weights_if_present() {
        // Runs only when the pretrained weight file is available
        let Some(path) = std::env::var("FLOWERMATCH_EMBEDDER_WEIGHTS")
            .ok()
            .filter(|p| std::path::Path::new(p).is_file())
        else {
            return;
        };

        let model = ResNetEmbedder::load(path, Device::Cpu).unwrap();
        let bytes = gradient_png(64, 48);
        assert_eq!(model.embed(&bytes).unwrap(), model.embed(&bytes).unwrap());
    }
}
