use std::path::Path;

use tch::{vision::resnet, Device, Tensor};

use crate::core::{
    labels::{flower_name, NUM_FLOWER_CLASSES},
    network::Network,
    preprocess::Pipeline,
    FlowerClassifier,
};
use crate::error::{AppError, Result, ResultExt};

/// ResNet-50 whose final layer emits one score per flower class
#[derive(Debug)]
pub struct ResNetFlowerClassifier {
    network: Network,
}

impl ResNetFlowerClassifier {
    /// Load fine-tuned weights (`.ot`) from `weights`.
    ///
    /// A missing file or any variable with the wrong shape is an error.
    pub fn load<P: AsRef<Path>>(weights: P, device: Device) -> Result<Self> {
        let network = Network::load(weights.as_ref(), device, Pipeline::CLASSIFIER, |p| {
            resnet::resnet50(p, NUM_FLOWER_CLASSES as i64)
        })?;
        Ok(Self { network })
    }
}

impl FlowerClassifier for ResNetFlowerClassifier {
    fn classify(&self, image: &[u8]) -> Result<&'static str> {
        let scores = self.network.forward(image)?;
        top_label(&scores)
    }
}

/// Label of the highest score in a `[1, NUM_FLOWER_CLASSES]` output.
///
/// argmax keeps the first maximum, so ties go to the lowest index.
fn top_label(scores: &Tensor) -> Result<&'static str> {
    let index = scores.argmax(1, false).int64_value(&[0]);
    let index = usize::try_from(index).context("negative class index")?;

    flower_name(index).ok_or_else(|| {
        AppError::Model(format!(
            "class index {} outside the {}-name vocabulary",
            index, NUM_FLOWER_CLASSES
        ))
    })
}
