use std::path::Path;
use std::sync::Mutex;

use tch::{
    nn::{self, FuncT, ModuleT},
    Device, Kind, Tensor,
};

use crate::core::preprocess::Pipeline;
use crate::error::{AppError, Result};

/// A frozen torchvision-layout network plus the pipeline that feeds it.
///
/// Weights are never written after loading, but the compiled forward
/// closure (`FuncT`) is `Send` and not `Sync`. Sharing one instance across
/// request tasks therefore goes through a mutex: concurrent requests run
/// preprocessing in parallel and queue only for the forward pass itself.
/// A TorchScript `CModule` would lift that, at the cost of shipping traced
/// `.pt` files instead of plain `.ot` weights.
pub(crate) struct Network {
    net: Mutex<FuncT<'static>>,
    _vs: nn::VarStore,
    device: Device,
    pipeline: Pipeline,
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("device", &self.device)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl Network {
    /// Build the graph with `build`, then fill it from the `.ot` file at `weights`
    pub(crate) fn load<F>(weights: &Path, device: Device, pipeline: Pipeline, build: F) -> Result<Self>
    where
        F: FnOnce(&nn::Path<'_>) -> FuncT<'static>,
    {
        if !weights.is_file() {
            return Err(AppError::Config(format!(
                "model weights not found at {}",
                weights.display()
            )));
        }

        let mut vs = nn::VarStore::new(device);
        let net = build(&vs.root());
        vs.load(weights)?;

        log::info!("Loaded weights from {} onto {:?}", weights.display(), device);
        Ok(Self::from_var_store(vs, net, pipeline))
    }

    /// Wrap a graph whose variables already live in `vs`; the store is frozen
    pub(crate) fn from_var_store(mut vs: nn::VarStore, net: FuncT<'static>, pipeline: Pipeline) -> Self {
        vs.freeze();
        let device = vs.device();

        Self {
            net: Mutex::new(net),
            _vs: vs,
            device,
            pipeline,
        }
    }

    /// Run one image through the network and return its output on the CPU
    pub(crate) fn forward(&self, image: &[u8]) -> Result<Tensor> {
        let data = self.pipeline.run(image)?;
        let side = i64::from(self.pipeline.output_side());

        let input = Tensor::of_slice(&data)
            .view([1, 3, side, side])
            .to_device(self.device);

        let net = self
            .net
            .lock()
            .map_err(|_| AppError::Internal("network lock poisoned".to_string()))?;
        let output = tch::no_grad(|| net.forward_t(&input, false));

        Ok(output.to_device(Device::Cpu).to_kind(Kind::Float))
    }
}
