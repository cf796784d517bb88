use crate::error::{PipelineError, Result};
use candle_core::Device;

pub mod builder;
pub use builder::{BasePipelineBuilder, StandardPipelineBuilder};

/// Where inference runs.
///
/// Resolve it once at startup (usually with [`ComputeDevice::detect`]) and hand it to a pipeline
/// builder. The choice only affects speed; labels are the same on every device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComputeDevice {
    /// Default processing device.
    #[default]
    Cpu,
    /// CUDA GPU with the given ordinal.
    Cuda(usize),
    /// Metal GPU with the given ordinal.
    Metal(usize),
}

impl ComputeDevice {
    /// Picks the first available accelerator (CUDA, then Metal), otherwise the CPU.
    pub fn detect() -> Self {
        let device = if candle_core::utils::cuda_is_available() {
            ComputeDevice::Cuda(0)
        } else if candle_core::utils::metal_is_available() {
            ComputeDevice::Metal(0)
        } else {
            ComputeDevice::Cpu
        };
        tracing::info!(
            accelerator = device.is_accelerator(),
            device = %device,
            "compute device selected"
        );
        device
    }

    /// Whether this is a GPU rather than the CPU.
    pub fn is_accelerator(&self) -> bool {
        !matches!(self, ComputeDevice::Cpu)
    }

    /// Initializes the underlying Candle device.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Device`] if the accelerator cannot be initialized, for example when the
    /// crate was built without the matching `cuda`/`metal` feature.
    pub fn resolve(self) -> Result<Device> {
        match self {
            ComputeDevice::Cpu => Ok(Device::Cpu),
            ComputeDevice::Cuda(i) => Device::new_cuda(i).map_err(|e| {
                PipelineError::Device(format!(
                    "Failed to init CUDA device {i}: {e}. Try CPU as fallback."
                ))
            }),
            ComputeDevice::Metal(i) => Device::new_metal(i).map_err(|e| {
                PipelineError::Device(format!(
                    "Failed to init Metal device {i}: {e}. Try CPU as fallback."
                ))
            }),
        }
    }
}

impl std::fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputeDevice::Cpu => write!(f, "cpu"),
            ComputeDevice::Cuda(i) => write!(f, "cuda:{i}"),
            ComputeDevice::Metal(i) => write!(f, "metal:{i}"),
        }
    }
}

macro_rules! impl_device_methods {
    (delegated: $builder:ident < $($gen:ident : $bound:path),* >) => {
        impl<$($gen: $bound),*> $builder<$($gen),*> {
            /// Use CPU for inference (default).
            pub fn cpu(mut self) -> Self {
                *self.0.device_mut() = crate::pipelines::utils::ComputeDevice::Cpu;
                self
            }

            /// Use a specific CUDA GPU for inference.
            pub fn cuda(mut self, index: usize) -> Self {
                *self.0.device_mut() = crate::pipelines::utils::ComputeDevice::Cuda(index);
                self
            }

            /// Use a specific Metal GPU for inference.
            pub fn metal(mut self, index: usize) -> Self {
                *self.0.device_mut() = crate::pipelines::utils::ComputeDevice::Metal(index);
                self
            }

            /// Use a device chosen elsewhere, typically
            /// [`ComputeDevice::detect`](crate::ComputeDevice::detect).
            pub fn device(mut self, device: crate::pipelines::utils::ComputeDevice) -> Self {
                *self.0.device_mut() = device;
                self
            }
        }
    };
}

pub(crate) use impl_device_methods;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_is_the_default_and_always_resolves() {
        let device = ComputeDevice::default();
        assert_eq!(device, ComputeDevice::Cpu);
        assert!(!device.is_accelerator());
        assert!(device.resolve().unwrap().is_cpu());
    }

    #[test]
    fn detect_falls_back_to_cpu_without_accelerators() {
        let device = ComputeDevice::detect();
        if !candle_core::utils::cuda_is_available() && !candle_core::utils::metal_is_available() {
            assert_eq!(device, ComputeDevice::Cpu);
        } else {
            assert!(device.is_accelerator());
        }
    }

    #[test]
    fn display_names_the_device() {
        assert_eq!(ComputeDevice::Cpu.to_string(), "cpu");
        assert_eq!(ComputeDevice::Cuda(1).to_string(), "cuda:1");
        assert_eq!(ComputeDevice::Metal(0).to_string(), "metal:0");
    }
}
