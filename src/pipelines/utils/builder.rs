use super::ComputeDevice;
use crate::error::Result;

pub trait BasePipelineBuilder: Sized {
    type Model;
    type Pipeline;

    type Options: Clone;

    fn options(&self) -> &Self::Options;

    fn compute_device(&self) -> ComputeDevice;

    fn create_model(options: Self::Options, device: candle_core::Device) -> Result<Self::Model>;

    fn get_tokenizer(options: Self::Options) -> Result<tokenizers::Tokenizer>;

    fn construct_pipeline(
        model: Self::Model,
        tokenizer: tokenizers::Tokenizer,
    ) -> Result<Self::Pipeline>;

    fn build(self) -> Result<Self::Pipeline> {
        let device = self.compute_device().resolve()?;

        let model = Self::create_model(self.options().clone(), device)?;
        let tokenizer = Self::get_tokenizer(self.options().clone())?;

        Self::construct_pipeline(model, tokenizer)
    }
}

pub struct StandardPipelineBuilder<Opts> {
    pub(crate) options: Opts,
    pub(crate) device: ComputeDevice,
}

impl<Opts> StandardPipelineBuilder<Opts> {
    pub fn new(options: Opts) -> Self {
        Self {
            options,
            device: ComputeDevice::Cpu,
        }
    }

    pub(crate) fn device_mut(&mut self) -> &mut ComputeDevice {
        &mut self.device
    }

    pub(crate) fn options_mut(&mut self) -> &mut Opts {
        &mut self.options
    }
}
