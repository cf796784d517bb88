use super::model::SentimentAnalysisModel;
use super::pipeline::SentimentAnalysisPipeline;
use crate::error::Result;
use crate::models::roberta::RobertaOptions;
use crate::pipelines::utils::{BasePipelineBuilder, ComputeDevice, StandardPipelineBuilder};

crate::pipelines::utils::impl_device_methods!(
    delegated: SentimentAnalysisPipelineBuilder<M: SentimentAnalysisModel>
);

/// Builder for creating [`SentimentAnalysisPipeline`] instances.
///
/// Use [`Self::twitter_roberta`] or [`Self::roberta`] as the entry point.
///
/// # Examples
///
/// ```rust,no_run
/// # use sentiment_pipelines::sentiment::SentimentAnalysisPipelineBuilder;
/// # fn main() -> sentiment_pipelines::error::Result<()> {
/// let pipeline = SentimentAnalysisPipelineBuilder::twitter_roberta()
///     .cuda(0)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SentimentAnalysisPipelineBuilder<M: SentimentAnalysisModel>(
    StandardPipelineBuilder<M::Options>,
);

impl<M: SentimentAnalysisModel> SentimentAnalysisPipelineBuilder<M> {
    pub(crate) fn new(options: M::Options) -> Self {
        Self(StandardPipelineBuilder::new(options))
    }

    /// Builds the pipeline with configured settings.
    ///
    /// Model and tokenizer are fully loaded before this returns, so nothing is classified
    /// when a download fails.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ResourceUnavailable`](crate::error::PipelineError::ResourceUnavailable)
    /// if the model cannot be resolved,
    /// [`PipelineError::Device`](crate::error::PipelineError::Device) if the requested
    /// accelerator cannot be initialized.
    pub fn build(self) -> Result<SentimentAnalysisPipeline<M>> {
        tracing::info!(
            model = ?self.0.options,
            device = %self.0.device,
            "loading sentiment pipeline"
        );
        BasePipelineBuilder::build(self)
    }
}

impl<M: SentimentAnalysisModel> BasePipelineBuilder for SentimentAnalysisPipelineBuilder<M> {
    type Model = M;
    type Pipeline = SentimentAnalysisPipeline<M>;
    type Options = M::Options;

    fn options(&self) -> &Self::Options {
        &self.0.options
    }

    fn compute_device(&self) -> ComputeDevice {
        self.0.device
    }

    fn create_model(options: Self::Options, device: candle_core::Device) -> Result<M> {
        M::new(options, device)
    }

    fn get_tokenizer(options: Self::Options) -> Result<tokenizers::Tokenizer> {
        M::get_tokenizer(options)
    }

    fn construct_pipeline(model: M, tokenizer: tokenizers::Tokenizer) -> Result<Self::Pipeline> {
        Ok(SentimentAnalysisPipeline { model, tokenizer })
    }
}

impl SentimentAnalysisPipelineBuilder<super::SentimentRoberta> {
    /// Creates a builder for `cardiffnlp/twitter-roberta-base-sentiment`.
    pub fn twitter_roberta() -> Self {
        Self::new(RobertaOptions::twitter_sentiment())
    }

    /// Creates a builder for any RoBERTa sequence classifier on the hub.
    pub fn roberta(model_id: &str) -> Self {
        Self::new(RobertaOptions::new(model_id))
    }

    /// Pins the model repository to a branch, tag or commit.
    pub fn revision(mut self, revision: &str) -> Self {
        self.0.options_mut().revision = Some(revision.into());
        self
    }

    /// Names the model's output classes in id order.
    ///
    /// Only replaces generic `LABEL_<n>` names from the model config.
    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.options_mut().labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twitter_preset_uses_default_model_and_cpu() {
        let builder = SentimentAnalysisPipelineBuilder::twitter_roberta();
        assert_eq!(builder.options().model_id, crate::DEFAULT_MODEL_ID);
        assert_eq!(builder.compute_device(), ComputeDevice::Cpu);
    }

    #[test]
    fn setters_update_options_and_device() {
        let builder = SentimentAnalysisPipelineBuilder::roberta("org/classifier")
            .revision("v1")
            .labels(["bad", "good"])
            .device(ComputeDevice::Cuda(1));

        let options = builder.options();
        assert_eq!(options.model_id, "org/classifier");
        assert_eq!(options.revision.as_deref(), Some("v1"));
        assert_eq!(
            options.labels.as_deref(),
            Some(&["bad".to_string(), "good".to_string()][..])
        );
        assert_eq!(builder.compute_device(), ComputeDevice::Cuda(1));

        let builder = builder.cpu();
        assert_eq!(builder.compute_device(), ComputeDevice::Cpu);
    }
}
