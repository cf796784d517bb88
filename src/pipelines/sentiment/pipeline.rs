use tokenizers::Tokenizer;

use super::model::{SentimentAnalysisModel, SentimentResult};
use crate::error::{PipelineError, Result};
use crate::pipelines::stats::PipelineStats;

/// Label and softmax probability chosen for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Class name from the model's `id2label`, e.g. `positive`.
    pub label: String,
    /// Probability of `label`, in `[0, 1]`.
    pub score: f32,
}

impl From<SentimentResult> for Prediction {
    fn from(result: SentimentResult) -> Self {
        Self {
            label: result.label,
            score: result.score,
        }
    }
}

/// One input text and what became of it.
#[derive(Debug)]
pub struct Classification {
    /// The text as given.
    pub text: String,
    /// Its prediction, or the error that kept it from being classified.
    pub prediction: Result<Prediction>,
}

/// Outcome of [`SentimentAnalysisPipeline::run`], one entry per input in input order.
#[derive(Debug)]
pub struct BatchOutput {
    /// Per-input outcomes.
    pub results: Vec<Classification>,
    /// Wall time and item count for the call.
    pub stats: PipelineStats,
}

impl BatchOutput {
    /// Collects every prediction, failing on the first input that could not be classified.
    pub fn into_predictions(self) -> Result<Vec<Prediction>> {
        self.results.into_iter().map(|r| r.prediction).collect()
    }
}

/// A sentiment model paired with its tokenizer.
///
/// Construct with [`SentimentAnalysisPipelineBuilder`](super::SentimentAnalysisPipelineBuilder).
///
/// ```rust,no_run
/// # use sentiment_pipelines::sentiment::SentimentAnalysisPipelineBuilder;
/// # fn main() -> sentiment_pipelines::error::Result<()> {
/// let pipeline = SentimentAnalysisPipelineBuilder::twitter_roberta().build()?;
///
/// for r in pipeline.run(&["Great!", "Terrible."])?.results {
///     println!("{} → {}", r.text, r.prediction?.label);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SentimentAnalysisPipeline<M: SentimentAnalysisModel> {
    pub(crate) model: M,
    pub(crate) tokenizer: Tokenizer,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipeline<M> {
    /// Classifies `texts` together.
    ///
    /// A text that fails on its own (e.g. cannot be tokenized) only fails its own entry; a
    /// failure of the whole forward pass is returned as `Err`.
    pub fn run(&self, texts: &[&str]) -> Result<BatchOutput> {
        let timer = PipelineStats::start();
        let outcomes = self.model.predict_with_score_batch(&self.tokenizer, texts)?;

        if outcomes.len() != texts.len() {
            return Err(PipelineError::Unexpected(format!(
                "Model returned {} predictions for {} inputs",
                outcomes.len(),
                texts.len()
            )));
        }

        let results = texts
            .iter()
            .zip(outcomes)
            .map(|(text, outcome)| Classification {
                text: text.to_string(),
                prediction: outcome.map(Prediction::from),
            })
            .collect();

        let stats = timer.finish(texts.len());
        tracing::debug!(
            items = stats.items_processed,
            elapsed = ?stats.total_time,
            "sentiment batch classified"
        );
        Ok(BatchOutput { results, stats })
    }
}
