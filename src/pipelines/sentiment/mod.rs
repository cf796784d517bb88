//! Sentiment analysis pipeline.
//!
//! Classify text as `positive`, `neutral` or `negative`.
//! Returns both the predicted label and a confidence score.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sentiment_pipelines::sentiment::SentimentAnalysisPipelineBuilder;
//! use sentiment_pipelines::ComputeDevice;
//!
//! # fn main() -> sentiment_pipelines::error::Result<()> {
//! let pipeline = SentimentAnalysisPipelineBuilder::twitter_roberta()
//!     .device(ComputeDevice::detect())
//!     .build()?;
//!
//! let output = pipeline.run(&["I absolutely love this product!"])?;
//! let p = output.into_predictions()?.remove(0);
//! println!("sentiment: {} (confidence: {:.2})", p.label, p.score);
//! # Ok(())
//! # }
//! ```
//!
//! # Batch Inference
//!
//! Analyze multiple texts at once (returns `BatchOutput`, aligned with the input order):
//!
//! ```rust,no_run
//! # use sentiment_pipelines::sentiment::SentimentAnalysisPipelineBuilder;
//! # fn main() -> sentiment_pipelines::error::Result<()> {
//! # let pipeline = SentimentAnalysisPipelineBuilder::twitter_roberta().build()?;
//! let tweets: &[&str] = &[
//!     "I love this movie!",
//!     "This was a terrible experience.",
//!     "It's okay, not great but not bad either.",
//! ];
//!
//! let output = pipeline.run(tweets)?;
//!
//! for r in output.results {
//!     let p = r.prediction?;
//!     println!("{}: {} ({:.2})", r.text, p.label, p.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Supported Models
//!
//! | Model | Builder Method |
//! |-------|----------------|
//! | `cardiffnlp/twitter-roberta-base-sentiment` | [`SentimentAnalysisPipelineBuilder::twitter_roberta`] |
//! | Any RoBERTa sequence classifier on the hub | [`SentimentAnalysisPipelineBuilder::roberta`] |

// ============ Internal API ============

pub(crate) mod builder;
pub(crate) mod model;
pub(crate) mod pipeline;

// ============ Public API ============

pub use crate::models::roberta::RobertaOptions;
pub use crate::pipelines::stats::PipelineStats;
pub use crate::pipelines::utils::ComputeDevice;
pub use builder::SentimentAnalysisPipelineBuilder;
pub use pipeline::{BatchOutput, Classification, Prediction, SentimentAnalysisPipeline};

/// Only for generic annotations. Use [`SentimentAnalysisPipelineBuilder::twitter_roberta`].
pub type SentimentRoberta = crate::models::roberta::SentimentRobertaModel;
