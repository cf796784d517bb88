//! Sentiment datasets and sentiment inference on top of Hugging Face artifacts.
//!
//! Two independent halves:
//!
//! - [`datasets`] pulls the splits of a hub dataset, stacks them into one Arrow table and writes
//!   it to a Snappy-compressed Parquet file.
//! - [`sentiment`] loads a pretrained RoBERTa classifier with [Candle](https://github.com/huggingface/candle)
//!   and labels text as `positive`, `neutral` or `negative`.

#![deny(missing_docs)]

// ============ Internal API ============

pub(crate) mod loaders;
pub(crate) mod models;
pub(crate) mod pipelines;

// ============ Public API ============

pub mod datasets;
pub mod error;

pub use pipelines::sentiment;
pub use pipelines::utils::ComputeDevice;

/// Hub id of the dataset materialized by default.
pub const DEFAULT_DATASET_ID: &str = "mteb/tweet_sentiment_extraction";

/// Splits stacked by default, in output order.
pub const DEFAULT_SPLITS: [&str; 2] = ["test", "train"];

/// Relative path of the Parquet file written by default.
pub const DEFAULT_OUTPUT_PATH: &str = "train.parquet";

/// Hub id of the sentiment classifier loaded by default.
pub const DEFAULT_MODEL_ID: &str = "cardiffnlp/twitter-roberta-base-sentiment";

/// Sentences classified by the smoke test.
pub const SMOKE_TEST_INPUTS: [&str; 3] = [
    "I love this movie!",
    "This was a terrible experience.",
    "It's okay, not great but not bad either.",
];
