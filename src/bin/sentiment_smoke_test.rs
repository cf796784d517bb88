//! Classifies three fixed sentences with `cardiffnlp/twitter-roberta-base-sentiment`.

use sentiment_pipelines::error::Result;
use sentiment_pipelines::sentiment::SentimentAnalysisPipelineBuilder;
use sentiment_pipelines::{ComputeDevice, SMOKE_TEST_INPUTS};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentiment_pipelines=info".into()),
        )
        .init();

    let device = ComputeDevice::detect();
    println!("Accelerator available: {}", device.is_accelerator());

    let pipeline = SentimentAnalysisPipelineBuilder::twitter_roberta()
        .device(device)
        .build()?;

    let output = pipeline.run(&SMOKE_TEST_INPUTS)?;

    println!("\n=== Sentiment Analysis Results ===");
    for r in output.results {
        let p = r.prediction?;
        println!("{} → {} ({:.4})", r.text, p.label, p.score);
    }
    println!(
        "Completed in {:.2}ms",
        output.stats.total_time.as_secs_f64() * 1000.0
    );

    Ok(())
}
