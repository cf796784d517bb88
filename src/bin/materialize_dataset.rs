//! Downloads `mteb/tweet_sentiment_extraction` and writes test + train rows to `train.parquet`.

use sentiment_pipelines::datasets::DatasetMaterializerBuilder;
use sentiment_pipelines::error::Result;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentiment_pipelines=info".into()),
        )
        .init();

    let materializer = DatasetMaterializerBuilder::tweet_sentiment().build()?;

    let table = materializer.load()?;
    let (rows, columns) = table.shape();
    println!("shape of the data is: ({rows}, {columns})");

    materializer.write(&table)?;
    println!("Data saved to parquet");

    Ok(())
}
