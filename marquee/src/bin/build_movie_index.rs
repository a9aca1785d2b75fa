//! Creates the movie index and loads it with the embedded movie dataset.
//!
//! Configured through the environment or a `.env` file. Set `GENERATE_NEW_DATA` to generate a
//! fresh dataset instead of loading the persisted one.
use std::process::ExitCode;

use marquee::config::Config;
use marquee::indexing::dataset::DEFAULT_DATASET_PATH;
use marquee::setup;

const GENERATE_NEW_DATA: bool = false;

#[tokio::main]
async fn main() -> ExitCode {
    setup::init_tracing();

    match run().await {
        Ok(()) => {
            println!("Index created and loaded successfully!");
            ExitCode::SUCCESS
        }
        Err(error) => {
            println!("Index process failed! Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    setup::movie_index_pipeline(&config, GENERATE_NEW_DATA, DEFAULT_DATASET_PATH)?
        .run()
        .await?;

    Ok(())
}
