//! Samples the movie index and exports a question/answer evaluation set as json lines.
use std::process::ExitCode;

use marquee::config::{Config, EvaluationConfig};
use marquee::evaluation::export::DEFAULT_EXPORT_PATH;
use marquee::setup;
use tracing::Instrument as _;

#[tokio::main]
async fn main() -> ExitCode {
    setup::init_tracing();

    match run().await {
        Ok(()) => {
            println!("QA evaluation dataset generated successfully.");
            ExitCode::SUCCESS
        }
        Err(error) => {
            println!("QA evaluation dataset generation failed! Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let evaluation = EvaluationConfig::from_env()?;

    let span = tracing::info_span!(
        "qa_eval",
        subscription_id = %evaluation.subscription_id,
        resource_group = %evaluation.resource_group,
        project_name = %evaluation.project_name,
        model = %evaluation.model_name
    );

    setup::qa_evaluation_pipeline(&config, &evaluation, DEFAULT_EXPORT_PATH)?
        .run()
        .instrument(span)
        .await?;

    Ok(())
}
