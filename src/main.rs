use anyhow::Result;
use clap::Parser;
use s3ferry::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();
    tracing::info!("===== s3ferry starting =====");

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("End of program"),
        Err(e) => tracing::error!(error = %e, "Run aborted"),
    }
    result
}
