use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feed_relay::{Config, RunOutcome, Runner};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feed_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Relaying {} (max {} per run, {:?} delivery)",
        config.feed_url, config.max_items_per_run, config.delivery
    );

    let runner = Runner::new(config)?;
    match runner.run().await? {
        RunOutcome::Delivered { count, watermark } => {
            info!("Delivered {} entries, watermark {}", count, watermark);
        }
        RunOutcome::NoUpdate { notified } => {
            info!("Nothing new (notice sent: {})", notified);
        }
        RunOutcome::NoContent { notified } => {
            info!("Feed was empty (notice sent: {})", notified);
        }
    }

    Ok(())
}
