use anyhow::Context;
use augur::sources::replay::Snapshot;
use augur::{Config, Evaluation};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "augur=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: augur <snapshot.json>")?;

    // Load configuration
    let config = Config::from_env();
    config.validate()?;

    let snapshot = Snapshot::load(&path)
        .await
        .with_context(|| format!("loading {}", path))?;

    info!(
        "Replaying {} {} with {} prices and {} sentiment items",
        snapshot.asset,
        snapshot.window,
        snapshot.prices.len(),
        snapshot.sentiment.len()
    );

    let engine = snapshot.engine(config);
    let evaluation = engine
        .evaluate_at(
            &snapshot.asset,
            snapshot.window,
            snapshot.weights,
            snapshot.as_of(),
        )
        .await;

    println!("{}", serde_json::to_string_pretty(&evaluation)?);
    match &evaluation {
        Evaluation::Signal(signal) => info!("{}", signal.explain()),
        Evaluation::Unavailable => info!("No component produced a value"),
    }

    Ok(())
}
