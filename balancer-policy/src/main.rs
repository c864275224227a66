use anyhow::Context;
use balancer_policy::config::Config;
use balancer_policy::{FileTopologySource, TopologySource};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn setup_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    };
    tracing_subscriber::registry().with(log_layer).init();
}

fn main() -> anyhow::Result<()> {
    let config = Config::init_with_defaults().context("failed to load configuration from env")?;
    setup_tracing(config.log_json);

    let policy = config.policy().context("invalid balancer configuration")?;
    let source = FileTopologySource::new(&config.snapshot_path);
    let snapshot = source
        .snapshot()
        .with_context(|| format!("failed to load snapshot from {}", config.snapshot_path))?;

    info!(
        namespace = snapshot.namespace(),
        shards = snapshot.shard_ids().count(),
        chunks = snapshot.total_chunks(),
        threshold = %policy.threshold(),
        "evaluating topology"
    );

    let decision = policy.decide(&snapshot, config.balanced_last_round);
    if decision.is_none() {
        info!(namespace = snapshot.namespace(), "no migration needed");
    }

    // Output goes to stdout so it can be piped to whatever performs the move
    println!("{}", serde_json::to_string_pretty(&decision)?);

    Ok(())
}
