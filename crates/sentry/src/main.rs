//! Sentry binary.
//!
//! Runs a guard agent whose decisions come from a behavior tree: it sweeps
//! its surroundings, fights whatever shows up and otherwise walks a patrol
//! route, picking the route up where it left off.
//!
//! ```bash
//! SENTRY_TICKS=60 BT_TREE_DEBUG=1 RUST_LOG=behavior_tree=debug cargo run -p sentry
//! ```

mod config;
mod leaves;

use anyhow::{Context, Result};
use behavior_tree::{Driver, NodeConfig, NodeFactory, State, Status, Tree};

use config::SentryConfig;

const GUARD_TREE: &str = include_str!("../trees/guard.json");

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SentryConfig::from_env();
    tracing::info!(uid = %config.uid, ticks = config.ticks, "Starting sentry");

    let mut driver = Driver::new(build_tree(&config)?, State::with_uid(config.uid.as_str()));

    tokio::select! {
        result = run(&mut driver, &config) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }

    tracing::info!(state = %driver.state().to_json(), "Sentry stopped");
    Ok(())
}

fn build_tree(config: &SentryConfig) -> Result<Tree> {
    let raw = match &config.tree_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read tree from {}", path.display()))?,
        None => GUARD_TREE.to_owned(),
    };
    let node: NodeConfig = serde_json::from_str(&raw).context("invalid tree description")?;

    let mut factory = NodeFactory::new();
    leaves::register(&mut factory);

    Tree::from_config(&node, &factory, config.tree.clone()).context("failed to prepare tree")
}

async fn run(driver: &mut Driver, config: &SentryConfig) -> Result<()> {
    let mut interval = tokio::time::interval(config.tick_interval);
    let mut tick = 0u64;

    while config.ticks == 0 || tick < config.ticks {
        interval.tick().await;
        tick += 1;

        let status = driver
            .tick_async()
            .await
            .with_context(|| format!("tick {tick} failed"))?;

        let state = driver.state();
        tracing::info!(
            tick,
            %status,
            position = ?state.get("position"),
            enemies = ?state.get("enemies_num"),
            "tick complete"
        );

        if status == Status::Failure {
            tracing::warn!(tick, "guard tree failed");
        }
    }

    Ok(())
}
