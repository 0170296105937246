//! DragonScales worker entrypoint: resolves settings, primes the Dragon and reports readiness.

use anyhow::Context;
use dragonscales::{
    bootstrap::{build_dragon, load_settings_from_env},
    config::SettingsOverrides,
    telemetry::init_tracing,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = load_settings_from_env(SettingsOverrides::default())
        .await
        .context("resolving settings")?;
    let dragon = build_dragon(&settings)
        .await
        .context("building the Dragon")?;

    info!(
        cache = dragon.cache().is_some(),
        ttl_secs = dragon.ttl().as_secs(),
        "dragonscales ready"
    );
    println!("dragonscales");

    Ok(())
}
