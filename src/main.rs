use anyhow::{anyhow, Result};
use std::time::Duration;
use tracing::info;

mod config;
mod error;
mod filter;
mod flatten;
mod foundry;
mod poller;
mod slack;
mod types;

use config::load_config;
use foundry::FoundryClient;
use poller::Poller;
use slack::SlackClient;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_config()?;
    info!(
        "object type = {}, lookback = {}h, interval = {}h",
        cfg.object_type, cfg.lookback_hours, cfg.poll_interval_hours
    );

    let http = reqwest::Client::new();
    let foundry = FoundryClient::new(
        http.clone(),
        cfg.foundry_url.clone(),
        cfg.foundry_token.clone(),
    );

    // Check the object type is defined early (fail fast if requested)
    if cfg.fail_if_type_missing {
        ensure_object_type(&foundry, &cfg.ontology_rid, &cfg.object_type).await?;
    }

    let slack = SlackClient::new(
        http,
        cfg.slack_base_url.clone(),
        cfg.slack_token.clone(),
        cfg.slack_channel_id.clone(),
        Duration::from_millis(cfg.post_delay_ms),
    );

    let mut poller = Poller::new(cfg, foundry, slack);
    poller.run().await;

    Ok(())
}

async fn ensure_object_type(
    foundry: &FoundryClient,
    ontology_rid: &str,
    object_type: &str,
) -> Result<()> {
    let types = foundry.list_object_types(ontology_rid).await?;
    let known = types
        .iter()
        .any(|t| t.get("apiName").and_then(|v| v.as_str()) == Some(object_type));
    if !known {
        return Err(anyhow!(
            "object type '{}' not found in ontology {}",
            object_type,
            ontology_rid
        ));
    }
    info!("object type '{}' present in ontology", object_type);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}
