//! Beacon replay — drives the interaction tracker against a saved HTML page.
//!
//! Loads settings, parses the page, fires a scripted list of interactions at
//! it and waits for every tracking delivery before exiting.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use beacon_core::{AnalyticsConfigProvider, AnalyticsConfigProviderProps, BeaconSettings};
use beacon_web_sdk::{
    Dispatcher, Document, InteractionTracker, PageTrackingProps, PageViewTracker, TrackerConfig,
};
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "beacon-replay")]
#[command(about = "Replay scripted interactions against an HTML page and deliver tracking events")]
#[command(version)]
struct Cli {
    /// HTML page to load
    #[arg(long)]
    page: PathBuf,

    /// JSON array of `{ "event": ..., "selector": ... }` interactions
    #[arg(long)]
    interactions: PathBuf,

    /// Location reported as the page URL
    #[arg(long, default_value = "http://localhost/")]
    location: String,

    /// Settings file (toml, yaml or json)
    #[arg(long, env = "BEACON_CONFIG")]
    config: Option<PathBuf>,

    /// Collector URL (overrides config)
    #[arg(long, env = "BEACON__URL")]
    url: Option<String>,

    /// Also send a page view under this name
    #[arg(long)]
    page_view: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Interaction {
    event: String,
    selector: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beacon=info,beacon_web_sdk=info,beacon_replay=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let mut settings = BeaconSettings::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load settings, using defaults");
        BeaconSettings::default()
    });
    if let Some(url) = cli.url {
        settings.url = Some(url);
    }

    let html = std::fs::read_to_string(&cli.page)
        .with_context(|| format!("reading page {}", cli.page.display()))?;
    let script = std::fs::read_to_string(&cli.interactions)
        .with_context(|| format!("reading interactions {}", cli.interactions.display()))?;
    let interactions: Vec<Interaction> =
        serde_json::from_str(&script).context("parsing interactions")?;

    let document = Rc::new(Document::parse(&html, cli.location));
    let dispatcher = Dispatcher::new();
    let mut tracker = InteractionTracker::with_dispatcher(
        TrackerConfig::from_settings(&settings)?,
        Rc::clone(&document),
        dispatcher.clone(),
    );

    info!(
        url = settings.url.as_deref().unwrap_or("<none>"),
        title = %document.title(),
        interactions = interactions.len(),
        "Replay starting"
    );

    if let Some(name) = cli.page_view {
        let provider = AnalyticsConfigProvider::new(AnalyticsConfigProviderProps {
            url: settings.url.clone(),
            headers: (!settings.headers.is_empty()).then(|| settings.headers.clone()),
            ..Default::default()
        });
        PageViewTracker::new(dispatcher.clone())
            .track_page_view(&provider, &PageTrackingProps::named(name), None)
            .await?;
    }

    tracker.start_event_tracking();
    let mut unmatched = 0usize;
    for interaction in &interactions {
        if !document.fire(&interaction.event, &interaction.selector)? {
            unmatched += 1;
            warn!(
                event = %interaction.event,
                selector = %interaction.selector,
                "No element matches selector"
            );
        }
    }

    tracker.settle().await;
    tracker.stop_event_tracking();

    info!(
        fired = interactions.len() - unmatched,
        unmatched, "Replay finished"
    );
    Ok(())
}
