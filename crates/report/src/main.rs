use anyhow::{Context, bail};

use stockpulse_analytics::{DashboardService, Period};
use stockpulse_core::{Clock, SystemClock};
use stockpulse_infra::{AppConfig, CatalogSnapshot, InMemoryStore};

const USAGE: &str = "usage: stockpulse-report <snapshot.json> [weekly|monthly|yearly]";

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    stockpulse_observability::init_with(&config.log);

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!(USAGE);
    };
    let period = args
        .next()
        .map(|selector| Period::from_selector(&selector))
        .unwrap_or_default();

    let raw = std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
    let snapshot =
        CatalogSnapshot::from_json(&raw).with_context(|| format!("failed to parse {path}"))?;

    let clock = SystemClock;
    let store = InMemoryStore::from_snapshot(snapshot, clock.now());
    let session = store.acquire()?;
    let service = DashboardService::with_settings(&session, &session, clock, config.dashboard);

    let report = service.snapshot(period)?;
    tracing::info!(%period, sample = report.graph.sample, "dashboard report ready");

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
