use std::sync::Arc;

use common::logger::init_tracing;
use pricewatch::{
    alerts::{AlertRepository, SqlxAlertRepository},
    config::AppConfig,
    db::Db,
    evaluator::{MoveRule, PercentageMoveEvaluator, TargetAlertEvaluator},
    market::moralis::MoralisClient,
    metrics::counters::Counters,
    notify::{LogNotifier, Notifier, WebhookNotifier},
    prices::{PriceRepository, SqlxPriceRepository},
    scheduler::{Sampler, run_sampling_loop, run_sweep_loop},
};

/// Connects, runs migrations and builds both repositories on one pool.
async fn init_stores(
    cfg: &AppConfig,
) -> anyhow::Result<(Arc<dyn PriceRepository>, Arc<dyn AlertRepository>)> {
    let db = Db::connect(&cfg.database_url).await?;
    db.migrate().await?;

    let prices: Arc<dyn PriceRepository> = Arc::new(SqlxPriceRepository::new(db.pool.clone()));
    let alerts: Arc<dyn AlertRepository> = Arc::new(SqlxAlertRepository::new(db.pool));

    Ok((prices, alerts))
}

fn build_notifier(cfg: &AppConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    match &cfg.notify_webhook_url {
        Some(url) => {
            tracing::info!(url = %url, "delivering notifications through relay");
            Ok(Arc::new(WebhookNotifier::new(
                url.clone(),
                cfg.notify_from.clone(),
            )?))
        }
        None => {
            tracing::warn!("NOTIFY_WEBHOOK_URL not set; notifications will only be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing("pricewatch", is_production);

    tracing::info!("Starting pricewatch...");

    let cfg = AppConfig::from_env()?;

    let (prices, alerts) = init_stores(&cfg).await?;
    let notifier = build_notifier(&cfg)?;
    let counters = Counters::default();

    // The provider client is created once here and shared by every tick.
    let quotes = Arc::new(MoralisClient::new(
        cfg.moralis_base_url.clone(),
        cfg.moralis_api_key.clone(),
        cfg.quote_timeout,
    )?);

    let moves = PercentageMoveEvaluator::new(
        prices.clone(),
        notifier.clone(),
        MoveRule {
            threshold_pct: cfg.move_threshold_pct,
            lookback: cfg.move_lookback,
            operator_contact: cfg.operator_contact.clone(),
        },
        counters.clone(),
    );

    let targets = Arc::new(TargetAlertEvaluator::new(
        alerts,
        prices.clone(),
        notifier,
        counters.clone(),
    ));

    let sampler = Arc::new(Sampler::new(
        cfg.assets.clone(),
        quotes,
        prices,
        moves,
        targets.clone(),
        cfg.quote_timeout,
        counters.clone(),
    ));

    tracing::info!(
        assets = ?cfg.assets.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
        sample_every_secs = cfg.sample_interval.as_secs(),
        sweep_every_secs = cfg.sweep_interval.as_secs(),
        "engine configured"
    );

    tokio::spawn(run_sampling_loop(sampler, cfg.sample_interval));
    tokio::spawn(run_sweep_loop(targets, cfg.sweep_interval, counters));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    Ok(())
}
