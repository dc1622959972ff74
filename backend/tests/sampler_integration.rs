
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use tracing_test::traced_test;

use mock_store::{
    MockAlertRepository, MockPriceRepository, RecordingNotifier, Scripted, ScriptedQuoteSource,
};
use pricewatch::error::AppError;
use pricewatch::evaluator::{MoveRule, PercentageMoveEvaluator, TargetAlertEvaluator};
use pricewatch::market::TrackedAsset;
use pricewatch::metrics::counters::Counters;
use pricewatch::notify::Notification;
use pricewatch::scheduler::Sampler;

const OPERATOR: &str = "ops@example.com";

struct Harness {
    sampler: Sampler,
    prices: Arc<MockPriceRepository>,
    alerts: Arc<MockAlertRepository>,
    notifier: Arc<RecordingNotifier>,
    quotes: Arc<ScriptedQuoteSource>,
    counters: Counters,
}

fn assets() -> Vec<TrackedAsset> {
    vec![
        TrackedAsset::new("ethereum", "0x1", "0xeth"),
        TrackedAsset::new("polygon", "0x89", "0xpoly"),
    ]
}

fn harness(quotes: Arc<ScriptedQuoteSource>) -> Harness {
    let prices = MockPriceRepository::new();
    let alerts = MockAlertRepository::new();
    let notifier = RecordingNotifier::new();
    let counters = Counters::default();

    let moves = PercentageMoveEvaluator::new(
        prices.clone(),
        notifier.clone(),
        MoveRule {
            threshold_pct: dec!(3),
            lookback: chrono::Duration::hours(1),
            operator_contact: OPERATOR.into(),
        },
        counters.clone(),
    );
    let targets = Arc::new(TargetAlertEvaluator::new(
        alerts.clone(),
        prices.clone(),
        notifier.clone(),
        counters.clone(),
    ));

    let sampler = Sampler::new(
        assets(),
        quotes.clone(),
        prices.clone(),
        moves,
        targets,
        Duration::from_secs(10),
        counters.clone(),
    );

    Harness {
        sampler,
        prices,
        alerts,
        notifier,
        quotes,
        counters,
    }
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 5, 0).unwrap()
}

#[tokio::test]
async fn successful_tick_writes_and_evaluates_every_asset() {
    let h = harness(ScriptedQuoteSource::new(&[
        ("ethereum", Scripted::Price(dec!(105))),
        ("polygon", Scripted::Price(dec!(0.51))),
    ]));
    h.prices
        .seed("ethereum", dec!(100), now() - chrono::Duration::hours(2));
    let alert = h.alerts.seed("polygon", dec!(0.5), "p@example.com");

    let report = h.sampler.on_tick(now()).await;

    assert_eq!(report.written.len(), 2);
    assert!(report.failed.is_empty());
    assert_eq!(h.prices.count("ethereum"), 2);
    assert_eq!(h.prices.count("polygon"), 1);

    let eth = report.written.iter().find(|p| p.asset == "ethereum").unwrap();
    assert_eq!(eth.price, dec!(105));
    assert_eq!(eth.percent_change, Some(dec!(1.25)));
    assert_eq!(eth.recorded_at, now());

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().any(|(n, to)| matches!(n, Notification::PercentageMove(_)) && to == OPERATOR));
    assert!(sent.iter().any(|(n, to)| matches!(n, Notification::TargetReached(_)) && to == "p@example.com"));
    assert!(h.alerts.get(&alert).triggered);

    assert_eq!(Counters::get(&h.counters.ticks), 1);
    assert_eq!(Counters::get(&h.counters.points_written), 2);
}

#[tokio::test]
async fn fetch_failure_for_one_asset_does_not_block_the_other() {
    let h = harness(ScriptedQuoteSource::new(&[
        ("ethereum", Scripted::Fail),
        ("polygon", Scripted::Price(dec!(1.10))),
    ]));
    let eth_alert = h.alerts.seed("ethereum", dec!(1), "e@example.com");
    let poly_alert = h.alerts.seed("polygon", dec!(1), "p@example.com");

    let report = h.sampler.on_tick(now()).await;

    assert_eq!(report.written.len(), 1);
    assert_eq!(report.written[0].asset, "polygon");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "ethereum");
    assert!(matches!(report.failed[0].1, AppError::TransientFetch { .. }));

    // Nothing happened for the failed asset.
    assert_eq!(h.prices.count("ethereum"), 0);
    assert!(!h.alerts.get(&eth_alert).triggered);

    assert!(h.alerts.get(&poly_alert).triggered);
    assert_eq!(h.notifier.sent().len(), 1);
    assert_eq!(Counters::get(&h.counters.fetch_failures), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_quote_is_cut_off_by_timeout() {
    let h = harness(ScriptedQuoteSource::new(&[
        ("ethereum", Scripted::Hang),
        ("polygon", Scripted::Price(dec!(0.7))),
    ]));

    let report = h.sampler.on_tick(now()).await;

    assert_eq!(report.written.len(), 1);
    assert_eq!(report.written[0].asset, "polygon");
    assert!(matches!(
        &report.failed[0].1,
        AppError::FetchTimeout { asset, timeout_ms: 10_000 } if asset == "ethereum"
    ));
    assert_eq!(Counters::get(&h.counters.fetch_timeouts), 1);
}

#[tokio::test]
async fn store_outage_aborts_the_tick_and_the_next_tick_recovers() {
    let h = harness(ScriptedQuoteSource::new(&[
        ("ethereum", Scripted::Price(dec!(3005))),
        ("polygon", Scripted::Price(dec!(0.7))),
    ]));
    let alert = h.alerts.seed("ethereum", dec!(3000), "e@example.com");

    h.prices.fail.store(true, Ordering::SeqCst);
    let report = h.sampler.on_tick(now()).await;

    assert!(report.written.is_empty());
    assert_eq!(report.failed.len(), 2);
    assert!(report
        .failed
        .iter()
        .all(|(_, e)| matches!(e, AppError::Store(_))));
    assert!(!h.alerts.get(&alert).triggered);
    assert!(h.notifier.sent().is_empty());

    h.prices.fail.store(false, Ordering::SeqCst);
    let report = h
        .sampler
        .on_tick(now() + chrono::Duration::minutes(5))
        .await;

    assert_eq!(report.written.len(), 2);
    assert!(h.alerts.get(&alert).triggered);
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn each_tick_fetches_each_asset_once() {
    let h = harness(ScriptedQuoteSource::new(&[
        ("ethereum", Scripted::Price(dec!(1))),
        ("polygon", Scripted::Fail),
    ]));

    h.sampler.on_tick(now()).await;
    h.quotes.set("polygon", Scripted::Price(dec!(2)));
    h.sampler.on_tick(now() + chrono::Duration::minutes(5)).await;

    assert_eq!(h.quotes.calls.load(Ordering::SeqCst), 4);
    assert_eq!(h.prices.count("ethereum"), 2);
    assert_eq!(h.prices.count("polygon"), 1);
}

#[traced_test]
#[tokio::test]
async fn fetch_failure_is_logged() {
    let h = harness(ScriptedQuoteSource::new(&[
        ("ethereum", Scripted::Fail),
        ("polygon", Scripted::Price(dec!(1))),
    ]));

    h.sampler.on_tick(now()).await;

    assert!(logs_contain("quote fetch failed"));
    assert!(logs_contain("price point stored"));
}

#[tokio::test]
async fn repeated_ticks_on_sqlite_store_write_every_asset() {
    use pricewatch::db::schema;
    use pricewatch::prices::{PriceRepository, SqlxPriceRepository};
    use sqlx::any::AnyPoolOptions;

    sqlx::any::install_default_drivers();
    let conn = format!(
        "sqlite:file:{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4()
    );
    let pool = AnyPoolOptions::new()
        .max_connections(5)
        .connect(&conn)
        .await
        .expect("connect sqlite memory db");
    schema::migrate(&pool).await.expect("migrate");

    let prices: Arc<dyn PriceRepository> = Arc::new(SqlxPriceRepository::new(pool));
    let alerts = MockAlertRepository::new();
    let notifier = RecordingNotifier::new();
    let counters = Counters::default();
    let quotes = ScriptedQuoteSource::new(&[
        ("ethereum", Scripted::Price(dec!(3000))),
        ("polygon", Scripted::Price(dec!(0.7))),
    ]);

    let sampler = Sampler::new(
        assets(),
        quotes,
        prices.clone(),
        PercentageMoveEvaluator::new(
            prices.clone(),
            notifier.clone(),
            MoveRule {
                threshold_pct: dec!(3),
                lookback: chrono::Duration::hours(1),
                operator_contact: OPERATOR.into(),
            },
            counters.clone(),
        ),
        Arc::new(TargetAlertEvaluator::new(
            alerts,
            prices.clone(),
            notifier,
            counters.clone(),
        )),
        Duration::from_secs(10),
        counters,
    );

    for i in 0..20 {
        let report = sampler
            .on_tick(now() + chrono::Duration::minutes(5 * i))
            .await;
        assert!(report.failed.is_empty(), "tick {i}: {:?}", report.failed);
        assert_eq!(report.written.len(), 2);
    }

    let eth = prices
        .range_desc("ethereum", now() - chrono::Duration::hours(1), now() + chrono::Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(eth.len(), 20);
}
