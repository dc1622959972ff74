use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use uuid::Uuid;

use pricewatch::alerts::{AlertRepository, NewAlert, SqlxAlertRepository, create_alert};
use pricewatch::db::schema;
use pricewatch::error::AppError;
use pricewatch::market::TrackedAsset;

async fn setup_db() -> AnyPool {
    sqlx::any::install_default_drivers();

    let db_name = Uuid::new_v4().to_string();
    let conn = format!("sqlite:file:{}?mode=memory&cache=shared", db_name);

    let pool = AnyPoolOptions::new()
        .max_connections(5)
        .connect(&conn)
        .await
        .expect("connect sqlite memory db");

    schema::migrate(&pool).await.expect("migrate");
    pool
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn tracked() -> Vec<TrackedAsset> {
    vec![
        TrackedAsset::new("ethereum", "0x1", "0xeth"),
        TrackedAsset::new("polygon", "0x89", "0xpoly"),
    ]
}

fn new_alert(asset: &str, target: rust_decimal::Decimal) -> NewAlert {
    NewAlert {
        asset: asset.into(),
        target_price: target,
        subscriber: "alice@example.com".into(),
    }
}

#[tokio::test]
async fn insert_and_fetch_round_trip() {
    let repo = SqlxAlertRepository::new(setup_db().await);

    let created = repo
        .insert(new_alert("ethereum", dec!(3000.5)), t0())
        .await
        .unwrap();
    assert!(!created.triggered);
    assert_eq!(created.created_at, t0());

    let loaded = repo.fetch_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[tokio::test]
async fn untriggered_queries_filter_by_flag_and_asset() {
    let repo = SqlxAlertRepository::new(setup_db().await);
    let a = repo.insert(new_alert("ethereum", dec!(1)), t0()).await.unwrap();
    let b = repo
        .insert(new_alert("ethereum", dec!(2)), t0() + Duration::seconds(1))
        .await
        .unwrap();
    let c = repo.insert(new_alert("polygon", dec!(3)), t0()).await.unwrap();

    assert!(repo.try_mark_triggered(&a.id, t0()).await.unwrap());

    let eth = repo.untriggered_for_asset("ethereum").await.unwrap();
    assert_eq!(eth.len(), 1);
    assert_eq!(eth[0].id, b.id);

    let all: Vec<_> = repo
        .untriggered()
        .await
        .unwrap()
        .into_iter()
        .map(|x| x.id)
        .collect();
    assert_eq!(all.len(), 2);
    assert!(all.contains(&b.id));
    assert!(all.contains(&c.id));
}

#[tokio::test]
async fn conditional_flip_succeeds_once() {
    let repo = SqlxAlertRepository::new(setup_db().await);
    let a = repo.insert(new_alert("ethereum", dec!(1)), t0()).await.unwrap();

    let at = t0() + Duration::minutes(5);
    assert!(repo.try_mark_triggered(&a.id, at).await.unwrap());
    assert!(!repo.try_mark_triggered(&a.id, at + Duration::minutes(5)).await.unwrap());

    let loaded = repo.fetch_by_id(&a.id).await.unwrap().unwrap();
    assert!(loaded.triggered);
    assert_eq!(loaded.triggered_at, Some(at));
}

#[tokio::test]
async fn flip_of_unknown_alert_reports_no_change() {
    let repo = SqlxAlertRepository::new(setup_db().await);
    assert!(!repo.try_mark_triggered(&Uuid::new_v4(), t0()).await.unwrap());
}

#[tokio::test]
async fn poison_rows_are_skipped() {
    let pool = setup_db().await;
    let repo = SqlxAlertRepository::new(pool.clone());

    sqlx::query(
        "INSERT INTO alerts VALUES ('bad-uuid', 'ethereum', '10', 0, 'x@example.com', 0, NULL)",
    )
    .execute(&pool)
    .await
    .unwrap();
    let good = repo.insert(new_alert("ethereum", dec!(10)), t0()).await.unwrap();

    let out = repo.untriggered_for_asset("ethereum").await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, good.id);
}

#[tokio::test]
async fn intake_validates_and_stores_untriggered() {
    let repo = SqlxAlertRepository::new(setup_db().await);

    let alert = create_alert(
        &repo,
        &tracked(),
        " Ethereum ",
        dec!(3000),
        "bob@example.com",
        t0(),
    )
    .await
    .unwrap();

    assert_eq!(alert.asset, "ethereum");
    assert!(!alert.triggered);
    assert_eq!(alert.created_at, t0());
    assert!(repo.fetch_by_id(&alert.id).await.unwrap().is_some());
}

#[tokio::test]
async fn intake_rejects_bad_input() {
    let repo = SqlxAlertRepository::new(setup_db().await);
    let assets = tracked();

    let cases = [
        ("solana", dec!(1), "bob@example.com"),
        ("ethereum", dec!(0), "bob@example.com"),
        ("ethereum", dec!(-5), "bob@example.com"),
        ("ethereum", dec!(1), "not-an-address"),
    ];
    for (asset, target, subscriber) in cases {
        let err = create_alert(&repo, &assets, asset, target, subscriber, t0())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAlert(_)), "{asset} {target} {subscriber}");
    }

    assert!(repo.untriggered().await.unwrap().is_empty());
}
