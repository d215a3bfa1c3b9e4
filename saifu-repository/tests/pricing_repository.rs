//! Integration coverage for the pricing queries against a real Postgres
//! schema. Requires `DATABASE_URL` to point at a throwaway database —
//! `sqlx::test` provisions and migrates a fresh one per test from
//! `saifu-repository/migrations/`, same as the rest of the `sqlx`
//! ecosystem does; there is no mocked-DB shortcut here (`spec.md` §8
//! "Pricing math"/"Missing price" scenarios).

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use saifu_repository::pool::Pool;
use saifu_repository::{JobsRepository, PricingRepository, TicksRepository};
use saifu_model::{PricingJob, Quote};
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_portfolio(pool: &PgPool, portfolio_id: Uuid) {
    sqlx::query("INSERT INTO saifu_portfolios (id, name) VALUES ($1, 'test')")
        .bind(portfolio_id)
        .execute(pool)
        .await
        .unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn pricing_math_sums_over_priced_positions(pool: PgPool) {
    let portfolio_id = Uuid::new_v4();
    seed_portfolio(&pool, portfolio_id).await;

    sqlx::query(
        "INSERT INTO saifu_portfolio_positions (portfolio_id, ticker_base, size) VALUES ($1, 'BTC', 2), ($1, 'ETH', 3)",
    )
    .bind(portfolio_id)
    .execute(&pool)
    .await
    .unwrap();

    let snapshot_time = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    let ticks = TicksRepository::new(Pool::from_pg_pool(pool.clone()));
    ticks
        .ingest_batch(&[
            Quote::new("BTCUSD", dec!(10), snapshot_time),
            Quote::new("ETHUSD", dec!(5), snapshot_time),
        ])
        .await
        .unwrap();

    let pricing = PricingRepository::new(Pool::from_pg_pool(pool));
    let rows = pricing
        .get_portfolio_positions_prices(portfolio_id, snapshot_time, "USD")
        .await
        .unwrap();

    let balance: rust_decimal::Decimal = rows.iter().map(|row| row.total).sum();
    assert_eq!(balance, dec!(35));
}

#[sqlx::test(migrations = "./migrations")]
async fn missing_price_excludes_the_position(pool: PgPool) {
    let portfolio_id = Uuid::new_v4();
    seed_portfolio(&pool, portfolio_id).await;

    sqlx::query(
        "INSERT INTO saifu_portfolio_positions (portfolio_id, ticker_base, size) VALUES ($1, 'BTC', 2), ($1, 'ETH', 3)",
    )
    .bind(portfolio_id)
    .execute(&pool)
    .await
    .unwrap();

    let snapshot_time = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    let ticks = TicksRepository::new(Pool::from_pg_pool(pool.clone()));
    ticks
        .ingest_batch(&[Quote::new("BTCUSD", dec!(10), snapshot_time)])
        .await
        .unwrap();

    let pricing = PricingRepository::new(Pool::from_pg_pool(pool));
    let rows = pricing
        .get_portfolio_positions_prices(portfolio_id, snapshot_time, "USD")
        .await
        .unwrap();

    let balance: rust_decimal::Decimal = rows.iter().map(|row| row.total).sum();
    assert_eq!(balance, dec!(20));
}

#[sqlx::test(migrations = "./migrations")]
async fn scheduler_sees_zero_due_portfolios_with_no_settings(pool: PgPool) {
    let pricing = PricingRepository::new(Pool::from_pg_pool(pool));
    let due = pricing.find_portfolios_to_price().await.unwrap();
    assert!(due.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn persisting_a_fresh_job_assigns_one_identifier(pool: PgPool) {
    let portfolio_id = Uuid::new_v4();
    seed_portfolio(&pool, portfolio_id).await;

    let jobs = JobsRepository::new(Pool::from_pg_pool(pool));
    let now = Utc::now();
    let job = PricingJob::new_system_job(portfolio_id, "USD", now, now);

    let persisted = jobs.persist(job).await.unwrap();
    assert!(persisted.identifier.is_some());
}

#[sqlx::test(migrations = "./migrations")]
#[should_panic(expected = "already has an identifier")]
async fn repersisting_an_identified_job_is_a_programmer_error(pool: PgPool) {
    let now = Utc::now();
    let mut job = PricingJob::new_system_job(Uuid::new_v4(), "USD", now, now);
    job.identifier = Some(Uuid::new_v4());

    let jobs = JobsRepository::new(Pool::from_pg_pool(pool));
    let _ = jobs.persist(job).await;
}
