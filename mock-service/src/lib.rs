use axum::{debug_handler, extract::Path, http::StatusCode, routing::get, Router};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use lazy_static::lazy_static;
use metrics::counter;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::{
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
    time::Duration,
};
use tracing::debug;

pub fn router() -> Router {
    Router::new()
        .route("/delay/ms/:delay_ms", get(delay))
        .route("/status/:code", get(status))
        .route("/flaky/:every/name/:name", get(flaky))
        .route("/max/:max_tps/delay/ms/:delay_ms/scenario/:name", get(max))
}

pub async fn run(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router()).await?;
    Ok(())
}

/// Responds `200` after `delay_ms`.
#[debug_handler]
pub async fn delay(Path(delay_ms): Path<u64>) {
    count();
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

/// Responds with the given status code.
#[debug_handler]
pub async fn status(Path(code): Path<u16>) -> StatusCode {
    count();
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

lazy_static! {
    static ref FLAKY_MAP: RwLock<HashMap<String, Arc<AtomicU64>>> = RwLock::new(HashMap::new());
    static ref MAX_MAP: RwLock<HashMap<String, Arc<DefaultDirectRateLimiter>>> =
        RwLock::new(HashMap::new());
}

/// Every `every`-th request for `name` fails with a `500`.
#[debug_handler]
pub async fn flaky(Path((every, name)): Path<(u64, String)>) -> Result<(), StatusCode> {
    count();
    let calls = entry(&FLAKY_MAP, name, || Arc::new(AtomicU64::new(0)))?;
    let call = calls.fetch_add(1, Ordering::Relaxed) + 1;
    if every > 0 && call % every == 0 {
        debug!("Flaky request {call} failed");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(())
}

/// Responds `500` once `name` exceeds `max_tps`.
#[debug_handler]
pub async fn max(
    Path((max_tps, delay_ms, name)): Path<(u32, u64, String)>,
) -> Result<(), StatusCode> {
    count();
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

    let limiter = entry(&MAX_MAP, name, || Arc::new(rate_limiter(max_tps)))?;
    limiter
        .check()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

fn entry<T: Clone>(
    map: &RwLock<HashMap<String, T>>,
    name: String,
    init: impl FnOnce() -> T,
) -> Result<T, StatusCode> {
    let read = map
        .read()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .get(&name)
        .cloned();
    match read {
        Some(value) => Ok(value),
        None => Ok(map
            .write()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .entry(name)
            .or_insert_with(init)
            .clone()),
    }
}

/** Utils **/

pub fn rate_limiter(tps: u32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(NonZeroU32::new(tps).unwrap_or(NonZeroU32::MIN)))
}

/** TPS Printer **/

static TPS_MEASURE: AtomicU64 = AtomicU64::new(0);

fn count() {
    counter!("mock-service.requests").increment(1);
    TPS_MEASURE.fetch_add(1, Ordering::Relaxed);
}

pub async fn tps_measure_task() {
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let transactions = TPS_MEASURE.swap(0, Ordering::Relaxed);
        println!("{transactions} TPS");
    }
}
