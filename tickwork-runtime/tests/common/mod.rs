#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tickwork_runtime::{ActionResult, Clock};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

pub fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

/// Action that bumps `counter` on every run
pub fn counting(counter: &Arc<AtomicUsize>) -> impl FnMut() -> BoxFuture<'static, ActionResult> + Send + 'static {
    let counter = counter.clone();
    move || {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

/// Action that records the clock's time on every run
pub fn recording(
    clock: Arc<dyn Clock>,
    seen: &Arc<Mutex<Vec<NaiveDateTime>>>,
) -> impl FnMut() -> BoxFuture<'static, ActionResult> + Send + 'static {
    let seen = seen.clone();
    move || {
        let seen = seen.clone();
        let now = clock.now();
        Box::pin(async move {
            seen.lock().unwrap().push(now);
            Ok(())
        })
    }
}

/// Poll `condition` until it holds or `within` elapses
pub async fn eventually(within: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(ms(5)).await;
    }
    condition()
}
