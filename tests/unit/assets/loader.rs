use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicU32;

use super::*;
use crate::assets::fetch::FetchResponse;
use crate::foundation::error::{SeqError, SeqResult};

/// Serves fixed bodies; each url can be told to fail its first `n` attempts.
#[derive(Default)]
struct FlakyFetcher {
    bodies: HashMap<String, Vec<u8>>,
    failures_left: Mutex<HashMap<String, u32>>,
    transport_errors: bool,
    attempts: AtomicU32,
}

impl FlakyFetcher {
    fn with(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies.insert(url.to_owned(), body.to_vec());
        self
    }

    fn failing(self, url: &str, n: u32) -> Self {
        self.failures_left
            .lock()
            .unwrap()
            .insert(url.to_owned(), n);
        self
    }
}

impl Fetcher for FlakyFetcher {
    async fn fetch(&self, url: &str) -> SeqResult<FetchResponse> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        {
            let mut left = self.failures_left.lock().unwrap();
            if let Some(n) = left.get_mut(url)
                && *n > 0
            {
                *n -= 1;
                if self.transport_errors {
                    return Err(SeqError::fetch("connection reset"));
                }
                return Ok(FetchResponse::status(503));
            }
        }
        Ok(match self.bodies.get(url) {
            Some(b) => FetchResponse::ok(b.clone()),
            None => FetchResponse::status(404),
        })
    }
}

fn srcs(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_owned()).collect()
}

#[tokio::test]
async fn loads_every_source_concurrently() {
    let fetcher = FlakyFetcher::default()
        .with("a", b"A")
        .with("b", b"BB")
        .with("c", b"CCC");
    let mut loader = ResourceLoader::new(fetcher, 3);
    let summary = loader.load(srcs(&["a", "b", "c"])).await;

    assert_eq!(summary.requested, 3);
    assert_eq!(summary.loaded, 3);
    assert!(summary.failed.is_empty());
    assert_eq!(loader.get("b").map(|b| b.len()), Some(2));
    assert_eq!(loader.sources(), &srcs(&["a", "b", "c"])[..]);
}

#[tokio::test]
async fn retries_until_success_within_budget() {
    let fetcher = FlakyFetcher::default().with("a", b"A").failing("a", 3);
    let mut loader = ResourceLoader::new(fetcher, 3);
    let summary = loader.load(srcs(&["a"])).await;

    assert_eq!(summary.loaded, 1);
    assert_eq!(loader.fetcher.attempts.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn exhausted_source_is_absent_not_fatal() {
    let fetcher = FlakyFetcher::default()
        .with("a", b"A")
        .with("b", b"B")
        .failing("b", 100);
    let mut loader = ResourceLoader::new(fetcher, 2);
    let summary = loader.load(srcs(&["a", "b", "missing"])).await;

    assert_eq!(summary.loaded, 1);
    assert_eq!(summary.failed, srcs(&["b", "missing"]));
    assert!(loader.get("b").is_none());
    assert!(loader.get("a").is_some());
    // a: 1, b: 1 + 2 retries, missing: 1 + 2 retries
    assert_eq!(loader.fetcher.attempts.load(Ordering::SeqCst), 7);
}

#[tokio::test]
async fn transport_errors_consume_the_retry_budget() {
    let mut fetcher = FlakyFetcher::default().with("a", b"A").failing("a", 1);
    fetcher.transport_errors = true;
    let mut loader = ResourceLoader::new(fetcher, 0);
    let summary = loader.load(srcs(&["a"])).await;
    assert_eq!(summary.loaded, 0);
    assert_eq!(summary.failed, srcs(&["a"]));
}

#[tokio::test]
async fn dispose_releases_everything() {
    let fetcher = FlakyFetcher::default().with("a", b"A");
    let mut loader = ResourceLoader::new(fetcher, 0);
    loader.load(srcs(&["a"])).await;
    assert!(loader.get("a").is_some());

    loader.dispose();
    assert!(loader.get("a").is_none());
    assert!(loader.sources().is_empty());
    assert!(loader.cache().is_none());

    // The loader is reusable after disposal.
    let summary = loader.load(srcs(&["a"])).await;
    assert_eq!(summary.loaded, 1);
    assert!(loader.get("a").is_some());
}

#[tokio::test]
async fn reload_replaces_previous_entries() {
    let fetcher = FlakyFetcher::default().with("a", b"A").with("b", b"B");
    let mut loader = ResourceLoader::new(fetcher, 0);
    loader.load(srcs(&["a"])).await;
    loader.load(srcs(&["b"])).await;
    assert!(loader.get("a").is_none());
    assert!(loader.get("b").is_some());
}

struct GatedFetcher {
    gate: Arc<tokio::sync::Semaphore>,
}

impl Fetcher for GatedFetcher {
    async fn fetch(&self, _url: &str) -> SeqResult<FetchResponse> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| SeqError::fetch(e.to_string()))?;
        Ok(FetchResponse::ok(b"late".to_vec()))
    }
}

#[tokio::test]
async fn results_arriving_after_dispose_are_discarded() {
    let gate = Arc::new(tokio::sync::Semaphore::new(0));
    let mut loader = ResourceLoader::new(
        GatedFetcher {
            gate: Arc::clone(&gate),
        },
        0,
    );
    let token = loader.lifecycle();

    let (summary, ()) = tokio::join!(loader.load(srcs(&["a", "b"])), async {
        tokio::task::yield_now().await;
        token.dispose();
        gate.add_permits(2);
    });

    assert!(summary.discarded);
    assert_eq!(summary.loaded, 0);
    assert!(loader.get("a").is_none());
    assert!(loader.sources().is_empty());
}

#[tokio::test]
async fn token_dispose_hides_settled_cache() {
    let fetcher = FlakyFetcher::default().with("a", b"A");
    let mut loader = ResourceLoader::new(fetcher, 0);
    loader.load(srcs(&["a"])).await;

    loader.lifecycle().dispose();
    assert!(loader.get("a").is_none());
}
