use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinSet;

use crate::assets::fetch::Fetcher;

/// Encoded bytes of one resource.
pub type Blob = Arc<[u8]>;

/// Source identifier to encoded bytes.
#[derive(Clone, Debug, Default)]
pub struct ResourceCache {
    entries: HashMap<String, Blob>,
}

impl ResourceCache {
    pub fn get(&self, source: &str) -> Option<&Blob> {
        self.entries.get(source)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.entries.contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, source: String, blob: Blob) {
        self.entries.insert(source, blob);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Outcome of one [`ResourceLoader::load`] batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub requested: usize,
    pub loaded: usize,
    /// Sources that exhausted their retry budget, in request order.
    pub failed: Vec<String>,
    /// `true` when the loader was disposed while the batch was in flight.
    pub discarded: bool,
}

/// Cloneable disposal token.
///
/// Disposing through a token invalidates whatever the loader currently holds and any batch still
/// in flight; results arriving afterwards are dropped.
#[derive(Clone, Debug, Default)]
pub struct LoaderLifecycle {
    generation: Arc<AtomicU64>,
}

impl LoaderLifecycle {
    pub fn dispose(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Fetches byte resources concurrently with bounded retry.
pub struct ResourceLoader<F> {
    fetcher: Arc<F>,
    max_retries: u32,
    sources: Vec<String>,
    cache: ResourceCache,
    lifecycle: LoaderLifecycle,
    cache_generation: u64,
}

impl<F: Fetcher> ResourceLoader<F> {
    pub fn new(fetcher: F, max_retries: u32) -> Self {
        Self::from_shared(Arc::new(fetcher), max_retries)
    }

    pub fn from_shared(fetcher: Arc<F>, max_retries: u32) -> Self {
        Self {
            fetcher,
            max_retries,
            sources: Vec::new(),
            cache: ResourceCache::default(),
            lifecycle: LoaderLifecycle::default(),
            cache_generation: 0,
        }
    }

    pub fn lifecycle(&self) -> LoaderLifecycle {
        self.lifecycle.clone()
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Fetch every source concurrently and replace the cache with the results.
    ///
    /// Individual failures never fail the batch: a source that exhausts its retries is simply
    /// missing from the cache.
    #[tracing::instrument(skip(self, sources), fields(count = sources.len()))]
    pub async fn load(&mut self, sources: Vec<String>) -> LoadSummary {
        let generation = self.lifecycle.current();
        self.cache.clear();
        self.sources.clear();
        self.cache_generation = generation;

        let mut set = JoinSet::new();
        for (idx, source) in sources.iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let source = source.clone();
            let max_retries = self.max_retries;
            set.spawn(async move {
                let blob = fetch_with_retry(fetcher.as_ref(), &source, max_retries).await;
                (idx, source, blob)
            });
        }

        let mut failed = Vec::new();
        let mut fetched = Vec::with_capacity(sources.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((_, source, Some(blob))) => fetched.push((source, blob)),
                Ok((idx, source, None)) => failed.push((idx, source)),
                Err(e) => tracing::debug!(error = %e, "fetch task aborted"),
            }
        }
        failed.sort_by_key(|(idx, _)| *idx);

        let mut summary = LoadSummary {
            requested: sources.len(),
            loaded: 0,
            failed: failed.into_iter().map(|(_, s)| s).collect(),
            discarded: false,
        };

        if self.lifecycle.current() != generation {
            tracing::debug!("loader disposed during fetch; discarding results");
            summary.discarded = true;
            return summary;
        }

        for (source, blob) in fetched {
            self.cache.insert(source, blob);
        }
        summary.loaded = self.cache.len();
        self.sources = sources;
        summary
    }

    /// Cached bytes for `source`, unless the loader has been disposed since they were fetched.
    pub fn get(&self, source: &str) -> Option<&Blob> {
        if !self.is_current() {
            return None;
        }
        self.cache.get(source)
    }

    /// The live cache, or an empty view once disposed.
    pub fn cache(&self) -> Option<&ResourceCache> {
        self.is_current().then_some(&self.cache)
    }

    pub fn sources(&self) -> &[String] {
        if !self.is_current() {
            return &[];
        }
        &self.sources
    }

    /// Release every cached resource and forget the source list.
    pub fn dispose(&mut self) {
        self.lifecycle.dispose();
        self.cache.clear();
        self.sources.clear();
    }

    fn is_current(&self) -> bool {
        self.lifecycle.current() == self.cache_generation
    }
}

/// One attempt plus up to `max_retries` retries. Transport errors and non-2xx statuses both
/// consume an attempt.
async fn fetch_with_retry<F: Fetcher>(fetcher: &F, url: &str, max_retries: u32) -> Option<Blob> {
    for attempt in 0..=max_retries {
        match fetcher.fetch(url).await {
            Ok(resp) if resp.is_success() => return Some(Blob::from(resp.body)),
            Ok(resp) => {
                tracing::debug!(url, attempt, status = resp.status, "fetch returned non-success")
            }
            Err(e) => tracing::debug!(url, attempt, error = %e, "fetch failed"),
        }
    }
    tracing::debug!(url, max_retries, "giving up on resource");
    None
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
