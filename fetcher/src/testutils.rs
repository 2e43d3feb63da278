use crate::query::{Filter, SortSpec};
use crate::store::{ArticleStore, MemoryStore, StoreError};
use crate::types::Article;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// `count` articles per category with ids `{category}-{i}`. Scores and
/// timestamps decrease with `i`, so `{category}-0` sorts first by default.
pub fn articles_per_category(counts: &[(&str, usize)]) -> Vec<Article> {
    counts
        .iter()
        .flat_map(|(category, count)| {
            (0..*count).map(move |i| {
                Article::new(
                    format!("{category}-{i}"),
                    *category,
                    1.0 - i as f64 * 0.1,
                    1_000 - i as u64,
                )
            })
        })
        .collect()
}

/// Memory store that counts the queries it receives.
pub struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(articles: Vec<Article>) -> Self {
        CountingStore {
            inner: MemoryStore::new(articles),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleStore for CountingStore {
    async fn query(
        &self,
        filter: &Filter,
        sort: &SortSpec,
        limit: usize,
    ) -> Result<Vec<Article>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.query(filter, sort, limit).await
    }
}

/// Fails the `fail_on`-th query (1-based) and serves all others.
pub struct FailingStore {
    inner: MemoryStore,
    fail_on: usize,
    calls: AtomicUsize,
}

impl FailingStore {
    pub fn new(inner: MemoryStore, fail_on: usize) -> Self {
        FailingStore {
            inner,
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ArticleStore for FailingStore {
    async fn query(
        &self,
        filter: &Filter,
        sort: &SortSpec,
        limit: usize,
    ) -> Result<Vec<Article>, StoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        self.inner.query(filter, sort, limit).await
    }
}

/// Drops the exclusion set before querying, as a misbehaving store would.
pub struct IgnoreExclusionStore {
    inner: MemoryStore,
}

impl IgnoreExclusionStore {
    pub fn new(inner: MemoryStore) -> Self {
        IgnoreExclusionStore { inner }
    }
}

#[async_trait]
impl ArticleStore for IgnoreExclusionStore {
    async fn query(
        &self,
        filter: &Filter,
        sort: &SortSpec,
        limit: usize,
    ) -> Result<Vec<Article>, StoreError> {
        let mut filter = filter.clone();
        filter.exclude_ids = HashSet::new();
        self.inner.query(&filter, sort, limit).await
    }
}

pub struct SlowStore {
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        SlowStore { delay }
    }
}

#[async_trait]
impl ArticleStore for SlowStore {
    async fn query(
        &self,
        _filter: &Filter,
        _sort: &SortSpec,
        _limit: usize,
    ) -> Result<Vec<Article>, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }
}

/// Records the names of the counters registered while it is installed.
#[derive(Default)]
pub struct CounterRecorder {
    counters: std::sync::Mutex<Vec<String>>,
}

impl CounterRecorder {
    pub fn counters(&self) -> Vec<String> {
        self.counters.lock().unwrap().clone()
    }
}

impl metrics::Recorder for CounterRecorder {
    fn describe_counter(
        &self,
        _: metrics::KeyName,
        _: Option<metrics::Unit>,
        _: metrics::SharedString,
    ) {
    }

    fn describe_gauge(
        &self,
        _: metrics::KeyName,
        _: Option<metrics::Unit>,
        _: metrics::SharedString,
    ) {
    }

    fn describe_histogram(
        &self,
        _: metrics::KeyName,
        _: Option<metrics::Unit>,
        _: metrics::SharedString,
    ) {
    }

    fn register_counter(
        &self,
        key: &metrics::Key,
        _: &metrics::Metadata<'_>,
    ) -> metrics::Counter {
        self.counters.lock().unwrap().push(key.name().to_string());
        metrics::Counter::noop()
    }

    fn register_gauge(&self, _: &metrics::Key, _: &metrics::Metadata<'_>) -> metrics::Gauge {
        metrics::Gauge::noop()
    }

    fn register_histogram(
        &self,
        _: &metrics::Key,
        _: &metrics::Metadata<'_>,
    ) -> metrics::Histogram {
        metrics::Histogram::noop()
    }
}
