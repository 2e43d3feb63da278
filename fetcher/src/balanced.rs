//! Balanced category fetch.
//!
//! Selects up to `target_limit` articles spread as evenly as possible across
//! a fixed [`CategorySet`]:
//!
//! 1. First pass: every category is asked for `ceil(target / categories)`
//!    articles. If that already covers the target, the selection is
//!    truncated to the target and returned.
//! 2. Backfill: at most `max_backfill_iterations` rounds. Each round asks
//!    every category, in order, for one more article not yet selected, until
//!    the target is reached. A round that adds nothing ends the backfill.
//!
//! At most `categories * (1 + max_backfill_iterations)` store queries are
//! issued per fetch.
//!
//! The returned order is category-major: each category's articles are sorted
//! by the request's sort spec, but the sequence as a whole is not, unless
//! `global_resort` is enabled.

use crate::config::{FetcherConfig, FirstPass};
use crate::metrics_defs::{
    FETCH_BACKFILL_ITERATIONS, FETCH_DURATION, FETCH_QUERIES, FETCH_SHORTFALL, FETCH_STORE_ERRORS,
    FETCH_TIMEOUTS,
};
use crate::query::{BaseFilter, Filter, SortSpec};
use crate::store::{ArticleStore, StoreError};
use crate::types::{Article, ArticleId, Category, CategorySet};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub base_filter: BaseFilter,
    pub sort: SortSpec,
    pub target_limit: usize,
    /// Correlation id, only used for logging.
    pub request_id: String,
}

/// Per-category bookkeeping for one fetch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryCount {
    pub target: usize,
    pub first_pass: usize,
    pub article_ids: Vec<ArticleId>,
}

pub type CategoryTally = IndexMap<Category, CategoryCount>;

#[derive(Debug)]
pub struct FetchOutcome {
    pub articles: Vec<Article>,
    pub tally: CategoryTally,
    pub queries: usize,
    pub backfill_iterations: usize,
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("store query for category {category} failed: {source}")]
    Store {
        category: Category,
        #[source]
        source: StoreError,
    },

    #[error("fetch timed out after {0:?}")]
    TimedOut(Duration),
}

/// Accumulates the selection of a single fetch.
struct Selection {
    articles: Vec<Article>,
    selected: HashSet<ArticleId>,
    tally: CategoryTally,
    queries: usize,
    backfill_iterations: usize,
}

impl Selection {
    fn new(categories: &CategorySet, per_category_target: usize) -> Self {
        let tally = categories
            .iter()
            .map(|category| {
                let count = CategoryCount {
                    target: per_category_target,
                    ..Default::default()
                };
                (category.clone(), count)
            })
            .collect();

        Selection {
            articles: Vec::new(),
            selected: HashSet::new(),
            tally,
            queries: 0,
            backfill_iterations: 0,
        }
    }

    fn len(&self) -> usize {
        self.articles.len()
    }

    /// Adds the article unless its id was already selected.
    fn accept(&mut self, category: &Category, article: Article) -> bool {
        if !self.selected.insert(article.id.clone()) {
            tracing::debug!(
                %category,
                article_id = %article.id,
                "skipping article that is already selected"
            );
            return false;
        }

        if let Some(count) = self.tally.get_mut(category) {
            count.article_ids.push(article.id.clone());
        }
        self.articles.push(article);
        true
    }

    /// Drops articles from the tail, keeping the tally consistent.
    fn truncate(&mut self, len: usize) {
        while self.articles.len() > len {
            let Some(article) = self.articles.pop() else {
                break;
            };
            self.selected.remove(&article.id);
            for count in self.tally.values_mut() {
                if count.article_ids.last() == Some(&article.id) {
                    count.article_ids.pop();
                    count.first_pass = count.first_pass.min(count.article_ids.len());
                    break;
                }
            }
        }
    }

    fn finish(self) -> FetchOutcome {
        FetchOutcome {
            articles: self.articles,
            tally: self.tally,
            queries: self.queries,
            backfill_iterations: self.backfill_iterations,
        }
    }
}

#[derive(Clone)]
pub struct BalancedFetcher {
    store: Arc<dyn ArticleStore>,
    categories: CategorySet,
    config: FetcherConfig,
}

impl BalancedFetcher {
    pub fn new(store: Arc<dyn ArticleStore>, categories: CategorySet, config: FetcherConfig) -> Self {
        BalancedFetcher {
            store,
            categories,
            config,
        }
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// Upper bound on the store queries a single fetch can issue.
    pub fn query_budget(&self) -> usize {
        self.categories
            .len()
            .saturating_mul(self.config.max_backfill_iterations.saturating_add(1))
    }

    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        let start = Instant::now();

        let result = match self.config.timeout_ms {
            Some(ms) => {
                let limit = Duration::from_millis(ms);
                tokio::time::timeout(limit, self.run(request))
                    .await
                    .unwrap_or(Err(FetchError::TimedOut(limit)))
            }
            None => self.run(request).await,
        };

        shared::histogram!(FETCH_DURATION).record(start.elapsed().as_secs_f64());

        match &result {
            Ok(outcome) => {
                shared::histogram!(FETCH_QUERIES).record(outcome.queries as f64);
                shared::histogram!(FETCH_BACKFILL_ITERATIONS)
                    .record(outcome.backfill_iterations as f64);
                if outcome.articles.len() < request.target_limit {
                    shared::counter!(FETCH_SHORTFALL).increment(1);
                }
            }
            Err(FetchError::Store { category, source }) => {
                tracing::warn!(
                    request_id = %request.request_id,
                    %category,
                    "store query failed: {source}"
                );
                shared::counter!(FETCH_STORE_ERRORS, "category" => category.to_string())
                    .increment(1);
            }
            Err(FetchError::TimedOut(limit)) => {
                tracing::warn!(request_id = %request.request_id, ?limit, "fetch timed out");
                shared::counter!(FETCH_TIMEOUTS).increment(1);
            }
        }

        result
    }

    async fn run(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        let target = request.target_limit;

        if target == 0 || self.categories.is_empty() {
            tracing::debug!(
                request_id = %request.request_id,
                target,
                categories = self.categories.len(),
                "nothing to fetch"
            );
            return Ok(Selection::new(&self.categories, 0).finish());
        }

        let per_category_target = target.div_ceil(self.categories.len());
        let mut selection = Selection::new(&self.categories, per_category_target);

        match self.config.first_pass {
            FirstPass::Sequential => {
                self.first_pass_sequential(request, per_category_target, &mut selection)
                    .await?
            }
            FirstPass::Parallel => {
                self.first_pass_parallel(request, per_category_target, &mut selection)
                    .await?
            }
        }

        if selection.len() >= target {
            selection.truncate(target);
        } else {
            self.backfill(request, &mut selection).await?;
        }

        if self.config.global_resort {
            request.sort.sort(&mut selection.articles);
        }

        let distribution: Vec<(&str, usize)> = selection
            .tally
            .iter()
            .map(|(category, count)| (category.as_str(), count.article_ids.len()))
            .collect();

        tracing::info!(
            request_id = %request.request_id,
            requested = target,
            returned = selection.len(),
            queries = selection.queries,
            backfill_iterations = selection.backfill_iterations,
            ?distribution,
            "balanced fetch complete"
        );

        Ok(selection.finish())
    }

    async fn first_pass_sequential(
        &self,
        request: &FetchRequest,
        per_category_target: usize,
        selection: &mut Selection,
    ) -> Result<(), FetchError> {
        for category in self.categories.iter() {
            let filter = Filter::for_category(&request.base_filter, category);
            selection.queries += 1;
            let rows = query(
                self.store.as_ref(),
                category,
                &filter,
                &request.sort,
                per_category_target,
            )
            .await?;

            self.record_first_pass(request, category, rows, selection);
        }
        Ok(())
    }

    /// Queries all categories concurrently, then merges in enumeration order so
    /// the result matches the sequential pass.
    async fn first_pass_parallel(
        &self,
        request: &FetchRequest,
        per_category_target: usize,
        selection: &mut Selection,
    ) -> Result<(), FetchError> {
        let mut join_set = JoinSet::new();

        for (index, category) in self.categories.iter().enumerate() {
            let store = self.store.clone();
            let category = category.clone();
            let filter = Filter::for_category(&request.base_filter, &category);
            let sort = request.sort.clone();

            join_set.spawn(async move {
                let result =
                    query(store.as_ref(), &category, &filter, &sort, per_category_target).await;
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<Vec<Article>, FetchError>>> =
            (0..self.categories.len()).map(|_| None).collect();

        while let Some(joined) = join_set.join_next().await {
            selection.queries += 1;
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::error!("first pass query task failed: {e}"),
            }
        }

        for (category, result) in self.categories.iter().zip(results) {
            let rows = match result {
                Some(result) => result?,
                None => {
                    return Err(FetchError::Store {
                        category: category.clone(),
                        source: StoreError::Unavailable("query task failed".into()),
                    });
                }
            };
            self.record_first_pass(request, category, rows, selection);
        }
        Ok(())
    }

    fn record_first_pass(
        &self,
        request: &FetchRequest,
        category: &Category,
        rows: Vec<Article>,
        selection: &mut Selection,
    ) {
        let mut fetched = 0;
        for article in rows {
            if selection.accept(category, article) {
                fetched += 1;
            }
        }
        if let Some(count) = selection.tally.get_mut(category) {
            count.first_pass = fetched;
        }

        tracing::debug!(
            request_id = %request.request_id,
            %category,
            fetched,
            target = selection.tally.get(category).map_or(0, |c| c.target),
            "first pass"
        );
    }

    async fn backfill(
        &self,
        request: &FetchRequest,
        selection: &mut Selection,
    ) -> Result<(), FetchError> {
        let target = request.target_limit;

        while selection.len() < target
            && selection.backfill_iterations < self.config.max_backfill_iterations
        {
            selection.backfill_iterations += 1;
            let mut added = 0;

            for category in self.categories.iter() {
                if selection.len() >= target {
                    break;
                }

                let filter = Filter::for_category(&request.base_filter, category)
                    .excluding(&selection.selected);
                selection.queries += 1;
                let rows = query(self.store.as_ref(), category, &filter, &request.sort, 1).await?;

                if let Some(article) = rows.into_iter().next()
                    && selection.accept(category, article)
                {
                    added += 1;
                }
            }

            tracing::debug!(
                request_id = %request.request_id,
                iteration = selection.backfill_iterations,
                added,
                total = selection.len(),
                deficit = target - selection.len(),
                "backfill iteration"
            );

            if added == 0 {
                tracing::debug!(
                    request_id = %request.request_id,
                    "store exhausted for this filter, stopping backfill"
                );
                break;
            }
        }
        Ok(())
    }
}

async fn query(
    store: &dyn ArticleStore,
    category: &Category,
    filter: &Filter,
    sort: &SortSpec,
    limit: usize,
) -> Result<Vec<Article>, FetchError> {
    let mut rows = store
        .query(filter, sort, limit)
        .await
        .map_err(|source| FetchError::Store {
            category: category.clone(),
            source,
        })?;
    rows.truncate(limit);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testutils::{
        CounterRecorder, CountingStore, FailingStore, IgnoreExclusionStore, SlowStore,
        articles_per_category,
    };

    fn request(target_limit: usize) -> FetchRequest {
        FetchRequest {
            base_filter: BaseFilter::default(),
            sort: SortSpec::default(),
            target_limit,
            request_id: "test-request".into(),
        }
    }

    fn fetcher_with(
        store: Arc<dyn ArticleStore>,
        categories: &[&str],
        config: FetcherConfig,
    ) -> BalancedFetcher {
        BalancedFetcher::new(store, CategorySet::new(categories.iter().copied()), config)
    }

    fn counts(outcome: &FetchOutcome) -> Vec<(String, usize)> {
        outcome
            .tally
            .iter()
            .map(|(category, count)| (category.to_string(), count.article_ids.len()))
            .collect()
    }

    fn assert_no_duplicates(outcome: &FetchOutcome) {
        let ids: HashSet<_> = outcome.articles.iter().map(|a| &a.id).collect();
        assert_eq!(ids.len(), outcome.articles.len(), "duplicate article ids");
    }

    fn assert_tally_matches_articles(outcome: &FetchOutcome) {
        let mut from_tally: Vec<_> = outcome
            .tally
            .values()
            .flat_map(|count| count.article_ids.iter().cloned())
            .collect();
        let mut returned: Vec<_> = outcome.articles.iter().map(|a| a.id.clone()).collect();
        from_tally.sort();
        returned.sort();
        assert_eq!(from_tally, returned);
    }

    #[tokio::test]
    async fn test_scenario_news_tech_culture() {
        let store = Arc::new(CountingStore::new(articles_per_category(&[
            ("news", 5),
            ("tech", 1),
            ("culture", 10),
        ])));
        let fetcher = fetcher_with(
            store.clone(),
            &["news", "tech", "culture"],
            FetcherConfig::default(),
        );

        let outcome = fetcher.fetch(&request(9)).await.unwrap();

        assert_eq!(outcome.articles.len(), 9);
        assert_eq!(
            counts(&outcome),
            vec![
                ("news".to_string(), 4),
                ("tech".to_string(), 1),
                ("culture".to_string(), 4)
            ]
        );
        assert_eq!(outcome.tally["news"].first_pass, 3);
        assert_eq!(outcome.tally["tech"].first_pass, 1);
        assert_eq!(outcome.tally["culture"].first_pass, 3);
        assert_eq!(outcome.backfill_iterations, 1);
        // 3 first pass queries + 3 in the single backfill iteration.
        assert_eq!(outcome.queries, 6);
        assert_eq!(store.calls(), 6);
        assert_no_duplicates(&outcome);
        assert_tally_matches_articles(&outcome);

        // Category-major order: news run, tech run, then culture run.
        let categories: Vec<_> = outcome
            .articles
            .iter()
            .map(|a| a.category.as_str())
            .collect();
        assert_eq!(
            categories,
            vec![
                "news", "news", "news", "tech", "culture", "culture", "culture", "news", "culture"
            ]
        );
    }

    #[tokio::test]
    async fn test_exact_fill_from_first_pass() {
        let store = Arc::new(CountingStore::new(articles_per_category(&[
            ("news", 10),
            ("tech", 10),
            ("culture", 10),
        ])));
        let fetcher = fetcher_with(
            store.clone(),
            &["news", "tech", "culture"],
            FetcherConfig::default(),
        );

        for target in 1..=20 {
            let outcome = fetcher.fetch(&request(target)).await.unwrap();
            let per_category = target.div_ceil(3);

            assert_eq!(outcome.articles.len(), target);
            assert_eq!(outcome.backfill_iterations, 0);
            assert_eq!(outcome.queries, 3);
            for count in outcome.tally.values() {
                assert!(count.first_pass <= per_category);
                assert_eq!(count.target, per_category);
            }
            assert_no_duplicates(&outcome);
            assert_tally_matches_articles(&outcome);
        }
    }

    #[tokio::test]
    async fn test_truncation_keeps_category_major_prefix() {
        let store = Arc::new(MemoryStore::new(articles_per_category(&[
            ("news", 5),
            ("tech", 5),
            ("culture", 5),
        ])));
        let fetcher = fetcher_with(store, &["news", "tech", "culture"], FetcherConfig::default());

        // ceil(7 / 3) = 3 per category, 9 fetched, last two dropped.
        let outcome = fetcher.fetch(&request(7)).await.unwrap();
        assert_eq!(outcome.articles.len(), 7);
        assert_eq!(
            counts(&outcome),
            vec![
                ("news".to_string(), 3),
                ("tech".to_string(), 3),
                ("culture".to_string(), 1)
            ]
        );
        assert_eq!(outcome.tally["culture"].first_pass, 1);
        assert_eq!(outcome.articles[6].id, "culture-0");
        assert_tally_matches_articles(&outcome);
    }

    #[tokio::test]
    async fn test_backfill_round_robin_single_category() {
        let store = Arc::new(CountingStore::new(articles_per_category(&[("a", 10)])));
        let fetcher = fetcher_with(store.clone(), &["a", "b", "c"], FetcherConfig::default());

        let outcome = fetcher.fetch(&request(6)).await.unwrap();

        assert_eq!(outcome.articles.len(), 6);
        assert_eq!(outcome.tally["a"].first_pass, 2);
        assert_eq!(outcome.backfill_iterations, 4);
        // 3 first pass, 3 per iteration for iterations 1-3, and only "a" in
        // iteration 4 before the target is met.
        assert_eq!(outcome.queries, 13);
        assert_eq!(store.calls(), 13);
        assert!(outcome.queries <= fetcher.query_budget());
        assert_no_duplicates(&outcome);
    }

    #[tokio::test]
    async fn test_backfill_iteration_cap() {
        let store = Arc::new(CountingStore::new(articles_per_category(&[("a", 100)])));
        let fetcher = fetcher_with(store.clone(), &["a", "b", "c"], FetcherConfig::default());

        let outcome = fetcher.fetch(&request(30)).await.unwrap();

        // 10 from the first pass plus one per backfill iteration.
        assert_eq!(outcome.articles.len(), 15);
        assert_eq!(outcome.backfill_iterations, 5);
        assert_eq!(outcome.queries, fetcher.query_budget());
        assert_eq!(store.calls(), 18);
    }

    #[tokio::test]
    async fn test_stops_on_exhaustion() {
        let store = Arc::new(CountingStore::new(articles_per_category(&[
            ("news", 5),
            ("tech", 0),
            ("culture", 0),
        ])));
        let fetcher = fetcher_with(
            store.clone(),
            &["news", "tech", "culture"],
            FetcherConfig::default(),
        );

        let outcome = fetcher.fetch(&request(9)).await.unwrap();

        assert_eq!(outcome.articles.len(), 5);
        // Iterations 1 and 2 each add one, iteration 3 adds nothing.
        assert_eq!(outcome.backfill_iterations, 3);
        assert_eq!(outcome.queries, 3 + 3 * 3);
        assert_eq!(store.calls(), 12);
    }

    #[tokio::test]
    async fn test_exhausted_after_first_pass() {
        let store = Arc::new(CountingStore::new(articles_per_category(&[
            ("news", 2),
            ("tech", 1),
        ])));
        let fetcher = fetcher_with(
            store.clone(),
            &["news", "tech", "culture"],
            FetcherConfig::default(),
        );

        let outcome = fetcher.fetch(&request(9)).await.unwrap();

        assert_eq!(outcome.articles.len(), 3);
        assert_eq!(outcome.backfill_iterations, 1);
        assert_eq!(store.calls(), 6);
    }

    #[tokio::test]
    async fn test_zero_target_and_empty_categories() {
        let store = Arc::new(CountingStore::new(articles_per_category(&[("news", 3)])));

        let fetcher = fetcher_with(store.clone(), &["news"], FetcherConfig::default());
        let outcome = fetcher.fetch(&request(0)).await.unwrap();
        assert!(outcome.articles.is_empty());
        assert_eq!(outcome.queries, 0);

        let fetcher = fetcher_with(store.clone(), &[], FetcherConfig::default());
        let outcome = fetcher.fetch(&request(5)).await.unwrap();
        assert!(outcome.articles.is_empty());
        assert_eq!(fetcher.query_budget(), 0);

        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn test_query_budget_saturates() {
        let store = Arc::new(CountingStore::new(Vec::new()));
        let fetcher = fetcher_with(
            store,
            &["news", "tech"],
            FetcherConfig {
                max_backfill_iterations: usize::MAX,
                ..Default::default()
            },
        );
        assert_eq!(fetcher.query_budget(), usize::MAX);
    }

    #[tokio::test]
    async fn test_store_error_in_first_pass() {
        let inner = MemoryStore::new(articles_per_category(&[("news", 5), ("tech", 5)]));
        let store = Arc::new(FailingStore::new(inner, 2));
        let fetcher = fetcher_with(store, &["news", "tech"], FetcherConfig::default());

        let err = fetcher.fetch(&request(4)).await.unwrap_err();
        match err {
            FetchError::Store { category, source } => {
                assert_eq!(category.as_str(), "tech");
                assert!(matches!(source, StoreError::Unavailable(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_store_error_in_backfill() {
        let inner = MemoryStore::new(articles_per_category(&[("news", 10)]));
        // Calls 1-2 are the first pass, call 3 is the first backfill query.
        let store = Arc::new(FailingStore::new(inner, 3));
        let fetcher = fetcher_with(store, &["news", "tech"], FetcherConfig::default());

        let result = fetcher.fetch(&request(6)).await;
        assert!(matches!(result, Err(FetchError::Store { .. })));
    }

    #[tokio::test]
    async fn test_duplicates_are_skipped() {
        let mut articles = articles_per_category(&[("news", 2), ("tech", 2)]);
        // Same id reachable from two categories.
        let mut shared = Article::new("news-0", "tech", 10.0, 0);
        shared.title = "duplicate".into();
        articles.push(shared);

        let store = Arc::new(MemoryStore::new(articles));
        let fetcher = fetcher_with(store, &["news", "tech"], FetcherConfig::default());

        let outcome = fetcher.fetch(&request(4)).await.unwrap();
        assert_no_duplicates(&outcome);
        assert_tally_matches_articles(&outcome);
        assert_eq!(outcome.articles.len(), 4);
    }

    #[tokio::test]
    async fn test_store_ignoring_exclusions_terminates() {
        let inner = MemoryStore::new(articles_per_category(&[("news", 10)]));
        let store = Arc::new(IgnoreExclusionStore::new(inner));
        let fetcher = fetcher_with(store, &["news", "tech"], FetcherConfig::default());

        let outcome = fetcher.fetch(&request(6)).await.unwrap();
        // Backfill keeps getting the top article back and stops after one round.
        assert_eq!(outcome.articles.len(), 3);
        assert_eq!(outcome.backfill_iterations, 1);
        assert_no_duplicates(&outcome);
    }

    #[tokio::test]
    async fn test_parallel_first_pass_matches_sequential() {
        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStore::new(articles_per_category(&[
            ("news", 5),
            ("tech", 1),
            ("culture", 10),
        ])));
        let categories = ["news", "tech", "culture"];

        let sequential = fetcher_with(store.clone(), &categories, FetcherConfig::default());
        let parallel = fetcher_with(
            store,
            &categories,
            FetcherConfig {
                first_pass: FirstPass::Parallel,
                ..Default::default()
            },
        );

        for target in [1, 4, 9, 16, 30] {
            let a = sequential.fetch(&request(target)).await.unwrap();
            let b = parallel.fetch(&request(target)).await.unwrap();
            assert_eq!(a.articles, b.articles);
            assert_eq!(a.tally, b.tally);
            assert_eq!(a.queries, b.queries);
        }
    }

    #[tokio::test]
    async fn test_parallel_first_pass_error() {
        let inner = MemoryStore::new(articles_per_category(&[("news", 5), ("tech", 5)]));
        let store = Arc::new(FailingStore::new(inner, 1));
        let fetcher = fetcher_with(
            store,
            &["news", "tech"],
            FetcherConfig {
                first_pass: FirstPass::Parallel,
                ..Default::default()
            },
        );

        let result = fetcher.fetch(&request(4)).await;
        assert!(matches!(result, Err(FetchError::Store { .. })));
    }

    #[tokio::test]
    async fn test_global_resort() {
        let store = Arc::new(MemoryStore::new(articles_per_category(&[
            ("news", 3),
            ("tech", 3),
        ])));
        let fetcher = fetcher_with(
            store,
            &["news", "tech"],
            FetcherConfig {
                global_resort: true,
                ..Default::default()
            },
        );

        let outcome = fetcher.fetch(&request(4)).await.unwrap();
        let sort = SortSpec::default();
        assert!(
            outcome
                .articles
                .windows(2)
                .all(|pair| sort.compare(&pair[0], &pair[1]).is_le())
        );
        assert_tally_matches_articles(&outcome);
    }

    #[tokio::test]
    async fn test_timeout() {
        let store = Arc::new(SlowStore::new(Duration::from_secs(5)));
        let fetcher = fetcher_with(
            store,
            &["news"],
            FetcherConfig {
                timeout_ms: Some(50),
                ..Default::default()
            },
        );

        let result = fetcher.fetch(&request(3)).await;
        assert!(matches!(result, Err(FetchError::TimedOut(_))));
    }

    #[test]
    fn test_timeout_is_counted() {
        let recorder = CounterRecorder::default();
        let fetcher = fetcher_with(
            Arc::new(SlowStore::new(Duration::from_secs(5))),
            &["news"],
            FetcherConfig {
                timeout_ms: Some(20),
                ..Default::default()
            },
        );
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        let result =
            metrics::with_local_recorder(&recorder, || rt.block_on(fetcher.fetch(&request(3))));

        assert!(matches!(result, Err(FetchError::TimedOut(_))));
        let counters = recorder.counters();
        assert!(counters.iter().any(|name| name == "fetch.timeouts"));
        assert!(!counters.iter().any(|name| name == "fetch.store_errors"));
    }

    #[tokio::test]
    async fn test_base_filter_applies_to_every_query() {
        let store = Arc::new(MemoryStore::new(articles_per_category(&[
            ("news", 6),
            ("tech", 6),
        ])));
        let fetcher = fetcher_with(store, &["news", "tech"], FetcherConfig::default());

        let mut req = request(10);
        // Scores run from 1.0 down in steps of 0.1, so four per category pass.
        req.base_filter.min_score = Some(0.65);

        let outcome = fetcher.fetch(&req).await.unwrap();
        assert_eq!(outcome.articles.len(), 8);
        assert!(outcome.articles.iter().all(|a| a.score >= 0.65));
    }
}
