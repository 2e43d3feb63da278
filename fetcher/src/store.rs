//! Read access to the article collection. The fetcher only ever talks to the
//! document store through this trait.
use crate::query::{Filter, SortSpec};
use crate::types::Article;
use async_trait::async_trait;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("store retries exceeded")]
    RetriesExceeded,
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Returns at most `limit` articles matching `filter`, ordered by `sort`.
    ///
    /// An empty vector means nothing matched. Failures to reach the store must
    /// be reported as errors, never as an empty result.
    async fn query(
        &self,
        filter: &Filter,
        sort: &SortSpec,
        limit: usize,
    ) -> Result<Vec<Article>, StoreError>;
}

/// Keeps the whole collection in memory.
#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
}

impl MemoryStore {
    pub fn new(articles: Vec<Article>) -> Self {
        MemoryStore { articles }
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn query(
        &self,
        filter: &Filter,
        sort: &SortSpec,
        limit: usize,
    ) -> Result<Vec<Article>, StoreError> {
        let mut matched: Vec<Article> = self
            .articles
            .iter()
            .filter(|article| filter.matches(article))
            .cloned()
            .collect();

        sort.sort(&mut matched);
        matched.truncate(limit);
        Ok(matched)
    }
}

/// Serves articles loaded once from a JSON snapshot on disk.
pub struct FilesystemStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FilesystemStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let reader = BufReader::new(File::open(&path)?);
        let articles: Vec<Article> = serde_json::from_reader(reader)?;

        tracing::info!(path = %path.display(), count = articles.len(), "loaded article snapshot");

        Ok(FilesystemStore {
            path,
            inner: MemoryStore::new(articles),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl ArticleStore for FilesystemStore {
    async fn query(
        &self,
        filter: &Filter,
        sort: &SortSpec,
        limit: usize,
    ) -> Result<Vec<Article>, StoreError> {
        self.inner.query(filter, sort, limit).await
    }
}
