//! Filter and sort specifications passed to an [`ArticleStore`](crate::store::ArticleStore).
//!
//! A [`BaseFilter`] is what callers control. The fetcher combines it with a
//! category constraint and an exclusion set to build the [`Filter`] for each
//! store query.

use crate::types::{Article, ArticleId, Category};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Caller supplied constraints. Deliberately has no category field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_before: Option<u64>,
}

impl BaseFilter {
    pub fn matches(&self, article: &Article) -> bool {
        if let Some(source) = &self.source
            && &article.source != source
        {
            return false;
        }
        if let Some(min_score) = self.min_score
            && article.score < min_score
        {
            return false;
        }
        if let Some(after) = self.published_after
            && article.published_at < after
        {
            return false;
        }
        if let Some(before) = self.published_before
            && article.published_at >= before
        {
            return false;
        }
        true
    }
}

/// Base filter AND category equality AND id not in `exclude_ids`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Filter {
    #[serde(flatten)]
    pub base: BaseFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "HashSet::is_empty")]
    pub exclude_ids: HashSet<ArticleId>,
}

impl Filter {
    pub fn for_category(base: &BaseFilter, category: &Category) -> Self {
        Filter {
            base: base.clone(),
            category: Some(category.clone()),
            exclude_ids: HashSet::new(),
        }
    }

    pub fn excluding(mut self, ids: &HashSet<ArticleId>) -> Self {
        self.exclude_ids.extend(ids.iter().cloned());
        self
    }

    pub fn matches(&self, article: &Article) -> bool {
        if let Some(category) = &self.category
            && &article.category != category
        {
            return false;
        }
        if self.exclude_ids.contains(&article.id) {
            return false;
        }
        self.base.matches(article)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Score,
    PublishedAt,
    Id,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SortField,
    pub direction: Direction,
}

/// Ordered list of sort keys, most significant first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new(keys: Vec<SortKey>) -> Self {
        SortSpec { keys }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn compare(&self, a: &Article, b: &Article) -> Ordering {
        for key in &self.keys {
            let ordering = match key.field {
                SortField::Score => a.score.total_cmp(&b.score),
                SortField::PublishedAt => a.published_at.cmp(&b.published_at),
                SortField::Id => a.id.cmp(&b.id),
            };
            let ordering = match key.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable sort, so ties keep their existing relative order.
    pub fn sort(&self, articles: &mut [Article]) {
        articles.sort_by(|a, b| self.compare(a, b));
    }
}

impl Default for SortSpec {
    /// Highest relevance first, newest first among equal scores.
    fn default() -> Self {
        SortSpec::new(vec![
            SortKey {
                field: SortField::Score,
                direction: Direction::Desc,
            },
            SortKey {
                field: SortField::PublishedAt,
                direction: Direction::Desc,
            },
        ])
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SortParseError {
    #[error("empty sort key")]
    EmptyKey,
    #[error("unknown sort field: {0}")]
    UnknownField(String),
}

impl FromStr for SortSpec {
    type Err = SortParseError;

    /// Parses `-score,published_at` style specs. A leading `-` means descending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut keys = Vec::new();
        for raw in s.split(',') {
            let raw = raw.trim();
            let (direction, name) = match raw.strip_prefix('-') {
                Some(name) => (Direction::Desc, name),
                None => (Direction::Asc, raw.strip_prefix('+').unwrap_or(raw)),
            };
            let field = match name {
                "" => return Err(SortParseError::EmptyKey),
                "score" => SortField::Score,
                "published_at" => SortField::PublishedAt,
                "id" => SortField::Id,
                other => return Err(SortParseError::UnknownField(other.to_string())),
            };
            keys.push(SortKey { field, direction });
        }
        Ok(SortSpec { keys })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if key.direction == Direction::Desc {
                f.write_str("-")?;
            }
            f.write_str(match key.field {
                SortField::Score => "score",
                SortField::PublishedAt => "published_at",
                SortField::Id => "id",
            })?;
        }
        Ok(())
    }
}
