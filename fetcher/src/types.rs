use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

pub type ArticleId = String;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new<S: Into<String>>(label: S) -> Self {
        Category(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Category {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Category::new(label)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub category: Category,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub score: f64,
    // seconds since 1970-01-01 00:00:00 UTC
    #[serde(default)]
    pub published_at: u64,
}

impl Article {
    pub fn new<I, C>(id: I, category: C, score: f64, published_at: u64) -> Self
    where
        I: Into<String>,
        C: Into<Category>,
    {
        Article {
            id: id.into(),
            category: category.into(),
            title: String::new(),
            url: String::new(),
            source: String::new(),
            score,
            published_at,
        }
    }
}

/// The fixed enumeration of categories articles are partitioned into.
///
/// Iteration order is the order categories were configured in, and every
/// fetch walks categories in that order. Duplicate labels are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategorySet {
    categories: IndexSet<Category>,
}

impl CategorySet {
    pub fn new<I, C>(categories: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Category>,
    {
        CategorySet {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.categories.contains(category)
    }
}
