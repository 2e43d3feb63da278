//! Query string parsing for the dispatch list endpoint.

use fetcher::query::{BaseFilter, SortParseError, SortSpec};
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("invalid sort: {0}")]
    InvalidSort(#[from] SortParseError),
}

#[derive(Debug, PartialEq)]
pub struct ListParams {
    pub limit: usize,
    pub sort: SortSpec,
    pub base_filter: BaseFilter,
}

fn parse_value<T: FromStr>(name: &'static str, value: &str) -> Result<T, ParamsError> {
    value.parse().map_err(|_| ParamsError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

impl ListParams {
    /// Negative limits become 0 and limits above `max_limit` are clamped.
    /// Unknown parameters are ignored.
    pub fn parse(
        query: Option<&str>,
        default_limit: usize,
        max_limit: usize,
    ) -> Result<Self, ParamsError> {
        let mut params = ListParams {
            limit: default_limit,
            sort: SortSpec::default(),
            base_filter: BaseFilter::default(),
        };

        let Some(query) = query else {
            return Ok(params);
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "limit" => {
                    let limit: i64 = parse_value("limit", &value)?;
                    params.limit = usize::try_from(limit.max(0))
                        .unwrap_or(max_limit)
                        .min(max_limit);
                }
                "sort" => params.sort = value.parse()?,
                "source" => params.base_filter.source = Some(value.into_owned()),
                "min_score" => {
                    let min_score: f64 = parse_value("min_score", &value)?;
                    // NaN compares false against every score and would disable the filter.
                    if !min_score.is_finite() {
                        return Err(ParamsError::InvalidValue {
                            name: "min_score",
                            value: value.into_owned(),
                        });
                    }
                    params.base_filter.min_score = Some(min_score);
                }
                "published_after" => {
                    params.base_filter.published_after =
                        Some(parse_value("published_after", &value)?)
                }
                "published_before" => {
                    params.base_filter.published_before =
                        Some(parse_value("published_before", &value)?)
                }
                other => tracing::debug!(parameter = other, "ignoring unknown query parameter"),
            }
        }

        Ok(params)
    }
}
