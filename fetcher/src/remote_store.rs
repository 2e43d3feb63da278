const BASE_DELAY: u64 = 100;
const MAX_RETRIES: u32 = 3;

use crate::query::{Filter, SortSpec};
use crate::store::{ArticleStore, StoreError};
use crate::types::Article;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, sleep};

#[derive(Serialize)]
struct QueryRequest<'a> {
    filter: &'a Filter,
    sort: &'a SortSpec,
    limit: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    data: Vec<Article>,
}

/// Queries a document store that exposes `POST /articles/query`.
pub struct RemoteStore {
    client: reqwest::Client,
    full_url: String,
}

impl RemoteStore {
    pub fn new(base_url: &str) -> Self {
        let full_url = format!("{}/{}", base_url.trim_end_matches('/'), "articles/query");

        RemoteStore {
            client: reqwest::Client::new(),
            full_url,
        }
    }
}

#[async_trait]
impl ArticleStore for RemoteStore {
    async fn query(
        &self,
        filter: &Filter,
        sort: &SortSpec,
        limit: usize,
    ) -> Result<Vec<Article>, StoreError> {
        const RETRIABLE_STATUS_CODES: &[StatusCode] = &[
            StatusCode::TOO_MANY_REQUESTS,     // 429
            StatusCode::INTERNAL_SERVER_ERROR, // 500
            StatusCode::BAD_GATEWAY,           // 502
            StatusCode::SERVICE_UNAVAILABLE,   // 503
            StatusCode::GATEWAY_TIMEOUT,       // 504
        ];

        let body = QueryRequest {
            filter,
            sort,
            limit,
        };
        let mut retries = 0;

        loop {
            let response = self.client.post(&self.full_url).json(&body).send().await?;
            let status = response.status();

            if status.is_success() {
                let mut data = response.json::<QueryResponse>().await?.data;
                data.truncate(limit);
                return Ok(data);
            }

            if !RETRIABLE_STATUS_CODES.contains(&status) {
                return Err(StoreError::Unavailable(format!(
                    "unexpected status {status} from {}",
                    self.full_url
                )));
            }

            if retries >= MAX_RETRIES {
                return Err(StoreError::RetriesExceeded);
            }

            let retry_millis = BASE_DELAY * 2_u64.pow(retries);
            tracing::warn!(%status, retries, retry_millis, "retriable store response");
            sleep(Duration::from_millis(retry_millis)).await;
            retries += 1;
        }
    }
}
