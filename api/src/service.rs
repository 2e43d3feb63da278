use crate::errors::ApiError;
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS};
use crate::params::ListParams;
use fetcher::{Article, BalancedFetcher, FetchRequest};
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use http::request::Parts;
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use shared::http::full_body;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const DISPATCH_PATH: &str = "/articles/dispatch";

#[derive(Serialize)]
struct DispatchResponse<'a> {
    articles: &'a [Article],
    count: usize,
    requested: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Serves the dispatch article list.
#[derive(Clone)]
pub struct DispatchService {
    fetcher: BalancedFetcher,
    default_limit: usize,
    max_limit: usize,
}

impl DispatchService {
    pub fn new(fetcher: BalancedFetcher, default_limit: usize, max_limit: usize) -> Self {
        DispatchService {
            fetcher,
            default_limit,
            max_limit,
        }
    }

    async fn handle(&self, parts: Parts) -> Response<BoxBody<Bytes, ApiError>> {
        let start = Instant::now();
        let request_id = request_id(&parts.headers);

        let mut response = match self.route(&parts, &request_id).await {
            Ok(response) => response,
            Err(err) => {
                let status = err.status();
                if status.is_server_error() {
                    tracing::error!(%request_id, %status, "request failed: {err}");
                } else {
                    tracing::debug!(%request_id, %status, "request rejected: {err}");
                }
                json_response(
                    status,
                    &ErrorResponse {
                        error: err.to_string(),
                    },
                )
            }
        };

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        let status = response.status().as_u16().to_string();
        shared::counter!(REQUESTS, "status" => status.clone()).increment(1);
        shared::histogram!(REQUEST_DURATION, "status" => status)
            .record(start.elapsed().as_secs_f64());

        response
    }

    async fn route(
        &self,
        parts: &Parts,
        request_id: &str,
    ) -> Result<Response<BoxBody<Bytes, ApiError>>, ApiError> {
        let path = parts.uri.path();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        match (&parts.method, path) {
            (&Method::GET, DISPATCH_PATH) => self.list_dispatch(parts.uri.query(), request_id).await,
            (_, DISPATCH_PATH) => Err(ApiError::MethodNotAllowed),
            _ => Err(ApiError::NotFound),
        }
    }

    async fn list_dispatch(
        &self,
        query: Option<&str>,
        request_id: &str,
    ) -> Result<Response<BoxBody<Bytes, ApiError>>, ApiError> {
        let params = ListParams::parse(query, self.default_limit, self.max_limit)?;

        let request = FetchRequest {
            base_filter: params.base_filter,
            sort: params.sort,
            target_limit: params.limit,
            request_id: request_id.to_string(),
        };

        let outcome = self.fetcher.fetch(&request).await?;

        let body = DispatchResponse {
            articles: &outcome.articles,
            count: outcome.articles.len(),
            requested: params.limit,
        };
        Ok(json_response(StatusCode::OK, &body))
    }
}

impl<B> Service<Request<B>> for DispatchService {
    type Response = Response<BoxBody<Bytes, ApiError>>;
    type Error = ApiError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        // Only GET endpoints are served, so the body is never read.
        let (parts, _body) = req.into_parts();
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(parts).await) })
    }
}

/// Uses the caller's correlation id when present, otherwise a fresh one.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody<Bytes, ApiError>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = Response::new(full_body(Bytes::from(bytes)));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(err) => {
            tracing::error!("failed to serialize response: {err}");
            shared::http::make_boxed_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
