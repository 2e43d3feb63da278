pub mod config;
pub mod errors;
pub mod metrics_defs;
pub mod params;
pub mod service;

use errors::ApiError;
use fetcher::{BalancedFetcher, CategorySet};
use service::DispatchService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Validates the config, builds the store and wires up the fetcher.
pub fn build_service(config: &config::Config) -> Result<DispatchService, ApiError> {
    config.validate()?;

    let store = fetcher::build_store(&config.store)?;
    let categories = CategorySet::new(config.categories.iter().map(String::as_str));
    let fetcher = BalancedFetcher::new(store, categories, config.fetcher.clone());

    tracing::info!(
        categories = ?config.categories,
        query_budget = fetcher.query_budget(),
        "dispatch fetcher ready"
    );

    Ok(DispatchService::new(
        fetcher,
        config.default_limit,
        config.max_limit,
    ))
}

pub async fn run(config: config::Config) -> Result<(), ApiError> {
    let ready = Arc::new(AtomicBool::new(false));
    let ready_clone = ready.clone();
    let admin_service: AdminService<_, ApiError> =
        AdminService::new(move || ready_clone.load(Ordering::Relaxed));

    let dispatch_service = build_service(&config)?;
    ready.store(true, Ordering::Relaxed);

    let dispatch_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        dispatch_service,
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(dispatch_task, admin_task)?;
    Ok(())
}
