//! Metrics definitions for the fetcher.

use shared::metrics_defs::{MetricDef, MetricType};

pub const FETCH_DURATION: MetricDef = MetricDef {
    name: "fetch.duration",
    metric_type: MetricType::Histogram,
    description: "Time to complete a balanced fetch in seconds",
};

pub const FETCH_QUERIES: MetricDef = MetricDef {
    name: "fetch.queries",
    metric_type: MetricType::Histogram,
    description: "Number of store queries issued by one fetch",
};

pub const FETCH_BACKFILL_ITERATIONS: MetricDef = MetricDef {
    name: "fetch.backfill_iterations",
    metric_type: MetricType::Histogram,
    description: "Number of backfill iterations run by one fetch",
};

pub const FETCH_SHORTFALL: MetricDef = MetricDef {
    name: "fetch.shortfall",
    metric_type: MetricType::Counter,
    description: "Number of fetches that returned fewer articles than requested",
};

pub const FETCH_STORE_ERRORS: MetricDef = MetricDef {
    name: "fetch.store_errors",
    metric_type: MetricType::Counter,
    description: "Number of fetches aborted by a store error. Tagged with category.",
};

pub const FETCH_TIMEOUTS: MetricDef = MetricDef {
    name: "fetch.timeouts",
    metric_type: MetricType::Counter,
    description: "Number of fetches aborted by the configured timeout",
};

pub const ALL_METRICS: &[MetricDef] = &[
    FETCH_DURATION,
    FETCH_QUERIES,
    FETCH_BACKFILL_ITERATIONS,
    FETCH_SHORTFALL,
    FETCH_STORE_ERRORS,
    FETCH_TIMEOUTS,
];
