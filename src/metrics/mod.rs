//! Service Metrics
//!
//! Prometheus counters and histograms for the optimize path. The registry
//! lives in application state and is passed around explicitly rather than
//! through module-level globals.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    /// Optimization requests received, including ones rejected by
    /// validation.
    pub requests: IntCounter,
    /// Requests answered with an assignment (any status).
    pub success: IntCounter,
    /// Requests that failed internally.
    pub errors: IntCounter,
    /// Wall-clock duration of the solve step, in seconds.
    pub solve_duration: Histogram,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests = IntCounter::with_opts(Opts::new(
            "optimization_requests_total",
            "Total optimization requests received",
        ))?;
        let success = IntCounter::with_opts(Opts::new(
            "optimization_success_total",
            "Optimization requests answered with an assignment",
        ))?;
        let errors = IntCounter::with_opts(Opts::new(
            "optimization_errors_total",
            "Optimization requests that failed internally",
        ))?;
        let solve_duration = Histogram::with_opts(
            HistogramOpts::new(
                "optimization_duration_seconds",
                "Optimization processing duration",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]),
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(success.clone()))?;
        registry.register(Box::new(errors.clone()))?;
        registry.register(Box::new(solve_duration.clone()))?;

        Ok(Metrics {
            registry,
            requests,
            success,
            errors,
            solve_duration,
        })
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
