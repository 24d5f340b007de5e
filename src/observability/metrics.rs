use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub matches_total: IntCounterVec,
    pub match_latency_seconds: HistogramVec,
    pub vacant_chairs: IntGauge,
    pub backfill_chairs_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let matches_total = IntCounterVec::new(
            Opts::new("matches_total", "Dispatch passes by outcome"),
            &["outcome"],
        )
        .expect("valid matches_total metric");

        let match_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "match_latency_seconds",
                "Latency of one dispatch pass in seconds",
            ),
            &["outcome"],
        )
        .expect("valid match_latency_seconds metric");

        let vacant_chairs = IntGauge::new("vacant_chairs", "Chairs currently vacant")
            .expect("valid vacant_chairs metric");

        let backfill_chairs_total = IntCounterVec::new(
            Opts::new("backfill_chairs_total", "Backfilled chairs by outcome"),
            &["outcome"],
        )
        .expect("valid backfill_chairs_total metric");

        registry
            .register(Box::new(matches_total.clone()))
            .expect("register matches_total");
        registry
            .register(Box::new(match_latency_seconds.clone()))
            .expect("register match_latency_seconds");
        registry
            .register(Box::new(vacant_chairs.clone()))
            .expect("register vacant_chairs");
        registry
            .register(Box::new(backfill_chairs_total.clone()))
            .expect("register backfill_chairs_total");

        Self {
            registry,
            matches_total,
            match_latency_seconds,
            vacant_chairs,
            backfill_chairs_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
