use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global metrics collector for the service.
///
/// Tracks detection outcomes, rate-limit denials, and per-endpoint
/// request counts. Thread-safe and cheap to clone.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    detections_total: AtomicUsize,
    detections_ok: AtomicUsize,
    detections_failed: AtomicUsize,
    empty_results_total: AtomicUsize,
    rate_limited_total: AtomicUsize,
    detection_latency_ms: RwLock<Vec<u64>>,
    endpoint_counters: DashMap<String, AtomicUsize>,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                detections_total: AtomicUsize::new(0),
                detections_ok: AtomicUsize::new(0),
                detections_failed: AtomicUsize::new(0),
                empty_results_total: AtomicUsize::new(0),
                rate_limited_total: AtomicUsize::new(0),
                detection_latency_ms: RwLock::new(Vec::new()),
                endpoint_counters: DashMap::new(),
                start_time: Instant::now(),
            }),
        }
    }

    pub fn record_request(&self, endpoint: &str) {
        self.inner
            .endpoint_counters
            .entry(endpoint.to_string())
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detection(&self, success: bool, duration: Duration) {
        self.inner.detections_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.inner.detections_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.detections_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.inner
            .detection_latency_ms
            .write()
            .push(duration.as_millis() as u64);
    }

    pub fn record_empty_result(&self) {
        self.inner.empty_results_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.inner.rate_limited_total.fetch_add(1, Ordering::Relaxed);
    }

    // Get snapshot for reporting
    pub fn snapshot(&self) -> MetricsSnapshot {
        let latency = self.inner.detection_latency_ms.read();
        let latency_avg_ms = avg(&latency);
        let latency_p50_ms = percentile(&latency, 0.5);
        let latency_p95_ms = percentile(&latency, 0.95);
        drop(latency);

        MetricsSnapshot {
            detections_total: self.inner.detections_total.load(Ordering::Relaxed),
            detections_ok: self.inner.detections_ok.load(Ordering::Relaxed),
            detections_failed: self.inner.detections_failed.load(Ordering::Relaxed),
            empty_results_total: self.inner.empty_results_total.load(Ordering::Relaxed),
            rate_limited_total: self.inner.rate_limited_total.load(Ordering::Relaxed),
            latency_avg_ms,
            latency_p50_ms,
            latency_p95_ms,
            uptime_seconds: self.inner.start_time.elapsed().as_secs(),
        }
    }

    /// Generate Prometheus-format metrics
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut out = format!(
            r#"# HELP detections_total Total number of detection requests processed
# TYPE detections_total counter
detections_total {}

# HELP detections_ok Number of successful detection requests
# TYPE detections_ok counter
detections_ok {}

# HELP detections_failed Number of failed detection requests
# TYPE detections_failed counter
detections_failed {}

# HELP empty_results_total Detections where the engine found no text
# TYPE empty_results_total counter
empty_results_total {}

# HELP rate_limited_total Requests denied by the rate limiter
# TYPE rate_limited_total counter
rate_limited_total {}

# HELP detection_latency_avg_ms Average detection latency in milliseconds
# TYPE detection_latency_avg_ms gauge
detection_latency_avg_ms {}

# HELP detection_latency_p95_ms 95th percentile detection latency in milliseconds
# TYPE detection_latency_p95_ms gauge
detection_latency_p95_ms {}

# HELP uptime_seconds Application uptime in seconds
# TYPE uptime_seconds counter
uptime_seconds {}
"#,
            snapshot.detections_total,
            snapshot.detections_ok,
            snapshot.detections_failed,
            snapshot.empty_results_total,
            snapshot.rate_limited_total,
            snapshot.latency_avg_ms,
            snapshot.latency_p95_ms,
            snapshot.uptime_seconds,
        );

        out.push_str("\n# HELP requests_total Requests received per endpoint\n# TYPE requests_total counter\n");
        for entry in self.inner.endpoint_counters.iter() {
            out.push_str(&format!(
                "requests_total{{endpoint=\"{}\"}} {}\n",
                entry.key(),
                entry.value().load(Ordering::Relaxed)
            ));
        }

        out
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub detections_total: usize,
    pub detections_ok: usize,
    pub detections_failed: usize,
    pub empty_results_total: usize,
    pub rate_limited_total: usize,
    pub latency_avg_ms: u64,
    pub latency_p50_ms: u64,
    pub latency_p95_ms: u64,
    pub uptime_seconds: u64,
}

fn percentile(values: &[u64], p: f64) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let idx = ((values.len() as f64 - 1.0) * p) as usize;
    sorted[idx]
}

fn avg(values: &[u64]) -> u64 {
    if values.is_empty() {
        return 0;
    }
    values.iter().sum::<u64>() / values.len() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = Metrics::new();

        metrics.record_detection(true, Duration::from_millis(100));
        metrics.record_detection(false, Duration::from_millis(50));
        metrics.record_empty_result();
        metrics.record_rate_limited();
        metrics.record_request("/api/detect-text");
        metrics.record_request("/api/detect-text");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.detections_total, 2);
        assert_eq!(snapshot.detections_ok, 1);
        assert_eq!(snapshot.detections_failed, 1);
        assert_eq!(snapshot.empty_results_total, 1);
        assert_eq!(snapshot.rate_limited_total, 1);
        assert_eq!(snapshot.latency_avg_ms, 75);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = Metrics::new();
        metrics.record_detection(true, Duration::from_millis(100));
        metrics.record_request("/api/health");

        let prometheus = metrics.to_prometheus();
        assert!(prometheus.contains("detections_total 1"));
        assert!(prometheus.contains("requests_total{endpoint=\"/api/health\"} 1"));
    }

    #[test]
    fn test_percentile_of_empty_is_zero() {
        assert_eq!(percentile(&[], 0.95), 0);
        assert_eq!(avg(&[]), 0);
    }
}
