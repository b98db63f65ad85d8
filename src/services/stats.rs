use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Route label used for requests that matched no registered route
pub const UNMATCHED_ROUTE: &str = "<unmatched>";

/// Process-wide request counters
pub struct RequestStats {
    started_at: chrono::DateTime<chrono::Utc>,
    started: Instant,
    total: AtomicU64,
    failed: AtomicU64,
    routes: Mutex<HashMap<String, u64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub failed_requests: u64,
    pub routes: BTreeMap<String, u64>,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            started_at: chrono::Utc::now(),
            started: Instant::now(),
            total: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            routes: Mutex::new(HashMap::new()),
        }
    }

    /// Count one finished request; `route` is the matched pattern, if any
    pub fn record(&self, route: Option<&str>, status: u16) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if status >= 400 {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }

        let route = route.unwrap_or(UNMATCHED_ROUTE);
        let mut routes = self.routes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *routes.entry(route.to_string()).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let routes = self
            .routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();

        StatsSnapshot {
            started_at: self.started_at,
            uptime_secs: self.started.elapsed().as_secs(),
            total_requests: self.total.load(Ordering::Relaxed),
            failed_requests: self.failed.load(Ordering::Relaxed),
            routes,
        }
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_routes_and_failures() {
        let stats = RequestStats::new();
        stats.record(Some("/random/waifu"), 200);
        stats.record(Some("/random/waifu"), 502);
        stats.record(None, 404);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.failed_requests, 2);
        assert_eq!(snapshot.routes.get("/random/waifu"), Some(&2));
        assert_eq!(snapshot.routes.get(UNMATCHED_ROUTE), Some(&1));
    }

    #[test]
    fn test_concurrent_recording() {
        let stats = std::sync::Arc::new(RequestStats::new());
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let stats = stats.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        stats.record(Some("/health"), 200);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_requests, 1000);
        assert_eq!(snapshot.routes.get("/health"), Some(&1000));
    }
}
