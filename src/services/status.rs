use crate::config::Settings;
use crate::core::health::{batches, classify, ProbeResult, ProbeStatus, StatusReport};
use crate::core::registry::{HttpMethod, ProbeTarget};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};

const REPORT_KEY: &str = "endpoints";

/// Probes scraper endpoints in fixed-size concurrent batches
///
/// The aggregate report is cached for `report_ttl`; callers arriving while a
/// run is in flight wait for that run instead of starting another.
pub struct EndpointChecker {
    http: Client,
    base_url: String,
    batch_size: usize,
    probe_timeout: Duration,
    reports: moka::future::Cache<&'static str, Arc<StatusReport>>,
}

impl EndpointChecker {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        batch_size: usize,
        probe_timeout: Duration,
        report_ttl: Duration,
    ) -> Self {
        let reports = moka::future::CacheBuilder::new(1)
            .time_to_live(report_ttl)
            .build();

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            batch_size: batch_size.max(1),
            probe_timeout,
            reports,
        }
    }

    /// Checker aimed at `settings.status_base_url()`
    pub fn from_settings(settings: &Settings) -> Result<Self, reqwest::Error> {
        // No client-wide timeout; each probe carries its own. Redirects are reported as-is.
        let http = Client::builder()
            .user_agent(format!("apihub-status/{}", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self::new(
            http,
            settings.status_base_url(),
            settings.status.batch_size,
            Duration::from_secs(settings.status.probe_timeout_secs),
            Duration::from_secs(settings.status.ttl_secs),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Cached report, or a fresh run when none is cached or `refresh` is set
    ///
    /// The flag is true when the report was served from cache.
    pub async fn report(&self, targets: Vec<ProbeTarget>, refresh: bool) -> (Arc<StatusReport>, bool) {
        if refresh {
            self.reports.invalidate(REPORT_KEY).await;
        }

        let entry = self
            .reports
            .entry(REPORT_KEY)
            .or_insert_with(async { Arc::new(self.check(&targets).await) })
            .await;

        let cached = !entry.is_fresh();
        (entry.into_value(), cached)
    }

    /// Probe every target; result order follows `targets`
    pub async fn check(&self, targets: &[ProbeTarget]) -> StatusReport {
        tracing::info!(
            "Checking {} endpoints against {} (batch size {}, timeout {:?})",
            targets.len(),
            self.base_url,
            self.batch_size,
            self.probe_timeout
        );

        let mut results = Vec::with_capacity(targets.len());

        for batch in batches(targets, self.batch_size) {
            let handles: Vec<_> = batch
                .iter()
                .cloned()
                .map(|target| {
                    let http = self.http.clone();
                    let base_url = self.base_url.clone();
                    let timeout = self.probe_timeout;
                    tokio::spawn(async move { probe(&http, &base_url, target, timeout).await })
                })
                .collect();

            for (handle, target) in handles.into_iter().zip(batch) {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!("Probe task for {} failed: {}", target.path, e);
                        failed(target, ProbeStatus::Error, 0, e.to_string())
                    }
                };
                results.push(result);
            }
        }

        let report = StatusReport::new(self.base_url.clone(), self.batch_size, results);
        tracing::info!(
            "Endpoint check finished: {}/{} online, {} offline, {} timeout, {} error",
            report.online,
            report.total,
            report.offline,
            report.timeout,
            report.error
        );
        report
    }
}

async fn probe(http: &Client, base_url: &str, target: ProbeTarget, timeout: Duration) -> ProbeResult {
    let url = format!("{}{}", base_url, target.path);
    let request = match target.method {
        HttpMethod::Get => http.get(&url),
        HttpMethod::Post => http.post(&url),
    }
    .query(&target.query);

    let started = Instant::now();
    let outcome = tokio::time::timeout(timeout, async {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok::<_, reqwest::Error>((status, body))
    })
    .await;
    let elapsed = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok((http_status, body))) => {
            let (status, error) = classify(http_status, &body);
            if status != ProbeStatus::Online {
                tracing::warn!("{} is {:?}: {}", target.path, status, error.as_deref().unwrap_or(""));
            }
            ProbeResult {
                path: target.path,
                method: target.method,
                category: target.category,
                status,
                http_status: Some(http_status),
                response_time_ms: elapsed,
                error,
            }
        }
        Ok(Err(e)) if e.is_timeout() => failed(&target, ProbeStatus::Timeout, elapsed, e.to_string()),
        Ok(Err(e)) => {
            tracing::warn!("{} probe failed: {}", target.path, e);
            failed(&target, ProbeStatus::Error, elapsed, e.to_string())
        }
        Err(_) => {
            tracing::warn!("{} probe timed out after {:?}", target.path, timeout);
            failed(
                &target,
                ProbeStatus::Timeout,
                elapsed,
                format!("timed out after {}ms", timeout.as_millis()),
            )
        }
    }
}

fn failed(target: &ProbeTarget, status: ProbeStatus, elapsed_ms: u64, error: String) -> ProbeResult {
    ProbeResult {
        path: target.path.clone(),
        method: target.method,
        category: target.category,
        status,
        http_status: None,
        response_time_ms: elapsed_ms,
        error: Some(error),
    }
}
