use std::fmt::Display;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::utils::http::truncate_for_log;

pub const TIMING_TARGET: &str = "fashion.timing";

#[derive(Debug)]
pub struct QueryTimer {
    command: String,
    text: Option<String>,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status: String,
    detail: Option<String>,
    completed: bool,
}

impl QueryTimer {
    pub fn new(command: &str, text: &str) -> Self {
        let text = text.replace('\n', " ");
        QueryTimer {
            command: command.to_string(),
            text: (!text.trim().is_empty()).then(|| truncate_for_log(&text, 300)),
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status: "success".to_string(),
            detail: None,
            completed: false,
        }
    }

    pub fn log_received(&self) {
        info!(
            target: TIMING_TARGET,
            "event=query_received command={} received_at={} text={:?}",
            self.command,
            self.started_at.to_rfc3339(),
            self.text
        );
    }

    pub fn mark_status(&mut self, status: &str, detail: Option<String>) {
        self.status = status.to_string();
        self.detail = detail;
    }

    pub fn log_completed(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let completed_at = Utc::now();
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: TIMING_TARGET,
            "event=query_completed command={} started_at={} completed_at={} duration_s={:.3} status={} detail={}",
            self.command,
            self.started_at.to_rfc3339(),
            completed_at.to_rfc3339(),
            duration,
            self.status,
            self.detail.clone().unwrap_or_default()
        );
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        self.log_completed();
    }
}

pub fn start_query_timer(command: &str, text: &str) -> QueryTimer {
    let timer = QueryTimer::new(command, text);
    timer.log_received();
    timer
}

pub async fn log_provider_timing<T, E, F, Fut>(
    provider: &str,
    operation: &str,
    attempt: usize,
    call: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    info!(
        target: TIMING_TARGET,
        "event=provider_request provider={} operation={} attempt={} started_at={}",
        provider,
        operation,
        attempt,
        started_at.to_rfc3339()
    );

    let result = call().await;
    let status = match &result {
        Ok(_) => "success".to_string(),
        Err(err) => format!("error: {}", truncate_for_log(&err.to_string(), 200)),
    };

    let completed_at = Utc::now();
    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: TIMING_TARGET,
        "event=provider_response provider={} operation={} attempt={} completed_at={} duration_s={:.3} status={}",
        provider,
        operation,
        attempt,
        completed_at.to_rfc3339(),
        duration,
        status
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn provider_timing_passes_result_through() {
        let ok: Result<u8, String> = log_provider_timing("test", "op", 1, || async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));

        let err: Result<u8, String> =
            log_provider_timing("test", "op", 2, || async { Err("boom".to_string()) }).await;
        assert_eq!(err, Err("boom".to_string()));
    }

    #[test]
    fn timer_completes_once() {
        let mut timer = QueryTimer::new("trend", "y2k\nlook");
        assert_eq!(timer.text.as_deref(), Some("y2k look"));
        timer.mark_status("error", Some("missing key".to_string()));
        timer.log_completed();
        assert!(timer.completed);
    }
}
