use crate::config::DatabaseSettings;
use crate::services::postgres::{PostgresClient, PostgresError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;

/// Visits kept by the in-memory backend
const MEMORY_LOG_CAPACITY: usize = 1000;

#[derive(Debug, Error)]
pub enum VisitorError {
    #[error("Database error: {0}")]
    Database(#[from] PostgresError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: uuid::Uuid,
    pub path: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub visited_at: DateTime<Utc>,
}

impl Visit {
    pub fn new(path: impl Into<String>, ip: Option<String>, user_agent: Option<String>, referrer: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            path: path.into(),
            ip,
            user_agent,
            referrer,
            visited_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorSummary {
    pub total: i64,
    pub today: i64,
    pub recent: Vec<Visit>,
}

/// Visitor counter and visit log, persisted or in memory
pub enum VisitorStore {
    Postgres(PostgresClient),
    Memory(MemoryVisitors),
}

impl VisitorStore {
    pub fn memory() -> Self {
        VisitorStore::Memory(MemoryVisitors::new(MEMORY_LOG_CAPACITY))
    }

    /// PostgreSQL when `database.url` is set, memory otherwise
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, VisitorError> {
        let Some(url) = settings.url.as_deref().filter(|u| !u.is_empty()) else {
            tracing::info!("No database configured, keeping visitor data in memory");
            return Ok(Self::memory());
        };

        let client = PostgresClient::new(
            url,
            settings.max_connections.unwrap_or(5),
            settings.min_connections.unwrap_or(1),
        )
        .await?;

        tracing::info!("Visitor data stored in PostgreSQL");
        Ok(VisitorStore::Postgres(client))
    }

    pub fn backend(&self) -> &'static str {
        match self {
            VisitorStore::Postgres(_) => "postgres",
            VisitorStore::Memory(_) => "memory",
        }
    }

    /// Count the visit and append it to the log; returns the new total
    pub async fn record(&self, visit: &Visit) -> Result<i64, VisitorError> {
        match self {
            VisitorStore::Postgres(pg) => Ok(pg.record_visit(visit).await?),
            VisitorStore::Memory(mem) => Ok(mem.record(visit)),
        }
    }

    pub async fn summary(&self, limit: u32) -> Result<VisitorSummary, VisitorError> {
        match self {
            VisitorStore::Postgres(pg) => Ok(pg.summary(limit).await?),
            VisitorStore::Memory(mem) => Ok(mem.summary(limit)),
        }
    }

    pub async fn health_check(&self) -> bool {
        match self {
            VisitorStore::Postgres(pg) => match pg.health_check().await {
                Ok(healthy) => healthy,
                Err(e) => {
                    tracing::warn!("Visitor database health check failed: {}", e);
                    false
                }
            },
            VisitorStore::Memory(_) => true,
        }
    }
}

struct MemoryState {
    total: i64,
    day: NaiveDate,
    today: i64,
    log: VecDeque<Visit>,
}

/// In-process backend used when no database is configured
pub struct MemoryVisitors {
    capacity: usize,
    state: Mutex<MemoryState>,
}

impl MemoryVisitors {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(MemoryState {
                total: 0,
                day: Utc::now().date_naive(),
                today: 0,
                log: VecDeque::new(),
            }),
        }
    }

    fn record(&self, visit: &Visit) -> i64 {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let day = visit.visited_at.date_naive();
        if day != state.day {
            state.day = day;
            state.today = 0;
        }
        state.today += 1;
        state.total += 1;

        if state.log.len() == self.capacity {
            state.log.pop_back();
        }
        state.log.push_front(visit.clone());

        state.total
    }

    fn summary(&self, limit: u32) -> VisitorSummary {
        let state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let today = if state.day == Utc::now().date_naive() { state.today } else { 0 };

        VisitorSummary {
            total: state.total,
            today,
            recent: state.log.iter().take(limit as usize).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(path: &str) -> Visit {
        Visit::new(path, Some("127.0.0.1".to_string()), Some("test-agent".to_string()), None)
    }

    #[tokio::test]
    async fn test_memory_store_counts_and_orders_recent_first() {
        let store = VisitorStore::memory();
        assert_eq!(store.backend(), "memory");

        assert_eq!(store.record(&visit("/a")).await.unwrap(), 1);
        assert_eq!(store.record(&visit("/b")).await.unwrap(), 2);
        assert_eq!(store.record(&visit("/c")).await.unwrap(), 3);

        let summary = store.summary(2).await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.today, 3);
        let paths: Vec<_> = summary.recent.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["/c", "/b"]);
        assert!(store.health_check().await);
    }

    #[test]
    fn test_memory_log_is_bounded_but_total_is_not() {
        let mem = MemoryVisitors::new(2);
        for i in 0..5 {
            mem.record(&visit(&format!("/{}", i)));
        }

        let summary = mem.summary(10);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.recent.len(), 2);
        assert_eq!(summary.recent[0].path, "/4");
    }

    #[test]
    fn test_today_resets_on_new_day() {
        let mem = MemoryVisitors::new(10);
        let mut old = visit("/old");
        old.visited_at = Utc::now() - chrono::Duration::days(2);
        mem.record(&old);
        mem.record(&visit("/new"));

        let summary = mem.summary(10);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.today, 1);
    }
}
