//! Completed-operation records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Summary of one finished operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogStats {
    /// Entry point that ran the operation ("Execute", "GetCellInfo", ...)
    pub method: String,
    /// Statement type ("select", "update", "get", ...)
    pub stmt_type: String,
    /// Free-form operation text: a query, or the path it touched
    pub text: String,
    pub session_id: String,
    pub effective_caller: String,
    pub immediate_caller: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub plan_time: Duration,
    pub execute_time: Duration,
    pub commit_time: Duration,
    pub shard_queries: u64,
    pub rows_affected: u64,
    pub error: Option<String>,
}

impl LogStats {
    /// A record started now, to be finished with [`LogStats::finish`].
    pub fn new(method: impl Into<String>, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            method: method.into(),
            stmt_type: String::new(),
            text: text.into(),
            session_id: Uuid::new_v4().to_string(),
            effective_caller: String::new(),
            immediate_caller: String::new(),
            start_time: now,
            end_time: now,
            plan_time: Duration::ZERO,
            execute_time: Duration::ZERO,
            commit_time: Duration::ZERO,
            shard_queries: 0,
            rows_affected: 0,
            error: None,
        }
    }

    pub fn with_stmt_type(mut self, stmt_type: impl Into<String>) -> Self {
        self.stmt_type = stmt_type.into();
        self
    }

    pub fn with_callers(
        mut self,
        effective: impl Into<String>,
        immediate: impl Into<String>,
    ) -> Self {
        self.effective_caller = effective.into();
        self.immediate_caller = immediate.into();
        self
    }

    /// Stamp the end time and the outcome.
    pub fn finish<T>(&mut self, outcome: &crate::Result<T>) {
        self.end_time = Utc::now();
        self.execute_time = self.total_time();
        self.error = outcome.as_ref().err().map(|e| e.to_string());
    }

    /// Wall time between start and end; zero if the clock went backwards.
    pub fn total_time(&self) -> Duration {
        (self.end_time - self.start_time).to_std().unwrap_or(Duration::ZERO)
    }
}
