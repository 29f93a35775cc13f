use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Point-in-time copy of the request statistics, times in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub total_time: f64,
    /// `None` until the first request completes
    pub min_time: Option<f64>,
    pub max_time: Option<f64>,
    pub avg_time: Option<f64>,
    /// When the aggregator started counting
    pub since: DateTime<Utc>,
}

impl StatsSnapshot {
    pub fn empty(since: DateTime<Utc>) -> Self {
        Self {
            total_requests: 0,
            total_time: 0.0,
            min_time: None,
            max_time: None,
            avg_time: None,
            since,
        }
    }
}
