use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Reporting period requested from a metrics source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricsSelector {
    pub year: i32,
    pub month: u32,
}

impl MetricsSelector {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn current() -> Self {
        let today = Utc::now().date_naive();
        Self::new(today.year(), today.month())
    }

    pub fn month_is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetrics {
    #[serde(default)]
    pub total_employees_enrolled: Option<f64>,
    #[serde(default)]
    pub active_this_month: Option<f64>,
    #[serde(default)]
    pub weekly_checkups_completed: Option<f64>,
    #[serde(default)]
    pub avg_engagement_score: Option<f64>,
    #[serde(default)]
    pub risk_alerts_triggered: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricsRange {
    Month { year: i32, month: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMetricsResponse {
    pub company_id: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<MetricsRange>,
    pub metrics: RawMetrics,
}
