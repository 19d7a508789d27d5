use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use clap::ValueEnum;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::{CompanyMetricsResponse, MetricsRange, MetricsSelector, RawMetrics};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load company metrics. Please try again.";

const BASE_LATENCY: Duration = Duration::from_millis(600);
const LATENCY_JITTER_MS: u64 = 100;
const SLOW_EXTRA_LATENCY: Duration = Duration::from_millis(1400);

/// Failure of a metrics fetch. The `Display` text is shown to the user as is.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid month {0}: expected a value between 1 and 12.")]
    InvalidMonth(u32),

    #[error("{0}")]
    Unavailable(String),

    #[error("No company metrics recorded for {month}/{year}.")]
    NotFound { year: i32, month: u32 },

    #[error("Timed out after {}ms loading company metrics.", .0.as_millis())]
    Timeout(Duration),

    #[error("Failed to read metrics file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse metrics file: {0}")]
    Csv(#[from] csv::Error),
}

/// Provides company metrics for a reporting period.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch_company_metrics(
        &self,
        selector: MetricsSelector,
    ) -> Result<CompanyMetricsResponse, SourceError>;
}

fn ensure_valid(selector: MetricsSelector) -> Result<(), SourceError> {
    if selector.month_is_valid() {
        Ok(())
    } else {
        Err(SourceError::InvalidMonth(selector.month))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Scenario {
    #[default]
    Normal,
    Slow,
    Error,
    Zero,
    Missing,
}

pub fn canned_response(scenario: Scenario) -> Option<CompanyMetricsResponse> {
    let (company_id, company_name, metrics) = match scenario {
        Scenario::Error => return None,
        Scenario::Normal | Scenario::Slow => (
            "acme-001",
            "Acme Corp",
            RawMetrics {
                total_employees_enrolled: Some(148.0),
                active_this_month: Some(92.0),
                weekly_checkups_completed: Some(310.0),
                avg_engagement_score: Some(7.8),
                risk_alerts_triggered: Some(4.0),
            },
        ),
        Scenario::Zero => (
            "acme-002",
            "Zero Enrol Co",
            RawMetrics {
                total_employees_enrolled: Some(0.0),
                active_this_month: Some(0.0),
                weekly_checkups_completed: Some(0.0),
                avg_engagement_score: Some(0.0),
                risk_alerts_triggered: Some(0.0),
            },
        ),
        Scenario::Missing => (
            "acme-003",
            "Partial Data Ltd",
            RawMetrics {
                total_employees_enrolled: Some(148.0),
                avg_engagement_score: Some(7.2),
                ..RawMetrics::default()
            },
        ),
    };

    Some(CompanyMetricsResponse {
        company_id: company_id.to_string(),
        company_name: company_name.to_string(),
        range: None,
        metrics,
    })
}

/// Canned responses behind a simulated network delay.
pub struct MockMetricsSource {
    scenario: Scenario,
    seed: u64,
    simulate_latency: bool,
}

impl MockMetricsSource {
    pub fn new(scenario: Scenario, seed: u64) -> Self {
        Self {
            scenario,
            seed,
            simulate_latency: true,
        }
    }

    pub fn without_latency(mut self) -> Self {
        self.simulate_latency = false;
        self
    }

    /// 600ms plus up to 100ms of jitter, fixed for a given seed and selector.
    pub fn latency_for(&self, selector: MetricsSelector) -> Duration {
        if !self.simulate_latency {
            return Duration::ZERO;
        }
        let period = (selector.year as i64 * 12 + selector.month as i64) as u64;
        let mut rng = SmallRng::seed_from_u64(self.seed ^ period);
        let mut latency = BASE_LATENCY + Duration::from_millis(rng.gen_range(0..=LATENCY_JITTER_MS));
        if self.scenario == Scenario::Slow {
            latency += SLOW_EXTRA_LATENCY;
        }
        latency
    }
}

#[async_trait]
impl MetricsSource for MockMetricsSource {
    async fn fetch_company_metrics(
        &self,
        selector: MetricsSelector,
    ) -> Result<CompanyMetricsResponse, SourceError> {
        ensure_valid(selector)?;

        let latency = self.latency_for(selector);
        debug!(?selector, scenario = ?self.scenario, ?latency, "simulating metrics fetch");
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut response = canned_response(self.scenario)
            .ok_or_else(|| SourceError::Unavailable(LOAD_FAILED_MESSAGE.to_string()))?;
        response.range = Some(MetricsRange::Month {
            year: selector.year,
            month: selector.month,
        });
        Ok(response)
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    company_id: String,
    company_name: String,
    year: i32,
    month: u32,
    total_employees_enrolled: Option<f64>,
    active_this_month: Option<f64>,
    weekly_checkups_completed: Option<f64>,
    avg_engagement_score: Option<f64>,
    risk_alerts_triggered: Option<f64>,
}

impl From<CsvRow> for CompanyMetricsResponse {
    fn from(row: CsvRow) -> Self {
        CompanyMetricsResponse {
            company_id: row.company_id,
            company_name: row.company_name,
            range: Some(MetricsRange::Month {
                year: row.year,
                month: row.month,
            }),
            metrics: RawMetrics {
                total_employees_enrolled: row.total_employees_enrolled,
                active_this_month: row.active_this_month,
                weekly_checkups_completed: row.weekly_checkups_completed,
                avg_engagement_score: row.avg_engagement_score,
                risk_alerts_triggered: row.risk_alerts_triggered,
            },
        }
    }
}

/// Finds the first row for `selector` in CSV text. Empty cells are missing.
pub fn find_in_csv(
    reader: impl std::io::Read,
    selector: MetricsSelector,
) -> Result<CompanyMetricsResponse, SourceError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        if row.year == selector.year && row.month == selector.month {
            return Ok(row.into());
        }
    }

    Err(SourceError::NotFound {
        year: selector.year,
        month: selector.month,
    })
}

/// Reads monthly metrics exported to a CSV file.
pub struct CsvMetricsSource {
    path: PathBuf,
}

impl CsvMetricsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetricsSource for CsvMetricsSource {
    async fn fetch_company_metrics(
        &self,
        selector: MetricsSelector,
    ) -> Result<CompanyMetricsResponse, SourceError> {
        ensure_valid(selector)?;
        let data = tokio::fs::read(&self.path).await?;
        debug!(path = %self.path.display(), ?selector, "reading metrics csv");
        find_in_csv(data.as_slice(), selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
company_id,company_name,year,month,total_employees_enrolled,active_this_month,weekly_checkups_completed,avg_engagement_score,risk_alerts_triggered
acme-001,Acme Corp,2026,1,140,80,290,8.1,2
acme-001,Acme Corp,2026,2,148,,310,NaN,
";

    #[tokio::test]
    async fn mock_rejects_out_of_range_month() {
        let source = MockMetricsSource::new(Scenario::Normal, 7).without_latency();
        let err = source
            .fetch_company_metrics(MetricsSelector::new(2026, 13))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidMonth(13)));
    }

    #[tokio::test]
    async fn mock_error_scenario_uses_load_failed_message() {
        let source = MockMetricsSource::new(Scenario::Error, 7).without_latency();
        let err = source
            .fetch_company_metrics(MetricsSelector::new(2026, 3))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), LOAD_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn mock_missing_scenario_leaves_fields_absent() {
        let source = MockMetricsSource::new(Scenario::Missing, 7).without_latency();
        let response = source
            .fetch_company_metrics(MetricsSelector::new(2026, 3))
            .await
            .unwrap();
        assert_eq!(response.company_name, "Partial Data Ltd");
        assert_eq!(response.metrics.active_this_month, None);
        assert_eq!(response.metrics.weekly_checkups_completed, None);
        assert_eq!(response.metrics.risk_alerts_triggered, None);
        assert_eq!(
            response.range,
            Some(MetricsRange::Month {
                year: 2026,
                month: 3
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn mock_waits_for_simulated_latency() {
        let source = MockMetricsSource::new(Scenario::Normal, 42);
        let selector = MetricsSelector::new(2026, 5);
        let expected = source.latency_for(selector);

        let started = tokio::time::Instant::now();
        source.fetch_company_metrics(selector).await.unwrap();
        assert!(started.elapsed() >= expected);
    }

    #[test]
    fn latency_is_deterministic_and_bounded() {
        let source = MockMetricsSource::new(Scenario::Normal, 42);
        let selector = MetricsSelector::new(2026, 5);
        let latency = source.latency_for(selector);

        assert_eq!(latency, source.latency_for(selector));
        assert!(latency >= Duration::from_millis(600));
        assert!(latency <= Duration::from_millis(700));

        let slow = MockMetricsSource::new(Scenario::Slow, 42).latency_for(selector);
        assert_eq!(slow, latency + Duration::from_millis(1400));
    }

    #[test]
    fn csv_lookup_matches_selector() {
        let response = find_in_csv(CSV.as_bytes(), MetricsSelector::new(2026, 1)).unwrap();
        assert_eq!(response.company_id, "acme-001");
        assert_eq!(response.metrics.avg_engagement_score, Some(8.1));
        assert_eq!(response.metrics.risk_alerts_triggered, Some(2.0));
    }

    #[test]
    fn csv_empty_cells_are_missing() {
        let response = find_in_csv(CSV.as_bytes(), MetricsSelector::new(2026, 2)).unwrap();
        assert_eq!(response.metrics.total_employees_enrolled, Some(148.0));
        assert_eq!(response.metrics.active_this_month, None);
        assert_eq!(response.metrics.risk_alerts_triggered, None);
        assert!(response.metrics.avg_engagement_score.unwrap().is_nan());
    }

    #[test]
    fn csv_without_matching_row_is_not_found() {
        let err = find_in_csv(CSV.as_bytes(), MetricsSelector::new(2025, 12)).unwrap_err();
        assert_eq!(err.to_string(), "No company metrics recorded for 12/2025.");
    }

    #[tokio::test]
    async fn csv_source_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let source = CsvMetricsSource::new(file.path());
        let response = source
            .fetch_company_metrics(MetricsSelector::new(2026, 1))
            .await
            .unwrap();
        assert_eq!(response.metrics.total_employees_enrolled, Some(140.0));
    }

    #[tokio::test]
    async fn csv_source_reports_missing_file() {
        let source = CsvMetricsSource::new("/nonexistent/metrics.csv");
        let err = source
            .fetch_company_metrics(MetricsSelector::new(2026, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
