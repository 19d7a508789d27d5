use serde::Serialize;

use crate::models::RawMetrics;

/// A metric value for on-screen text. `None` is the "no data" marker and is
/// never replaced by a default.
pub type DisplayValue = Option<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedView {
    pub enrolled_display: DisplayValue,
    pub active_display: DisplayValue,
    pub weekly_display: DisplayValue,
    pub engagement_display: DisplayValue,
    pub alerts_display: DisplayValue,
    pub enrolled_calc: f64,
    pub active_calc: f64,
    pub weekly_calc: f64,
    pub participation_rate: f64,
    pub avg_weekly_per_active: f64,
    pub participation_is_meaningful: bool,
    pub avg_weekly_is_meaningful: bool,
}

/// How the participation rate should be presented.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticipationNote {
    Rate(f64),
    /// Enrolled was reported as exactly zero.
    NoEnrolledEmployees,
    Unavailable,
}

pub fn display(value: Option<f64>) -> DisplayValue {
    value.filter(|v| v.is_finite())
}

/// Arithmetic-safe value: missing, non-finite and negative inputs become 0.
pub fn calc(value: Option<f64>) -> f64 {
    display(value).map_or(0.0, |v| v.max(0.0))
}

pub fn derive_view(metrics: &RawMetrics) -> DerivedView {
    let enrolled_display = display(metrics.total_employees_enrolled);
    let active_display = display(metrics.active_this_month);
    let weekly_display = display(metrics.weekly_checkups_completed);

    let enrolled_calc = calc(metrics.total_employees_enrolled);
    let active_calc = calc(metrics.active_this_month);
    let weekly_calc = calc(metrics.weekly_checkups_completed);

    let participation_rate = if enrolled_calc > 0.0 {
        active_calc / enrolled_calc
    } else {
        0.0
    };
    let avg_weekly_per_active = if active_calc > 0.0 {
        weekly_calc / active_calc
    } else {
        0.0
    };

    DerivedView {
        enrolled_display,
        active_display,
        weekly_display,
        engagement_display: display(metrics.avg_engagement_score),
        alerts_display: display(metrics.risk_alerts_triggered),
        enrolled_calc,
        active_calc,
        weekly_calc,
        participation_rate,
        avg_weekly_per_active,
        participation_is_meaningful: enrolled_calc > 0.0 && active_display.is_some(),
        avg_weekly_is_meaningful: active_calc > 0.0 && weekly_display.is_some(),
    }
}

impl DerivedView {
    pub fn participation_note(&self) -> ParticipationNote {
        if self.participation_is_meaningful {
            ParticipationNote::Rate(self.participation_rate)
        } else if self.enrolled_display == Some(0.0) {
            ParticipationNote::NoEnrolledEmployees
        } else {
            ParticipationNote::Unavailable
        }
    }

    pub fn avg_weekly_note(&self) -> Option<f64> {
        self.avg_weekly_is_meaningful
            .then_some(self.avg_weekly_per_active)
    }
}
