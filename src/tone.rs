use serde::Serialize;

use crate::derivation::DisplayValue;

pub const ENGAGEMENT_SCORE_MAX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskTone {
    Neutral,
    RiskLow,
    RiskModerate,
    RiskHigh,
}

impl RiskTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTone::Neutral => "neutral",
            RiskTone::RiskLow => "riskLow",
            RiskTone::RiskModerate => "riskModerate",
            RiskTone::RiskHigh => "riskHigh",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub tone: RiskTone,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EngagementTone {
    Neutral,
    Engagement,
}

impl EngagementTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementTone::Neutral => "neutral",
            EngagementTone::Engagement => "engagement",
        }
    }
}

/// Fill band of the engagement bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementBand {
    Strong,
    Steady,
    Low,
}

impl EngagementBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementBand::Strong => "strong",
            EngagementBand::Steady => "steady",
            EngagementBand::Low => "low",
        }
    }
}

/// Thresholds are inclusive lower bounds checked from high to low.
pub fn risk_tone(alerts: DisplayValue) -> RiskAssessment {
    let (tone, label) = match alerts.filter(|a| a.is_finite()) {
        None => (RiskTone::Neutral, "Unavailable"),
        Some(a) if a >= 7.0 => (RiskTone::RiskHigh, "High Concern"),
        Some(a) if a >= 4.0 => (RiskTone::RiskModerate, "Moderate Concern"),
        Some(a) if a >= 1.0 => (RiskTone::RiskLow, "Low Concern"),
        Some(_) => (RiskTone::Neutral, "No Active Alerts"),
    };
    RiskAssessment { tone, label }
}

pub fn engagement_tone(score: DisplayValue) -> EngagementTone {
    match score {
        Some(s) if s >= 8.0 => EngagementTone::Engagement,
        _ => EngagementTone::Neutral,
    }
}

pub fn engagement_pill_label(score: DisplayValue) -> &'static str {
    match score.filter(|s| s.is_finite()) {
        None => "Unavailable",
        Some(s) if s >= 8.0 => "Strong Engagement",
        Some(_) => "Needs Improvement",
    }
}

pub fn clamp_engagement(score: f64) -> f64 {
    score.clamp(0.0, ENGAGEMENT_SCORE_MAX)
}

pub fn engagement_band(score: f64) -> EngagementBand {
    let clamped = clamp_engagement(score);
    if clamped >= 8.0 {
        EngagementBand::Strong
    } else if clamped >= 6.0 {
        EngagementBand::Steady
    } else {
        EngagementBand::Low
    }
}
