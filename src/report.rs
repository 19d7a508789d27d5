use std::fmt::Write;

use serde::Serialize;

use crate::controller::MetricsSnapshot;
use crate::derivation::{DerivedView, ParticipationNote};
use crate::format::{format_integer, format_one_decimal, format_percent, month_year_label, NO_DATA};
use crate::tone::{
    clamp_engagement, engagement_band, engagement_pill_label, engagement_tone, risk_tone,
    ENGAGEMENT_SCORE_MAX,
};

const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pill {
    pub label: String,
    pub tone: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: String,
    pub subtitle: String,
    pub tone: &'static str,
    pub pill: Option<Pill>,
}

fn value_or_no_data(value: Option<f64>, format: fn(f64) -> String) -> String {
    value.map(format).unwrap_or_else(|| NO_DATA.to_string())
}

pub fn participation_subtitle(view: &DerivedView) -> String {
    match view.participation_note() {
        ParticipationNote::Rate(rate) => format!("{} participation rate", format_percent(rate)),
        ParticipationNote::NoEnrolledEmployees => {
            format!("{} participation rate (no enrolled employees)", format_percent(0.0))
        }
        ParticipationNote::Unavailable => "Participation rate unavailable".to_string(),
    }
}

pub fn weekly_subtitle(view: &DerivedView) -> String {
    match view.avg_weekly_note() {
        Some(avg) => format!("Avg {} per active user", format_one_decimal(avg)),
        None => "Average per active user unavailable".to_string(),
    }
}

/// Text rendition of the engagement bar, e.g. `[##############------] 7.0 / 10`.
pub fn engagement_bar(score: f64) -> String {
    let clamped = clamp_engagement(score);
    let filled = ((clamped / ENGAGEMENT_SCORE_MAX) * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:.1} / {} engagement level ({})",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        clamped,
        ENGAGEMENT_SCORE_MAX,
        engagement_band(clamped).as_str()
    )
}

pub fn build_cards(view: &DerivedView) -> Vec<MetricCard> {
    let engagement = view.engagement_display;
    let risk = risk_tone(view.alerts_display);

    vec![
        MetricCard {
            title: "Average Engagement Score",
            value: engagement
                .map(|score| format!("{} / {}", format_one_decimal(score), ENGAGEMENT_SCORE_MAX))
                .unwrap_or_else(|| NO_DATA.to_string()),
            subtitle: engagement
                .map(engagement_bar)
                .unwrap_or_else(|| "Data unavailable".to_string()),
            tone: "engagement",
            pill: Some(Pill {
                label: engagement_pill_label(engagement).to_string(),
                tone: engagement_tone(engagement).as_str(),
            }),
        },
        MetricCard {
            title: "Total Enrolled",
            value: value_or_no_data(view.enrolled_display, format_integer),
            subtitle: if view.enrolled_display.is_some() {
                "Employees in program".to_string()
            } else {
                "Data unavailable".to_string()
            },
            tone: "neutral",
            pill: None,
        },
        MetricCard {
            title: "Active This Month",
            value: value_or_no_data(view.active_display, format_integer),
            subtitle: participation_subtitle(view),
            tone: "neutral",
            pill: None,
        },
        MetricCard {
            title: "Weekly Checkups",
            value: value_or_no_data(view.weekly_display, format_integer),
            subtitle: weekly_subtitle(view),
            tone: "neutral",
            pill: None,
        },
        MetricCard {
            title: "Risk Alerts Triggered",
            value: value_or_no_data(view.alerts_display, format_integer),
            subtitle: if view.alerts_display.is_some() {
                "Requires HR attention".to_string()
            } else {
                "Data unavailable".to_string()
            },
            tone: risk.tone.as_str(),
            pill: Some(Pill {
                label: risk.label.to_string(),
                tone: risk.tone.as_str(),
            }),
        },
    ]
}

#[derive(Serialize)]
struct DashboardJson<'a> {
    #[serde(flatten)]
    snapshot: &'a MetricsSnapshot,
    cards: Vec<MetricCard>,
}

/// Snapshot plus the rendered cards, for machine consumers.
pub fn dashboard_json(snapshot: &MetricsSnapshot) -> serde_json::Result<String> {
    let cards = if snapshot.loading || snapshot.has_error() {
        Vec::new()
    } else {
        build_cards(&snapshot.computed)
    };
    serde_json::to_string_pretty(&DashboardJson { snapshot, cards })
}

fn company_name(snapshot: &MetricsSnapshot) -> &str {
    snapshot
        .data
        .as_ref()
        .map(|data| data.company_name.as_str())
        .unwrap_or(NO_DATA)
}

/// Plain-text dashboard for a terminal.
pub fn render_dashboard(snapshot: &MetricsSnapshot) -> String {
    let mut output = String::new();
    let selector = snapshot.selector;

    let _ = writeln!(output, "{}", company_name(snapshot));
    let _ = writeln!(
        output,
        "Engagement Overview • {}",
        month_year_label(selector.year, selector.month)
    );
    let _ = writeln!(output);

    if snapshot.loading {
        let _ = writeln!(output, "Loading company metrics...");
    } else if snapshot.has_error() {
        let _ = writeln!(output, "Something went wrong");
        let _ = writeln!(output, "{}", snapshot.error);
        let _ = writeln!(output, "(type `reload` to retry)");
    } else {
        for card in build_cards(&snapshot.computed) {
            let pill = card
                .pill
                .as_ref()
                .map(|pill| format!("  [{}]", pill.label))
                .unwrap_or_default();
            let _ = writeln!(output, "{}{}", card.title, pill);
            let _ = writeln!(output, "  {}", card.value);
            let _ = writeln!(output, "  {}", card.subtitle);
        }
    }

    output
}

pub fn build_report(snapshot: &MetricsSnapshot) -> String {
    let mut output = String::new();
    let selector = snapshot.selector;

    let _ = writeln!(output, "# Engagement Overview: {}", company_name(snapshot));
    let _ = writeln!(
        output,
        "Reporting period {}",
        month_year_label(selector.year, selector.month)
    );
    let _ = writeln!(output);

    if snapshot.has_error() {
        let _ = writeln!(output, "## Metrics Unavailable");
        let _ = writeln!(output, "{}", snapshot.error);
        return output;
    }

    let _ = writeln!(output, "## Metrics");
    for card in build_cards(&snapshot.computed) {
        let pill = card
            .pill
            .as_ref()
            .map(|pill| format!(" ({})", pill.label))
            .unwrap_or_default();
        let _ = writeln!(
            output,
            "- **{}**: {}{}. {}",
            card.title, card.value, pill, card.subtitle
        );
    }

    output
}
