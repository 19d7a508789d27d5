use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod controller;
mod derivation;
mod format;
mod models;
mod report;
mod source;
mod theme;
mod tone;

use controller::{ControllerConfig, MetricsController, MetricsSnapshot};
use models::MetricsSelector;
use source::{CsvMetricsSource, MetricsSource, MockMetricsSource, Scenario};
use theme::ThemeStore;

#[derive(Parser)]
#[command(name = "engagement-dashboard")]
#[command(about = "Company engagement metrics dashboard for HR teams", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    /// File holding the light/dark display preference
    #[arg(
        long,
        env = "DASHBOARD_THEME_FILE",
        default_value = ".dashboard-theme.json",
        global = true
    )]
    theme_file: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Canned response served by the mock source
    #[arg(long, value_enum, env = "DASHBOARD_SCENARIO", default_value_t = Scenario::Normal, global = true)]
    scenario: Scenario,
    /// Read monthly metrics from a CSV file instead of the mock source
    #[arg(long, env = "DASHBOARD_METRICS_CSV", global = true)]
    csv: Option<PathBuf>,
    #[arg(long, env = "DASHBOARD_LATENCY_SEED", default_value_t = 7, global = true)]
    seed: u64,
    /// Answer mock requests immediately
    #[arg(long, global = true)]
    no_latency: bool,
    #[arg(long, env = "DASHBOARD_FETCH_TIMEOUT_MS", global = true)]
    fetch_timeout_ms: Option<u64>,
}

#[derive(Args)]
struct PeriodArgs {
    /// Reporting year (defaults to the current year)
    #[arg(long)]
    year: Option<i32>,
    /// Reporting month 1-12 (defaults to the current month)
    #[arg(long)]
    month: Option<u32>,
}

impl PeriodArgs {
    fn selector(&self) -> MetricsSelector {
        let current = MetricsSelector::current();
        MetricsSelector::new(
            self.year.unwrap_or(current.year),
            self.month.unwrap_or(current.month),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load one month and print the dashboard
    Show {
        #[command(flatten)]
        period: PeriodArgs,
        /// Print the raw snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a markdown report for one month
    Report {
        #[command(flatten)]
        period: PeriodArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Interactive dashboard driven by stdin commands
    Watch {
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Show or toggle the display theme
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

#[derive(Debug, PartialEq)]
enum WatchCommand {
    Select(MetricsSelector),
    Reload,
    Quit,
}

/// Accepts `YYYY MM`, `MM`, `reload` or `quit`.
fn parse_watch_command(line: &str, current: MetricsSelector) -> Result<WatchCommand, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["reload"] | ["retry"] => Ok(WatchCommand::Reload),
        ["quit"] | ["exit"] => Ok(WatchCommand::Quit),
        [month] => {
            let month = month
                .parse()
                .map_err(|_| format!("unrecognised command: {line}"))?;
            Ok(WatchCommand::Select(MetricsSelector::new(current.year, month)))
        }
        [year, month] => {
            let year = year.parse().map_err(|_| format!("invalid year: {year}"))?;
            let month = month.parse().map_err(|_| format!("invalid month: {month}"))?;
            Ok(WatchCommand::Select(MetricsSelector::new(year, month)))
        }
        _ => Err("expected `YYYY MM`, `MM`, `reload` or `quit`".to_string()),
    }
}

fn build_source(args: &SourceArgs) -> Arc<dyn MetricsSource> {
    match &args.csv {
        Some(path) => {
            let source = CsvMetricsSource::new(path);
            info!(path = %source.path().display(), "using csv metrics source");
            Arc::new(source)
        }
        None => {
            let mock = MockMetricsSource::new(args.scenario, args.seed);
            info!(scenario = ?args.scenario, seed = args.seed, "using mock metrics source");
            if args.no_latency {
                Arc::new(mock.without_latency())
            } else {
                Arc::new(mock)
            }
        }
    }
}

fn controller_config(args: &SourceArgs) -> ControllerConfig {
    ControllerConfig {
        fetch_timeout: args.fetch_timeout_ms.map(Duration::from_millis),
    }
}

async fn load_once(source: &SourceArgs, selector: MetricsSelector) -> anyhow::Result<MetricsSnapshot> {
    let controller = MetricsController::new(build_source(source), selector, controller_config(source));
    let mut rx = controller.subscribe();
    let snapshot = rx
        .wait_for(|snapshot| !snapshot.loading)
        .await
        .context("metrics controller stopped before the request settled")?
        .clone();
    Ok(snapshot)
}

async fn watch(source: &SourceArgs, selector: MetricsSelector) -> anyhow::Result<()> {
    let controller = MetricsController::new(build_source(source), selector, controller_config(source));
    let mut rx = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let current_year = MetricsSelector::current().year;
    let years: Vec<String> = format::selectable_years(current_year)
        .iter()
        .map(i32::to_string)
        .collect();
    let months: Vec<String> = (1..=12).map(format::month_label).collect();
    println!("Years: {}", years.join(", "));
    println!("Months: {}", months.join(" "));
    println!("Commands: `YYYY MM`, `MM`, `reload`, `quit`");
    println!();
    print!("{}", report::render_dashboard(&rx.borrow_and_update()));

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                println!();
                print!("{}", report::render_dashboard(&snapshot));
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_watch_command(&line, controller.selector()) {
                    Ok(WatchCommand::Select(next)) => controller.set_selector(next.year, next.month),
                    Ok(WatchCommand::Reload) => controller.reload(),
                    Ok(WatchCommand::Quit) => break,
                    Err(message) => eprintln!("{message}"),
                }
            }
        }
    }

    controller.teardown();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show { period, json } => {
            let snapshot = load_once(&cli.source, period.selector()).await?;
            if json {
                println!("{}", report::dashboard_json(&snapshot)?);
            } else {
                print!("{}", report::render_dashboard(&snapshot));
            }
        }
        Commands::Report { period, out } => {
            let snapshot = load_once(&cli.source, period.selector()).await?;
            let report = report::build_report(&snapshot);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Watch { period } => {
            watch(&cli.source, period.selector()).await?;
        }
        Commands::Theme { toggle } => {
            let store = ThemeStore::new(&cli.theme_file);
            let theme = if toggle { store.toggle()? } else { store.load() };
            println!("Theme: {} ({})", theme.as_str(), store.path().display());
        }
    }

    Ok(())
}
