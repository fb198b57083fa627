use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use safe_transfer::domain::{Coordinates, Route};
use safe_transfer::history::{HistoricalModels, HistoryError, HistoryPaths};
use safe_transfer::odsay::{MockOdsayClient, OdsayClient, OdsayConfig, ProviderError};
use safe_transfer::planner::{
    DirectionsProvider, EngineConfig, LineDetailProvider, PlanError, PlanOutcome, PlanReport,
    Planner, RankMode, RiskLevel, select,
};

const USAGE: &str = "usage: safe-transfer <start-x> <start-y> <end-x> <end-y> [safest|riskiest|fastest] [top-n]";

/// Accepted formats for `SAFE_TRANSFER_NOW`.
const NOW_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}\n{USAGE}")]
    Usage(String),

    #[error("invalid SAFE_TRANSFER_NOW {0:?}, expected YYYY-MM-DDTHH:MM:SS")]
    Now(String),

    #[error("failed to load historical data: {0}")]
    History(#[from] HistoryError),

    #[error("failed to create provider client: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

struct Args {
    origin: Coordinates,
    destination: Coordinates,
    mode: RankMode,
    top_n: usize,
}

impl Args {
    fn parse(args: &[String]) -> Result<Self, CliError> {
        if !(4..=6).contains(&args.len()) {
            return Err(CliError::Usage("wrong number of arguments".into()));
        }

        let coord = |i: usize| -> Result<f64, CliError> {
            args[i]
                .parse()
                .map_err(|_| CliError::Usage(format!("invalid coordinate {:?}", args[i])))
        };

        let mode = match args.get(4) {
            Some(mode) => mode.parse().map_err(CliError::Usage)?,
            None => RankMode::default(),
        };
        let top_n = match args.get(5) {
            Some(n) => n
                .parse()
                .map_err(|_| CliError::Usage(format!("invalid top-n {n:?}")))?,
            None => 3,
        };

        Ok(Self {
            origin: Coordinates::new(coord(0)?, coord(1)?),
            destination: Coordinates::new(coord(2)?, coord(3)?),
            mode,
            top_n,
        })
    }
}

fn parse_now(value: Option<String>) -> Result<NaiveDateTime, CliError> {
    let Some(value) = value else {
        return Ok(chrono::Local::now().naive_local());
    };
    NOW_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value.trim(), format).ok())
        .ok_or(CliError::Now(value))
}

#[derive(Serialize)]
struct RankedRoute<'a> {
    rank: usize,
    risk_level: RiskLevel,
    /// Historical rows missing while predicting, stops before boarding included.
    warnings: u32,
    #[serde(flatten)]
    route: &'a Route,
}

fn ranked(routes: &[Route]) -> Vec<RankedRoute<'_>> {
    routes
        .iter()
        .enumerate()
        .map(|(i, route)| RankedRoute {
            rank: i + 1,
            risk_level: RiskLevel::of(route.risk_score.unwrap_or(0.0)),
            warnings: route.warning_count(),
            route,
        })
        .collect()
}

#[derive(Serialize)]
struct Output<'a> {
    mode: RankMode,
    departure: NaiveDateTime,
    report: &'a PlanReport,
    routes: Vec<RankedRoute<'a>>,
}

async fn plan_trip<P: LineDetailProvider + DirectionsProvider>(
    provider: &P,
    models: &HistoricalModels,
    config: &EngineConfig,
    args: &Args,
    now: NaiveDateTime,
) -> Result<PlanOutcome, PlanError> {
    Planner::new(provider, models, config)
        .plan_trip(args.origin, args.destination, now, args.mode)
        .await
}

async fn run() -> Result<(), CliError> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = Args::parse(&argv)?;
    let now = parse_now(std::env::var("SAFE_TRANSFER_NOW").ok())?;

    let data_dir = PathBuf::from(
        std::env::var("SAFE_TRANSFER_DATA_DIR").unwrap_or_else(|_| "data".to_string()),
    );
    let models = HistoricalModels::load(&HistoryPaths::in_dir(&data_dir))?;
    let config = EngineConfig::new();

    let outcome = match std::env::var("SAFE_TRANSFER_MOCK_DIR") {
        Ok(mock_dir) => {
            info!(%mock_dir, "using recorded provider responses");
            let provider = MockOdsayClient::from_dir(&mock_dir)?;
            plan_trip(&provider, &models, &config, &args, now).await?
        }
        Err(_) => {
            let api_key = std::env::var("ODSAY_API_KEY").unwrap_or_else(|_| {
                warn!("ODSAY_API_KEY is not set, provider requests will be rejected");
                String::new()
            });
            let provider = OdsayClient::new(OdsayConfig::new(api_key))?;
            plan_trip(&provider, &models, &config, &args, now).await?
        }
    };

    let routes = select(outcome.routes, args.mode, args.top_n);
    let output = Output {
        mode: args.mode,
        departure: now,
        report: &outcome.report,
        routes: ranked(&routes),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
