//! Route filtering and ranking.
//!
//! Routes with missing predictions are dropped, the rest are ordered by
//! the requested criterion. All sorts are stable, so ties keep the
//! provider's order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::Route;

/// Ranking criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMode {
    /// Lowest risk first.
    #[default]
    Safest,
    /// Highest risk first.
    Riskiest,
    /// Shortest total time first.
    Fastest,
}

impl FromStr for RankMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "safest" => Ok(RankMode::Safest),
            "riskiest" => Ok(RankMode::Riskiest),
            "fastest" => Ok(RankMode::Fastest),
            other => Err(format!(
                "unknown rank mode {other:?} (expected safest, riskiest or fastest)"
            )),
        }
    }
}

impl fmt::Display for RankMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RankMode::Safest => "safest",
            RankMode::Riskiest => "riskiest",
            RankMode::Fastest => "fastest",
        };
        f.write_str(name)
    }
}

/// Presentation band of a route's risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    Normal,
    Unsafe,
    Risky,
}

impl RiskLevel {
    pub fn of(risk_score: f64) -> Self {
        if risk_score <= 3.1 {
            RiskLevel::Safe
        } else if risk_score <= 6.1 {
            RiskLevel::Normal
        } else if risk_score <= 9.1 {
            RiskLevel::Unsafe
        } else {
            RiskLevel::Risky
        }
    }
}

/// Keep only routes whose every transit station has a prediction.
///
/// Returns the kept routes and the number dropped.
pub fn filter_complete(routes: Vec<Route>) -> (Vec<Route>, usize) {
    let before = routes.len();
    let kept: Vec<Route> = routes.into_iter().filter(Route::is_complete).collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

fn by_risk(a: &Route, b: &Route) -> Ordering {
    let (a_score, a_mean) = a.risk_key();
    let (b_score, b_mean) = b.risk_key();
    a_score
        .total_cmp(&b_score)
        .then_with(|| a_mean.total_cmp(&b_mean))
}

/// Order routes by `mode`.
pub fn rank(mut routes: Vec<Route>, mode: RankMode) -> Vec<Route> {
    match mode {
        RankMode::Safest => routes.sort_by(by_risk),
        RankMode::Riskiest => routes.sort_by(|a, b| by_risk(b, a)),
        RankMode::Fastest => routes.sort_by_key(Route::total_time),
    }
    routes
}

/// The best `top_n` routes by `mode`.
pub fn select(routes: Vec<Route>, mode: RankMode, top_n: usize) -> Vec<Route> {
    let mut ranked = rank(routes, mode);
    ranked.truncate(top_n);
    ranked
}
