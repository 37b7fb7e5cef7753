//! Dashboard figures: monthly count and the recent-risk chart.
//!
//! Operates on a user's assessments as listed by the repository, newest
//! first. Everything here is pure so the clock is passed in.

use chrono::{Datelike, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::repository::{list_assessments_for_user, take_welcome_flag};
use crate::db::DatabaseError;
use crate::models::Assessment;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Number of most recent assessments plotted on the chart.
pub const CHART_POINTS: usize = 7;

/// Label format for chart points, e.g. "Mar 07".
const CHART_LABEL_FORMAT: &str = "%b %d";

/// Recent risk levels, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskChart {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    /// True exactly once after signup.
    pub show_animation: bool,
    pub assessments: Vec<Assessment>,
    pub monthly_assessments: usize,
    pub chart: RiskChart,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Assessments dated in the same UTC year and month as `now`.
pub fn count_in_month(assessments: &[Assessment], now: NaiveDateTime) -> usize {
    assessments
        .iter()
        .filter(|a| a.date.year() == now.year() && a.date.month() == now.month())
        .count()
}

/// Chart of the newest [`CHART_POINTS`] assessments in chronological order.
/// Expects `assessments` newest first.
pub fn risk_chart(assessments: &[Assessment]) -> RiskChart {
    let recent: Vec<&Assessment> = assessments.iter().take(CHART_POINTS).rev().collect();
    RiskChart {
        labels: recent
            .iter()
            .map(|a| a.date.format(CHART_LABEL_FORMAT).to_string())
            .collect(),
        data: recent.iter().map(|a| a.risk_level).collect(),
    }
}

/// Everything the dashboard shows for `user_id`. Consumes the welcome flag.
pub fn load_dashboard(
    conn: &Connection,
    user_id: i64,
    now: NaiveDateTime,
) -> Result<DashboardData, DatabaseError> {
    let show_animation = take_welcome_flag(conn, user_id)?;
    let assessments = list_assessments_for_user(conn, user_id)?;
    let monthly_assessments = count_in_month(&assessments, now);
    let chart = risk_chart(&assessments);

    Ok(DashboardData {
        show_animation,
        assessments,
        monthly_assessments,
        chart,
    })
}
