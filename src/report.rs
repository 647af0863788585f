//! Descriptive rollups over an indicator table
//!
//! Read-only filtering plus the sums, means and rankings the dashboard
//! displays. Absent cells are skipped by every rollup.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::{Error, Result};
use crate::indicators::{ATTENDED_CALLS, AVERAGE_HANDLING_TIME, SATISFACTION_SCORE};
use crate::models::{Dimension, IndicatorRow, IndicatorTable};

/// Date bounds are inclusive; `None` means no filter on that field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub business_line: Option<String>,
    pub state: Option<String>,
}

impl ReportFilter {
    pub fn matches(&self, row: &IndicatorRow) -> bool {
        let key = &row.key;
        self.start.map_or(true, |s| key.date >= s)
            && self.end.map_or(true, |e| key.date <= e)
            && self.business_line.as_ref().map_or(true, |b| &key.business_line == b)
            && self.state.as_ref().map_or(true, |s| &key.state == s)
    }
}

pub fn filter_rows<'a>(table: &'a IndicatorTable, filter: &ReportFilter) -> Vec<&'a IndicatorRow> {
    table.rows.iter().filter(|r| filter.matches(r)).collect()
}

pub fn sum(rows: &[&IndicatorRow], indicator: &str) -> f64 {
    rows.iter().filter_map(|r| r.value(indicator)).sum()
}

pub fn mean(rows: &[&IndicatorRow], indicator: &str) -> Option<f64> {
    let values: Vec<f64> = rows.iter().filter_map(|r| r.value(indicator)).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn distinct_count(rows: &[&IndicatorRow], dimension: Dimension) -> usize {
    rows.iter()
        .map(|r| r.key.get(dimension))
        .collect::<BTreeSet<_>>()
        .len()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rollup {
    Sum,
    Mean,
}

impl FromStr for Rollup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(Rollup::Sum),
            "mean" | "avg" => Ok(Rollup::Mean),
            _ => Err(Error::UnknownRollup(s.to_string())),
        }
    }
}

impl fmt::Display for Rollup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rollup::Sum => f.write_str("sum"),
            Rollup::Mean => f.write_str("mean"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupValue {
    pub group: String,
    pub value: Option<f64>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    sum: f64,
    present: usize,
}

impl Tally {
    fn rollup(&self, op: Rollup) -> Option<f64> {
        match op {
            Rollup::Sum => Some(self.sum),
            Rollup::Mean if self.present == 0 => None,
            Rollup::Mean => Some(self.sum / self.present as f64),
        }
    }
}

fn tally_by(rows: &[&IndicatorRow], dimension: Dimension, indicator: &str) -> BTreeMap<String, Tally> {
    let mut groups: BTreeMap<String, Tally> = BTreeMap::new();
    for row in rows {
        let tally = groups.entry(row.key.get(dimension)).or_default();
        if let Some(v) = row.value(indicator) {
            tally.sum += v;
            tally.present += 1;
        }
    }
    groups
}

/// One value per group label, sorted by label
pub fn group_by(rows: &[&IndicatorRow], dimension: Dimension, indicator: &str, op: Rollup) -> Vec<GroupValue> {
    tally_by(rows, dimension, indicator)
        .into_iter()
        .map(|(group, tally)| GroupValue {
            group,
            value: tally.rollup(op),
        })
        .collect()
}

pub fn group_sum(rows: &[&IndicatorRow], dimension: Dimension, indicator: &str) -> Vec<GroupValue> {
    group_by(rows, dimension, indicator, Rollup::Sum)
}

pub fn group_mean(rows: &[&IndicatorRow], dimension: Dimension, indicator: &str) -> Vec<GroupValue> {
    group_by(rows, dimension, indicator, Rollup::Mean)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupShare {
    pub group: String,
    pub value: f64,
    /// Fraction of the total, 0.0 to 1.0
    pub share: f64,
}

pub fn share_by(rows: &[&IndicatorRow], dimension: Dimension, indicator: &str) -> Vec<GroupShare> {
    let groups = tally_by(rows, dimension, indicator);
    let total: f64 = groups.values().map(|t| t.sum).sum();
    groups
        .into_iter()
        .map(|(group, tally)| GroupShare {
            group,
            value: tally.sum,
            share: if total > 0.0 { tally.sum / total } else { 0.0 },
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedGroup {
    pub group: String,
    /// Sum for the ranking indicator, mean for every other one, rounded to 2 places
    pub values: BTreeMap<String, Option<f64>>,
}

/// Top `n` groups by the summed ranking indicator, largest first
pub fn top_by(
    rows: &[&IndicatorRow],
    dimension: Dimension,
    indicators: &[String],
    rank_indicator: &str,
    n: usize,
) -> Vec<RankedGroup> {
    let ranking = tally_by(rows, dimension, rank_indicator);
    let others: Vec<(&String, BTreeMap<String, Tally>)> = indicators
        .iter()
        .filter(|i| i.as_str() != rank_indicator)
        .map(|i| (i, tally_by(rows, dimension, i)))
        .collect();

    let mut ordered: Vec<(String, f64)> = ranking.into_iter().map(|(g, t)| (g, t.sum)).collect();
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    ordered
        .into_iter()
        .take(n)
        .map(|(group, total)| {
            let mut values = BTreeMap::new();
            values.insert(rank_indicator.to_string(), Some(round2(total)));
            for (indicator, tallies) in &others {
                let v = tallies.get(&group).and_then(|t| t.rollup(Rollup::Mean)).map(round2);
                values.insert((*indicator).clone(), v);
            }
            RankedGroup { group, values }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub business_lines: Vec<String>,
    pub states: Vec<String>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Distinct values available to each filter control
pub fn filter_options(table: &IndicatorTable) -> FilterOptions {
    let mut business_lines = BTreeSet::new();
    let mut states = BTreeSet::new();
    for row in &table.rows {
        business_lines.insert(row.key.business_line.clone());
        states.insert(row.key.state.clone());
    }
    FilterOptions {
        business_lines: business_lines.into_iter().collect(),
        states: states.into_iter().collect(),
        first_date: table.rows.iter().map(|r| r.key.date).min(),
        last_date: table.rows.iter().map(|r| r.key.date).max(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub total_attended_calls: f64,
    pub mean_handling_time: Option<f64>,
    pub mean_satisfaction: Option<f64>,
    pub agents: usize,
}

/// Every panel of the call-center dashboard for one filter selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub filter: ReportFilter,
    pub rows: usize,
    pub headline: Headline,
    pub daily_calls: Vec<GroupValue>,
    pub handling_time_by_business_line: Vec<GroupValue>,
    pub satisfaction_by_state: Vec<GroupValue>,
    pub calls_by_business_line: Vec<GroupShare>,
    pub top_agents: Vec<RankedGroup>,
    /// Dashboard indicators the table has no column for; their panels are empty
    pub missing_indicators: Vec<String>,
}

/// Indicators every dashboard panel draws from
pub const DASHBOARD_INDICATORS: [&str; 3] = [ATTENDED_CALLS, AVERAGE_HANDLING_TIME, SATISFACTION_SCORE];

impl DashboardReport {
    pub fn build(table: &IndicatorTable, filter: &ReportFilter, top_n: usize) -> Self {
        let rows = filter_rows(table, filter);
        let missing_indicators: Vec<String> = DASHBOARD_INDICATORS
            .iter()
            .filter(|name| !table.indicators.iter().any(|i| i == *name))
            .map(|name| name.to_string())
            .collect();
        if !missing_indicators.is_empty() {
            warn!(
                "Indicator registry lacks dashboard indicators {:?}; their panels will be empty",
                missing_indicators
            );
        }

        Self {
            filter: filter.clone(),
            rows: rows.len(),
            headline: Headline {
                total_attended_calls: sum(&rows, ATTENDED_CALLS),
                mean_handling_time: mean(&rows, AVERAGE_HANDLING_TIME),
                mean_satisfaction: mean(&rows, SATISFACTION_SCORE),
                agents: distinct_count(&rows, Dimension::Agent),
            },
            daily_calls: group_sum(&rows, Dimension::Date, ATTENDED_CALLS),
            handling_time_by_business_line: group_mean(&rows, Dimension::BusinessLine, AVERAGE_HANDLING_TIME),
            satisfaction_by_state: group_mean(&rows, Dimension::State, SATISFACTION_SCORE),
            calls_by_business_line: share_by(&rows, Dimension::BusinessLine, ATTENDED_CALLS),
            top_agents: top_by(&rows, Dimension::Agent, &table.indicators, ATTENDED_CALLS, top_n),
            missing_indicators,
        }
    }
}
