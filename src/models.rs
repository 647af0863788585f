use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Raw record from CSV ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvRecord {
    pub date: String,
    pub agent: String,
    pub supervisor: String,
    pub coordinator: String,
    pub business_line: String,
    pub city: String,
    pub state: String,
    pub indicator_name: String,
    pub numerator: f64,
    #[serde(default)]
    pub denominator: Option<f64>,
}

/// Parse a calendar date, tolerating a trailing midnight timestamp
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .map_err(|_| Error::InvalidDate(s.to_string()))
}

/// One reporting cell: a day plus the six categorical attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DimensionKey {
    pub date: NaiveDate,
    pub agent: String,
    pub supervisor: String,
    pub coordinator: String,
    pub business_line: String,
    pub city: String,
    pub state: String,
}

impl DimensionKey {
    /// Label of a single key field, used for report grouping
    pub fn get(&self, dimension: Dimension) -> String {
        match dimension {
            Dimension::Date => self.date.format("%Y-%m-%d").to_string(),
            Dimension::Agent => self.agent.clone(),
            Dimension::Supervisor => self.supervisor.clone(),
            Dimension::Coordinator => self.coordinator.clone(),
            Dimension::BusinessLine => self.business_line.clone(),
            Dimension::City => self.city.clone(),
            Dimension::State => self.state.clone(),
        }
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}/{}/{}",
            self.date.format("%Y-%m-%d"),
            self.agent,
            self.supervisor,
            self.coordinator,
            self.business_line,
            self.city,
            self.state
        )
    }
}

/// Key fields a report can group or filter by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Date,
    Agent,
    Supervisor,
    Coordinator,
    BusinessLine,
    City,
    State,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Date,
        Dimension::Agent,
        Dimension::Supervisor,
        Dimension::Coordinator,
        Dimension::BusinessLine,
        Dimension::City,
        Dimension::State,
    ];

    /// Column header used in CSV files
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Date => "date",
            Dimension::Agent => "agent",
            Dimension::Supervisor => "supervisor",
            Dimension::Coordinator => "coordinator",
            Dimension::BusinessLine => "business_line",
            Dimension::City => "city",
            Dimension::State => "state",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "date" => Ok(Dimension::Date),
            "agent" => Ok(Dimension::Agent),
            "supervisor" => Ok(Dimension::Supervisor),
            "coordinator" => Ok(Dimension::Coordinator),
            "business_line" | "operation" => Ok(Dimension::BusinessLine),
            "city" => Ok(Dimension::City),
            "state" => Ok(Dimension::State),
            _ => Err(Error::UnknownDimension(s.to_string())),
        }
    }
}

/// One numerator/denominator contribution to an indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub key: DimensionKey,
    pub indicator: String,
    pub numerator: f64,
    pub denominator: f64,
}

impl Observation {
    /// Observation for a count-style indicator (denominator 1)
    pub fn count(key: DimensionKey, indicator: &str, numerator: f64) -> Self {
        Self::ratio(key, indicator, numerator, 1.0)
    }

    pub fn ratio(key: DimensionKey, indicator: &str, numerator: f64, denominator: f64) -> Self {
        Self {
            key,
            indicator: indicator.to_string(),
            numerator,
            denominator,
        }
    }

    pub fn to_csv_record(&self) -> CsvRecord {
        CsvRecord {
            date: self.key.date.format("%Y-%m-%d").to_string(),
            agent: self.key.agent.clone(),
            supervisor: self.key.supervisor.clone(),
            coordinator: self.key.coordinator.clone(),
            business_line: self.key.business_line.clone(),
            city: self.key.city.clone(),
            state: self.key.state.clone(),
            indicator_name: self.indicator.clone(),
            numerator: self.numerator,
            denominator: Some(self.denominator),
        }
    }
}

impl CsvRecord {
    pub fn to_observation(&self, line: u64) -> Result<Observation> {
        let date = parse_date(&self.date).map_err(|e| Error::MalformedInput {
            line,
            reason: e.to_string(),
        })?;
        if self.indicator_name.trim().is_empty() {
            return Err(Error::MalformedInput {
                line,
                reason: "empty indicator_name".to_string(),
            });
        }
        let denominator = self.denominator.unwrap_or(1.0);
        if !self.numerator.is_finite() || !denominator.is_finite() {
            return Err(Error::MalformedInput {
                line,
                reason: format!(
                    "non-finite numerator/denominator {}/{}",
                    self.numerator, denominator
                ),
            });
        }

        Ok(Observation {
            key: DimensionKey {
                date,
                agent: self.agent.clone(),
                supervisor: self.supervisor.clone(),
                coordinator: self.coordinator.clone(),
                business_line: self.business_line.clone(),
                city: self.city.clone(),
                state: self.state.clone(),
            },
            indicator: self.indicator_name.trim().to_string(),
            numerator: self.numerator,
            denominator,
        })
    }
}

/// A row of the wide indicator table. Absent indicators have no entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub key: DimensionKey,
    pub values: BTreeMap<String, f64>,
}

impl IndicatorRow {
    pub fn new(key: DimensionKey) -> Self {
        Self {
            key,
            values: BTreeMap::new(),
        }
    }

    pub fn value(&self, indicator: &str) -> Option<f64> {
        self.values.get(indicator).copied()
    }
}

/// Wide-format output: one row per dimension key, sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorTable {
    /// Value columns, in registry order
    pub indicators: Vec<String>,
    pub rows: Vec<IndicatorRow>,
}

impl IndicatorTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, key: &DimensionKey) -> Option<&IndicatorRow> {
        self.rows
            .binary_search_by(|r| r.key.cmp(key))
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Number of rows with no value for the given indicator
    pub fn absent_count(&self, indicator: &str) -> usize {
        self.rows.iter().filter(|r| r.value(indicator).is_none()).count()
    }

    /// Header row for CSV export: key columns then indicator columns
    pub fn columns(&self) -> Vec<String> {
        Dimension::ALL
            .iter()
            .map(|d| d.column().to_string())
            .chain(self.indicators.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(agent: &str) -> DimensionKey {
        DimensionKey {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            agent: agent.to_string(),
            supervisor: "Supervisor_1".to_string(),
            coordinator: "Coordinator_1".to_string(),
            business_line: "Sales".to_string(),
            city: "Curitiba".to_string(),
            state: "PR".to_string(),
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_date("2024-01-05").unwrap(), d);
        assert_eq!(parse_date("2024-01-05 00:00:00").unwrap(), d);
        assert!(matches!(parse_date("05/01/2024"), Err(Error::InvalidDate(_))));
    }

    #[test]
    fn test_dimension_from_str() {
        assert_eq!("business-line".parse::<Dimension>().unwrap(), Dimension::BusinessLine);
        assert_eq!("operation".parse::<Dimension>().unwrap(), Dimension::BusinessLine);
        assert_eq!("State".parse::<Dimension>().unwrap(), Dimension::State);
        assert!("region".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_csv_record_default_denominator() {
        let record = CsvRecord {
            date: "2024-03-01".to_string(),
            agent: "Agent_1".to_string(),
            supervisor: "Supervisor_1".to_string(),
            coordinator: "Coordinator_1".to_string(),
            business_line: "Sales".to_string(),
            city: "Curitiba".to_string(),
            state: "PR".to_string(),
            indicator_name: "Attended-Calls".to_string(),
            numerator: 12.0,
            denominator: None,
        };
        let obs = record.to_observation(2).unwrap();
        assert_eq!(obs.denominator, 1.0);
        assert_eq!(obs.key, key("Agent_1"));
    }

    #[test]
    fn test_csv_record_rejects_non_finite_values() {
        let record = |numerator: f64, denominator: Option<f64>| CsvRecord {
            date: "2024-03-01".to_string(),
            agent: "Agent_1".to_string(),
            supervisor: "Supervisor_1".to_string(),
            coordinator: "Coordinator_1".to_string(),
            business_line: "Sales".to_string(),
            city: "Curitiba".to_string(),
            state: "PR".to_string(),
            indicator_name: "Average-Handling-Time".to_string(),
            numerator,
            denominator,
        };
        for (n, d) in [(300.0, Some(f64::NAN)), (f64::INFINITY, Some(1.0)), (f64::NAN, None)] {
            assert!(matches!(
                record(n, d).to_observation(7),
                Err(Error::MalformedInput { line: 7, .. })
            ));
        }
        assert!(record(300.0, Some(15.0)).to_observation(7).is_ok());
    }

    #[test]
    fn test_table_lookup_by_key() {
        let table = IndicatorTable {
            indicators: vec!["Attended-Calls".to_string()],
            rows: vec![IndicatorRow::new(key("Agent_1")), IndicatorRow::new(key("Agent_2"))],
        };
        assert!(table.row(&key("Agent_2")).is_some());
        assert!(table.row(&key("Agent_3")).is_none());
        assert_eq!(table.absent_count("Attended-Calls"), 2);
        assert_eq!(table.columns().len(), 8);
    }
}
