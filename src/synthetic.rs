//! Synthetic observation generator
//!
//! Produces a random call-center event log following the
//! numerator/denominator conventions of each indicator:
//! attended calls are plain counts, handling time is total seconds over
//! calls, satisfaction is the sum of survey scores over surveys answered.

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::error::{Error, Result};
use crate::indicators::{ATTENDED_CALLS, AVERAGE_HANDLING_TIME, SATISFACTION_SCORE};
use crate::models::{DimensionKey, Observation};

pub const AGENT_COUNT: u32 = 20;
pub const SUPERVISOR_COUNT: u32 = 5;
pub const COORDINATOR_COUNT: u32 = 2;

pub const BUSINESS_LINES: [&str; 4] = ["Sales", "Technical Support", "Collections", "Customer Service"];

/// City and the state it belongs to
pub const LOCATIONS: [(&str, &str); 5] = [
    ("São Paulo", "SP"),
    ("Rio de Janeiro", "RJ"),
    ("Belo Horizonte", "MG"),
    ("Porto Alegre", "RS"),
    ("Curitiba", "PR"),
];

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Base rows; each one yields one observation per indicator
    pub rows: usize,
    /// First possible date (inclusive)
    pub start: NaiveDate,
    /// Last possible date (exclusive)
    pub end: NaiveDate,
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            rows: 1000,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 7, 28).unwrap_or_default(),
            seed: None,
        }
    }
}

pub fn generate(config: &SyntheticConfig) -> Result<Vec<Observation>> {
    let mut rng: StdRng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    generate_with_rng(config, &mut rng)
}

pub fn generate_with_rng(config: &SyntheticConfig, rng: &mut impl Rng) -> Result<Vec<Observation>> {
    let span_days = (config.end - config.start).num_days();
    if span_days <= 0 {
        return Err(Error::InvalidDate(format!(
            "end {} must be after start {}",
            config.end, config.start
        )));
    }

    let mut observations = Vec::with_capacity(config.rows * 3);
    for _ in 0..config.rows {
        let key = random_key(config.start, span_days, rng);

        observations.push(Observation::count(
            key.clone(),
            ATTENDED_CALLS,
            rng.gen_range(5..50u32) as f64,
        ));

        observations.push(Observation::ratio(
            key.clone(),
            AVERAGE_HANDLING_TIME,
            rng.gen_range(60..600u32) as f64,
            rng.gen_range(5..50u32) as f64,
        ));

        // Score sum in [n, 5n) keeps the mean between 1 and 5
        let surveys: u32 = rng.gen_range(1..10);
        let score_sum = rng.gen_range(surveys..surveys * 5);
        observations.push(Observation::ratio(
            key,
            SATISFACTION_SCORE,
            score_sum as f64,
            surveys as f64,
        ));
    }

    Ok(observations)
}

fn random_key(start: NaiveDate, span_days: i64, rng: &mut impl Rng) -> DimensionKey {
    let (city, state) = LOCATIONS[rng.gen_range(0..LOCATIONS.len())];
    DimensionKey {
        date: start + Duration::days(rng.gen_range(0..span_days)),
        agent: format!("Agent_{}", rng.gen_range(1..=AGENT_COUNT)),
        supervisor: format!("Supervisor_{}", rng.gen_range(1..=SUPERVISOR_COUNT)),
        coordinator: format!("Coordinator_{}", rng.gen_range(1..=COORDINATOR_COUNT)),
        business_line: BUSINESS_LINES[rng.gen_range(0..BUSINESS_LINES.len())].to_string(),
        city: city.to_string(),
        state: state.to_string(),
    }
}
