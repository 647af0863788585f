//! Indicator aggregation engine
//!
//! Turns the long-format observation log into the wide indicator table.
//! Each registered indicator is filtered, grouped by dimension key and
//! reduced on its own; the partial results are then full-outer-joined on
//! the key.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::indicators::{IndicatorDef, IndicatorKind, IndicatorRegistry};
use crate::models::{DimensionKey, IndicatorRow, IndicatorTable, Observation};

/// What to do with a cell that has no finite value: a rate-style group whose
/// denominators sum to zero, or sums that overflow or carry NaN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroDenominatorPolicy {
    /// Leave the cell unset; the key still appears in the table
    #[default]
    Absent,
    /// Abort the whole call with `Error::UndefinedRatio` or `Error::NonFiniteValue`
    Fail,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    numerator: f64,
    denominator: f64,
}

impl Accumulator {
    fn add(&mut self, obs: &Observation) {
        self.numerator += obs.numerator;
        self.denominator += obs.denominator;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    registry: IndicatorRegistry,
    policy: ZeroDenominatorPolicy,
}

impl Aggregator {
    pub fn new(registry: IndicatorRegistry, policy: ZeroDenominatorPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn registry(&self) -> &IndicatorRegistry {
        &self.registry
    }

    pub fn policy(&self) -> ZeroDenominatorPolicy {
        self.policy
    }

    pub fn aggregate(&self, observations: &[Observation]) -> Result<IndicatorTable> {
        let mut joined: BTreeMap<DimensionKey, IndicatorRow> = BTreeMap::new();

        for def in self.registry.iter() {
            let mut groups: Vec<(DimensionKey, Accumulator)> =
                reduce_partition(def, observations).into_iter().collect();
            groups.sort_by(|a, b| a.0.cmp(&b.0));
            debug!("{}: {} groups", def.name, groups.len());

            for (key, acc) in groups {
                let value = self.finish(def, &key, acc)?;
                let row = joined
                    .entry(key)
                    .or_insert_with_key(|k| IndicatorRow::new(k.clone()));
                if let Some(v) = value {
                    row.values.insert(def.name.clone(), v);
                }
            }
        }

        self.log_unmatched(observations);

        let table = IndicatorTable {
            indicators: self.registry.names(),
            rows: joined.into_values().collect(),
        };
        info!(
            "Aggregated {} observations into {} rows",
            observations.len(),
            table.len()
        );
        Ok(table)
    }

    /// Never yields a non-finite value; undefined cells go through the policy.
    fn finish(&self, def: &IndicatorDef, key: &DimensionKey, acc: Accumulator) -> Result<Option<f64>> {
        let value = match def.kind {
            IndicatorKind::Count => acc.numerator,
            IndicatorKind::Rate if acc.denominator == 0.0 => {
                return match self.policy {
                    ZeroDenominatorPolicy::Absent => {
                        warn!("{} has a zero denominator at {}; leaving it unset", def.name, key);
                        Ok(None)
                    }
                    ZeroDenominatorPolicy::Fail => Err(Error::UndefinedRatio {
                        indicator: def.name.clone(),
                        key: key.clone(),
                    }),
                };
            }
            IndicatorKind::Rate => acc.numerator / acc.denominator,
        };

        if value.is_finite() {
            return Ok(Some(value));
        }
        match self.policy {
            ZeroDenominatorPolicy::Absent => {
                warn!("{} is not finite at {}; leaving it unset", def.name, key);
                Ok(None)
            }
            ZeroDenominatorPolicy::Fail => Err(Error::NonFiniteValue {
                indicator: def.name.clone(),
                key: key.clone(),
            }),
        }
    }

    fn log_unmatched(&self, observations: &[Observation]) {
        let mut unmatched: BTreeMap<&str, usize> = BTreeMap::new();
        for obs in observations {
            if self.registry.resolve(&obs.indicator).is_none() {
                *unmatched.entry(obs.indicator.as_str()).or_insert(0) += 1;
            }
        }
        for (name, count) in unmatched {
            debug!("Skipped {} observations of unregistered indicator '{}'", count, name);
        }
    }
}

/// Filter one indicator's observations and sum them per dimension key
fn reduce_partition(def: &IndicatorDef, observations: &[Observation]) -> HashMap<DimensionKey, Accumulator> {
    let mut groups: HashMap<DimensionKey, Accumulator> = HashMap::new();
    for obs in observations.iter().filter(|o| def.matches(&o.indicator)) {
        groups.entry(obs.key.clone()).or_default().add(obs);
    }
    groups
}

/// Aggregate with the call-center registry and absent zero-ratio cells
pub fn aggregate(observations: &[Observation]) -> Result<IndicatorTable> {
    Aggregator::default().aggregate(observations)
}
