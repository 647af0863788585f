//! Indicator registry
//!
//! Declares which indicator names exist and how each one reduces its
//! numerator/denominator pairs. Adding an indicator is a registry entry,
//! the aggregation algorithm does not change.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};

pub const ATTENDED_CALLS: &str = "Attended-Calls";
pub const AVERAGE_HANDLING_TIME: &str = "Average-Handling-Time";
pub const SATISFACTION_SCORE: &str = "Satisfaction-Score";

/// How a group of observations reduces to one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    /// Sum of numerators; denominators are ignored
    Count,
    /// Sum of numerators divided by sum of denominators
    Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDef {
    pub name: String,
    pub kind: IndicatorKind,
    /// Alternative names accepted in input data
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl IndicatorDef {
    pub fn new(name: &str, kind: IndicatorKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            aliases: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorRegistry {
    defs: Vec<IndicatorDef>,
}

impl IndicatorRegistry {
    pub fn new(defs: Vec<IndicatorDef>) -> Result<Self> {
        let mut seen = HashSet::new();
        for def in &defs {
            if def.name.trim().is_empty() {
                return Err(Error::InvalidRegistry("indicator name is empty".to_string()));
            }
            for name in std::iter::once(&def.name).chain(def.aliases.iter()) {
                if !seen.insert(name.as_str()) {
                    return Err(Error::InvalidRegistry(format!(
                        "name '{}' is declared more than once",
                        name
                    )));
                }
            }
        }
        Ok(Self { defs })
    }

    /// Attended calls, average handling time and customer satisfaction
    pub fn call_center() -> Self {
        Self {
            defs: vec![
                IndicatorDef::new(ATTENDED_CALLS, IndicatorKind::Count).with_alias("Atendidas"),
                IndicatorDef::new(AVERAGE_HANDLING_TIME, IndicatorKind::Rate).with_alias("TMA"),
                IndicatorDef::new(SATISFACTION_SCORE, IndicatorKind::Rate).with_alias("CSAT"),
            ],
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let defs: Vec<IndicatorDef> = serde_json::from_str(s)?;
        Self::new(defs)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorDef> {
        self.defs.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.defs.iter().map(|d| d.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Look up by canonical name or alias
    pub fn resolve(&self, name: &str) -> Option<&IndicatorDef> {
        self.defs.iter().find(|d| d.matches(name))
    }

    /// Like `resolve`, but an unknown name is an error
    pub fn require(&self, name: &str) -> Result<&IndicatorDef> {
        self.resolve(name)
            .ok_or_else(|| Error::UnknownIndicator(name.to_string()))
    }
}

impl Default for IndicatorRegistry {
    fn default() -> Self {
        Self::call_center()
    }
}
