//! Call-center indicators: aggregation engine, CSV boundary, report rollups
//! and the REST API that serves them.

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod indicators;
pub mod models;
pub mod report;
pub mod synthetic;

pub use aggregate::{aggregate, Aggregator, ZeroDenominatorPolicy};
pub use error::{Error, Result};
pub use indicators::{IndicatorDef, IndicatorKind, IndicatorRegistry};
pub use models::{Dimension, DimensionKey, IndicatorRow, IndicatorTable, Observation};
