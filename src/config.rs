//! Command-line and environment configuration shared by the binaries

use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::aggregate::{Aggregator, ZeroDenominatorPolicy};
use crate::error::{Error, Result};
use crate::indicators::IndicatorRegistry;

/// How observations are turned into indicators
#[derive(Args, Debug, Clone, Default)]
pub struct AggregationArgs {
    /// JSON file declaring indicators (name, kind, aliases); defaults to the call-center set
    #[arg(long, env = "CCBI_INDICATORS")]
    pub indicators: Option<PathBuf>,

    /// Fail on a rate indicator whose denominators sum to zero instead of leaving it empty
    #[arg(long)]
    pub strict_ratios: bool,
}

impl AggregationArgs {
    pub fn registry(&self) -> Result<IndicatorRegistry> {
        match &self.indicators {
            Some(path) => IndicatorRegistry::from_json_file(path),
            None => Ok(IndicatorRegistry::default()),
        }
    }

    pub fn policy(&self) -> ZeroDenominatorPolicy {
        if self.strict_ratios {
            ZeroDenominatorPolicy::Fail
        } else {
            ZeroDenominatorPolicy::Absent
        }
    }

    pub fn aggregator(&self) -> Result<Aggregator> {
        Ok(Aggregator::new(self.registry()?, self.policy()))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    #[arg(long, env = "CCBI_PORT", default_value = "8501")]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "CCBI_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Observation log (CSV)
    #[arg(long, env = "CCBI_DATA", default_value = "data/call_center_data.csv")]
    pub data: PathBuf,

    #[command(flatten)]
    pub aggregation: AggregationArgs,
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::InvalidAddress(format!("{}:{} ({})", self.host, self.port, e)))
    }
}
