//! Report service shared by the REST handlers
//!
//! Every request reads the memoized indicator table and applies the
//! requested filter and rollup to it.

use std::sync::Arc;

use crate::cache::TableCache;
use crate::error::Result;
use crate::indicators::{IndicatorDef, IndicatorKind, IndicatorRegistry};
use crate::models::{Dimension, IndicatorRow, IndicatorTable};
use crate::report::{self, DashboardReport, FilterOptions, GroupValue, RankedGroup, ReportFilter, Rollup};

pub struct ReportService {
    cache: TableCache,
}

impl ReportService {
    pub fn new(cache: TableCache) -> Self {
        Self { cache }
    }

    pub fn registry(&self) -> &IndicatorRegistry {
        self.cache.aggregator().registry()
    }

    pub async fn table(&self) -> Result<Arc<IndicatorTable>> {
        self.cache.get().await
    }

    /// Filtered rows plus the total number of matches before `limit`
    pub async fn rows(&self, filter: &ReportFilter, limit: usize) -> Result<(Vec<IndicatorRow>, usize)> {
        let table = self.table().await?;
        let rows = report::filter_rows(&table, filter);
        let total = rows.len();
        Ok((rows.into_iter().take(limit).cloned().collect(), total))
    }

    pub async fn dashboard(&self, filter: &ReportFilter, top_n: usize) -> Result<DashboardReport> {
        let table = self.table().await?;
        Ok(DashboardReport::build(&table, filter, top_n))
    }

    pub async fn filter_options(&self) -> Result<FilterOptions> {
        let table = self.table().await?;
        Ok(report::filter_options(&table))
    }

    /// Sum or mean of one indicator per group. Without an explicit rollup,
    /// counts are summed and rates averaged.
    pub async fn breakdown(
        &self,
        filter: &ReportFilter,
        dimension: Dimension,
        indicator: &str,
        op: Option<Rollup>,
    ) -> Result<(IndicatorDef, Rollup, Vec<GroupValue>)> {
        let def = self.registry().require(indicator)?.clone();
        let op = op.unwrap_or(match def.kind {
            IndicatorKind::Count => Rollup::Sum,
            IndicatorKind::Rate => Rollup::Mean,
        });

        let table = self.table().await?;
        let rows = report::filter_rows(&table, filter);
        let groups = report::group_by(&rows, dimension, &def.name, op);
        Ok((def, op, groups))
    }

    pub async fn top(
        &self,
        filter: &ReportFilter,
        dimension: Dimension,
        indicator: Option<&str>,
        limit: usize,
    ) -> Result<(String, Vec<RankedGroup>)> {
        let rank_indicator = match indicator {
            Some(name) => self.registry().require(name)?.name.clone(),
            None => self.default_rank_indicator(),
        };

        let table = self.table().await?;
        let rows = report::filter_rows(&table, filter);
        let ranked = report::top_by(&rows, dimension, &table.indicators, &rank_indicator, limit);
        Ok((rank_indicator, ranked))
    }

    /// First count-style indicator, else the first registered one
    fn default_rank_indicator(&self) -> String {
        self.registry()
            .iter()
            .find(|d| d.kind == IndicatorKind::Count)
            .or_else(|| self.registry().iter().next())
            .map(|d| d.name.clone())
            .unwrap_or_default()
    }

    pub async fn invalidate(&self) -> bool {
        self.cache.invalidate().await
    }
}
