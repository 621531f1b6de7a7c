//! Multi-symbol time alignment.
//!
//! Given a result collection, place every symbol's log-returns on a common
//! timeline. Missing bars get strict NaN (no forward-fill).

use super::returns::{DataError, TIME_COLUMN};
use crate::session::ResultCollection;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// Log-returns for multiple symbols on a common timeline.
#[derive(Debug, Clone)]
pub struct AlignedReturns {
    /// The common time axis (sorted ascending).
    pub index: Vec<DateTime<Utc>>,
    /// Log-returns per symbol, in collection order.
    /// Each inner Vec has the same length as `index`.
    pub columns: IndexMap<String, Vec<f64>>,
}

impl AlignedReturns {
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|s| s.as_str())
    }

    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.columns.get(symbol).map(|v| v.as_slice())
    }

    /// Rows where every symbol has a finite log-return.
    pub fn complete_rows(&self) -> usize {
        (0..self.index.len())
            .filter(|&i| self.columns.values().all(|c| c[i].is_finite()))
            .count()
    }

    /// Paired observations for two symbols, keeping only rows where both are finite.
    ///
    /// This is the input rank-correlation estimators expect.
    pub fn pair(&self, a: &str, b: &str) -> Option<(Vec<f64>, Vec<f64>)> {
        let (xa, xb) = (self.column(a)?, self.column(b)?);
        Some(
            xa.iter()
                .zip(xb)
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .map(|(&x, &y)| (x, y))
                .unzip(),
        )
    }

    /// Wide polars frame: `time` followed by one column per symbol.
    pub fn to_frame(&self) -> Result<DataFrame, DataError> {
        let millis: Vec<i64> = self.index.iter().map(|t| t.timestamp_millis()).collect();

        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(
            Column::new(TIME_COLUMN.into(), millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                .map_err(|e| DataError::Frame(format!("time cast: {e}")))?,
        );
        for (symbol, values) in &self.columns {
            columns.push(Column::new(symbol.as_str().into(), values.clone()));
        }

        DataFrame::new(columns).map_err(|e| DataError::Frame(format!("dataframe creation: {e}")))
    }
}

/// Align every table in the collection to the union of their timestamps.
pub fn align_returns(collection: &ResultCollection) -> AlignedReturns {
    let mut all_times = BTreeSet::new();
    for table in collection.values() {
        all_times.extend(table.index().iter().copied());
    }
    let index: Vec<DateTime<Utc>> = all_times.into_iter().collect();

    let mut columns = IndexMap::with_capacity(collection.len());
    for (symbol, table) in collection {
        let by_time: HashMap<DateTime<Utc>, f64> = table
            .index()
            .iter()
            .copied()
            .zip(table.log_return().iter().copied())
            .collect();

        let aligned: Vec<f64> = index
            .iter()
            .map(|t| by_time.get(t).copied().unwrap_or(f64::NAN))
            .collect();

        columns.insert(symbol.clone(), aligned);
    }

    AlignedReturns { index, columns }
}
