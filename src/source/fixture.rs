//! In-memory market-data source for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::SourceError;
use crate::model::PriceRow;
use crate::source::MarketDataSource;

#[derive(Default)]
pub struct FixtureSource {
    rows: HashMap<String, Vec<PriceRow>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, symbol: &str, rows: Vec<PriceRow>) -> Self {
        self.rows.insert(symbol.to_owned(), rows);
        self
    }

    /// `n` consecutive trading days of raw closes `1.0, 2.0, ..`.
    pub fn with_closes(self, symbol: &str, n: usize) -> Self {
        let rows = (0..n)
            .map(|i| PriceRow {
                date: day(i),
                close: (i + 1) as f64,
                adjusted_close: None,
            })
            .collect();
        self.with_rows(symbol, rows)
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_owned());
        self
    }

    pub fn delayed(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(symbol.to_owned(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Day `i` counted from 2023-01-02.
pub fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + chrono::Duration::days(i as i64)
}

impl MarketDataSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    fn get(
        &self,
        symbol: &str,
        _start: &str,
        _end: &str,
    ) -> BoxFuture<'_, Result<Vec<PriceRow>, Report<SourceError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(&symbol) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing.contains(&symbol) {
                return Err(Report::new(SourceError::Request {
                    provider: "fixture".into(),
                }));
            }
            Ok(self.rows.get(&symbol).cloned().unwrap_or_default())
        })
    }
}
