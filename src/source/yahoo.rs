use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime};
use error_stack::{Report, ResultExt, bail};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::model::{PriceRow, parse_date};
use crate::source::MarketDataSource;

const PROVIDER: &str = "yahoo";
const CHART_PATH: [&str; 3] = ["v8", "finance", "chart"];
const NOT_FOUND_CODE: &str = "Not Found";

/// Yahoo Finance v8 chart API, daily bars with adjusted close.
pub struct YahooSource {
    client: reqwest::Client,
    base_url: Url,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl YahooSource {
    pub fn new(config: &SourceConfig) -> Result<Self, Report<SourceError>> {
        let base_url = Url::parse(&config.base_url)
            .change_context(SourceError::Client {
                provider: PROVIDER.into(),
            })
            .attach_with(|| format!("base_url: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!(SourceError::Client {
                provider: PROVIDER.into(),
            });
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .change_context(SourceError::Client {
                provider: PROVIDER.into(),
            })?;

        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(nonzero!(1u32));

        Ok(Self {
            client,
            base_url,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate))),
        })
    }

    fn chart_url(&self, symbol: &str) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in `new`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(CHART_PATH).push(symbol);
        }
        url
    }
}

impl MarketDataSource for YahooSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn get(
        &self,
        symbol: &str,
        start: &str,
        end: &str,
    ) -> BoxFuture<'_, Result<Vec<PriceRow>, Report<SourceError>>> {
        let symbol = symbol.to_owned();
        let window = query_window(start, end);
        Box::pin(async move {
            let Some((period1, period2)) = window else {
                debug!(symbol = %symbol, "unusable date range, skipping request");
                return Ok(Vec::new());
            };

            self.rate_limiter.until_ready().await;

            let params = [
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_owned()),
                ("events", "history".to_owned()),
                ("includeAdjustedClose", "true".to_owned()),
            ];

            let response = self
                .client
                .get(self.chart_url(&symbol))
                .query(&params)
                .send()
                .await
                .change_context(SourceError::Request {
                    provider: PROVIDER.into(),
                })
                .attach_with(|| format!("symbol: {symbol}"))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                debug!(symbol = %symbol, "yahoo has no such symbol");
                return Ok(Vec::new());
            }
            if !status.is_success() {
                return Err(Report::new(SourceError::Status {
                    provider: PROVIDER.into(),
                    status: status.as_u16(),
                })
                .attach(format!("symbol: {symbol}")));
            }

            let body: ChartResponse = response
                .json()
                .await
                .change_context(SourceError::ResponseParse {
                    provider: PROVIDER.into(),
                })
                .attach_with(|| format!("symbol: {symbol}"))?;

            let rows = body
                .into_rows()
                .attach_with(|| format!("symbol: {symbol}"))?;

            info!(symbol = %symbol, rows = rows.len(), "yahoo chart fetch complete");
            Ok(rows)
        })
    }
}

/// Unix-second bounds for the chart query. The end date is exclusive.
///
/// Returns `None` when either bound fails to parse or the range is empty.
fn query_window(start: &str, end: &str) -> Option<(i64, i64)> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if start >= end {
        return None;
    }
    Some((
        start.and_time(NaiveTime::MIN).and_utc().timestamp(),
        end.and_time(NaiveTime::MIN).and_utc().timestamp(),
    ))
}

// ── Chart response types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartApiError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Option<Vec<AdjCloseBlock>>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Option<Vec<Option<f64>>>,
}

impl ChartResponse {
    fn into_rows(self) -> Result<Vec<PriceRow>, Report<SourceError>> {
        if let Some(error) = self.chart.error {
            if error.code == NOT_FOUND_CODE {
                return Ok(Vec::new());
            }
            bail!(SourceError::Api {
                provider: PROVIDER.into(),
                message: match error.description {
                    Some(description) => format!("{}: {description}", error.code),
                    None => error.code,
                },
            });
        }

        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Vec::new());
        };

        let offset = result.meta.gmtoffset.unwrap_or(0);
        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .and_then(|q| q.close)
            .unwrap_or_default();
        let adjusted = result
            .indicators
            .adjclose
            .and_then(|blocks| blocks.into_iter().next())
            .and_then(|a| a.adjclose);

        let rows = result
            .timestamp
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                let close = closes.get(i).copied().flatten()?;
                // Bars are stamped at the exchange open; shift to exchange-local time
                let date = DateTime::from_timestamp(ts.checked_add(offset)?, 0)?.date_naive();
                let adjusted_close = adjusted.as_ref().and_then(|a| a.get(i).copied().flatten());
                Some(PriceRow {
                    date,
                    close,
                    adjusted_close,
                })
            })
            .collect();

        Ok(rows)
    }
}
