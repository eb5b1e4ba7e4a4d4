// In crates/api-client/src/types.rs

use chrono::{DateTime, TimeZone, Utc};
use core_types::{Bar, Timeframe, TradingPair};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{Error, Result};

/// A request for the bars of one pair and timeframe within `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BarRequest {
    pub pair: TradingPair,
    pub timeframe: Timeframe,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BarRequest {
    pub fn new(
        pair: TradingPair,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> core_types::Result<Self> {
        if start > end {
            return Err(core_types::Error::invalid(format!(
                "range start {} is after range end {}",
                start, end
            )));
        }
        Ok(Self { pair, timeframe, start, end })
    }

    /// The `limit` most recent completed bars as of `now`.
    ///
    /// `end` is floored to the start of the current bar, so repeated requests
    /// within one bar produce the same key. A zero `limit`, or one reaching
    /// past the representable time range, is `InvalidParameter`.
    pub fn latest(
        pair: TradingPair,
        timeframe: Timeframe,
        limit: usize,
        now: DateTime<Utc>,
    ) -> core_types::Result<Self> {
        if limit == 0 {
            return Err(core_types::Error::invalid("limit must be at least 1"));
        }
        let step = timeframe.duration();
        let step_secs = step.num_seconds();
        let floored = now.timestamp().div_euclid(step_secs) * step_secs;
        let end = Utc.timestamp_opt(floored, 0).single().unwrap_or(now);
        let start = i32::try_from(limit)
            .ok()
            .and_then(|n| step.checked_mul(n))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| core_types::Error::invalid(format!("limit {} reaches past the supported time range", limit)))?;
        Ok(Self { pair, timeframe, start, end })
    }
}

/// The envelope every OKX v5 REST response uses.
#[derive(Debug, Deserialize)]
pub struct OkxResponse {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Vec<Vec<String>>,
}

/// Parses one `history-candles` row:
/// `[ts, o, h, l, c, vol, volCcy, volCcyQuote, confirm]`.
///
/// Returns `None` for a candle that is still forming (`confirm == "0"`).
pub fn parse_candle(row: &[String]) -> Result<Option<Bar>> {
    if row.len() < 6 {
        return Err(Error::MalformedCandle(format!("expected at least 6 fields, got {}", row.len())));
    }
    if row.get(8).is_some_and(|confirm| confirm == "0") {
        return Ok(None);
    }

    let millis: i64 = row[0]
        .parse()
        .map_err(|_| Error::MalformedCandle(format!("bad timestamp '{}'", row[0])))?;

    Ok(Some(Bar {
        timestamp: timestamp_from_millis(millis)?,
        open: decimal("open", &row[1])?,
        high: decimal("high", &row[2])?,
        low: decimal("low", &row[3])?,
        close: decimal("close", &row[4])?,
        volume: decimal("volume", &row[5])?,
    }))
}

pub(crate) fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| Error::MalformedCandle(format!("timestamp {} out of range", millis)))
}

fn decimal(field: &str, value: &str) -> Result<Decimal> {
    value
        .parse()
        .map_err(|_| Error::MalformedCandle(format!("bad {} '{}'", field, value)))
}

/// Sorts ascending, drops duplicate timestamps and clips to the request range.
pub fn normalize(mut bars: Vec<Bar>, request: &BarRequest) -> Vec<Bar> {
    bars.retain(|b| b.timestamp >= request.start && b.timestamp <= request.end);
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
    bars
}
