//! Daily closing price series for a single instrument.
//!
//! A [`PriceSeries`] is ordered oldest to newest with strictly increasing,
//! unique dates and positive closes. It is immutable once constructed.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use super::error::BiastraderError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// An unparsed (date, price) row as read from an external source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based source line, used for error reporting.
    pub line: usize,
    pub date: String,
    pub price: String,
}

/// Result of comparing the closes on two dates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceDelta {
    pub from_price: f64,
    pub to_price: f64,
    pub delta: f64,
    pub delta_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Normalize raw rows into a sorted, deduplicated series.
    ///
    /// Currency symbols, thousands separators and surrounding whitespace are
    /// stripped from prices. When several rows share a date the last one wins.
    pub fn from_raw_rows(rows: &[RawRow], date_format: &str) -> Result<Self, BiastraderError> {
        let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();

        for row in rows {
            let date = NaiveDate::parse_from_str(row.date.trim(), date_format).map_err(|e| {
                BiastraderError::MalformedRow {
                    line: row.line,
                    reason: format!("invalid date '{}': {}", row.date, e),
                }
            })?;
            let close = parse_price(&row.price).map_err(|reason| BiastraderError::MalformedRow {
                line: row.line,
                reason,
            })?;
            if by_date.insert(date, close).is_some() {
                tracing::debug!(%date, line = row.line, "duplicate date, keeping later row");
            }
        }

        Self::from_sorted_map(by_date)
    }

    /// Build a series from already-parsed points, sorting and deduplicating.
    pub fn from_points(points: Vec<PricePoint>) -> Result<Self, BiastraderError> {
        let mut by_date = BTreeMap::new();
        for (i, p) in points.into_iter().enumerate() {
            if !p.close.is_finite() || p.close <= 0.0 {
                return Err(BiastraderError::MalformedRow {
                    line: i + 1,
                    reason: format!("close must be positive, got {}", p.close),
                });
            }
            by_date.insert(p.date, p.close);
        }
        Self::from_sorted_map(by_date)
    }

    fn from_sorted_map(by_date: BTreeMap<NaiveDate, f64>) -> Result<Self, BiastraderError> {
        if by_date.is_empty() {
            return Err(BiastraderError::EmptySeries);
        }
        let points = by_date
            .into_iter()
            .map(|(date, close)| PricePoint { date, close })
            .collect();
        Ok(PriceSeries { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&PricePoint> {
        self.points.get(index)
    }

    pub fn point(&self, index: usize) -> Result<&PricePoint, BiastraderError> {
        self.points.get(index).ok_or(BiastraderError::IndexOutOfRange {
            index,
            len: self.points.len(),
        })
    }

    pub fn first(&self) -> &PricePoint {
        &self.points[0]
    }

    pub fn last(&self) -> &PricePoint {
        &self.points[self.points.len() - 1]
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.close)
    }

    pub fn index_of(&self, date: NaiveDate) -> Result<usize, BiastraderError> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .map_err(|_| BiastraderError::DateNotFound { date })
    }

    /// Index of the first point dated on or after `date`.
    pub fn first_index_on_or_after(&self, date: NaiveDate) -> usize {
        self.points.partition_point(|p| p.date < date)
    }

    /// Indices of the trading days within `[start, end]`; open bounds default
    /// to the ends of the series.
    pub fn index_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<RangeInclusive<usize>, BiastraderError> {
        let start = start.unwrap_or(self.first().date);
        let end = end.unwrap_or(self.last().date);
        let lo = self.first_index_on_or_after(start);
        let hi = self.points.partition_point(|p| p.date <= end);
        if lo >= hi {
            return Err(BiastraderError::EmptyRange { start, end });
        }
        Ok(lo..=hi - 1)
    }

    /// Compare closes on two dates present in the series.
    pub fn price_delta(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PriceDelta, BiastraderError> {
        let from_price = self.points[self.index_of(from)?].close;
        let to_price = self.points[self.index_of(to)?].close;
        let delta = to_price - from_price;
        let delta_pct = if from_price != 0.0 {
            delta / from_price
        } else {
            0.0
        };
        Ok(PriceDelta {
            from_price,
            to_price,
            delta,
            delta_pct,
        })
    }

    /// Sum of consecutive-day fractional changes across trading days in
    /// `[start, end]`. Returns 0.0 when fewer than two points fall inside.
    pub fn cumulative_daily_change(&self, start: NaiveDate, end: NaiveDate) -> f64 {
        let window: Vec<f64> = self
            .points
            .iter()
            .filter(|p| p.date >= start && p.date <= end)
            .map(|p| p.close)
            .collect();
        window
            .windows(2)
            .filter(|w| w[0] != 0.0)
            .map(|w| (w[1] - w[0]) / w[0])
            .sum()
    }
}

fn parse_price(raw: &str) -> Result<f64, String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '€' | '£') && !c.is_whitespace())
        .collect();
    let value: f64 = cleaned
        .parse()
        .map_err(|e| format!("invalid price '{}': {}", raw, e))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("price must be positive, got '{}'", raw));
    }
    Ok(value)
}
