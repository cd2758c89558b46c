#![allow(dead_code)]

use biastrader::domain::lot::{Lot, LotQueue};
use biastrader::domain::price::{PricePoint, PriceSeries};
use chrono::{Duration, NaiveDate};
use std::io::Write;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days starting 2024-01-01.
pub fn series_from_closes(closes: &[f64]) -> PriceSeries {
    series_from_closes_at(date(2024, 1, 1), closes)
}

pub fn series_from_closes_at(start: NaiveDate, closes: &[f64]) -> PriceSeries {
    PriceSeries::from_points(
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + Duration::days(i as i64),
                close,
            })
            .collect(),
    )
    .unwrap()
}

/// Weekday-only series, skipping Saturdays and Sundays like a real export.
pub fn trading_day_series(start: NaiveDate, closes: &[f64]) -> PriceSeries {
    use chrono::Datelike;
    let mut dates = Vec::with_capacity(closes.len());
    let mut day = start;
    while dates.len() < closes.len() {
        if day.weekday().number_from_monday() <= 5 {
            dates.push(day);
        }
        day += Duration::days(1);
    }
    PriceSeries::from_points(
        dates
            .into_iter()
            .zip(closes)
            .map(|(date, &close)| PricePoint { date, close })
            .collect(),
    )
    .unwrap()
}

pub fn lots(entries: &[(f64, u64)]) -> LotQueue {
    entries.iter()
        .enumerate()
        .map(|(i, &(purchase_price, quantity))| Lot {
            purchase_price,
            quantity,
            purchase_date: date(2024, 1, 1) + Duration::days(i as i64),
        })
        .collect()
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// A newest-first export in the default `Date,Close/Last` layout.
pub fn nasdaq_csv(series: &PriceSeries) -> String {
    let mut out = String::from("Date,Close/Last,Volume,Open,High,Low\n");
    for p in series.points().iter().rev() {
        out.push_str(&format!(
            "{},${:.2},1000,${:.2},${:.2},${:.2}\n",
            p.date.format("%m/%d/%Y"),
            p.close,
            p.close,
            p.close,
            p.close
        ));
    }
    out
}
