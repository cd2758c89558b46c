//! CSV file price adapter.
//!
//! Reads the date and close columns by header name and hands the raw rows to
//! [`PriceSeries::from_raw_rows`] for normalization.

use crate::domain::error::BiastraderError;
use crate::domain::price::{PriceSeries, RawRow};
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    pub date_column: String,
    pub close_column: String,
    pub date_format: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            date_column: "Date".into(),
            close_column: "Close/Last".into(),
            date_format: "%m/%d/%Y".into(),
        }
    }
}

pub struct CsvAdapter {
    options: CsvOptions,
}

impl CsvAdapter {
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<PriceSeries, BiastraderError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let series = self.read(file)?;
        tracing::info!(
            path = %path.display(),
            points = series.len(),
            first = %series.first().date,
            last = %series.last().date,
            "loaded price series"
        );
        Ok(series)
    }

    pub fn read<R: Read>(&self, reader: R) -> Result<PriceSeries, BiastraderError> {
        let rows = self.read_rows(reader)?;
        PriceSeries::from_raw_rows(&rows, &self.options.date_format)
    }

    fn read_rows<R: Read>(&self, reader: R) -> Result<Vec<RawRow>, BiastraderError> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = rdr.headers().map_err(|e| csv_error(e, 1))?.clone();
        let date_idx = column_index(&headers, &self.options.date_column)?;
        let close_idx = column_index(&headers, &self.options.close_column)?;

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(e, 0))?;
            let line = record.position().map_or(0, |p| p.line() as usize);
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            let field = |idx: usize, name: &str| {
                record
                    .get(idx)
                    .map(str::to_string)
                    .ok_or_else(|| BiastraderError::MalformedRow {
                        line,
                        reason: format!("missing {} column", name),
                    })
            };
            rows.push(RawRow {
                line,
                date: field(date_idx, &self.options.date_column)?,
                price: field(close_idx, &self.options.close_column)?,
            });
        }
        Ok(rows)
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, BiastraderError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| BiastraderError::MalformedRow {
            line: 1,
            reason: format!("header has no '{}' column", name),
        })
}

fn csv_error(err: csv::Error, fallback_line: usize) -> BiastraderError {
    let line = err
        .position()
        .map_or(fallback_line, |p| p.line() as usize);
    BiastraderError::MalformedRow {
        line,
        reason: format!("CSV parse error: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const NASDAQ_EXPORT: &str = "\
Date,Close/Last,Volume,Open,High,Low
03/05/2024,$170.12,1000,$169.00,$171.00,$168.50
03/04/2024,$175.10,1200,$176.00,$177.00,$174.00
03/01/2024,\"$1,179.66\",900,$178.00,$180.00,$177.50
";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn reads_newest_first_export() {
        let adapter = CsvAdapter::new(CsvOptions::default());
        let series = adapter.read(NASDAQ_EXPORT.as_bytes()).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.first().date, date(2024, 3, 1));
        assert_eq!(series.first().close, 1179.66);
        assert_eq!(series.last().date, date(2024, 3, 5));
        assert_eq!(series.last().close, 170.12);
    }

    #[test]
    fn custom_columns_and_format() {
        let adapter = CsvAdapter::new(CsvOptions {
            date_column: "day".into(),
            close_column: "close".into(),
            date_format: "%Y-%m-%d".into(),
        });
        let data = "day,open,close\n2024-01-02,10,11.5\n2024-01-03,11,12\n";
        let series = adapter.read(data.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].close, 11.5);
    }

    #[test]
    fn missing_column_is_reported() {
        let adapter = CsvAdapter::new(CsvOptions::default());
        let err = adapter.read("Date,Open\n03/01/2024,10\n".as_bytes()).unwrap_err();
        match err {
            BiastraderError::MalformedRow { line, reason } => {
                assert_eq!(line, 1);
                assert!(reason.contains("Close/Last"));
            }
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn bad_price_names_its_line() {
        let adapter = CsvAdapter::new(CsvOptions::default());
        let data = "Date,Close/Last\n03/01/2024,$10.00\n03/04/2024,n/a\n";
        let err = adapter.read(data.as_bytes()).unwrap_err();
        assert!(matches!(err, BiastraderError::MalformedRow { line: 3, .. }));
    }

    #[test]
    fn header_only_is_empty_series() {
        let adapter = CsvAdapter::new(CsvOptions::default());
        let err = adapter.read("Date,Close/Last\n".as_bytes()).unwrap_err();
        assert!(matches!(err, BiastraderError::EmptySeries));
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", NASDAQ_EXPORT).unwrap();
        let series = CsvAdapter::new(CsvOptions::default())
            .load(file.path())
            .unwrap();
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = CsvAdapter::new(CsvOptions::default()).load("/nonexistent/prices.csv");
        assert!(matches!(result, Err(BiastraderError::Io(_))));
    }
}
