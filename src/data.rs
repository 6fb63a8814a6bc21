//! Bar loading from CSV files
//!
//! Expected columns: `datetime,open,high,low,close[,volume]`. Volume is
//! ignored; the decision core never reads it.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::path::Path;
use tracing::warn;

use crate::Bar;

/// Parse RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` (all UTC)
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = s.parse::<DateTime<Utc>>() {
        return Ok(dt);
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .context(format!("Failed to parse datetime: {}", s))?;
    let ndt = date
        .and_hms_opt(0, 0, 0)
        .context(format!("Failed to parse datetime: {}", s))?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
}

/// Load daily bars from a CSV file, skipping rows that fail validation
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).context("Failed to open CSV file")?;

    let mut bars = Vec::new();
    let mut invalid_count = 0;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to read row {}", row_idx + 1))?;

        let datetime = parse_datetime(record.get(0).context("Missing datetime column")?)?;
        let field = |idx: usize, name: &str| -> Result<f64> {
            record
                .get(idx)
                .context(format!("Missing {} column", name))?
                .trim()
                .parse()
                .context(format!("Failed to parse {}", name))
        };
        let open = field(1, "open")?;
        let high = field(2, "high")?;
        let low = field(3, "low")?;
        let close = field(4, "close")?;

        match Bar::new(datetime, open, high, low, close) {
            Ok(bar) => bars.push(bar),
            Err(e) => {
                invalid_count += 1;
                warn!(
                    "Skipping invalid bar at row {} in {:?}: {}",
                    row_idx + 2,
                    path.file_name().unwrap_or_default(),
                    e
                );
            }
        }
    }

    if invalid_count > 0 {
        warn!(
            "Skipped {} invalid bars out of {} in {:?}",
            invalid_count,
            invalid_count + bars.len(),
            path.file_name().unwrap_or_default()
        );
    }

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("mr_core_{}_{}.csv", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_datetime("2024-03-01T00:00:00Z").unwrap(), expected);
        assert_eq!(parse_datetime("2024-03-01 00:00:00").unwrap(), expected);
        assert_eq!(parse_datetime("2024-03-01").unwrap(), expected);
        assert!(parse_datetime("03/01/2024").is_err());
    }

    #[test]
    fn test_load_csv_skips_invalid_rows() {
        let path = write_temp(
            "skip",
            "datetime,open,high,low,close,volume\n\
             2024-03-01,100,101,99,100.5,1000\n\
             2024-03-02,100,99,101,100,1000\n\
             2024-03-03,100.5,102,100,101.5,1200\n",
        );
        let bars = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 101.5);
    }

    #[test]
    fn test_load_csv_without_volume() {
        let path = write_temp(
            "novol",
            "datetime,open,high,low,close\n2024-03-01 00:00:00,10,11,9,10\n",
        );
        let bars = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn test_load_csv_bad_number_fails() {
        let path = write_temp("bad", "datetime,open,high,low,close\n2024-03-01,x,11,9,10\n");
        let result = load_csv(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
