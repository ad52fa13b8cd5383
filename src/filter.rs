use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::RelayError;
use crate::types::RecordTable;

/// Parse a timestamp under the flexible ISO-8601 family the feed uses:
/// RFC 3339 with an offset or trailing `Z` and optional subseconds, a naive
/// date-time taken as UTC, or a bare date.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RelayError> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    Err(RelayError::ValueFormat {
        value: value.to_string(),
    })
}

/// Narrow a table to the rows whose timestamp is at or after `cutoff`.
///
/// The column must exist in the table and the cutoff must parse. Rows with
/// a null or missing cell are dropped (a record without a timestamp is
/// never recent); a non-null cell that fails to parse aborts the whole
/// filter rather than skipping the row.
pub fn filter_recent(
    table: &RecordTable,
    timestamp_column: &str,
    cutoff: &str,
) -> Result<RecordTable, RelayError> {
    if !table.columns.iter().any(|c| c == timestamp_column) {
        return Err(RelayError::Schema {
            column: timestamp_column.to_string(),
        });
    }

    let cutoff = parse_timestamp(cutoff)?;

    let mut recent = RecordTable {
        columns: table.columns.clone(),
        rows: Vec::new(),
    };

    for row in &table.rows {
        let stamp = match row.get(timestamp_column) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => parse_timestamp(s)?,
            Some(other) => {
                return Err(RelayError::ValueFormat {
                    value: other.to_string(),
                })
            }
        };

        if stamp >= cutoff {
            recent.rows.push(row.clone());
        }
    }

    Ok(recent)
}
