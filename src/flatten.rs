use serde_json::{Map, Value};

use crate::types::{FlatRecord, RecordTable};

const KEY_SEPARATOR: char = '_';

static NULL: Value = Value::Null;

/// Clip a key to its last separator-delimited segment.
fn terminal_segment(key: &str) -> &str {
    key.rsplit(KEY_SEPARATOR).next().unwrap_or(key)
}

/// Flatten one source object into terminal-key columns.
///
/// Nested objects merge upward along a `_`-joined key path; an incoming key
/// that already contains `_` is clipped to its last segment before joining.
/// Arrays survive as their JSON text rather than expanding into columns.
/// Only the final path segment names the column, so two paths sharing a
/// terminal key collide and the later one wins. That overwrite matches the
/// upstream feed and is relied on by consumers; do not fix it here.
pub fn flatten_record(record: &Value) -> FlatRecord {
    let mut flat = FlatRecord::new();
    if let Value::Object(map) = record {
        flatten_into(map, String::new(), &mut flat);
    }
    flat
}

fn flatten_into(map: &Map<String, Value>, parent: String, out: &mut FlatRecord) {
    for (key, value) in map {
        let clean = terminal_segment(key);
        let path = if parent.is_empty() {
            clean.to_string()
        } else {
            format!("{}{}{}", parent, KEY_SEPARATOR, clean)
        };

        match value {
            Value::Object(inner) => flatten_into(inner, path, out),
            Value::Array(_) => {
                out.insert(terminal_segment(&path).to_string(), Value::String(value.to_string()));
            }
            scalar => {
                out.insert(terminal_segment(&path).to_string(), scalar.clone());
            }
        }
    }
}

/// Flatten a batch of records into a table. Columns are the union of row
/// keys in first-seen order; records that are not JSON objects contribute
/// an empty row.
pub fn build_record_table(records: &[Value]) -> RecordTable {
    let mut table = RecordTable::default();
    for record in records {
        let flat = flatten_record(record);
        for key in flat.keys() {
            if !table.columns.iter().any(|c| c == key) {
                table.columns.push(key.clone());
            }
        }
        table.rows.push(flat);
    }
    table
}

/// Cell accessor; a key missing from the row reads as null.
pub fn cell<'a>(row: &'a FlatRecord, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&NULL)
}
