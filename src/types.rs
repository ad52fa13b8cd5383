use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Config {
    pub foundry_url: String,
    pub ontology_rid: String,
    pub foundry_token: String,
    pub object_type: String,
    pub timestamp_column: String,
    pub page_size: u32,
    pub lookback_hours: i64,
    pub slack_base_url: String,
    pub slack_token: String,
    pub slack_channel_id: String,
    pub poll_interval_hours: i64,
    pub retry_delay_secs: u64,
    pub post_delay_ms: u64,
    pub fail_if_type_missing: bool,
}

/// One source object flattened to terminal-key columns.
pub type FlatRecord = serde_json::Map<String, Value>;

/// Rows sharing a column set. Columns are the union across all rows in
/// first-seen order; a key missing from a row reads as null.
#[derive(Debug, Default, Clone)]
pub struct RecordTable {
    pub columns: Vec<String>,
    pub rows: Vec<FlatRecord>,
}

impl RecordTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A rendered notification: plain fallback text plus optional Block Kit
/// blocks for rich formatting.
#[derive(Debug, Clone)]
pub struct MessagePayload {
    pub text: String,
    pub blocks: Option<Vec<Value>>,
}

impl MessagePayload {
    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            blocks: None,
        }
    }
}
