use thiserror::Error;

/// Errors surfaced by the fetch, filter and post pipeline.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The HTTP request itself could not complete (DNS, reset, timeout).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A vendor API answered with a non-success status.
    #[error("API request failed with status {status}: {body}")]
    RemoteApi { status: u16, body: String },

    /// An expected column is absent from the record table.
    #[error("column '{column}' not found in record table")]
    Schema { column: String },

    /// A timestamp did not parse under the accepted formats.
    #[error("could not parse timestamp '{value}'")]
    ValueFormat { value: String },
}
