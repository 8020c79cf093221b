//! Boundary decoding of gateway rows into typed records.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::GatewayError;

/// Decode one row, failing on any shape mismatch
pub fn decode_row<T: DeserializeOwned>(table: &str, row: Value) -> Result<T, GatewayError> {
    serde_json::from_value(row)
        .map_err(|e| GatewayError::Decode(format!("Invalid row in '{}': {}", table, e)))
}

/// Decode a list of rows, dropping (and logging) rows that do not fit `T`.
///
/// One malformed row must not take the whole list down with it.
pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Vec<T> {
    let total = rows.len();
    let decoded: Vec<T> = rows
        .into_iter()
        .filter_map(|row| match decode_row::<T>(table, row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping row: {}", e);
                None
            }
        })
        .collect();

    if decoded.len() != total {
        tracing::warn!(
            "Rejected {} of {} rows from '{}'",
            total - decoded.len(),
            total,
            table
        );
    }

    decoded
}
