//! Catalog payload decoding: a catalog Data's content is a UTF-8 JSON array
//! of strings naming dependent objects (data points, C-KEY names, D-KEY
//! names — the schema is the same shape at every level of the DAG).

use thiserror::Error;

#[derive(Debug, Error)]
#[error("malformed catalog JSON: {0}")]
pub struct CatalogParseError(#[from] serde_json::Error);

/// Parses a catalog body. Malformed JSON is reported as an error so the
/// caller can log it and still archive the Data — it is never treated as a
/// fatal condition (§7).
pub fn parse_catalog(body: &[u8]) -> Result<Vec<String>, CatalogParseError> {
  let names: Vec<String> = serde_json::from_slice(body)?;
  Ok(names)
}
