//! Extraction of the verdict object from raw checker output.
//!
//! The checker may print banners or log lines before its JSON object, so
//! parsing starts at the first `{` and stops after the first complete value.

use narada_core::LicensePayload;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no JSON object in checker output")]
    NoPayload,

    #[error("{0}")]
    Malformed(String),
}

/// Parse the first JSON object found in `output`.
pub fn parse_checker_output(output: &str) -> Result<LicensePayload, ParseError> {
    let start = output.find('{').ok_or(ParseError::NoPayload)?;
    let mut values = serde_json::Deserializer::from_str(&output[start..]).into_iter::<LicensePayload>();

    match values.next() {
        Some(Ok(payload)) => Ok(payload),
        Some(Err(e)) => Err(ParseError::Malformed(e.to_string())),
        None => Err(ParseError::NoPayload),
    }
}
