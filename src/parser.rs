//! Extraction of the analysis summary from engine diagnostics.
//!
//! The loudnorm filter prints a single JSON object at the end of the
//! analysis pass, surrounded by ordinary progress and banner text. The
//! object is located by taking everything from the first `{` to the last
//! `}`. Its position in the stream is not fixed and it contains no nested
//! objects, so this is sufficient. Should two objects ever appear, the span
//! covering both fails to decode and the result is
//! [`ParseError::MalformedJson`] rather than a guess at which one was meant.
//!
//! # Example
//!
//! ```
//! use loudnorm::parser::extract_measurement;
//!
//! let text = "[Parsed_loudnorm_0 @ 0x1]\n{\n\"input_i\" : \"-23.00\",\n\
//!             \"input_tp\" : \"-5.00\",\n\"input_lra\" : \"4.00\",\n\
//!             \"input_thresh\" : \"-33.00\",\n\"target_offset\" : \"9.00\"\n}\n";
//! let measurement = extract_measurement(text)?;
//! assert_eq!(measurement.measured_i, -23.0);
//! assert_eq!(measurement.target_offset, 9.0);
//! # Ok::<(), loudnorm::parser::ParseError>(())
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

use crate::loudness::LoudnessMeasurement;

/// Why the analysis output could not be turned into a measurement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// No `{ ... }` region was present in the text.
    #[error("no JSON block found in engine output")]
    NoJsonFound,

    /// The `{ ... }` region is not a JSON object.
    #[error("malformed JSON block: {0}")]
    MalformedJson(String),

    /// A required key is absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A required key holds something other than a finite number.
    #[error("field `{name}` is not a finite number: {value}")]
    InvalidField {
        /// Key name.
        name: &'static str,
        /// Raw JSON value.
        value: String,
    },
}

/// Locate, decode and validate the measurement block in `text`.
///
/// # Errors
///
/// See [`ParseError`]. Values of `inf`/`nan` (the engine reports `-inf` for
/// silent input) are rejected as [`ParseError::InvalidField`].
pub fn extract_measurement(text: &str) -> Result<LoudnessMeasurement, ParseError> {
    let block = json_span(text).ok_or(ParseError::NoJsonFound)?;

    let object = match serde_json::from_str::<Value>(block) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            return Err(ParseError::MalformedJson(format!("expected an object, found {other}")));
        }
        Err(e) => return Err(ParseError::MalformedJson(e.to_string())),
    };

    Ok(LoudnessMeasurement {
        measured_i: field(&object, "input_i")?,
        measured_tp: field(&object, "input_tp")?,
        measured_lra: field(&object, "input_lra")?,
        measured_thresh: field(&object, "input_thresh")?,
        target_offset: field(&object, "target_offset")?,
    })
}

/// First `{` through last `}`, inclusive.
fn json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Read a key as a float. The engine emits numbers as strings; plain JSON
/// numbers are accepted too.
fn field(object: &Map<String, Value>, name: &'static str) -> Result<f64, ParseError> {
    let value = object.get(name).ok_or(ParseError::MissingField(name))?;

    let number = match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };

    number
        .filter(|n| n.is_finite())
        .ok_or_else(|| ParseError::InvalidField {
            name,
            value: value.to_string(),
        })
}
