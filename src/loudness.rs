//! Loudness targets and measurements.
//!
//! [`LoudnessTargets`] are the goal values for the normalization pass and
//! [`LoudnessMeasurement`] is what the analysis pass reports. Both only ever
//! hold finite values; constructors reject NaN and infinities.
//!
//! # Example
//!
//! ```
//! use loudnorm::{LoudnessMeasurement, LoudnessTargets};
//!
//! let targets = LoudnessTargets::new(-16.0, -1.0, 7.0)?;
//! let measured = LoudnessMeasurement::new(-23.0, -5.0, 4.0, -33.0, 9.0)?;
//! assert_eq!(targets.integrated, -16.0);
//! assert_eq!(measured.target_offset, 9.0);
//! # Ok::<(), loudnorm::NormalizeError>(())
//! ```

use crate::error::NormalizeError;

/// Goal values for the normalization pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessTargets {
    /// Integrated loudness target in LUFS (`I`).
    pub integrated: f64,
    /// Maximum true peak in dBTP (`TP`).
    pub true_peak: f64,
    /// Loudness range target in LU (`LRA`).
    pub loudness_range: f64,
}

impl Default for LoudnessTargets {
    /// Streaming-platform defaults: -14 LUFS, -1.5 dBTP, 11 LU.
    fn default() -> Self {
        Self {
            integrated: -14.0,
            true_peak: -1.5,
            loudness_range: 11.0,
        }
    }
}

impl LoudnessTargets {
    /// Create targets, rejecting non-finite values.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::InvalidParameter`] naming the first
    /// non-finite value.
    pub fn new(
        integrated: f64,
        true_peak: f64,
        loudness_range: f64,
    ) -> Result<Self, NormalizeError> {
        Ok(Self {
            integrated: finite("I", integrated)?,
            true_peak: finite("TP", true_peak)?,
            loudness_range: finite("LRA", loudness_range)?,
        })
    }
}

/// Values reported by the analysis pass, consumed by one normalization pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessMeasurement {
    /// Measured integrated loudness (`input_i`).
    pub measured_i: f64,
    /// Measured true peak (`input_tp`).
    pub measured_tp: f64,
    /// Measured loudness range (`input_lra`).
    pub measured_lra: f64,
    /// Measured gating threshold (`input_thresh`).
    pub measured_thresh: f64,
    /// Gain offset the engine recommends for the second pass (`target_offset`).
    pub target_offset: f64,
}

impl LoudnessMeasurement {
    /// Create a measurement from values obtained elsewhere (e.g. a previous
    /// analysis run whose numbers were written down).
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::InvalidParameter`] naming the first
    /// non-finite value.
    pub fn new(
        measured_i: f64,
        measured_tp: f64,
        measured_lra: f64,
        measured_thresh: f64,
        target_offset: f64,
    ) -> Result<Self, NormalizeError> {
        Ok(Self {
            measured_i: finite("measured_I", measured_i)?,
            measured_tp: finite("measured_TP", measured_tp)?,
            measured_lra: finite("measured_LRA", measured_lra)?,
            measured_thresh: finite("measured_thresh", measured_thresh)?,
            target_offset: finite("offset", target_offset)?,
        })
    }
}

fn finite(name: &'static str, value: f64) -> Result<f64, NormalizeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(NormalizeError::InvalidParameter {
            name,
            value: value.to_string(),
        })
    }
}
