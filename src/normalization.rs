//! The normalization (second) pass.
//!
//! Re-encodes the audio stream through the loudnorm filter using the
//! targets and a prior measurement, and stream-copies the video untouched.

use crate::command::normalization_arguments;
use crate::configuration::RunOptions;
use crate::error::NormalizeError;
use crate::loudness::{LoudnessMeasurement, LoudnessTargets};
use crate::process::run_engine;
use crate::progress::{Completion, Failure, ProgressEvent};
use crate::request::NormalizationRequest;

/// Write a loudness-normalized copy of `request.input` to `request.output`.
///
/// Diagnostic lines are forwarded live; the output is not parsed. One
/// [`ProgressEvent::Finished`] ends the event sequence.
///
/// # Errors
///
/// - [`NormalizeError::MissingPath`] if either path is empty, before launch.
/// - [`NormalizeError::InvalidParameter`] if a target or measured value is
///   not finite, before launch.
/// - [`NormalizeError::Launch`], [`NormalizeError::NonZeroExit`],
///   [`NormalizeError::Terminated`] or [`NormalizeError::Cancelled`] from
///   the engine run.
///
/// # Example
///
/// ```no_run
/// use loudnorm::{LoudnessMeasurement, NormalizationRequest, RunOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let measurement = LoudnessMeasurement::new(-23.0, -5.0, 4.0, -33.0, 9.0)?;
/// let request = NormalizationRequest::new("input.mp4", "output.mp4", measurement);
/// loudnorm::normalize(&request, &RunOptions::new().with_overwrite(true)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn normalize(
    request: &NormalizationRequest,
    options: &RunOptions,
) -> Result<(), Failure> {
    let result = encode(request, options).await;

    match &result {
        Ok(()) => log::info!("Normalization finished: {}", request.output),
        Err(failure) => log::warn!("Normalization of {} failed: {failure}", request.input),
    }

    options.emit(ProgressEvent::Finished(result.clone().map(|()| Completion::Normalized)));
    result
}

async fn encode(request: &NormalizationRequest, options: &RunOptions) -> Result<(), Failure> {
    if request.input.trim().is_empty() || request.output.trim().is_empty() {
        return Err(Failure::new(NormalizeError::MissingPath));
    }
    check_finite(&request.targets, &request.measurement).map_err(Failure::new)?;

    log::info!(
        "Starting normalization of {} -> {} ({}, {}, {} Hz)",
        request.input,
        request.output,
        request.encoding.codec,
        request.encoding.bitrate,
        request.encoding.sample_rate_hz,
    );

    let mut args = options.global_arguments();
    args.extend(normalization_arguments(request));

    let output = run_engine(&args, options).await?;
    output
        .status
        .into_result()
        .map_err(|reason| Failure::with_diagnostics(reason, output.transcript))
}

/// Public fields can be set to anything, so re-run the constructors' checks.
fn check_finite(
    targets: &LoudnessTargets,
    measurement: &LoudnessMeasurement,
) -> Result<(), NormalizeError> {
    LoudnessTargets::new(
        targets.integrated,
        targets.true_peak,
        targets.loudness_range,
    )?;
    LoudnessMeasurement::new(
        measurement.measured_i,
        measurement.measured_tp,
        measurement.measured_lra,
        measurement.measured_thresh,
        measurement.target_offset,
    )?;
    Ok(())
}
