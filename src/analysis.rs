//! The analysis (measurement) pass.
//!
//! Runs the engine's loudnorm filter in measurement mode over the input,
//! discarding the decoded output, and parses the summary it prints at the
//! end into a [`LoudnessMeasurement`].
//!
//! # Example
//!
//! ```no_run
//! use loudnorm::{AnalysisRequest, RunOptions};
//!
//! # async fn example() -> Result<(), loudnorm::Failure> {
//! let request = AnalysisRequest::new("input.mp4").with_max_duration(120);
//! let measurement = loudnorm::analyze(&request, &RunOptions::new()).await?;
//! println!("Integrated loudness: {:.2} LUFS", measurement.measured_i);
//! # Ok(())
//! # }
//! ```

use crate::command::analysis_arguments;
use crate::configuration::RunOptions;
use crate::error::NormalizeError;
use crate::loudness::LoudnessMeasurement;
use crate::parser::extract_measurement;
use crate::process::run_engine;
use crate::progress::{Completion, Failure, ProgressEvent};
use crate::request::AnalysisRequest;

/// Measure the loudness of `request.input`.
///
/// Every diagnostic line goes to the progress callback as it arrives,
/// followed by one [`ProgressEvent::Finished`] carrying the same result
/// this function returns.
///
/// # Errors
///
/// - [`NormalizeError::EmptyInputPath`] without launching anything.
/// - [`NormalizeError::Launch`] if the engine cannot be started.
/// - [`NormalizeError::NonZeroExit`] / [`NormalizeError::Terminated`] if
///   the engine fails.
/// - [`NormalizeError::Parse`] if the summary is missing or unusable.
/// - [`NormalizeError::Cancelled`] if the token fires.
pub async fn analyze(
    request: &AnalysisRequest,
    options: &RunOptions,
) -> Result<LoudnessMeasurement, Failure> {
    let result = measure(request, options).await;

    match &result {
        Ok(measurement) => log::info!(
            "Loudness analysis of {} finished: I={} TP={} LRA={}",
            request.input,
            measurement.measured_i,
            measurement.measured_tp,
            measurement.measured_lra,
        ),
        Err(failure) => log::warn!("Loudness analysis of {} failed: {failure}", request.input),
    }

    options.emit(ProgressEvent::Finished(result.clone().map(Completion::Analyzed)));
    result
}

async fn measure(
    request: &AnalysisRequest,
    options: &RunOptions,
) -> Result<LoudnessMeasurement, Failure> {
    if request.input.trim().is_empty() {
        return Err(Failure::new(NormalizeError::EmptyInputPath));
    }

    log::info!("Starting loudness analysis of {}", request.input);

    let mut args = options.global_arguments();
    args.extend(analysis_arguments(&request.input, request.max_duration_seconds));

    let output = run_engine(&args, options).await?;

    if let Err(reason) = output.status.into_result() {
        return Err(Failure::with_diagnostics(reason, output.transcript));
    }

    extract_measurement(&output.transcript)
        .map_err(|e| Failure::with_diagnostics(e.into(), output.transcript))
}
