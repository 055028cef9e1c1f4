//! Engine argument vectors for the two passes.
//!
//! Both builders are pure: no I/O, no validation of paths, and the same
//! input always yields the same vector. The program name is not included;
//! see [`Engine`](crate::Engine) for that.
//!
//! Argument order is significant to the engine. Hardware-acceleration flags
//! only take effect before `-i`, and the output path must come last.
//!
//! # Example
//!
//! ```
//! use loudnorm::command::analysis_arguments;
//!
//! let args = analysis_arguments("in.mp4", Some(30));
//! assert_eq!(
//!     args,
//!     ["-i", "in.mp4", "-t", "30", "-af", "loudnorm=print_format=json", "-f", "null", "-"],
//! );
//! ```

use crate::encoding::AudioEncoding;
use crate::loudness::{LoudnessMeasurement, LoudnessTargets};
use crate::request::NormalizationRequest;

/// Filter requesting a measurement with a machine-readable summary.
pub const ANALYSIS_FILTER: &str = "loudnorm=print_format=json";

/// Intel Quick Sync decode flags, placed before the input.
const QSV_ARGUMENTS: [&str; 6] = [
    "-hwaccel",
    "qsv",
    "-hwaccel_output_format",
    "qsv",
    "-extra_hw_frames",
    "16",
];

/// Arguments for the analysis pass.
///
/// A duration cap `<= 0` (or `None`) is omitted entirely; otherwise `-t`
/// appears immediately before the filter. Output goes to the null muxer.
pub fn analysis_arguments(input: &str, max_duration_seconds: Option<i64>) -> Vec<String> {
    let mut args = vec!["-i".to_string(), input.to_string()];

    if let Some(seconds) = max_duration_seconds.filter(|&s| s > 0) {
        args.push("-t".to_string());
        args.push(seconds.to_string());
    }

    args.extend(
        ["-af", ANALYSIS_FILTER, "-f", "null", "-"]
            .into_iter()
            .map(String::from),
    );
    args
}

/// Arguments for the normalization pass.
///
/// The video stream is always stream-copied (`-c:v copy`); only the audio
/// stream is filtered and re-encoded.
pub fn normalization_arguments(request: &NormalizationRequest) -> Vec<String> {
    let mut args = Vec::with_capacity(24);

    if request.hardware_acceleration {
        args.extend(QSV_ARGUMENTS.into_iter().map(String::from));
    }

    args.push("-i".to_string());
    args.push(request.input.clone());

    args.push("-af".to_string());
    args.push(loudnorm_filter(&request.targets, &request.measurement));

    args.extend(encoding_arguments(&request.encoding));
    args.push(request.output.clone());
    args
}

/// The second-pass filter string, keys in the engine's documented order:
/// `I, TP, LRA, measured_I, measured_TP, measured_LRA, measured_thresh, offset`.
pub fn loudnorm_filter(targets: &LoudnessTargets, measurement: &LoudnessMeasurement) -> String {
    format!(
        "loudnorm=I={}:TP={}:LRA={}:measured_I={}:measured_TP={}:measured_LRA={}:measured_thresh={}:offset={}",
        targets.integrated,
        targets.true_peak,
        targets.loudness_range,
        measurement.measured_i,
        measurement.measured_tp,
        measurement.measured_lra,
        measurement.measured_thresh,
        measurement.target_offset,
    )
}

fn encoding_arguments(encoding: &AudioEncoding) -> Vec<String> {
    vec![
        "-b:a".to_string(),
        encoding.bitrate.clone(),
        "-ar".to_string(),
        encoding.sample_rate_hz.to_string(),
        "-ac".to_string(),
        AudioEncoding::CHANNELS.to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        encoding.codec.engine_name().to_string(),
    ]
}
