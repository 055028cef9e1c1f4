//! Run requests submitted to the analysis and normalization operations.

use crate::encoding::AudioEncoding;
use crate::loudness::{LoudnessMeasurement, LoudnessTargets};
use crate::progress::OperationType;

/// Parameters for the analysis (measurement) pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    /// Input media path, passed verbatim to the engine.
    pub input: String,
    /// Analyze at most this many seconds of content. `None` or a value
    /// `<= 0` analyzes the whole input.
    pub max_duration_seconds: Option<i64>,
}

impl AnalysisRequest {
    /// Analyze the whole of `input`.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            max_duration_seconds: None,
        }
    }

    /// Limit analysis to the first `seconds` of content.
    #[must_use]
    pub fn with_max_duration(mut self, seconds: i64) -> Self {
        self.max_duration_seconds = Some(seconds);
        self
    }
}

/// Parameters for the normalization (second) pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationRequest {
    /// Input media path.
    pub input: String,
    /// Output media path. Written last on the engine command line.
    pub output: String,
    /// Goal values.
    pub targets: LoudnessTargets,
    /// Values from a prior analysis of the same input.
    pub measurement: LoudnessMeasurement,
    /// Output audio settings.
    pub encoding: AudioEncoding,
    /// Decode with Intel Quick Sync Video hardware acceleration.
    pub hardware_acceleration: bool,
}

impl NormalizationRequest {
    /// Create a request with default targets and encoding, no hardware
    /// acceleration.
    pub fn new(
        input: impl Into<String>,
        output: impl Into<String>,
        measurement: LoudnessMeasurement,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            targets: LoudnessTargets::default(),
            measurement,
            encoding: AudioEncoding::default(),
            hardware_acceleration: false,
        }
    }

    /// Set the goal values.
    #[must_use]
    pub fn with_targets(mut self, targets: LoudnessTargets) -> Self {
        self.targets = targets;
        self
    }

    /// Set the output audio settings.
    #[must_use]
    pub fn with_encoding(mut self, encoding: AudioEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Enable or disable hardware-accelerated decoding.
    #[must_use]
    pub fn with_hardware_acceleration(mut self, enabled: bool) -> Self {
        self.hardware_acceleration = enabled;
        self
    }
}

/// Either kind of request, as accepted by the [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, PartialEq)]
pub enum RunRequest {
    /// Measure the input.
    Analysis(AnalysisRequest),
    /// Re-encode the audio of the input using a prior measurement.
    Normalization(NormalizationRequest),
}

impl RunRequest {
    /// Which operation this request drives.
    pub fn operation(&self) -> OperationType {
        match self {
            RunRequest::Analysis(_) => OperationType::LoudnessAnalysis,
            RunRequest::Normalization(_) => OperationType::Normalization,
        }
    }
}

impl From<AnalysisRequest> for RunRequest {
    fn from(request: AnalysisRequest) -> Self {
        RunRequest::Analysis(request)
    }
}

impl From<NormalizationRequest> for RunRequest {
    fn from(request: NormalizationRequest) -> Self {
        RunRequest::Normalization(request)
    }
}
