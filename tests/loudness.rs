//! Loudness values, encoding settings and request builder tests.

use loudnorm::{
    AnalysisRequest, AudioCodec, AudioEncoding, LoudnessMeasurement, LoudnessTargets,
    NormalizationRequest, NormalizeError, OperationType, RunRequest,
};

// ── LoudnessTargets ────────────────────────────────────────────────

#[test]
fn targets_default_to_streaming_levels() {
    let targets = LoudnessTargets::default();
    assert_eq!(targets.integrated, -14.0);
    assert_eq!(targets.true_peak, -1.5);
    assert_eq!(targets.loudness_range, 11.0);
}

#[test]
fn targets_reject_non_finite_values() {
    assert!(matches!(
        LoudnessTargets::new(f64::NAN, -1.0, 7.0),
        Err(NormalizeError::InvalidParameter { name: "I", .. })
    ));
    assert!(matches!(
        LoudnessTargets::new(-16.0, f64::NEG_INFINITY, 7.0),
        Err(NormalizeError::InvalidParameter { name: "TP", .. })
    ));
    assert!(matches!(
        LoudnessTargets::new(-16.0, -1.0, f64::INFINITY),
        Err(NormalizeError::InvalidParameter { name: "LRA", .. })
    ));
}

// ── LoudnessMeasurement ────────────────────────────────────────────

#[test]
fn measurement_accepts_finite_values() {
    let measurement = LoudnessMeasurement::new(-70.0, -99.5, 0.0, -80.0, 0.0).unwrap();
    assert_eq!(measurement.measured_tp, -99.5);
}

#[test]
fn measurement_rejects_infinite_loudness() {
    let error = LoudnessMeasurement::new(f64::NEG_INFINITY, -5.0, 4.0, -33.0, 9.0).unwrap_err();
    assert_eq!(
        error,
        NormalizeError::InvalidParameter {
            name: "measured_I",
            value: "-inf".to_string(),
        }
    );
}

// ── AudioEncoding ──────────────────────────────────────────────────

#[test]
fn encoding_defaults() {
    let encoding = AudioEncoding::default();
    assert_eq!(encoding.bitrate, "192K");
    assert_eq!(encoding.codec, AudioCodec::Aac);
    assert_eq!(encoding.sample_rate_hz, 44_100);
    assert_eq!(AudioEncoding::CHANNELS, 2);
}

#[test]
fn codec_names_parse_back() {
    for codec in AudioCodec::ALL {
        assert_eq!(codec.engine_name().parse::<AudioCodec>(), Ok(codec));
    }
    assert_eq!("MP3".parse::<AudioCodec>(), Ok(AudioCodec::Mp3));
    assert!("opus".parse::<AudioCodec>().is_err());
}

// ── Requests ───────────────────────────────────────────────────────

#[test]
fn analysis_request_builder() {
    let request = AnalysisRequest::new("in.mp4");
    assert_eq!(request.max_duration_seconds, None);
    assert_eq!(request.with_max_duration(90).max_duration_seconds, Some(90));
}

#[test]
fn normalization_request_defaults() {
    let measurement = LoudnessMeasurement::new(-23.0, -5.0, 4.0, -33.0, 9.0).unwrap();
    let request = NormalizationRequest::new("in.mp4", "out.mp4", measurement);
    assert_eq!(request.targets, LoudnessTargets::default());
    assert_eq!(request.encoding, AudioEncoding::default());
    assert!(!request.hardware_acceleration);
}

#[test]
fn run_request_knows_its_operation() {
    let analysis: RunRequest = AnalysisRequest::new("in.mp4").into();
    assert_eq!(analysis.operation(), OperationType::LoudnessAnalysis);

    let measurement = LoudnessMeasurement::new(-23.0, -5.0, 4.0, -33.0, 9.0).unwrap();
    let normalization: RunRequest =
        NormalizationRequest::new("in.mp4", "out.mp4", measurement).into();
    assert_eq!(normalization.operation(), OperationType::Normalization);
}
