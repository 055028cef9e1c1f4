//! Engine argument vector tests.

use loudnorm::command::{analysis_arguments, loudnorm_filter, normalization_arguments};
use loudnorm::{
    AudioCodec, AudioEncoding, LoudnessMeasurement, LoudnessTargets, NormalizationRequest,
};

fn measurement() -> LoudnessMeasurement {
    LoudnessMeasurement::new(-23.0, -5.0, 4.0, -33.0, 9.0).unwrap()
}

fn request() -> NormalizationRequest {
    NormalizationRequest::new("in.mp4", "out.mp4", measurement())
}

fn position(args: &[String], value: &str) -> usize {
    args.iter()
        .position(|a| a == value)
        .unwrap_or_else(|| panic!("{value} not in {args:?}"))
}

// ── Analysis ───────────────────────────────────────────────────────

#[test]
fn analysis_without_duration() {
    let args = analysis_arguments("in.mp4", None);
    assert_eq!(
        args,
        [
            "-i",
            "in.mp4",
            "-af",
            "loudnorm=print_format=json",
            "-f",
            "null",
            "-",
        ]
    );
}

#[test]
fn analysis_with_duration_cap() {
    let args = analysis_arguments("in.mp4", Some(120));
    assert_eq!(
        args,
        [
            "-i",
            "in.mp4",
            "-t",
            "120",
            "-af",
            "loudnorm=print_format=json",
            "-f",
            "null",
            "-",
        ]
    );
}

#[test]
fn analysis_ignores_non_positive_duration() {
    for cap in [Some(0), Some(-5), None] {
        let args = analysis_arguments("in.mp4", cap);
        let capped = args.iter().any(|arg| arg == "-t");
        assert!(!capped, "cap {cap:?} gave {args:?}");
        assert_eq!(args.len(), 7);
    }
}

#[test]
fn analysis_duration_precedes_filter() {
    let args = analysis_arguments("in.mp4", Some(1));
    assert_eq!(position(&args, "-t") + 2, position(&args, "-af"));
}

#[test]
fn analysis_input_with_spaces_is_one_argument() {
    let args = analysis_arguments("my holiday video.mp4", None);
    assert_eq!(args[1], "my holiday video.mp4");
}

// ── Normalization ──────────────────────────────────────────────────

#[test]
fn normalization_default_vector() {
    let args = normalization_arguments(&request());
    assert_eq!(
        args,
        [
            "-i",
            "in.mp4",
            "-af",
            "loudnorm=I=-14:TP=-1.5:LRA=11:measured_I=-23:measured_TP=-5:measured_LRA=4:measured_thresh=-33:offset=9",
            "-b:a",
            "192K",
            "-ar",
            "44100",
            "-ac",
            "2",
            "-c:v",
            "copy",
            "-c:a",
            "aac",
            "out.mp4",
        ]
    );
}

#[test]
fn normalization_hardware_flags_come_first() {
    let args = normalization_arguments(&request().with_hardware_acceleration(true));
    assert_eq!(
        &args[..6],
        [
            "-hwaccel",
            "qsv",
            "-hwaccel_output_format",
            "qsv",
            "-extra_hw_frames",
            "16",
        ]
    );
    assert!(position(&args, "-hwaccel") < position(&args, "-i"));
}

#[test]
fn normalization_without_hardware_has_no_hwaccel() {
    let args = normalization_arguments(&request());
    assert!(!args.iter().any(|a| a.starts_with("-hwaccel")));
    assert!(!args.contains(&"-extra_hw_frames".to_string()));
}

#[test]
fn normalization_always_copies_video() {
    for codec in AudioCodec::ALL {
        let encoding = AudioEncoding::new("320K", codec, 48_000);
        let args = normalization_arguments(&request().with_encoding(encoding));

        let video = position(&args, "-c:v");
        assert_eq!(args[video + 1], "copy");
        assert_eq!(args.iter().filter(|a| *a == "-c:v").count(), 1);
        assert_eq!(args[position(&args, "-c:a") + 1], codec.engine_name());
    }
}

#[test]
fn normalization_output_is_last() {
    let args = normalization_arguments(&request().with_hardware_acceleration(true));
    assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
}

#[test]
fn normalization_uses_custom_encoding() {
    let encoding = AudioEncoding::new("128k", AudioCodec::Mp3, 22_050);
    let args = normalization_arguments(&request().with_encoding(encoding));
    assert_eq!(args[position(&args, "-b:a") + 1], "128k");
    assert_eq!(args[position(&args, "-ar") + 1], "22050");
    assert_eq!(args[position(&args, "-ac") + 1], "2");
    assert_eq!(args[position(&args, "-c:a") + 1], "mp3");
}

// ── Filter ─────────────────────────────────────────────────────────

#[test]
fn filter_keys_in_order() {
    let targets = LoudnessTargets::new(-16.0, -1.0, 7.0).unwrap();
    let filter = loudnorm_filter(&targets, &measurement());

    let keys: Vec<&str> = filter
        .trim_start_matches("loudnorm=")
        .split(':')
        .map(|pair| pair.split('=').next().unwrap())
        .collect();
    assert_eq!(
        keys,
        [
            "I",
            "TP",
            "LRA",
            "measured_I",
            "measured_TP",
            "measured_LRA",
            "measured_thresh",
            "offset",
        ]
    );
}

#[test]
fn filter_keeps_fractional_values() {
    let targets = LoudnessTargets::new(-23.5, -2.25, 9.0).unwrap();
    let measured = LoudnessMeasurement::new(-27.61, -4.47, 18.06, -39.2, 0.58).unwrap();
    let filter = loudnorm_filter(&targets, &measured);
    assert_eq!(
        filter,
        "loudnorm=I=-23.5:TP=-2.25:LRA=9:measured_I=-27.61:measured_TP=-4.47:measured_LRA=18.06:measured_thresh=-39.2:offset=0.58"
    );
}

#[test]
fn builders_are_deterministic() {
    let request = request().with_hardware_acceleration(true);
    assert_eq!(
        normalization_arguments(&request),
        normalization_arguments(&request)
    );
    assert_eq!(
        analysis_arguments("a", Some(3)),
        analysis_arguments("a", Some(3))
    );
}
