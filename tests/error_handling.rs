//! Error handling tests.
//!
//! These tests verify that every failure carries a stable reason code and
//! a meaningful message.

use std::io::ErrorKind;

use loudnorm::{NormalizeError, ParseError};

#[test]
fn reason_codes_are_stable() {
    let cases = [
        (NormalizeError::EmptyInputPath, "empty_input_path"),
        (NormalizeError::MissingPath, "missing_path"),
        (
            NormalizeError::Launch {
                program: "ffmpeg".to_string(),
                kind: ErrorKind::NotFound,
                reason: "No such file or directory".to_string(),
            },
            "launch_error",
        ),
        (
            NormalizeError::Decode {
                line: 3,
                reason: "invalid utf-8 sequence".to_string(),
            },
            "decode_error",
        ),
        (ParseError::NoJsonFound.into(), "no_json_found"),
        (ParseError::MalformedJson("EOF".to_string()).into(), "malformed_json"),
        (ParseError::MissingField("input_i").into(), "missing_field"),
        (
            ParseError::InvalidField {
                name: "input_i",
                value: "\"-inf\"".to_string(),
            }
            .into(),
            "invalid_field",
        ),
        (NormalizeError::NonZeroExit(1), "non_zero_exit"),
        (NormalizeError::Terminated { signal: Some(9) }, "terminated"),
        (NormalizeError::Cancelled, "cancelled"),
        (NormalizeError::Stream("broken pipe".to_string()), "stream_error"),
        (
            NormalizeError::InvalidParameter {
                name: "I",
                value: "NaN".to_string(),
            },
            "invalid_parameter",
        ),
    ];

    for (error, code) in cases {
        assert_eq!(error.code(), code, "{error}");
    }
}

#[test]
fn launch_error_names_program() {
    let error = NormalizeError::Launch {
        program: "/opt/ffmpeg".to_string(),
        kind: ErrorKind::PermissionDenied,
        reason: "Permission denied".to_string(),
    };
    let error_message = error.to_string();
    assert!(
        error_message.contains("/opt/ffmpeg") && error_message.contains("Permission denied"),
        "Error message should name the program and cause: {error_message}",
    );
}

#[test]
fn terminated_message_includes_signal_when_known() {
    assert_eq!(
        NormalizeError::Terminated { signal: Some(15) }.to_string(),
        "Engine was terminated by signal 15"
    );
    assert_eq!(
        NormalizeError::Terminated { signal: None }.to_string(),
        "Engine was terminated"
    );
}

#[test]
fn parse_error_message_names_field() {
    let error: NormalizeError = ParseError::MissingField("target_offset").into();
    let error_message = error.to_string();
    assert!(
        error_message.contains("target_offset"),
        "Error message should name the missing field: {error_message}",
    );
}

#[test]
fn errors_are_cloneable_and_comparable() {
    let error = NormalizeError::NonZeroExit(2);
    assert_eq!(error.clone(), error);
    assert_ne!(error, NormalizeError::NonZeroExit(3));
}
