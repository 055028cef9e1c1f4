//! Shared helpers for the integration tests.
//!
//! `fake_engine()` installs a shell script that stands in for ffmpeg. It
//! picks its behaviour from the input file name passed after `-i`:
//!
//! | input contains | behaviour |
//! |----------------|-----------|
//! | `fail`         | prints an error, exits 1 |
//! | `slow`         | prints `waiting`, then sleeps 30 s |
//! | `nojson`       | prints progress only, exits 0 |
//! | `silent`       | prints a summary whose `input_i` is `-inf` |
//! | `garbled`      | prints one line of invalid UTF-8 before the summary |
//! | anything else  | prints five numbered lines, a carriage-return status line and a summary |
//!
//! Every run starts with an `ARGS:` line echoing its arguments. When the
//! last argument is not `-`, it is created as an empty file.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;

const SCRIPT: &str = r#"#!/bin/sh
input=""
prev=""
last=""
for arg in "$@"; do
  if [ "$prev" = "-i" ]; then input="$arg"; fi
  prev="$arg"
  last="$arg"
done

echo "ARGS: $*" >&2
echo "ffmpeg version n0.0-fake Copyright (c) 2000-2024 the FFmpeg developers" >&2
echo "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from '$input':" >&2

case "$input" in
  *fail*)
    echo "$input: Invalid data found when processing input" >&2
    exit 1
    ;;
  *slow*)
    echo "waiting" >&2
    exec sleep 30
    ;;
  *nojson*)
    echo "size=N/A time=00:00:01.00 bitrate=N/A speed=10x" >&2
    exit 0
    ;;
  *garbled*)
    printf 'Metadata: \377\376 title\n' >&2
    ;;
esac

i=1
while [ $i -le 5 ]; do
  echo "line $i for $input" >&2
  i=$((i + 1))
done
printf 'size=N/A time=00:00:01.00\rsize=N/A time=00:00:02.00\r' >&2
echo "" >&2

if [ "$last" != "-" ]; then
  : > "$last"
  exit 0
fi

measured_i='"-23.00"'
case "$input" in
  *silent*) measured_i='"-inf"' ;;
esac

echo "[Parsed_loudnorm_0 @ 0x55d0c8a3c0c0] " >&2
cat >&2 <<JSON
{
	"input_i" : $measured_i,
	"input_tp" : "-5.00",
	"input_lra" : "4.00",
	"input_thresh" : "-33.00",
	"output_i" : "-14.02",
	"output_tp" : "-1.50",
	"output_lra" : "3.90",
	"output_thresh" : "-24.02",
	"normalization_type" : "dynamic",
	"target_offset" : "9.00"
}
JSON
exit 0
"#;

/// Path to the fake engine, installed once per test binary.
///
/// Installing before any test spawns a process avoids `ETXTBSY` from a
/// concurrent fork inheriting the script's write handle.
pub fn fake_engine() -> &'static Path {
    static ENGINE: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    let (_, path) = ENGINE.get_or_init(|| {
        let directory = tempfile::tempdir().expect("Failed to create temp dir");
        let path = directory.path().join("ffmpeg");
        fs::write(&path, SCRIPT).expect("Failed to write fake engine");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to mark fake engine executable");
        (directory, path)
    });
    path
}
