//! Audio encoding settings for the normalization pass.
//!
//! The audio stream is always re-encoded (the loudnorm filter changes its
//! samples), so the caller chooses a codec, bitrate and sample rate. None of
//! these are validated here; they are handed to the engine as given.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Audio encoder used for the normalized track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioCodec {
    /// AAC (Advanced Audio Coding). The default; fits MP4 containers.
    #[default]
    Aac,
    /// MP3 (MPEG Audio Layer III). Requires an engine built with an MP3 encoder.
    Mp3,
    /// FLAC (Free Lossless Audio Codec).
    Flac,
}

impl AudioCodec {
    /// Every supported codec, in display order.
    pub const ALL: [AudioCodec; 3] = [AudioCodec::Aac, AudioCodec::Mp3, AudioCodec::Flac];

    /// The token passed to the engine's `-c:a` option.
    pub fn engine_name(&self) -> &'static str {
        match self {
            AudioCodec::Aac => "aac",
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Flac => "flac",
        }
    }
}

impl Display for AudioCodec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.engine_name())
    }
}

impl FromStr for AudioCodec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "aac" => Ok(AudioCodec::Aac),
            "mp3" => Ok(AudioCodec::Mp3),
            "flac" => Ok(AudioCodec::Flac),
            other => Err(format!("unsupported audio codec: {other} (expected aac, mp3 or flac)")),
        }
    }
}

/// Output audio settings. The channel count is fixed to stereo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEncoding {
    /// Bitrate token, e.g. `192K`.
    pub bitrate: String,
    /// Audio encoder.
    pub codec: AudioCodec,
    /// Output sample rate in Hz.
    pub sample_rate_hz: u32,
}

impl AudioEncoding {
    /// Output channel count. Always stereo.
    pub const CHANNELS: u32 = 2;

    /// Create encoding settings.
    pub fn new(bitrate: impl Into<String>, codec: AudioCodec, sample_rate_hz: u32) -> Self {
        Self {
            bitrate: bitrate.into(),
            codec,
            sample_rate_hz,
        }
    }
}

impl Default for AudioEncoding {
    /// 192 kbit/s AAC at 44.1 kHz.
    fn default() -> Self {
        Self::new("192K", AudioCodec::Aac, 44_100)
    }
}
