//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Named re-encode profiles selectable at delivery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityProfile {
    Hd,
    Sd,
    Lq,
}

impl QualityProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hd => "hd",
            Self::Sd => "sd",
            Self::Lq => "lq",
        }
    }
}

/// Target resolution, frame rate and quality factor of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSettings {
    /// Longest side of the output, never upscaled.
    pub max_dimension: u32,
    pub fps: u32,
    /// x264 constant rate factor.
    pub crf: u8,
}

impl ProfileSettings {
    pub const fn new(max_dimension: u32, fps: u32, crf: u8) -> Self {
        Self {
            max_dimension,
            fps,
            crf,
        }
    }
}

/// What a single transcoder invocation does.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Re-encode through a quality profile.
    Profile(ProfileSettings),
    /// Re-encode with a bitrate cap derived from a size bound.
    SizeCapped {
        target_bytes: u64,
        /// Probed duration; the configured ceiling is assumed when absent.
        duration_secs: Option<f64>,
    },
    /// Re-encode only the first `seconds`.
    Trim { seconds: u32 },
    /// Copy streams into an mp4 container without re-encoding.
    Remux,
    /// Single representative frame scaled to `width`.
    Thumbnail { width: u32 },
    /// Single frame at a fixed offset.
    FrameGrab { at_secs: f64 },
}

impl Operation {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Profile(_) => "profile",
            Self::SizeCapped { .. } => "size_capped",
            Self::Trim { .. } => "trim",
            Self::Remux => "remux",
            Self::Thumbnail { .. } => "thumbnail",
            Self::FrameGrab { .. } => "frame_grab",
        }
    }

    /// Whether the output is a still image rather than a video.
    pub fn produces_image(&self) -> bool {
        matches!(self, Self::Thumbnail { .. } | Self::FrameGrab { .. })
    }
}

/// A conversion job specification.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    /// Input file path.
    pub input_path: PathBuf,
    /// Output file path, overwritten when present.
    pub output_path: PathBuf,
    pub operation: Operation,
}

impl ConversionJob {
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        operation: Operation,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            operation,
        }
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    pub duration_ms: u64,
}

/// Information about a media file, obtained by probing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Container duration, absent for stills and unreadable headers.
    pub duration_secs: Option<f64>,
    /// Container format name (first entry of ffprobe's list).
    pub format: String,
    pub video_codec: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub audio_codec: Option<String>,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        self.video_codec.is_some()
    }

    /// Duration rounded to whole seconds, as the chat transport expects.
    pub fn duration_whole_secs(&self) -> Option<u32> {
        self.duration_secs
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d.round() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_labels() {
        assert_eq!(Operation::Remux.label(), "remux");
        assert!(Operation::Thumbnail { width: 320 }.produces_image());
        assert!(Operation::FrameGrab { at_secs: 1.0 }.produces_image());
        assert!(!Operation::Trim { seconds: 30 }.produces_image());
    }

    #[test]
    fn test_media_info_duration() {
        let mut info = MediaInfo {
            duration_secs: Some(12.6),
            ..Default::default()
        };
        assert_eq!(info.duration_whole_secs(), Some(13));

        info.duration_secs = Some(f64::NAN);
        assert_eq!(info.duration_whole_secs(), None);

        info.duration_secs = None;
        assert_eq!(info.duration_whole_secs(), None);
    }

    #[test]
    fn test_profile_serialization() {
        let json = serde_json::to_string(&QualityProfile::Hd).unwrap();
        assert_eq!(json, "\"hd\"");
        assert_eq!(QualityProfile::Lq.as_str(), "lq");
    }
}
