//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::{ProfileSettings, QualityProfile};

/// Configuration for the FFmpeg-based converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Timeout for a single transcode in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Timeout for a probe in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Additional global ffmpeg arguments, placed before the output path.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,

    /// Named quality profiles.
    #[serde(default)]
    pub profiles: ProfileTable,

    /// Offsets, in seconds, of the frames extracted in screenshot mode.
    #[serde(default = "default_screenshot_timestamps")]
    pub screenshot_timestamps: Vec<f64>,

    /// Width of generated video thumbnails.
    #[serde(default = "default_thumbnail_width")]
    pub thumbnail_width: u32,

    /// Duration assumed for size-capped encodes when probing yields nothing.
    #[serde(default = "default_assumed_duration")]
    pub assumed_duration_secs: u64,

    /// Length kept by trim mode.
    #[serde(default = "default_trim_secs")]
    pub trim_secs: u32,

    /// Lower bound for the derived video bitrate of size-capped encodes.
    #[serde(default = "default_min_video_bitrate")]
    pub min_video_bitrate_kbps: u32,

    /// Audio bitrate of size-capped encodes.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_timeout() -> u64 {
    900
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "error".to_string()
}

fn default_screenshot_timestamps() -> Vec<f64> {
    vec![1.0, 3.0, 5.0]
}

fn default_thumbnail_width() -> u32 {
    320
}

fn default_assumed_duration() -> u64 {
    600
}

fn default_trim_secs() -> u32 {
    30
}

fn default_min_video_bitrate() -> u32 {
    150
}

fn default_audio_bitrate() -> u32 {
    96
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            ffmpeg_log_level: default_log_level(),
            extra_ffmpeg_args: Vec::new(),
            profiles: ProfileTable::default(),
            screenshot_timestamps: default_screenshot_timestamps(),
            thumbnail_width: default_thumbnail_width(),
            assumed_duration_secs: default_assumed_duration(),
            trim_secs: default_trim_secs(),
            min_video_bitrate_kbps: default_min_video_bitrate(),
            audio_bitrate_kbps: default_audio_bitrate(),
        }
    }
}

impl ConverterConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the transcode timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Resolution/frame-rate/quality triples for each named profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileTable {
    #[serde(default = "default_hd")]
    pub hd: ProfileSettings,
    #[serde(default = "default_sd")]
    pub sd: ProfileSettings,
    #[serde(default = "default_lq")]
    pub lq: ProfileSettings,
}

fn default_hd() -> ProfileSettings {
    ProfileSettings::new(1280, 30, 23)
}

fn default_sd() -> ProfileSettings {
    ProfileSettings::new(854, 30, 28)
}

fn default_lq() -> ProfileSettings {
    ProfileSettings::new(480, 24, 32)
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            hd: default_hd(),
            sd: default_sd(),
            lq: default_lq(),
        }
    }
}

impl ProfileTable {
    pub fn get(&self, profile: QualityProfile) -> ProfileSettings {
        match profile {
            QualityProfile::Hd => self.hd,
            QualityProfile::Sd => self.sd,
            QualityProfile::Lq => self.lq,
        }
    }
}
