//! Converter module for probing and transcoding media files.
//!
//! All work is delegated to ffmpeg/ffprobe, invoked through the
//! [`CommandRunner`](crate::runner::CommandRunner) so timeouts and missing
//! binaries are handled in one place.
//!
//! Supported operations:
//!
//! - Quality profiles (HD, SD, LQ re-encodes)
//! - Size-capped re-encodes with a derived bitrate
//! - Trimming to a leading window
//! - Stream-copy remux into mp4
//! - Thumbnails and frame grabs

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::{ConverterConfig, ProfileTable};
pub use error::ConverterError;
pub use ffmpeg::{video_bitrate_for_target, FfmpegConverter};
pub use traits::Converter;
pub use types::{
    ConversionJob, ConversionResult, MediaInfo, Operation, ProfileSettings, QualityProfile,
};
