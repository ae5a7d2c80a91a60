//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ConverterError;
use super::types::{ConversionJob, ConversionResult, MediaInfo};

/// A converter that can probe and transcode media files.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Probes a media file to get its information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError>;

    /// Runs one conversion job to completion.
    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError>;

    /// Whether the file carries at least one video stream.
    ///
    /// Probe failures count as "no".
    async fn has_video_stream(&self, path: &Path) -> bool {
        self.probe(path)
            .await
            .map(|info| info.has_video())
            .unwrap_or(false)
    }
}
