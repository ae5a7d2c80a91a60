//! Delivery of one local file: preparation, sending and escalation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::classify::classify;
use super::config::DeliveryConfig;
use super::types::{Delivered, DeliveryError, DeliveryMode, DeliveryRoute, MediaKind};
use crate::acquire::files::remove_file_quietly;
use crate::converter::{
    ConversionJob, Converter, ConverterConfig, MediaInfo, Operation, QualityProfile,
};
use crate::metrics;
use crate::transport::{
    AlternateSender, Keyboard, MediaSource, Transport, TransportError, VideoHints,
};

/// `dir/<stem>.<suffix>` next to `file`.
fn sibling(file: &Path, suffix: &str) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "media".to_string());
    file.with_file_name(format!("{}.{}", stem, suffix))
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn final_error(error: TransportError) -> DeliveryError {
    if error.is_too_large() {
        DeliveryError::TooLarge(error.to_string())
    } else {
        DeliveryError::Failed(error.to_string())
    }
}

/// Classifies, converts and sends files through the transport.
///
/// The source file and every intermediate are removed once a delivery
/// finishes, whatever its outcome.
pub struct MediaPipeline {
    config: DeliveryConfig,
    conversions: ConverterConfig,
    converter: Arc<dyn Converter>,
    transport: Arc<dyn Transport>,
    alternate: Option<AlternateSender>,
}

impl MediaPipeline {
    pub fn new(
        config: DeliveryConfig,
        conversions: ConverterConfig,
        converter: Arc<dyn Converter>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            conversions,
            converter,
            transport,
            alternate: None,
        }
    }

    /// Enables the alternate transport as the last delivery tier.
    pub fn with_alternate(mut self, alternate: Option<AlternateSender>) -> Self {
        self.alternate = alternate;
        self
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub async fn classify(&self, path: &Path) -> MediaKind {
        classify(path, self.converter.as_ref()).await
    }

    /// Classifies and delivers `file`.
    pub async fn deliver(
        &self,
        chat_id: i64,
        file: &Path,
        caption: &str,
        mode: DeliveryMode,
        keyboard: Option<&Keyboard>,
    ) -> Result<Delivered, DeliveryError> {
        let kind = self.classify(file).await;
        self.deliver_as(kind, chat_id, file, caption, mode, keyboard)
            .await
    }

    /// Delivers `file` as an already classified `kind`.
    ///
    /// `keyboard` is attached to video sends only.
    pub async fn deliver_as(
        &self,
        kind: MediaKind,
        chat_id: i64,
        file: &Path,
        caption: &str,
        mode: DeliveryMode,
        keyboard: Option<&Keyboard>,
    ) -> Result<Delivered, DeliveryError> {
        let mut scratch: Vec<PathBuf> = Vec::new();
        let result = match kind {
            MediaKind::Image => self.deliver_image(chat_id, file, caption).await,
            MediaKind::Video => {
                self.deliver_video(chat_id, file, caption, mode, keyboard, &mut scratch)
                    .await
            }
            MediaKind::Other => Err(DeliveryError::not_media(file)),
        };

        for path in &scratch {
            remove_file_quietly(path).await;
        }
        remove_file_quietly(file).await;

        let label = match &result {
            Ok((route, _)) => route.as_str(),
            Err(DeliveryError::NotMediaType { .. }) => "skipped",
            Err(_) => "failed",
        };
        metrics::DELIVERIES_TOTAL
            .with_label_values(&[kind.as_str(), label])
            .inc();

        match result {
            Ok((route, items)) => {
                debug!(chat_id, file = %file.display(), route = route.as_str(), items, "delivered");
                Ok(Delivered { kind, route, items })
            }
            Err(e) => {
                warn!(chat_id, file = %file.display(), mode = mode.code(), error = %e, "delivery failed");
                Err(e)
            }
        }
    }

    async fn deliver_image(
        &self,
        chat_id: i64,
        file: &Path,
        caption: &str,
    ) -> Result<(DeliveryRoute, usize), DeliveryError> {
        let source = MediaSource::Local(file.to_path_buf());
        match self.transport.send_photo(chat_id, &source, Some(caption)).await {
            Ok(_) => Ok((DeliveryRoute::Direct, 1)),
            Err(e) => {
                debug!(error = %e, "photo rejected, sending as document");
                self.transport
                    .send_document(chat_id, &source, Some(caption))
                    .await
                    .map(|_| (DeliveryRoute::Direct, 1))
                    .map_err(final_error)
            }
        }
    }

    async fn deliver_video(
        &self,
        chat_id: i64,
        file: &Path,
        caption: &str,
        mode: DeliveryMode,
        keyboard: Option<&Keyboard>,
        scratch: &mut Vec<PathBuf>,
    ) -> Result<(DeliveryRoute, usize), DeliveryError> {
        if mode == DeliveryMode::Screenshots {
            return self.send_screenshots(chat_id, file, caption, scratch).await;
        }

        let source_info = self.converter.probe(file).await.ok();
        let duration = source_info.as_ref().and_then(|i| i.duration_secs);
        let working = self
            .prepare(file, mode, duration, scratch)
            .await
            .unwrap_or_else(|| file.to_path_buf());
        let hints = self.hints_for(&working, scratch).await;
        let working_duration = if working == file {
            duration
        } else {
            hints.duration_secs.map(f64::from)
        };

        let first = if mode == DeliveryMode::Lossless {
            self.transport
                .send_document(chat_id, &MediaSource::Local(working.clone()), Some(caption))
                .await
        } else {
            self.transport
                .send_video(
                    chat_id,
                    &MediaSource::Local(working.clone()),
                    Some(caption),
                    &hints,
                    keyboard,
                )
                .await
        };
        let error = match first {
            Ok(_) => return Ok((DeliveryRoute::Direct, 1)),
            Err(e) => e,
        };

        let size = file_size(&working);
        let mut last_candidate = working;
        let mut last_error = error;

        if last_error.is_too_large() || size > self.config.compress_target_bytes {
            let target = self.config.escalation_target(size);
            info!(
                chat_id,
                file = %file.display(),
                size,
                target,
                error = %last_error,
                "send rejected, re-encoding under a stricter size target"
            );
            metrics::ESCALATIONS_TOTAL
                .with_label_values(&["recompress"])
                .inc();

            // Re-encode what was sent, so the mode's own conversion is kept.
            let capped = sibling(file, "capped.mp4");
            scratch.push(capped.clone());
            let job = ConversionJob::new(
                &last_candidate,
                &capped,
                Operation::SizeCapped {
                    target_bytes: target,
                    duration_secs: working_duration,
                },
            );
            match self.converter.convert(job).await {
                Ok(_) => {
                    let retry_hints = self.retry_hints(&capped, &hints).await;
                    match self
                        .transport
                        .send_video(
                            chat_id,
                            &MediaSource::Local(capped.clone()),
                            Some(caption),
                            &retry_hints,
                            keyboard,
                        )
                        .await
                    {
                        Ok(_) => return Ok((DeliveryRoute::Recompressed, 1)),
                        Err(e) => {
                            last_error = e;
                            last_candidate = capped;
                        }
                    }
                }
                Err(e) => warn!(error = %e, "escalation re-encode failed"),
            }
        }

        self.send_alternate(chat_id, &last_candidate, caption, &hints, last_error)
            .await
    }

    /// Converts `file` for `mode`; `None` means send the source as-is.
    async fn prepare(
        &self,
        file: &Path,
        mode: DeliveryMode,
        duration: Option<f64>,
        scratch: &mut Vec<PathBuf>,
    ) -> Option<PathBuf> {
        let operation = match mode {
            DeliveryMode::Original | DeliveryMode::Screenshots => return None,
            DeliveryMode::Hd => Operation::Profile(self.conversions.profiles.get(QualityProfile::Hd)),
            DeliveryMode::Sd => Operation::Profile(self.conversions.profiles.get(QualityProfile::Sd)),
            DeliveryMode::Lq => Operation::Profile(self.conversions.profiles.get(QualityProfile::Lq)),
            DeliveryMode::Lossless => Operation::Remux,
            DeliveryMode::Compress => Operation::SizeCapped {
                target_bytes: self.config.compress_target_bytes,
                duration_secs: duration,
            },
            DeliveryMode::Trim => Operation::Trim {
                seconds: self.conversions.trim_secs,
            },
        };

        let output = sibling(file, &format!("{}.mp4", mode.code()));
        scratch.push(output.clone());
        match self
            .converter
            .convert(ConversionJob::new(file, &output, operation))
            .await
        {
            Ok(result) => Some(result.output_path),
            Err(e) => {
                warn!(file = %file.display(), mode = mode.code(), error = %e, "conversion failed, sending source unmodified");
                None
            }
        }
    }

    /// Duration, dimensions and thumbnail for `file`; failures leave gaps.
    async fn hints_for(&self, file: &Path, scratch: &mut Vec<PathBuf>) -> VideoHints {
        let mut hints = VideoHints::streaming();
        if let Ok(info) = self.converter.probe(file).await {
            apply_info(&mut hints, &info);
        }

        let thumb = sibling(file, "thumb.jpg");
        scratch.push(thumb.clone());
        let job = ConversionJob::new(
            file,
            &thumb,
            Operation::Thumbnail {
                width: self.conversions.thumbnail_width,
            },
        );
        match self.converter.convert(job).await {
            Ok(result) => hints.thumbnail = Some(result.output_path),
            Err(e) => debug!(file = %file.display(), error = %e, "no thumbnail"),
        }
        hints
    }

    /// Hints for a re-encoded file, keeping the original thumbnail.
    async fn retry_hints(&self, file: &Path, original: &VideoHints) -> VideoHints {
        let mut hints = original.clone();
        if let Ok(info) = self.converter.probe(file).await {
            apply_info(&mut hints, &info);
        }
        hints
    }

    async fn send_alternate(
        &self,
        chat_id: i64,
        file: &Path,
        caption: &str,
        hints: &VideoHints,
        last_error: TransportError,
    ) -> Result<(DeliveryRoute, usize), DeliveryError> {
        let Some(ref alternate) = self.alternate else {
            return Err(final_error(last_error));
        };

        metrics::ESCALATIONS_TOTAL
            .with_label_values(&["alternate"])
            .inc();
        match alternate
            .send(
                chat_id,
                file,
                caption,
                hints.duration_secs,
                hints.thumbnail.as_deref(),
            )
            .await
        {
            Ok(()) => Ok((DeliveryRoute::Alternate, 1)),
            Err(e) => {
                warn!(chat_id, error = %e, "alternate transport failed");
                Err(final_error(last_error))
            }
        }
    }

    async fn send_screenshots(
        &self,
        chat_id: i64,
        file: &Path,
        caption: &str,
        scratch: &mut Vec<PathBuf>,
    ) -> Result<(DeliveryRoute, usize), DeliveryError> {
        let mut sent = 0usize;
        let mut conversion_error = None;
        let mut send_error = None;

        for (i, at_secs) in self.conversions.screenshot_timestamps.iter().enumerate() {
            let shot = sibling(file, &format!("shot{}.jpg", i + 1));
            scratch.push(shot.clone());
            let job = ConversionJob::new(file, &shot, Operation::FrameGrab { at_secs: *at_secs });
            if let Err(e) = self.converter.convert(job).await {
                debug!(at_secs, error = %e, "frame grab failed");
                conversion_error = Some(e);
                continue;
            }

            let shot_caption = (sent == 0).then_some(caption);
            match self
                .transport
                .send_photo(chat_id, &MediaSource::Local(shot), shot_caption)
                .await
            {
                Ok(_) => sent += 1,
                Err(e) => send_error = Some(e),
            }
        }

        if sent > 0 {
            return Ok((DeliveryRoute::Direct, sent));
        }
        match (send_error, conversion_error) {
            (Some(e), _) => Err(final_error(e)),
            (None, Some(e)) => Err(DeliveryError::Conversion(e)),
            (None, None) => Err(DeliveryError::Failed("no screenshot offsets configured".to_string())),
        }
    }
}

fn apply_info(hints: &mut VideoHints, info: &MediaInfo) {
    hints.duration_secs = info.duration_whole_secs();
    hints.width = info.width;
    hints.height = info.height;
}
