//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConversionJob, ConversionResult, MediaInfo, Operation, ProfileSettings};
use crate::metrics;
use crate::runner::{CommandRunner, CommandSpec, ExitOutcome};

/// Longest side used by size-capped encodes.
const SIZE_CAPPED_MAX_DIMENSION: u32 = 960;
const SIZE_CAPPED_FPS: u32 = 30;

/// Quality factor used by trim mode.
const TRIM_CRF: u8 = 26;

/// How much of ffmpeg's stderr is kept in errors.
const STDERR_TAIL: usize = 600;

/// Derives a video bitrate (kb/s) that keeps an encode under `target_bytes`.
///
/// The audio share is subtracted from the total budget and the result never
/// drops below `min_kbps`.
pub fn video_bitrate_for_target(
    target_bytes: u64,
    duration_secs: f64,
    audio_kbps: u32,
    min_kbps: u32,
) -> u32 {
    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return min_kbps;
    }
    let total_kbps = (target_bytes as f64 * 8.0) / 1000.0 / duration_secs;
    let video_kbps = total_kbps - audio_kbps as f64;
    if video_kbps < min_kbps as f64 {
        min_kbps
    } else {
        video_kbps.floor() as u32
    }
}

/// Scale filter that fits the frame into a `max` square, keeping the aspect
/// ratio and even dimensions, never upscaling.
fn fit_filter(max: u32, fps: u32) -> String {
    format!(
        "scale='min({max},iw)':'min({max},ih)':force_original_aspect_ratio=decrease:force_divisible_by=2,fps={fps}"
    )
}

fn tail(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= max {
        trimmed.to_string()
    } else {
        trimmed.chars().skip(count - max).collect()
    }
}

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
    runner: Arc<dyn CommandRunner>,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    fn h264_args(args: &mut Vec<String>) {
        args.extend(
            [
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ]
            .map(String::from),
        );
    }

    fn profile_args(args: &mut Vec<String>, settings: &ProfileSettings) {
        args.extend([
            "-vf".to_string(),
            fit_filter(settings.max_dimension, settings.fps),
        ]);
        Self::h264_args(args);
        args.extend([
            "-crf".to_string(),
            settings.crf.to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            "128k".to_string(),
        ]);
    }

    /// Builds the full ffmpeg argument list for a job.
    fn build_args(&self, job: &ConversionJob) -> Vec<String> {
        let input = job.input_path.to_string_lossy().to_string();
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-y".to_string(),
        ];

        match &job.operation {
            Operation::Profile(settings) => {
                args.extend(["-i".to_string(), input]);
                Self::profile_args(&mut args, settings);
            }
            Operation::SizeCapped {
                target_bytes,
                duration_secs,
            } => {
                let duration = duration_secs
                    .filter(|d| d.is_finite() && *d > 0.0)
                    .unwrap_or(self.config.assumed_duration_secs as f64);
                let kbps = video_bitrate_for_target(
                    *target_bytes,
                    duration,
                    self.config.audio_bitrate_kbps,
                    self.config.min_video_bitrate_kbps,
                );
                args.extend([
                    "-i".to_string(),
                    input,
                    "-vf".to_string(),
                    fit_filter(SIZE_CAPPED_MAX_DIMENSION, SIZE_CAPPED_FPS),
                ]);
                Self::h264_args(&mut args);
                args.extend([
                    "-b:v".to_string(),
                    format!("{}k", kbps),
                    "-maxrate".to_string(),
                    format!("{}k", kbps),
                    "-bufsize".to_string(),
                    format!("{}k", kbps.saturating_mul(2)),
                    "-c:a".to_string(),
                    "aac".to_string(),
                    "-b:a".to_string(),
                    format!("{}k", self.config.audio_bitrate_kbps),
                    "-ac".to_string(),
                    "1".to_string(),
                ]);
            }
            Operation::Trim { seconds } => {
                args.extend([
                    "-i".to_string(),
                    input,
                    "-t".to_string(),
                    seconds.to_string(),
                ]);
                Self::h264_args(&mut args);
                args.extend([
                    "-crf".to_string(),
                    TRIM_CRF.to_string(),
                    "-c:a".to_string(),
                    "aac".to_string(),
                    "-b:a".to_string(),
                    "128k".to_string(),
                ]);
            }
            Operation::Remux => {
                args.extend(
                    ["-i", input.as_str(), "-c", "copy", "-movflags", "+faststart"]
                        .map(String::from),
                );
            }
            Operation::Thumbnail { width } => {
                args.extend([
                    "-i".to_string(),
                    input,
                    "-vf".to_string(),
                    format!("thumbnail,scale={}:-2", width),
                    "-frames:v".to_string(),
                    "1".to_string(),
                    "-q:v".to_string(),
                    "5".to_string(),
                ]);
            }
            Operation::FrameGrab { at_secs } => {
                // Input seeking: fast and frame-accurate enough for stills.
                args.extend([
                    "-ss".to_string(),
                    format!("{:.3}", at_secs),
                    "-i".to_string(),
                    input,
                    "-frames:v".to_string(),
                    "1".to_string(),
                    "-q:v".to_string(),
                    "2".to_string(),
                ]);
            }
        }

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());
        args.push(job.output_path.to_string_lossy().to_string());
        args
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, ConverterError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: Option<ProbeFormat>,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: Option<String>,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
            duration: Option<String>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| ConverterError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let video_stream = probe
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"));
        let audio_stream = probe
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("audio"));

        let format_duration = probe
            .format
            .as_ref()
            .and_then(|f| f.duration.as_ref())
            .and_then(|d| d.parse::<f64>().ok());
        let stream_duration = video_stream
            .and_then(|s| s.duration.as_ref())
            .and_then(|d| d.parse::<f64>().ok());

        let size_bytes = probe
            .format
            .as_ref()
            .and_then(|f| f.size.as_ref())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let format_name = probe
            .format
            .as_ref()
            .and_then(|f| f.format_name.as_deref())
            .and_then(|n| n.split(',').next())
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs: format_duration.or(stream_duration),
            format: format_name.to_string(),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            width: video_stream.and_then(|s| s.width),
            height: video_stream.and_then(|s| s.height),
            audio_codec: audio_stream.and_then(|s| s.codec_name.clone()),
        })
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError> {
        if !path.exists() {
            return Err(ConverterError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let spec = CommandSpec::new(
            self.config.ffprobe_path.to_string_lossy(),
            Duration::from_secs(self.config.probe_timeout_secs),
        )
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path.to_string_lossy());

        let output = self.runner.run(spec).await;
        match output.outcome() {
            ExitOutcome::Success => Self::parse_probe_output(path, &output.stdout),
            ExitOutcome::NotFound => Err(ConverterError::FfprobeNotFound {
                path: self.config.ffprobe_path.clone(),
            }),
            ExitOutcome::TimedOut => Err(ConverterError::probe_failed("ffprobe timed out")),
            ExitOutcome::Failed(code) => Err(ConverterError::probe_failed(format!(
                "ffprobe exited with code {}: {}",
                code,
                tail(output.diagnostic(), STDERR_TAIL)
            ))),
        }
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        let start = Instant::now();

        if !job.input_path.exists() {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }
        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let spec = CommandSpec::new(
            self.config.ffmpeg_path.to_string_lossy(),
            Duration::from_secs(self.config.timeout_secs),
        )
        .args(self.build_args(&job));

        debug!(
            operation = job.operation.label(),
            input = %job.input_path.display(),
            output = %job.output_path.display(),
            "running ffmpeg"
        );

        let output = self.runner.run(spec).await;
        metrics::CONVERSION_DURATION
            .with_label_values(&[job.operation.label()])
            .observe(start.elapsed().as_secs_f64());

        match output.outcome() {
            ExitOutcome::Success => {}
            ExitOutcome::NotFound => {
                return Err(ConverterError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                })
            }
            ExitOutcome::TimedOut => {
                return Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
            ExitOutcome::Failed(code) => {
                let stderr = tail(output.diagnostic(), STDERR_TAIL);
                return Err(ConverterError::conversion_failed(
                    format!("FFmpeg exited with code: {}", code),
                    (!stderr.is_empty()).then_some(stderr),
                ));
            }
        }

        // A frame grab past the end exits 0 without writing anything.
        let output_meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| ConverterError::conversion_failed("Output file not created", None))?;
        if output_meta.len() == 0 {
            return Err(ConverterError::conversion_failed("Output file is empty", None));
        }

        Ok(ConversionResult {
            output_path: job.output_path,
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
