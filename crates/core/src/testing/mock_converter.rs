//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::converter::{ConversionJob, ConversionResult, Converter, ConverterError, MediaInfo};

#[derive(Debug)]
struct MockConverterState {
    conversions: Vec<ConversionJob>,
    probes: HashMap<PathBuf, MediaInfo>,
    default_probe: Option<MediaInfo>,
    failing_operations: HashSet<&'static str>,
    output_size: usize,
}

impl Default for MockConverterState {
    fn default() -> Self {
        Self {
            conversions: Vec::new(),
            probes: HashMap::new(),
            default_probe: None,
            failing_operations: HashSet::new(),
            output_size: 1024,
        }
    }
}

/// Mock implementation of the Converter trait.
///
/// Conversions write an output file of a configurable size. Probes answer
/// from per-path results, then the default, and fail otherwise.
///
/// # Example
///
/// ```rust,ignore
/// let converter = MockConverter::new();
/// converter.set_default_probe(MediaInfo { video_codec: Some("h264".into()), ..Default::default() }).await;
/// converter.fail_operation("thumbnail").await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockConverter {
    state: Arc<RwLock<MockConverterState>>,
}

impl MockConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every conversion job submitted, in order.
    pub async fn conversions(&self) -> Vec<ConversionJob> {
        self.state.read().await.conversions.clone()
    }

    /// Labels of every submitted operation, in order.
    pub async fn operation_labels(&self) -> Vec<&'static str> {
        self.state
            .read()
            .await
            .conversions
            .iter()
            .map(|job| job.operation.label())
            .collect()
    }

    pub async fn set_probe(&self, path: impl AsRef<Path>, info: MediaInfo) {
        self.state
            .write()
            .await
            .probes
            .insert(path.as_ref().to_path_buf(), info);
    }

    pub async fn set_default_probe(&self, info: MediaInfo) {
        self.state.write().await.default_probe = Some(info);
    }

    /// Makes every operation with this label fail.
    pub async fn fail_operation(&self, label: &'static str) {
        self.state.write().await.failing_operations.insert(label);
    }

    /// Size of the files written by successful conversions.
    pub async fn set_output_size(&self, bytes: usize) {
        self.state.write().await.output_size = bytes;
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError> {
        let state = self.state.read().await;
        state
            .probes
            .get(path)
            .or(state.default_probe.as_ref())
            .map(|info| MediaInfo {
                path: path.to_path_buf(),
                ..info.clone()
            })
            .ok_or_else(|| ConverterError::probe_failed("no probe result configured"))
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        let (failing, size) = {
            let mut state = self.state.write().await;
            state.conversions.push(job.clone());
            (
                state.failing_operations.contains(job.operation.label()),
                state.output_size,
            )
        };

        if !job.input_path.exists() {
            return Err(ConverterError::InputNotFound {
                path: job.input_path,
            });
        }
        if failing {
            return Err(ConverterError::conversion_failed(
                format!("{} failed", job.operation.label()),
                None,
            ));
        }

        tokio::fs::write(&job.output_path, vec![0u8; size]).await?;
        Ok(ConversionResult {
            output_path: job.output_path,
            output_size_bytes: size as u64,
            duration_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::Operation;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_convert_writes_output_and_records() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"x").unwrap();
        let output = dir.path().join("out.mp4");

        let converter = MockConverter::new();
        converter.set_output_size(7).await;
        let result = converter
            .convert(ConversionJob::new(&input, &output, Operation::Remux))
            .await
            .unwrap();

        assert_eq!(result.output_size_bytes, 7);
        assert_eq!(std::fs::metadata(&output).unwrap().len(), 7);
        assert_eq!(converter.operation_labels().await, vec!["remux"]);
    }

    #[tokio::test]
    async fn test_failures_and_probes() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"x").unwrap();

        let converter = MockConverter::new();
        converter.fail_operation("trim").await;
        let err = converter
            .convert(ConversionJob::new(
                &input,
                dir.path().join("t.mp4"),
                Operation::Trim { seconds: 30 },
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::ConversionFailed { .. }));

        assert!(converter.probe(&input).await.is_err());
        converter
            .set_default_probe(MediaInfo {
                duration_secs: Some(3.0),
                ..Default::default()
            })
            .await;
        let info = converter.probe(&input).await.unwrap();
        assert_eq!(info.path, input);
        assert_eq!(info.duration_secs, Some(3.0));
    }
}
