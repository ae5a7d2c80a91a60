//! Testing utilities and mock implementations of every external
//! collaborator, so the whole engine can run without real tools, network
//! or chat platform.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediafetch_core::testing::{MockConverter, MockRunner, MockTransport};
//!
//! let runner = MockRunner::new();
//! runner.on("gallery-dl", MockResponse::success().with_file(path, bytes)).await;
//!
//! let transport = MockTransport::new();
//! transport.fail_next(CallKind::Video, TransportError::TooLarge("413".into())).await;
//! ```

mod mock_converter;
mod mock_fetcher;
mod mock_runner;
mod mock_transport;

pub use mock_converter::MockConverter;
pub use mock_fetcher::MockFetcher;
pub use mock_runner::{MockResponse, MockRunner};
pub use mock_transport::{CallKind, MockTransport, TransportCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::converter::MediaInfo;
    use std::path::{Path, PathBuf};

    /// Writes `len` bytes at `dir/rel`, creating parent directories.
    pub fn media_file(dir: &Path, rel: &str, len: usize) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = std::fs::write(&path, vec![0u8; len]);
        path
    }

    /// Probe result of a playable h264 video.
    pub fn video_info(duration_secs: f64, width: u32, height: u32) -> MediaInfo {
        MediaInfo {
            duration_secs: Some(duration_secs),
            format: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
            video_codec: Some("h264".to_string()),
            width: Some(width),
            height: Some(height),
            audio_codec: Some("aac".to_string()),
            ..Default::default()
        }
    }
}
