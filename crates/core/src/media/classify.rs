//! Image/video classification.

use std::path::Path;

use super::types::MediaKind;
use crate::converter::Converter;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "mkv", "webm", "avi", "mpeg", "mpg", "m4s", "ts",
];

/// Kind implied by the extension alone, `None` when it is inconclusive.
pub fn kind_from_extension(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Classifies by extension, probing for a video stream otherwise.
pub async fn classify(path: &Path, converter: &dyn Converter) -> MediaKind {
    if let Some(kind) = kind_from_extension(path) {
        return kind;
    }
    if converter.has_video_stream(path).await {
        MediaKind::Video
    } else {
        MediaKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockConverter};

    #[test]
    fn test_extensions() {
        assert_eq!(kind_from_extension(Path::new("a.JPG")), Some(MediaKind::Image));
        assert_eq!(kind_from_extension(Path::new("a.webp")), Some(MediaKind::Image));
        assert_eq!(kind_from_extension(Path::new("a.MKV")), Some(MediaKind::Video));
        assert_eq!(kind_from_extension(Path::new("a.ts")), Some(MediaKind::Video));
        assert_eq!(kind_from_extension(Path::new("a.gif")), None);
        assert_eq!(kind_from_extension(Path::new("noext")), None);
    }

    #[tokio::test]
    async fn test_probe_fallback() {
        let converter = MockConverter::new();
        assert_eq!(classify(Path::new("/d/a.bin"), &converter).await, MediaKind::Other);

        converter
            .set_probe("/d/a.bin", fixtures::video_info(10.0, 640, 360))
            .await;
        assert_eq!(classify(Path::new("/d/a.bin"), &converter).await, MediaKind::Video);
        assert_eq!(classify(Path::new("/d/a.png"), &converter).await, MediaKind::Image);
    }
}
