//! Last-resort tier: scan a raw page for direct media links.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static MEDIA_LINK: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r#"(?i)https?://[^\s"'<>]+\.(?:mp4|m4v|mov|mkv|webm|avi|m4s|ts|m3u8|jpg|jpeg|png|gif|webp)(?:\?[^\s"'<>]*)?"#,
    )
    .ok()
});

static VIDEO_LINK: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)\.(?:mp4|m4v|mov|mkv|webm|avi|mpeg|mpg|m4s|ts)(?:\?|$)").ok()
});

static IMAGE_LINK: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)\.(?:jpg|jpeg|png|webp|gif)(?:\?|$)").ok());

/// How a scraped link is handed to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Video,
    Photo,
    Document,
}

/// Direct media URLs in `page`, deduplicated, in order of first appearance.
///
/// JSON-escaped slashes (`\/`) are unescaped first so links embedded in
/// inline scripts are found too.
pub fn extract_media_links(page: &str) -> Vec<String> {
    let Some(re) = MEDIA_LINK.as_ref() else {
        return Vec::new();
    };
    let normalized = page.replace("\\/", "/");

    let mut out: Vec<String> = Vec::new();
    for found in re.find_iter(&normalized) {
        let link = found.as_str();
        if !out.iter().any(|seen| seen == link) {
            out.push(link.to_string());
        }
    }
    out
}

/// Whether `url` looks like a direct media link.
pub fn is_media_link(url: &str) -> bool {
    MEDIA_LINK
        .as_ref()
        .and_then(|re| re.find(url))
        .is_some_and(|m| m.start() == 0 && m.end() == url.len())
}

/// Chooses the send method for a link by its extension.
pub fn link_kind(url: &str) -> LinkKind {
    let matches = |re: &Lazy<Option<Regex>>| re.as_ref().is_some_and(|re| re.is_match(url));
    if matches(&VIDEO_LINK) {
        LinkKind::Video
    } else if matches(&IMAGE_LINK) {
        LinkKind::Photo
    } else {
        LinkKind::Document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_dedupes_and_keeps_order() {
        let page = r#"
            <img src="https://cdn.site/b.jpg">
            <a href="https://cdn.site/a.png?w=200">a</a>
            <img src="https://cdn.site/b.jpg">
            <script>var v = "https:\/\/cdn.site\/v\/clip.MP4";</script>
            <a href="https://cdn.site/page.html">no</a>
        "#;

        let links = extract_media_links(page);
        assert_eq!(
            links,
            vec![
                "https://cdn.site/b.jpg",
                "https://cdn.site/a.png?w=200",
                "https://cdn.site/v/clip.MP4",
            ]
        );
    }

    #[test]
    fn test_no_links() {
        assert!(extract_media_links("<html><body>nothing</body></html>").is_empty());
        assert!(extract_media_links("").is_empty());
    }

    #[test]
    fn test_link_kind() {
        assert_eq!(link_kind("https://x/a.mp4"), LinkKind::Video);
        assert_eq!(link_kind("https://x/a.webm?t=1"), LinkKind::Video);
        assert_eq!(link_kind("https://x/a.JPEG"), LinkKind::Photo);
        assert_eq!(link_kind("https://x/a.gif"), LinkKind::Photo);
        assert_eq!(link_kind("https://x/index.m3u8"), LinkKind::Document);
    }

    #[test]
    fn test_is_media_link() {
        assert!(is_media_link("https://cdn.example/v/clip.mp4?sig=1"));
        assert!(!is_media_link("https://example.com/watch?v=1"));
        assert!(!is_media_link("see https://x/a.jpg"));
    }
}
