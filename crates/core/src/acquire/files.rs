//! Inspection of a job directory after extraction.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::scrape::is_media_link;

/// Suffixes of metadata sidecars and incomplete downloads.
const SKIPPED_SUFFIXES: &[&str] = &[".json", ".part", ".ytdl", ".temp", ".tmp"];

const TITLE_KEYS: &[&str] = &["title", "filename", "id"];
const LINK_KEYS: &[&str] = &["webpage_url", "url", "post_url", "original_url"];
const DIRECT_URL_KEYS: &[&str] = &["file_url", "video_url", "url"];

/// Title and page link recovered from a metadata sidecar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SidecarMeta {
    pub title: Option<String>,
    pub href: Option<String>,
}

impl SidecarMeta {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.href.is_none()
    }
}

/// Every regular file under `dir`, recursively, sorted per directory.
///
/// Unreadable directories are skipped.
pub fn walk_files(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk_into(dir, &mut out);
    out
}

fn walk_into(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            walk_into(&path, out);
        } else if path.is_file() {
            out.push(path);
        }
    }
}

/// Whether a file is deliverable content rather than a sidecar or a
/// leftover of an interrupted download.
pub fn is_sendable(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let lower = name.to_lowercase();
    if SKIPPED_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return false;
    }
    // yt-dlp fragment files: `name.mp4.part-Frag12`
    !lower.contains(".part-frag")
}

/// Sendable files under `dir`, in walk order.
pub fn sendable_files(dir: &Path) -> Vec<PathBuf> {
    walk_files(dir)
        .into_iter()
        .filter(|p| is_sendable(p))
        .collect()
}

fn string_field(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match data.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn read_json(path: &Path) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

/// Title/link from the first readable sidecar under `dir` that has either.
pub fn find_metadata(dir: &Path) -> SidecarMeta {
    walk_files(dir)
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .filter_map(|p| read_json(&p))
        .map(|data| SidecarMeta {
            title: string_field(&data, TITLE_KEYS),
            href: string_field(&data, LINK_KEYS),
        })
        .find(|meta| !meta.is_empty())
        .unwrap_or_default()
}

/// Sidecar written next to `file`, if any (`a.mp4.json` or `a.info.json`).
pub fn sidecar_for(file: &Path) -> Option<PathBuf> {
    let mut with_json = file.as_os_str().to_owned();
    with_json.push(".json");
    let candidate = PathBuf::from(with_json);
    if candidate.is_file() {
        return Some(candidate);
    }

    let stem = file.file_stem()?;
    let mut info = stem.to_owned();
    info.push(".info.json");
    let candidate = file.with_file_name(info);
    candidate.is_file().then_some(candidate)
}

/// Direct media URL recorded in the file's own sidecar.
pub fn direct_media_url(file: &Path) -> Option<String> {
    let data = read_json(&sidecar_for(file)?)?;
    DIRECT_URL_KEYS.iter().find_map(|key| {
        data.get(*key)
            .and_then(Value::as_str)
            .filter(|u| is_media_link(u))
            .map(str::to_string)
    })
}

/// Page URL recorded in the file's own sidecar.
pub fn item_page_url(file: &Path) -> Option<String> {
    let data = read_json(&sidecar_for(file)?)?;
    LINK_KEYS.iter().find_map(|key| {
        data.get(*key)
            .and_then(Value::as_str)
            .filter(|u| u.starts_with("http") && !is_media_link(u))
            .map(str::to_string)
    })
}

/// Best-effort recursive removal; failures are ignored.
pub async fn remove_dir_quietly(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        tracing::debug!(dir = %dir.display(), error = %e, "cleanup failed");
    }
}

/// Best-effort file removal; failures are ignored.
pub async fn remove_file_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::debug!(path = %path.display(), error = %e, "cleanup failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_walk_is_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.jpg", "");
        touch(dir.path(), "a/z.jpg", "");
        touch(dir.path(), "a/y.jpg", "");
        touch(dir.path(), "c.mp4", "");

        let names: Vec<String> = walk_files(dir.path())
            .iter()
            .map(|p| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["a/y.jpg", "a/z.jpg", "b.jpg", "c.mp4"]);
    }

    #[test]
    fn test_sendable_filter() {
        assert!(is_sendable(Path::new("/d/clip.mp4")));
        assert!(is_sendable(Path::new("/d/photo.JPG")));
        assert!(!is_sendable(Path::new("/d/clip.mp4.json")));
        assert!(!is_sendable(Path::new("/d/clip.info.json")));
        assert!(!is_sendable(Path::new("/d/clip.mp4.part")));
        assert!(!is_sendable(Path::new("/d/clip.mp4.ytdl")));
        assert!(!is_sendable(Path::new("/d/clip.temp")));
        assert!(!is_sendable(Path::new("/d/clip.mp4.part-Frag3")));
    }

    #[test]
    fn test_sendable_files_in_missing_dir() {
        assert!(sendable_files(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn test_find_metadata_prefers_first_useful_sidecar() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.json", "{broken");
        touch(dir.path(), "b.json", r#"{"unrelated": true}"#);
        touch(
            dir.path(),
            "c.json",
            r#"{"id": 12345, "post_url": "https://site/p/12345"}"#,
        );
        touch(dir.path(), "d.json", r#"{"title": "later"}"#);

        let meta = find_metadata(dir.path());
        assert_eq!(meta.title.as_deref(), Some("12345"));
        assert_eq!(meta.href.as_deref(), Some("https://site/p/12345"));
    }

    #[test]
    fn test_find_metadata_key_priority() {
        let dir = TempDir::new().unwrap();
        touch(
            dir.path(),
            "x.json",
            r#"{"filename": "f", "title": "T", "url": "u", "webpage_url": "w"}"#,
        );
        let meta = find_metadata(dir.path());
        assert_eq!(meta.title.as_deref(), Some("T"));
        assert_eq!(meta.href.as_deref(), Some("w"));

        let empty = TempDir::new().unwrap();
        assert!(find_metadata(empty.path()).is_empty());
    }

    #[test]
    fn test_direct_media_url_from_sidecar() {
        let dir = TempDir::new().unwrap();
        let clip = touch(dir.path(), "clip.mp4", "x");
        touch(
            dir.path(),
            "clip.mp4.json",
            r#"{"url": "https://cdn.example/v/clip.mp4?sig=1"}"#,
        );
        assert_eq!(
            direct_media_url(&clip).as_deref(),
            Some("https://cdn.example/v/clip.mp4?sig=1")
        );

        let other = touch(dir.path(), "other.mp4", "x");
        touch(
            dir.path(),
            "other.info.json",
            r#"{"url": "https://example.com/watch?v=1"}"#,
        );
        assert_eq!(sidecar_for(&other), Some(dir.path().join("other.info.json")));
        assert_eq!(direct_media_url(&other), None);
        assert_eq!(
            item_page_url(&other).as_deref(),
            Some("https://example.com/watch?v=1")
        );
        assert_eq!(item_page_url(&clip), None);
    }

    #[tokio::test]
    async fn test_quiet_removal() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "sub/a.jpg", "");
        remove_file_quietly(&file).await;
        assert!(!file.exists());
        remove_file_quietly(&file).await;

        let sub = dir.path().join("sub");
        remove_dir_quietly(&sub).await;
        assert!(!sub.exists());
        remove_dir_quietly(&sub).await;
    }
}
