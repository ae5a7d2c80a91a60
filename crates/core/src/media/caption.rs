//! HTML captions for delivered media.

const FALLBACK_TITLE: &str = "Media";

/// Escapes the characters significant in chat HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Cuts `caption` to `cut` characters plus `...` when it exceeds `limit`.
pub fn truncate_caption(caption: String, limit: usize, cut: usize) -> String {
    if caption.chars().count() <= limit {
        return caption;
    }
    let mut out: String = caption.chars().take(cut).collect();
    out.push_str("...");
    out
}

/// Bold title plus an optional source link.
///
/// The title falls back to `file_name`, then to a generic label.
pub fn build_caption(
    title: Option<&str>,
    link: Option<&str>,
    file_name: Option<&str>,
    limit: usize,
    cut: usize,
) -> String {
    let title = [title, file_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .unwrap_or(FALLBACK_TITLE);

    let mut caption = format!("🎬 <b>{}</b>", escape_html(title));
    if let Some(link) = link.map(str::trim).filter(|l| !l.is_empty()) {
        caption.push_str(&format!("\n🔗 <a href=\"{}\">source</a>", escape_html(link)));
    }
    truncate_caption(caption, limit, cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_build_caption() {
        assert_eq!(
            build_caption(Some("A & B"), Some("https://x/p?a=1&b=2"), None, 1000, 980),
            "🎬 <b>A &amp; B</b>\n🔗 <a href=\"https://x/p?a=1&amp;b=2\">source</a>"
        );
        assert_eq!(
            build_caption(None, None, Some("clip.mp4"), 1000, 980),
            "🎬 <b>clip.mp4</b>"
        );
        assert_eq!(build_caption(Some("  "), None, None, 1000, 980), "🎬 <b>Media</b>");
    }

    #[test]
    fn test_long_caption_is_cut() {
        let title = "t".repeat(2000);
        let caption = build_caption(Some(&title), None, None, 1000, 980);
        assert_eq!(caption.chars().count(), 983);
        assert!(caption.ends_with("..."));

        let short = truncate_caption("abc".to_string(), 3, 1);
        assert_eq!(short, "abc");
    }
}
