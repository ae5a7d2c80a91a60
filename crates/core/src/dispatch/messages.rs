//! User-facing texts.

pub const GREETING: &str = "Hi 👋\nSend me a link and pick how you want the media delivered.";
pub const HELP: &str = "Send a link starting with http:// or https://.\n\
Pick a mode to get the media directly, or Browse to navigate large galleries by group and post.\n\
Delivered videos carry buttons to get them again in another quality.";
pub const NOT_AUTHORIZED: &str = "⛔ You are not authorized to use this bot.";
pub const INVALID_LINK: &str = "Send a valid http(s) link.";
pub const CHOOSE_MODE: &str = "How should I fetch this link?";
pub const DOWNLOADING: &str = "⏳ Downloading...";
pub const FETCHING_ITEM: &str = "⏳ Fetching the item again...";
pub const NOTHING_TO_SEND: &str = "Done, but there were no files to send.";
pub const NOTHING_LEFT: &str = "Nothing left to send here.";
pub const EXPIRED: &str = "⌛ This action has expired. Send the link again.";
pub const UNKNOWN_ACTION: &str = "Unknown action.";
pub const ALREADY_STARTED: &str = "Already in progress.";

pub fn download_failed(tool: &str, error: &str) -> String {
    format!("❌ Download failed ({})\n{}", tool, error)
}

pub fn fallback_used(tool: &str) -> String {
    format!("↪️ gallery-dl failed, fetched with {} instead.", tool)
}

pub fn scrape_summary(sent: usize) -> String {
    format!("✅ Done via page scan. Sent {} item(s).", sent)
}

pub fn delivery_summary(sent: usize, failed: usize) -> String {
    if failed == 0 {
        format!("✅ Sent {} file(s).", sent)
    } else {
        format!("✅ Sent {} file(s), {} failed.", sent, failed)
    }
}

pub fn files_capped(skipped: usize, cap: usize) -> String {
    format!("⚠️ Only the first {} files are sent; skipped {}.", cap, skipped)
}

pub fn file_failed(name: &str, error: &str) -> String {
    format!("⚠️ {}: {}", name, error)
}

pub fn bulk_progress(done: usize, total: usize) -> String {
    format!("⏳ Sending {}/{}...", done, total)
}

pub fn bulk_done(sent: usize, total: usize, target: &str) -> String {
    format!("✅ Sent {}/{} file(s) from {}.", sent, total, target)
}

pub fn group_cleaned(removed: usize, name: &str) -> String {
    format!("🧹 Removed {} file(s) from {}.", removed, name)
}

pub fn item_failed(error: &str) -> String {
    format!("❌ Could not fetch the item: {}", error)
}

pub fn error(error: &str) -> String {
    format!("❌ Error: {}", error)
}
