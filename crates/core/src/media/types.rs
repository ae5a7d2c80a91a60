//! Types for media classification and delivery.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::converter::ConverterError;

/// Deliverable category of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    /// Never delivered.
    Other,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Other => "other",
        }
    }
}

/// How a video is prepared before sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Send unmodified.
    Original,
    Hd,
    Sd,
    Lq,
    /// Stream copy into mp4, sent as a document.
    Lossless,
    /// Re-encode under the size bound.
    Compress,
    /// Frames at fixed offsets, sent as photos.
    Screenshots,
    /// First seconds only.
    Trim,
}

impl DeliveryMode {
    pub const ALL: [DeliveryMode; 8] = [
        Self::Original,
        Self::Hd,
        Self::Sd,
        Self::Lq,
        Self::Lossless,
        Self::Compress,
        Self::Screenshots,
        Self::Trim,
    ];

    /// Short code used inside callback payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Original => "orig",
            Self::Hd => "hd",
            Self::Sd => "sd",
            Self::Lq => "lq",
            Self::Lossless => "lossless",
            Self::Compress => "cmp",
            Self::Screenshots => "shots",
            Self::Trim => "trim",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    /// Button label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Original => "📦 Original",
            Self::Hd => "🎞 HD",
            Self::Sd => "📺 SD",
            Self::Lq => "📉 Low",
            Self::Lossless => "💾 Lossless",
            Self::Compress => "🗜 Compress",
            Self::Screenshots => "🖼 Screenshots",
            Self::Trim => "✂️ Trim",
        }
    }
}

/// Which path a successful delivery took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryRoute {
    /// First send succeeded.
    Direct,
    /// Succeeded after a stricter re-encode.
    Recompressed,
    /// Succeeded through the alternate transport.
    Alternate,
}

impl DeliveryRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Recompressed => "recompressed",
            Self::Alternate => "alternate",
        }
    }
}

/// Outcome of a successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivered {
    pub kind: MediaKind,
    pub route: DeliveryRoute,
    /// Messages sent; more than one for screenshots.
    pub items: usize,
}

/// Errors that end a delivery.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Neither an image nor a video; skipped without sending.
    #[error("Not a deliverable media type: {path}")]
    NotMediaType { path: PathBuf },

    /// Rejected for size on every tier.
    #[error("Payload too large: {0}")]
    TooLarge(String),

    /// Rejected for another reason on every tier.
    #[error("Delivery failed: {0}")]
    Failed(String),

    /// Nothing to send because conversion produced no output.
    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConverterError),
}

impl DeliveryError {
    pub fn not_media(path: &Path) -> Self {
        Self::NotMediaType {
            path: path.to_path_buf(),
        }
    }
}
