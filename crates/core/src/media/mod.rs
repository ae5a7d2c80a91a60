//! Media classification and delivery.
//!
//! A file is classified as image, video or other. Images are sent as
//! photos. Videos go through the selected [`DeliveryMode`], get duration,
//! dimension and thumbnail hints, and escalate when the transport refuses
//! them: one stricter re-encode, then the alternate transport when
//! configured.

mod caption;
mod classify;
mod config;
mod pipeline;
mod types;

pub use caption::{build_caption, escape_html, truncate_caption};
pub use classify::{classify, kind_from_extension};
pub use config::DeliveryConfig;
pub use pipeline::MediaPipeline;
pub use types::{Delivered, DeliveryError, DeliveryMode, DeliveryRoute, MediaKind};
