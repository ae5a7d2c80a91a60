//! Acquisition pipeline.
//!
//! Fetches the media behind a URL into a job directory by walking an ordered
//! chain of extraction tiers:
//!
//! 1. gallery-dl, with metadata sidecars and the credential triple
//! 2. gallery-dl as a Python module, only when the binary is missing
//! 3. yt-dlp with a bounded filename template
//! 4. yt-dlp as a Python module, only when the binary is missing
//! 5. a raw page scrape for direct media links, only when a tool reported
//!    the URL as unsupported
//!
//! A tier that times out after writing sendable files counts as a success.

mod config;
mod fetch;
pub mod files;
mod pipeline;
pub mod scrape;
mod strategy;
mod types;

pub use config::AcquireConfig;
pub use fetch::{HttpFetcher, ReqwestFetcher};
pub use pipeline::{error_tail, AcquisitionPipeline};
pub use strategy::{
    default_chain, gallery_dl_args, interpret, is_unsupported, ytdlp_args, AcquireContext, Plan,
    Planner, Strategy,
};
pub use types::{AcquireError, AcquireResult, Acquired, Attempt, AttemptOutcome, Tool};
