//! In-memory job and item-token stores.
//!
//! Both stores hand out random 32-hex-digit keys that travel through
//! callback payloads. Nothing is persisted; an [`EvictionPolicy`] bounds
//! how much state accumulates.

mod config;
mod ephemeral;
mod jobs;
mod tokens;
mod types;

pub use config::StoreConfig;
pub use ephemeral::{generate_key, EphemeralStore, Evicted, EvictionPolicy, EvictionReason};
pub use jobs::JobStore;
pub use tokens::TokenStore;
pub use types::{ItemToken, Job, JobState, SourceRef};
