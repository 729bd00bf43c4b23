//! # lapse-cache
//!
//! Generic, thread-safe, in-memory key-value cache with per-entry expiration.
//!
//! - **Lazy expiration**: reads treat expired entries as absent without
//!   touching the store, so `get` only ever takes a shared lock.
//! - **Background sweep**: an optional thread physically removes expired
//!   entries on a fixed cadence. It is stopped when the cache is dropped
//!   or when [`TtlCache::stop_sweeper`] is called.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use lapse_cache::TtlCache;
//!
//! let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(30), Duration::from_secs(5));
//! cache.set("answer".to_string(), 42);
//! assert_eq!(cache.get("answer"), Some(42));
//!
//! cache.delete("answer");
//! assert_eq!(cache.get("answer"), None);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

mod cache;
pub mod config;
mod entry;
pub mod error;
mod sweeper;

pub use cache::{CacheStats, TtlCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
