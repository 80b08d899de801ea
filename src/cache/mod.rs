//! In-memory caches shared by the translation and speech paths.
//!
//! Two variants with the same `get` / `put` / `invalidate` / `clear` / `stats`
//! contract:
//! * [`TtlCache`]: entries expire `ttl` after insertion and are evicted
//!   lazily on the next lookup.
//! * [`BoundedCache`]: entries never expire; once `max_entries` is reached the
//!   oldest fifth (by insertion order) is evicted before the next insert.
//!
//! Both are `Send + Sync` and take `&self`, so a single instance can be held
//! by an orchestrator and shared across request tasks.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use kumajala::cache::{translation_key, TtlCache};
//!
//! let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(3600));
//! let key = translation_key("Bonjour", "bété");
//! cache.put(key.clone(), "Akwaba".to_string());
//! assert_eq!(cache.get(&key).as_deref(), Some("Akwaba"));
//! ```

pub mod bounded;
pub mod key;
pub mod ttl;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use bounded::{BoundedCache, BoundedCacheStats, Weighted};
pub use key::{audio_key, translation_key};
pub use ttl::{TtlCache, TtlCacheStats};
