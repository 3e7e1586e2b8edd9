//! Composable key-value source chains.
//!
//! Every persisted ledger object (blocks, accounts, trie nodes) reaches its
//! backing store through a chain of layers. Each layer wraps the next and
//! adds exactly one capability, without knowing anything about the layers
//! around it:
//!
//! ```text
//! caller -> SourceCodec -> ReadCache -> backing store
//! ```
//!
//! # Layers
//!
//! - [`ReadCache`] -- write-through cache with optional LRU bound and
//!   negative caching of missing keys
//! - [`BytesKeyReadCache`] -- `ReadCache` over `Vec<u8>` keys with a
//!   content-compared mapping
//! - [`SourceCodec`] -- converts keys and values between the caller's types
//!   and the wrapped source's types ([`ValueOnlyCodec`], [`BytesKeyCodec`])
//! - [`InMemorySource`] -- `HashMap`-based backing store for tests and embedding
//!
//! # Contracts
//!
//! All layers implement [`Source`], so chains nest arbitrarily. Caching layers
//! also implement [`CachedSource`], and layers that delegate to a single
//! wrapped source implement [`ChainedSource`].
//!
//! # Design Rules
//!
//! 1. Writes go straight through to the wrapped source; no layer here buffers.
//! 2. A layer never owns the lifecycle of the source it wraps.
//! 3. `Ok(None)` always means "not found" and never stands in for an error.
//! 4. Errors from the wrapped source are propagated unchanged, never retried.

pub mod cached;
pub mod codec;
pub mod config;
pub mod error;
pub mod estimator;
pub mod lru;
pub mod memory;
pub mod read_cache;
pub mod serializers;
pub mod stats;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export primary types at crate root for ergonomic imports.
pub use cached::Cached;
pub use codec::{BytesKeyCodec, Serializer, SourceCodec, ValueOnlyCodec};
pub use config::CacheConfig;
pub use error::{SourceError, SourceResult};
pub use estimator::{ByteLenEstimator, ConstEstimator, MemSizeEstimator};
pub use lru::CacheMap;
pub use memory::InMemorySource;
pub use read_cache::{BytesKeyReadCache, MapKey, ReadCache};
pub use serializers::{Bincode, HexKey, Identity, Json, Utf8};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use traits::{CacheObserver, CachedSource, ChainedSource, Source};

pub use srcchain_types::ByteKey;
