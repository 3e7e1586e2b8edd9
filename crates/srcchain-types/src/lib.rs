//! Foundation types for srcchain storage chains.
//!
//! Every layer of a storage chain that is keyed by raw bytes needs a key whose
//! equality and hash follow the byte content. This crate provides that key and
//! the small error type its parsers return.
//!
//! # Key Types
//!
//! - [`ByteKey`] — Content-compared, cheaply clonable binary key

pub mod byte_key;
pub mod error;

pub use byte_key::ByteKey;
pub use error::TypeError;
