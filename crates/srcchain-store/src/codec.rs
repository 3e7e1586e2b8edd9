//! Key/value transcoding layer.
//!
//! A [`SourceCodec`] exposes `K`/`V` to its caller while the wrapped source
//! stores `SK`/`SV`. Every operation transcodes its arguments with the
//! configured [`Serializer`]s and forwards to the wrapped source; the layer
//! keeps no state of its own.

use std::marker::PhantomData;

use crate::error::SourceResult;
use crate::serializers::Identity;
use crate::traits::{ChainedSource, Source};

/// Pure, deterministic two-way conversion between `A` and `B`.
///
/// For every `a` a caller will pass in, `deserialize(serialize(a)?)` must
/// yield a value equal to `a`. The converse need not hold: `B` may be a
/// larger domain, and decoding an arbitrary `B` may fail.
pub trait Serializer<A, B>: Send + Sync {
    fn serialize(&self, value: &A) -> SourceResult<B>;

    fn deserialize(&self, value: B) -> SourceResult<A>;
}

/// Layer that transcodes keys and values around a wrapped source.
pub struct SourceCodec<K, V, SK, SV, S, KS, VS> {
    source: S,
    key_serializer: KS,
    value_serializer: VS,
    flush_source: bool,
    _types: PhantomData<fn(K, V) -> (SK, SV)>,
}

/// Codec that only converts values; keys pass through unchanged.
pub type ValueOnlyCodec<K, V, SV, S, VS> = SourceCodec<K, V, K, SV, S, Identity, VS>;

/// Value-only codec for sources keyed by raw bytes.
pub type BytesKeyCodec<V, SV, S, VS> = ValueOnlyCodec<Vec<u8>, V, SV, S, VS>;

impl<K, V, SK, SV, S, KS, VS> SourceCodec<K, V, SK, SV, S, KS, VS>
where
    S: Source<SK, SV>,
    KS: Serializer<K, SK>,
    VS: Serializer<V, SV>,
{
    /// Wrap `source`, converting keys with `key_serializer` and values with
    /// `value_serializer`.
    ///
    /// Flushing the codec always flushes `source`.
    pub fn new(source: S, key_serializer: KS, value_serializer: VS) -> Self {
        Self {
            source,
            key_serializer,
            value_serializer,
            flush_source: true,
            _types: PhantomData,
        }
    }

    pub fn key_serializer(&self) -> &KS {
        &self.key_serializer
    }

    pub fn value_serializer(&self) -> &VS {
        &self.value_serializer
    }
}

impl<K, V, SV, S, VS> SourceCodec<K, V, K, SV, S, Identity, VS>
where
    K: Clone,
    S: Source<K, SV>,
    VS: Serializer<V, SV>,
{
    /// Wrap `source`, converting only values.
    pub fn value_only(source: S, value_serializer: VS) -> Self {
        Self::new(source, Identity, value_serializer)
    }
}

impl<K, V, SK, SV, S, KS, VS> Source<K, V> for SourceCodec<K, V, SK, SV, S, KS, VS>
where
    S: Source<SK, SV>,
    KS: Serializer<K, SK>,
    VS: Serializer<V, SV>,
{
    fn put(&self, key: K, value: V) -> SourceResult<()> {
        // Both conversions happen before the wrapped source sees anything.
        let source_key = self.key_serializer.serialize(&key)?;
        let source_value = self.value_serializer.serialize(&value)?;
        self.source.put(source_key, source_value)
    }

    fn get(&self, key: &K) -> SourceResult<Option<V>> {
        let source_key = self.key_serializer.serialize(key)?;
        match self.source.get(&source_key)? {
            Some(source_value) => self.value_serializer.deserialize(source_value).map(Some),
            None => Ok(None),
        }
    }

    fn delete(&self, key: &K) -> SourceResult<()> {
        let source_key = self.key_serializer.serialize(key)?;
        self.source.delete(&source_key)
    }

    fn flush(&self) -> SourceResult<bool> {
        // The codec itself never holds anything to flush.
        if self.flush_source {
            return self.source.flush();
        }
        Ok(false)
    }
}

impl<K, V, SK, SV, S, KS, VS> ChainedSource<SK, SV> for SourceCodec<K, V, SK, SV, S, KS, VS>
where
    S: Source<SK, SV>,
{
    type Inner = S;

    fn source(&self) -> &S {
        &self.source
    }

    fn flush_source(&self) -> bool {
        self.flush_source
    }
}

impl<K, V, SK, SV, S, KS, VS> std::fmt::Debug for SourceCodec<K, V, SK, SV, S, KS, VS>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceCodec")
            .field("source", &self.source)
            .field("flush_source", &self.flush_source)
            .finish()
    }
}
