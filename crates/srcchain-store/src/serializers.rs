//! Stock [`Serializer`] implementations.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::Serializer;
use crate::error::{SourceError, SourceResult};

/// Passes values through unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Identity;

impl<T: Clone> Serializer<T, T> for Identity {
    fn serialize(&self, value: &T) -> SourceResult<T> {
        Ok(value.clone())
    }

    fn deserialize(&self, value: T) -> SourceResult<T> {
        Ok(value)
    }
}

/// Encodes any serde type as bincode bytes.
pub struct Bincode<T>(PhantomData<fn() -> T>);

impl<T> Bincode<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Bincode<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Bincode<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Bincode<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Bincode")
    }
}

impl<T: Serialize + DeserializeOwned> Serializer<T, Vec<u8>> for Bincode<T> {
    fn serialize(&self, value: &T) -> SourceResult<Vec<u8>> {
        bincode::serialize(value).map_err(SourceError::serialization)
    }

    fn deserialize(&self, value: Vec<u8>) -> SourceResult<T> {
        bincode::deserialize(&value).map_err(SourceError::serialization)
    }
}

/// Encodes any serde type as JSON bytes.
pub struct Json<T>(PhantomData<fn() -> T>);

impl<T> Json<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Json<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Json")
    }
}

impl<T: Serialize + DeserializeOwned> Serializer<T, Vec<u8>> for Json<T> {
    fn serialize(&self, value: &T) -> SourceResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(SourceError::serialization)
    }

    fn deserialize(&self, value: Vec<u8>) -> SourceResult<T> {
        serde_json::from_slice(&value).map_err(SourceError::serialization)
    }
}

/// `String` ⇄ UTF-8 bytes. Decoding rejects invalid UTF-8.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Utf8;

impl Serializer<String, Vec<u8>> for Utf8 {
    fn serialize(&self, value: &String) -> SourceResult<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn deserialize(&self, value: Vec<u8>) -> SourceResult<String> {
        String::from_utf8(value).map_err(SourceError::serialization)
    }
}

/// Raw bytes ⇄ lowercase hex text, for stores keyed by strings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HexKey;

impl Serializer<Vec<u8>, String> for HexKey {
    fn serialize(&self, value: &Vec<u8>) -> SourceResult<String> {
        Ok(hex::encode(value))
    }

    fn deserialize(&self, value: String) -> SourceResult<Vec<u8>> {
        hex::decode(value).map_err(SourceError::serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Account {
        nonce: u64,
        balance: u128,
        code: Vec<u8>,
    }

    fn account() -> Account {
        Account {
            nonce: 7,
            balance: 1_000_000,
            code: vec![0x60, 0x80],
        }
    }

    #[test]
    fn identity_passes_through() {
        let bytes = vec![1u8, 2, 3];
        assert_eq!(Identity.serialize(&bytes).unwrap(), bytes);
        assert_eq!(Identity.deserialize(bytes.clone()).unwrap(), bytes);
    }

    #[test]
    fn bincode_roundtrip() {
        let codec = Bincode::<Account>::new();
        let encoded = codec.serialize(&account()).unwrap();
        assert_eq!(codec.deserialize(encoded).unwrap(), account());
    }

    #[test]
    fn bincode_rejects_truncated_input() {
        let codec = Bincode::<Account>::new();
        let mut encoded = codec.serialize(&account()).unwrap();
        encoded.truncate(3);
        let err = codec.deserialize(encoded).unwrap_err();
        assert!(matches!(err, SourceError::Serialization(_)));
    }

    #[test]
    fn json_roundtrip_and_format() {
        let codec = Json::<Account>::new();
        let encoded = codec.serialize(&account()).unwrap();
        assert!(std::str::from_utf8(&encoded).unwrap().contains("\"nonce\":7"));
        assert_eq!(codec.deserialize(encoded).unwrap(), account());
    }

    #[test]
    fn json_rejects_garbage() {
        let err = Json::<Account>::new()
            .deserialize(b"not json".to_vec())
            .unwrap_err();
        assert!(matches!(err, SourceError::Serialization(_)));
    }

    #[test]
    fn utf8_rejects_invalid_bytes() {
        assert_eq!(Utf8.deserialize(b"ok".to_vec()).unwrap(), "ok");
        let err = Utf8.deserialize(vec![0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, SourceError::Serialization(_)));
    }

    #[test]
    fn hex_key_roundtrip() {
        let encoded = HexKey.serialize(&vec![0xab, 0x01]).unwrap();
        assert_eq!(encoded, "ab01");
        assert_eq!(HexKey.deserialize(encoded).unwrap(), vec![0xab, 0x01]);
        assert!(HexKey.deserialize("xyz".into()).is_err());
    }
}
