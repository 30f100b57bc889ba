//! Serde support: a map of byte-string keys to values, in key order.
//!
//! Scores and payloads are not part of the encoding. Deserializing
//! re-populates a fresh map through `try_insert`, so a repeated key is an
//! error rather than a silent overwrite.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::TrieMap;

struct KeyRef<'k>(&'k [u8]);

impl Serialize for KeyRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

struct KeyBuf(Vec<u8>);

struct KeyVisitor;

impl<'de> Visitor<'de> for KeyVisitor {
    type Value = KeyBuf;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a byte string key")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<KeyBuf, E> {
        Ok(KeyBuf(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<KeyBuf, E> {
        Ok(KeyBuf(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<KeyBuf, E> {
        Ok(KeyBuf(v.as_bytes().to_vec()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<KeyBuf, A::Error> {
        let mut key = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(b) = seq.next_element::<u8>()? {
            key.push(b);
        }
        Ok(KeyBuf(key))
    }
}

impl<'de> Deserialize<'de> for KeyBuf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_byte_buf(KeyVisitor)
    }
}

impl<V: Serialize> Serialize for TrieMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        let mut iter = self.iter();
        while let Some(entry) = iter.next_match() {
            map.serialize_entry(&KeyRef(entry.key), entry.value)?;
        }
        map.end()
    }
}

struct TrieMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for TrieMapVisitor<V> {
    type Value = TrieMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of byte string keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut trie = TrieMap::new();
        while let Some((KeyBuf(key), value)) = access.next_entry::<KeyBuf, V>()? {
            trie.try_insert(key, value)
                .map_err(<A::Error as de::Error>::custom)?;
        }
        Ok(trie)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for TrieMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TrieMapVisitor(PhantomData))
    }
}
