//! Payload codecs.
//!
//! The cache stores payloads as JSON values inside a [`StoredEntry`]. A
//! codec is the caller-supplied serializer/deserializer pair converting
//! the payload type to and from that value.
//!
//! [`StoredEntry`]: crate::StoredEntry

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use unite_core::{CodecError, UniteResult};

/// Converts payloads of type `T` to and from JSON values.
pub trait PayloadCodec<T>: Send + Sync {
    fn to_value(&self, payload: &T) -> UniteResult<Value>;

    fn from_value(&self, value: Value) -> UniteResult<T>;
}

/// serde-based codec for any `T: Serialize + DeserializeOwned`.
pub struct JsonCodec<T> {
    _payload: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _payload: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T> PayloadCodec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn to_value(&self, payload: &T) -> UniteResult<Value> {
        serde_json::to_value(payload).map_err(|e| {
            CodecError::Serialize {
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn from_value(&self, value: Value) -> UniteResult<T> {
        serde_json::from_value(value).map_err(|e| {
            CodecError::Deserialize {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Codec built from a pair of closures.
///
/// Useful for payloads without serde impls, or for storing a projection of
/// a larger value.
pub struct FnCodec<E, D> {
    encode: E,
    decode: D,
}

impl<E, D> FnCodec<E, D> {
    pub fn new(encode: E, decode: D) -> Self {
        Self { encode, decode }
    }
}

impl<T, E, D> PayloadCodec<T> for FnCodec<E, D>
where
    E: Fn(&T) -> UniteResult<Value> + Send + Sync,
    D: Fn(Value) -> UniteResult<T> + Send + Sync,
{
    fn to_value(&self, payload: &T) -> UniteResult<Value> {
        (self.encode)(payload)
    }

    fn from_value(&self, value: Value) -> UniteResult<T> {
        (self.decode)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Card {
        title: String,
        stars: u32,
    }

    #[test]
    fn test_json_codec_struct() {
        let codec = JsonCodec::<Card>::new();
        let card = Card {
            title: "Foo".to_string(),
            stars: 3,
        };
        let value = codec.to_value(&card).expect("encode");
        assert_eq!(value, json!({"title": "Foo", "stars": 3}));
        assert_eq!(codec.from_value(value).expect("decode"), card);
    }

    #[test]
    fn test_json_codec_shape_mismatch() {
        let codec = JsonCodec::<Card>::new();
        let err = codec
            .from_value(json!({"title": 7}))
            .expect_err("wrong shape should fail");
        assert!(err.is_corruption());
    }

    #[test]
    fn test_fn_codec() {
        let codec = FnCodec::new(
            |n: &u64| -> UniteResult<Value> { Ok(Value::String(n.to_string())) },
            |v: Value| -> UniteResult<u64> {
                v.as_str()
                    .and_then(|s| s.parse::<u64>().ok())
                    .ok_or_else(|| {
                        CodecError::Deserialize {
                            reason: "expected numeric string".to_string(),
                        }
                        .into()
                    })
            },
        );
        let value = PayloadCodec::<u64>::to_value(&codec, &42).expect("encode");
        assert_eq!(value, json!("42"));
        assert_eq!(PayloadCodec::<u64>::from_value(&codec, value).expect("decode"), 42);
        assert!(PayloadCodec::<u64>::from_value(&codec, json!(true)).is_err());
    }
}
