//! Namespaced persistent keys.
//!
//! The persistent store is shared with unrelated data. `NamespacedKey`'s
//! private inner struct means the cache can only address a persistent key
//! by pairing a caller key with its reserved namespace, so it can never
//! read or delete anything outside that prefix.

use unite_core::{UniteResult, ValidationError};

/// A persistent-store key inside the cache namespace.
///
/// # Format
///
/// `<namespace><caller key>` as a plain UTF-8 string, e.g.
/// `unite-ui-component-cache:card:42`. The namespace is expected to end in
/// a delimiter so that prefix scans do not match sibling namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedKey {
    /// Private inner data - cannot be constructed externally
    inner: NamespacedKeyInner,
}

/// Private inner struct - prevents external construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NamespacedKeyInner {
    namespace: String,
    key: String,
}

impl NamespacedKey {
    /// Create a key in `namespace` for the caller-supplied `key`.
    ///
    /// Fails with [`ValidationError::EmptyKey`] for an empty caller key.
    pub fn new(namespace: &str, key: &str) -> UniteResult<Self> {
        if key.is_empty() {
            return Err(ValidationError::EmptyKey.into());
        }
        Ok(Self {
            inner: NamespacedKeyInner {
                namespace: namespace.to_string(),
                key: key.to_string(),
            },
        })
    }

    /// The caller-supplied key.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// The namespace prefix this key lives under.
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// Encode to the string stored in the persistent backend.
    pub fn encode(&self) -> String {
        let mut raw = String::with_capacity(self.inner.namespace.len() + self.inner.key.len());
        raw.push_str(&self.inner.namespace);
        raw.push_str(&self.inner.key);
        raw
    }

    /// Decode a raw persistent key, if it belongs to `namespace`.
    ///
    /// Returns `None` for keys outside the namespace and for the bare
    /// namespace itself (empty caller key).
    pub fn decode(namespace: &str, raw: &str) -> Option<Self> {
        let key = raw.strip_prefix(namespace)?;
        if key.is_empty() {
            return None;
        }
        Some(Self {
            inner: NamespacedKeyInner {
                namespace: namespace.to_string(),
                key: key.to_string(),
            },
        })
    }
}

impl std::fmt::Display for NamespacedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.inner.namespace, self.inner.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unite_core::{UniteError, DEFAULT_NAMESPACE};

    #[test]
    fn test_new_and_getters() {
        let key = NamespacedKey::new(DEFAULT_NAMESPACE, "card:42").expect("valid key");
        assert_eq!(key.key(), "card:42");
        assert_eq!(key.namespace(), DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_encode_format() {
        let key = NamespacedKey::new(DEFAULT_NAMESPACE, "card:42").expect("valid key");
        assert_eq!(key.encode(), "unite-ui-component-cache:card:42");
        assert_eq!(key.to_string(), key.encode());
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = NamespacedKey::new(DEFAULT_NAMESPACE, "");
        assert!(matches!(
            result,
            Err(UniteError::Validation(ValidationError::EmptyKey))
        ));
    }

    #[test]
    fn test_decode_roundtrip() {
        let key = NamespacedKey::new(DEFAULT_NAMESPACE, "orbit:hero").expect("valid key");
        let decoded = NamespacedKey::decode(DEFAULT_NAMESPACE, &key.encode()).expect("decode");
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_decode_rejects_foreign_keys() {
        assert!(NamespacedKey::decode(DEFAULT_NAMESPACE, "theme").is_none());
        assert!(NamespacedKey::decode(DEFAULT_NAMESPACE, "nuxt-color-mode").is_none());
        assert!(NamespacedKey::decode(DEFAULT_NAMESPACE, "unite-ui-component-cache").is_none());
    }

    #[test]
    fn test_decode_rejects_bare_namespace() {
        assert!(NamespacedKey::decode(DEFAULT_NAMESPACE, DEFAULT_NAMESPACE).is_none());
    }

    #[test]
    fn test_different_namespaces_different_keys() {
        let a = NamespacedKey::new("docs:", "card").expect("valid key");
        let b = NamespacedKey::new("demo:", "card").expect("valid key");
        assert_ne!(a.encode(), b.encode());
    }
}
