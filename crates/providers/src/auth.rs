//! Credential pools for key-rotation failover.
//!
//! A [`CredentialSet`] holds the API keys configured for one provider. Every
//! call asks for [`CredentialSet::shuffled`], a fresh uniform permutation, so
//! load spreads across keys and no single key is always hammered first.
//!
//! The set is immutable after construction and is shared across concurrent
//! calls behind an `Arc`.

use rand::seq::SliceRandom;
use sl_domain::error::{Error, Result};

/// An ordered, non-empty collection of API keys for one provider.
#[derive(Clone)]
pub struct CredentialSet {
    keys: Vec<String>,
}

impl CredentialSet {
    /// Build a set from already-resolved keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `keys` is empty.
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::Config(
                "at least one API key is required".into(),
            ));
        }
        Ok(Self { keys })
    }

    /// Build a set from a comma-separated environment variable.
    ///
    /// Entries are trimmed and blank entries dropped, so `"a, b,"` yields two
    /// keys.
    ///
    /// # Errors
    ///
    /// - variable unset or empty: `"{var} environment variable not set"`
    /// - only blank entries (e.g. `","`): `"{var} environment variable is empty"`
    pub fn from_env(var: &str) -> Result<Self> {
        let raw = match std::env::var(var) {
            Ok(v) if !v.is_empty() => v,
            _ => {
                return Err(Error::Config(format!(
                    "{var} environment variable not set"
                )));
            }
        };

        let keys = split_keys(&raw);
        if keys.is_empty() {
            return Err(Error::Config(format!(
                "{var} environment variable is empty"
            )));
        }

        tracing::debug!(env_var = %var, key_count = keys.len(), "resolved API keys");
        Self::new(keys)
    }

    /// A fresh uniform permutation of the keys, one per call.
    pub fn shuffled(&self) -> Vec<KeyEntry> {
        let mut entries: Vec<KeyEntry> = self
            .keys
            .iter()
            .enumerate()
            .map(|(index, key)| KeyEntry {
                index,
                key: key.clone(),
            })
            .collect();
        entries.shuffle(&mut rand::thread_rng());
        entries
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false after successful construction.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// Manual Debug impl to avoid leaking key values.
impl std::fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSet")
            .field("key_count", &self.keys.len())
            .finish()
    }
}

/// One key drawn from a [`CredentialSet`].
///
/// `index` is the key's position in the configured list and is what logs
/// and trace events report; the key itself is never logged.
#[derive(Clone)]
pub struct KeyEntry {
    /// Index into the configured key list.
    pub index: usize,
    /// The API key value.
    pub key: String,
}

impl std::fmt::Debug for KeyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyEntry")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_keys_returns_config_error() {
        let err = CredentialSet::new(vec![]).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn single_key_always_returns_same() {
        let set = CredentialSet::new(keys(&["key-a"])).unwrap();
        for _ in 0..5 {
            let order = set.shuffled();
            assert_eq!(order.len(), 1);
            assert_eq!(order[0].key, "key-a");
            assert_eq!(order[0].index, 0);
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let set = CredentialSet::new(keys(&["a", "b", "c", "d"])).unwrap();
        let order = set.shuffled();
        let seen: HashSet<usize> = order.iter().map(|e| e.index).collect();
        assert_eq!(seen.len(), 4);
        for e in &order {
            assert_eq!(e.key, ["a", "b", "c", "d"][e.index]);
        }
    }

    #[test]
    fn first_key_is_roughly_uniform() {
        let set = CredentialSet::new(keys(&["a", "b", "c"])).unwrap();
        let mut firsts = [0usize; 3];
        let rounds = 3000;
        for _ in 0..rounds {
            firsts[set.shuffled()[0].index] += 1;
        }
        // Expected 1000 each; 700 is more than 10 standard deviations away.
        for count in firsts {
            assert!(count > 700, "skewed first-key distribution: {firsts:?}");
        }
    }

    #[test]
    fn split_keys_drops_blank_entries() {
        assert_eq!(split_keys("a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_keys(",").is_empty());
        assert!(split_keys(" , ").is_empty());
    }

    #[test]
    fn from_env_missing_var() {
        let err = CredentialSet::from_env("SL_TEST_NONEXISTENT_KEYS_8888").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("environment variable not set"));
    }

    #[test]
    fn from_env_only_commas() {
        let var = "SL_TEST_COMMA_ONLY_KEYS_4242";
        std::env::set_var(var, ",");
        let err = CredentialSet::from_env(var).unwrap_err();
        std::env::remove_var(var);
        assert!(err.is_config());
        assert!(err.to_string().contains("environment variable is empty"));
    }

    #[test]
    fn from_env_splits_on_commas() {
        let var = "SL_TEST_SPLIT_KEYS_1234";
        std::env::set_var(var, "key1,key2");
        let set = CredentialSet::from_env(var).unwrap();
        std::env::remove_var(var);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn debug_does_not_leak_keys() {
        let set = CredentialSet::new(keys(&["secret-key"])).unwrap();
        let debug_str = format!("{:?}", set);
        assert!(!debug_str.contains("secret-key"));
        assert!(debug_str.contains("key_count: 1"));

        let entry = set.shuffled().remove(0);
        assert!(!format!("{:?}", entry).contains("secret-key"));
    }
}
