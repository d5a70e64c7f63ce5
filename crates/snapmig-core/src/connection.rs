//! Connection Resolver
//!
//! Collapses the configured default connection into one flat parameter set.
//! A read/write split always resolves to the write side, since snapshotting
//! and restoring both write to the database.

use crate::config::{DatabaseConfig, RawConnectionConfig};
use rand::Rng;
use serde_json::Value;
use snapmig_core_types::Sensitive;

/// Effective parameters for opening one dump/restore session
///
/// Missing fields are not an error here; they surface when the session is
/// opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<Sensitive<String>>,
    pub database: Option<String>,
}

impl ConnectionParameters {
    /// Read the four recognized fields out of a flat parameter set
    pub fn from_raw(raw: &RawConnectionConfig) -> Self {
        Self {
            host: field(raw, "host"),
            username: field(raw, "username"),
            password: field(raw, "password").map(Sensitive::new),
            database: field(raw, "database"),
        }
    }
}

fn field(raw: &RawConnectionConfig, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Picks one candidate index out of `len` (always at least 1)
pub trait ChooseOne {
    fn choose(&self, len: usize) -> usize;
}

/// Uniformly random choice, re-rolled on every call
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformRandom;

impl ChooseOne for UniformRandom {
    fn choose(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always the first candidate
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCandidate;

impl ChooseOne for FirstCandidate {
    fn choose(&self, _len: usize) -> usize {
        0
    }
}

impl<F> ChooseOne for F
where
    F: Fn(usize) -> usize,
{
    fn choose(&self, len: usize) -> usize {
        self(len)
    }
}

/// Resolves `database.default` into [`ConnectionParameters`]
#[derive(Debug, Clone, Default)]
pub struct ConnectionResolver<C = UniformRandom> {
    chooser: C,
}

impl ConnectionResolver<UniformRandom> {
    pub fn new() -> Self {
        Self {
            chooser: UniformRandom,
        }
    }
}

impl<C: ChooseOne> ConnectionResolver<C> {
    /// Use a custom replica chooser (deterministic tests)
    pub fn with_chooser(chooser: C) -> Self {
        Self { chooser }
    }

    /// Resolve the default connection's effective parameters
    pub fn resolve(&self, config: &DatabaseConfig) -> ConnectionParameters {
        let raw = config
            .connections
            .get(&config.default)
            .cloned()
            .unwrap_or_default();
        let effective = self.effective_config(&raw);
        tracing::debug!(
            connection = %config.default,
            split = raw.contains_key("read"),
            "resolved connection parameters"
        );
        ConnectionParameters::from_raw(&effective)
    }

    /// Flatten a raw connection config
    ///
    /// Without a `read` key the config is returned unchanged. With one, the
    /// write side (one entry picked by the chooser when it is a list) is
    /// merged over the base fields and both `read` and `write` are removed.
    pub fn effective_config(&self, raw: &RawConnectionConfig) -> RawConnectionConfig {
        if !raw.contains_key("read") {
            return raw.clone();
        }

        let write_side = match raw.get("write") {
            Some(Value::Array(candidates)) if !candidates.is_empty() => {
                let idx = self.chooser.choose(candidates.len()).min(candidates.len() - 1);
                candidates[idx].as_object()
            }
            Some(Value::Object(map)) => Some(map),
            _ => None,
        };

        let mut merged = raw.clone();
        if let Some(overrides) = write_side {
            for (key, value) in overrides {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged.remove("read");
        merged.remove("write");
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawConnectionConfig {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_flat_config_unchanged() {
        let config = raw(json!({"host": "db", "username": "u", "database": "app"}));
        let resolver = ConnectionResolver::new();
        assert_eq!(resolver.effective_config(&config), config);
    }

    #[test]
    fn test_write_key_without_read_is_left_alone() {
        let config = raw(json!({"host": "base", "write": {"host": "w"}}));
        let effective = ConnectionResolver::new().effective_config(&config);
        assert_eq!(effective["host"], "base");
        assert!(effective.contains_key("write"));
    }

    #[test]
    fn test_split_takes_write_side() {
        let config = raw(json!({
            "host": "base",
            "username": "app",
            "read": {"host": "r"},
            "write": {"host": "w1"}
        }));
        let effective = ConnectionResolver::new().effective_config(&config);
        assert_eq!(effective["host"], "w1");
        assert_eq!(effective["username"], "app");
        assert!(!effective.contains_key("read"));
        assert!(!effective.contains_key("write"));
    }

    #[test]
    fn test_first_candidate_picks_head_of_write_list() {
        let config = raw(json!({
            "read": {"host": "r"},
            "write": [{"host": "w1"}, {"host": "w2"}]
        }));
        let effective = ConnectionResolver::with_chooser(FirstCandidate).effective_config(&config);
        assert_eq!(effective["host"], "w1");
    }

    #[test]
    fn test_split_list_uses_chooser() {
        let config = raw(json!({
            "host": "base",
            "read": [{"host": "r"}],
            "write": [{"host": "w1"}, {"host": "w2"}]
        }));
        let resolver = ConnectionResolver::with_chooser(|_len: usize| 1);
        assert_eq!(resolver.effective_config(&config)["host"], "w2");
    }

    #[test]
    fn test_out_of_range_choice_is_clamped() {
        let config = raw(json!({"read": {}, "write": [{"host": "w1"}]}));
        let resolver = ConnectionResolver::with_chooser(|_len: usize| 7);
        assert_eq!(resolver.effective_config(&config)["host"], "w1");
    }

    #[test]
    fn test_missing_write_side_keeps_base() {
        let config = raw(json!({"host": "base", "read": {"host": "r"}}));
        let effective = ConnectionResolver::new().effective_config(&config);
        assert_eq!(effective["host"], "base");
        assert!(!effective.contains_key("read"));
    }

    #[test]
    fn test_parameters_from_raw() {
        let params = ConnectionParameters::from_raw(&raw(json!({
            "host": "localhost",
            "username": "root",
            "password": "secret",
            "database": 5,
            "port": 3306
        })));
        assert_eq!(params.host.as_deref(), Some("localhost"));
        assert_eq!(params.username.as_deref(), Some("root"));
        assert_eq!(params.password.as_ref().map(|p| p.expose().as_str()), Some("secret"));
        assert_eq!(params.database.as_deref(), Some("5"));
        assert!(!format!("{:?}", params).contains("secret"));
    }
}
