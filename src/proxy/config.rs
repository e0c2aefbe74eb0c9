//! Proxy configuration as it appears in the config file.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Backend origin the dev proxy forwards to by default.
pub const DEFAULT_TARGET: &str = "http://localhost:8080";

/// Dev proxy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Whether `serve` mounts the proxy routes next to the dashboard.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Backend origin, e.g. `http://localhost:8080`.
    #[serde(default = "default_target")]
    pub target: String,
    /// Send the target's host instead of the client's `Host` header.
    #[serde(default = "default_true")]
    pub change_origin: bool,
    #[serde(default = "default_routes")]
    pub routes: Vec<ProxyRouteConfig>,
}

/// A forwarded path prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyRouteConfig {
    /// Path prefix, e.g. `/images`. Matches the prefix itself and everything below it.
    pub prefix: String,
    /// Regex -> replacement rewrites, tried in order. Only the first
    /// matching rule is applied.
    #[serde(default, skip_serializing_if = "PathRewrites::is_empty")]
    pub path_rewrite: PathRewrites,
}

/// Ordered regex -> replacement pairs.
///
/// Written in config files as a table (`{"^/api": "/v2"}`); the order of the
/// keys in the file is the order the rules are tried in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRewrites(Vec<(String, String)>);

impl PathRewrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, r)| (p.as_str(), r.as_str()))
    }

    /// Append a rule. A pattern that is already present keeps its position
    /// and takes the new replacement.
    pub fn push(&mut self, pattern: impl Into<String>, replacement: impl Into<String>) {
        let pattern = pattern.into();
        let replacement = replacement.into();
        match self.0.iter_mut().find(|(p, _)| *p == pattern) {
            Some(existing) => existing.1 = replacement,
            None => self.0.push((pattern, replacement)),
        }
    }
}

impl<P: Into<String>, R: Into<String>> FromIterator<(P, R)> for PathRewrites {
    fn from_iter<I: IntoIterator<Item = (P, R)>>(iter: I) -> Self {
        let mut rewrites = Self::new();
        for (pattern, replacement) in iter {
            rewrites.push(pattern, replacement);
        }
        rewrites
    }
}

impl Serialize for PathRewrites {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (pattern, replacement) in &self.0 {
            map.serialize_entry(pattern, replacement)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PathRewrites {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RewritesVisitor;

        impl<'de> Visitor<'de> for RewritesVisitor {
            type Value = PathRewrites;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of regex -> replacement rewrites")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut rewrites = PathRewrites::new();
                while let Some((pattern, replacement)) =
                    access.next_entry::<String, String>()?
                {
                    rewrites.push(pattern, replacement);
                }
                Ok(rewrites)
            }
        }

        deserializer.deserialize_map(RewritesVisitor)
    }
}

fn default_true() -> bool {
    true
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_routes() -> Vec<ProxyRouteConfig> {
    vec![
        ProxyRouteConfig {
            prefix: "/images".to_string(),
            path_rewrite: PathRewrites::from_iter([("^/images", "/images")]),
        },
        ProxyRouteConfig {
            prefix: "/mmapi".to_string(),
            path_rewrite: PathRewrites::new(),
        },
    ]
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target: default_target(),
            change_origin: true,
            routes: default_routes(),
        }
    }
}

impl ProxyConfig {
    /// Check if this is the default config (for skip_serializing_if).
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
