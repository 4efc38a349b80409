//! Type definitions for QRZ responses.

use serde::Serialize;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use crate::ROOT_ELEMENT;

/// URL scheme used to reach the XML service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// TLS, the default
    #[default]
    Https,
    /// Plain HTTP
    Http,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Https => write!(f, "https"),
            Protocol::Http => write!(f, "http"),
        }
    }
}

/// A single value in a flattened response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum XmlValue {
    /// Element text or attribute value
    Text(String),
    /// Flattened children of an element without text
    Map(ResponseMap),
}

impl XmlValue {
    /// The text of a leaf value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(text) => Some(text),
            XmlValue::Map(_) => None,
        }
    }

    /// The nested map of a branch value
    pub fn as_map(&self) -> Option<&ResponseMap> {
        match self {
            XmlValue::Text(_) => None,
            XmlValue::Map(map) => Some(map),
        }
    }
}

impl From<&str> for XmlValue {
    fn from(text: &str) -> Self {
        XmlValue::Text(text.to_string())
    }
}

impl From<String> for XmlValue {
    fn from(text: String) -> Self {
        XmlValue::Text(text)
    }
}

impl From<ResponseMap> for XmlValue {
    fn from(map: ResponseMap) -> Self {
        XmlValue::Map(map)
    }
}

/// Nested key-value view of an XML document.
///
/// Element names are keys. Attributes live next to their element under
/// `element.attribute`, so a key may itself contain a dot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResponseMap(BTreeMap<String, XmlValue>);

impl ResponseMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the one it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<XmlValue>) -> Option<XmlValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Value stored directly under `key` at this level
    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        self.0.get(key)
    }

    /// Resolve a dotted path such as `QRZDatabase.Session.Key`.
    ///
    /// Segments are matched against element keys first; when that fails the
    /// next segments are joined back together so attribute keys like
    /// `QRZDatabase.version` resolve as well.
    pub fn get_path(&self, path: &str) -> Option<&XmlValue> {
        let segments: Vec<&str> = path.split('.').collect();
        self.lookup(&segments)
    }

    fn lookup(&self, segments: &[&str]) -> Option<&XmlValue> {
        for split in 1..=segments.len() {
            let key = segments[..split].join(".");
            let Some(value) = self.0.get(&key) else {
                continue;
            };
            if split == segments.len() {
                return Some(value);
            }
            if let XmlValue::Map(child) = value {
                if let Some(found) = child.lookup(&segments[split..]) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Text at a dotted path, if the path ends on a leaf
    pub fn get_text(&self, path: &str) -> Option<&str> {
        self.get_path(path).and_then(XmlValue::as_text)
    }

    /// Nested map at a dotted path, if the path ends on a branch
    pub fn get_map(&self, path: &str) -> Option<&ResponseMap> {
        self.get_path(path).and_then(XmlValue::as_map)
    }

    /// Number of keys at this level
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this level has no keys
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the keys and values at this level
    pub fn iter(&self) -> btree_map::Iter<'_, String, XmlValue> {
        self.0.iter()
    }

    /// Every text leaf with its full dotted path, in key order
    pub fn leaves(&self) -> Vec<(String, &str)> {
        let mut leaves = Vec::new();
        self.collect_leaves("", &mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, prefix: &str, leaves: &mut Vec<(String, &'a str)>) {
        for (key, value) in &self.0 {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            match value {
                XmlValue::Text(text) => leaves.push((path, text)),
                XmlValue::Map(child) => child.collect_leaves(&path, leaves),
            }
        }
    }
}

impl<'a> IntoIterator for &'a ResponseMap {
    type Item = (&'a String, &'a XmlValue);
    type IntoIter = btree_map::Iter<'a, String, XmlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Typed view of the `Session` section every response carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    /// Session key for authenticated requests
    pub key: Option<String>,
    /// Number of lookups performed in current 24-hour period
    pub count: Option<u32>,
    /// Subscription expiration date or "non-subscriber"
    pub sub_exp: Option<String>,
    /// Current GMT time
    pub gm_time: Option<String>,
    /// Informational message
    pub message: Option<String>,
    /// Error message
    pub error: Option<String>,
}

impl SessionInfo {
    /// Read the `Session` section out of a flattened response
    pub fn from_response(response: &ResponseMap) -> Self {
        let Some(session) = response.get_map(&format!("{}.Session", ROOT_ELEMENT)) else {
            return Self::default();
        };
        let text = |key: &str| {
            session
                .get_text(key)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Self {
            key: text("Key"),
            count: text("Count").and_then(|count| count.parse().ok()),
            sub_exp: text("SubExp"),
            gm_time: text("GMTime"),
            message: text("Message"),
            error: text("Error"),
        }
    }

    /// Check if session has a valid key
    pub fn has_valid_session(&self) -> bool {
        self.key.is_some()
    }

    /// Get the error message if present
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> ResponseMap {
        let mut session = ResponseMap::new();
        session.insert("Key", "abc123");
        session.insert("Count", "42");
        session.insert("SubExp", "non-subscriber");

        let mut callsign = ResponseMap::new();
        callsign.insert("call", "KE2EHU");

        let mut database = ResponseMap::new();
        database.insert("Session", session);
        database.insert("Callsign", callsign);

        let mut response = ResponseMap::new();
        response.insert("QRZDatabase.version", "1.34");
        response.insert("QRZDatabase", database);
        response
    }

    #[test]
    fn test_protocol_display() {
        assert_eq!(Protocol::Https.to_string(), "https");
        assert_eq!(Protocol::Http.to_string(), "http");
        assert_eq!(Protocol::default(), Protocol::Https);
    }

    #[test]
    fn test_dotted_path_lookup() {
        let response = sample_response();

        assert_eq!(response.get_text("QRZDatabase.Session.Key"), Some("abc123"));
        assert_eq!(response.get_text("QRZDatabase.Callsign.call"), Some("KE2EHU"));
        assert_eq!(response.get_text("QRZDatabase.version"), Some("1.34"));
        assert!(response.get_map("QRZDatabase.Session").is_some());
        assert_eq!(response.get_text("QRZDatabase.Session"), None);
        assert_eq!(response.get_path("QRZDatabase.Missing"), None);
    }

    #[test]
    fn test_leaves_are_dotted_and_ordered() {
        let response = sample_response();
        let leaves = response.leaves();

        assert_eq!(
            leaves,
            vec![
                ("QRZDatabase.Callsign.call".to_string(), "KE2EHU"),
                ("QRZDatabase.Session.Count".to_string(), "42"),
                ("QRZDatabase.Session.Key".to_string(), "abc123"),
                ("QRZDatabase.Session.SubExp".to_string(), "non-subscriber"),
                ("QRZDatabase.version".to_string(), "1.34"),
            ]
        );
    }

    #[test]
    fn test_session_info_from_response() {
        let info = SessionInfo::from_response(&sample_response());

        assert!(info.has_valid_session());
        assert_eq!(info.key.as_deref(), Some("abc123"));
        assert_eq!(info.count, Some(42));
        assert_eq!(info.sub_exp.as_deref(), Some("non-subscriber"));
        assert_eq!(info.error_message(), None);
    }

    #[test]
    fn test_session_info_without_session_section() {
        let info = SessionInfo::from_response(&ResponseMap::new());
        assert_eq!(info, SessionInfo::default());
        assert!(!info.has_valid_session());
    }

    #[test]
    fn test_blank_key_is_not_a_session() {
        let mut session = ResponseMap::new();
        session.insert("Key", "  ");
        session.insert("Error", "Session Timeout");
        let mut database = ResponseMap::new();
        database.insert("Session", session);
        let mut response = ResponseMap::new();
        response.insert("QRZDatabase", database);

        let info = SessionInfo::from_response(&response);
        assert!(!info.has_valid_session());
        assert_eq!(info.error_message(), Some("Session Timeout"));
    }
}
