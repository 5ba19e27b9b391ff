use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::value::Value;

/// Characters percent-encoded when a key or value enters as plain text.
///
/// Everything that would be ambiguous inside a `k=v&k2=v2` string. `#` stays
/// raw so the `###` redaction marker survives display unchanged.
const QUERY_COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'%')
    .add(b'&')
    .add(b'=')
    .add(b'+')
    .add(b'?');

pub(crate) fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_COMPONENT).to_string()
}

pub(crate) fn decode_component(raw: &str) -> String {
    let unplussed = raw.replace('+', " ");
    percent_decode_str(&unplussed)
        .decode_utf8_lossy()
        .into_owned()
}

/// An ordered key/value map for a URI query string.
///
/// Entries are stored in their wire-encoded form exactly as parsed, so
/// `parse` followed by `Display` reproduces the input byte for byte
/// (`b+c` stays `b+c`, `%23` stays `%23`). Lookups decode both sides, so
/// `get("a b")` finds `a+b=1` and `a%20b=1` alike. Values supplied as plain
/// text through [`QueryParams::set`] and [`QueryParams::add`] are
/// percent-encoded on entry.
///
/// Keys keep their insertion order; setting an existing key replaces its
/// value in place rather than moving it to the back, and [`QueryParams::add`]
/// appends a duplicate entry without touching earlier ones. A key may carry
/// no value at all (`?flag`), which is distinct from an empty value
/// (`?flag=`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// `(key, value)` pairs in wire-encoded form.
    entries: Vec<(String, Option<String>)>,
}

impl QueryParams {
    /// Creates an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw query string (without the leading `?`).
    ///
    /// Each pair is kept in its original encoded form; a segment without `=`
    /// becomes a value-less key.
    pub fn parse(raw: &str) -> Self {
        let mut params = QueryParams::new();
        for pair in raw.split('&') {
            if pair.is_empty() {
                continue;
            }
            match pair.split_once('=') {
                Some((key, value)) => {
                    params.entries.push((key.to_string(), Some(value.to_string())));
                }
                None => params.entries.push((pair.to_string(), None)),
            }
        }
        params
    }

    /// Returns the decoded value of the first entry with the given key.
    ///
    /// The outer `Option` distinguishes "key absent"; the inner one
    /// distinguishes a value-less key.
    pub fn get(&self, key: &str) -> Option<Option<String>> {
        self.entries
            .iter()
            .find(|(k, _)| decode_component(k) == key)
            .map(|(_, v)| v.as_deref().map(decode_component))
    }

    /// Returns all decoded values recorded for the given key.
    pub fn get_all(&self, key: &str) -> Vec<Option<String>> {
        self.entries
            .iter()
            .filter(|(k, _)| decode_component(k) == key)
            .map(|(_, v)| v.as_deref().map(decode_component))
            .collect()
    }

    /// Replaces the first entry with the given key in place, or appends a new
    /// entry if the key is absent. Key and value are taken as plain text and
    /// encoded on entry.
    pub fn set(&mut self, key: impl Into<String>, value: Option<Value>) {
        let key = key.into();
        let encoded = value.map(|v| encode_component(&v.render()));
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| decode_component(k) == key)
        {
            Some(entry) => entry.1 = encoded,
            None => self.entries.push((encode_component(&key), encoded)),
        }
    }

    /// Rewrites every entry with the given key to the same value. No-op if
    /// the key is absent.
    pub fn set_all(&mut self, key: &str, value: Option<Value>) {
        let encoded = value.map(|v| encode_component(&v.render()));
        for entry in self
            .entries
            .iter_mut()
            .filter(|(k, _)| decode_component(k) == key)
        {
            entry.1 = encoded.clone();
        }
    }

    /// Appends an entry, keeping any existing entries with the same key.
    /// Key and value are taken as plain text and encoded on entry.
    pub fn add(&mut self, key: impl Into<String>, value: Option<String>) {
        self.entries.push((
            encode_component(&key.into()),
            value.map(|v| encode_component(&v)),
        ));
    }

    /// Appends an already-encoded entry verbatim.
    pub(crate) fn add_raw(&mut self, key: String, value: Option<String>) {
        self.entries.push((key, value));
    }

    /// Removes every entry with the given key. No-op if the key is absent.
    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| decode_component(k) != key);
    }

    /// Returns true if any entry has the given key.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| decode_component(k) == key)
    }

    /// The number of entries, counting duplicates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates decoded `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (String, Option<String>)> + '_ {
        self.entries
            .iter()
            .map(|(k, v)| (decode_component(k), v.as_deref().map(decode_component)))
    }

    /// Iterates wire-encoded pairs in insertion order.
    pub(crate) fn iter_raw(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl fmt::Display for QueryParams {
    /// Re-serializes the parameters in their stored wire form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            f.write_str(key)?;
            if let Some(value) = value {
                f.write_str("=")?;
                f.write_str(value)?;
            }
        }
        Ok(())
    }
}

impl From<&str> for QueryParams {
    fn from(value: &str) -> Self {
        QueryParams::parse(value)
    }
}

impl FromIterator<(String, Option<String>)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (String, Option<String>)>>(iter: T) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.add(key, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trip() {
        let params = QueryParams::parse("a=b&c=d");
        assert_eq!(params.to_string(), "a=b&c=d");
    }

    #[test]
    fn round_trip_preserves_encoded_forms() {
        for raw in ["q=b+c", "a=%23x", "a=%2Bb", "x=%20y", "k%20a=v"] {
            assert_eq!(QueryParams::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn parse_value_less_key() {
        let params = QueryParams::parse("flag&a=b");
        assert_eq!(params.get("flag"), Some(None));
        assert_eq!(params.to_string(), "flag&a=b");
    }

    #[test]
    fn empty_value_distinct_from_value_less() {
        let params = QueryParams::parse("a=");
        assert_eq!(params.get("a"), Some(Some(String::new())));
        assert_eq!(params.to_string(), "a=");
    }

    #[test]
    fn lookup_decodes_both_sides() {
        let params = QueryParams::parse("a+b=1&c%20d=2");
        assert_eq!(params.get("a b"), Some(Some("1".to_string())));
        assert_eq!(params.get("c d"), Some(Some("2".to_string())));
        assert!(params.contains("a b"));
    }

    #[test]
    fn set_replaces_in_place() {
        let mut params = QueryParams::parse("a=1&b=2&c=3");
        params.set("b", Some("9".into()));
        assert_eq!(params.to_string(), "a=1&b=9&c=3");
    }

    #[test]
    fn set_appends_when_absent() {
        let mut params = QueryParams::parse("a=1");
        params.set("z", Some("2".into()));
        assert_eq!(params.to_string(), "a=1&z=2");
    }

    #[test]
    fn set_all_rewrites_every_duplicate() {
        let mut params = QueryParams::parse("tok=a&keep=1&tok=b");
        params.set_all("tok", Some("###".into()));
        assert_eq!(params.to_string(), "tok=###&keep=1&tok=###");
    }

    #[test]
    fn add_keeps_duplicates() {
        let mut params = QueryParams::new();
        params.add("a", Some("1".to_string()));
        params.add("a", Some("2".to_string()));
        assert_eq!(params.to_string(), "a=1&a=2");
        assert_eq!(
            params.get_all("a"),
            vec![Some("1".to_string()), Some("2".to_string())]
        );
    }

    #[test]
    fn remove_drops_all_occurrences() {
        let mut params = QueryParams::parse("a=1&b=2&a=3");
        params.remove("a");
        assert_eq!(params.to_string(), "b=2");
    }

    #[test]
    fn encodes_reserved_characters() {
        let mut params = QueryParams::new();
        params.add("q", Some("a&b=c d".to_string()));
        assert_eq!(params.to_string(), "q=a%26b%3Dc%20d");
    }

    #[test]
    fn decodes_plus_as_space() {
        let params = QueryParams::parse("q=hello+world");
        assert_eq!(params.get("q"), Some(Some("hello world".to_string())));
        // The stored form is untouched.
        assert_eq!(params.to_string(), "q=hello+world");
    }
}
