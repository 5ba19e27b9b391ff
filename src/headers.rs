use crate::error::HeaderError;
use crate::value::Value;

/// Header names that keep only their most recent value.
const SINGLE_VALUE: &[&str] = &["Content-Type", "Location"];

/// Header names serialized as one raw line per value and never comma-split.
const MULTI_PAIR: &[&str] = &["Set-Cookie"];

/// A case-insensitive, insertion-ordered HTTP header multimap.
///
/// Names are stored in canonical capitalized-hyphenated form
/// (`content-type` becomes `Content-Type`) and looked up case-insensitively.
/// Distinct names iterate in insertion order; re-adding an existing name does
/// not move it.
///
/// Two configured name sets alter multiplicity:
///
/// - single-value names (`Content-Type`, `Location`) collapse to the last
///   written value on every write;
/// - multi-pair names (`Set-Cookie`) serialize as one raw line per value and
///   are never comma-joined or comma-split.
///
/// Raw comma-splitting on ingestion is opt-in via
/// [`Headers::with_comma_splitting`]; by default a raw value is stored as one
/// opaque string even if it contains commas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
    comma_splitting: bool,
}

impl Headers {
    /// Creates an empty collection with comma-splitting disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether raw-header ingestion splits values on commas.
    ///
    /// Multi-pair names are exempt regardless of this mode. When splitting is
    /// on, single-value enforcement runs after the split, so the last split
    /// value wins for single-value names.
    pub fn with_comma_splitting(mut self, enabled: bool) -> Self {
        self.comma_splitting = enabled;
        self
    }

    /// Bulk-constructs a collection from name/value pairs.
    ///
    /// # Errors
    ///
    /// Fails with [`HeaderError::EmptyName`] on an empty header name.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, HeaderError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut headers = Headers::new();
        for (name, value) in pairs {
            if name.as_ref().is_empty() {
                return Err(HeaderError::EmptyName);
            }
            headers.add(name.as_ref(), value);
        }
        Ok(headers)
    }

    /// Appends a value, or creates the header if absent.
    ///
    /// Single-value names collapse to the incoming value instead of
    /// appending. An empty-string value is kept as a single empty entry and
    /// never accumulates duplicates.
    pub fn add(&mut self, name: &str, value: impl Into<Value>) {
        let canonical = canonicalize(name);
        let rendered = value.into().render();
        let single = is_single_value(&canonical);
        match self.entry_mut(&canonical) {
            Some(values) => {
                if single {
                    values.clear();
                    values.push(rendered);
                } else if rendered.is_empty() && values.as_slice() == [String::new()] {
                    // Already holds the lone empty entry.
                } else {
                    values.push(rendered);
                }
            }
            None => self.entries.push((canonical, vec![rendered])),
        }
    }

    /// Replaces all values for a header, or creates it if absent. The
    /// header's position in iteration order is unchanged when it already
    /// exists.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let canonical = canonicalize(name);
        let rendered = value.into().render();
        match self.entry_mut(&canonical) {
            Some(values) => {
                values.clear();
                values.push(rendered);
            }
            None => self.entries.push((canonical, vec![rendered])),
        }
    }

    /// Parses a raw `Name: value` line and appends it.
    ///
    /// # Errors
    ///
    /// Fails with [`HeaderError::MissingColon`] when the line has no `:` and
    /// [`HeaderError::EmptyName`] when the name portion is empty.
    pub fn add_raw(&mut self, raw: &str) -> Result<(), HeaderError> {
        let (name, values) = self.parse_raw(raw)?;
        for value in values {
            self.add(&name, value);
        }
        Ok(())
    }

    /// Parses a raw `Name: value` line and replaces any existing values.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Headers::add_raw`].
    pub fn set_raw(&mut self, raw: &str) -> Result<(), HeaderError> {
        let (name, values) = self.parse_raw(raw)?;
        self.remove(&name);
        for value in values {
            self.add(&name, value);
        }
        Ok(())
    }

    fn parse_raw(&self, raw: &str) -> Result<(String, Vec<String>), HeaderError> {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| HeaderError::MissingColon(raw.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(HeaderError::EmptyName);
        }
        let value = value.trim_start();
        let canonical = canonicalize(name);
        let values = if self.comma_splitting && !is_multi_pair(&canonical) {
            value.split(',').map(|v| v.trim().to_string()).collect()
        } else {
            vec![value.to_string()]
        };
        Ok((canonical, values))
    }

    /// Returns all values for a header.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        let canonical = canonicalize(name);
        self.entries
            .iter()
            .find(|(n, _)| *n == canonical)
            .map(|(_, values)| values.as_slice())
    }

    /// Returns the comma-joined value line for a header, or `None` if
    /// absent.
    pub fn get_line(&self, name: &str) -> Option<String> {
        self.get(name).map(|values| values.join(", "))
    }

    /// Scans `Set-Cookie` values and returns the first one starting with the
    /// given cookie name.
    pub fn get_set_cookie_line(&self, cookie_name: &str) -> Option<&str> {
        self.get("Set-Cookie")?
            .iter()
            .find(|value| value.starts_with(cookie_name))
            .map(String::as_str)
    }

    /// Returns true if the header is present.
    pub fn contains(&self, name: &str) -> bool {
        let canonical = canonicalize(name);
        self.entries.iter().any(|(n, _)| *n == canonical)
    }

    /// Removes a header and all its values. No-op if absent.
    pub fn remove(&mut self, name: &str) {
        let canonical = canonicalize(name);
        self.entries.retain(|(n, _)| *n != canonical);
    }

    /// Returns true if the collection has no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates `(name, values)` in insertion order of distinct names.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(n, values)| (n.as_str(), values.as_slice()))
    }

    /// Serializes to raw header lines.
    ///
    /// Multi-pair names produce one line per value; every other multi-value
    /// header becomes a single comma-joined line.
    pub fn to_raw_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (name, values) in &self.entries {
            if is_multi_pair(name) {
                for value in values {
                    lines.push(format!("{name}: {value}"));
                }
            } else {
                lines.push(format!("{name}: {}", values.join(", ")));
            }
        }
        lines
    }

    /// Returns a comma-joined `(name, line)` pair per header.
    pub fn to_flattened(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(name, values)| (name.clone(), values.join(", ")))
            .collect()
    }

    /// Returns a new collection with `other`'s headers appended (not
    /// replacing) onto a clone of `self`.
    pub fn merged(&self, other: &Headers) -> Headers {
        let mut merged = self.clone();
        for (name, values) in other.iter() {
            for value in values {
                merged.add(name, value.as_str());
            }
        }
        merged
    }

    fn entry_mut(&mut self, canonical: &str) -> Option<&mut Vec<String>> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == canonical)
            .map(|(_, values)| values)
    }
}

/// Canonicalizes a header name: each hyphen-separated token is capitalized,
/// the rest lowercased (`x-deki-TOKEN` becomes `X-Deki-Token`).
pub(crate) fn canonicalize(name: &str) -> String {
    name.split('-')
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn is_single_value(canonical: &str) -> bool {
    SINGLE_VALUE.contains(&canonical)
}

fn is_multi_pair(canonical: &str) -> bool {
    MULTI_PAIR.contains(&canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_storage_case_insensitive_lookup() {
        let mut headers = Headers::new();
        headers.add("x-custom-header", "a");
        assert_eq!(headers.get("X-CUSTOM-HEADER").unwrap(), ["a"]);
        assert_eq!(
            headers.iter().next().unwrap().0,
            "X-Custom-Header"
        );
    }

    #[test]
    fn add_appends_multi_values() {
        let mut headers = Headers::new();
        headers.add("Accept", "text/html");
        headers.add("accept", "application/xml");
        assert_eq!(
            headers.get("Accept").unwrap(),
            ["text/html", "application/xml"]
        );
    }

    #[test]
    fn single_value_last_write_wins() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        headers.add("content-type", "application/json");
        assert_eq!(headers.get("Content-Type").unwrap(), ["application/json"]);

        let mut headers = Headers::new();
        headers.add("Location", "http://a");
        headers.add("Location", "http://b");
        assert_eq!(headers.get("Location").unwrap(), ["http://b"]);
    }

    #[test]
    fn set_replaces_all_values() {
        let mut headers = Headers::new();
        headers.add("Accept", "a");
        headers.add("Accept", "b");
        headers.set("Accept", "c");
        assert_eq!(headers.get("Accept").unwrap(), ["c"]);
    }

    #[test]
    fn empty_value_kept_once() {
        let mut headers = Headers::new();
        headers.add("X-Empty", "");
        headers.add("X-Empty", "");
        assert_eq!(headers.get("X-Empty").unwrap(), [""]);
        assert!(headers.contains("X-Empty"));
    }

    #[test]
    fn set_cookie_one_raw_line_per_value() {
        let mut headers = Headers::new();
        headers.add("Set-Cookie", "a=1; Path=/");
        headers.add("Set-Cookie", "b=2; Path=/");
        let lines = headers.to_raw_lines();
        assert_eq!(
            lines,
            ["Set-Cookie: a=1; Path=/", "Set-Cookie: b=2; Path=/"]
        );
    }

    #[test]
    fn other_multi_values_comma_joined() {
        let mut headers = Headers::new();
        headers.add("Accept", "a");
        headers.add("Accept", "b");
        assert_eq!(headers.to_raw_lines(), ["Accept: a, b"]);
        assert_eq!(headers.get_line("Accept").as_deref(), Some("a, b"));
    }

    #[test]
    fn get_set_cookie_line_finds_by_prefix() {
        let mut headers = Headers::new();
        headers.add("Set-Cookie", "session=abc; HttpOnly");
        headers.add("Set-Cookie", "token=xyz");
        assert_eq!(
            headers.get_set_cookie_line("token"),
            Some("token=xyz")
        );
        assert_eq!(headers.get_set_cookie_line("missing"), None);
    }

    #[test]
    fn add_raw_opaque_by_default() {
        let mut headers = Headers::new();
        headers.add_raw("X-List: a, b, c").unwrap();
        assert_eq!(headers.get("X-List").unwrap(), ["a, b, c"]);
    }

    #[test]
    fn add_raw_splits_when_opted_in() {
        let mut headers = Headers::new().with_comma_splitting(true);
        headers.add_raw("X-List: a, b, c").unwrap();
        assert_eq!(headers.get("X-List").unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn add_raw_never_splits_set_cookie() {
        let mut headers = Headers::new().with_comma_splitting(true);
        headers
            .add_raw("Set-Cookie: a=1; Expires=Thu, 01 Jan 1970 00:00:00 GMT")
            .unwrap();
        assert_eq!(
            headers.get("Set-Cookie").unwrap(),
            ["a=1; Expires=Thu, 01 Jan 1970 00:00:00 GMT"]
        );
    }

    #[test]
    fn comma_splitting_single_value_last_wins() {
        let mut headers = Headers::new().with_comma_splitting(true);
        headers.add_raw("Content-Type: text/plain, application/json").unwrap();
        assert_eq!(headers.get("Content-Type").unwrap(), ["application/json"]);
    }

    #[test]
    fn add_raw_requires_colon() {
        let mut headers = Headers::new();
        assert_eq!(
            headers.add_raw("no colon here").unwrap_err(),
            HeaderError::MissingColon("no colon here".to_string())
        );
    }

    #[test]
    fn set_raw_replaces() {
        let mut headers = Headers::new();
        headers.add("X-A", "1");
        headers.add("X-A", "2");
        headers.set_raw("X-A: 3").unwrap();
        assert_eq!(headers.get("X-A").unwrap(), ["3"]);
    }

    #[test]
    fn insertion_order_stable_on_reinsert() {
        let mut headers = Headers::new();
        headers.add("X-First", "1");
        headers.add("X-Second", "2");
        headers.add("X-First", "again");
        let names: Vec<_> = headers.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, ["X-First", "X-Second"]);
    }

    #[test]
    fn merged_appends_not_replaces() {
        let mut left = Headers::new();
        left.add("Accept", "a");
        left.add("X-Only-Left", "l");
        let mut right = Headers::new();
        right.add("Accept", "b");
        right.add("X-Only-Right", "r");

        let merged = left.merged(&right);
        assert_eq!(merged.get("Accept").unwrap(), ["a", "b"]);
        assert!(merged.contains("X-Only-Left"));
        assert!(merged.contains("X-Only-Right"));
        // Inputs untouched.
        assert_eq!(left.get("Accept").unwrap(), ["a"]);
    }

    #[test]
    fn from_pairs_rejects_empty_name() {
        let pairs = [("", "v")];
        assert_eq!(
            Headers::from_pairs(pairs).unwrap_err(),
            HeaderError::EmptyName
        );
    }

    #[test]
    fn remove_and_is_empty() {
        let mut headers = Headers::new();
        assert!(headers.is_empty());
        headers.add("X-A", "1");
        headers.remove("x-a");
        assert!(headers.is_empty());
        headers.remove("missing");
    }
}
