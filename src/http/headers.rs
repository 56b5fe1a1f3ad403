//! Ordered header storage shared by requests and responses.
//!
//! # Design Decisions
//! - Names are stored exactly as received or set (case-sensitive keys)
//! - Inserting an existing name replaces the value in place (last wins)
//! - Insertion order is preserved so serialized output is deterministic

/// An ordered, case-sensitive header map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any previous value with the same name.
    ///
    /// Returns the replaced value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Look up a header by its exact name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a header ignoring ASCII case. The last matching entry wins.
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove a header by exact name, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut headers = HeaderMap::new();
        headers.insert("Server", "a");
        headers.insert("Content-Type", "text/plain");
        assert_eq!(headers.insert("Server", "b"), Some("a".to_string()));

        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Server", "Content-Type"]);
        assert_eq!(headers.get("Server"), Some("b"));
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("foo", "1");
        headers.insert("Foo", "2");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("foo"), Some("1"));
        assert_eq!(headers.get_ignore_case("FOO"), Some("2"));
    }

    #[test]
    fn remove_header() {
        let mut headers: HeaderMap = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(headers.remove("a"), Some("1".to_string()));
        assert!(!headers.contains("a"));
        assert_eq!(headers.remove("a"), None);
    }
}
