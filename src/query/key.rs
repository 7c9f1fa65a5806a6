use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Structured cache key: domain segments followed by optional filter parameters.
///
/// Parameters are stored as canonical JSON (object keys sorted, `null` fields
/// dropped), so two filters are the same key exactly when they would send the
/// same request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Append one plain segment (an id, a sub-domain).
    pub fn push(mut self, segment: impl fmt::Display) -> Self {
        self.0.push(segment.to_string());
        self
    }

    /// Append filter parameters as a canonical JSON segment.
    pub fn with_params<P: Serialize + ?Sized>(mut self, params: &P) -> Self {
        let value = serde_json::to_value(params)
            .map(strip_nulls)
            .unwrap_or(Value::Null);
        self.0.push(value.to_string());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Drop `null` members recursively so `{a: null}` and `{}` key the same entry,
/// and sort object members.
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            // Sorted explicitly: serde_json may be built with preserve_order
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// Which cache entries an invalidation or eviction applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFilter {
    Exact(QueryKey),
    Prefix(QueryKey),
    All,
}

impl KeyFilter {
    pub fn prefix<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyFilter::Prefix(QueryKey::new(segments))
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            KeyFilter::Exact(k) => k == key,
            KeyFilter::Prefix(p) => key.starts_with(p),
            KeyFilter::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_are_order_independent_and_ignore_nulls() {
        let a = QueryKey::new(["news", "articles"]).with_params(&json!({"limit": 50, "starred": true}));
        let b = QueryKey::new(["news", "articles"])
            .with_params(&json!({"starred": true, "limit": 50, "search": null}));
        assert_eq!(a, b);
    }

    #[test]
    fn differing_filters_are_distinct_keys() {
        let starred = QueryKey::new(["news", "articles"]).with_params(&json!({"starred": true, "limit": 50}));
        let unstarred =
            QueryKey::new(["news", "articles"]).with_params(&json!({"starred": false, "limit": 50}));
        assert_ne!(starred, unstarred);
    }

    #[test]
    fn prefix_filter_matches_descendants_only() {
        let filter = KeyFilter::prefix(["news", "articles"]);
        assert!(filter.matches(&QueryKey::new(["news", "articles"]).with_params(&json!({}))));
        assert!(filter.matches(&QueryKey::new(["news", "articles"])));
        assert!(!filter.matches(&QueryKey::new(["news", "sources"])));
        assert!(!filter.matches(&QueryKey::new(["news"])));
        assert!(KeyFilter::All.matches(&QueryKey::new(["anything"])));
    }

    #[test]
    fn exact_filter_needs_full_key() {
        let key = QueryKey::new(["ideas"]).push(7);
        assert!(KeyFilter::Exact(key.clone()).matches(&key));
        assert!(!KeyFilter::Exact(QueryKey::new(["ideas"])).matches(&key));
    }

    #[test]
    fn display_joins_segments() {
        let key = QueryKey::new(["writings", "detail"]).push(42);
        assert_eq!(key.to_string(), "[writings, detail, 42]");
    }
}
