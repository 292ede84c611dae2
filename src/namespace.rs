//! Mapping between logical keys and physical medium keys.
//!
//! A physical key is `<namespace>::<key>`. Namespaces must not contain the
//! separator, otherwise two stores could address the same physical key. This
//! is a caller contract and is not checked.

/// Separator between namespace and logical key.
pub const SEPARATOR: &str = "::";

/// Builds the physical key for `key` inside `namespace`.
pub fn to_physical(namespace: &str, key: &str) -> String {
    format!("{namespace}{SEPARATOR}{key}")
}

/// Returns true if `physical` belongs to `namespace`.
pub fn is_in_namespace(namespace: &str, physical: &str) -> bool {
    physical
        .strip_prefix(namespace)
        .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

/// Strips the namespace prefix, or returns `None` for foreign keys.
pub fn to_logical<'a>(namespace: &str, physical: &'a str) -> Option<&'a str> {
    physical.strip_prefix(namespace)?.strip_prefix(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_physical() {
        assert_eq!(to_physical("app", "user"), "app::user");
        assert_eq!(to_physical("app", ""), "app::");
    }

    #[test]
    fn test_membership() {
        assert!(is_in_namespace("ns1", "ns1::data"));
        assert!(!is_in_namespace("ns1", "ns2::data"));
        // "ns" is a prefix of "ns1" but not a namespace match
        assert!(!is_in_namespace("ns", "ns1::data"));
        assert!(!is_in_namespace("ns1", "ns1"));
    }

    #[test]
    fn test_to_logical() {
        assert_eq!(to_logical("ns1", "ns1::data"), Some("data"));
        assert_eq!(to_logical("ns1", "ns1::a::b"), Some("a::b"));
        assert_eq!(to_logical("ns1", "other::data"), None);
    }
}
