//! Compound cache key construction and parsing.
//!
//! All of a session's attributes live under one canonical prefix:
//! `prefix ÷ canonicalId ÷ attributeName`. Alias mappings live beside them at
//! `prefix ÷ localId` with no trailing divider, so attribute keys always
//! carry two dividers and alias keys exactly one. That shape means attribute
//! enumeration and per-session clears never touch alias entries, while a
//! whole-namespace clear removes both.

/// Default key prefix for session attribute namespaces.
pub const DEFAULT_PREFIX: &str = "SESSION";

/// Default divider between key segments.
///
/// The divider must not occur in session identifiers or attribute names; this
/// is a configuration invariant of the deployment, not checked at runtime.
pub const DEFAULT_DIVIDER: &str = "-";

/// Key builder/parser for one store instance's namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNamespace {
    prefix: String,
    divider: String,
}

impl Default for KeyNamespace {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_DIVIDER)
    }
}

impl KeyNamespace {
    pub fn new(prefix: impl Into<String>, divider: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            divider: divider.into(),
        }
    }

    /// Full key for one attribute of one session.
    pub fn attribute_key(&self, session_id: &str, name: &str) -> String {
        format!(
            "{}{}{}{}{}",
            self.prefix, self.divider, session_id, self.divider, name
        )
    }

    /// Prefix shared by every attribute of one session.
    pub fn session_prefix(&self, session_id: &str) -> String {
        format!("{}{}{}{}", self.prefix, self.divider, session_id, self.divider)
    }

    /// Key of the alias mapping entry for a session identifier.
    pub fn alias_key(&self, session_id: &str) -> String {
        format!("{}{}{}", self.prefix, self.divider, session_id)
    }

    /// Prefix covering the whole namespace: attributes and alias mappings.
    pub fn store_prefix(&self) -> String {
        format!("{}{}", self.prefix, self.divider)
    }

    /// Recover the bare attribute name from a full attribute key.
    pub fn strip_attribute_name<'k>(&self, key: &'k str, session_id: &str) -> Option<&'k str> {
        key.strip_prefix(self.session_prefix(session_id).as_str())
    }

    /// Recover the bare session identifier from an alias key.
    pub fn strip_session_id<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.store_prefix().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_keys_carry_two_dividers() {
        let keys = KeyNamespace::default();
        assert_eq!(keys.attribute_key("abc", "cart"), "SESSION-abc-cart");
        assert_eq!(keys.session_prefix("abc"), "SESSION-abc-");
    }

    #[test]
    fn alias_keys_carry_one_divider() {
        let keys = KeyNamespace::default();
        assert_eq!(keys.alias_key("abc"), "SESSION-abc");
        // An alias key never matches a session's attribute prefix.
        assert!(!keys.alias_key("abc").starts_with(&keys.session_prefix("abc")));
    }

    #[test]
    fn store_prefix_covers_both_shapes() {
        let keys = KeyNamespace::default();
        assert!(keys.attribute_key("abc", "cart").starts_with(&keys.store_prefix()));
        assert!(keys.alias_key("abc").starts_with(&keys.store_prefix()));
    }

    #[test]
    fn strip_round_trips() {
        let keys = KeyNamespace::default();
        let key = keys.attribute_key("abc", "cart");
        assert_eq!(keys.strip_attribute_name(&key, "abc"), Some("cart"));
        assert_eq!(keys.strip_attribute_name(&key, "other"), None);
        assert_eq!(keys.strip_session_id(&keys.alias_key("abc")), Some("abc"));
    }

    #[test]
    fn custom_prefix_and_divider() {
        let keys = KeyNamespace::new("page", ":");
        assert_eq!(keys.attribute_key("s1", "3"), "page:s1:3");
        assert_eq!(keys.session_prefix("s1"), "page:s1:");
    }
}
