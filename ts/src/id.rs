//! Id generation and resolution
//!
//! Ids are UUIDv7 strings. The trailing characters come from the random
//! part of the UUID, so they serve as the short form shown to users.

use tracing::debug;

/// Length of the display form of an id
const SHORT_ID_LEN: usize = 8;

/// Generate a fresh unique id
pub fn generate_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Display form of an id (its last 8 characters)
pub fn short_id(id: &str) -> &str {
    match id.char_indices().rev().nth(SHORT_ID_LEN - 1) {
        Some((idx, _)) => &id[idx..],
        None => id,
    }
}

/// Resolves partial references (prefix or short id) to full ids
pub struct IdResolver<'a> {
    ids: Vec<&'a str>,
}

impl<'a> IdResolver<'a> {
    pub fn new(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Resolve a partial reference to a full ID
    ///
    /// Returns:
    /// - Ok(Some(id)) if exactly one match
    /// - Ok(None) if no matches
    /// - Err with candidates if ambiguous
    pub fn resolve(&self, reference: &str) -> Result<Option<String>, Vec<String>> {
        debug!(%reference, candidates = self.ids.len(), "resolve: called");
        let reference = reference.trim();
        if reference.is_empty() {
            return Ok(None);
        }

        // An exact match wins even when it is also a prefix of another id
        if let Some(id) = self.ids.iter().find(|id| **id == reference) {
            return Ok(Some(id.to_string()));
        }

        let matches: Vec<String> = self
            .ids
            .iter()
            .filter(|id| id.starts_with(reference) || id.ends_with(reference))
            .map(|id| id.to_string())
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.into_iter().next()),
            _ => Err(matches),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0194a3c2-7d1e-7000-8000-00000abcdef1"), "0abcdef1");
        assert_eq!(short_id("42"), "42");
    }

    #[test]
    fn test_id_resolver_exact() {
        let ids = ["1", "12"];
        let resolver = IdResolver::new(ids);
        assert_eq!(resolver.resolve("1").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_id_resolver_prefix() {
        let ids = ["0194a3c2-aaaa", "0194a3c3-bbbb"];
        let resolver = IdResolver::new(ids);
        assert_eq!(resolver.resolve("0194a3c2").unwrap(), Some("0194a3c2-aaaa".to_string()));
    }

    #[test]
    fn test_id_resolver_short_suffix() {
        let ids = ["0194a3c2-aaaa", "0194a3c2-bbbb"];
        let resolver = IdResolver::new(ids);
        assert_eq!(resolver.resolve("bbbb").unwrap(), Some("0194a3c2-bbbb".to_string()));
    }

    #[test]
    fn test_id_resolver_ambiguous() {
        let ids = ["0194a3c2-aaaa", "0194a3c2-bbbb"];
        let resolver = IdResolver::new(ids);
        let candidates = resolver.resolve("0194").unwrap_err();
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_id_resolver_no_match() {
        let ids = ["0194a3c2-aaaa"];
        let resolver = IdResolver::new(ids);
        assert_eq!(resolver.resolve("zzzz").unwrap(), None);
        assert_eq!(resolver.resolve("   ").unwrap(), None);
    }
}
