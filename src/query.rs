use crate::error::{Error, Result};
use crate::types::PrefEntry;
use glob::Pattern;

/// Filter preferences by glob patterns (OR logic)
///
/// Keeps the entries whose key matches any of the patterns, in their
/// original order. An empty pattern list keeps everything.
pub fn query_preferences(entries: &[PrefEntry], patterns: &[&str]) -> Result<Vec<PrefEntry>> {
    // Compile all patterns first to fail fast on invalid patterns
    let compiled_patterns: Vec<Pattern> = patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| Error::InvalidGlobPattern {
                pattern: p.to_string(),
                message: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if compiled_patterns.is_empty() {
        return Ok(entries.to_vec());
    }

    Ok(entries
        .iter()
        .filter(|entry| compiled_patterns.iter().any(|pattern| pattern.matches(&entry.key)))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entries() -> Vec<PrefEntry> {
        vec![
            PrefEntry::new("browser.search.region", "US"),
            PrefEntry::new("browser.startup.homepage", "https://example.com"),
            PrefEntry::new("javascript.enabled", true),
            PrefEntry::new("network.cookie.cookieBehavior", 0),
            PrefEntry::new("network.proxy.type", 1),
        ]
    }

    fn keys(entries: &[PrefEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn test_query_single_pattern() {
        let queried = query_preferences(&create_test_entries(), &["network.*"]).unwrap();
        assert_eq!(
            keys(&queried),
            vec!["network.cookie.cookieBehavior", "network.proxy.type"]
        );
    }

    #[test]
    fn test_query_multiple_patterns_or_logic() {
        let queried =
            query_preferences(&create_test_entries(), &["network.*", "javascript.enabled"])
                .unwrap();
        assert_eq!(queried.len(), 3);
        assert_eq!(queried[0].key, "javascript.enabled");
    }

    #[test]
    fn test_query_inner_wildcard() {
        let queried = query_preferences(&create_test_entries(), &["browser.*.homepage"]).unwrap();
        assert_eq!(keys(&queried), vec!["browser.startup.homepage"]);
    }

    #[test]
    fn test_query_no_matches() {
        assert!(query_preferences(&create_test_entries(), &["nonexistent.*"])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_query_without_patterns_keeps_all() {
        assert_eq!(query_preferences(&create_test_entries(), &[]).unwrap().len(), 5);
    }

    #[test]
    fn test_query_invalid_pattern() {
        let result = query_preferences(&create_test_entries(), &["[invalid"]);
        assert!(matches!(result, Err(Error::InvalidGlobPattern { .. })));
    }
}
