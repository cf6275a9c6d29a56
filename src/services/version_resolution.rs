//! Permissive version-range resolution
//!
//! Maps a range expression plus a registry's ascending-sorted version list to
//! one concrete version. This is deliberately an approximation, not a
//! constraint solver: it always terminates and, whenever the registry has any
//! stable release, always picks *some* version. Callers that need strict
//! caret/tilde semantics must not rely on this resolver.

/// True when the expression names a single version with no range operator.
/// Exact expressions are fetched as pinned versions and returned verbatim,
/// with no existence check against the registry's version list.
pub(crate) fn range_is_exact(range: &str) -> bool {
    let range = range.trim();
    !range.is_empty()
        && range != "*"
        && range != "latest"
        && !range
            .chars()
            .any(|c| matches!(c, '^' | '~' | '>' | '<' | '=' | '!' | '*' | ' '))
}

/// Range-to-version resolution over an ascending-sorted version list
pub struct RangeResolver;

impl RangeResolver {
    /// Resolve `range` against `available` (ascending-sorted).
    ///
    /// Rules, in priority order:
    /// 1. Empty, `*`, or `latest`: the greatest version without a pre-release
    ///    marker; `None` if no stable version exists.
    /// 2. No range operator: treat as exact and return verbatim.
    /// 3. Leading `^` or `~`: the stripped version if present verbatim,
    ///    otherwise the greatest available version.
    /// 4. Any other operator (`>=`, `<=`, `>`, `<`, `!=`): strip operator
    ///    characters; the remainder if present, otherwise the greatest
    ///    available version.
    pub fn resolve(range: &str, available: &[String]) -> Option<String> {
        let range = range.trim();

        if range.is_empty() || range == "*" || range == "latest" {
            return available.iter().rev().find(|v| !v.contains('-')).cloned();
        }

        if range_is_exact(range) {
            return Some(range.to_string());
        }

        if let Some(stripped) = range.strip_prefix(['^', '~']) {
            let stripped = stripped.trim();
            if available.iter().any(|v| v == stripped) {
                return Some(stripped.to_string());
            }
            return available.last().cloned();
        }

        let stripped: String = range
            .chars()
            .filter(|c| !matches!(c, '^' | '~' | '>' | '<' | '=' | '!' | ' '))
            .collect();
        if available.iter().any(|v| *v == stripped) {
            return Some(stripped);
        }
        available.last().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_wildcard_picks_greatest_stable() {
        let available = versions(&["1.0.0", "2.0.0", "3.0.0-beta.1"]);
        assert_eq!(RangeResolver::resolve("*", &available), Some("2.0.0".into()));
        assert_eq!(RangeResolver::resolve("", &available), Some("2.0.0".into()));
        assert_eq!(
            RangeResolver::resolve("latest", &available),
            Some("2.0.0".into())
        );
    }

    #[test]
    fn test_wildcard_with_only_prereleases() {
        let available = versions(&["1.0.0-alpha", "1.0.0-beta"]);
        assert_eq!(RangeResolver::resolve("*", &available), None);
    }

    #[test]
    fn test_exact_returned_verbatim_without_existence_check() {
        let available = versions(&["1.0.0"]);
        assert_eq!(
            RangeResolver::resolve("9.9.9", &available),
            Some("9.9.9".into())
        );
        // Even with an empty list
        assert_eq!(RangeResolver::resolve("1.2.3", &[]), Some("1.2.3".into()));
    }

    #[test]
    fn test_caret_present_verbatim() {
        let available = versions(&["4.17.20", "4.17.21", "5.0.0"]);
        assert_eq!(
            RangeResolver::resolve("^4.17.21", &available),
            Some("4.17.21".into())
        );
        assert_eq!(
            RangeResolver::resolve("~4.17.20", &available),
            Some("4.17.20".into())
        );
    }

    #[test]
    fn test_caret_absent_falls_back_to_greatest() {
        let available = versions(&["4.17.20", "4.17.21", "5.0.0"]);
        assert_eq!(
            RangeResolver::resolve("^4.0.0", &available),
            Some("5.0.0".into())
        );
    }

    #[test]
    fn test_operator_stripping() {
        let available = versions(&["1.0.0", "2.0.0", "3.0.0"]);
        assert_eq!(
            RangeResolver::resolve(">=2.0.0", &available),
            Some("2.0.0".into())
        );
        assert_eq!(
            RangeResolver::resolve("!=1.5.0", &available),
            Some("3.0.0".into())
        );
    }

    #[test]
    fn test_empty_available_with_range() {
        assert_eq!(RangeResolver::resolve("^1.0.0", &[]), None);
        assert_eq!(RangeResolver::resolve(">=1.0.0", &[]), None);
        assert_eq!(RangeResolver::resolve("*", &[]), None);
    }

    #[test]
    fn test_range_is_exact() {
        assert!(range_is_exact("1.2.3"));
        assert!(range_is_exact("4.17.15"));
        assert!(!range_is_exact("^1.2.3"));
        assert!(!range_is_exact("~1.2"));
        assert!(!range_is_exact(">=1.0.0"));
        assert!(!range_is_exact("*"));
        assert!(!range_is_exact("latest"));
        assert!(!range_is_exact(""));
        assert!(!range_is_exact("1.0.0 - 2.0.0"));
    }
}
