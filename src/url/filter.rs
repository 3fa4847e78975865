use std::collections::HashSet;

/// One denylist entry, matched against whole path segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentRule {
    /// Segment must equal the name
    Exact(String),
    /// Segment must start with the name (written `name*` in configuration)
    Prefix(String),
}

impl SegmentRule {
    /// Parses a configuration entry such as `auth` or `download*`
    pub fn parse(entry: &str) -> Self {
        let entry = entry.to_lowercase();
        match entry.strip_suffix('*') {
            Some(prefix) => Self::Prefix(prefix.to_string()),
            None => Self::Exact(entry),
        }
    }

    /// Checks a single lowercase path segment against this rule
    pub fn matches(&self, segment: &str) -> bool {
        match self {
            Self::Exact(name) => segment == name,
            Self::Prefix(prefix) => segment.starts_with(prefix.as_str()),
        }
    }
}

/// Returns the first path segment denied by any rule
///
/// Matching is case-insensitive.
pub fn denied_segment<'a>(path: &'a str, rules: &[SegmentRule]) -> Option<&'a str> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .find(|segment| {
            let lower = segment.to_lowercase();
            rules.iter().any(|rule| rule.matches(&lower))
        })
}

/// Returns every combined suffix of the last path segment, longest first
///
/// Follows POSIX suffix rules: leading dots belong to the name, and a name
/// ending in a dot has no suffix.
///
/// ```
/// use sumi_glean::url::combined_suffixes;
///
/// assert_eq!(combined_suffixes("/files/archive.TAR.gz"), vec![".tar.gz", ".gz"]);
/// assert!(combined_suffixes("/about").is_empty());
/// ```
pub fn combined_suffixes(path: &str) -> Vec<String> {
    let name = path.rsplit('/').next().unwrap_or("").to_lowercase();
    if name.ends_with('.') {
        return Vec::new();
    }

    let parts: Vec<&str> = name.trim_start_matches('.').split('.').collect();
    (1..parts.len())
        .map(|start| format!(".{}", parts[start..].join(".")))
        .collect()
}

/// Returns the first combined suffix of `path` contained in `extensions`
pub fn matching_extension(path: &str, extensions: &HashSet<String>) -> Option<String> {
    combined_suffixes(path)
        .into_iter()
        .find(|suffix| extensions.contains(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_segment_rule_parse() {
        assert_eq!(SegmentRule::parse("auth"), SegmentRule::Exact("auth".to_string()));
        assert_eq!(
            SegmentRule::parse("Download*"),
            SegmentRule::Prefix("download".to_string())
        );
    }

    #[test]
    fn test_exact_rule_does_not_match_longer_segment() {
        let rules = vec![SegmentRule::parse("auth")];
        assert_eq!(denied_segment("/auth/login", &rules), Some("auth"));
        assert_eq!(denied_segment("/authors/list", &rules), None);
    }

    #[test]
    fn test_prefix_rule_matches_variants() {
        let rules = vec![SegmentRule::parse("download*")];
        assert_eq!(denied_segment("/x/download/report.pdf", &rules), Some("download"));
        assert_eq!(denied_segment("/downloads", &rules), Some("downloads"));
        assert_eq!(denied_segment("/Download-Centre/a", &rules), Some("Download-Centre"));
        assert_eq!(denied_segment("/pages/view", &rules), None);
    }

    #[test]
    fn test_combined_suffixes() {
        assert_eq!(combined_suffixes("/archive.tar.gz"), vec![".tar.gz", ".gz"]);
        assert_eq!(combined_suffixes("/report.PDF"), vec![".pdf"]);
        assert_eq!(
            combined_suffixes("/a/v1.2.tar.gz"),
            vec![".2.tar.gz", ".tar.gz", ".gz"]
        );
        assert!(combined_suffixes("/").is_empty());
        assert!(combined_suffixes("/page-two").is_empty());
    }

    #[test]
    fn test_combined_suffixes_posix_rules() {
        // Leading dots are part of the name
        assert!(combined_suffixes("/.htaccess").is_empty());
        assert_eq!(combined_suffixes("/.config.xml"), vec![".xml"]);
        // A trailing dot means no suffix
        assert!(combined_suffixes("/odd.name.").is_empty());
    }

    #[test]
    fn test_matching_extension_prefers_combined_token() {
        let forbidden = extensions(&[".tar.gz", ".gz"]);
        assert_eq!(
            matching_extension("/archive.tar.gz", &forbidden),
            Some(".tar.gz".to_string())
        );

        let only_combined = extensions(&[".tar.gz"]);
        assert_eq!(matching_extension("/x.gz", &only_combined), None);
    }
}
