//! Journal issue title conventions.
//!
//! A journal issue names the resource it concerns in a title prefix:
//!
//! ```text
//! [garden-dev/my-shoot] Nodes not joining after upgrade
//! ```

use crate::types::ResourceRef;

/// Splits a journal title into the resource it refers to and the remaining title.
///
/// Returns `None` if the title has no well-formed `[namespace/name]` prefix.
pub fn parse_journal_title(title: &str) -> Option<(ResourceRef, &str)> {
    let rest = title.trim_start().strip_prefix('[')?;
    let (reference, remainder) = rest.split_once(']')?;
    let resource = ResourceRef::parse(reference.trim()).ok()?;
    Some((resource, remainder.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_prefixed_title() {
        let (resource, title) = parse_journal_title("[garden-x/shoot1] Cluster unreachable").unwrap();
        assert_eq!(resource, ResourceRef::new("garden-x", "shoot1"));
        assert_eq!(title, "Cluster unreachable");
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let (resource, title) = parse_journal_title("  [ garden-x/shoot1 ]   Disk full ").unwrap();
        assert_eq!(resource, ResourceRef::new("garden-x", "shoot1"));
        assert_eq!(title, "Disk full");
    }

    #[test]
    fn prefix_only_title_has_empty_remainder() {
        let (_, title) = parse_journal_title("[garden-x/shoot1]").unwrap();
        assert_eq!(title, "");
    }

    #[test]
    fn rejects_titles_without_prefix() {
        assert!(parse_journal_title("Cluster unreachable").is_none());
        assert!(parse_journal_title("[garden-x] missing name").is_none());
        assert!(parse_journal_title("[garden-x/shoot1 unterminated").is_none());
        assert!(parse_journal_title("[Garden/Shoot] uppercase").is_none());
        assert!(parse_journal_title("text [garden-x/shoot1] later").is_none());
    }

    proptest! {
        #[test]
        fn prefixed_titles_parse_back(
            namespace in "[a-z0-9]([a-z0-9-]{0,20}[a-z0-9])?",
            name in "[a-z0-9]([a-z0-9-]{0,20}[a-z0-9])?",
            title in "[A-Za-z0-9][A-Za-z0-9 ]{0,40}[A-Za-z0-9]",
        ) {
            let resource = ResourceRef::new(namespace, name);
            let formatted = format!("[{resource}] {title}");
            let (parsed, rest) = parse_journal_title(&formatted).unwrap();
            prop_assert_eq!(parsed, resource);
            prop_assert_eq!(rest, title.as_str());
        }
    }
}
