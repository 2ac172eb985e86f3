//! Slug derivation shared by both sides of the audit.
//!
//! The catalog names nested collections by joining every ancestor's slug with
//! `-` (`parent-child-grandchild`), while the filesystem uses plain directory
//! names. Canonical identifiers rebuild the catalog form from a directory chain.

/// Lowercase a single directory name and replace spaces with hyphens.
pub fn canonical_segment(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Join the canonical form of every segment in `chain` with `-`.
pub fn canonical_identifier<S: AsRef<str>>(chain: &[S]) -> String {
    chain
        .iter()
        .map(|segment| canonical_segment(segment.as_ref()))
        .collect::<Vec<_>>()
        .join("-")
}

/// Lowercased form with every separator removed, used for loose hints only.
pub fn loose_form(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether `catalog_slug` ends with a segment run that loosely equals `name`.
///
/// `gynoids-wolves-n-foxes` loosely ends with `wolves n foxes` and
/// `cafe-darkbeauty` with `DarkBeauty`.
pub fn loosely_ends_with(catalog_slug: &str, name: &str) -> bool {
    let wanted = loose_form(name);
    if wanted.is_empty() {
        return false;
    }
    let parts: Vec<&str> = catalog_slug.split('-').collect();
    (1..parts.len()).any(|start| loose_form(&parts[start..].join("-")) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_segment() {
        assert_eq!(canonical_segment("Dancing Gynoids"), "dancing-gynoids");
        assert_eq!(canonical_segment("RedDancers"), "reddancers");
        assert_eq!(canonical_segment("already-slugged"), "already-slugged");
    }

    #[test]
    fn test_canonical_identifier_joins_chain() {
        assert_eq!(canonical_identifier(&["Couples"]), "couples");
        assert_eq!(
            canonical_identifier(&["Couples", "Pirate Couple best"]),
            "couples-pirate-couple-best"
        );
        assert_eq!(
            canonical_identifier(&["Gynoids", "Bugs", "Best"]),
            "gynoids-bugs-best"
        );
    }

    #[test]
    fn test_canonical_identifier_is_deterministic() {
        let chain = vec!["Cafe".to_string(), "Dark Beauty".to_string()];
        assert_eq!(canonical_identifier(&chain), canonical_identifier(&chain));
    }

    #[test]
    fn test_loosely_ends_with() {
        assert!(loosely_ends_with("cafe-darkbeauty", "DarkBeauty"));
        assert!(loosely_ends_with("gynoids-wolves-n-foxes", "wolves n foxes"));
        assert!(loosely_ends_with("gynoids-bugs-best", "Best"));
        assert!(!loosely_ends_with("gynoids", "gynoids"));
        assert!(!loosely_ends_with("cafe-flowers", "Coffee"));
    }
}
