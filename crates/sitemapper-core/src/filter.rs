//! Link filtering for sitemap inclusion.
//!
//! Pure functions that turn a link and a set of filter lists into exclusion
//! reasons. The aggregator unions these with the reasons each source already
//! attached.
//!
//! ## Quick Start
//!
//! ```rust
//! use sitemapper_core::filter::filter_link;
//! use sitemapper_core::ExclusionKind;
//!
//! let raw = vec!["index.php".to_string()];
//! let reasons = filter_link("/index.php?Itemid=4", &raw, &[], None);
//! assert_eq!(reasons.len(), 1);
//! assert_eq!(reasons[0].kind, ExclusionKind::RawFilter);
//!
//! // An empty link always yields exactly one reason
//! assert_eq!(filter_link("", &raw, &[], None).len(), 1);
//! ```

use crate::types::{ExclusionKind, ExclusionReason};

/// Evaluate every filter category against `link`.
///
/// - An empty link yields a single `null_link` reason and nothing else.
/// - `raw` and `substrings` are matched case-insensitively; each list
///   contributes at most one reason (the first matching entry).
/// - `menu_allow`, when supplied, requires the link to contain at least one of
///   the listed keys; otherwise one `menu_filter` reason is added.
///
/// Categories are independent of each other.
#[must_use]
pub fn filter_link(
    link: &str,
    raw: &[String],
    substrings: &[String],
    menu_allow: Option<&[String]>,
) -> Vec<ExclusionReason> {
    if link.is_empty() {
        return vec![ExclusionReason::new(
            ExclusionKind::NullLink,
            "Link is empty",
        )];
    }

    let link_lower = link.to_lowercase();
    let mut reasons = Vec::new();

    if let Some(entry) = first_match(&link_lower, raw) {
        reasons.push(ExclusionReason::new(
            ExclusionKind::RawFilter,
            format!("Link matches raw filter '{entry}'"),
        ));
    }

    if let Some(entry) = first_match(&link_lower, substrings) {
        reasons.push(ExclusionReason::new(
            ExclusionKind::SubstringFilter,
            format!("Link contains '{entry}'"),
        ));
    }

    if let Some(allowed) = menu_allow {
        if first_match(&link_lower, allowed).is_none() {
            reasons.push(ExclusionReason::new(
                ExclusionKind::MenuFilter,
                "Link is not under an allowed menu",
            ));
        }
    }

    reasons
}

/// First non-empty entry contained in `haystack_lower`, compared
/// case-insensitively.
fn first_match<'a>(haystack_lower: &str, entries: &'a [String]) -> Option<&'a str> {
    entries
        .iter()
        .filter(|entry| !entry.is_empty())
        .find(|entry| haystack_lower.contains(&entry.to_lowercase()))
        .map(String::as_str)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::disallowed_macros,
    clippy::unnecessary_wraps
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn kinds(reasons: &[ExclusionReason]) -> Vec<ExclusionKind> {
        reasons.iter().map(|r| r.kind.clone()).collect()
    }

    #[test]
    fn test_null_link_short_circuits() {
        let reasons = filter_link(
            "",
            &list(&["index.php"]),
            &list(&["foo"]),
            Some(&list(&["/blog"])),
        );
        assert_eq!(kinds(&reasons), vec![ExclusionKind::NullLink]);
    }

    #[test]
    fn test_raw_match() {
        let reasons = filter_link("foo/bar", &list(&["bar"]), &[], None);
        assert_eq!(kinds(&reasons), vec![ExclusionKind::RawFilter]);
        assert!(reasons[0].message.contains("bar"));
    }

    #[test]
    fn test_substring_match() {
        let reasons = filter_link("foo/bar", &[], &list(&["foo"]), None);
        assert_eq!(kinds(&reasons), vec![ExclusionKind::SubstringFilter]);
    }

    #[test]
    fn test_raw_and_substring_both_fire() {
        let reasons = filter_link("foo/bar", &list(&["bar"]), &list(&["foo"]), None);
        assert_eq!(
            kinds(&reasons),
            vec![ExclusionKind::RawFilter, ExclusionKind::SubstringFilter]
        );
    }

    #[test]
    fn test_first_raw_match_only() {
        let reasons = filter_link(
            "/index.php?option=com_content",
            &list(&["index.php", "?", "component/"]),
            &[],
            None,
        );
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].message.contains("index.php"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let reasons = filter_link("/Blog/Tag/Rust", &[], &list(&["/tag/"]), None);
        assert_eq!(kinds(&reasons), vec![ExclusionKind::SubstringFilter]);
    }

    #[test]
    fn test_menu_membership() {
        let allowed = list(&["/blog", "/docs"]);

        assert!(filter_link("/blog/post-1", &[], &[], Some(&allowed)).is_empty());

        let reasons = filter_link("/shop/item-9", &[], &[], Some(&allowed));
        assert_eq!(kinds(&reasons), vec![ExclusionKind::MenuFilter]);
    }

    #[test]
    fn test_empty_allow_list_excludes_everything() {
        let reasons = filter_link("/anything", &[], &[], Some(&[]));
        assert_eq!(kinds(&reasons), vec![ExclusionKind::MenuFilter]);
    }

    #[test]
    fn test_no_filters_no_reasons() {
        assert!(filter_link("/about", &[], &[], None).is_empty());
    }

    #[test]
    fn test_empty_entries_never_match() {
        assert!(filter_link("/about", &list(&[""]), &list(&[""]), None).is_empty());
    }

    proptest! {
        #[test]
        fn test_empty_link_always_single_reason(
            raw in prop::collection::vec("[a-z?/.]{0,6}", 0..4),
            subs in prop::collection::vec("[a-z?/.]{0,6}", 0..4),
            menu in prop::option::of(prop::collection::vec("[a-z/]{0,6}", 0..4)),
        ) {
            let reasons = filter_link("", &raw, &subs, menu.as_deref());
            prop_assert_eq!(reasons.len(), 1);
        }

        #[test]
        fn test_at_most_one_reason_per_category(
            link in "[a-zA-Z/?.=]{1,20}",
            raw in prop::collection::vec("[a-z?/.]{1,3}", 0..6),
            subs in prop::collection::vec("[a-z?/.]{1,3}", 0..6),
        ) {
            let reasons = filter_link(&link, &raw, &subs, None);
            prop_assert!(reasons.len() <= 2);
        }
    }
}
