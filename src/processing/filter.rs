use std::collections::HashSet;

use crate::model::ChannelEntry;

// checked in priority order
const COUNTRY_SEPARATORS: &[char] = &['|', '-', '_', '/', ' '];

/// Derives a short country code from a group label's leading segment,
/// e.g. "TR | Haber" -> "TR". Returns only 2-3 letter alphabetic tokens.
pub fn guess_country_code(group_title: &str) -> Option<String> {
    let group = group_title.trim();
    if group.is_empty() {
        return None;
    }
    let token = COUNTRY_SEPARATORS
        .iter()
        .find(|sep| group.contains(**sep))
        .map_or(group, |sep| group.split(*sep).next().unwrap_or_default().trim());
    let token = token.to_uppercase();
    let len = token.chars().count();
    if (2..=3).contains(&len) && token.chars().all(char::is_alphabetic) {
        Some(token)
    } else {
        None
    }
}

/// An empty selection selects nothing, not everything.
pub fn filter_by_groups(
    entries: &[ChannelEntry],
    selected_groups: &HashSet<String>,
) -> Vec<ChannelEntry> {
    if selected_groups.is_empty() {
        return Vec::new();
    }
    let normalized: HashSet<&str> = selected_groups
        .iter()
        .map(|group| group.trim())
        .filter(|group| !group.is_empty())
        .collect();
    entries
        .iter()
        .filter(|entry| {
            entry
                .group
                .as_deref()
                .is_some_and(|group| normalized.contains(group.trim()))
        })
        .cloned()
        .collect()
}

/// An empty selection selects nothing. Entries without a derivable
/// country code are excluded.
pub fn filter_by_country_codes(
    entries: &[ChannelEntry],
    selected_codes: &HashSet<String>,
) -> Vec<ChannelEntry> {
    if selected_codes.is_empty() {
        return Vec::new();
    }
    let codes_upper: HashSet<String> =
        selected_codes.iter().map(|code| code.to_uppercase()).collect();
    entries
        .iter()
        .filter(|entry| {
            entry
                .group
                .as_deref()
                .and_then(guess_country_code)
                .is_some_and(|code| codes_upper.contains(&code))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, group: Option<&str>) -> ChannelEntry {
        ChannelEntry {
            name: name.to_string(),
            url: format!("http://example.com/{name}"),
            group: group.map(ToString::to_string),
            tvg_id: None,
            tvg_name: None,
            tvg_logo: None,
        }
    }

    #[test]
    fn test_guess_country_code() {
        assert_eq!(guess_country_code("TR | Haber").as_deref(), Some("TR"));
        assert_eq!(guess_country_code("UK| Sport").as_deref(), Some("UK"));
        assert_eq!(guess_country_code("HD-Movies").as_deref(), Some("HD"));
        assert_eq!(guess_country_code("24/7 News"), None);
        assert_eq!(guess_country_code("Documentary"), None);
        assert_eq!(guess_country_code("de_regional").as_deref(), Some("DE"));
        assert_eq!(guess_country_code("USA Sports").as_deref(), Some("USA"));
        assert_eq!(guess_country_code(""), None);
        assert_eq!(guess_country_code("   "), None);
    }

    #[test]
    fn test_separator_priority() {
        // '|' wins over '-' even when '-' comes first in the title
        assert_eq!(guess_country_code("X-Y | Sport"), None);
        assert_eq!(guess_country_code("FR | HD-Movies").as_deref(), Some("FR"));
    }

    #[test]
    fn test_filter_by_groups_empty_selection() {
        let entries = vec![entry("a", Some("News")), entry("b", Some("Sport"))];
        assert!(filter_by_groups(&entries, &HashSet::new()).is_empty());
    }

    #[test]
    fn test_filter_by_groups_trims_and_matches_exact() {
        let entries = vec![
            entry("a", Some(" News ")),
            entry("b", Some("news")),
            entry("c", None),
        ];
        let selection: HashSet<String> = ["News".to_string()].into_iter().collect();
        let kept = filter_by_groups(&entries, &selection);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "a");
    }

    #[test]
    fn test_filter_by_country_codes() {
        let entries = vec![
            entry("a", Some("TR | Haber")),
            entry("b", Some("DE - Sport")),
            entry("c", Some("Documentary")),
            entry("d", None),
        ];
        let codes: HashSet<String> = ["tr".to_string(), "DE".to_string()].into_iter().collect();
        let kept = filter_by_country_codes(&entries, &codes);
        assert_eq!(kept.len(), 2);
        assert!(filter_by_country_codes(&entries, &HashSet::new()).is_empty());
    }
}
