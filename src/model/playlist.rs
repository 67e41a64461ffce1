use std::collections::HashSet;

use chrono::{DateTime, Local};

// https://de.wikipedia.org/wiki/M3U
// https://siptv.eu/howto/playlist.html

/// One playlist record, produced only by the parser. Identity is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelEntry {
    pub name: String,
    pub url: String,
    pub group: Option<String>,
    pub tvg_id: Option<String>,
    pub tvg_name: Option<String>,
    pub tvg_logo: Option<String>,
}

impl ChannelEntry {
    pub fn to_m3u(&self) -> String {
        let mut attrs: Vec<String> = Vec::new();
        if let Some(tvg_id) = self.tvg_id.as_deref().filter(|v| !v.is_empty()) {
            attrs.push(format!("tvg-id=\"{tvg_id}\""));
        }
        if let Some(tvg_name) = self.tvg_name.as_deref().filter(|v| !v.is_empty()) {
            attrs.push(format!("tvg-name=\"{tvg_name}\""));
        }
        if let Some(tvg_logo) = self.tvg_logo.as_deref().filter(|v| !v.is_empty()) {
            attrs.push(format!("tvg-logo=\"{tvg_logo}\""));
        }
        if let Some(group) = self.group.as_deref().filter(|v| !v.is_empty()) {
            attrs.push(format!("group-title=\"{group}\""));
        }
        if attrs.is_empty() {
            format!("#EXTINF:-1,{}\n{}", self.name, self.url)
        } else {
            format!("#EXTINF:-1 {},{}\n{}", attrs.join(" "), self.name, self.url)
        }
    }
}

/// Summary of one analysis run. Created once per `analyze` call,
/// not mutated after return.
#[derive(Debug, Clone)]
pub struct PlaylistAnalysis {
    pub source_url: String,
    /// At least one probed sample stream responded. Vacuously true when
    /// there were no entries to sample against.
    pub fetched_ok: bool,
    /// Parsing yielded at least one entry.
    pub parsed_ok: bool,
    pub channel_count: usize,
    /// Non-empty, trimmed, deduplicated group titles, sorted case-insensitively.
    pub groups: Vec<String>,
    pub expiry: Option<DateTime<Local>>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub ok: bool,
    pub status_code: Option<u16>,
}

/// Group names the caller selected for the output, owned by the caller and
/// only read by the filter.
#[derive(Debug, Clone, Default)]
pub struct GroupSelection {
    pub selected_groups: HashSet<String>,
}

impl GroupSelection {
    pub fn set_all<I, S>(&mut self, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_groups = groups.into_iter().map(Into::into).collect();
    }

    pub fn toggle(&mut self, group: &str, selected: bool) {
        if selected {
            self.selected_groups.insert(group.to_string());
        } else {
            self.selected_groups.remove(group);
        }
    }

    pub fn clear(&mut self) {
        self.selected_groups.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.selected_groups.is_empty()
    }
}

pub fn unique_groups(entries: &[ChannelEntry]) -> Vec<String> {
    let groups: HashSet<String> = entries
        .iter()
        .filter_map(|entry| entry.group.as_deref())
        .map(str::trim)
        .filter(|group| !group.is_empty())
        .map(ToString::to_string)
        .collect();
    let mut result: Vec<String> = groups.into_iter().collect();
    result.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, url: &str, group: Option<&str>) -> ChannelEntry {
        ChannelEntry {
            name: name.to_string(),
            url: url.to_string(),
            group: group.map(ToString::to_string),
            tvg_id: None,
            tvg_name: None,
            tvg_logo: None,
        }
    }

    #[test]
    fn test_unique_groups_sorted_case_insensitive() {
        let entries = vec![
            entry("a", "http://x/1", Some("zebra")),
            entry("b", "http://x/2", Some("Alpha")),
            entry("c", "http://x/3", Some(" zebra ")),
            entry("d", "http://x/4", Some("")),
            entry("e", "http://x/5", None),
            entry("f", "http://x/6", Some("BETA")),
        ];
        assert_eq!(unique_groups(&entries), vec!["Alpha", "BETA", "zebra"]);
    }

    #[test]
    fn test_to_m3u_without_attributes() {
        let line = entry("CNN", "http://example.com/cnn.m3u8", None).to_m3u();
        assert_eq!(line, "#EXTINF:-1,CNN\nhttp://example.com/cnn.m3u8");
    }

    #[test]
    fn test_to_m3u_attribute_order() {
        let e = ChannelEntry {
            name: "CNN".to_string(),
            url: "http://example.com/cnn.m3u8".to_string(),
            group: Some("US News".to_string()),
            tvg_id: Some("1".to_string()),
            tvg_name: Some("CNN HD".to_string()),
            tvg_logo: Some("http://example.com/cnn.png".to_string()),
        };
        assert_eq!(
            e.to_m3u(),
            "#EXTINF:-1 tvg-id=\"1\" tvg-name=\"CNN HD\" tvg-logo=\"http://example.com/cnn.png\" group-title=\"US News\",CNN\nhttp://example.com/cnn.m3u8"
        );
    }

    #[test]
    fn test_group_selection() {
        let mut selection = GroupSelection::default();
        assert!(selection.is_empty());
        selection.set_all(["News", "Sport"]);
        assert_eq!(selection.selected_groups.len(), 2);
        selection.toggle("News", false);
        assert!(!selection.selected_groups.contains("News"));
        selection.clear();
        assert!(selection.is_empty());
    }
}
