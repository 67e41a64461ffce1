use std::sync::LazyLock;

use regex::Regex;

use crate::model::ChannelEntry;

static EXTINF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#EXTINF:(-?\d+)\s*([^,]*),(.*)$").unwrap());
static ATTRIBUTE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w[\w-]*)="([^"]*)""#).unwrap());

#[derive(Debug, Default)]
struct PendingHeader {
    name: String,
    group: Option<String>,
    tvg_id: Option<String>,
    tvg_name: Option<String>,
    tvg_logo: Option<String>,
}

fn decode_header(line: &str) -> PendingHeader {
    let mut header = PendingHeader::default();
    // A malformed #EXTINF still opens an empty header so the URL line
    // that follows is not dropped.
    if let Some(caps) = EXTINF_REGEX.captures(line) {
        header.name = caps[3].trim().to_string();
        for attr in ATTRIBUTE_REGEX.captures_iter(&caps[2]) {
            let value = attr[2].to_string();
            if value.is_empty() {
                continue;
            }
            match &attr[1] {
                "tvg-id" => header.tvg_id = Some(value),
                "tvg-name" => header.tvg_name = Some(value),
                "tvg-logo" => header.tvg_logo = Some(value),
                "group-title" => header.group = Some(value),
                _ => {}
            }
        }
    }
    header
}

/// Decodes M3U+ text into channel entries. Unparseable lines are skipped,
/// the result may be empty, this never fails.
pub fn parse_m3u_plus(text: &str) -> Vec<ChannelEntry> {
    let mut entries: Vec<ChannelEntry> = Vec::new();
    let mut pending: Option<PendingHeader> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim_start_matches('\u{feff}').trim_end();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("#EXTINF") {
            pending = Some(decode_header(line));
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        let Some(header) = pending.take() else {
            // orphan URL without a header line
            continue;
        };
        let url = line.to_string();
        let name = if header.name.is_empty() {
            header
                .tvg_name
                .clone()
                .filter(|tvg_name| !tvg_name.is_empty())
                .unwrap_or_else(|| url.clone())
        } else {
            header.name
        };
        entries.push(ChannelEntry {
            name,
            url,
            group: header.group,
            tvg_id: header.tvg_id,
            tvg_name: header.tvg_name,
            tvg_logo: header.tvg_logo,
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::unique_groups;

    const SAMPLE: &str = "#EXTM3U\n\
#EXTINF:-1 tvg-id=\"1\" group-title=\"US News\",CNN\n\
http://example.com/cnn.m3u8\n\
#EXTINF:-1 group-title=\"UK| Sport\",BBC1\n\
http://example.com/bbc1.m3u8\n";

    #[test]
    fn test_parse_sample_playlist() {
        let entries = parse_m3u_plus(SAMPLE);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "CNN");
        assert_eq!(entries[0].url, "http://example.com/cnn.m3u8");
        assert_eq!(entries[0].tvg_id.as_deref(), Some("1"));
        assert_eq!(entries[0].group.as_deref(), Some("US News"));
        assert_eq!(entries[1].name, "BBC1");
        assert_eq!(entries[1].group.as_deref(), Some("UK| Sport"));
        assert_eq!(unique_groups(&entries), vec!["UK| Sport", "US News"]);
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(parse_m3u_plus(SAMPLE), parse_m3u_plus(SAMPLE));
    }

    #[test]
    fn test_leading_bom_is_stripped() {
        let text = "\u{feff}#EXTM3U\n#EXTINF:-1,One\nhttp://example.com/1\n";
        let entries = parse_m3u_plus(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "One");
    }

    #[test]
    fn test_malformed_extinf_still_consumes_url() {
        let text = "#EXTINF: no duration here\nhttp://example.com/a\n";
        let entries = parse_m3u_plus(text);
        assert_eq!(entries.len(), 1);
        // falls back to the url when name and tvg-name are empty
        assert_eq!(entries[0].name, "http://example.com/a");
        assert!(entries[0].group.is_none());
    }

    #[test]
    fn test_name_falls_back_to_tvg_name() {
        let text = "#EXTINF:-1 tvg-name=\"Haber TV\",\nhttp://example.com/h\n";
        let entries = parse_m3u_plus(text);
        assert_eq!(entries[0].name, "Haber TV");
        assert_eq!(entries[0].tvg_name.as_deref(), Some("Haber TV"));
    }

    #[test]
    fn test_orphan_url_is_ignored() {
        let text = "#EXTM3U\nhttp://example.com/orphan\n#EXTINF:-1,Ok\nhttp://example.com/ok\n";
        let entries = parse_m3u_plus(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Ok");
    }

    #[test]
    fn test_directives_and_blank_lines_are_skipped() {
        let text = "#EXTM3U\n\n#EXTVLCOPT:network-caching=1000\n#EXTINF:0,Plain\nhttp://example.com/p\n\n";
        let entries = parse_m3u_plus(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Plain");
    }

    #[test]
    fn test_pending_header_is_consumed_once() {
        let text = "#EXTINF:-1,One\nhttp://example.com/1\nhttp://example.com/2\n";
        let entries = parse_m3u_plus(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "http://example.com/1");
    }

    #[test]
    fn test_empty_attribute_values_become_none() {
        let text = "#EXTINF:-1 tvg-id=\"\" group-title=\"News\",One\nhttp://example.com/1\n";
        let entries = parse_m3u_plus(text);
        assert!(entries[0].tvg_id.is_none());
        assert_eq!(entries[0].group.as_deref(), Some("News"));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_m3u_plus("").is_empty());
        assert!(parse_m3u_plus("#EXTM3U\n").is_empty());
    }
}
