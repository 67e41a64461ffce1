use std::sync::Arc;
use std::time::Duration;

use log::debug;
use rand::seq::SliceRandom;

use crate::m3u_analyzer_error::M3uAnalyzerError;
use crate::model::{unique_groups, ChannelEntry, Config, PlaylistAnalysis, ProbeResult};
use crate::processing::parser::m3u::parse_m3u_plus;
use crate::processing::progress::ProgressSender;
use crate::utils::file_utils;
use crate::utils::guess_expiry;
use crate::utils::network::request;
use crate::utils::network::request::sanitize_sensitive_info;

/// Drives fetch -> parse -> expiry guess -> sample probe for one playlist
/// URL. Owns its HTTP client explicitly, one instance can serve many runs.
pub struct PlaylistAnalyzer {
    client: Arc<reqwest::Client>,
    fetch_timeout: Duration,
    probe_timeout: Duration,
    persist_pattern: Option<String>,
    working_dir: String,
}

impl PlaylistAnalyzer {
    pub fn new(cfg: &Config) -> Result<Self, M3uAnalyzerError> {
        Ok(Self {
            client: request::create_client(&cfg.user_agent)?,
            fetch_timeout: Duration::from_secs(cfg.fetch_timeout_secs),
            probe_timeout: Duration::from_secs(cfg.probe_timeout_secs),
            persist_pattern: if cfg.persist.is_empty() { None } else { Some(cfg.persist.clone()) },
            working_dir: cfg.working_dir.clone(),
        })
    }

    pub async fn probe_stream(&self, url: &str) -> ProbeResult {
        request::probe_stream(&self.client, url, self.probe_timeout).await
    }

    /// Only a failure to retrieve the playlist document is fatal; failed
    /// stream probes are counted and reflected in `fetched_ok`.
    pub async fn analyze(
        &self,
        url: &str,
        sample_size: usize,
        progress: &ProgressSender,
    ) -> Result<(PlaylistAnalysis, Vec<ChannelEntry>), M3uAnalyzerError> {
        progress.emit(0.05, "downloading playlist");
        let persist_filepath = self.persist_pattern.as_ref().and_then(|pattern| {
            file_utils::get_file_path(
                &self.working_dir,
                Some(file_utils::prepare_persist_path(pattern, "")),
            )
        });
        let text = request::download_text_content(
            &self.client,
            url,
            self.fetch_timeout,
            persist_filepath,
        )
        .await?;
        let expiry = guess_expiry(url);

        progress.emit(0.35, "parsing playlist");
        let entries = parse_m3u_plus(&text);
        let groups = unique_groups(&entries);
        let parsed_ok = !entries.is_empty();

        progress.emit(0.55, "probing sample streams");
        // vacuously ok when there is nothing to sample against
        let mut fetched_ok = true;
        if parsed_ok {
            let sample = Self::sample_entries(&entries, sample_size);
            let total = sample.len();
            let mut ok_count = 0usize;
            for (idx, entry) in sample.iter().enumerate() {
                let result = self.probe_stream(&entry.url).await;
                if result.ok {
                    ok_count += 1;
                }
                debug!(
                    "probed {} -> ok={} status={:?}",
                    sanitize_sensitive_info(&entry.url),
                    result.ok,
                    result.status_code
                );
                let done = idx + 1;
                progress.emit(
                    0.55 + 0.35 * (done as f64 / total as f64),
                    &format!("stream probe {done}/{total}"),
                );
            }
            fetched_ok = ok_count >= 1;
        }

        progress.emit(0.95, "finishing");
        let analysis = PlaylistAnalysis {
            source_url: url.to_string(),
            fetched_ok,
            parsed_ok,
            channel_count: entries.len(),
            groups,
            expiry,
        };
        progress.emit(1.0, "done");
        Ok((analysis, entries))
    }

    /// Random sample without replacement, at least one entry, at most
    /// `sample_size` and never more than available.
    fn sample_entries(entries: &[ChannelEntry], sample_size: usize) -> Vec<&ChannelEntry> {
        if entries.is_empty() {
            return Vec::new();
        }
        let mut candidates: Vec<&ChannelEntry> = entries.iter().collect();
        candidates.shuffle(&mut rand::rng());
        candidates.truncate(sample_size.clamp(1, entries.len()));
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(count: usize) -> Vec<ChannelEntry> {
        (0..count)
            .map(|i| ChannelEntry {
                name: format!("ch{i}"),
                url: format!("http://example.com/{i}"),
                group: None,
                tvg_id: None,
                tvg_name: None,
                tvg_logo: None,
            })
            .collect()
    }

    #[test]
    fn test_sample_is_bounded_and_distinct() {
        let all = entries(10);
        let sample = PlaylistAnalyzer::sample_entries(&all, 3);
        assert_eq!(sample.len(), 3);
        let urls: std::collections::HashSet<&str> =
            sample.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls.len(), 3);
    }

    #[test]
    fn test_sample_never_exceeds_available() {
        let all = entries(2);
        assert_eq!(PlaylistAnalyzer::sample_entries(&all, 5).len(), 2);
    }

    #[test]
    fn test_sample_takes_at_least_one() {
        let all = entries(4);
        assert_eq!(PlaylistAnalyzer::sample_entries(&all, 0).len(), 1);
    }
}
