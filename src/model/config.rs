use crate::utils::file_utils;

const DEFAULT_USER_AGENT: &str = "m3u-analyzer/0.3";
const DEFAULT_OUTPUT_DIR: &str = "playlists";
const DEFAULT_STATE_FILE: &str = "m3u_analyzer_state.json";

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_SAMPLE_SIZE: usize = 3;

fn default_user_agent() -> String {
    String::from(DEFAULT_USER_AGENT)
}

fn default_output_dir() -> String {
    String::from(DEFAULT_OUTPUT_DIR)
}

fn default_state_file() -> String {
    String::from(DEFAULT_STATE_FILE)
}

const fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

const fn default_probe_timeout() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECS
}

const fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub working_dir: String,
    /// Directory for generated playlist files, relative paths resolve
    /// against `working_dir`.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Version counter store, relative paths resolve against `working_dir`.
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    /// Optional persist pattern for the raw fetched document,
    /// `{}` is replaced with a timestamp, empty means off.
    #[serde(default)]
    pub persist: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_dir: String::new(),
            output_dir: default_output_dir(),
            state_file: default_state_file(),
            user_agent: default_user_agent(),
            fetch_timeout_secs: default_fetch_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            sample_size: default_sample_size(),
            persist: String::new(),
        }
    }
}

impl Config {
    pub fn prepare(&mut self) {
        self.working_dir = file_utils::get_working_path(&self.working_dir);
        if self.user_agent.is_empty() {
            self.user_agent = default_user_agent();
        }
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = default_fetch_timeout();
        }
        if self.probe_timeout_secs == 0 {
            self.probe_timeout_secs = default_probe_timeout();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let mut cfg: Config = serde_yaml::from_str("{}").unwrap();
        cfg.prepare();
        assert_eq!(cfg.sample_size, DEFAULT_SAMPLE_SIZE);
        assert_eq!(cfg.fetch_timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
        assert_eq!(cfg.probe_timeout_secs, DEFAULT_PROBE_TIMEOUT_SECS);
        assert_eq!(cfg.output_dir, DEFAULT_OUTPUT_DIR);
        assert!(!cfg.working_dir.is_empty());
    }

    #[test]
    fn test_zero_timeouts_fall_back() {
        let mut cfg: Config = serde_yaml::from_str("fetch_timeout_secs: 0\nprobe_timeout_secs: 0").unwrap();
        cfg.prepare();
        assert_eq!(cfg.fetch_timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
        assert_eq!(cfg.probe_timeout_secs, DEFAULT_PROBE_TIMEOUT_SECS);
    }
}
