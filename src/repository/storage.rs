use std::collections::HashMap;
use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::{DateTime, Local};
use log::warn;

use crate::create_m3u_analyzer_error_result;
use crate::m3u_analyzer_error::{M3uAnalyzerError, M3uAnalyzerErrorKind};
use crate::model::Config;
use crate::utils::file_utils;

const DAY_KEY_FORMAT: &str = "%d%m%Y";
const DEFAULT_LABEL: &str = "alibaba";
const DEFAULT_EXTENSION: &str = "m3u";

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct StoreState {
    #[serde(default)]
    versions: HashMap<String, u32>,
}

/// Per-day output version counter, persisted as a small JSON document.
/// An absent or corrupt file counts as empty.
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn for_config(cfg: &Config) -> Self {
        let path = file_utils::get_file_path(&cfg.working_dir, Some(PathBuf::from(&cfg.state_file)))
            .unwrap_or_else(|| PathBuf::from(&cfg.state_file));
        Self::new(path)
    }

    fn load_state(&self) -> StoreState {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return StoreState::default();
        };
        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(err) => {
                warn!("ignoring corrupt version store {:?}: {err}", self.path);
                StoreState::default()
            }
        }
    }

    fn save_state(&self, state: &StoreState) -> Result<(), M3uAnalyzerError> {
        match File::create(&self.path) {
            Ok(file) => {
                let mut writer = BufWriter::new(file);
                if let Err(err) = serde_json::to_writer(&mut writer, state) {
                    return create_m3u_analyzer_error_result!(
                        M3uAnalyzerErrorKind::Storage,
                        "cant write version store {:?}: {err}",
                        self.path
                    );
                }
                match writer.flush() {
                    Ok(()) => Ok(()),
                    Err(err) => create_m3u_analyzer_error_result!(
                        M3uAnalyzerErrorKind::Storage,
                        "cant write version store {:?}: {err}",
                        self.path
                    ),
                }
            }
            Err(err) => create_m3u_analyzer_error_result!(
                M3uAnalyzerErrorKind::Storage,
                "cant create version store {:?}: {err}",
                self.path
            ),
        }
    }

    pub fn next_version_for_day(&self, day_key: &str) -> Result<u32, M3uAnalyzerError> {
        let mut state = self.load_state();
        let version = state.versions.get(day_key).copied().unwrap_or(0) + 1;
        state.versions.insert(day_key.to_string(), version);
        self.save_state(&state)?;
        Ok(version)
    }
}

fn sanitize_label(label: &str) -> String {
    let base = if label.trim().is_empty() { DEFAULT_LABEL } else { label };
    let safe: String = base
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    let safe = safe.trim_matches('_');
    if safe.is_empty() {
        DEFAULT_LABEL.to_string()
    } else {
        safe.to_string()
    }
}

/// Deterministic, versioned output filename:
/// `{expiry-or-created}_{label}_v{version}_{created}.{ext}` with all dates
/// as `ddmmyyyy`.
pub fn build_filename(
    store: &VersionStore,
    label: &str,
    created: DateTime<Local>,
    ext: &str,
    expiry: Option<DateTime<Local>>,
) -> Result<(String, u32), M3uAnalyzerError> {
    let created_key = created.format(DAY_KEY_FORMAT).to_string();
    let version = store.next_version_for_day(&created_key)?;

    let prefix = expiry.unwrap_or(created).format(DAY_KEY_FORMAT).to_string();
    let safe_label = sanitize_label(label);
    let ext = ext.trim_start_matches('.');
    let ext = if ext.is_empty() { DEFAULT_EXTENSION } else { ext };

    Ok((format!("{prefix}_{safe_label}_v{version}_{created_key}.{ext}"), version))
}

#[derive(Debug, Clone)]
pub struct SaveResult {
    pub file_path: PathBuf,
    pub version: u32,
}

pub fn ensure_output_dir(cfg: &Config) -> Result<PathBuf, M3uAnalyzerError> {
    let path = file_utils::get_file_path(&cfg.working_dir, Some(PathBuf::from(&cfg.output_dir)))
        .unwrap_or_else(|| PathBuf::from(&cfg.output_dir));
    if fs::create_dir_all(&path).is_err() {
        return create_m3u_analyzer_error_result!(
            M3uAnalyzerErrorKind::Storage,
            "cant create output directory {:?}",
            path
        );
    }
    Ok(path)
}

/// Places generated playlist text under the configured output directory
/// with a versioned filename.
pub fn save_playlist(
    cfg: &Config,
    content: &str,
    label: &str,
    ext: &str,
    expiry: Option<DateTime<Local>>,
) -> Result<SaveResult, M3uAnalyzerError> {
    let store = VersionStore::for_config(cfg);
    let created = Local::now();
    let (filename, version) = build_filename(&store, label, created, ext, expiry)?;
    let out_dir = ensure_output_dir(cfg)?;
    let path = out_dir.join(filename);
    match fs::write(&path, content) {
        Ok(()) => Ok(SaveResult { file_path: path, version }),
        Err(err) => create_m3u_analyzer_error_result!(
            M3uAnalyzerErrorKind::Storage,
            "cant write playlist file {path:?}: {err}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store_in(dir: &tempfile::TempDir) -> VersionStore {
        VersionStore::new(dir.path().join("state.json"))
    }

    #[test]
    fn test_version_counter_increments_per_day() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.next_version_for_day("01012024").unwrap(), 1);
        assert_eq!(store.next_version_for_day("01012024").unwrap(), 2);
        assert_eq!(store.next_version_for_day("02012024").unwrap(), 1);
    }

    #[test]
    fn test_corrupt_store_counts_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let store = VersionStore::new(path);
        assert_eq!(store.next_version_for_day("01012024").unwrap(), 1);
    }

    #[test]
    fn test_build_filename_example() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let created = Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let (filename, version) =
            build_filename(&store, "My List!", created, ".m3u8", None).unwrap();
        assert_eq!(version, 1);
        assert_eq!(filename, "01012024_MyList_v1_01012024.m3u8");
    }

    #[test]
    fn test_build_filename_expiry_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let created = Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let expiry = Local.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let (filename, _) = build_filename(&store, "tv", created, "m3u", Some(expiry)).unwrap();
        assert_eq!(filename, "15032024_tv_v1_01012024.m3u");
    }

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("My List!"), "MyList");
        assert_eq!(sanitize_label("a_b-c"), "a_b-c");
        assert_eq!(sanitize_label("___"), "alibaba");
        assert_eq!(sanitize_label(""), "alibaba");
        assert_eq!(sanitize_label("_tv_"), "tv");
    }
}
