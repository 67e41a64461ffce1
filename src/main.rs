use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use log::{error, info, warn};

use m3u_analyzer::create_m3u_analyzer_error_result;
use m3u_analyzer::m3u_analyzer_error::{M3uAnalyzerError, M3uAnalyzerErrorKind};
use m3u_analyzer::model::{ChannelEntry, Config, GroupSelection, PlaylistAnalysis};
use m3u_analyzer::processing::analyzer::PlaylistAnalyzer;
use m3u_analyzer::processing::filter::{
    filter_by_country_codes, filter_by_groups, guess_country_code,
};
use m3u_analyzer::processing::progress::ProgressSender;
use m3u_analyzer::repository::m3u_repository::build_m3u_plus;
use m3u_analyzer::repository::storage;
use m3u_analyzer::utils::extract_urls;
use m3u_analyzer::utils::network::request::sanitize_sensitive_info;

const DEFAULT_CONFIG_FILE: &str = "config.yml";

#[derive(Parser)]
#[command(name = "m3u-analyzer", version, about = "Extended M3U playlist analyzer")]
struct Args {
    /// The config file
    #[arg(short, long)]
    config: Option<String>,
    /// Print more log
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one playlist URL and optionally write a filtered copy
    Analyze {
        url: String,
        /// Keep only these groups in the output, defaults to all groups
        #[arg(short, long, value_delimiter = ',')]
        groups: Vec<String>,
        /// Label embedded in the output filename
        #[arg(short, long, default_value = "alibaba")]
        label: String,
        /// Output file extension
        #[arg(short, long, default_value = "m3u")]
        ext: String,
        /// Write the filtered playlist to the output directory
        #[arg(short, long)]
        write: bool,
    },
    /// Extract playlist links from free text, analyze all of them and
    /// write the working ones filtered by country code
    Auto {
        /// Text file containing playlist links
        file: PathBuf,
        /// Keep only these country codes, defaults to all derivable codes
        #[arg(short = 'C', long, value_delimiter = ',')]
        codes: Vec<String>,
        /// One output file per source instead of one combined file
        #[arg(long)]
        no_combine: bool,
        /// Label embedded in the output filename
        #[arg(short, long, default_value = "alibaba")]
        label: String,
        /// Output file extension
        #[arg(short, long, default_value = "m3u")]
        ext: String,
    },
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);
    let cfg = read_config(args.config.as_deref());

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("cant start runtime: {err}");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        match args.command {
            Command::Analyze { url, groups, label, ext, write } => {
                run_manual(&cfg, &url, groups, &label, &ext, write).await
            }
            Command::Auto { file, codes, no_combine, label, ext } => {
                run_auto(&cfg, &file, codes, no_combine, &label, &ext).await
            }
        }
    });

    if let Err(err) = result {
        error!("{err}");
        std::process::exit(1);
    }
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    )
    .init();
}

fn read_config(config_file: Option<&str>) -> Config {
    let mut cfg: Config = match config_file {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(cfg) => cfg,
                Err(err) => panic!("cant read config file: {err}"),
            },
            Err(err) => panic!("cant read config file: {err}"),
        },
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                match fs::read_to_string(&default_path)
                    .map_err(|err| err.to_string())
                    .and_then(|content| {
                        serde_yaml::from_str(&content).map_err(|err| err.to_string())
                    }) {
                    Ok(cfg) => cfg,
                    Err(err) => {
                        warn!("ignoring invalid {DEFAULT_CONFIG_FILE}: {err}");
                        Config::default()
                    }
                }
            } else {
                Config::default()
            }
        }
    };
    cfg.prepare();
    cfg
}

/// Runs one analysis in its own task and drains the progress channel into
/// the log. `slot` scales per-run progress into an overall fraction when
/// several URLs are processed in sequence.
async fn run_analysis(
    analyzer: &Arc<PlaylistAnalyzer>,
    sample_size: usize,
    url: &str,
    slot: Option<(usize, usize)>,
) -> Result<(PlaylistAnalysis, Vec<ChannelEntry>), M3uAnalyzerError> {
    let (progress, mut events) = ProgressSender::channel();
    let task = {
        let analyzer = Arc::clone(analyzer);
        let url = url.to_string();
        tokio::spawn(async move { analyzer.analyze(&url, sample_size, &progress).await })
    };
    while let Some(event) = events.recv().await {
        match slot {
            Some((index, total)) => {
                let overall = (index as f64 + event.fraction) / total as f64;
                info!(
                    "[{:3.0}%] {}/{}: {}",
                    overall * 100.0,
                    index + 1,
                    total,
                    event.message
                );
            }
            None => info!("[{:3.0}%] {}", event.fraction * 100.0, event.message),
        }
    }
    match task.await {
        Ok(result) => result,
        Err(err) => create_m3u_analyzer_error_result!(
            M3uAnalyzerErrorKind::Info,
            "analysis task failed: {err}"
        ),
    }
}

fn print_summary(analysis: &PlaylistAnalysis) {
    println!("source:   {}", analysis.source_url);
    println!("channels: {}", analysis.channel_count);
    println!("parsed:   {}", if analysis.parsed_ok { "ok" } else { "no entries" });
    println!(
        "live:     {}",
        if analysis.fetched_ok { "ok" } else { "no sample stream responded" }
    );
    match &analysis.expiry {
        Some(expiry) => println!("expiry:   {}", expiry.format("%d.%m.%Y %H:%M")),
        None => println!("expiry:   unknown"),
    }
    println!("groups:   {}", analysis.groups.len());
    for group in &analysis.groups {
        println!("  {group}");
    }
}

async fn run_manual(
    cfg: &Config,
    url: &str,
    groups: Vec<String>,
    label: &str,
    ext: &str,
    write: bool,
) -> Result<(), M3uAnalyzerError> {
    if !url.to_lowercase().starts_with("http") {
        return create_m3u_analyzer_error_result!(
            M3uAnalyzerErrorKind::Info,
            "not a playlist url: {url}"
        );
    }
    let analyzer = Arc::new(PlaylistAnalyzer::new(cfg)?);
    let (analysis, entries) = run_analysis(&analyzer, cfg.sample_size, url, None).await?;
    print_summary(&analysis);

    if !write {
        return Ok(());
    }
    let mut selection = GroupSelection::default();
    if groups.is_empty() {
        selection.set_all(analysis.groups.iter().cloned());
    } else {
        selection.set_all(groups);
    }
    let filtered = filter_by_groups(&entries, &selection.selected_groups);
    if filtered.is_empty() {
        return create_m3u_analyzer_error_result!(
            M3uAnalyzerErrorKind::Info,
            "no channels in the selected groups"
        );
    }
    let content = build_m3u_plus(&filtered);
    let saved = storage::save_playlist(cfg, &content, label, ext, analysis.expiry)?;
    info!(
        "saved {} channels to {:?} (v{})",
        filtered.len(),
        saved.file_path,
        saved.version
    );
    Ok(())
}

async fn run_auto(
    cfg: &Config,
    file: &Path,
    codes: Vec<String>,
    no_combine: bool,
    label: &str,
    ext: &str,
) -> Result<(), M3uAnalyzerError> {
    let text = match fs::read_to_string(file) {
        Ok(text) => text,
        Err(err) => {
            return create_m3u_analyzer_error_result!(
                M3uAnalyzerErrorKind::Info,
                "cant read input file {file:?}: {err}"
            )
        }
    };
    let urls = extract_urls(&text);
    if urls.is_empty() {
        return create_m3u_analyzer_error_result!(
            M3uAnalyzerErrorKind::Info,
            "no playlist links found in {file:?}"
        );
    }
    info!("found {} playlist links", urls.len());

    let analyzer = Arc::new(PlaylistAnalyzer::new(cfg)?);
    let total = urls.len();
    let mut working: Vec<(String, Vec<ChannelEntry>, Option<DateTime<Local>>)> = Vec::new();
    for (index, url) in urls.iter().enumerate() {
        match run_analysis(&analyzer, cfg.sample_size, url, Some((index, total))).await {
            Ok((analysis, entries)) => {
                if analysis.fetched_ok && analysis.parsed_ok && !entries.is_empty() {
                    working.push((url.clone(), entries, analysis.expiry));
                } else {
                    info!("skipping {}, no working streams", sanitize_sensitive_info(url));
                }
            }
            Err(err) => warn!("skipping {}: {err}", sanitize_sensitive_info(url)),
        }
    }
    if working.is_empty() {
        return create_m3u_analyzer_error_result!(
            M3uAnalyzerErrorKind::Info,
            "none of the {total} links yielded a working playlist"
        );
    }
    info!("{} of {} links look usable", working.len(), total);

    let selected_codes: HashSet<String> = if codes.is_empty() {
        let discovered: HashSet<String> = working
            .iter()
            .flat_map(|(_, entries, _)| entries.iter())
            .filter_map(|entry| entry.group.as_deref().and_then(guess_country_code))
            .collect();
        let mut listed: Vec<&str> = discovered.iter().map(String::as_str).collect();
        listed.sort_unstable();
        info!("no country codes given, keeping all: {}", listed.join(", "));
        discovered
    } else {
        codes.into_iter().collect()
    };

    if !no_combine {
        let mut merged: Vec<ChannelEntry> = Vec::new();
        let mut expiries: Vec<DateTime<Local>> = Vec::new();
        for (_, entries, expiry) in &working {
            merged.extend(filter_by_country_codes(entries, &selected_codes));
            if let Some(expiry) = expiry {
                expiries.push(*expiry);
            }
        }
        if merged.is_empty() {
            return create_m3u_analyzer_error_result!(
                M3uAnalyzerErrorKind::Info,
                "no channels matched the selected country codes"
            );
        }
        let expiry_min = expiries.into_iter().min();
        let content = build_m3u_plus(&merged);
        let saved =
            storage::save_playlist(cfg, &content, &format!("{label}_auto"), ext, expiry_min)?;
        info!(
            "saved {} channels to {:?} (v{})",
            merged.len(),
            saved.file_path,
            saved.version
        );
        return Ok(());
    }

    for (index, (url, entries, expiry)) in working.iter().enumerate() {
        let filtered = filter_by_country_codes(entries, &selected_codes);
        if filtered.is_empty() {
            continue;
        }
        let content = build_m3u_plus(&filtered);
        let saved = storage::save_playlist(
            cfg,
            &content,
            &format!("{}_{}", label, index + 1),
            ext,
            *expiry,
        )?;
        info!(
            "saved {} channels from {} to {:?} (v{})",
            filtered.len(),
            sanitize_sensitive_info(url),
            saved.file_path,
            saved.version
        );
    }
    Ok(())
}
