use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use log::debug;
use regex::Regex;
use reqwest::header::{CONTENT_ENCODING, RANGE};
use url::Url;

use crate::create_m3u_analyzer_error_result;
use crate::m3u_analyzer_error::{str_to_io_error, M3uAnalyzerError, M3uAnalyzerErrorKind};
use crate::model::ProbeResult;
use crate::utils::debug_if_enabled;
use crate::utils::file_utils::persist_file;
use crate::utils::{
    decompress_deflate, decompress_gzip, is_deflate, is_gzip, ENCODING_DEFLATE, ENCODING_GZIP,
};

// HEAD probes count redirect answers as alive, ranged GETs do not.
pub(crate) const HEAD_SUCCESS_CODES: &[u16] = &[200, 206, 301, 302];
pub(crate) const RANGE_SUCCESS_CODES: &[u16] = &[200, 206];
const PROBE_RANGE: &str = "bytes=0-2047";

pub fn create_client(user_agent: &str) -> Result<Arc<reqwest::Client>, M3uAnalyzerError> {
    match reqwest::Client::builder().user_agent(user_agent).build() {
        Ok(client) => Ok(Arc::new(client)),
        Err(err) => create_m3u_analyzer_error_result!(
            M3uAnalyzerErrorKind::Info,
            "Failed to create http client: {err}"
        ),
    }
}

/// Downloads the playlist document. A malformed URL, transport failure or
/// non-2xx response is fatal for the analysis run.
pub async fn download_text_content(
    client: &Arc<reqwest::Client>,
    url_str: &str,
    timeout: Duration,
    persist_filepath: Option<PathBuf>,
) -> Result<String, M3uAnalyzerError> {
    debug_if_enabled!("getting playlist document {}", sanitize_sensitive_info(url_str));
    let Ok(url) = url_str.parse::<Url>() else {
        return create_m3u_analyzer_error_result!(
            M3uAnalyzerErrorKind::Fetch,
            "Malformed URL {}",
            sanitize_sensitive_info(url_str)
        );
    };
    match get_remote_content(client, &url, timeout).await {
        Ok(content) => {
            persist_file(persist_filepath, &content);
            Ok(content)
        }
        Err(err) => create_m3u_analyzer_error_result!(
            M3uAnalyzerErrorKind::Fetch,
            "cant download input url: {}  => {err}",
            sanitize_sensitive_info(url_str)
        ),
    }
}

async fn get_remote_content(
    client: &Arc<reqwest::Client>,
    url: &Url,
    timeout: Duration,
) -> Result<String, std::io::Error> {
    let request = client.get(url.clone()).timeout(timeout);
    match request.send().await {
        Ok(response) => {
            if !response.status().is_success() {
                return Err(str_to_io_error(&format!(
                    "Request failed with status {} {}",
                    response.status(),
                    sanitize_sensitive_info(url.as_str())
                )));
            }
            let header_value = response.headers().get(CONTENT_ENCODING);
            let mut encoding =
                header_value.and_then(|value| value.to_str().ok().map(ToString::to_string));
            match response.bytes().await {
                Ok(bytes) => {
                    if bytes.len() >= 2 {
                        if is_gzip(&bytes[0..2]) {
                            encoding = Some(ENCODING_GZIP.to_string());
                        } else if is_deflate(&bytes[0..2]) {
                            encoding = Some(ENCODING_DEFLATE.to_string());
                        }
                    }
                    match encoding.as_deref() {
                        Some(ENCODING_GZIP) => decompress_gzip(&bytes).map_err(|err| {
                            str_to_io_error(&format!("failed to decode gzip content {err}"))
                        }),
                        Some(ENCODING_DEFLATE) => decompress_deflate(&bytes).map_err(|err| {
                            str_to_io_error(&format!("failed to decode zlib content {err}"))
                        }),
                        _ => match String::from_utf8(bytes.to_vec()) {
                            Ok(text) => Ok(text),
                            Err(_) => {
                                debug!(
                                    "response was not valid utf-8, using lossy decode {}",
                                    sanitize_sensitive_info(url.as_str())
                                );
                                Ok(String::from_utf8_lossy(&bytes).to_string())
                            }
                        },
                    }
                }
                Err(err) => Err(str_to_io_error(&format!(
                    "failed to read response {} {err}",
                    sanitize_sensitive_info(url.as_str())
                ))),
            }
        }
        Err(err) => Err(str_to_io_error(&format!(
            "Request failed {} {err}",
            sanitize_sensitive_info(url.as_str())
        ))),
    }
}

/// Lightweight reachability check. HEAD first, then a ranged GET for
/// servers that reject HEAD but serve partial content.
pub async fn probe_stream(
    client: &Arc<reqwest::Client>,
    url: &str,
    timeout: Duration,
) -> ProbeResult {
    if let Ok(response) = client.head(url).timeout(timeout).send().await {
        let status = response.status().as_u16();
        if HEAD_SUCCESS_CODES.contains(&status) {
            return ProbeResult { ok: true, status_code: Some(status) };
        }
    }
    match client
        .get(url)
        .header(RANGE, PROBE_RANGE)
        .timeout(timeout)
        .send()
        .await
    {
        Ok(response) => {
            let status = response.status().as_u16();
            ProbeResult {
                ok: RANGE_SUCCESS_CODES.contains(&status),
                status_code: Some(status),
            }
        }
        Err(_) => ProbeResult { ok: false, status_code: None },
    }
}

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(username=)[^&]*").unwrap());
static PASSWORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(password=)[^&]*").unwrap());
static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(token=)[^&]*").unwrap());

pub fn sanitize_sensitive_info(query: &str) -> String {
    let masked_query = USERNAME_REGEX.replace_all(query, "$1***");
    let masked_query = PASSWORD_REGEX.replace_all(&masked_query, "$1***");
    let masked_query = TOKEN_REGEX.replace_all(&masked_query, "$1***");
    masked_query.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_mask() {
        let query = "http://x.test/get.php?username=foo&password=bar&token=baz&type=m3u_plus";
        let masked = sanitize_sensitive_info(query);
        assert_eq!(
            masked,
            "http://x.test/get.php?username=***&password=***&token=***&type=m3u_plus"
        );
    }

    #[test]
    fn test_probe_success_code_sets() {
        for status in [200u16, 206, 301, 302] {
            assert!(HEAD_SUCCESS_CODES.contains(&status));
        }
        assert!(!HEAD_SUCCESS_CODES.contains(&404));
        assert!(RANGE_SUCCESS_CODES.contains(&206));
        assert!(!RANGE_SUCCESS_CODES.contains(&302));
    }
}
