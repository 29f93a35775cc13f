// Vendor endpoint normalization

use url::Url;

use crate::error::{LlmError, Result};

/// Validate a configured base URL and return it without a trailing slash.
///
/// An endpoint without scheme is assumed to be `https://`. Empty, host-less
/// or non-HTTP endpoints are rejected. Query and fragment are dropped.
pub fn normalize_endpoint(model: &str, raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(LlmError::missing_key(model, "base_url"));
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| {
        LlmError::configuration(model, format!("invalid base_url {raw:?}: {e}"))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(LlmError::configuration(
            model,
            format!("base_url must use http or https, got {:?}", url.scheme()),
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(LlmError::configuration(
            model,
            format!("base_url {raw:?} has no host"),
        ));
    }

    url.set_query(None);
    url.set_fragment(None);
    let segments = path_segments(&url);
    set_segments(&mut url, &segments);

    Ok(url)
}

/// Remove the first versioned path segment (`v1`, `v3`, ...) and
/// everything after it, e.g. `https://host/v1/chat/completions` -> `https://host`.
pub fn strip_version_path(url: &Url) -> Url {
    let segments = path_segments(url);
    let keep = segments
        .iter()
        .position(|s| is_version_segment(s))
        .unwrap_or(segments.len());

    let mut stripped = url.clone();
    set_segments(&mut stripped, &segments[..keep]);
    stripped
}

/// Render a URL as a base for `format!("{base}/path")` joins
pub fn as_base(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}

fn is_version_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some('v' | 'V'))
        && segment.len() > 1
        && chars.all(|c| c.is_ascii_digit())
}

fn path_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn set_segments(url: &mut Url, segments: &[String]) {
    url.set_path(&segments.join("/"));
}
