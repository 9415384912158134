use crate::media::MediaError;
use url::Url;

/// Parses a user-supplied source URL, accepting only absolute `http`/`https`
/// URLs with a non-empty host.
pub fn validate_url(raw: &str) -> Result<Url, MediaError> {
    let url = Url::parse(raw.trim()).map_err(|_| MediaError::InvalidUrl)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(MediaError::InvalidUrl);
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(MediaError::InvalidUrl),
    }
}

/// Removes every forward and backward slash from a path component.
pub fn strip_separators(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, '/' | '\\')).collect()
}
