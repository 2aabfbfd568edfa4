// hoist-net/src/validation.rs
use hoist_common::error::{HoistError, Result};
use url::Url;

/// Only absolute `http`/`https` URLs with a host are fetched.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url)
        .map_err(|e| HoistError::ValidationError(format!("Failed to parse URL '{url}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(HoistError::ValidationError(format!(
            "Unsupported URL scheme '{}' in {}",
            parsed.scheme(),
            url
        )));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(HoistError::ValidationError(format!("URL has no host: {url}")));
    }
    Ok(())
}
