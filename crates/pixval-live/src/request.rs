//! # Pixel Requests
//!
//! A pixel fired by a client is an HTTP request for `/t/<name>`, where the
//! name uses `_` in place of `.`, with its parameters in the query string.
//! Clients append a bare number (`?12345&...`) to defeat caches; those
//! fragments carry no data and are dropped.

use url::Url;

use crate::error::RequestError;

const PIXEL_PATH: &str = "/t/";
const RELATIVE_BASE: &str = "http://localhost/";

/// Pixel name and raw query fragments of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelRequest {
    /// Pixel name in dot notation.
    pub pixel: String,
    /// `key=value` fragments in request order, cache busters removed.
    pub fragments: Vec<String>,
}

impl PixelRequest {
    /// Parse an absolute URL or a bare path such as `/t/m_app_crash?a=1`.
    pub fn from_url(raw: &str) -> Result<Self, RequestError> {
        let malformed = |e: url::ParseError| RequestError::Malformed {
            url: raw.to_string(),
            reason: e.to_string(),
        };
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE)
                .and_then(|base| base.join(raw))
                .map_err(malformed)?,
            Err(e) => return Err(malformed(e)),
        };

        let name = url
            .path()
            .strip_prefix(PIXEL_PATH)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| RequestError::NotPixelPath {
                path: url.path().to_string(),
            })?;

        let fragments = url
            .query()
            .unwrap_or_default()
            .split('&')
            .filter(|f| !f.is_empty() && !is_cache_buster(f))
            .map(str::to_string)
            .collect();

        Ok(Self {
            pixel: name.replace('_', "."),
            fragments,
        })
    }
}

fn is_cache_buster(fragment: &str) -> bool {
    fragment.bytes().all(|b| b.is_ascii_digit())
}
