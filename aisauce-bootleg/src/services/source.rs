//! Source detection for download URLs

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source detection errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Could not detect source from url: {0}")]
    Unrecognized(String),

    #[error("Could not resolve short url {0}: {1}")]
    ResolveFailed(String, String),
}

/// Streaming platform a track is downloaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    SoundCloud,
    YouTube,
}

impl Source {
    /// Normalized source name
    pub fn name(&self) -> &'static str {
        match self {
            Source::SoundCloud => "soundcloud",
            Source::YouTube => "youtube",
        }
    }

    /// Prefix used in single-track download titles
    pub fn short_tag(&self) -> &'static str {
        match self {
            Source::SoundCloud => "[sc]",
            Source::YouTube => "[yt]",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// URL markers in match order. First hit wins, so a URL carrying several
/// markers is classified by whichever appears earliest in this table.
const SOURCE_MARKERS: [(&str, Source); 3] = [
    ("soundcloud", Source::SoundCloud),
    ("youtube", Source::YouTube),
    ("youtu.be", Source::YouTube),
];

/// Marker of SoundCloud share links that the extractor cannot handle
const SOUNDCLOUD_SHORT_LINK: &str = "on.soundcloud.com/";

/// Classify a URL by substring match against the marker table
pub fn source_for_url(url: &str) -> Result<Source, SourceError> {
    SOURCE_MARKERS
        .iter()
        .find(|(marker, _)| url.contains(marker))
        .map(|(_, source)| *source)
        .ok_or_else(|| SourceError::Unrecognized(url.to_string()))
}

pub fn is_short_link(url: &str) -> bool {
    url.contains(SOUNDCLOUD_SHORT_LINK)
}

/// Follow redirects of a share link and return the final URL.
///
/// Other URLs are returned unchanged without touching the network.
pub async fn resolve_short_url(client: &reqwest::Client, url: &str) -> Result<String, SourceError> {
    if !is_short_link(url) {
        return Ok(url.to_string());
    }

    tracing::info!(url = %url, "Resolving short url");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::ResolveFailed(url.to_string(), e.to_string()))?;

    let resolved = response.url().to_string();
    tracing::debug!(url = %url, resolved = %resolved, "Short url resolved");
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_marker_urls() {
        let cases = [
            ("https://soundcloud.com/izuk/shape-of-you-bootleg", Source::SoundCloud),
            ("https://www.youtube.com/watch?v=abc", Source::YouTube),
            ("https://youtu.be/abc", Source::YouTube),
            ("https://music.youtube.com/watch?v=abc", Source::YouTube),
        ];
        for (url, expected) in cases {
            assert_eq!(source_for_url(url).unwrap(), expected, "{url}");
        }
    }

    #[test]
    fn test_unknown_url_is_unrecognized() {
        let result = source_for_url("https://bandcamp.com/track/x");
        assert!(matches!(result, Err(SourceError::Unrecognized(u)) if u.contains("bandcamp")));
    }

    #[test]
    fn test_table_order_resolves_ambiguous_urls() {
        // Both markers present: soundcloud comes first in the table
        let url = "https://www.youtube.com/redirect?q=https://soundcloud.com/a/b";
        assert_eq!(source_for_url(url).unwrap(), Source::SoundCloud);
    }

    #[test]
    fn test_names_and_tags() {
        assert_eq!(Source::SoundCloud.name(), "soundcloud");
        assert_eq!(Source::YouTube.name(), "youtube");
        assert_eq!(Source::SoundCloud.short_tag(), "[sc]");
        assert_eq!(Source::YouTube.short_tag(), "[yt]");
    }

    #[test]
    fn test_short_link_detection() {
        assert!(is_short_link("https://on.soundcloud.com/AbCd"));
        assert!(!is_short_link("https://soundcloud.com/a/b"));
    }

    #[tokio::test]
    async fn test_resolve_passes_through_regular_urls() {
        let client = reqwest::Client::new();
        let url = "https://soundcloud.com/a/b";
        assert_eq!(resolve_short_url(&client, url).await.unwrap(), url);
    }
}
