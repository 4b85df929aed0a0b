//! Video metadata resolution for the append tool
//!
//! Two interchangeable strategies behind [`VideoMetadataResolver`]:
//! the YouTube Data API (needs a key) and a best-effort watch page scrape.
//! [`FallbackResolver`] chains them, filling gaps from later strategies.

use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::services::config::Config;
use crate::types::{HourtrackError, Result};

/// YouTube Data API v3 videos endpoint
const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3/videos";

/// Text proxy that serves YouTube watch pages without a browser
const TEXT_PROXY_URL: &str = "https://r.jina.ai/http://www.youtube.com/watch";

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// What the append tool needs to know about a video
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VideoMetadata {
    /// `YYYY-MM-DD`
    pub upload_date: Option<String>,
    pub duration_seconds: Option<u64>,
}

impl VideoMetadata {
    pub fn is_complete(&self) -> bool {
        self.upload_date.is_some() && self.duration_seconds.is_some()
    }

    /// Keep fields already known, take the rest from `other`
    pub fn or(self, other: VideoMetadata) -> VideoMetadata {
        VideoMetadata {
            upload_date: self.upload_date.or(other.upload_date),
            duration_seconds: self.duration_seconds.or(other.duration_seconds),
        }
    }
}

/// Capability: look up a video's upload date and duration
pub trait VideoMetadataResolver {
    /// Strategy name for logs
    fn name(&self) -> &str;

    fn resolve(&self, video_id: &str) -> Result<VideoMetadata>;
}

/// Authoritative lookup through the YouTube Data API
pub struct YouTubeApiResolver {
    api_key: String,
}

impl YouTubeApiResolver {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    items: Vec<ApiItem>,
}

#[derive(Deserialize)]
struct ApiItem {
    snippet: Option<ApiSnippet>,
    #[serde(rename = "contentDetails")]
    content_details: Option<ApiContentDetails>,
}

#[derive(Deserialize)]
struct ApiSnippet {
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Deserialize)]
struct ApiContentDetails {
    duration: Option<String>,
}

/// Extract metadata from a Data API `videos` response body
pub fn parse_api_response(body: &str) -> Result<VideoMetadata> {
    let response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| HourtrackError::Parse(format!("Invalid API response: {}", e)))?;

    let Some(item) = response.items.into_iter().next() else {
        return Ok(VideoMetadata::default());
    };

    Ok(VideoMetadata {
        upload_date: item
            .snippet
            .and_then(|s| s.published_at)
            .map(|p| date_portion(&p)),
        duration_seconds: item
            .content_details
            .and_then(|c| c.duration)
            .and_then(|d| parse_iso_duration(&d)),
    })
}

impl VideoMetadataResolver for YouTubeApiResolver {
    fn name(&self) -> &str {
        "youtube-api"
    }

    fn resolve(&self, video_id: &str) -> Result<VideoMetadata> {
        let client = http_client()?;
        let response = client
            .get(YOUTUBE_API_URL)
            .query(&[
                ("part", "snippet,contentDetails"),
                ("id", video_id),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .map_err(|e| HourtrackError::Metadata(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(HourtrackError::Metadata(format!(
                "YouTube Data API responded with {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .map_err(|e| HourtrackError::Metadata(format!("Failed to read response: {}", e)))?;
        parse_api_response(&body)
    }
}

/// Best-effort lookup by scraping the watch page through a text proxy
pub struct PageScrapeResolver;

impl VideoMetadataResolver for PageScrapeResolver {
    fn name(&self) -> &str {
        "page-scrape"
    }

    fn resolve(&self, video_id: &str) -> Result<VideoMetadata> {
        let client = http_client()?;
        let response = client
            .get(TEXT_PROXY_URL)
            .query(&[("v", video_id)])
            .send()
            .map_err(|e| HourtrackError::Metadata(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(HourtrackError::Metadata(format!(
                "Failed to fetch video page: {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .map_err(|e| HourtrackError::Metadata(format!("Failed to read page: {}", e)))?;
        Ok(parse_watch_page(&text))
    }
}

/// Extract metadata from a watch page: JSON-LD `VideoObject` first,
/// then a bare `"duration":"PT..."` pattern.
pub fn parse_watch_page(text: &str) -> VideoMetadata {
    let jsonld = Regex::new(r#"(?s)<script type="application/ld\+json">(.*?)</script>"#)
        .expect("valid regex");

    let mut metadata = jsonld
        .captures_iter(text)
        .filter_map(|cap| serde_json::from_str::<serde_json::Value>(&cap[1]).ok())
        .find_map(|value| video_object(&value))
        .unwrap_or_default();

    if metadata.duration_seconds.is_none() {
        let duration = Regex::new(r#""duration"\s*:\s*"(PT[^"]+)""#).expect("valid regex");
        metadata.duration_seconds = duration
            .captures(text)
            .and_then(|cap| parse_iso_duration(&cap[1]));
    }

    metadata
}

/// Metadata from a JSON-LD value that is, or contains, a `VideoObject`
fn video_object(value: &serde_json::Value) -> Option<VideoMetadata> {
    if let Some(items) = value.as_array() {
        return items.iter().find_map(video_object);
    }
    if value.get("@type").and_then(|t| t.as_str()) != Some("VideoObject") {
        return None;
    }

    Some(VideoMetadata {
        upload_date: value
            .get("uploadDate")
            .and_then(|v| v.as_str())
            .map(date_portion),
        duration_seconds: value
            .get("duration")
            .and_then(|v| v.as_str())
            .and_then(parse_iso_duration),
    })
}

/// Tries each strategy in order until every field is known.
/// A failing strategy is logged and skipped.
pub struct FallbackResolver {
    strategies: Vec<Box<dyn VideoMetadataResolver>>,
}

impl FallbackResolver {
    pub fn new(strategies: Vec<Box<dyn VideoMetadataResolver>>) -> Self {
        Self { strategies }
    }

    /// API first when a key is configured, page scrape always last
    pub fn from_config(config: &Config) -> Self {
        let mut strategies: Vec<Box<dyn VideoMetadataResolver>> = Vec::new();
        if let Some(key) = &config.youtube_api_key {
            strategies.push(Box::new(YouTubeApiResolver::new(key.clone())));
        }
        strategies.push(Box::new(PageScrapeResolver));
        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl VideoMetadataResolver for FallbackResolver {
    fn name(&self) -> &str {
        "fallback"
    }

    fn resolve(&self, video_id: &str) -> Result<VideoMetadata> {
        let mut metadata = VideoMetadata::default();

        for strategy in &self.strategies {
            if metadata.is_complete() {
                break;
            }
            match strategy.resolve(video_id) {
                Ok(found) => {
                    debug!(strategy = strategy.name(), ?found, "metadata resolved");
                    metadata = metadata.or(found);
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "metadata lookup failed");
                }
            }
        }

        Ok(metadata)
    }
}

/// Extract the 11-character video id from a watch, short or live URL
pub fn extract_video_id(url: &str) -> Result<String> {
    let patterns = [
        r"[?&]v=([A-Za-z0-9_-]{11})",
        r"youtu\.be/([A-Za-z0-9_-]{11})",
        r"youtube\.com/live/([A-Za-z0-9_-]{11})",
    ];

    patterns
        .iter()
        .find_map(|pattern| {
            let re = Regex::new(pattern).expect("valid regex");
            re.captures(url).map(|cap| cap[1].to_string())
        })
        .ok_or_else(|| HourtrackError::Parse(format!("Could not parse video id from '{}'", url)))
}

/// Seconds in an ISO-8601 duration (`PT1H2M3S`, `P1DT2H`).
///
/// Unrecognized text counts as 0 seconds; a value too large for `u64` gives `None`.
pub fn parse_iso_duration(iso: &str) -> Option<u64> {
    let re = Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .expect("valid regex");

    let Some(cap) = re.captures(iso.trim()) else {
        return Some(0);
    };

    let units = [(1, 86_400u64), (2, 3600), (3, 60), (4, 1)];
    let seconds = units.iter().try_fold(0u64, |total, &(i, scale)| {
        let value: u64 = match cap.get(i) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        value.checked_mul(scale)?.checked_add(total)
    });

    if seconds.is_none() {
        warn!(duration = iso, "video duration out of range, ignoring it");
    }
    seconds
}

/// `2025-10-23T02:00:54Z` -> `2025-10-23`
fn date_portion(timestamp: &str) -> String {
    timestamp
        .split('T')
        .next()
        .unwrap_or(timestamp)
        .to_string()
}

fn http_client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| HourtrackError::Metadata(format!("HTTP client error: {}", e)))
}
