// YouTube Data API v3 response model types used by search parsing.
use serde::Deserialize;

use crate::api::models::Track;

#[derive(Debug, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub id: SearchItemId,
    pub snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItemId {
    #[serde(default, rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Snippet {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "channelTitle")]
    pub channel_title: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize, Default)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

impl Thumbnails {
    fn best_url(&self) -> Option<&str> {
        [&self.default, &self.medium, &self.high]
            .into_iter()
            .flatten()
            .map(|thumb| thumb.url.as_str())
            .find(|url| !url.trim().is_empty())
    }
}

impl SearchItem {
    /// Channel and playlist hits carry no `videoId`; only videos are playable.
    pub fn into_track(self) -> Option<Track> {
        let video_id = self.id.video_id.filter(|id| !id.trim().is_empty())?;
        let snippet = self.snippet?;
        let thumbnail = snippet.thumbnails.best_url().unwrap_or_default().to_string();
        Some(Track::new(
            video_id,
            decode_html_entities(&snippet.title),
            decode_html_entities(&snippet.channel_title),
            thumbnail,
        ))
    }
}

/// Search snippets come back HTML-escaped (`Rock &amp; Roll`, `Don&#39;t`).
pub fn decode_html_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
