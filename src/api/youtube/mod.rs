use crate::api::models::Track;
use crate::db::AppSettings;
use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::{debug, warn};

mod response_models;

use response_models::{ApiErrorResponse, SearchListResponse};

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_MAX_RESULTS: u32 = 10;
const MAX_RESULTS_LIMIT: u32 = 50;
const REDACTED_KEY: &str = "API_KEY";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No YouTube API key configured. Add one in the sidebar to search.")]
    MissingApiKey,
    #[error("Search request failed: {0}")]
    Request(String),
    #[error("Failed to fetch videos: {status}. {body}")]
    Status { status: u16, body: String },
    #[error("Could not read search results: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_results: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl ApiConfig {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            api_key: settings.resolved_api_key(),
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            max_results: settings.max_results.clamp(1, MAX_RESULTS_LIMIT),
        }
    }
}

pub struct YoutubeClient {
    pub config: ApiConfig,
}

impl YoutubeClient {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    fn search_url(&self, query: &str, api_key: &str) -> String {
        format!(
            "{}/search?part=snippet&q={}&type=video&maxResults={}&key={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(query),
            self.config.max_results.clamp(1, MAX_RESULTS_LIMIT),
            urlencoding::encode(api_key),
        )
    }

    /// Search videos matching `query`. Results keep the API's relevance order.
    pub async fn search(&self, query: &str) -> Result<Vec<Track>, SearchError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(SearchError::MissingApiKey)?;

        let url = self.search_url(query, api_key);
        debug!(
            url = %url.replace(&*urlencoding::encode(api_key), REDACTED_KEY),
            "search request"
        );

        let response = HTTP_CLIENT
            .get(&url)
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "search API returned an error");
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: api_error_message(&body),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        parse_search_response(&body)
    }
}

pub(crate) fn parse_search_response(body: &str) -> Result<Vec<Track>, SearchError> {
    let parsed: SearchListResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Decode(e.to_string()))?;
    Ok(parsed
        .items
        .into_iter()
        .filter_map(|item| item.into_track())
        .collect())
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .map(|parsed| parsed.error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}
