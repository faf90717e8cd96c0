//! YouTube Data API v3 client
//!
//! Implements [`PrimaryCatalog`] over `playlistItems`, `videos` and `search`.
//! Authentication is a pre-issued OAuth bearer token with the
//! `youtube.force-ssl` scope; token refresh is out of scope.

use super::{
    CatalogError, ContentMetadata, PlaylistItem, PlaylistPage, PrimaryCatalog, RateLimiter,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const USER_AGENT: &str = concat!("plfix/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemListResponse {
    #[serde(default)]
    items: Vec<PlaylistItemResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemResource {
    id: String,
    snippet: Option<PlaylistItemSnippet>,
    content_details: Option<PlaylistItemContentDetails>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemSnippet {
    title: Option<String>,
    position: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: String,
    snippet: Option<VideoSnippet>,
    content_details: Option<VideoContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
}

#[derive(Debug, Deserialize)]
struct VideoContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: SearchResultId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// YouTube Data API client
pub struct YouTubeClient {
    http_client: reqwest::Client,
    rate_limiter: RateLimiter,
    base_url: String,
    access_token: String,
}

impl YouTubeClient {
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        request_interval_ms: u64,
    ) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: RateLimiter::new(request_interval_ms),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, CatalogError> {
        self.rate_limiter.wait().await;

        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = describe_error_body(&body);
        match status.as_u16() {
            401 | 403 => Err(CatalogError::AuthError(message)),
            404 => Err(CatalogError::NotFound(message)),
            code => Err(CatalogError::ApiError(code, message)),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = self.url(resource);
        tracing::debug!(url = %url, "Querying catalog API");

        let response = self.send(self.http_client.get(&url).query(query)).await?;
        response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl PrimaryCatalog for YouTubeClient {
    async fn list_playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<PlaylistPage, CatalogError> {
        let mut query = vec![
            ("part", "snippet,contentDetails,status".to_string()),
            ("playlistId", playlist_id.to_string()),
            ("maxResults", page_size.to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let response: PlaylistItemListResponse = self.get_json("playlistItems", &query).await?;

        let items = response
            .items
            .into_iter()
            .map(|item| {
                let (title, position) = match item.snippet {
                    Some(s) => (s.title, s.position),
                    None => (None, None),
                };
                PlaylistItem {
                    entry_id: item.id,
                    title,
                    content_id: item
                        .content_details
                        .and_then(|d| d.video_id)
                        .filter(|id| !id.is_empty()),
                    position,
                }
            })
            .collect();

        Ok(PlaylistPage {
            items,
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn check_content_exists(
        &self,
        content_ids: &[String],
    ) -> Result<Vec<String>, CatalogError> {
        if content_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = [
            ("part", "id".to_string()),
            ("id", content_ids.join(",")),
            ("maxResults", content_ids.len().to_string()),
        ];
        let response: VideoListResponse = self.get_json("videos", &query).await?;
        Ok(response.items.into_iter().map(|v| v.id).collect())
    }

    async fn search_content(&self, query: &str, limit: u32) -> Result<Vec<String>, CatalogError> {
        let params = [
            ("part", "snippet".to_string()),
            ("q", query.to_string()),
            ("type", "video".to_string()),
            ("maxResults", limit.to_string()),
        ];
        let response: SearchListResponse = self.get_json("search", &params).await?;

        let ids: Vec<String> = response
            .items
            .into_iter()
            .filter_map(|r| r.id.video_id)
            .collect();

        tracing::debug!(query = %query, results = ids.len(), "search.list returned");
        Ok(ids)
    }

    async fn fetch_content_metadata(
        &self,
        content_ids: &[String],
    ) -> Result<Vec<ContentMetadata>, CatalogError> {
        if content_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = [
            ("part", "snippet,contentDetails".to_string()),
            ("id", content_ids.join(",")),
            ("maxResults", content_ids.len().to_string()),
        ];
        let response: VideoListResponse = self.get_json("videos", &query).await?;

        Ok(response
            .items
            .into_iter()
            .map(|v| {
                let (title, channel_title) = match v.snippet {
                    Some(s) => (s.title, s.channel_title),
                    None => (String::new(), String::new()),
                };
                ContentMetadata {
                    content_id: v.id,
                    title,
                    channel_title,
                    length_seconds: v
                        .content_details
                        .and_then(|d| d.duration)
                        .and_then(|d| parse_iso8601_duration(&d)),
                }
            })
            .collect())
    }

    async fn insert_entry(
        &self,
        playlist_id: &str,
        content_id: &str,
        position: Option<u32>,
    ) -> Result<String, CatalogError> {
        let mut snippet = json!({
            "playlistId": playlist_id,
            "resourceId": { "kind": "youtube#video", "videoId": content_id },
        });
        if let Some(position) = position {
            snippet["position"] = json!(position);
        }
        let body = json!({ "snippet": snippet });

        let url = self.url("playlistItems");
        let response = self
            .send(
                self.http_client
                    .post(&url)
                    .query(&[("part", "snippet")])
                    .json(&body),
            )
            .await?;

        let inserted: InsertResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        tracing::info!(
            playlist_id = %playlist_id,
            content_id = %content_id,
            position = ?position,
            entry_id = %inserted.id,
            "Inserted playlist entry"
        );
        Ok(inserted.id)
    }

    async fn delete_entry(&self, entry_id: &str) -> Result<(), CatalogError> {
        let url = self.url("playlistItems");
        self.send(self.http_client.delete(&url).query(&[("id", entry_id)]))
            .await?;

        tracing::info!(entry_id = %entry_id, "Deleted playlist entry");
        Ok(())
    }
}

/// Render an API error body as "reason: message", falling back to the raw body
fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let reason = envelope
                .error
                .errors
                .iter()
                .find_map(|e| e.reason.clone());
            match reason {
                Some(reason) => format!("{}: {}", reason, envelope.error.message),
                None => envelope.error.message,
            }
        }
        Err(_) => body.trim().to_string(),
    }
}

/// Parse an ISO-8601 duration such as `PT1H2M3S` or `P1DT5M` into seconds
pub fn parse_iso8601_duration(value: &str) -> Option<u64> {
    let rest = value.strip_prefix('P')?;
    let mut seconds: u64 = 0;
    let mut number = String::new();
    let mut in_time = false;
    let mut saw_component = false;

    for c in rest.chars() {
        match c {
            'T' => {
                if !number.is_empty() || in_time {
                    return None;
                }
                in_time = true;
            }
            '0'..='9' => number.push(c),
            unit => {
                let n: u64 = number.parse().ok()?;
                number.clear();
                let factor = match (unit, in_time) {
                    ('W', false) => 7 * 86_400,
                    ('D', false) => 86_400,
                    ('H', true) => 3_600,
                    ('M', true) => 60,
                    ('S', true) => 1,
                    _ => return None,
                };
                seconds = seconds.checked_add(n.checked_mul(factor)?)?;
                saw_component = true;
            }
        }
    }

    if !number.is_empty() || !saw_component {
        return None;
    }
    Some(seconds)
}
