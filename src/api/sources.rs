//! Embed provider client
//!
//! Fetches candidate streaming providers for a TMDB id from the embed API.
//! Each provider exposes quality variants and optional subtitle tracks.

use serde::Deserialize;
use thiserror::Error;

use crate::models::{MediaType, ProviderSource};

/// Sources API error types
#[derive(Error, Debug)]
pub enum SourcesError {
    #[error("API URL is not configured")]
    NotConfigured,

    #[error("Season and episode are required for TV sources")]
    MissingEpisode,

    #[error("No valid video sources available")]
    NoValidSources,

    #[error("Failed to fetch video sources: {0}")]
    Upstream(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// What to fetch sources for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    pub media_type: MediaType,
    pub tmdb_id: String,
    pub season: Option<u16>,
    pub episode: Option<u16>,
    pub provider: Option<String>,
}

impl SourceRequest {
    pub fn movie(tmdb_id: impl Into<String>) -> Self {
        Self {
            media_type: MediaType::Movie,
            tmdb_id: tmdb_id.into(),
            season: None,
            episode: None,
            provider: None,
        }
    }

    pub fn episode(tmdb_id: impl Into<String>, season: u16, episode: u16) -> Self {
        Self {
            media_type: MediaType::Tv,
            tmdb_id: tmdb_id.into(),
            season: Some(season),
            episode: Some(episode),
            provider: None,
        }
    }

    /// Restrict the lookup to a single provider
    pub fn with_provider(mut self, provider: Option<String>) -> Self {
        self.provider = provider.filter(|p| !p.is_empty());
        self
    }

    /// Relative API path, e.g. `movie/vidsrc/550` or `tv/1399?s=1&e=2`
    pub fn path(&self) -> Result<String, SourcesError> {
        let prefix = match &self.provider {
            Some(provider) => format!(
                "{}/{}/{}",
                self.media_type.as_path(),
                urlencoding::encode(provider),
                urlencoding::encode(&self.tmdb_id)
            ),
            None => format!(
                "{}/{}",
                self.media_type.as_path(),
                urlencoding::encode(&self.tmdb_id)
            ),
        };

        match self.media_type {
            MediaType::Movie => Ok(prefix),
            MediaType::Tv => match (self.season, self.episode) {
                (Some(s), Some(e)) => Ok(format!("{}?s={}&e={}", prefix, s, e)),
                _ => Err(SourcesError::MissingEpisode),
            },
        }
    }
}

/// One entry of the sources API response
#[derive(Debug, Deserialize)]
struct ProviderEntry {
    source: Option<serde_json::Value>,
    #[serde(rename = "ERROR")]
    error: Option<serde_json::Value>,
}

impl ProviderEntry {
    /// A truthy `ERROR` marks the entry as failed; null, false, 0 and ""
    /// do not
    fn failed(&self) -> bool {
        use serde_json::Value;
        match &self.error {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map_or(true, |v| v != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Embed provider client
#[derive(Clone)]
pub struct SourcesClient {
    base_url: Option<String>,
    client: reqwest::Client,
}

impl SourcesClient {
    /// Create a client; `None` leaves it unconfigured and every lookup fails
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::new(Some(base_url.into()))
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Fetch providers for a movie or episode, dropping failed entries
    pub async fn fetch(&self, request: &SourceRequest) -> Result<Vec<ProviderSource>, SourcesError> {
        let base_url = self.base_url.as_ref().ok_or(SourcesError::NotConfigured)?;
        let url = format!("{}/{}", base_url, request.path()?);

        tracing::debug!(%url, "Fetching video sources");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourcesError::Upstream(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SourcesError::Upstream(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(SourcesError::Upstream(message));
        }

        let entries: Vec<ProviderEntry> = serde_json::from_str(&text)
            .map_err(|e| SourcesError::InvalidResponse(format!("JSON parse error: {}", e)))?;

        let total = entries.len();
        let providers: Vec<ProviderSource> = entries
            .into_iter()
            .filter(|entry| !entry.failed())
            .filter_map(|entry| entry.source)
            .filter_map(|source| match serde_json::from_value::<ProviderSource>(source) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    tracing::warn!("Skipping malformed provider entry: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!(total, valid = providers.len(), "Video sources fetched");

        if providers.is_empty() {
            return Err(SourcesError::NoValidSources);
        }

        Ok(providers)
    }
}
