//! Provider, quality and subtitle negotiation
//!
//! Holds the provider list fetched for one title and the viewer's current
//! choices, and resolves them into a `PlaybackPlan` whose URLs all point at
//! the same-origin proxy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ProviderSource, Quality, StreamKind, VideoFile};

/// Quality label used before the viewer picks one
pub const AUTO_QUALITY: &str = "auto";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("No video sources available")]
    NoProviders,

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider {0} has no playable files")]
    NoFiles(String),
}

/// Subtitle selection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", content = "lang", rename_all = "lowercase")]
pub enum SubtitleChoice {
    #[default]
    Off,
    Language(String),
}

impl SubtitleChoice {
    /// Parse "off" (any case) or a language label
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("off") {
            SubtitleChoice::Off
        } else {
            SubtitleChoice::Language(value.to_string())
        }
    }
}

/// Text track display mode, as understood by HTML media elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackMode {
    Showing,
    Hidden,
    Disabled,
}

/// Subtitle track as it should be attached to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackPlan {
    pub label: String,
    pub srclang: String,
    pub url: String,
    pub mode: TrackMode,
}

/// Everything a player needs to start the current selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackPlan {
    pub provider: String,
    pub quality: String,
    pub kind: StreamKind,
    pub source_url: String,
    pub playback_url: String,
    pub subtitles: Vec<TrackPlan>,
}

/// Builds same-origin URLs for media and subtitle files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoutes {
    pub video_path: String,
    pub subtitle_path: String,
}

impl Default for ProxyRoutes {
    fn default() -> Self {
        Self {
            video_path: "/api/video".to_string(),
            subtitle_path: "/api/subtitle".to_string(),
        }
    }
}

impl ProxyRoutes {
    pub fn video_url(&self, source: &str) -> String {
        format!("{}?url={}", self.video_path, urlencoding::encode(source))
    }

    pub fn subtitle_url(&self, source: &str) -> String {
        format!("{}?url={}", self.subtitle_path, urlencoding::encode(source))
    }
}

/// Viewer choices for one play request; unset fields keep the defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlayChoices {
    pub provider: Option<String>,
    pub quality: Option<String>,
    pub subtitle: Option<String>,
}

/// One entry of the provider menu shown next to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderOption {
    pub name: String,
    pub qualities: Vec<String>,
    pub subtitles: Vec<String>,
    pub selected: bool,
}

/// Provider/quality/subtitle selection state for one title
#[derive(Debug, Clone)]
pub struct SourceNegotiator {
    providers: Vec<ProviderSource>,
    current: usize,
    quality: String,
    subtitle: SubtitleChoice,
}

impl SourceNegotiator {
    /// Start with the first provider, "auto" quality and subtitles off
    pub fn new(providers: Vec<ProviderSource>) -> Result<Self, NegotiationError> {
        if providers.is_empty() {
            return Err(NegotiationError::NoProviders);
        }
        Ok(Self {
            providers,
            current: 0,
            quality: AUTO_QUALITY.to_string(),
            subtitle: SubtitleChoice::Off,
        })
    }

    pub fn providers(&self) -> &[ProviderSource] {
        &self.providers
    }

    pub fn current_provider(&self) -> &ProviderSource {
        &self.providers[self.current]
    }

    pub fn selected_quality(&self) -> &str {
        &self.quality
    }

    pub fn selected_subtitle(&self) -> &SubtitleChoice {
        &self.subtitle
    }

    /// Switch provider; quality resets to the provider's first file
    pub fn select_provider(&mut self, name: &str) -> Result<(), NegotiationError> {
        let index = self
            .providers
            .iter()
            .position(|p| p.provider == name)
            .ok_or_else(|| NegotiationError::UnknownProvider(name.to_string()))?;

        self.current = index;
        if let Some(first) = self.providers[index].files.first() {
            self.quality = first.quality.clone();
        }
        Ok(())
    }

    /// Store a quality label; unknown labels resolve to the first file
    pub fn select_quality(&mut self, label: &str) {
        self.quality = label.to_string();
    }

    /// Pick the best file not above `wanted`, else the first file
    pub fn prefer_quality(&mut self, wanted: Quality) {
        let files = &self.current_provider().files;
        let best = files
            .iter()
            .filter(|f| {
                let q = f.classified_quality();
                q != Quality::Unknown && q <= wanted
            })
            .max_by_key(|f| f.classified_quality());

        let chosen = best.or_else(|| files.first()).map(|f| f.quality.clone());
        if let Some(quality) = chosen {
            self.quality = quality;
        }
    }

    pub fn select_subtitle(&mut self, choice: SubtitleChoice) {
        self.subtitle = choice;
    }

    /// File for the current provider and quality
    pub fn current_file(&self) -> Option<&VideoFile> {
        let files = &self.current_provider().files;
        files
            .iter()
            .find(|f| f.quality == self.quality)
            .or_else(|| files.first())
    }

    /// Apply explicit choices in menu order: provider, then quality, then
    /// subtitle. Without an explicit quality the preferred one is used.
    pub fn apply(
        &mut self,
        choices: &PlayChoices,
        preferred: Option<Quality>,
    ) -> Result<(), NegotiationError> {
        if let Some(name) = choices.provider.as_deref().filter(|p| !p.is_empty()) {
            self.select_provider(name)?;
        }

        match choices.quality.as_deref().filter(|q| !q.is_empty()) {
            Some(label) => self.select_quality(label),
            None => {
                if let Some(wanted) = preferred {
                    self.prefer_quality(wanted);
                }
            }
        }

        if let Some(subtitle) = choices.subtitle.as_deref() {
            self.select_subtitle(SubtitleChoice::parse(subtitle));
        }
        Ok(())
    }

    /// Provider menu with the current one marked
    pub fn menu(&self) -> Vec<ProviderOption> {
        self.providers
            .iter()
            .enumerate()
            .map(|(i, p)| ProviderOption {
                name: p.provider.clone(),
                qualities: p.qualities().into_iter().map(String::from).collect(),
                subtitles: p.subtitles.iter().map(|s| s.lang.clone()).collect(),
                selected: i == self.current,
            })
            .collect()
    }

    /// Resolve the current selection into proxied URLs and track modes
    pub fn plan(&self, routes: &ProxyRoutes) -> Result<PlaybackPlan, NegotiationError> {
        let provider = self.current_provider();
        let file = self
            .current_file()
            .ok_or_else(|| NegotiationError::NoFiles(provider.provider.clone()))?;

        let subtitles = provider
            .subtitles
            .iter()
            .map(|track| TrackPlan {
                label: track.lang.clone(),
                srclang: track.lang.to_lowercase(),
                url: routes.subtitle_url(&track.url),
                mode: match &self.subtitle {
                    SubtitleChoice::Off => TrackMode::Disabled,
                    SubtitleChoice::Language(lang) if lang.eq_ignore_ascii_case(&track.lang) => {
                        TrackMode::Showing
                    }
                    SubtitleChoice::Language(_) => TrackMode::Hidden,
                },
            })
            .collect();

        Ok(PlaybackPlan {
            provider: provider.provider.clone(),
            quality: file.quality.clone(),
            kind: file.kind,
            source_url: file.file.clone(),
            playback_url: routes.video_url(&file.file),
            subtitles,
        })
    }
}
