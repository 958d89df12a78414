//! Playback infrastructure
//!
//! - Negotiator: provider/quality/subtitle selection into a playback plan
//! - Proxy: same-origin relay for media and subtitle files
//! - Subtitles: SRT to WebVTT conversion

pub mod negotiator;
pub mod proxy;
pub mod subtitles;

pub use negotiator::{
    PlayChoices, PlaybackPlan, ProviderOption, ProxyRoutes, SourceNegotiator, SubtitleChoice,
};
pub use proxy::{ProxyRelay, UpstreamHeaders};
