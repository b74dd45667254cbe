use std::future::Future;
use std::sync::Arc;

use crate::error::ProviderError;
use crate::providers::{is_placeholder_artwork, LastFmClient, SpotifyClient, SpotifyTrack};

/// Something that can find cover art for a track.
pub trait ArtworkLookup: Send + Sync {
    fn resolve_artwork(
        &self,
        track: &str,
        artist: &str,
    ) -> impl Future<Output = Option<String>> + Send;
}

/// Shareable links for the winning track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackLinks {
    pub spotify_url: String,
    pub preview_url: Option<String>,
}

/// Resolves artwork from the Spotify catalog first, then from Last.fm's
/// `track.getInfo` album image.
#[derive(Clone)]
pub struct ArtworkResolver {
    spotify: Arc<SpotifyClient>,
    lastfm: Arc<LastFmClient>,
}

impl ArtworkResolver {
    pub fn new(spotify: Arc<SpotifyClient>, lastfm: Arc<LastFmClient>) -> Self {
        Self { spotify, lastfm }
    }

    pub async fn resolve_track_links(&self, track: &str, artist: &str) -> Option<TrackLinks> {
        match self.spotify.search_track(track, artist).await {
            Ok(Some(SpotifyTrack {
                spotify_url: Some(spotify_url),
                preview_url,
                ..
            })) => Some(TrackLinks {
                spotify_url,
                preview_url,
            }),
            Ok(Some(_)) => {
                tracing::info!("Spotify match for {} by {} has no shareable link", track, artist);
                None
            }
            Ok(None) => {
                tracing::info!("No match found on Spotify for {} by {}", track, artist);
                None
            }
            Err(e) => {
                tracing::warn!("Error fetching Spotify track info for {} by {}: {}", track, artist, e);
                None
            }
        }
    }
}

impl ArtworkLookup for ArtworkResolver {
    async fn resolve_artwork(&self, track: &str, artist: &str) -> Option<String> {
        if self.spotify.is_configured() {
            let found = self
                .spotify
                .search_track(track, artist)
                .await
                .map(|hit| hit.and_then(|t| t.artwork_url));
            if let Some(url) = usable_artwork("Spotify", track, artist, found) {
                return Some(url);
            }
        }

        let found = self.lastfm.track_artwork(track, artist).await;
        usable_artwork("Last.fm", track, artist, found)
    }
}

/// Collapse one provider's answer into a usable URL, logging anything that
/// isn't one.
fn usable_artwork(
    source: &str,
    track: &str,
    artist: &str,
    found: Result<Option<String>, ProviderError>,
) -> Option<String> {
    match found {
        Ok(Some(url)) if url.is_empty() || is_placeholder_artwork(&url) => {
            tracing::debug!("{} only has placeholder art for {} by {}", source, track, artist);
            None
        }
        Ok(Some(url)) => {
            tracing::debug!("{} artwork for {} by {}: {}", source, track, artist, url);
            Some(url)
        }
        Ok(None) => {
            tracing::debug!("No {} artwork for {} by {}", source, track, artist);
            None
        }
        Err(e) => {
            tracing::warn!("Error fetching {} artwork for {} by {}: {}", source, track, artist, e);
            None
        }
    }
}
