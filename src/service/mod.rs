use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use crate::artwork::{ArtworkResolver, TrackLinks};
use crate::cache::{QueryCache, QueryKey};
use crate::color::ColorExtractor;
use crate::config::Config;
use crate::error::{ColorError, MatchError};
use crate::leaderboard::Leaderboard;
use crate::matcher::find_closest;
use crate::models::{ColoredTrack, LeaderboardEntry, Rgb, Track};
use crate::providers::{LastFmClient, SpotifyClient};
use crate::tracks::TopTracksFetcher;

pub const SPOTIFY_URL_UNAVAILABLE: &str = "not available";

/// Artwork downloads in flight per request.
pub const MAX_CONCURRENT_DOWNLOADS: usize = 8;

/// The outside world as the match pipeline sees it.
pub trait Upstream: Send + Sync {
    fn fetch_top_tracks(
        &self,
        username: &str,
        period: &str,
        limit: u32,
    ) -> impl Future<Output = Option<Vec<Track>>> + Send;

    fn average_color(
        &self,
        artwork_url: &str,
    ) -> impl Future<Output = Result<Rgb, ColorError>> + Send;

    fn resolve_track_links(
        &self,
        track: &str,
        artist: &str,
    ) -> impl Future<Output = Option<TrackLinks>> + Send;
}

/// Last.fm + Spotify over HTTP.
pub struct HttpUpstream {
    fetcher: TopTracksFetcher<ArtworkResolver>,
    resolver: ArtworkResolver,
    colors: ColorExtractor,
}

impl HttpUpstream {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = config.http_client()?;

        let lastfm = Arc::new(LastFmClient::new(
            config.lastfm_api_key.clone(),
            config.lastfm_api_url.clone(),
            client.clone(),
        ));
        let spotify = Arc::new(SpotifyClient::new(
            config.spotify.clone(),
            config.spotify_api_url.clone(),
            config.spotify_accounts_url.clone(),
            client.clone(),
        ));
        let resolver = ArtworkResolver::new(spotify, Arc::clone(&lastfm));

        Ok(Self {
            fetcher: TopTracksFetcher::new(lastfm, resolver.clone()),
            resolver,
            colors: ColorExtractor::new(client),
        })
    }
}

impl Upstream for HttpUpstream {
    async fn fetch_top_tracks(&self, username: &str, period: &str, limit: u32) -> Option<Vec<Track>> {
        self.fetcher.fetch_top_tracks(username, period, limit).await
    }

    async fn average_color(&self, artwork_url: &str) -> Result<Rgb, ColorError> {
        self.colors.average_color(artwork_url).await
    }

    async fn resolve_track_links(&self, track: &str, artist: &str) -> Option<TrackLinks> {
        self.resolver.resolve_track_links(track, artist).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchQuery {
    pub username: String,
    pub period: String,
    pub limit: u32,
    pub color: Rgb,
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedTrack {
    pub name: String,
    pub artist: String,
    pub rgb: Rgb,
    pub image_url: String,
    pub lastfm_url: String,
    pub spotify_url: String,
    pub preview_url: String,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Owns the query cache and leaderboard for the lifetime of the server.
pub struct MatchService<U> {
    upstream: U,
    cache: QueryCache,
    leaderboard: Leaderboard,
}

impl<U: Upstream> MatchService<U> {
    pub fn new(upstream: U, cache: QueryCache, leaderboard: Leaderboard) -> Self {
        Self {
            upstream,
            cache,
            leaderboard,
        }
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub async fn fetch_and_match(&self, query: &MatchQuery) -> Result<MatchedTrack, MatchError> {
        tracing::info!(
            "Received: username={}, period={}, limit={}, color={:?}",
            query.username,
            query.period,
            query.limit,
            query.color
        );

        let key = QueryKey::new(&query.username, &query.period, query.limit);
        let tracks = self
            .cache
            .get_or_fetch(key, || {
                self.upstream
                    .fetch_top_tracks(&query.username, &query.period, query.limit)
            })
            .await;

        let tracks = match tracks {
            Some(tracks) if !tracks.is_empty() => tracks,
            _ => return Err(MatchError::TracksUnavailable),
        };

        let candidates = self.colorize(tracks).await;
        if candidates.is_empty() {
            return Err(MatchError::NoArtworkColors);
        }

        let closest = find_closest(query.color, &candidates).ok_or(MatchError::NoMatch)?;
        tracing::info!(
            "Closest match for {:?}: {} by {} (distance {})",
            query.color,
            closest.track.track.name,
            closest.track.track.artist,
            closest.distance
        );
        let ColoredTrack { track, rgb } = closest.track.clone();

        let links = self
            .upstream
            .resolve_track_links(&track.name, &track.artist)
            .await;

        self.leaderboard
            .record(LeaderboardEntry::new(
                track.name.clone(),
                track.artist.clone(),
                track.artwork_url.clone(),
                query.username.clone(),
            ))
            .await;

        let (spotify_url, preview_url) = match links {
            Some(links) => (links.spotify_url, links.preview_url.unwrap_or_default()),
            None => (SPOTIFY_URL_UNAVAILABLE.to_string(), String::new()),
        };

        Ok(MatchedTrack {
            name: track.name,
            artist: track.artist,
            rgb,
            image_url: track.artwork_url,
            lastfm_url: track.canonical_url,
            spotify_url,
            preview_url,
            leaderboard: self.leaderboard.snapshot().await,
        })
    }

    /// Average artworks with bounded concurrency; tracks whose colour can't
    /// be computed are dropped. Ranking order is preserved.
    async fn colorize(&self, tracks: Vec<Track>) -> Vec<ColoredTrack> {
        let downloads: Vec<_> = tracks
            .iter()
            .map(|track| self.upstream.average_color(&track.artwork_url))
            .collect();
        let colors: Vec<_> = stream::iter(downloads)
            .buffered(MAX_CONCURRENT_DOWNLOADS)
            .collect()
            .await;

        tracks
            .into_iter()
            .zip(colors)
            .filter_map(|(track, color)| match color {
                Ok(rgb) => Some(track.with_rgb(rgb)),
                Err(e) => {
                    tracing::warn!(
                        "Dropping {} by {} ({}): {}",
                        track.name,
                        track.artist,
                        track.artwork_url,
                        e
                    );
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests;
