use std::sync::Arc;

use crate::artwork::ArtworkLookup;
use crate::models::Track;
use crate::providers::{is_placeholder_artwork, LastFmClient, TopTrackEntry};

/// Fetches a user's ranked top tracks and attaches artwork to each.
pub struct TopTracksFetcher<A> {
    lastfm: Arc<LastFmClient>,
    artwork: A,
}

impl<A: ArtworkLookup> TopTracksFetcher<A> {
    pub fn new(lastfm: Arc<LastFmClient>, artwork: A) -> Self {
        Self { lastfm, artwork }
    }

    /// `None` when Last.fm can't produce the list (unknown user, outage, bad payload).
    pub async fn fetch_top_tracks(
        &self,
        username: &str,
        period: &str,
        limit: u32,
    ) -> Option<Vec<Track>> {
        tracing::info!(
            "Fetching top tracks for {} (period {}, limit {})",
            username,
            period,
            limit
        );

        match self.lastfm.top_tracks(username, period, limit).await {
            Ok(entries) => Some(attach_artwork(entries, &self.artwork).await),
            Err(e) => {
                tracing::warn!("Failed to fetch top tracks for {}: {}", username, e);
                None
            }
        }
    }
}

/// Keeps ranking order; entries without any usable artwork are dropped.
pub async fn attach_artwork<A: ArtworkLookup>(
    entries: Vec<TopTrackEntry>,
    artwork: &A,
) -> Vec<Track> {
    let mut tracks = Vec::with_capacity(entries.len());

    for entry in entries {
        tracing::debug!("Fetching album art for {} by {}", entry.name, entry.artist);

        let embedded = entry
            .image_url
            .filter(|url| !url.is_empty() && !is_placeholder_artwork(url));

        let artwork_url = match embedded {
            Some(url) => url,
            None => match artwork.resolve_artwork(&entry.name, &entry.artist).await {
                Some(url) => url,
                None => {
                    tracing::info!(
                        "Skipping {} by {}: no artwork found",
                        entry.name,
                        entry.artist
                    );
                    continue;
                }
            },
        };

        tracks.push(
            Track::new(entry.name, entry.artist, artwork_url)
                .with_playcount(entry.playcount)
                .with_canonical_url(entry.url),
        );
    }

    tracks
}
