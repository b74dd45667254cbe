// Test fixtures and fake upstreams
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::artwork::{ArtworkLookup, TrackLinks};
use crate::error::ColorError;
use crate::models::{ColoredTrack, LeaderboardEntry, Rgb, Track};
use crate::service::Upstream;

/// Artwork URL the fixtures give a track name.
pub fn artwork_url_for(name: &str) -> String {
    format!("https://img.example/{}.png", name.replace(' ', "_"))
}

/// Create a test track with Last.fm-shaped links
pub fn test_track(name: &str, artist: &str, playcount: u64) -> Track {
    Track::new(name.to_string(), artist.to_string(), artwork_url_for(name))
        .with_playcount(playcount)
        .with_canonical_url(format!(
            "https://www.last.fm/music/{}/_/{}",
            urlencoding::encode(artist),
            urlencoding::encode(name)
        ))
}

pub fn colored_track(name: &str, playcount: u64, rgb: Rgb) -> ColoredTrack {
    test_track(name, "Test Artist", playcount).with_rgb(rgb)
}

pub fn leaderboard_entry(name: &str, username: &str) -> LeaderboardEntry {
    LeaderboardEntry::new(
        name.to_string(),
        "Test Artist".to_string(),
        artwork_url_for(name),
        username.to_string(),
    )
}

/// Encode `pixels` (row-major) as an in-memory PNG.
pub fn encode_png(pixels: &[Rgb], width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        let Rgb(r, g, b) = pixels[(y * width + x) as usize];
        image::Rgb([r, g, b])
    });

    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Artwork lookup backed by a map from track name to URL.
#[derive(Default)]
pub struct FakeArtwork {
    urls: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FakeArtwork {
    pub fn with(mut self, track: &str, url: &str) -> Self {
        self.urls.insert(track.to_string(), url.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ArtworkLookup for FakeArtwork {
    async fn resolve_artwork(&self, track: &str, _artist: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.get(track).cloned()
    }
}

/// In-memory upstream: fixed track list, colours keyed by artwork URL.
pub struct FakeUpstream {
    tracks: Option<Vec<Track>>,
    colors: HashMap<String, Rgb>,
    links: Option<TrackLinks>,
    fetch_calls: AtomicUsize,
    downloads_in_flight: AtomicUsize,
    peak_downloads: AtomicUsize,
}

impl FakeUpstream {
    pub fn new(tracks: Option<Vec<Track>>) -> Self {
        Self {
            tracks,
            colors: HashMap::new(),
            links: None,
            fetch_calls: AtomicUsize::new(0),
            downloads_in_flight: AtomicUsize::new(0),
            peak_downloads: AtomicUsize::new(0),
        }
    }

    /// Give `track`'s artwork a colour. Tracks without one fail to decode.
    pub fn with_color(mut self, track: &Track, rgb: Rgb) -> Self {
        self.colors.insert(track.artwork_url.clone(), rgb);
        self
    }

    pub fn with_links(mut self, spotify_url: &str, preview_url: Option<&str>) -> Self {
        self.links = Some(TrackLinks {
            spotify_url: spotify_url.to_string(),
            preview_url: preview_url.map(str::to_string),
        });
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Most artwork downloads that were ever running at once.
    pub fn peak_downloads(&self) -> usize {
        self.peak_downloads.load(Ordering::SeqCst)
    }
}

impl Upstream for FakeUpstream {
    async fn fetch_top_tracks(&self, _username: &str, _period: &str, limit: u32) -> Option<Vec<Track>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.tracks
            .as_ref()
            .map(|tracks| tracks.iter().take(limit as usize).cloned().collect())
    }

    async fn average_color(&self, artwork_url: &str) -> Result<Rgb, ColorError> {
        let running = self.downloads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_downloads.fetch_max(running, Ordering::SeqCst);
        // let other downloads start before this one finishes
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.downloads_in_flight.fetch_sub(1, Ordering::SeqCst);

        self.colors
            .get(artwork_url)
            .copied()
            .ok_or(ColorError::EmptyImage)
    }

    async fn resolve_track_links(&self, _track: &str, _artist: &str) -> Option<TrackLinks> {
        self.links.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_fixture() {
        let track = test_track("Red Song", "The Band", 12);

        assert_eq!(track.artwork_url, "https://img.example/Red_Song.png");
        assert_eq!(
            track.canonical_url,
            "https://www.last.fm/music/The%20Band/_/Red%20Song"
        );
        assert_eq!(track.playcount, 12);
    }

    #[test]
    fn test_encode_png_dimensions() {
        let png = encode_png(&[Rgb(1, 2, 3), Rgb(4, 5, 6)], 2, 1);
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 1));
    }

    #[tokio::test]
    async fn test_fake_upstream_counts_fetches() {
        let upstream = FakeUpstream::new(Some(vec![test_track("A", "B", 1)]));
        upstream.fetch_top_tracks("u", "overall", 10).await;
        upstream.fetch_top_tracks("u", "overall", 10).await;
        assert_eq!(upstream.fetch_calls(), 2);
    }
}
