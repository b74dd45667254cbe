mod lastfm;
mod spotify;

pub use lastfm::{LastFmClient, TopTrackEntry};
pub use spotify::{SpotifyClient, SpotifyTrack};

/// Image hash Last.fm serves when it has no real artwork (the grey star).
pub const PLACEHOLDER_ARTWORK_HASH: &str = "2a96cbd8b46e442fc41c2b86b821562f";

pub fn is_placeholder_artwork(url: &str) -> bool {
    url.contains(PLACEHOLDER_ARTWORK_HASH)
}
