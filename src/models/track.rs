use serde::{Deserialize, Serialize};

/// A colour as (red, green, blue). Serializes as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn channels(&self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub artist: String,
    pub playcount: u64,
    pub canonical_url: String, // Last.fm track page
    pub artwork_url: String,
}

impl Track {
    pub fn new(name: String, artist: String, artwork_url: String) -> Self {
        Self {
            name,
            artist,
            playcount: 0,
            canonical_url: String::new(),
            artwork_url,
        }
    }

    pub fn with_playcount(mut self, playcount: u64) -> Self {
        self.playcount = playcount;
        self
    }

    pub fn with_canonical_url(mut self, canonical_url: String) -> Self {
        self.canonical_url = canonical_url;
        self
    }

    pub fn with_rgb(self, rgb: Rgb) -> ColoredTrack {
        ColoredTrack { track: self, rgb }
    }
}

/// A track whose artwork produced an average colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColoredTrack {
    pub track: Track,
    pub rgb: Rgb,
}
