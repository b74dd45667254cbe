use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub artist: String,
    #[serde(rename = "image_url")]
    pub artwork_url: String,
    pub username: String,
}

impl LeaderboardEntry {
    pub fn new(name: String, artist: String, artwork_url: String, username: String) -> Self {
        Self {
            name,
            artist,
            artwork_url,
            username,
        }
    }
}
