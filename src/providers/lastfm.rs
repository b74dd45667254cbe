use serde::Deserialize;

use crate::error::ProviderError;

const PROVIDER: &str = "Last.fm";
const PREFERRED_IMAGE_SIZE: &str = "extralarge";

#[derive(Debug, Deserialize)]
struct TopTracksResponse {
    toptracks: Option<TopTracks>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopTracks {
    #[serde(default, deserialize_with = "one_or_many")]
    track: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    name: String,
    artist: Artist,
    #[serde(default)]
    playcount: Count,
    #[serde(default)]
    url: String,
    #[serde(default, deserialize_with = "one_or_many")]
    image: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Image {
    #[serde(rename = "#text")]
    url: String,
    #[serde(default)]
    size: String,
}

#[derive(Debug, Deserialize)]
struct TrackInfoResponse {
    track: Option<TrackInfo>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackInfo {
    album: Option<Album>,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default, deserialize_with = "one_or_many")]
    image: Vec<Image>,
}

// Last.fm sends counts as strings, but be lenient.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Count {
    Number(u64),
    Text(String),
}

impl Default for Count {
    fn default() -> Self {
        Count::Number(0)
    }
}

impl Count {
    fn value(&self) -> u64 {
        match self {
            Count::Number(n) => *n,
            Count::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

// Single-element lists come back as a bare object.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}

/// One ranked entry of a user's top tracks, as reported by Last.fm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopTrackEntry {
    pub name: String,
    pub artist: String,
    pub playcount: u64,
    pub url: String,
    /// Embedded image, if Last.fm sent a non-empty one. May still be the placeholder.
    pub image_url: Option<String>,
}

impl Track {
    fn into_entry(self) -> TopTrackEntry {
        TopTrackEntry {
            image_url: extract_image_url(&self.image),
            playcount: self.playcount.value(),
            name: self.name,
            artist: self.artist.name,
            url: self.url,
        }
    }
}

pub struct LastFmClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl LastFmClient {
    pub fn new(api_key: String, base_url: String, client: reqwest::Client) -> Self {
        Self {
            api_key,
            base_url,
            client,
        }
    }

    /// `user.gettoptracks`, in Last.fm's ranking order.
    pub async fn top_tracks(
        &self,
        username: &str,
        period: &str,
        limit: u32,
    ) -> Result<Vec<TopTrackEntry>, ProviderError> {
        let url = format!(
            "{}?method=user.gettoptracks&user={}&period={}&limit={}&api_key={}&format=json",
            self.base_url,
            urlencoding::encode(username),
            urlencoding::encode(period),
            limit,
            self.api_key
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: response.status(),
            });
        }

        let data = response.json::<TopTracksResponse>().await?;
        let toptracks = data.toptracks.ok_or_else(|| ProviderError::Payload {
            provider: PROVIDER,
            message: data.message.unwrap_or_else(|| "missing toptracks".to_string()),
        })?;

        Ok(toptracks.track.into_iter().map(Track::into_entry).collect())
    }

    /// Album artwork from `track.getInfo`.
    pub async fn track_artwork(
        &self,
        track: &str,
        artist: &str,
    ) -> Result<Option<String>, ProviderError> {
        let url = format!(
            "{}?method=track.getInfo&artist={}&track={}&autocorrect=1&api_key={}&format=json",
            self.base_url,
            urlencoding::encode(artist),
            urlencoding::encode(track),
            self.api_key
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: response.status(),
            });
        }

        let data = response.json::<TrackInfoResponse>().await?;
        match data.track {
            Some(info) => Ok(info
                .album
                .and_then(|album| extract_image_url(&album.image))),
            None => {
                tracing::debug!(
                    "Last.fm has no info for {} by {}: {}",
                    track,
                    artist,
                    data.message.unwrap_or_default()
                );
                Ok(None)
            }
        }
    }
}

fn extract_image_url(images: &[Image]) -> Option<String> {
    images
        .iter()
        .find(|img| img.size == PREFERRED_IMAGE_SIZE && !img.url.is_empty())
        .or_else(|| images.iter().find(|img| !img.url.is_empty()))
        .map(|img| img.url.clone())
}
