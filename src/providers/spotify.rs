use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::SpotifyCredentials;
use crate::error::ProviderError;

const PROVIDER: &str = "Spotify";
// Refresh a little before Spotify actually expires the token.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    album: Album,
    #[serde(default)]
    external_urls: ExternalUrls,
    preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

/// Best catalog match for a track/artist search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyTrack {
    pub artwork_url: Option<String>,
    pub spotify_url: Option<String>,
    pub preview_url: Option<String>,
}

impl Track {
    fn into_spotify_track(self) -> SpotifyTrack {
        SpotifyTrack {
            // Spotify lists album images largest first
            artwork_url: self.album.images.into_iter().next().map(|img| img.url),
            spotify_url: self.external_urls.spotify,
            preview_url: self.preview_url.filter(|url| !url.is_empty()),
        }
    }
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Spotify Web API search, authenticated with the client-credentials flow.
pub struct SpotifyClient {
    credentials: Option<SpotifyCredentials>,
    api_url: String,
    accounts_url: String,
    client: reqwest::Client,
    token: Mutex<Option<AccessToken>>,
}

impl SpotifyClient {
    pub fn new(
        credentials: Option<SpotifyCredentials>,
        api_url: String,
        accounts_url: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            credentials,
            api_url,
            accounts_url,
            client,
            token: Mutex::new(None),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Top search hit for `track:<track> artist:<artist>`.
    pub async fn search_track(
        &self,
        track: &str,
        artist: &str,
    ) -> Result<Option<SpotifyTrack>, ProviderError> {
        let token = self.access_token().await?;
        let query = format!("track:{} artist:{}", track, artist);
        let url = format!(
            "{}/search?q={}&type=track&limit=1",
            self.api_url,
            urlencoding::encode(&query)
        );

        let response = self.client.get(&url).bearer_auth(&token).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // Token was revoked early, fetch a new one next time
            *self.token.lock().await = None;
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status,
            });
        }

        let data = response.json::<SearchResponse>().await?;
        Ok(data.tracks.items.into_iter().next().map(Track::into_spotify_track))
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ProviderError::MissingCredentials(PROVIDER))?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh()) {
            return Ok(token.value.clone());
        }

        tracing::debug!("Requesting Spotify access token");

        let response = self
            .client
            .post(&self.accounts_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: response.status(),
            });
        }

        let body = response.json::<TokenResponse>().await?;
        *cached = Some(AccessToken {
            value: body.access_token.clone(),
            expires_at: Instant::now()
                + Duration::from_secs(body.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN),
        });

        Ok(body.access_token)
    }
}
