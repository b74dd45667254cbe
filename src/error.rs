use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to one of the music-data providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned error: {status}")]
    Status {
        provider: &'static str,
        status: StatusCode,
    },

    #[error("{0} credentials are not configured")]
    MissingCredentials(&'static str),

    #[error("unexpected {provider} response: {message}")]
    Payload {
        provider: &'static str,
        message: String,
    },
}

/// Failure turning an artwork URL into an average colour.
#[derive(Debug, Error)]
pub enum ColorError {
    #[error("failed to download artwork: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("artwork download returned status {0}")]
    Status(StatusCode),

    #[error("failed to decode artwork: {0}")]
    Decode(#[from] image::ImageError),

    #[error("artwork has no pixels")]
    EmptyImage,
}

/// Pipeline failures surfaced to the caller. The messages are part of the
/// public response contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("failed to fetch tracks. check your username")]
    TracksUnavailable,

    #[error("failed to process album covers.")]
    NoArtworkColors,

    #[error("no matching track found.")]
    NoMatch,
}
