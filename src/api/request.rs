use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::models::Rgb;
use crate::service::MatchQuery;

pub const DEFAULT_PERIOD: &str = "12month";
pub const DEFAULT_LIMIT: u32 = 10;

/// Body of `POST /api/fetch_and_match`.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    pub username: String,
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default = "default_limit", deserialize_with = "limit")]
    pub limit: u32,
    #[serde(deserialize_with = "channel")]
    pub r: u8,
    #[serde(deserialize_with = "channel")]
    pub g: u8,
    #[serde(deserialize_with = "channel")]
    pub b: u8,
}

impl MatchRequest {
    pub fn into_query(self) -> MatchQuery {
        MatchQuery {
            username: self.username,
            period: self.period,
            limit: self.limit,
            color: Rgb(self.r, self.g, self.b),
        }
    }
}

fn default_period() -> String {
    DEFAULT_PERIOD.to_string()
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

// Browsers post form values as strings as often as numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Lenient {
    fn as_integer(&self) -> Option<i64> {
        match self {
            Lenient::Int(n) => Some(*n),
            Lenient::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Lenient::Float(_) => None,
            Lenient::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn integer<'de, D>(deserializer: D, field: &str) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Lenient::deserialize(deserializer)?
        .as_integer()
        .ok_or_else(|| D::Error::custom(format!("{} must be an integer", field)))
}

fn channel<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = integer(deserializer, "colour channel")?;
    u8::try_from(value)
        .map_err(|_| D::Error::custom(format!("colour channel {} is outside 0-255", value)))
}

fn limit<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = integer(deserializer, "limit")?;
    u32::try_from(value)
        .ok()
        .filter(|limit| *limit > 0)
        .ok_or_else(|| D::Error::custom(format!("limit {} must be a positive integer", value)))
}
