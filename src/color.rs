use image::DynamicImage;

use crate::error::ColorError;
use crate::models::Rgb;

/// Downloads artwork and reduces it to one representative colour.
#[derive(Clone)]
pub struct ColorExtractor {
    client: reqwest::Client,
}

impl ColorExtractor {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn average_color(&self, artwork_url: &str) -> Result<Rgb, ColorError> {
        let response = self.client.get(artwork_url).send().await?;
        if !response.status().is_success() {
            return Err(ColorError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        let rgb = average_color_from_bytes(&bytes)?;
        tracing::debug!("Image URL: {} -> Average RGB: {:?}", artwork_url, rgb);
        Ok(rgb)
    }
}

/// Decode any format `image` understands and average it.
pub fn average_color_from_bytes(bytes: &[u8]) -> Result<Rgb, ColorError> {
    let image = image::load_from_memory(bytes)?;
    average_rgb(&image).ok_or(ColorError::EmptyImage)
}

/// Per-channel arithmetic mean over every pixel, alpha discarded, truncated.
/// `None` for a zero-sized image.
pub fn average_rgb(image: &DynamicImage) -> Option<Rgb> {
    let rgb = image.to_rgb8();
    let pixel_count = u64::from(rgb.width()) * u64::from(rgb.height());
    if pixel_count == 0 {
        return None;
    }

    let mut sums = [0u64; 3];
    for pixel in rgb.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += u64::from(channel);
        }
    }

    // A mean of u8 values always fits in u8
    let [r, g, b] = sums.map(|sum| (sum / pixel_count) as u8);
    Some(Rgb(r, g, b))
}
