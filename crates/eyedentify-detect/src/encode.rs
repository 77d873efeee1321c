use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;

use crate::DetectError;

/// Lossy JPEG encoding of the image. Alpha is dropped.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, DetectError> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));

    rgb.write_with_encoder(encoder)
        .map_err(|e| DetectError::Encode(e.to_string()))?;

    Ok(bytes)
}

/// JPEG-encode then base64 the image on the blocking pool
pub async fn jpeg_base64(image: Arc<DynamicImage>, quality: u8) -> Result<String, DetectError> {
    tokio::task::spawn_blocking(move || {
        let bytes = encode_jpeg(&image, quality)?;
        tracing::debug!("Encoded {}x{} image to {} JPEG bytes", image.width(), image.height(), bytes.len());
        Ok(STANDARD.encode(bytes))
    })
    .await
    .map_err(|e| DetectError::Encode(format!("encode task failed: {}", e)))?
}
