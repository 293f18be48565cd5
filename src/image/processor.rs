use crate::ai::mime::essence;
use crate::models::MediaPayload;
use crate::{Error, Result};
use base64::Engine as _;
use image::ImageFormat;
use std::io::Cursor;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

fn reencode_png_sync(bytes: Vec<u8>) -> Result<Vec<u8>> {
    let img = image::load_from_memory(&bytes)?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// Turn an image payload into a `data:image/png;base64,...` reference.
///
/// PNG payloads pass through untouched; other formats are decoded and
/// re-encoded off the async runtime.
pub async fn to_png_data_url(payload: &MediaPayload) -> Result<String> {
    if essence(&payload.mime_type) == "image/png" {
        return Ok(format!("{}{}", PNG_DATA_URL_PREFIX, payload.data));
    }

    tracing::debug!("Re-encoding {} image as PNG", payload.mime_type);
    let bytes = base64::engine::general_purpose::STANDARD.decode(&payload.data)?;
    let png = tokio::task::spawn_blocking(move || reencode_png_sync(bytes))
        .await
        .map_err(|e| Error::Invariant(format!("Image processing task join error: {}", e)))??;

    Ok(format!(
        "{}{}",
        PNG_DATA_URL_PREFIX,
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}

/// Split a base64 data URL into its MIME type and decoded bytes.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| Error::Invariant("Image reference is not a data URL".to_string()))?;
    let (mime_type, data) = rest
        .split_once(";base64,")
        .ok_or_else(|| Error::Invariant("Image data URL is not base64 encoded".to_string()))?;

    let bytes = base64::engine::general_purpose::STANDARD.decode(data)?;
    Ok((mime_type.to_string(), bytes))
}
