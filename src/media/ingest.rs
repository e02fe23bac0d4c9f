use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::config::{IMAGE_SIZE_ADVISORY_BYTES, JPEG_QUALITY, MAX_IMAGE_WIDTH};
use crate::error::IngestError;

/// Target dimensions for an image of `width` x `height`.
///
/// Anything wider than `max_width` is scaled to exactly `max_width`, with the
/// height scaled by the same ratio (truncated, never below 1 pixel).
/// Narrower images keep their size.
pub fn fit_to_width(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }

    let scaled = (height as u64 * max_width as u64 / width as u64) as u32;
    (max_width, scaled.max(1))
}

/// True when a file of `len` bytes deserves a size warning
pub fn exceeds_size_advisory(len: u64) -> bool {
    len > IMAGE_SIZE_ADVISORY_BYTES
}

/// Downscale and re-encode `img` as JPEG bytes
pub fn compress(img: &DynamicImage) -> Result<Vec<u8>, IngestError> {
    let (width, height) = fit_to_width(img.width(), img.height(), MAX_IMAGE_WIDTH);

    let resized = if (width, height) == (img.width(), img.height()) {
        img.to_rgb8()
    } else {
        img.resize_exact(width, height, FilterType::Triangle).to_rgb8()
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&resized)
        .map_err(IngestError::Encode)?;

    Ok(jpeg)
}

/// Wrap JPEG bytes as a self-contained `data:` URI
pub fn to_data_uri(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg))
}

/// Decode an encoded image held in memory and turn it into a data URI
pub fn ingest_bytes(bytes: &[u8]) -> Result<String, IngestError> {
    let img = decode_upright(bytes)?;
    let jpeg = compress(&img)?;

    tracing::info!(
        "Ingested {}x{} image as {:.1}KB JPEG",
        img.width(),
        img.height(),
        jpeg.len() as f64 / 1024.0
    );
    Ok(to_data_uri(&jpeg))
}

/// Decode `bytes`, applying any EXIF orientation so the pixels come out
/// the way a viewer would display them
fn decode_upright(bytes: &[u8]) -> Result<DynamicImage, IngestError> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(IngestError::FileRead)?
        .into_decoder()
        .map_err(IngestError::Decode)?;
    let orientation = decoder.orientation().map_err(IngestError::Decode)?;

    let mut img = DynamicImage::from_decoder(decoder).map_err(IngestError::Decode)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Read, downscale and encode the image at `path`.
///
/// Decoding is CPU-bound, so it runs on the blocking pool.
pub async fn ingest_file(path: PathBuf) -> Result<String, IngestError> {
    tokio::task::spawn_blocking(move || ingest_file_blocking(&path))
        .await
        .map_err(|e| IngestError::Join(e.to_string()))?
}

fn ingest_file_blocking(path: &Path) -> Result<String, IngestError> {
    let bytes = std::fs::read(path).map_err(IngestError::FileRead)?;
    ingest_bytes(&bytes)
}
