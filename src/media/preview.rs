/// Hero image preview derived from the image field
///
/// The preview depends only on the field's current text, so it is
/// recomputed whenever that text changes and never stored.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::IngestError;

#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    /// Empty field: no preview and no clear control
    Hidden,
    /// An embedded `data:` URI, decoded to its encoded image bytes
    Embedded(Vec<u8>),
    /// Anything else points at an external image, fetched on demand
    Remote(String),
}

impl Preview {
    pub fn from_field(value: &str) -> Self {
        if value.is_empty() {
            return Preview::Hidden;
        }

        match decode_data_uri(value) {
            Some(bytes) => Preview::Embedded(bytes),
            None => Preview::Remote(value.to_string()),
        }
    }

    /// URL worth fetching for this preview, if any
    pub fn fetchable_url(&self) -> Option<&str> {
        match self {
            Preview::Remote(url) if url.starts_with("http://") || url.starts_with("https://") => {
                Some(url.as_str())
            }
            _ => None,
        }
    }
}

/// Download a remote hero image for display.
///
/// Non-success statuses and bodies that are not a recognizable image
/// are errors; the caller keeps showing the link instead.
pub async fn fetch_remote(url: String) -> Result<Vec<u8>, IngestError> {
    let bytes = reqwest::get(&url).await?.error_for_status()?.bytes().await?;
    image::guess_format(&bytes).map_err(IngestError::Decode)?;

    tracing::debug!("Fetched {} bytes of preview from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}

/// Payload bytes of a base64 `data:` URI
fn decode_data_uri(value: &str) -> Option<Vec<u8>> {
    let rest = value.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    STANDARD.decode(payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ingest::to_data_uri;

    #[test]
    fn test_empty_field_hides_preview() {
        assert_eq!(Preview::from_field(""), Preview::Hidden);
    }

    #[test]
    fn test_whitespace_field_still_shows_preview() {
        let preview = Preview::from_field("   ");
        assert_eq!(preview, Preview::Remote("   ".to_string()));
        assert_eq!(preview.fetchable_url(), None);
    }

    #[test]
    fn test_data_uri_is_embedded() {
        let uri = to_data_uri(&[0xFF, 0xD8, 0xFF, 0xD9]);
        assert_eq!(
            Preview::from_field(&uri),
            Preview::Embedded(vec![0xFF, 0xD8, 0xFF, 0xD9])
        );
    }

    #[test]
    fn test_url_is_remote() {
        let preview = Preview::from_field("https://example.com/cover.png");
        assert_eq!(
            preview,
            Preview::Remote("https://example.com/cover.png".to_string())
        );
        assert_eq!(preview.fetchable_url(), Some("https://example.com/cover.png"));
    }

    #[test]
    fn test_malformed_data_uri_falls_back_to_remote() {
        let preview = Preview::from_field("data:image/png;base64,%%%");
        assert!(matches!(preview, Preview::Remote(_)));
    }

    /// Serve one canned HTTP response on a local port
    fn serve_once(status: &str, body: Vec<u8>) -> String {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let status = status.to_string();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
        });
        format!("http://{}/cover.png", addr)
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_fetch_remote_returns_image_bytes() {
        let png = png_bytes();
        let url = serve_once("200 OK", png.clone());

        let bytes = fetch_remote(url).await.unwrap();
        assert_eq!(bytes, png);
    }

    #[tokio::test]
    async fn test_fetch_remote_rejects_error_status() {
        let url = serve_once("404 Not Found", b"missing".to_vec());

        let result = fetch_remote(url).await;
        assert!(matches!(result, Err(IngestError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_remote_rejects_non_image_body() {
        let url = serve_once("200 OK", b"<html>not a picture</html>".to_vec());

        let result = fetch_remote(url).await;
        assert!(matches!(result, Err(IngestError::Decode(_))));
    }
}
