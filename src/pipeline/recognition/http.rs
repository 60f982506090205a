use crate::common::{Frame, Identity};
use crate::config::{IdentitySettings, UploadSettings};
use crate::error::RecognitionError;
use crate::pipeline::recognition::Recognizer;
use async_trait::async_trait;
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

const USER_AGENT: &str = concat!("welcome-bot/", env!("CARGO_PKG_VERSION"));

/// Posts the frame as a JPEG to the identification endpoint and reads the
/// `id` field of the JSON answer.
pub struct HttpRecognizer {
    http_client: reqwest::Client,
    endpoint: String,
    jpeg_quality: u8,
    identity: IdentitySettings,
}

impl HttpRecognizer {
    pub fn new(
        upload: &UploadSettings,
        identity: IdentitySettings,
    ) -> Result<Self, RecognitionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: upload.endpoint.clone(),
            jpeg_quality: upload.jpeg_quality.clamp(1, 100),
            identity,
        })
    }

    /// Lossy-compresses the frame. JPEG carries no alpha, so everything is
    /// flattened to RGB first.
    pub fn encode(&self, frame: &Frame) -> Result<Vec<u8>, RecognitionError> {
        let rgb = frame.image().to_rgb8();
        let mut payload = Vec::new();
        JpegEncoder::new_with_quality(&mut payload, self.jpeg_quality)
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| RecognitionError::Encode(e.to_string()))?;
        Ok(payload)
    }

    /// Missing, empty or non-string ids and malformed bodies all mean
    /// "nobody recognized".
    pub fn parse_identity(&self, body: &[u8]) -> Option<Identity> {
        let json: serde_json::Value = match serde_json::from_slice(body) {
            Ok(json) => json,
            Err(e) => {
                debug!("Unparseable identification response: {}", e);
                return None;
            }
        };
        let raw = json.get("id")?.as_str()?;
        Identity::parse_with(raw, &self.identity)
    }
}

#[async_trait]
impl Recognizer for HttpRecognizer {
    async fn recognize(&self, frame: &Frame) -> Result<Option<Identity>, RecognitionError> {
        let payload = self.encode(frame)?;
        debug!(
            frame_id = %frame.id(),
            bytes = payload.len(),
            "Uploading frame for identification"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "image/jpeg")
            .body(payload)
            .send()
            .await
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecognitionError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;

        Ok(self.parse_identity(&body))
    }

    fn name(&self) -> &'static str {
        "HttpRecognizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use image::{DynamicImage, RgbaImage, Rgba};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tokio::time::Instant;

    async fn identify(headers: HeaderMap, body: Bytes) -> (StatusCode, String) {
        let is_jpeg = headers
            .get("content-type")
            .is_some_and(|value| value == "image/jpeg");
        // JPEG SOI marker
        if !is_jpeg || !body.starts_with(&[0xFF, 0xD8]) {
            return (StatusCode::BAD_REQUEST, String::new());
        }
        (StatusCode::OK, r#"{"id":"alice-qualifier123"}"#.to_string())
    }

    async fn serve() -> SocketAddr {
        let app = Router::new()
            .route("/identify", post(identify))
            .route("/nobody", post(|| async { r#"{"status":"ok"}"# }))
            .route("/garbage", post(|| async { "<html>oops</html>" }))
            .route(
                "/broken",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn recognizer(endpoint: String) -> HttpRecognizer {
        let upload = UploadSettings {
            endpoint,
            ..UploadSettings::default()
        };
        HttpRecognizer::new(&upload, IdentitySettings::default()).unwrap()
    }

    fn frame() -> Frame {
        Frame::new(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(24, 24, Rgba([200, 10, 10, 128]))),
            Instant::now(),
        )
    }

    #[tokio::test]
    async fn uploads_jpeg_and_reads_identity() {
        let addr = serve().await;
        let recognizer = recognizer(format!("http://{addr}/identify"));
        let identity = recognizer.recognize(&frame()).await.unwrap().unwrap();
        assert_eq!(identity.display_name(), "Alice");
    }

    #[tokio::test]
    async fn missing_id_is_no_identity() {
        let addr = serve().await;
        let recognizer = recognizer(format!("http://{addr}/nobody"));
        assert_eq!(recognizer.recognize(&frame()).await, Ok(None));
    }

    #[tokio::test]
    async fn malformed_body_is_no_identity() {
        let addr = serve().await;
        let recognizer = recognizer(format!("http://{addr}/garbage"));
        assert_eq!(recognizer.recognize(&frame()).await, Ok(None));
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let addr = serve().await;
        let recognizer = recognizer(format!("http://{addr}/broken"));
        assert_eq!(
            recognizer.recognize(&frame()).await,
            Err(RecognitionError::Status(500))
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let recognizer = recognizer(format!("http://{addr}/identify"));
        assert!(matches!(
            recognizer.recognize(&frame()).await,
            Err(RecognitionError::Transport(_))
        ));
    }

    #[test]
    fn parses_only_string_ids() {
        let recognizer = recognizer("http://127.0.0.1:1/".to_string());
        assert_eq!(
            recognizer.parse_identity(br#"{"id":"bob"}"#).unwrap().display_name(),
            "Bob"
        );
        assert!(recognizer.parse_identity(br#"{"id":""}"#).is_none());
        assert!(recognizer.parse_identity(br#"{"id":42}"#).is_none());
        assert!(recognizer.parse_identity(b"not json").is_none());
    }

    #[test]
    fn encodes_rgba_frames_as_jpeg() {
        let recognizer = recognizer("http://127.0.0.1:1/".to_string());
        let payload = recognizer.encode(&frame()).unwrap();
        assert!(payload.starts_with(&[0xFF, 0xD8]));
    }
}
