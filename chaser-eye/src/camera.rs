//! Snapshot capture from the rover camera

use crate::error::{FrameError, VisionError};
use async_trait::async_trait;
use bytes::Bytes;
use chaser_core::{DeviceConfig, FrameSize};
use reqwest::{Client, Url};
use tracing::{debug, info};

/// One captured image, still in its encoded form
#[derive(Debug, Clone)]
pub struct Frame {
    encoded: Bytes,
    size: FrameSize,
}

impl Frame {
    /// Decode the payload to verify it and learn its dimensions
    pub fn decode(encoded: Bytes) -> Result<Self, FrameError> {
        if encoded.is_empty() {
            return Err(FrameError::Empty);
        }

        let image = image::load_from_memory(&encoded)
            .map_err(|e| FrameError::Decode(e.to_string()))?;

        if image.width() == 0 || image.height() == 0 {
            return Err(FrameError::Decode("image has zero size".to_string()));
        }

        Ok(Self::from_parts(encoded, FrameSize::new(image.width(), image.height())))
    }

    /// Build a frame whose size is already known
    pub fn from_parts(encoded: Bytes, size: FrameSize) -> Self {
        Self { encoded, size }
    }

    pub fn encoded(&self) -> &Bytes {
        &self.encoded
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }
}

/// Supplies one frame per request
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn get_frame(&self) -> Result<Frame, FrameError>;
}

/// Pulls JPEG snapshots from the rover's capture endpoint
pub struct HttpSnapshotSource {
    client: Client,
    url: Url,
}

impl HttpSnapshotSource {
    pub fn new(device: &DeviceConfig) -> Result<Self, VisionError> {
        let url = Url::parse(&device.base_url)
            .and_then(|base| base.join(&device.capture_path))
            .map_err(|e| VisionError::Config(format!("Invalid capture URL: {}", e)))?;

        let client = Client::builder()
            .timeout(device.capture_timeout())
            .build()?;

        info!("Snapshot source at {}", url);
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl FrameSource for HttpSnapshotSource {
    async fn get_frame(&self) -> Result<Frame, FrameError> {
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FrameError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let frame = Frame::decode(body)?;
        debug!("Captured {}x{} frame", frame.size.width, frame.size.height);
        Ok(frame)
    }
}
