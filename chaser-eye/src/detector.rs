//! Object detection collaborator
//!
//! The detector is a black box: the rover only needs labelled boxes in pixel
//! coordinates. `HttpDetector` posts the encoded frame to an inference
//! service and accepts either labels or COCO class ids in the reply.

use crate::camera::Frame;
use crate::classes;
use crate::error::VisionError;
use async_trait::async_trait;
use chaser_core::{BoundingBox, Detection, DetectorConfig};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};

/// Produces zero or more detections for a frame
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detect objects scoring at least `min_confidence`. Called once per cycle.
    async fn detect(&self, frame: &Frame, min_confidence: f32) -> Result<Vec<Detection>, VisionError>;
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    detections: Vec<WireDetection>,
}

#[derive(Debug, Deserialize)]
struct WireDetection {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    class_id: Option<usize>,
    confidence: f32,
    /// x1, y1, x2, y2 in pixels
    #[serde(alias = "xyxy")]
    bbox: [f32; 4],
}

impl WireDetection {
    fn into_detection(self) -> Option<Detection> {
        let label = match (self.label, self.class_id) {
            (Some(label), _) => label,
            (None, Some(id)) => classes::label_for(id)?.to_string(),
            (None, None) => return None,
        };
        let [x1, y1, x2, y2] = self.bbox;
        Some(Detection::new(label, self.confidence, BoundingBox::new(x1, y1, x2, y2)))
    }
}

/// Detector backed by a remote inference endpoint
pub struct HttpDetector {
    client: Client,
    endpoint: Url,
}

impl HttpDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self, VisionError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| VisionError::Config(format!("Invalid detector endpoint: {}", e)))?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Detector for HttpDetector {
    async fn detect(&self, frame: &Frame, min_confidence: f32) -> Result<Vec<Detection>, VisionError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("conf", min_confidence)])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(frame.encoded().clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VisionError::Model(format!("Detector returned HTTP {}", status)));
        }

        let body: DetectResponse = response
            .json()
            .await
            .map_err(|e| VisionError::Model(format!("Malformed detector response: {}", e)))?;

        let detections = filter_detections(body.detections, min_confidence);
        debug!("Detector returned {} usable detections", detections.len());
        Ok(detections)
    }
}

fn filter_detections(raw: Vec<WireDetection>, min_confidence: f32) -> Vec<Detection> {
    raw.into_iter()
        .filter_map(|wire| {
            let class_id = wire.class_id;
            let detection = wire.into_detection();
            if detection.is_none() {
                warn!("Dropping detection without a usable label (class_id {:?})", class_id);
            }
            detection
        })
        .filter(|d| {
            d.confidence.is_finite()
                && (0.0..=1.0).contains(&d.confidence)
                && d.confidence >= min_confidence
        })
        .filter(|d| {
            let valid = d.bbox.is_valid();
            if !valid {
                debug!("Dropping {} with degenerate box {:?}", d.label, d.bbox);
            }
            valid
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(label: Option<&str>, class_id: Option<usize>, confidence: f32, bbox: [f32; 4]) -> WireDetection {
        WireDetection {
            label: label.map(str::to_string),
            class_id,
            confidence,
            bbox,
        }
    }

    #[test]
    fn test_class_id_maps_to_label() {
        let detection = wire(None, Some(41), 0.9, [1.0, 2.0, 3.0, 4.0])
            .into_detection()
            .unwrap();
        assert_eq!(detection.label, "cup");
        assert_eq!(detection.bbox, BoundingBox::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_explicit_label_wins() {
        let detection = wire(Some("mug"), Some(41), 0.9, [1.0, 2.0, 3.0, 4.0])
            .into_detection()
            .unwrap();
        assert_eq!(detection.label, "mug");
    }

    #[test]
    fn test_unlabelled_detection_dropped() {
        assert!(wire(None, None, 0.9, [1.0, 2.0, 3.0, 4.0]).into_detection().is_none());
        assert!(wire(None, Some(500), 0.9, [1.0, 2.0, 3.0, 4.0]).into_detection().is_none());
    }

    #[test]
    fn test_filter_detections() {
        let raw = vec![
            wire(Some("cup"), None, 0.8, [10.0, 10.0, 50.0, 50.0]),
            wire(Some("cup"), None, 0.1, [10.0, 10.0, 50.0, 50.0]),
            wire(Some("cup"), None, f32::NAN, [10.0, 10.0, 50.0, 50.0]),
            wire(Some("cup"), None, 0.9, [50.0, 10.0, 10.0, 50.0]),
            wire(None, Some(32), 0.5, [0.0, 0.0, 5.0, 5.0]),
        ];
        let kept = filter_detections(raw, 0.2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].label, "cup");
        assert_eq!(kept[1].label, "sports ball");
    }

    #[test]
    fn test_response_parsing() {
        let body: DetectResponse = serde_json::from_str(
            r#"{"detections": [
                {"label": "cup", "confidence": 0.7, "bbox": [1, 2, 3, 4]},
                {"class_id": 0, "confidence": 0.5, "xyxy": [5, 6, 7, 8]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(body.detections.len(), 2);
        assert_eq!(body.detections[1].bbox, [5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_detector_bad_endpoint() {
        let config = DetectorConfig {
            endpoint: "::nope".to_string(),
            ..DetectorConfig::default()
        };
        assert!(matches!(HttpDetector::new(&config), Err(VisionError::Config(_))));
    }
}
