use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::PredictConfig;

/// One detected finding: class label, confidence and the bounding box as
/// `[x_center, y_center, width, height]` normalized to the image size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

/// The pretrained detection models, treated as an opaque capability.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn infer(&self, image: Bytes) -> anyhow::Result<Vec<Detection>>;
}

/// Forwards the raw image bytes to the model inference sidecar and decodes
/// its JSON detection list.
#[derive(Clone)]
pub struct HttpPredictor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPredictor {
    pub fn new(config: &PredictConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    async fn infer(&self, image: Bytes) -> anyhow::Result<Vec<Detection>> {
        let detections = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .context("inference request")?
            .error_for_status()
            .context("inference response status")?
            .json::<Vec<Detection>>()
            .await
            .context("decode inference response")?;
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_decodes_from_sidecar_json() {
        let raw = r#"[{"label":"pneumonia","confidence":0.91,"bbox":[0.5,0.4,0.2,0.3]}]"#;
        let detections: Vec<Detection> = serde_json::from_str(raw).expect("decode");
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, "pneumonia");
        assert!((detections[0].confidence - 0.91).abs() < f32::EPSILON);
        assert_eq!(detections[0].bbox, [0.5, 0.4, 0.2, 0.3]);
    }
}
