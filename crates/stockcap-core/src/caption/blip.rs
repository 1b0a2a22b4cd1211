//! BLIP ONNX sessions: vision encoder and text decoder.
//!
//! The decoder is exported without a KV cache, so every generation step
//! re-feeds the full prefix together with the image features.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;

/// Image features produced by the vision encoder.
#[derive(Debug, Clone)]
pub struct ImageFeatures {
    /// [1, num_patches, hidden_dim]
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl ImageFeatures {
    /// Features repeated `batch` times along the leading axis.
    fn repeated(&self, batch: usize) -> (Vec<i64>, Vec<f32>) {
        let mut shape: Vec<i64> = self.shape.iter().map(|&d| d as i64).collect();
        shape[0] = batch as i64;
        let mut data = Vec::with_capacity(self.data.len() * batch);
        for _ in 0..batch {
            data.extend_from_slice(&self.data);
        }
        (shape, data)
    }
}

fn load_session(model_path: &Path) -> Result<Session, PipelineError> {
    if !model_path.exists() {
        return Err(PipelineError::Model {
            message: format!(
                "Captioning model not found at {:?}. Run `stockcap models download` first.",
                model_path
            ),
        });
    }

    Session::builder()
        .map_err(|e| PipelineError::Model {
            message: format!("Failed to create ONNX session builder: {e}"),
        })?
        .commit_from_file(model_path)
        .map_err(|e| PipelineError::Model {
            message: format!("Failed to load ONNX model {:?}: {e}", model_path),
        })
}

/// Wraps the BLIP vision encoder session.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct VisionEncoder {
    session: Mutex<Session>,
    input_name: String,
}

impl VisionEncoder {
    pub fn load(model_path: &Path) -> Result<Self, PipelineError> {
        let session = load_session(model_path)?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        tracing::debug!(
            "Loaded BLIP vision encoder from {:?} (input: {:?})",
            model_path,
            input_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }

    /// Encode a preprocessed [1, 3, H, W] tensor into patch features.
    pub fn encode(
        &self,
        pixel_values: &Array4<f32>,
        path: &Path,
    ) -> Result<ImageFeatures, PipelineError> {
        let shape: Vec<i64> = pixel_values.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = pixel_values.iter().copied().collect();

        let input_value =
            Value::from_array((shape, flat_data)).map_err(|e| PipelineError::Caption {
                path: path.to_path_buf(),
                message: format!("Failed to create pixel tensor: {e}"),
            })?;

        let mut session = self.session.lock().map_err(|e| PipelineError::Caption {
            path: path.to_path_buf(),
            message: format!("Vision session lock poisoned: {e}"),
        })?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .map_err(|e| PipelineError::Caption {
                path: path.to_path_buf(),
                message: format!("Vision encoder inference failed: {e}"),
            })?;

        let hidden = outputs
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| outputs.iter().next())
            .ok_or_else(|| PipelineError::Caption {
                path: path.to_path_buf(),
                message: "Vision encoder produced no outputs".to_string(),
            })?;

        let (shape, data) =
            hidden
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::Caption {
                    path: path.to_path_buf(),
                    message: format!("Failed to extract image features: {e}"),
                })?;

        if shape.len() != 3 {
            return Err(PipelineError::Caption {
                path: path.to_path_buf(),
                message: format!("Unexpected image feature shape: {:?}", shape),
            });
        }

        Ok(ImageFeatures {
            shape: shape.iter().map(|&d| d as usize).collect(),
            data: data.to_vec(),
        })
    }
}

/// Wraps the BLIP text decoder session.
pub struct TextDecoder {
    session: Mutex<Session>,
}

impl TextDecoder {
    pub fn load(model_path: &Path) -> Result<Self, PipelineError> {
        let session = load_session(model_path)?;

        tracing::debug!(
            "Loaded BLIP text decoder from {:?} (inputs: {:?})",
            model_path,
            session
                .inputs()
                .iter()
                .map(|i| i.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Next-token logits for every sequence in `sequences`.
    ///
    /// All sequences must share the same length.
    pub fn next_token_logits(
        &self,
        sequences: &[Vec<i64>],
        features: &ImageFeatures,
        path: &Path,
    ) -> Result<Vec<Vec<f32>>, PipelineError> {
        let batch = sequences.len();
        let seq_len = sequences.first().map(|s| s.len()).unwrap_or(0);
        if batch == 0 || seq_len == 0 {
            return Ok(vec![]);
        }

        let input_ids: Vec<i64> = sequences.iter().flatten().copied().collect();
        let attention_mask = vec![1i64; batch * seq_len];
        let (feature_shape, feature_data) = features.repeated(batch);
        let ids_shape = vec![batch as i64, seq_len as i64];

        let to_caption_err = |message: String| PipelineError::Caption {
            path: path.to_path_buf(),
            message,
        };

        let ids_value = Value::from_array((ids_shape.clone(), input_ids))
            .map_err(|e| to_caption_err(format!("Failed to create input_ids tensor: {e}")))?;
        let mask_value = Value::from_array((ids_shape, attention_mask))
            .map_err(|e| to_caption_err(format!("Failed to create attention_mask tensor: {e}")))?;
        let features_value = Value::from_array((feature_shape, feature_data)).map_err(|e| {
            to_caption_err(format!("Failed to create encoder_hidden_states tensor: {e}"))
        })?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| to_caption_err(format!("Decoder session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => ids_value,
                "attention_mask" => mask_value,
                "encoder_hidden_states" => features_value,
            ])
            .map_err(|e| to_caption_err(format!("Text decoder inference failed: {e}")))?;

        let logits = outputs
            .iter()
            .find(|(name, _)| *name == "logits")
            .or_else(|| outputs.iter().next())
            .ok_or_else(|| to_caption_err("Text decoder produced no outputs".to_string()))?;

        let (shape, data) = logits
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| to_caption_err(format!("Failed to extract logits: {e}")))?;

        if shape.len() != 3 {
            return Err(to_caption_err(format!(
                "Unexpected logits shape: {:?}",
                shape
            )));
        }
        let time = shape[1] as usize;
        let vocab = shape[2] as usize;

        Ok(last_position_rows(data, batch, time, vocab))
    }
}

/// Slice the final time step out of a flat [batch, time, vocab] buffer.
fn last_position_rows(data: &[f32], batch: usize, time: usize, vocab: usize) -> Vec<Vec<f32>> {
    (0..batch)
        .map(|b| {
            let start = (b * time + time - 1) * vocab;
            data[start..start + vocab].to_vec()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_repeated_along_batch() {
        let features = ImageFeatures {
            shape: vec![1, 2, 2],
            data: vec![1.0, 2.0, 3.0, 4.0],
        };
        let (shape, data) = features.repeated(3);
        assert_eq!(shape, vec![3, 2, 2]);
        assert_eq!(data.len(), 12);
        assert_eq!(&data[8..], &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_last_position_rows() {
        // batch 2, time 2, vocab 3
        let data = [
            0.0, 0.0, 0.0, 1.0, 2.0, 3.0, // batch 0
            9.0, 9.0, 9.0, 4.0, 5.0, 6.0, // batch 1
        ];
        let rows = last_position_rows(&data, 2, 2, 3);
        assert_eq!(rows, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_missing_model_reports_download_hint() {
        let err = VisionEncoder::load(Path::new("/nonexistent/vision_model.onnx"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("models download"));
    }
}
