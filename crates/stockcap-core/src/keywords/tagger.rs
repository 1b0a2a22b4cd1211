//! BERT token-classification POS tagger on ONNX Runtime.
//!
//! The model tags word pieces; pieces are merged back into words through the
//! tokenizer's word ids and each word takes the label of its first piece.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;
use serde::Deserialize;

use crate::config::KeywordsConfig;
use crate::error::{PipelineError, PipelineResult};

use super::pos::{PosTag, PosTagger, TaggedToken};
use super::stopwords::StopWords;

pub const TAGGER_MODEL_FILENAME: &str = "model.onnx";
pub const TAGGER_TOKENIZER_FILENAME: &str = "tokenizer.json";
pub const TAGGER_CONFIG_FILENAME: &str = "config.json";

#[derive(Debug, Deserialize)]
struct LabelConfig {
    id2label: HashMap<String, String>,
}

/// Parse `id2label` from a Hugging Face `config.json` into a dense table.
fn parse_labels(json: &str) -> PipelineResult<Vec<PosTag>> {
    let config: LabelConfig = serde_json::from_str(json).map_err(|e| PipelineError::Model {
        message: format!("Invalid tagger config.json: {e}"),
    })?;

    // Ids index the classifier output, so they must fall in 0..len.
    let size = config.id2label.len();
    let mut labels = vec![PosTag::X; size];
    for (raw, label) in &config.id2label {
        let id: usize = raw.parse().map_err(|_| PipelineError::Model {
            message: format!("Non-numeric label id in tagger config: {raw:?}"),
        })?;
        if id >= size {
            return Err(PipelineError::Model {
                message: format!("Label id {id} out of range for {size} labels in tagger config"),
            });
        }
        labels[id] = PosTag::from_label(label);
    }
    Ok(labels)
}

/// Group word pieces into words.
///
/// Returns `(first_piece_index, byte_start, byte_end)` for each word, in
/// sentence order. Special tokens (no word id) are skipped.
fn group_words(word_ids: &[Option<u32>], offsets: &[(usize, usize)]) -> Vec<(usize, usize, usize)> {
    let mut words: Vec<(usize, usize, usize)> = Vec::new();
    let mut current: Option<u32> = None;

    for (idx, word_id) in word_ids.iter().enumerate() {
        let Some(word_id) = *word_id else {
            current = None;
            continue;
        };
        let (start, end) = offsets.get(idx).copied().unwrap_or((0, 0));
        if current == Some(word_id) {
            if let Some(last) = words.last_mut() {
                last.2 = last.2.max(end);
            }
        } else {
            words.push((idx, start, end));
            current = Some(word_id);
        }
    }
    words
}

fn argmax(row: &[f32]) -> usize {
    row.iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// POS tagger backed by a BERT token-classification model.
pub struct OnnxPosTagger {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    labels: Vec<PosTag>,
    needs_token_type_ids: bool,
    max_sequence_length: usize,
    stop_words: &'static StopWords,
}

impl OnnxPosTagger {
    /// Load `model.onnx`, `tokenizer.json` and `config.json` from `model_dir`.
    pub fn load(config: &KeywordsConfig, model_dir: &Path) -> PipelineResult<Self> {
        for path in Self::model_files(model_dir) {
            if !path.exists() {
                return Err(PipelineError::Model {
                    message: format!(
                        "POS tagger file not found at {:?}. Run `stockcap models download` first.",
                        path
                    ),
                });
            }
        }

        let config_json = std::fs::read_to_string(model_dir.join(TAGGER_CONFIG_FILENAME))
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to read tagger config.json: {e}"),
            })?;
        let labels = parse_labels(&config_json)?;

        let tokenizer = tokenizers::Tokenizer::from_file(model_dir.join(TAGGER_TOKENIZER_FILENAME))
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to load tagger tokenizer: {e}"),
            })?;

        let session = Session::builder()
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_dir.join(TAGGER_MODEL_FILENAME))
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to load POS tagger model: {e}"),
            })?;

        let needs_token_type_ids = session
            .inputs()
            .iter()
            .any(|i| i.name() == "token_type_ids");

        tracing::debug!(
            "Loaded POS tagger from {:?} ({} labels, token_type_ids: {})",
            model_dir,
            labels.len(),
            needs_token_type_ids
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
            needs_token_type_ids,
            max_sequence_length: config.max_sequence_length,
            stop_words: StopWords::english(),
        })
    }

    /// Expected model file paths.
    pub fn model_files(model_dir: &Path) -> Vec<PathBuf> {
        [
            TAGGER_MODEL_FILENAME,
            TAGGER_TOKENIZER_FILENAME,
            TAGGER_CONFIG_FILENAME,
        ]
        .iter()
        .map(|name| model_dir.join(name))
        .collect()
    }

    pub fn model_exists(model_dir: &Path) -> bool {
        Self::model_files(model_dir).iter().all(|p| p.exists())
    }

    fn label_for(&self, row: &[f32]) -> PosTag {
        self.labels.get(argmax(row)).copied().unwrap_or(PosTag::X)
    }
}

impl PosTagger for OnnxPosTagger {
    fn tag(&self, text: &str) -> PipelineResult<Vec<TaggedToken>> {
        if text.trim().is_empty() {
            return Ok(vec![]);
        }

        let model_err = |message: String| PipelineError::Model { message };

        let mut encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| model_err(format!("Tagger tokenization failed: {e}")))?;
        encoding.truncate(
            self.max_sequence_length,
            0,
            tokenizers::TruncationDirection::Right,
        );

        let seq_len = encoding.get_ids().len();
        let shape = vec![1i64, seq_len as i64];
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();

        let ids_value = Value::from_array((shape.clone(), ids))
            .map_err(|e| model_err(format!("Failed to create input_ids tensor: {e}")))?;
        let mask_value = Value::from_array((shape.clone(), mask))
            .map_err(|e| model_err(format!("Failed to create attention_mask tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| model_err(format!("Tagger session lock poisoned: {e}")))?;

        let outputs = if self.needs_token_type_ids {
            let type_value = Value::from_array((shape, type_ids))
                .map_err(|e| model_err(format!("Failed to create token_type_ids tensor: {e}")))?;
            session.run(ort::inputs![
                "input_ids" => ids_value,
                "attention_mask" => mask_value,
                "token_type_ids" => type_value,
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => ids_value,
                "attention_mask" => mask_value,
            ])
        }
        .map_err(|e| model_err(format!("POS tagger inference failed: {e}")))?;

        let logits = outputs
            .iter()
            .find(|(name, _)| *name == "logits")
            .or_else(|| outputs.iter().next())
            .ok_or_else(|| model_err("POS tagger produced no outputs".to_string()))?;

        let (logits_shape, data) = logits
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| model_err(format!("Failed to extract tagger logits: {e}")))?;
        if logits_shape.len() != 3 {
            return Err(model_err(format!(
                "Unexpected tagger logits shape: {:?}",
                logits_shape
            )));
        }
        let num_labels = logits_shape[2] as usize;

        let words = group_words(encoding.get_word_ids(), encoding.get_offsets());
        let tokens = words
            .into_iter()
            .filter_map(|(piece, start, end)| {
                let word = text.get(start..end)?;
                let row = data.get(piece * num_labels..(piece + 1) * num_labels)?;
                Some(TaggedToken::new(word, self.label_for(row), self.stop_words))
            })
            .collect();

        Ok(tokens)
    }
}
