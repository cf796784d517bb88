use candle_core::{DType, Device, Tensor, D};
use candle_nn::{ops::softmax, VarBuilder};
use candle_transformers::models::xlm_roberta::{
    Config, XLMRobertaForSequenceClassification as CandleRobertaForSequenceClassification,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokenizers::Tokenizer;

use crate::error::{PipelineError, Result};
use crate::loaders::{HfRepo, TokenizerLoader};
use crate::pipelines::sentiment::model::{SentimentAnalysisModel, SentimentResult};

/// Which RoBERTa classifier to load and how to name its classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobertaOptions {
    /// Hub repository id.
    pub model_id: String,
    /// Branch, tag or commit; `None` means `main`.
    pub revision: Option<String>,
    /// Class names in id order, used in place of generic `LABEL_<n>` names.
    pub labels: Option<Vec<String>>,
}

impl RobertaOptions {
    /// Options for an arbitrary hub model, labels taken from its config.
    pub fn new(model_id: &str) -> Self {
        Self {
            model_id: model_id.into(),
            revision: None,
            labels: None,
        }
    }

    /// `cardiffnlp/twitter-roberta-base-sentiment`, whose config only carries `LABEL_0..2`.
    pub fn twitter_sentiment() -> Self {
        Self {
            model_id: crate::DEFAULT_MODEL_ID.into(),
            revision: None,
            labels: Some(vec![
                "negative".into(),
                "neutral".into(),
                "positive".into(),
            ]),
        }
    }

    fn repo(&self) -> HfRepo {
        let repo = HfRepo::model(&self.model_id);
        match &self.revision {
            Some(rev) => repo.with_revision(rev),
            None => repo,
        }
    }
}

/// RoBERTa encoder with a sequence-classification head, run through Candle.
pub struct SentimentRobertaModel {
    model: CandleRobertaForSequenceClassification,
    device: Device,
    labels: Vec<String>,
    pad_token_id: u32,
}

impl SentimentRobertaModel {
    /// Downloads config and weights and loads them onto `device`.
    pub fn new(options: RobertaOptions, device: Device) -> Result<Self> {
        let repo = options.repo();

        let config_path = repo.get("config.json")?;
        let weights_path = repo.get_first(&["model.safetensors", "pytorch_model.bin"])?;

        let config_str = std::fs::read_to_string(&config_path)?;
        let config = parse_config(&config_str)?;
        let class_cfg: ClassifierConfigJson = serde_json::from_str(&config_str)?;
        let labels = resolve_labels(&class_cfg.id2label, options.labels.as_deref())?;

        let vb = load_weights(&weights_path, &device)?;
        let model = CandleRobertaForSequenceClassification::new(labels.len(), &config, vb)?;

        tracing::info!(
            model = %options.model_id,
            labels = ?labels,
            "sentiment model loaded"
        );

        Ok(Self {
            model,
            device,
            labels,
            pad_token_id: config.pad_token_id,
        })
    }

    fn label_for(&self, pred_id: usize) -> Result<String> {
        self.labels.get(pred_id).cloned().ok_or_else(|| {
            PipelineError::Unexpected(format!(
                "Predicted label ID {} not in id2label. Available: {}",
                pred_id,
                self.labels.join(", ")
            ))
        })
    }
}

impl SentimentAnalysisModel for SentimentRobertaModel {
    type Options = RobertaOptions;

    fn new(options: Self::Options, device: Device) -> Result<Self> {
        SentimentRobertaModel::new(options, device)
    }

    fn predict_with_score(&self, tokenizer: &Tokenizer, text: &str) -> Result<SentimentResult> {
        self.predict_with_score_batch(tokenizer, &[text])?
            .pop()
            .ok_or_else(|| PipelineError::Unexpected("Model returned no predictions".into()))?
    }

    fn predict_with_score_batch(
        &self,
        tokenizer: &Tokenizer,
        texts: &[&str],
    ) -> Result<Vec<Result<SentimentResult>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut encodings = Vec::with_capacity(texts.len());
        let mut error_results: Vec<Option<PipelineError>> =
            (0..texts.len()).map(|_| None).collect();

        for (i, text) in texts.iter().enumerate() {
            match tokenizer.encode(*text, true) {
                Ok(encoding) => encodings.push(Some(encoding)),
                Err(e) => {
                    error_results[i] = Some(PipelineError::Tokenization(format!(
                        "Tokenization failed on '{}': {}",
                        &text.chars().take(50).collect::<String>(),
                        e
                    )));
                    encodings.push(None);
                }
            }
        }

        let valid: Vec<(usize, &tokenizers::Encoding)> = encodings
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (i, e)))
            .collect();

        let mut results: Vec<Result<SentimentResult>> = error_results
            .into_iter()
            .map(|e| {
                Err(e.unwrap_or_else(|| {
                    PipelineError::Unexpected("Model returned no predictions".to_string())
                }))
            })
            .collect();

        if valid.is_empty() {
            return Ok(results);
        }

        let max_len = valid.iter().map(|(_, e)| e.len()).max().unwrap_or(0);

        let mut all_token_ids: Vec<u32> = Vec::with_capacity(valid.len() * max_len);
        let mut all_attention_masks: Vec<u32> = Vec::with_capacity(valid.len() * max_len);

        for (_, encoding) in &valid {
            let mut token_ids = encoding.get_ids().to_vec();
            let mut attention_mask = encoding.get_attention_mask().to_vec();
            token_ids.resize(max_len, self.pad_token_id);
            attention_mask.resize(max_len, 0);
            all_token_ids.extend(token_ids);
            all_attention_masks.extend(attention_mask);
        }

        let batch_size = valid.len();
        let input_ids = Tensor::from_vec(all_token_ids, (batch_size, max_len), &self.device)?;
        let attention_mask =
            Tensor::from_vec(all_attention_masks, (batch_size, max_len), &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let logits = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids)?;
        let probs = softmax(&logits, D::Minus1)?.to_vec2::<f32>()?;

        for ((orig_idx, _), row) in valid.iter().zip(probs) {
            results[*orig_idx] = top_class(&row)
                .ok_or_else(|| PipelineError::Unexpected("Model returned empty logits".into()))
                .and_then(|(pred_id, score)| {
                    Ok(SentimentResult {
                        label: self.label_for(pred_id)?,
                        score,
                    })
                });
        }

        Ok(results)
    }

    fn get_tokenizer(options: Self::Options) -> Result<Tokenizer> {
        TokenizerLoader::new(options.repo()).load()
    }
}

/// Index and probability of the most likely class.
fn top_class(probs: &[f32]) -> Option<(usize, f32)> {
    probs
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
}

fn load_weights(weights_path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let vb = if weights_path.extension().is_some_and(|e| e == "safetensors") {
        unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? }
    } else {
        VarBuilder::from_pth(weights_path, DType::F32, device)?
    };
    Ok(vb)
}

/// Parses a RoBERTa `config.json`, filling fields that older configs predate.
fn parse_config(config_str: &str) -> Result<Config> {
    let mut raw: serde_json::Value = serde_json::from_str(config_str)?;
    if let Some(obj) = raw.as_object_mut() {
        obj.entry("position_embedding_type")
            .or_insert_with(|| "absolute".into());
        obj.entry("type_vocab_size").or_insert_with(|| 1.into());
        obj.entry("pad_token_id").or_insert_with(|| 1.into());
    }
    Ok(serde_json::from_value(raw)?)
}

#[derive(Deserialize)]
struct ClassifierConfigJson {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

fn is_generic_label(name: &str) -> bool {
    name.strip_prefix("LABEL_")
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// Orders class names by id, replacing generic `LABEL_<n>` names with `overrides`.
fn resolve_labels(
    id2label: &HashMap<String, String>,
    overrides: Option<&[String]>,
) -> Result<Vec<String>> {
    let num_labels = if id2label.is_empty() {
        overrides.map(|o| o.len()).unwrap_or(0)
    } else {
        id2label.len()
    };
    if num_labels == 0 {
        return Err(PipelineError::Unexpected(
            "Model config has no id2label and no labels were configured".into(),
        ));
    }
    if let Some(overrides) = overrides {
        if overrides.len() != num_labels {
            return Err(PipelineError::Unexpected(format!(
                "Model has {num_labels} labels but {} label names were configured",
                overrides.len()
            )));
        }
    }

    (0..num_labels)
        .map(|id| {
            let from_config = id2label.get(&id.to_string());
            let from_override = overrides.and_then(|o| o.get(id));
            match (from_config, from_override) {
                (Some(name), Some(replacement)) if is_generic_label(name) => {
                    Ok(replacement.clone())
                }
                (Some(name), _) => Ok(name.clone()),
                (None, Some(replacement)) => Ok(replacement.clone()),
                (None, None) => Err(PipelineError::Unexpected(format!(
                    "id2label has no entry for id {id}"
                ))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id2label(names: &[&str]) -> HashMap<String, String> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| (i.to_string(), n.to_string()))
            .collect()
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn generic_labels_are_replaced_by_configured_names() {
        let config = id2label(&["LABEL_0", "LABEL_1", "LABEL_2"]);
        let names = strings(&["negative", "neutral", "positive"]);

        let labels = resolve_labels(&config, Some(&names)).unwrap();
        assert_eq!(labels, names);
    }

    #[test]
    fn meaningful_config_labels_win_over_overrides() {
        let config = id2label(&["neg", "pos"]);
        let names = strings(&["bad", "good"]);

        let labels = resolve_labels(&config, Some(&names)).unwrap();
        assert_eq!(labels, ["neg", "pos"]);
    }

    #[test]
    fn config_labels_are_used_without_overrides() {
        let config = id2label(&["LABEL_0", "LABEL_1"]);
        assert_eq!(resolve_labels(&config, None).unwrap(), ["LABEL_0", "LABEL_1"]);
    }

    #[test]
    fn overrides_fill_in_for_missing_id2label() {
        let names = strings(&["negative", "neutral", "positive"]);
        let labels = resolve_labels(&HashMap::new(), Some(&names)).unwrap();
        assert_eq!(labels, names);
    }

    #[test]
    fn label_count_mismatch_is_rejected() {
        let config = id2label(&["LABEL_0", "LABEL_1", "LABEL_2"]);
        let names = strings(&["bad", "good"]);
        assert!(resolve_labels(&config, Some(&names)).is_err());
        assert!(resolve_labels(&HashMap::new(), None).is_err());
    }

    #[test]
    fn generic_label_detection() {
        assert!(is_generic_label("LABEL_0"));
        assert!(is_generic_label("LABEL_12"));
        assert!(!is_generic_label("LABEL_"));
        assert!(!is_generic_label("positive"));
        assert!(!is_generic_label("LABEL_x"));
    }

    #[test]
    fn top_class_picks_highest_probability() {
        assert_eq!(top_class(&[0.1, 0.7, 0.2]), Some((1, 0.7)));
        assert_eq!(top_class(&[]), None);
    }

    #[test]
    fn old_configs_get_position_embedding_default() {
        let config = serde_json::json!({
            "attention_probs_dropout_prob": 0.1,
            "hidden_act": "gelu",
            "hidden_dropout_prob": 0.1,
            "hidden_size": 768,
            "intermediate_size": 3072,
            "layer_norm_eps": 1e-05,
            "max_position_embeddings": 514,
            "num_attention_heads": 12,
            "num_hidden_layers": 12,
            "pad_token_id": 1,
            "type_vocab_size": 1,
            "vocab_size": 50265,
            "id2label": {"0": "LABEL_0", "1": "LABEL_1", "2": "LABEL_2"}
        });

        let parsed = parse_config(&config.to_string()).unwrap();
        assert_eq!(parsed.position_embedding_type, "absolute");
        assert_eq!(parsed.pad_token_id, 1);
        assert_eq!(parsed.hidden_size, 768);
    }

    #[test]
    fn twitter_preset_names_three_classes() {
        let options = RobertaOptions::twitter_sentiment();
        assert_eq!(options.model_id, "cardiffnlp/twitter-roberta-base-sentiment");
        assert_eq!(options.labels.as_ref().map(Vec::len), Some(3));
        assert_eq!(options.repo().revision, None);
    }
}
