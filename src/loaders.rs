use std::path::{Path, PathBuf};

use hf_hub::api::sync::{Api, ApiRepo};
use hf_hub::{Repo, RepoType};
use tokenizers::models::bpe::BPE;
use tokenizers::pre_tokenizers::byte_level::ByteLevel;
use tokenizers::processors::roberta::RobertaProcessing;
use tokenizers::{Tokenizer, TruncationParams};

use crate::error::{PipelineError, Result};

/// A repository on the Hugging Face hub, pinned to an optional revision.
#[derive(Debug, Clone)]
pub struct HfRepo {
    pub id: String,
    pub repo_type: RepoType,
    pub revision: Option<String>,
}

impl HfRepo {
    pub fn model(id: &str) -> Self {
        Self {
            id: id.into(),
            repo_type: RepoType::Model,
            revision: None,
        }
    }

    pub fn dataset(id: &str) -> Self {
        Self {
            id: id.into(),
            repo_type: RepoType::Dataset,
            revision: None,
        }
    }

    pub fn with_revision(mut self, revision: &str) -> Self {
        self.revision = Some(revision.into());
        self
    }

    fn api_repo(&self) -> Result<ApiRepo> {
        let api = Api::new().map_err(|e| {
            PipelineError::ResourceUnavailable(format!(
                "Failed to initialize HuggingFace API: {e}"
            ))
        })?;
        let repo = match &self.revision {
            Some(rev) => {
                Repo::with_revision(self.id.clone(), self.repo_type.clone(), rev.clone())
            }
            None => Repo::new(self.id.clone(), self.repo_type.clone()),
        };
        Ok(api.repo(repo))
    }

    fn describe(&self) -> String {
        match &self.revision {
            Some(rev) => format!("{}@{}", self.id, rev),
            None => self.id.clone(),
        }
    }

    /// Lists every file path in the repository.
    pub fn list_files(&self) -> Result<Vec<String>> {
        let info = self.api_repo()?.info().map_err(|e| {
            PipelineError::ResourceUnavailable(format!(
                "Failed to resolve '{}' on the hub: {e}",
                self.describe()
            ))
        })?;
        Ok(info.siblings.into_iter().map(|s| s.rfilename).collect())
    }

    /// Downloads a file (or reuses the local hub cache) and returns its path.
    pub fn get(&self, filename: &str) -> Result<PathBuf> {
        tracing::debug!(repo = %self.describe(), filename, "fetching hub file");
        self.api_repo()?.get(filename).map_err(|e| {
            PipelineError::ResourceUnavailable(format!(
                "Failed to download '{}' from '{}': {}",
                filename,
                self.describe(),
                e
            ))
        })
    }

    /// Downloads the first of `candidates` that exists in the repository.
    pub fn get_first(&self, candidates: &[&str]) -> Result<PathBuf> {
        let repo = self.api_repo()?;
        let mut last_error = None;
        for filename in candidates {
            match repo.get(filename) {
                Ok(path) => return Ok(path),
                Err(e) => last_error = Some(e.to_string()),
            }
        }
        Err(PipelineError::ResourceUnavailable(format!(
            "None of [{}] could be downloaded from '{}': {}",
            candidates.join(", "),
            self.describe(),
            last_error.unwrap_or_else(|| "no candidates".into())
        )))
    }
}

/// Longest token sequence a RoBERTa-base encoder accepts (514 positions minus padding offset).
const ROBERTA_MAX_TOKENS: usize = 512;

#[derive(Clone)]
pub struct TokenizerLoader {
    pub repo: HfRepo,
}

impl TokenizerLoader {
    pub fn new(repo: HfRepo) -> Self {
        Self { repo }
    }

    /// Loads `tokenizer.json`, or assembles a RoBERTa byte-level BPE tokenizer from
    /// `vocab.json` + `merges.txt` for older repos that never shipped one.
    pub fn load(&self) -> Result<Tokenizer> {
        let mut tokenizer = match self.repo.get("tokenizer.json") {
            Ok(path) => {
                let path_str = path.display().to_string();
                Tokenizer::from_file(&path).map_err(|e| {
                    PipelineError::Tokenization(format!(
                        "Failed to load tokenizer from '{}': {}",
                        path_str, e
                    ))
                })?
            }
            Err(_) => {
                tracing::debug!(
                    repo = %self.repo.id,
                    "no tokenizer.json, building from vocab.json + merges.txt"
                );
                let vocab = self.repo.get("vocab.json")?;
                let merges = self.repo.get("merges.txt")?;
                roberta_bpe_tokenizer(&vocab, &merges)?
            }
        };

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: ROBERTA_MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| {
                PipelineError::Tokenization(format!("Failed to configure truncation: {e}"))
            })?;
        tokenizer.with_padding(None);

        Ok(tokenizer)
    }
}

pub(crate) fn roberta_bpe_tokenizer(vocab: &Path, merges: &Path) -> Result<Tokenizer> {
    let vocab_str = vocab.display().to_string();
    let merges_str = merges.display().to_string();

    let bpe = BPE::from_file(&vocab_str, &merges_str)
        .build()
        .map_err(|e| {
            PipelineError::Tokenization(format!(
                "Failed to build BPE from '{}' and '{}': {}",
                vocab_str, merges_str, e
            ))
        })?;

    let mut tokenizer = Tokenizer::new(bpe);

    let special_id = |token: &str| {
        tokenizer.token_to_id(token).ok_or_else(|| {
            PipelineError::Tokenization(format!("Vocabulary '{vocab_str}' has no '{token}' token"))
        })
    };
    let cls = special_id("<s>")?;
    let sep = special_id("</s>")?;

    tokenizer
        .with_pre_tokenizer(Some(ByteLevel::new(false, true, true)))
        .with_decoder(Some(ByteLevel::new(false, true, true)))
        .with_post_processor(Some(RobertaProcessing::new(
            ("</s>".to_string(), sep),
            ("<s>".to_string(), cls),
        )));

    Ok(tokenizer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tiny_vocab(dir: &Path) -> (PathBuf, PathBuf) {
        let vocab_path = dir.join("vocab.json");
        let merges_path = dir.join("merges.txt");

        let vocab = serde_json::json!({
            "<s>": 0, "<pad>": 1, "</s>": 2, "<unk>": 3,
            "h": 4, "i": 5, "hi": 6, "Ġ": 7, "Ġhi": 8
        });
        std::fs::write(&vocab_path, vocab.to_string()).unwrap();

        let mut merges = std::fs::File::create(&merges_path).unwrap();
        writeln!(merges, "#version: 0.2").unwrap();
        writeln!(merges, "h i").unwrap();
        writeln!(merges, "Ġ hi").unwrap();

        (vocab_path, merges_path)
    }

    #[test]
    fn roberta_tokenizer_wraps_input_in_special_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let (vocab, merges) = write_tiny_vocab(dir.path());

        let tokenizer = roberta_bpe_tokenizer(&vocab, &merges).unwrap();
        let encoding = tokenizer.encode("hi hi", true).unwrap();

        assert_eq!(encoding.get_ids(), &[0, 6, 8, 2]);
    }

    #[test]
    fn roberta_tokenizer_requires_special_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let vocab_path = dir.path().join("vocab.json");
        let merges_path = dir.path().join("merges.txt");
        std::fs::write(&vocab_path, r#"{"h": 0, "i": 1}"#).unwrap();
        std::fs::write(&merges_path, "#version: 0.2\n").unwrap();

        let err = roberta_bpe_tokenizer(&vocab_path, &merges_path).unwrap_err();
        assert!(matches!(err, PipelineError::Tokenization(_)));
    }

    #[test]
    fn repo_description_includes_revision() {
        let repo = HfRepo::dataset("org/data").with_revision("refs/convert/parquet");
        assert_eq!(repo.describe(), "org/data@refs/convert/parquet");
        assert_eq!(HfRepo::model("org/model").describe(), "org/model");
    }
}
