//! Where split files come from: the Hugging Face hub or a local directory.

use std::path::{Path, PathBuf};

use super::splits::{split_files, DataFormat};
use super::table::SplitTable;
use crate::error::{PipelineError, Result};
use crate::loaders::HfRepo;

/// Hub revision holding the auto-converted Parquet copy of a dataset.
const PARQUET_CONVERSION_REVISION: &str = "refs/convert/parquet";

/// Resolves split names to in-memory tables.
pub trait DatasetSource {
    /// Human-readable identifier used in logs and reports.
    fn describe(&self) -> String;

    /// Fetches and parses every file of `split`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ResourceUnavailable`] if the dataset or split cannot be found or
    /// downloaded.
    fn load_split(&self, split: &str) -> Result<SplitTable>;
}

/// A dataset repository on the Hugging Face hub.
#[derive(Debug, Clone)]
pub struct HubDataset {
    repo: HfRepo,
}

impl HubDataset {
    /// Dataset `id` at its default branch.
    pub fn new(id: &str) -> Self {
        Self {
            repo: HfRepo::dataset(id),
        }
    }

    /// Pins the dataset to a branch, tag or commit.
    pub fn with_revision(mut self, revision: &str) -> Self {
        self.repo = self.repo.with_revision(revision);
        self
    }

    /// Hub repository id.
    pub fn id(&self) -> &str {
        &self.repo.id
    }

    fn matching_files(repo: &HfRepo, split: &str) -> Result<Vec<String>> {
        let files = repo.list_files()?;
        Ok(split_files(&files, split)
            .into_iter()
            .map(str::to_string)
            .collect())
    }
}

impl DatasetSource for HubDataset {
    fn describe(&self) -> String {
        match &self.repo.revision {
            Some(rev) => format!("{}@{}", self.repo.id, rev),
            None => self.repo.id.clone(),
        }
    }

    fn load_split(&self, split: &str) -> Result<SplitTable> {
        let mut repo = self.repo.clone();
        let mut files = Self::matching_files(&repo, split)?;

        if files.is_empty() && repo.revision.is_none() {
            tracing::debug!(
                dataset = %repo.id,
                split,
                "no split files on main, trying the parquet conversion"
            );
            let converted = repo.clone().with_revision(PARQUET_CONVERSION_REVISION);
            if let Ok(converted_files) = Self::matching_files(&converted, split) {
                files = converted_files;
                repo = converted;
            }
        }

        if files.is_empty() {
            return Err(PipelineError::ResourceUnavailable(format!(
                "Dataset '{}' has no data files for split '{}'",
                self.describe(),
                split
            )));
        }

        let mut downloaded = Vec::with_capacity(files.len());
        for file in &files {
            let format = DataFormat::from_path(file).ok_or_else(|| {
                PipelineError::Unexpected(format!("Unsupported data file '{file}'"))
            })?;
            downloaded.push((repo.get(file)?, format));
        }

        let table = SplitTable::from_files(split, &downloaded)?;
        tracing::info!(
            dataset = %self.describe(),
            split,
            files = files.len(),
            rows = table.num_rows(),
            "split loaded"
        );
        Ok(table)
    }
}

/// A directory laid out like a dataset repository (`test.jsonl`, `data/train-*.parquet`, ...).
#[derive(Debug, Clone)]
pub struct LocalDataset {
    root: PathBuf,
}

impl LocalDataset {
    /// Dataset rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every file below the root as a `/`-separated relative path.
    fn list_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let entries = std::fs::read_dir(&dir).map_err(|e| {
                PipelineError::ResourceUnavailable(format!(
                    "Failed to read dataset directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
            for entry in entries {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                } else if let Ok(relative) = path.strip_prefix(&self.root) {
                    let parts: Vec<_> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect();
                    files.push(parts.join("/"));
                }
            }
        }

        Ok(files)
    }
}

impl DatasetSource for LocalDataset {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn load_split(&self, split: &str) -> Result<SplitTable> {
        let files = self.list_files()?;
        let matched = split_files(&files, split);
        if matched.is_empty() {
            return Err(PipelineError::ResourceUnavailable(format!(
                "Dataset '{}' has no data files for split '{}'",
                self.describe(),
                split
            )));
        }

        let located: Vec<(PathBuf, DataFormat)> = matched
            .iter()
            .filter_map(|f| DataFormat::from_path(f).map(|format| (self.root.join(f), format)))
            .collect();

        let table = SplitTable::from_files(split, &located)?;
        tracing::info!(
            dataset = %self.describe(),
            split,
            files = located.len(),
            rows = table.num_rows(),
            "split loaded"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_dataset_finds_nested_split_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(
            dir.path().join("data/train-00000-of-00002.jsonl"),
            "{\"text\": \"a\", \"label\": 1}\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("data/train-00001-of-00002.jsonl"),
            "{\"text\": \"b\", \"label\": 0}\n{\"text\": \"c\", \"label\": 2}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "# card").unwrap();

        let source = LocalDataset::new(dir.path());
        let mut files = source.list_files().unwrap();
        files.sort();
        assert_eq!(
            files,
            [
                "README.md",
                "data/train-00000-of-00002.jsonl",
                "data/train-00001-of-00002.jsonl",
            ]
        );

        let table = source.load_split("train").unwrap();
        assert_eq!(table.name(), "train");
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.num_columns(), 2);
    }

    #[test]
    fn missing_split_is_resource_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("train.jsonl"), "{\"text\": \"a\"}\n").unwrap();

        let err = LocalDataset::new(dir.path()).load_split("test").unwrap_err();
        assert!(matches!(err, PipelineError::ResourceUnavailable(_)));
    }

    #[test]
    fn missing_directory_is_resource_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocalDataset::new(dir.path().join("nope"));
        assert!(matches!(
            source.load_split("train"),
            Err(PipelineError::ResourceUnavailable(_))
        ));
    }

    #[test]
    fn hub_dataset_description_includes_revision() {
        let source = HubDataset::new("mteb/tweet_sentiment_extraction").with_revision("main");
        assert_eq!(source.id(), "mteb/tweet_sentiment_extraction");
        assert_eq!(source.describe(), "mteb/tweet_sentiment_extraction@main");
    }
}
