//! Which repository files hold which split.

use std::path::Path;

/// On-disk encodings a split can be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// Apache Parquet.
    Parquet,
    /// Newline-delimited JSON objects.
    JsonLines,
    /// A `.json` file: either one top-level array of objects or newline-delimited objects.
    Json,
    /// Comma-separated values with a header row.
    Csv,
}

impl DataFormat {
    /// Detects the format from a file extension, `None` for non-data files.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "parquet" | "pq" => Some(DataFormat::Parquet),
            "jsonl" | "ndjson" => Some(DataFormat::JsonLines),
            "json" => Some(DataFormat::Json),
            "csv" => Some(DataFormat::Csv),
            _ => None,
        }
    }
}

/// Tie-break order when a split ships in several formats.
const FORMAT_PREFERENCE: [DataFormat; 4] = [
    DataFormat::Parquet,
    DataFormat::JsonLines,
    DataFormat::Json,
    DataFormat::Csv,
];

/// Words that name `split` in file and directory names.
fn split_keywords(split: &str) -> Vec<String> {
    let split = split.to_ascii_lowercase();
    let aliases: &[&str] = match split.as_str() {
        "train" => &["train", "training"],
        "test" => &["test", "testing", "eval", "evaluation"],
        "validation" => &["validation", "valid", "val", "dev"],
        _ => &[],
    };
    if aliases.is_empty() {
        vec![split]
    } else {
        aliases.iter().map(|a| a.to_string()).collect()
    }
}

/// Alphabetic words of a path with its extension removed.
///
/// `data/train-00000-of-00001.parquet` → `["data", "train", "of"]`.
fn path_words(path: &str) -> Vec<String> {
    let stem = match path.rfind('.') {
        Some(dot) if !path[dot..].contains('/') => &path[..dot],
        _ => path,
    };
    stem.to_ascii_lowercase()
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether the file at `path` is a data file belonging to `split`.
pub fn matches_split(path: &str, split: &str) -> bool {
    if DataFormat::from_path(path).is_none() {
        return false;
    }
    let keywords = split_keywords(split);
    path_words(path).iter().any(|w| keywords.contains(w))
}

/// Data files of `split` among `files`, in sorted path order.
///
/// A split published in several formats (e.g. `test.jsonl` next to a converted
/// `data/test.csv`) holds the same rows twice, so only one format is kept: Parquet when
/// present, otherwise the format with the most files.
pub fn split_files<'a>(files: &'a [String], split: &str) -> Vec<&'a str> {
    let matched: Vec<(&str, DataFormat)> = files
        .iter()
        .filter(|f| matches_split(f, split))
        .filter_map(|f| DataFormat::from_path(f).map(|format| (f.as_str(), format)))
        .collect();

    let Some(format) = preferred_format(&matched) else {
        return Vec::new();
    };

    let (kept, skipped): (Vec<_>, Vec<_>) =
        matched.into_iter().partition(|(_, f)| *f == format);
    if !skipped.is_empty() {
        tracing::debug!(
            split,
            ?format,
            skipped = ?skipped.iter().map(|(path, _)| *path).collect::<Vec<_>>(),
            "split available in several formats, ignoring the others"
        );
    }

    let mut kept: Vec<&str> = kept.into_iter().map(|(path, _)| path).collect();
    kept.sort_unstable();
    kept
}

fn preferred_format(matched: &[(&str, DataFormat)]) -> Option<DataFormat> {
    let count = |format: DataFormat| matched.iter().filter(|(_, f)| *f == format).count();
    if count(DataFormat::Parquet) > 0 {
        return Some(DataFormat::Parquet);
    }
    // max_by_key keeps the last maximum, so walk the preference list backwards.
    FORMAT_PREFERENCE
        .iter()
        .rev()
        .copied()
        .filter(|f| count(*f) > 0)
        .max_by_key(|f| count(*f))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn detects_formats_by_extension() {
        assert_eq!(DataFormat::from_path("a/test.jsonl"), Some(DataFormat::JsonLines));
        assert_eq!(DataFormat::from_path("a/test.json"), Some(DataFormat::Json));
        assert_eq!(DataFormat::from_path("train.PARQUET"), Some(DataFormat::Parquet));
        assert_eq!(DataFormat::from_path("x.csv"), Some(DataFormat::Csv));
        assert_eq!(DataFormat::from_path("README.md"), None);
        assert_eq!(DataFormat::from_path("train"), None);
    }

    #[test]
    fn top_level_split_files_match() {
        let repo = files(&["README.md", ".gitattributes", "test.jsonl", "train.jsonl"]);
        assert_eq!(split_files(&repo, "test"), ["test.jsonl"]);
        assert_eq!(split_files(&repo, "train"), ["train.jsonl"]);
    }

    #[test]
    fn sharded_and_nested_layouts_match_in_order() {
        let repo = files(&[
            "data/train-00001-of-00002.parquet",
            "data/test-00000-of-00001.parquet",
            "data/train-00000-of-00002.parquet",
            "default/train/0000.parquet",
        ]);
        assert_eq!(
            split_files(&repo, "train"),
            [
                "data/train-00000-of-00002.parquet",
                "data/train-00001-of-00002.parquet",
                "default/train/0000.parquet",
            ]
        );
        assert_eq!(split_files(&repo, "test"), ["data/test-00000-of-00001.parquet"]);
    }

    #[test]
    fn aliases_and_word_boundaries() {
        assert!(matches_split("eval.csv", "test"));
        assert!(matches_split("dev/part.jsonl", "validation"));
        assert!(!matches_split("contest.jsonl", "test"));
        assert!(!matches_split("trainer_notes.csv", "train"));
        assert!(matches_split("extra_split.jsonl", "extra"));
        assert!(!matches_split("train.py", "train"));
    }

    #[test]
    fn one_format_per_split() {
        let repo = files(&["test.jsonl", "data/test.csv", "train.jsonl"]);
        assert_eq!(split_files(&repo, "test"), ["test.jsonl"]);

        let converted = files(&[
            "test.jsonl",
            "data/test-00000-of-00001.parquet",
            "csv/test-a.csv",
            "csv/test-b.csv",
        ]);
        assert_eq!(
            split_files(&converted, "test"),
            ["data/test-00000-of-00001.parquet"]
        );
    }

    #[test]
    fn most_common_format_wins_without_parquet() {
        let repo = files(&["test.json", "test/part-0.csv", "test/part-1.csv"]);
        assert_eq!(
            split_files(&repo, "test"),
            ["test/part-0.csv", "test/part-1.csv"]
        );
    }
}
