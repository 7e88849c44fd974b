use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::models::TrainingExample;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Line {line}: {message}")]
    InvalidLine { line: usize, message: String },
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Render examples as tuning-dataset JSONL: one
/// `{"text_input": ..., "output": ...}` object per line.
pub fn examples_to_jsonl(examples: &[TrainingExample]) -> ExportResult<String> {
    let mut out = String::new();
    for example in examples {
        out.push_str(&serde_json::to_string(example)?);
        out.push('\n');
    }
    Ok(out)
}

/// Parse tuning-dataset JSONL. Blank lines are skipped; a malformed line or
/// a blank field fails with its 1-based line number.
pub fn examples_from_jsonl(contents: &str) -> ExportResult<Vec<TrainingExample>> {
    let mut examples = Vec::new();

    for (idx, raw) in contents.lines().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }

        let example: TrainingExample =
            serde_json::from_str(raw).map_err(|e| ExportError::InvalidLine {
                line,
                message: e.to_string(),
            })?;

        if example.input.trim().is_empty() || example.output.trim().is_empty() {
            return Err(ExportError::InvalidLine {
                line,
                message: "text_input and output must not be empty".to_string(),
            });
        }

        examples.push(example);
    }

    Ok(examples)
}

/// Write the dataset to `path`, atomically via a temp file and rename.
pub async fn write_jsonl(path: &Path, examples: &[TrainingExample]) -> ExportResult<()> {
    let contents = examples_to_jsonl(examples)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension(format!("jsonl.{}.tmp", std::process::id()));
    tokio::fs::write(&temp_path, contents).await?;
    tokio::fs::rename(&temp_path, path).await?;

    info!(path = %path.display(), count = examples.len(), "Dataset exported");
    Ok(())
}

pub async fn read_jsonl(path: &Path) -> ExportResult<Vec<TrainingExample>> {
    let contents = tokio::fs::read_to_string(path).await?;
    let examples = examples_from_jsonl(&contents)?;
    info!(path = %path.display(), count = examples.len(), "Dataset imported");
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_examples;

    #[test]
    fn test_uses_tuning_field_names() {
        let jsonl = examples_to_jsonl(&[TrainingExample::new("Hi", "Hello")])
            .expect("serializable");
        assert_eq!(jsonl, "{\"text_input\":\"Hi\",\"output\":\"Hello\"}\n");
    }

    #[test]
    fn test_empty_set_exports_empty_string() {
        assert_eq!(examples_to_jsonl(&[]).expect("serializable"), "");
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let contents = "\n{\"text_input\":\"a\",\"output\":\"b\"}\n   \n{\"text_input\":\"c\",\"output\":\"d\"}\n";
        let examples = examples_from_jsonl(contents).expect("valid jsonl");
        assert_eq!(
            examples,
            vec![TrainingExample::new("a", "b"), TrainingExample::new("c", "d")]
        );
    }

    #[test]
    fn test_parse_reports_line_number() {
        let contents = "{\"text_input\":\"a\",\"output\":\"b\"}\nnot json\n";
        match examples_from_jsonl(contents) {
            Err(ExportError::InvalidLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected InvalidLine, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_blank_fields() {
        let contents = "{\"text_input\":\"a\",\"output\":\"  \"}";
        assert!(matches!(
            examples_from_jsonl(contents),
            Err(ExportError::InvalidLine { line: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_write_then_read_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("dataset.jsonl");

        write_jsonl(&path, &default_examples()).await.expect("write");
        let loaded = read_jsonl(&path).await.expect("read");

        assert_eq!(loaded, default_examples());
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().expect("has parent"))
            .expect("readable")
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
