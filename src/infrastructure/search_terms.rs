//! Search-term file source.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tracing::info;

/// Load the ordered search-term list: one term per line, surrounding
/// whitespace trimmed, blank lines ignored.
pub async fn load_terms(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read search terms from {}", path.display()))?;
    let terms: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    info!(count = terms.len(), file = %path.display(), "search terms loaded");
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn skips_blank_lines_and_trims() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.txt");
        tokio::fs::write(&path, "airpods\n\n  laptop standi  \n\n")
            .await
            .unwrap();
        let terms = load_terms(&path).await.unwrap();
        assert_eq!(terms, vec!["airpods".to_string(), "laptop standi".to_string()]);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_terms(dir.path().join("absent.txt")).await.is_err());
    }
}
