//! Content loading: directory expansion and PDF text extraction.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use topicshelf_core::{AppError, AppResult};
use walkdir::WalkDir;

/// Source of files and their text.
#[async_trait]
pub trait ContentLoader: Send + Sync {
    /// Files directly inside `dir` whose lowercase extension is in
    /// `extensions`, sorted by file name.
    async fn list_files(&self, dir: &Path, extensions: &[&str]) -> AppResult<Vec<PathBuf>>;

    /// Extract the text content of a PDF.
    async fn extract_text(&self, path: &Path) -> AppResult<String>;
}

/// Filesystem loader backed by walkdir and pdf-extract.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl FsLoader {
    pub fn new() -> Self {
        Self
    }
}

/// Check whether `path` has one of `extensions` (case-insensitive).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            extensions.iter().any(|allowed| *allowed == ext)
        })
        .unwrap_or(false)
}

#[async_trait]
impl ContentLoader for FsLoader {
    async fn list_files(&self, dir: &Path, extensions: &[&str]) -> AppResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                AppError::Loader(format!("Failed to read directory {:?}: {}", dir, e))
            })?;
            let path = entry.path();
            if entry.file_type().is_file() && has_extension(path, extensions) {
                files.push(path.to_path_buf());
            }
        }

        tracing::debug!("Found {} matching files in {:?}", files.len(), dir);
        Ok(files)
    }

    async fn extract_text(&self, path: &Path) -> AppResult<String> {
        let owned = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
            .await
            .map_err(|e| AppError::Loader(format!("PDF extraction task failed: {}", e)))?
            .map_err(|e| {
                AppError::Loader(format!("Failed to extract text from {:?}: {}", path, e))
            })?;

        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("a/B.PDF"), &["pdf"]));
        assert!(has_extension(Path::new("cat.jpg"), &["jpg", "png"]));
        assert!(!has_extension(Path::new("notes.txt"), &["pdf"]));
        assert!(!has_extension(Path::new("README"), &["pdf"]));
    }

    #[tokio::test]
    async fn test_list_files_filters_sorts_and_skips_subdirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("b.png"), b"b").unwrap();
        fs::write(root.join("a.JPG"), b"a").unwrap();
        fs::write(root.join("c.txt"), b"c").unwrap();
        fs::create_dir(root.join("nested")).unwrap();
        fs::write(root.join("nested").join("d.png"), b"d").unwrap();

        let files = FsLoader::new()
            .list_files(root, &["jpg", "png"])
            .await
            .unwrap();

        assert_eq!(files, vec![root.join("a.JPG"), root.join("b.png")]);
    }

    #[tokio::test]
    async fn test_extract_text_rejects_non_pdf() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fake.pdf");
        fs::write(&path, b"not a pdf").unwrap();

        let err = FsLoader::new().extract_text(&path).await.unwrap_err();
        assert!(matches!(err, AppError::Loader(_)));
    }
}
