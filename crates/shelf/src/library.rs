//! On-disk topic folders holding a copy of every indexed file.
//!
//! Layout: `<save_dir>/<topic>/<md5 of source path><extension>`. The same
//! source path always maps to the same file name, so re-adding a file
//! overwrites its earlier copies.

use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use topicshelf_core::{AppError, AppResult};

/// Check that `topic` names a single folder directly under the save dir.
pub fn check_topic(topic: &str) -> AppResult<()> {
    let mut components = Path::new(topic).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );

    if single && !topic.contains(|c: char| c == '/' || c == '\\') {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "Invalid topic '{}': topics must be plain folder names",
            topic
        )))
    }
}

/// File name for the stored copy of `source`.
pub fn stored_file_name(source: &Path) -> String {
    let digest = Md5::digest(source.to_string_lossy().as_bytes());
    let extension = source
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    format!("{:x}{}", digest, extension)
}

/// Copy `source` into one folder per topic under `save_dir`.
///
/// Returns the stored paths in topic order.
pub async fn store_copies(
    source: &Path,
    save_dir: &Path,
    topics: &[String],
) -> AppResult<Vec<PathBuf>> {
    for topic in topics {
        check_topic(topic)?;
    }

    let file_name = stored_file_name(source);
    let mut stored = Vec::with_capacity(topics.len());

    for topic in topics {
        let topic_dir = save_dir.join(topic);
        tokio::fs::create_dir_all(&topic_dir).await.map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create topic folder {:?}: {}", topic_dir, e),
            ))
        })?;

        let target = topic_dir.join(&file_name);
        tokio::fs::copy(source, &target).await.map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to copy {:?} to {:?}: {}", source, target, e),
            ))
        })?;

        tracing::debug!("Stored copy at {:?}", target);
        stored.push(target);
    }

    Ok(stored)
}

/// Number of stored files per topic folder. A missing `save_dir` is empty.
pub async fn topic_counts(save_dir: &Path) -> AppResult<BTreeMap<String, usize>> {
    let mut counts = BTreeMap::new();

    let mut topics = match tokio::fs::read_dir(save_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(counts),
        Err(e) => return Err(e.into()),
    };

    while let Some(topic) = topics.next_entry().await? {
        if !topic.file_type().await?.is_dir() {
            continue;
        }

        let mut files = tokio::fs::read_dir(topic.path()).await?;
        let mut count = 0;
        while let Some(file) = files.next_entry().await? {
            if file.file_type().await?.is_file() {
                count += 1;
            }
        }

        counts.insert(topic.file_name().to_string_lossy().to_string(), count);
    }

    Ok(counts)
}
