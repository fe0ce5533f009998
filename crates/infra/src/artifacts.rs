//! Generated markdown artifacts on disk.
//!
//! Artifacts live flat in one directory and are addressed by file name only.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use docforge_core::{ExtractionRequest, JobId};

const EXTENSION: &str = ".md";

/// Artifact store error.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("invalid artifact name: {0}")]
    InvalidName(String),
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Listing entry for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactInfo {
    pub name: String,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Directory-backed artifact store.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every markdown artifact, sorted by name. A missing root lists as empty.
    pub async fn list(&self) -> Result<Vec<ArtifactInfo>, ArtifactError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut artifacts = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if validate_name(&name).is_err() {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            artifacts.push(ArtifactInfo {
                name,
                size: meta.len(),
                modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        artifacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(artifacts)
    }

    /// Read one artifact by name.
    pub async fn read(&self, name: &str) -> Result<String, ArtifactError> {
        let path = self.path_for(name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ArtifactError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write an artifact, replacing any existing file of the same name.
    ///
    /// Content goes to a hidden temp file first and is renamed into place, so
    /// readers never observe a half-written artifact.
    pub async fn write(&self, name: &str, content: &str) -> Result<PathBuf, ArtifactError> {
        let path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let tmp = self.root.join(format!(".{name}.tmp"));
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(artifact = %name, bytes = content.len(), "artifact written");
        Ok(path)
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

/// Accept only plain `*.md` file names inside the root.
pub fn validate_name(name: &str) -> Result<(), ArtifactError> {
    let invalid = || ArtifactError::InvalidName(name.to_string());

    if name.len() <= EXTENSION.len() || !name.ends_with(EXTENSION) {
        return Err(invalid());
    }
    if name.starts_with('.') || name.contains("..") {
        return Err(invalid());
    }
    if name.chars().any(|c| c == '/' || c == '\\' || c.is_control()) {
        return Err(invalid());
    }
    Ok(())
}

/// File name for the artifact produced by a job: `<host>-<type>-<short id>.md`.
pub fn artifact_name(request: &ExtractionRequest, job_id: JobId) -> String {
    let host = url::Url::parse(&request.url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| request.url.clone());

    format!("{}-{}-{}{EXTENSION}", slug(&host), slug(&request.kind), job_id.short())
}

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_dash = true;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    let trimmed = out.trim_end_matches('-');
    let trimmed: String = trimmed.chars().take(48).collect();
    if trimmed.is_empty() {
        "doc".to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docforge_core::SubmissionInput;

    #[tokio::test]
    async fn write_list_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("out"));

        store.write("b.md", "# B").await.unwrap();
        store.write("a.md", "# A\n").await.unwrap();
        tokio::fs::write(dir.path().join("out/notes.txt"), "skip me")
            .await
            .unwrap();

        let listed = store.list().await.unwrap();
        let names: Vec<_> = listed.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
        assert_eq!(listed[0].size, 4);

        assert_eq!(store.read("b.md").await.unwrap(), "# B");
    }

    #[tokio::test]
    async fn missing_root_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("never-created"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.read("nope.md").await,
            Err(ArtifactError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        for name in ["../secret.md", "a/b.md", "..md", ".hidden.md", "plain.txt", ".md", ""] {
            assert!(
                matches!(store.read(name).await, Err(ArtifactError::InvalidName(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn artifact_names_are_slugged() {
        let req = SubmissionInput::new("https://Docs.Example.com/guide?x=1", "API Reference")
            .validate()
            .unwrap();
        let id = JobId::from_uuid(uuid::Uuid::from_u128(0xdead_beef));

        let name = artifact_name(&req, id);
        assert_eq!(name, "docs-example-com-api-reference-deadbeef.md");
        assert!(validate_name(&name).is_ok());
    }

    #[test]
    fn unparseable_url_still_yields_a_valid_name() {
        let req = SubmissionInput::new("not a url/../x", "???").validate().unwrap();
        let name = artifact_name(&req, JobId::new());
        assert!(name.starts_with("not-a-url-x-doc-"));
        assert!(validate_name(&name).is_ok());
    }
}
