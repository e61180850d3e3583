use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Storage for finished audio artifacts, addressed by file name.
///
/// `store` is atomic from a reader's point of view: a name either resolves to
/// the complete artifact or to nothing.
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    async fn store(&self, name: &str, audio: &[u8]) -> Result<(), String>;

    /// `Ok(None)` when no artifact has that name
    async fn load(&self, name: &str) -> Result<Option<Vec<u8>>, String>;

    /// Removing a missing artifact is not an error
    async fn remove(&self, name: &str) -> Result<(), String>;
}

/// Artifacts as plain files under one directory
pub struct FsArtifactRepository {
    root: PathBuf,
}

impl FsArtifactRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `name` inside the root, refusing anything that is not a bare file name
    fn resolve(&self, name: &str) -> Result<PathBuf, String> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None) => Ok(self.root.join(file)),
            _ => Err(format!("invalid artifact name: {:?}", name)),
        }
    }
}

#[async_trait]
impl ArtifactRepository for FsArtifactRepository {
    async fn store(&self, name: &str, audio: &[u8]) -> Result<(), String> {
        let path = self.resolve(name)?;
        let partial = self.root.join(format!(".{}.partial", name));

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| format!("Failed to create {}: {}", self.root.display(), e))?;
        tokio::fs::write(&partial, audio)
            .await
            .map_err(|e| format!("Failed to write {}: {}", partial.display(), e))?;
        tokio::fs::rename(&partial, &path).await.map_err(|e| {
            format!(
                "Failed to move {} to {}: {}",
                partial.display(),
                path.display(),
                e
            )
        })?;

        tracing::debug!(path = %path.display(), size_bytes = audio.len(), "Artifact stored");
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<Vec<u8>>, String> {
        let path = self.resolve(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(format!("Failed to read {}: {}", path.display(), e)),
        }
    }

    async fn remove(&self, name: &str) -> Result<(), String> {
        let path = self.resolve(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("Failed to remove {}: {}", path.display(), e)),
        }
    }
}
