// src/file_store.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// FileSystemObjectStore: the ObjectStore interface over a local directory.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::object_store::ObjectStore;
use crate::uri_utils::ObjectRef;

/// FileSystem adapter that implements ObjectStore for a directory tree.
///
/// Mapping: `container/key` → `<root>/<container>/<key>`.
/// Containers are plain subdirectories, created on first write.
#[derive(Debug, Clone)]
pub struct FileSystemObjectStore {
    root: PathBuf,
}

impl FileSystemObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path backing `obj`.
    pub fn path_for(&self, obj: &ObjectRef) -> Result<PathBuf> {
        if obj.container.is_empty() {
            bail!("object reference '{}' has no container", obj);
        }
        if obj.key.is_empty() {
            bail!("object reference '{}' has no key", obj);
        }
        if obj.container.contains("..") || obj.key.split('/').any(|seg| seg == "..") {
            bail!("object reference '{}' escapes the store root", obj);
        }
        Ok(self.root.join(&obj.container).join(&obj.key))
    }

    async fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FileSystemObjectStore {
    async fn upload_file(&self, local: &Path, dest: &ObjectRef) -> Result<u64> {
        let target = self.path_for(dest)?;
        Self::ensure_parent(&target).await?;
        debug!("file store put {} → {}", local.display(), target.display());
        fs::copy(local, &target)
            .await
            .with_context(|| format!("cannot upload {} to {}", local.display(), dest))
    }

    async fn copy(&self, src: &ObjectRef, dst: &ObjectRef) -> Result<()> {
        let from = self.path_for(src)?;
        let to = self.path_for(dst)?;
        Self::ensure_parent(&to).await?;
        debug!("file store copy {} → {}", from.display(), to.display());
        fs::copy(&from, &to)
            .await
            .with_context(|| format!("cannot copy {} to {}", src, dst))?;
        Ok(())
    }
}
