//! Durable snapshot file
//!
//! The board is stored as a pretty-printed JSON array of `{"name", "score"}`
//! records in rank order. The file is never edited in place: each save writes
//! a complete sibling `<file>.tmp`, flushes it to disk and renames it over the
//! live file, so a reader only ever finds the old or the new board.

use crate::error::{Result, StoreError};
use log::{debug, warn};
use shared::Entry;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
    temp_path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut temp_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| OsString::from("scoreboard"));
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        Self { path, temp_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Reads the stored board, `None` if there is no file yet
    pub async fn load(&self) -> Result<Option<Vec<Entry>>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No scoreboard file at {:?}", self.path);
                return Ok(None);
            }
            Err(source) => {
                return Err(StoreError::Load {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let entries =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::CorruptState {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(entries))
    }

    /// Atomically replaces the stored board with `entries`
    pub async fn save(&self, entries: &[Entry]) -> Result<()> {
        if let Err(source) = self.replace(entries).await {
            if let Err(e) = fs::remove_file(&self.temp_path).await {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Could not remove {:?}: {}", self.temp_path, e);
                }
            }
            return Err(StoreError::Persistence {
                path: self.path.clone(),
                source,
            });
        }

        // The rename is the commit point; past it the new board is live
        if let Err(e) = self.sync_parent().await {
            warn!("Could not sync directory of {:?}: {}", self.path, e);
        }
        debug!("Saved {} entries to {:?}", entries.len(), self.path);
        Ok(())
    }

    async fn replace(&self, entries: &[Entry]) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(entries)?;

        if let Some(parent) = self.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&self.temp_path).await?;
        file.write_all(&json).await?;
        file.write_all(b"\n").await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&self.temp_path, &self.path).await
    }

    /// Deletes the stored board. Returns whether a file was there.
    pub async fn remove(&self) -> Result<bool> {
        let _ = fs::remove_file(&self.temp_path).await;

        match fs::remove_file(&self.path).await {
            Ok(()) => {
                if let Err(e) = self.sync_parent().await {
                    warn!("Could not sync directory of {:?}: {}", self.path, e);
                }
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Persistence {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn parent(&self) -> Option<&Path> {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }

    #[cfg(unix)]
    async fn sync_parent(&self) -> io::Result<()> {
        let parent = self.parent().unwrap_or_else(|| Path::new("."));
        fs::File::open(parent).await?.sync_all().await
    }

    #[cfg(not(unix))]
    async fn sync_parent(&self) -> io::Result<()> {
        Ok(())
    }
}
