use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use super::{check_expected_version, StateStore, StoreError, Version, VersionedState};
use crate::workflow::{CommentId, CommentState};

/// On-disk representation of one comment's state
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredComment {
    version: Version,
    updated_at: DateTime<Utc>,
    state: CommentState,
}

/// File system store: one JSON document per comment, replaced via temp file + rename
#[derive(Debug, Clone)]
pub struct FileSystemStateStore {
    directory: PathBuf,
}

impl FileSystemStateStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn state_file_path(directory: &Path, id: CommentId) -> PathBuf {
        directory.join(format!("{id}.state.json"))
    }

    fn lock_file_path(directory: &Path, id: CommentId) -> PathBuf {
        directory.join(format!("{id}.lock"))
    }

    /// Version check and replacement happen under an exclusive lock on the comment's lock file
    fn write_locked(
        directory: &Path,
        id: CommentId,
        state: &CommentState,
        expected: Option<Version>,
    ) -> Result<Version, StoreError> {
        std::fs::create_dir_all(directory)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(Self::lock_file_path(directory, id))?;
        let mut lock = fd_lock::RwLock::new(lock_file);
        let _guard = lock.write()?;

        let state_file = Self::state_file_path(directory, id);
        let found = match std::fs::read_to_string(&state_file) {
            Ok(contents) => Some(serde_json::from_str::<StoredComment>(&contents)?.version),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        let version = check_expected_version(expected, found)?;

        let record = StoredComment {
            version,
            updated_at: Utc::now(),
            state: state.clone(),
        };
        let serialized = serde_json::to_string_pretty(&record)?;

        // Write to temporary file first, then rename (atomic operation)
        let temp_file = state_file.with_extension("json.tmp");
        let mut file = File::create(&temp_file)?;
        file.write_all(serialized.as_bytes())?;
        // Contents must be on disk before the rename makes them visible
        file.sync_all()?;
        drop(file);
        std::fs::rename(&temp_file, &state_file)?;

        Ok(version)
    }
}

#[async_trait]
impl StateStore for FileSystemStateStore {
    async fn get(&self, id: CommentId) -> Result<VersionedState, StoreError> {
        let state_file = Self::state_file_path(&self.directory, id);

        let contents = match fs::read_to_string(&state_file).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(comment_id = %id, file = ?state_file, "No state file found");
                return Err(StoreError::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        let record: StoredComment = serde_json::from_str(&contents)?;
        debug!(
            comment_id = %id,
            version = %record.version,
            updated_at = %record.updated_at,
            "State loaded"
        );

        Ok(VersionedState {
            version: record.version,
            state: record.state,
        })
    }

    async fn put(
        &self,
        id: CommentId,
        state: &CommentState,
        expected: Option<Version>,
    ) -> Result<Version, StoreError> {
        let directory = self.directory.clone();
        let state = state.clone();

        let version = tokio::task::spawn_blocking(move || {
            Self::write_locked(&directory, id, &state, expected)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("state writer task failed: {e}")))??;

        info!(
            comment_id = %id,
            version = %version,
            directory = ?self.directory,
            "State saved"
        );

        Ok(version)
    }
}
