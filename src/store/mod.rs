// State store boundary
//
// One record per comment id, replaced atomically and guarded by an expected
// version so concurrent writers cannot lose updates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::workflow::{CommentId, CommentState};

pub mod filesystem;
pub mod memory;
#[cfg(feature = "database")]
pub mod sqlite;

pub use filesystem::FileSystemStateStore;
pub use memory::InMemoryStateStore;
#[cfg(feature = "database")]
pub use sqlite::SqliteStateStore;

/// Monotonic version of a stored record, starting at 1 on first write
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub u64);

impl Version {
    pub const FIRST: Version = Version(1);

    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedState {
    pub version: Version,
    pub state: CommentState,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no state stored for this comment")]
    NotFound,

    #[error("state store unavailable: {0}")]
    Unavailable(String),

    #[error("version conflict: expected {expected:?}, found {found:?}")]
    Conflict {
        expected: Option<Version>,
        found: Option<Version>,
    },
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Unavailable(format!("corrupt state record: {err}"))
    }
}

/// Durable keyed storage for comment states
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the current state of a comment
    async fn get(&self, id: CommentId) -> Result<VersionedState, StoreError>;

    /// Replace the state of a comment.
    ///
    /// `expected` is the version the caller loaded, or `None` when the caller
    /// believes no record exists yet. A mismatch returns [`StoreError::Conflict`]
    /// and leaves the stored record untouched.
    async fn put(
        &self,
        id: CommentId,
        state: &CommentState,
        expected: Option<Version>,
    ) -> Result<Version, StoreError>;
}

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Box<T> {
    async fn get(&self, id: CommentId) -> Result<VersionedState, StoreError> {
        (**self).get(id).await
    }

    async fn put(
        &self,
        id: CommentId,
        state: &CommentState,
        expected: Option<Version>,
    ) -> Result<Version, StoreError> {
        (**self).put(id, state, expected).await
    }
}

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for std::sync::Arc<T> {
    async fn get(&self, id: CommentId) -> Result<VersionedState, StoreError> {
        (**self).get(id).await
    }

    async fn put(
        &self,
        id: CommentId,
        state: &CommentState,
        expected: Option<Version>,
    ) -> Result<Version, StoreError> {
        (**self).put(id, state, expected).await
    }
}

/// Shared CAS rule used by every backend
pub(crate) fn check_expected_version(
    expected: Option<Version>,
    found: Option<Version>,
) -> Result<Version, StoreError> {
    if expected == found {
        Ok(found.map(Version::next).unwrap_or(Version::FIRST))
    } else {
        Err(StoreError::Conflict { expected, found })
    }
}
