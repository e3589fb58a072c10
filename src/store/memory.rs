use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{check_expected_version, StateStore, StoreError, Version, VersionedState};
use crate::workflow::{CommentId, CommentState};

/// Process-local store, used by tests and the `memory` backend
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    records: RwLock<HashMap<CommentId, VersionedState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, id: CommentId) -> Result<VersionedState, StoreError> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn put(
        &self,
        id: CommentId,
        state: &CommentState,
        expected: Option<Version>,
    ) -> Result<Version, StoreError> {
        let mut records = self.records.write().await;
        let found = records.get(&id).map(|record| record.version);
        let version = check_expected_version(expected, found)?;

        records.insert(
            id,
            VersionedState {
                version,
                state: state.clone(),
            },
        );
        Ok(version)
    }
}
