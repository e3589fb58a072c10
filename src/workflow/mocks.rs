// Test doubles for the workflow - no I/O

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::publication::{PublicationRequest, PublishError, Publisher};
use super::state::CommentState;
use super::types::{CommentId, PublishedComment};
use crate::store::{InMemoryStateStore, StateStore, StoreError, Version, VersionedState};

/// In-memory store whose reads and writes can be switched to fail
#[derive(Debug, Default)]
pub struct FlakyStateStore {
    inner: InMemoryStateStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn successful_writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for FlakyStateStore {
    async fn get(&self, id: CommentId) -> Result<VersionedState, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated read failure".to_string()));
        }
        self.inner.get(id).await
    }

    async fn put(
        &self,
        id: CommentId,
        state: &CommentState,
        expected: Option<Version>,
    ) -> Result<Version, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated write failure".to_string()));
        }
        let version = self.inner.put(id, state, expected).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(version)
    }
}

/// Publisher that replays scripted outcomes and records every request.
/// A request is recorded as soon as it arrives, before any delay.
#[derive(Debug, Default)]
pub struct ScriptedPublisher {
    outcomes: Mutex<Vec<Result<PublishedComment, PublishError>>>,
    requests: Mutex<Vec<PublicationRequest>>,
    delay: Option<Duration>,
}

impl ScriptedPublisher {
    pub fn new(outcomes: Vec<Result<PublishedComment, PublishError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Answer each request only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<PublicationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for ScriptedPublisher {
    async fn publish(&self, request: &PublicationRequest) -> Result<PublishedComment, PublishError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            return Err(PublishError::Unavailable("no scripted outcome left".to_string()));
        }
        outcomes.remove(0)
    }
}
