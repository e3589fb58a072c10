// Command handler and query path
//
// Load -> authorize -> apply -> persist, serialized per comment id and backed
// by the store's expected-version check.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn, Instrument};

use super::commands::Command;
use super::resolver::{next_expected_command, NextStep};
use super::state::{CommentState, StateTag, WorkflowPolicy};
use super::transition::{apply, Rejection};
use super::types::{AuthorId, CommentId, PublishedComment};
use crate::observability::{workflow_metrics, OperationTimer};
use crate::store::{StateStore, StoreError, VersionedState};
use crate::telemetry::{create_command_span, generate_correlation_id};

/// Outcomes of a command as seen by page handlers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Missing comment, or a comment that belongs to someone else
    #[error("comment not found")]
    NotFound,

    #[error("command rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("the comment workflow is unavailable, try again later")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("comment not found")]
    NotFound,

    #[error("the comment workflow is unavailable, try again later")]
    Unavailable,
}

impl From<QueryError> for HandlerError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound => HandlerError::NotFound,
            QueryError::Unavailable => HandlerError::Unavailable,
        }
    }
}

/// Entry point for every read and write against comment states
pub struct CommentWorkflow<S> {
    store: S,
    policy: WorkflowPolicy,
    locks: Mutex<HashMap<CommentId, Arc<Mutex<()>>>>,
    publication_locks: Mutex<HashMap<CommentId, Arc<Mutex<()>>>>,
}

impl<S: StateStore> CommentWorkflow<S> {
    pub fn new(store: S, policy: WorkflowPolicy) -> Self {
        Self {
            store,
            policy,
            locks: Mutex::new(HashMap::new()),
            publication_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &WorkflowPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle a command issued by an author
    pub async fn handle(
        &self,
        id: CommentId,
        issuer: &AuthorId,
        command: Command,
    ) -> Result<CommentState, HandlerError> {
        let correlation_id = generate_correlation_id();
        let span = create_command_span("handle", id, Some(command.tag()), &correlation_id);

        async {
            let timer = OperationTimer::new("comment_workflow.handle");
            let result = self.execute(id, Some(issuer), &command).await;
            timer.finish();
            result
        }
        .instrument(span)
        .await
    }

    /// Record that the external publication succeeded
    pub async fn record_publication(
        &self,
        id: CommentId,
        published: PublishedComment,
    ) -> Result<CommentState, HandlerError> {
        let command = Command::from(published);
        let span = create_command_span(
            "record_publication",
            id,
            Some(command.tag()),
            &generate_correlation_id(),
        );
        self.execute(id, None, &command).instrument(span).await
    }

    /// Record that the external publication failed; the comment becomes publishable again
    pub async fn record_publication_failure(
        &self,
        id: CommentId,
        reason: impl Into<String>,
    ) -> Result<CommentState, HandlerError> {
        let command = Command::MarkPublicationAsFailed {
            reason: reason.into(),
        };
        let span = create_command_span(
            "record_publication_failure",
            id,
            Some(command.tag()),
            &generate_correlation_id(),
        );
        self.execute(id, None, &command).instrument(span).await
    }

    /// Current state of a comment, regardless of who asks
    pub async fn get_state(&self, id: CommentId) -> Result<CommentState, QueryError> {
        match self.store.get(id).await {
            Ok(VersionedState { state, .. }) => Ok(state),
            Err(StoreError::NotFound) => Err(QueryError::NotFound),
            Err(e) => {
                error!(comment_id = %id, error = %e, "Failed to load comment state");
                workflow_metrics().record_unavailable();
                Err(QueryError::Unavailable)
            }
        }
    }

    /// Current state of a comment as seen by `user`; other authors' comments do not exist
    pub async fn get_state_for(
        &self,
        id: CommentId,
        user: &AuthorId,
    ) -> Result<CommentState, QueryError> {
        let state = self.get_state(id).await?;
        if state.is_owned_by(user) {
            Ok(state)
        } else {
            workflow_metrics().record_not_found();
            Err(QueryError::NotFound)
        }
    }

    /// What `user` should do next on this comment.
    ///
    /// Returns `NotFound` both for unknown ids and for other authors' comments;
    /// pages that start new comments treat that as [`CommentState::NotStarted`].
    pub async fn next_step_for(
        &self,
        id: CommentId,
        user: &AuthorId,
    ) -> Result<NextStep, QueryError> {
        let state = self.get_state_for(id, user).await?;
        Ok(self.next_step(&state))
    }

    pub fn next_step(&self, state: &CommentState) -> NextStep {
        next_expected_command(state, &self.policy)
    }

    async fn comment_lock(&self, id: CommentId) -> Arc<Mutex<()>> {
        lock_for(&self.locks, id).await
    }

    /// Held across the whole external publication of one comment. Separate from
    /// the command lock so recording the outcome can still go through `execute`.
    pub(crate) async fn publication_lock(&self, id: CommentId) -> Arc<Mutex<()>> {
        lock_for(&self.publication_locks, id).await
    }

    async fn execute(
        &self,
        id: CommentId,
        issuer: Option<&AuthorId>,
        command: &Command,
    ) -> Result<CommentState, HandlerError> {
        let metrics = workflow_metrics();
        let lock = self.comment_lock(id).await;
        let _guard = lock.lock().await;

        // A missing record is a valid starting point
        let (current, version) = match self.store.get(id).await {
            Ok(VersionedState { version, state }) => (state, Some(version)),
            Err(StoreError::NotFound) => (CommentState::NotStarted, None),
            Err(e) => {
                error!(comment_id = %id, error = %e, "Failed to load comment state");
                metrics.record_unavailable();
                return Err(HandlerError::Unavailable);
            }
        };

        // Only starting a comment is meaningful when nothing exists yet
        if current == CommentState::NotStarted && !matches!(command, Command::StartComment { .. }) {
            metrics.record_not_found();
            return Err(HandlerError::NotFound);
        }

        if let Some(issuer) = issuer {
            let owner = match (&current, command) {
                (CommentState::NotStarted, Command::StartComment { author_id, .. }) => Some(author_id),
                (state, _) => state.author_id(),
            };
            if owner.is_some_and(|owner| owner != issuer) {
                warn!(comment_id = %id, "Command issued by someone other than the author");
                metrics.record_not_found();
                return Err(HandlerError::NotFound);
            }
        }

        let outcome = if issuer.is_some()
            && !command.is_user_issuable()
            && current.tag() != StateTag::Published
        {
            Err(Rejection::IllegalCommand {
                state: current.tag(),
                command: command.tag(),
            })
        } else {
            apply(&current, command, &self.policy)
        };

        let next = match outcome {
            Ok(next) => next,
            Err(rejection) => {
                info!(
                    comment_id = %id,
                    state = %current.tag(),
                    command = %command.tag(),
                    rejection = %rejection,
                    "Command rejected"
                );
                metrics.record_rejected();
                return Err(HandlerError::Rejected(rejection));
            }
        };

        // Repeated confirmations leave the record as it is
        if next == current {
            metrics.record_accepted();
            return Ok(next);
        }

        match self.store.put(id, &next, version).await {
            Ok(new_version) => {
                info!(
                    comment_id = %id,
                    from_state = %current.tag(),
                    to_state = %next.tag(),
                    command = %command.tag(),
                    prereview_id = ?next.prereview_id(),
                    version = %new_version,
                    "Comment state transition"
                );
                metrics.record_accepted();
                Ok(next)
            }
            Err(StoreError::Conflict { expected, found }) => {
                warn!(
                    comment_id = %id,
                    expected = ?expected,
                    found = ?found,
                    "Comment state changed concurrently; nothing written"
                );
                metrics.record_conflict();
                Err(HandlerError::Unavailable)
            }
            Err(e) => {
                error!(comment_id = %id, error = %e, "Failed to persist comment state");
                metrics.record_unavailable();
                Err(HandlerError::Unavailable)
            }
        }
    }
}

async fn lock_for(
    locks: &Mutex<HashMap<CommentId, Arc<Mutex<()>>>>,
    id: CommentId,
) -> Arc<Mutex<()>> {
    let mut locks = locks.lock().await;
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    locks.entry(id).or_default().clone()
}
