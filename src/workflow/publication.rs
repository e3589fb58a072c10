// Two-phase publication: BeingPublished is persisted before the external call
// starts, so a crash mid-publish leaves a state that can be picked up again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use super::commands::Command;
use super::handler::{CommentWorkflow, HandlerError};
use super::state::{CommentState, CompletedComment, StateTag};
use super::types::{AuthorId, CommentId, PrereviewId, PublishedComment};
use crate::observability::workflow_metrics;
use crate::store::StateStore;

/// Content handed to the publication service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRequest {
    pub comment_id: CommentId,
    pub author_id: AuthorId,
    pub prereview_id: PrereviewId,
    pub comment: CompletedComment,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// Outcome unknown: the deposit may or may not have happened
    #[error("publication service unavailable: {0}")]
    Unavailable(String),

    /// The service definitely did not deposit the comment
    #[error("publication refused: {0}")]
    Refused(String),
}

/// External service that deposits a comment and assigns it a DOI.
///
/// `publish` must be idempotent on `request.comment_id`: a comment stays
/// `BeingPublished` until an outcome is recorded, so the same request can be
/// sent again after a timeout, an unavailable service or a restart, and must
/// return the identifiers of the earlier deposit if there was one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, request: &PublicationRequest) -> Result<PublishedComment, PublishError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublicationError {
    #[error(transparent)]
    Workflow(#[from] HandlerError),

    #[error("comment is {0}, not being published")]
    NotPending(StateTag),

    #[error("publication failed: {0}")]
    Failed(PublishError),

    #[error("publication timed out after {0:?}; still being published")]
    TimedOut(Duration),
}

/// Drives a comment from `PublishComment` to `Published` through a [`Publisher`]
pub struct PublicationCoordinator<S, P> {
    workflow: Arc<CommentWorkflow<S>>,
    publisher: P,
    timeout: Duration,
}

impl<S: StateStore, P: Publisher> PublicationCoordinator<S, P> {
    /// `timeout` bounds how long one call waits for the publisher. It never
    /// changes the comment's state; the caller polls [`Self::complete_pending`] again.
    pub fn new(workflow: Arc<CommentWorkflow<S>>, publisher: P, timeout: Duration) -> Self {
        Self {
            workflow,
            publisher,
            timeout,
        }
    }

    /// Accept the author's publish command, then publish
    pub async fn publish(
        &self,
        id: CommentId,
        issuer: &AuthorId,
    ) -> Result<PublishedComment, PublicationError> {
        self.workflow
            .handle(id, issuer, Command::PublishComment)
            .await?;
        self.complete_pending(id).await
    }

    /// Publish a comment left in `BeingPublished`, e.g. after a restart.
    /// Already published comments return their identifiers unchanged.
    ///
    /// Only a refusal returns the comment to `ReadyForPublishing`. Timeouts and
    /// an unavailable service leave it `BeingPublished` for the next poll.
    pub async fn complete_pending(&self, id: CommentId) -> Result<PublishedComment, PublicationError> {
        // One caller per comment from the state read until the outcome is recorded
        let lock = self.workflow.publication_lock(id).await;
        let _guard = lock.lock().await;

        let state = self
            .workflow
            .get_state(id)
            .await
            .map_err(HandlerError::from)?;

        let request = match state {
            CommentState::BeingPublished {
                author_id,
                prereview_id,
                snapshot,
            } => PublicationRequest {
                comment_id: id,
                author_id,
                prereview_id,
                comment: snapshot,
            },
            CommentState::Published { doi, id, .. } => return Ok(PublishedComment { doi, id }),
            other => return Err(PublicationError::NotPending(other.tag())),
        };

        info!(comment_id = %id, prereview_id = %request.prereview_id, "Publishing comment");

        match tokio::time::timeout(self.timeout, self.publisher.publish(&request)).await {
            Ok(Ok(published)) => {
                self.workflow.record_publication(id, published.clone()).await?;
                workflow_metrics().record_publication(true);
                info!(comment_id = %id, doi = %published.doi, "Comment published");
                Ok(published)
            }
            Ok(Err(e @ PublishError::Refused(_))) => {
                warn!(comment_id = %id, error = %e, "Publication refused");
                workflow_metrics().record_publication(false);
                self.revert(id, e.to_string()).await?;
                Err(PublicationError::Failed(e))
            }
            Ok(Err(e @ PublishError::Unavailable(_))) => {
                warn!(comment_id = %id, error = %e, "Publication outcome unknown; comment stays pending");
                Err(PublicationError::Failed(e))
            }
            Err(_) => {
                warn!(comment_id = %id, timeout = ?self.timeout, "Publication timed out; comment stays pending");
                Err(PublicationError::TimedOut(self.timeout))
            }
        }
    }

    async fn revert(&self, id: CommentId, reason: String) -> Result<(), HandlerError> {
        // If this write fails the comment stays BeingPublished and can be retried later
        self.workflow
            .record_publication_failure(id, reason)
            .await
            .map(|_| ())
            .inspect_err(|e| error!(comment_id = %id, error = %e, "Could not record failed publication"))
    }
}
