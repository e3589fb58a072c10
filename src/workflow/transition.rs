// Transition function: (state, command) -> state | rejection
//
// Pure and total. Logging and persistence belong to the handler.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::commands::{Command, CommandTag};
use super::state::{CommentState, CompletedComment, DraftComment, Requirement, StateTag, WorkflowPolicy};
use super::types::{AuthorId, PrereviewId};

/// Why a command could not be applied to the current state
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Rejection {
    #[error("{command} is not allowed while the comment is {state}")]
    IllegalCommand { state: StateTag, command: CommandTag },

    #[error("comment is incomplete: {missing} is missing")]
    Incomplete { missing: Requirement },

    #[error("comment has already been published")]
    AlreadyPublished,
}

/// Apply `command` to `state`, returning the next state or the reason it was refused
pub fn apply(
    state: &CommentState,
    command: &Command,
    policy: &WorkflowPolicy,
) -> Result<CommentState, Rejection> {
    match (state, command) {
        (CommentState::Published { .. }, _) => Err(Rejection::AlreadyPublished),

        (
            CommentState::NotStarted,
            Command::StartComment {
                author_id,
                prereview_id,
            },
        ) => Ok(in_progress(author_id, *prereview_id, DraftComment::default())),

        // Field edits merge into the draft; each replaces only its own field
        (
            CommentState::InProgress {
                author_id,
                prereview_id,
                draft,
            },
            Command::EnterComment { comment },
        ) => Ok(in_progress(
            author_id,
            *prereview_id,
            DraftComment {
                comment: Some(comment.clone()),
                ..draft.clone()
            },
        )),

        (
            CommentState::InProgress {
                author_id,
                prereview_id,
                draft,
            },
            Command::ChoosePersona { persona },
        ) => Ok(in_progress(
            author_id,
            *prereview_id,
            DraftComment {
                persona: Some(*persona),
                ..draft.clone()
            },
        )),

        (
            CommentState::InProgress {
                author_id,
                prereview_id,
                draft,
            },
            Command::DeclareCompetingInterests {
                competing_interests,
            },
        ) => Ok(in_progress(
            author_id,
            *prereview_id,
            DraftComment {
                competing_interests: Some(competing_interests.clone()),
                ..draft.clone()
            },
        )),

        (
            CommentState::InProgress {
                author_id,
                prereview_id,
                draft,
            },
            Command::AgreeToCodeOfConduct,
        ) => Ok(in_progress(
            author_id,
            *prereview_id,
            DraftComment {
                agreed_to_code_of_conduct: true,
                ..draft.clone()
            },
        )),

        (
            CommentState::InProgress {
                author_id,
                prereview_id,
                draft,
            },
            Command::ConfirmExistenceOfVerifiedEmailAddress,
        ) => Ok(in_progress(
            author_id,
            *prereview_id,
            DraftComment {
                verified_email_address_exists: true,
                ..draft.clone()
            },
        )),

        (
            CommentState::InProgress {
                author_id,
                prereview_id,
                draft,
            },
            Command::Finalize,
        ) => draft
            .complete(policy)
            .map(|comment| CommentState::ReadyForPublishing {
                author_id: author_id.clone(),
                prereview_id: *prereview_id,
                comment,
            })
            .map_err(|missing| Rejection::Incomplete { missing }),

        // Email verification may land after finalizing when the policy did not demand it
        (
            CommentState::ReadyForPublishing {
                author_id,
                prereview_id,
                comment,
            },
            Command::ConfirmExistenceOfVerifiedEmailAddress,
        ) if !comment.verified_email_address_exists => Ok(CommentState::ReadyForPublishing {
            author_id: author_id.clone(),
            prereview_id: *prereview_id,
            comment: CompletedComment {
                verified_email_address_exists: true,
                ..comment.clone()
            },
        }),

        (
            CommentState::ReadyForPublishing {
                author_id,
                prereview_id,
                comment,
            },
            Command::PublishComment,
        ) => Ok(CommentState::BeingPublished {
            author_id: author_id.clone(),
            prereview_id: *prereview_id,
            snapshot: comment.clone(),
        }),

        (
            CommentState::BeingPublished {
                author_id,
                prereview_id,
                snapshot,
            },
            Command::MarkCommentAsPublished { doi, id },
        ) => Ok(CommentState::Published {
            author_id: author_id.clone(),
            prereview_id: *prereview_id,
            snapshot: snapshot.clone(),
            doi: doi.clone(),
            id: *id,
        }),

        // Failed publication hands the snapshot back so the author can publish again
        (
            CommentState::BeingPublished {
                author_id,
                prereview_id,
                snapshot,
            },
            Command::MarkPublicationAsFailed { .. },
        ) => Ok(CommentState::ReadyForPublishing {
            author_id: author_id.clone(),
            prereview_id: *prereview_id,
            comment: snapshot.clone(),
        }),

        (state, command) => Err(Rejection::IllegalCommand {
            state: state.tag(),
            command: command.tag(),
        }),
    }
}

fn in_progress(author_id: &AuthorId, prereview_id: PrereviewId, draft: DraftComment) -> CommentState {
    CommentState::InProgress {
        author_id: author_id.clone(),
        prereview_id,
        draft,
    }
}
