// Comment submission workflow
//
// Pure domain (types, state, commands, transition, resolver) plus the
// handler and publication coordinator that talk to the store.

pub mod commands;
pub mod handler;
pub mod publication;
pub mod resolver;
pub mod state;
pub mod transition;
pub mod types;

#[cfg(test)]
pub(crate) mod mocks;

pub use commands::{Command, CommandTag};
pub use handler::{CommentWorkflow, HandlerError, QueryError};
pub use publication::{
    PublicationCoordinator, PublicationError, PublicationRequest, PublishError, Publisher,
};
pub use resolver::{next_expected_command, ExpectedCommand, NextStep, TerminalRedirect};
pub use state::{
    CommentState, CompletedComment, DraftComment, Requirement, StateTag, WorkflowPolicy,
};
pub use transition::{apply, Rejection};
pub use types::{
    AuthorId, CommentId, CommentText, CompetingInterests, Doi, InvalidValue, Persona,
    PrereviewId, PublishedComment,
};
