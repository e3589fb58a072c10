// Commands that move a comment through its lifecycle

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{
    AuthorId, CommentText, CompetingInterests, Doi, Persona, PrereviewId, PublishedComment,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    StartComment {
        author_id: AuthorId,
        prereview_id: PrereviewId,
    },
    EnterComment {
        comment: CommentText,
    },
    ChoosePersona {
        persona: Persona,
    },
    DeclareCompetingInterests {
        competing_interests: CompetingInterests,
    },
    AgreeToCodeOfConduct,
    ConfirmExistenceOfVerifiedEmailAddress,
    Finalize,
    PublishComment,

    /// Raised by the publication service, never by an author
    MarkCommentAsPublished {
        doi: Doi,
        id: u64,
    },
    /// Raised by the publication service, never by an author
    MarkPublicationAsFailed {
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandTag {
    StartComment,
    EnterComment,
    ChoosePersona,
    DeclareCompetingInterests,
    AgreeToCodeOfConduct,
    ConfirmExistenceOfVerifiedEmailAddress,
    Finalize,
    PublishComment,
    MarkCommentAsPublished,
    MarkPublicationAsFailed,
}

impl CommandTag {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandTag::StartComment => "start-comment",
            CommandTag::EnterComment => "enter-comment",
            CommandTag::ChoosePersona => "choose-persona",
            CommandTag::DeclareCompetingInterests => "declare-competing-interests",
            CommandTag::AgreeToCodeOfConduct => "agree-to-code-of-conduct",
            CommandTag::ConfirmExistenceOfVerifiedEmailAddress => {
                "confirm-existence-of-verified-email-address"
            }
            CommandTag::Finalize => "finalize",
            CommandTag::PublishComment => "publish-comment",
            CommandTag::MarkCommentAsPublished => "mark-comment-as-published",
            CommandTag::MarkPublicationAsFailed => "mark-publication-as-failed",
        }
    }
}

impl fmt::Display for CommandTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Command {
    pub fn tag(&self) -> CommandTag {
        match self {
            Command::StartComment { .. } => CommandTag::StartComment,
            Command::EnterComment { .. } => CommandTag::EnterComment,
            Command::ChoosePersona { .. } => CommandTag::ChoosePersona,
            Command::DeclareCompetingInterests { .. } => CommandTag::DeclareCompetingInterests,
            Command::AgreeToCodeOfConduct => CommandTag::AgreeToCodeOfConduct,
            Command::ConfirmExistenceOfVerifiedEmailAddress => {
                CommandTag::ConfirmExistenceOfVerifiedEmailAddress
            }
            Command::Finalize => CommandTag::Finalize,
            Command::PublishComment => CommandTag::PublishComment,
            Command::MarkCommentAsPublished { .. } => CommandTag::MarkCommentAsPublished,
            Command::MarkPublicationAsFailed { .. } => CommandTag::MarkPublicationAsFailed,
        }
    }

    /// Internal completion events cannot be submitted through the author-facing handler
    pub fn is_user_issuable(&self) -> bool {
        !matches!(
            self,
            Command::MarkCommentAsPublished { .. } | Command::MarkPublicationAsFailed { .. }
        )
    }
}

impl From<PublishedComment> for Command {
    fn from(published: PublishedComment) -> Self {
        Command::MarkCommentAsPublished {
            doi: published.doi,
            id: published.id,
        }
    }
}
