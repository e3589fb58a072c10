// Lifecycle states of a single comment submission

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{
    AuthorId, CommentText, CompetingInterests, Doi, Persona, PrereviewId, PublishedComment,
};

/// System-wide rules the workflow is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowPolicy {
    /// Authors must have a verified contact email before a comment can be finalized
    pub require_verified_email: bool,
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self {
            require_verified_email: true,
        }
    }
}

/// A draft field that still has to be provided, in the order authors are asked for them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Requirement {
    Comment,
    Persona,
    CompetingInterests,
    CodeOfConduct,
    VerifiedEmailAddress,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Requirement::Comment => "comment",
            Requirement::Persona => "persona",
            Requirement::CompetingInterests => "competing interests",
            Requirement::CodeOfConduct => "code of conduct",
            Requirement::VerifiedEmailAddress => "verified email address",
        };
        f.write_str(name)
    }
}

/// Fields collected while a comment is being written; each may be present independently
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftComment {
    pub comment: Option<CommentText>,
    pub persona: Option<Persona>,
    pub competing_interests: Option<CompetingInterests>,
    pub agreed_to_code_of_conduct: bool,
    pub verified_email_address_exists: bool,
}

impl DraftComment {
    /// First requirement the draft does not meet yet, if any
    pub fn first_unmet(&self, policy: &WorkflowPolicy) -> Option<Requirement> {
        if self.comment.is_none() {
            Some(Requirement::Comment)
        } else if self.persona.is_none() {
            Some(Requirement::Persona)
        } else if self.competing_interests.is_none() {
            Some(Requirement::CompetingInterests)
        } else if !self.agreed_to_code_of_conduct {
            Some(Requirement::CodeOfConduct)
        } else if policy.require_verified_email && !self.verified_email_address_exists {
            Some(Requirement::VerifiedEmailAddress)
        } else {
            None
        }
    }

    /// Promote the draft to a complete comment, or name the first missing requirement
    pub fn complete(&self, policy: &WorkflowPolicy) -> Result<CompletedComment, Requirement> {
        if let Some(missing) = self.first_unmet(policy) {
            return Err(missing);
        }

        match (&self.comment, self.persona, &self.competing_interests) {
            (Some(comment), Some(persona), Some(competing_interests)) => Ok(CompletedComment {
                comment: comment.clone(),
                persona,
                competing_interests: competing_interests.clone(),
                verified_email_address_exists: self.verified_email_address_exists,
            }),
            (None, _, _) => Err(Requirement::Comment),
            (_, None, _) => Err(Requirement::Persona),
            (_, _, None) => Err(Requirement::CompetingInterests),
        }
    }
}

/// Every field a comment needs before it can be published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedComment {
    pub comment: CommentText,
    pub persona: Persona,
    pub competing_interests: CompetingInterests,
    pub verified_email_address_exists: bool,
}

/// The single state a comment occupies at any time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommentState {
    NotStarted,
    InProgress {
        author_id: AuthorId,
        prereview_id: PrereviewId,
        draft: DraftComment,
    },
    ReadyForPublishing {
        author_id: AuthorId,
        prereview_id: PrereviewId,
        comment: CompletedComment,
    },
    BeingPublished {
        author_id: AuthorId,
        prereview_id: PrereviewId,
        snapshot: CompletedComment,
    },
    Published {
        author_id: AuthorId,
        prereview_id: PrereviewId,
        snapshot: CompletedComment,
        doi: Doi,
        id: u64,
    },
}

/// Fieldless mirror of [`CommentState`], ordered along the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StateTag {
    NotStarted,
    InProgress,
    ReadyForPublishing,
    BeingPublished,
    Published,
}

impl StateTag {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StateTag::NotStarted => "not-started",
            StateTag::InProgress => "in-progress",
            StateTag::ReadyForPublishing => "ready-for-publishing",
            StateTag::BeingPublished => "being-published",
            StateTag::Published => "published",
        }
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CommentState {
    pub fn tag(&self) -> StateTag {
        match self {
            CommentState::NotStarted => StateTag::NotStarted,
            CommentState::InProgress { .. } => StateTag::InProgress,
            CommentState::ReadyForPublishing { .. } => StateTag::ReadyForPublishing,
            CommentState::BeingPublished { .. } => StateTag::BeingPublished,
            CommentState::Published { .. } => StateTag::Published,
        }
    }

    pub fn author_id(&self) -> Option<&AuthorId> {
        match self {
            CommentState::NotStarted => None,
            CommentState::InProgress { author_id, .. }
            | CommentState::ReadyForPublishing { author_id, .. }
            | CommentState::BeingPublished { author_id, .. }
            | CommentState::Published { author_id, .. } => Some(author_id),
        }
    }

    pub fn prereview_id(&self) -> Option<PrereviewId> {
        match self {
            CommentState::NotStarted => None,
            CommentState::InProgress { prereview_id, .. }
            | CommentState::ReadyForPublishing { prereview_id, .. }
            | CommentState::BeingPublished { prereview_id, .. }
            | CommentState::Published { prereview_id, .. } => Some(*prereview_id),
        }
    }

    /// True when `user` may see and act on this comment
    pub fn is_owned_by(&self, user: &AuthorId) -> bool {
        self.author_id().is_some_and(|author| author == user)
    }

    /// Identifiers of a published comment
    pub fn published(&self) -> Option<PublishedComment> {
        match self {
            CommentState::Published { doi, id, .. } => Some(PublishedComment {
                doi: doi.clone(),
                id: *id,
            }),
            _ => None,
        }
    }
}
