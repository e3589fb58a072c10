// Next-command resolution shared by every page of the comment flow

use serde::{Deserialize, Serialize};

use super::state::{CommentState, Requirement, WorkflowPolicy};
use super::types::Doi;

/// The one command the author is expected to issue next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedCommand {
    StartComment,
    EnterComment,
    ChoosePersona,
    DeclareCompetingInterests,
    AgreeToCodeOfConduct,
    VerifyEmailAddress,
    Finalize,
    PublishComment,
}

impl From<Requirement> for ExpectedCommand {
    fn from(requirement: Requirement) -> Self {
        match requirement {
            Requirement::Comment => ExpectedCommand::EnterComment,
            Requirement::Persona => ExpectedCommand::ChoosePersona,
            Requirement::CompetingInterests => ExpectedCommand::DeclareCompetingInterests,
            Requirement::CodeOfConduct => ExpectedCommand::AgreeToCodeOfConduct,
            Requirement::VerifiedEmailAddress => ExpectedCommand::VerifyEmailAddress,
        }
    }
}

/// Pages shown once the comment no longer accepts input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalRedirect {
    PublishingInProgress,
    Published { doi: Doi, id: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextStep {
    Expected(ExpectedCommand),
    Terminal(TerminalRedirect),
}

impl NextStep {
    pub fn expected(&self) -> Option<ExpectedCommand> {
        match self {
            NextStep::Expected(expected) => Some(*expected),
            NextStep::Terminal(_) => None,
        }
    }
}

/// Resolve what the author should do next. Total over every state.
pub fn next_expected_command(state: &CommentState, policy: &WorkflowPolicy) -> NextStep {
    match state {
        CommentState::NotStarted => NextStep::Expected(ExpectedCommand::StartComment),
        CommentState::InProgress { draft, .. } => NextStep::Expected(
            draft
                .first_unmet(policy)
                .map(ExpectedCommand::from)
                .unwrap_or(ExpectedCommand::Finalize),
        ),
        CommentState::ReadyForPublishing { .. } => {
            NextStep::Expected(ExpectedCommand::PublishComment)
        }
        CommentState::BeingPublished { .. } => {
            NextStep::Terminal(TerminalRedirect::PublishingInProgress)
        }
        CommentState::Published { doi, id, .. } => NextStep::Terminal(TerminalRedirect::Published {
            doi: doi.clone(),
            id: *id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::state::DraftComment;
    use crate::workflow::types::{AuthorId, CommentText, CompetingInterests, Persona, PrereviewId};

    fn in_progress(draft: DraftComment) -> CommentState {
        CommentState::InProgress {
            author_id: AuthorId::parse("0000-0002-1825-0097").unwrap(),
            prereview_id: PrereviewId(3),
            draft,
        }
    }

    #[test]
    fn test_not_started_expects_start() {
        assert_eq!(
            next_expected_command(&CommentState::NotStarted, &WorkflowPolicy::default()),
            NextStep::Expected(ExpectedCommand::StartComment)
        );
    }

    #[test]
    fn test_in_progress_walks_requirements_in_order() {
        let policy = WorkflowPolicy::default();
        let mut draft = DraftComment::default();
        let mut seen = Vec::new();

        loop {
            let step = next_expected_command(&in_progress(draft.clone()), &policy);
            let expected = step.expected().expect("in-progress always expects a command");
            seen.push(expected);

            match expected {
                ExpectedCommand::EnterComment => {
                    draft.comment = Some(CommentText::parse("Helpful review").unwrap())
                }
                ExpectedCommand::ChoosePersona => draft.persona = Some(Persona::Public),
                ExpectedCommand::DeclareCompetingInterests => {
                    draft.competing_interests = Some(CompetingInterests::None)
                }
                ExpectedCommand::AgreeToCodeOfConduct => draft.agreed_to_code_of_conduct = true,
                ExpectedCommand::VerifyEmailAddress => draft.verified_email_address_exists = true,
                ExpectedCommand::Finalize => break,
                other => panic!("unexpected step {other:?}"),
            }
        }

        assert_eq!(
            seen,
            vec![
                ExpectedCommand::EnterComment,
                ExpectedCommand::ChoosePersona,
                ExpectedCommand::DeclareCompetingInterests,
                ExpectedCommand::AgreeToCodeOfConduct,
                ExpectedCommand::VerifyEmailAddress,
                ExpectedCommand::Finalize,
            ]
        );
    }

    #[test]
    fn test_email_step_skipped_when_not_required() {
        let policy = WorkflowPolicy {
            require_verified_email: false,
        };
        let draft = DraftComment {
            comment: Some(CommentText::parse("Helpful review").unwrap()),
            persona: Some(Persona::Pseudonym),
            competing_interests: Some(CompetingInterests::None),
            agreed_to_code_of_conduct: true,
            verified_email_address_exists: false,
        };

        assert_eq!(
            next_expected_command(&in_progress(draft), &policy),
            NextStep::Expected(ExpectedCommand::Finalize)
        );
    }

    #[test]
    fn test_later_fields_do_not_skip_earlier_ones() {
        let draft = DraftComment {
            competing_interests: Some(CompetingInterests::None),
            verified_email_address_exists: true,
            ..DraftComment::default()
        };

        assert_eq!(
            next_expected_command(&in_progress(draft), &WorkflowPolicy::default()),
            NextStep::Expected(ExpectedCommand::EnterComment)
        );
    }
}
