//! End-to-end tests of the comment workflow against the file system store
//!
//! Each test gets its own temporary directory so records never leak between tests.

use once_cell::sync::Lazy;
use prereview_workflow::store::{FileSystemStateStore, StateStore};
use prereview_workflow::workflow::{
    AuthorId, Command, CommentId, CommentState, CommentText, CommentWorkflow, CompetingInterests,
    Doi, ExpectedCommand, HandlerError, NextStep, Persona, PrereviewId, PublishedComment,
    QueryError, Rejection, Requirement, StateTag, TerminalRedirect, WorkflowPolicy,
};
use tempfile::TempDir;

static AUTHOR: Lazy<AuthorId> = Lazy::new(|| AuthorId::parse("0000-0002-1825-0097").unwrap());
static OTHER_AUTHOR: Lazy<AuthorId> =
    Lazy::new(|| AuthorId::parse("0000-0001-5109-3700").unwrap());

fn workflow_in(dir: &TempDir) -> CommentWorkflow<FileSystemStateStore> {
    CommentWorkflow::new(
        FileSystemStateStore::new(dir.path()),
        WorkflowPolicy::default(),
    )
}

fn start() -> Command {
    Command::StartComment {
        author_id: AUTHOR.clone(),
        prereview_id: PrereviewId(12),
    }
}

fn text(value: &str) -> Command {
    Command::EnterComment {
        comment: CommentText::parse(value).unwrap(),
    }
}

async fn complete_draft(workflow: &CommentWorkflow<FileSystemStateStore>, id: CommentId) {
    for command in [
        start(),
        text("The methods section answers my earlier question."),
        Command::ChoosePersona {
            persona: Persona::Pseudonym,
        },
        Command::DeclareCompetingInterests {
            competing_interests: CompetingInterests::None,
        },
        Command::AgreeToCodeOfConduct,
        Command::ConfirmExistenceOfVerifiedEmailAddress,
    ] {
        workflow.handle(id, &AUTHOR, command).await.unwrap();
    }
}

#[tokio::test]
async fn starting_a_comment_records_the_author() {
    let dir = TempDir::new().unwrap();
    let workflow = workflow_in(&dir);
    let id = CommentId::new();

    let state = workflow.handle(id, &AUTHOR, start()).await.unwrap();

    match &state {
        CommentState::InProgress {
            author_id,
            prereview_id,
            draft,
        } => {
            assert_eq!(author_id, &*AUTHOR);
            assert_eq!(*prereview_id, PrereviewId(12));
            assert_eq!(draft, &Default::default());
        }
        other => panic!("expected in-progress comment, got {other:?}"),
    }
    assert!(dir.path().join(format!("{id}.state.json")).exists());
}

#[tokio::test]
async fn competing_interests_are_added_to_existing_text() {
    let dir = TempDir::new().unwrap();
    let workflow = workflow_in(&dir);
    let id = CommentId::new();
    workflow.handle(id, &AUTHOR, start()).await.unwrap();
    workflow
        .handle(id, &AUTHOR, text("Useful preprint"))
        .await
        .unwrap();

    let state = workflow
        .handle(
            id,
            &AUTHOR,
            Command::DeclareCompetingInterests {
                competing_interests: CompetingInterests::None,
            },
        )
        .await
        .unwrap();

    let CommentState::InProgress { draft, .. } = state else {
        panic!("expected in-progress comment");
    };
    assert_eq!(draft.comment.unwrap().as_str(), "Useful preprint");
    assert_eq!(draft.competing_interests, Some(CompetingInterests::None));
    assert_eq!(draft.persona, None);
}

#[tokio::test]
async fn finalize_needs_every_field() {
    let dir = TempDir::new().unwrap();
    let workflow = workflow_in(&dir);

    // One field missing: rejected and nothing changes
    let incomplete = CommentId::new();
    workflow.handle(incomplete, &AUTHOR, start()).await.unwrap();
    workflow
        .handle(incomplete, &AUTHOR, text("Missing the rest"))
        .await
        .unwrap();
    let before = workflow.get_state(incomplete).await.unwrap();
    assert_eq!(
        workflow.handle(incomplete, &AUTHOR, Command::Finalize).await,
        Err(HandlerError::Rejected(Rejection::Incomplete {
            missing: Requirement::Persona
        }))
    );
    assert_eq!(workflow.get_state(incomplete).await.unwrap(), before);

    let complete = CommentId::new();
    complete_draft(&workflow, complete).await;
    let state = workflow
        .handle(complete, &AUTHOR, Command::Finalize)
        .await
        .unwrap();
    assert_eq!(state.tag(), StateTag::ReadyForPublishing);
}

#[tokio::test]
async fn publishing_goes_through_being_published() {
    let dir = TempDir::new().unwrap();
    let workflow = workflow_in(&dir);
    let id = CommentId::new();
    complete_draft(&workflow, id).await;
    workflow.handle(id, &AUTHOR, Command::Finalize).await.unwrap();

    let pending = workflow
        .handle(id, &AUTHOR, Command::PublishComment)
        .await
        .unwrap();
    assert_eq!(pending.tag(), StateTag::BeingPublished);

    // The pending state survives a restart
    let reopened = workflow_in(&dir);
    assert_eq!(
        reopened.next_step_for(id, &AUTHOR).await,
        Ok(NextStep::Terminal(TerminalRedirect::PublishingInProgress))
    );

    let published = PublishedComment {
        doi: Doi::parse("10.5281/zenodo.10779311").unwrap(),
        id: 10779311,
    };
    let state = reopened
        .record_publication(id, published.clone())
        .await
        .unwrap();
    assert_eq!(state.published(), Some(published));
}

#[tokio::test]
async fn published_comments_refuse_every_command() {
    let dir = TempDir::new().unwrap();
    let workflow = workflow_in(&dir);
    let id = CommentId::new();
    complete_draft(&workflow, id).await;
    workflow.handle(id, &AUTHOR, Command::Finalize).await.unwrap();
    workflow
        .handle(id, &AUTHOR, Command::PublishComment)
        .await
        .unwrap();
    workflow
        .record_publication(
            id,
            PublishedComment {
                doi: Doi::parse("10.5281/zenodo.1").unwrap(),
                id: 1,
            },
        )
        .await
        .unwrap();
    let published = workflow.get_state(id).await.unwrap();

    for command in [
        start(),
        text("Edited after publication"),
        Command::AgreeToCodeOfConduct,
        Command::Finalize,
        Command::PublishComment,
    ] {
        assert_eq!(
            workflow.handle(id, &AUTHOR, command).await,
            Err(HandlerError::Rejected(Rejection::AlreadyPublished))
        );
    }
    assert_eq!(workflow.get_state(id).await.unwrap(), published);
}

#[tokio::test]
async fn another_author_cannot_tell_the_comment_exists() {
    let dir = TempDir::new().unwrap();
    let workflow = workflow_in(&dir);
    let id = CommentId::new();
    workflow.handle(id, &AUTHOR, start()).await.unwrap();
    let unknown = CommentId::new();

    assert_eq!(
        workflow.get_state_for(id, &OTHER_AUTHOR).await,
        Err(QueryError::NotFound)
    );
    assert_eq!(
        workflow.get_state_for(id, &OTHER_AUTHOR).await,
        workflow.get_state_for(unknown, &OTHER_AUTHOR).await
    );
    assert_eq!(
        workflow.next_step_for(id, &OTHER_AUTHOR).await,
        workflow.next_step_for(unknown, &OTHER_AUTHOR).await
    );
    assert_eq!(
        workflow
            .handle(id, &OTHER_AUTHOR, text("Not mine to write"))
            .await,
        workflow
            .handle(unknown, &OTHER_AUTHOR, text("Not mine to write"))
            .await
    );

    // The owner still sees the untouched draft
    assert_eq!(
        workflow.next_step_for(id, &AUTHOR).await,
        Ok(NextStep::Expected(ExpectedCommand::EnterComment))
    );
}

#[tokio::test]
async fn confirming_email_twice_gives_the_same_state() {
    let dir = TempDir::new().unwrap();
    let workflow = workflow_in(&dir);
    let id = CommentId::new();
    workflow.handle(id, &AUTHOR, start()).await.unwrap();

    let first = workflow
        .handle(id, &AUTHOR, Command::ConfirmExistenceOfVerifiedEmailAddress)
        .await
        .unwrap();
    let version = workflow.store().get(id).await.unwrap().version;
    let second = workflow
        .handle(id, &AUTHOR, Command::ConfirmExistenceOfVerifiedEmailAddress)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(workflow.store().get(id).await.unwrap().version, version);
}

#[tokio::test]
async fn email_step_is_skipped_when_not_required() {
    let dir = TempDir::new().unwrap();
    let workflow = CommentWorkflow::new(
        FileSystemStateStore::new(dir.path()),
        WorkflowPolicy {
            require_verified_email: false,
        },
    );
    let id = CommentId::new();
    for command in [
        start(),
        text("No email needed"),
        Command::ChoosePersona {
            persona: Persona::Public,
        },
        Command::DeclareCompetingInterests {
            competing_interests: CompetingInterests::declared("I work in the same lab").unwrap(),
        },
        Command::AgreeToCodeOfConduct,
    ] {
        workflow.handle(id, &AUTHOR, command).await.unwrap();
    }

    assert_eq!(
        workflow.next_step_for(id, &AUTHOR).await,
        Ok(NextStep::Expected(ExpectedCommand::Finalize))
    );
    assert!(workflow.handle(id, &AUTHOR, Command::Finalize).await.is_ok());
}
