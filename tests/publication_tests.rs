//! Publication through a mocked publication service

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::function;
use once_cell::sync::Lazy;
use prereview_workflow::store::{FileSystemStateStore, StateStore};
use prereview_workflow::workflow::{
    AuthorId, Command, CommentId, CommentText, CommentWorkflow, CompetingInterests, Doi,
    PrereviewId, Persona, PublicationCoordinator, PublicationError, PublicationRequest,
    PublishError, PublishedComment, Publisher, StateTag, WorkflowPolicy,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

mock! {
    pub DepositService {}

    #[async_trait]
    impl Publisher for DepositService {
        async fn publish(&self, request: &PublicationRequest) -> Result<PublishedComment, PublishError>;
    }
}

static AUTHOR: Lazy<AuthorId> = Lazy::new(|| AuthorId::parse("0000-0003-4921-6155").unwrap());

fn deposited() -> PublishedComment {
    PublishedComment {
        doi: Doi::parse("10.5281/zenodo.8012345").unwrap(),
        id: 8012345,
    }
}

async fn ready_to_publish(dir: &TempDir) -> (Arc<CommentWorkflow<FileSystemStateStore>>, CommentId) {
    let workflow = Arc::new(CommentWorkflow::new(
        FileSystemStateStore::new(dir.path()),
        WorkflowPolicy::default(),
    ));
    let id = CommentId::new();
    for command in [
        Command::StartComment {
            author_id: AUTHOR.clone(),
            prereview_id: PrereviewId(301),
        },
        Command::EnterComment {
            comment: CommentText::parse("I second the point about sample size.").unwrap(),
        },
        Command::ChoosePersona {
            persona: Persona::Public,
        },
        Command::DeclareCompetingInterests {
            competing_interests: CompetingInterests::None,
        },
        Command::AgreeToCodeOfConduct,
        Command::ConfirmExistenceOfVerifiedEmailAddress,
        Command::Finalize,
    ] {
        workflow.handle(id, &AUTHOR, command).await.unwrap();
    }
    (workflow, id)
}

#[tokio::test]
async fn publishes_the_finalized_snapshot() {
    let dir = TempDir::new().unwrap();
    let (workflow, id) = ready_to_publish(&dir).await;

    let mut service = MockDepositService::new();
    service
        .expect_publish()
        .with(function(move |request: &PublicationRequest| {
            request.comment_id == id
                && request.prereview_id == PrereviewId(301)
                && request.comment.comment.as_str() == "I second the point about sample size."
        }))
        .times(1)
        .returning(|_| Ok(deposited()));

    let coordinator = PublicationCoordinator::new(workflow.clone(), service, Duration::from_secs(5));
    assert_eq!(coordinator.publish(id, &AUTHOR).await, Ok(deposited()));
    assert_eq!(
        workflow.get_state(id).await.unwrap().published(),
        Some(deposited())
    );
}

#[tokio::test]
async fn refused_deposit_returns_the_comment_to_ready() {
    let dir = TempDir::new().unwrap();
    let (workflow, id) = ready_to_publish(&dir).await;

    let mut service = MockDepositService::new();
    service
        .expect_publish()
        .times(1)
        .returning(|_| Err(PublishError::Refused("422 from deposit API".to_string())));

    let coordinator = PublicationCoordinator::new(workflow.clone(), service, Duration::from_secs(5));
    assert_eq!(
        coordinator.publish(id, &AUTHOR).await,
        Err(PublicationError::Failed(PublishError::Refused(
            "422 from deposit API".to_string()
        )))
    );

    let version = workflow.store().get(id).await.unwrap();
    assert_eq!(version.state.tag(), StateTag::ReadyForPublishing);
    assert_eq!(
        workflow.next_step(&version.state).expected(),
        Some(prereview_workflow::workflow::ExpectedCommand::PublishComment)
    );
}

#[tokio::test]
async fn pending_publication_resumes_after_restart() {
    let dir = TempDir::new().unwrap();
    let (workflow, id) = ready_to_publish(&dir).await;

    // Process stops right after BeingPublished was written
    workflow
        .handle(id, &AUTHOR, Command::PublishComment)
        .await
        .unwrap();
    drop(workflow);

    let restarted = Arc::new(CommentWorkflow::new(
        FileSystemStateStore::new(dir.path()),
        WorkflowPolicy::default(),
    ));
    assert_eq!(
        restarted.get_state(id).await.unwrap().tag(),
        StateTag::BeingPublished
    );

    let mut service = MockDepositService::new();
    service
        .expect_publish()
        .times(1)
        .returning(|_| Ok(deposited()));
    let coordinator = PublicationCoordinator::new(restarted, service, Duration::from_secs(5));
    assert_eq!(coordinator.complete_pending(id).await, Ok(deposited()));
}

#[tokio::test]
async fn other_authors_cannot_publish() {
    let dir = TempDir::new().unwrap();
    let (workflow, id) = ready_to_publish(&dir).await;
    let intruder = AuthorId::parse("0000-0002-9079-593X").unwrap();

    let mut service = MockDepositService::new();
    service.expect_publish().never();
    let coordinator = PublicationCoordinator::new(workflow.clone(), service, Duration::from_secs(5));

    assert_eq!(
        coordinator.publish(id, &intruder).await,
        Err(PublicationError::Workflow(
            prereview_workflow::workflow::HandlerError::NotFound
        ))
    );
    assert_eq!(
        workflow.get_state(id).await.unwrap().tag(),
        StateTag::ReadyForPublishing
    );
}
