use anyhow::Result;
use serde::Serialize;
use tracing::info;

use super::{Cli, Commands};
use crate::config::{PrereviewWorkflowConfig, StoreBackend, StoreConfig};
use crate::store::{FileSystemStateStore, InMemoryStateStore, StateStore};
use crate::workflow::{
    Command, CommentText, CommentWorkflow, CompetingInterests, PrereviewId,
};

pub mod author;
pub mod operator;
pub mod query;

pub use author::AuthorCommand;
pub use operator::{MarkFailedCommand, MarkPublishedCommand};
pub use query::{NextCommand, StateCommand};

pub type DynWorkflow = CommentWorkflow<Box<dyn StateStore>>;

/// Open the store selected by configuration
pub async fn open_store(config: &StoreConfig) -> Result<Box<dyn StateStore>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory state store; nothing survives this process");
            Ok(Box::new(InMemoryStateStore::new()))
        }
        StoreBackend::Filesystem => {
            info!(directory = %config.directory, "Using filesystem state store");
            Ok(Box::new(FileSystemStateStore::new(&config.directory)))
        }
        #[cfg(feature = "database")]
        StoreBackend::Sqlite => {
            let store = crate::store::SqliteStateStore::connect(
                &config.database_url,
                config.max_connections,
                config.auto_migrate,
            )
            .await?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "database"))]
        StoreBackend::Sqlite => {
            anyhow::bail!("the sqlite store requires building with the `database` feature")
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration
pub fn effective_config(cli: &Cli, loaded: &PrereviewWorkflowConfig) -> PrereviewWorkflowConfig {
    let mut config = loaded.clone();
    if let Some(backend) = cli.store {
        config.store.backend = backend.into();
    }
    if let Some(directory) = &cli.directory {
        config.store.directory = directory.clone();
    }
    config
}

pub async fn run(cli: Cli, config: &PrereviewWorkflowConfig) -> Result<()> {
    let store = open_store(&config.store).await?;
    let workflow = CommentWorkflow::new(store, config.policy());

    match cli.command {
        Commands::State { id, user } => StateCommand::new(id, user).execute(&workflow).await,
        Commands::Next { id, user } => NextCommand::new(id, user).execute(&workflow).await,
        Commands::Start { user, prereview, id } => {
            let command = Command::StartComment {
                author_id: user.clone(),
                prereview_id: PrereviewId(prereview),
            };
            AuthorCommand::new(id.unwrap_or_default(), user, command)
                .execute(&workflow)
                .await
        }
        Commands::EnterComment { id, user, text } => {
            let comment = CommentText::parse(&text)?;
            AuthorCommand::new(id, user, Command::EnterComment { comment })
                .execute(&workflow)
                .await
        }
        Commands::ChoosePersona { id, user, persona } => {
            let command = Command::ChoosePersona {
                persona: persona.into(),
            };
            AuthorCommand::new(id, user, command).execute(&workflow).await
        }
        Commands::DeclareCompetingInterests { id, user, details } => {
            let competing_interests = match details {
                Some(details) => CompetingInterests::declared(&details)?,
                None => CompetingInterests::None,
            };
            let command = Command::DeclareCompetingInterests {
                competing_interests,
            };
            AuthorCommand::new(id, user, command).execute(&workflow).await
        }
        Commands::AgreeToCodeOfConduct { id, user } => {
            AuthorCommand::new(id, user, Command::AgreeToCodeOfConduct)
                .execute(&workflow)
                .await
        }
        Commands::ConfirmEmail { id, user } => {
            AuthorCommand::new(id, user, Command::ConfirmExistenceOfVerifiedEmailAddress)
                .execute(&workflow)
                .await
        }
        Commands::Finalize { id, user } => {
            AuthorCommand::new(id, user, Command::Finalize)
                .execute(&workflow)
                .await
        }
        Commands::Publish { id, user } => {
            AuthorCommand::new(id, user, Command::PublishComment)
                .execute(&workflow)
                .await
        }
        Commands::MarkPublished { id, doi, record } => {
            MarkPublishedCommand::new(id, doi, record)
                .execute(&workflow)
                .await
        }
        Commands::MarkFailed { id, reason } => {
            MarkFailedCommand::new(id, reason).execute(&workflow).await
        }
    }
}
