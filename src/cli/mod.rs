use clap::{Parser, Subcommand, ValueEnum};

use crate::config::StoreBackend;
use crate::workflow::{AuthorId, CommentId, Doi, Persona};

pub mod commands;

#[derive(Parser)]
#[command(name = "prereview-workflow")]
#[command(about = "Drive PREreview comment submissions through their workflow")]
#[command(long_about = "Inspect and advance comment submissions against the configured state store. \
                       Every command prints the resulting state or next step as JSON.")]
pub struct Cli {
    /// Override the configured store backend
    #[arg(long, global = true, value_enum)]
    pub store: Option<BackendArg>,

    /// Override the directory used by the filesystem backend
    #[arg(long, global = true)]
    pub directory: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackendArg {
    Memory,
    Filesystem,
    Sqlite,
}

impl From<BackendArg> for StoreBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Memory => StoreBackend::Memory,
            BackendArg::Filesystem => StoreBackend::Filesystem,
            BackendArg::Sqlite => StoreBackend::Sqlite,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PersonaArg {
    Public,
    Pseudonym,
}

impl From<PersonaArg> for Persona {
    fn from(arg: PersonaArg) -> Self {
        match arg {
            PersonaArg::Public => Persona::Public,
            PersonaArg::Pseudonym => Persona::Pseudonym,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the stored state of a comment
    State {
        #[arg(long, help = "Comment id")]
        id: CommentId,
        /// Only show the comment if it belongs to this author
        #[arg(long, help = "ORCID iD of the asking author")]
        user: Option<AuthorId>,
    },
    /// Show what the author should do next
    Next {
        #[arg(long, help = "Comment id")]
        id: CommentId,
        #[arg(long, help = "ORCID iD of the asking author")]
        user: AuthorId,
    },
    /// Start a new comment on a PREreview
    Start {
        #[arg(long, help = "ORCID iD of the author")]
        user: AuthorId,
        #[arg(long, help = "Id of the PREreview being commented on")]
        prereview: u64,
        /// Reuse an id instead of generating one
        #[arg(long, help = "Comment id (a new one is generated when omitted)")]
        id: Option<CommentId>,
    },
    /// Enter or replace the comment text
    EnterComment {
        #[arg(long)]
        id: CommentId,
        #[arg(long)]
        user: AuthorId,
        #[arg(long, help = "Comment body")]
        text: String,
    },
    /// Choose the name the comment is published under
    ChoosePersona {
        #[arg(long)]
        id: CommentId,
        #[arg(long)]
        user: AuthorId,
        #[arg(long, value_enum)]
        persona: PersonaArg,
    },
    /// Declare competing interests, or none when no details are given
    DeclareCompetingInterests {
        #[arg(long)]
        id: CommentId,
        #[arg(long)]
        user: AuthorId,
        #[arg(long, help = "Details of the competing interests")]
        details: Option<String>,
    },
    /// Agree to the code of conduct
    AgreeToCodeOfConduct {
        #[arg(long)]
        id: CommentId,
        #[arg(long)]
        user: AuthorId,
    },
    /// Confirm the author has a verified email address
    ConfirmEmail {
        #[arg(long)]
        id: CommentId,
        #[arg(long)]
        user: AuthorId,
    },
    /// Check the draft is complete and make it ready for publishing
    Finalize {
        #[arg(long)]
        id: CommentId,
        #[arg(long)]
        user: AuthorId,
    },
    /// Request publication; completion is recorded with mark-published or mark-failed
    Publish {
        #[arg(long)]
        id: CommentId,
        #[arg(long)]
        user: AuthorId,
    },
    /// Record a successful publication (operator)
    MarkPublished {
        #[arg(long)]
        id: CommentId,
        #[arg(long, help = "DOI assigned to the comment")]
        doi: Doi,
        #[arg(long, help = "Numeric id assigned by the publication service")]
        record: u64,
    },
    /// Record a failed publication so the author can try again (operator)
    MarkFailed {
        #[arg(long)]
        id: CommentId,
        #[arg(long, default_value = "publication failed")]
        reason: String,
    },
}
