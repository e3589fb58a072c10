// PREreview comment workflow library
// Exposes the workflow engine and its stores for the binary and for integration tests

pub mod cli;
pub mod config;
pub mod observability;
pub mod store;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use config::{config, init_config, PrereviewWorkflowConfig, StoreBackend};
pub use observability::{workflow_metrics, OperationTimer, WorkflowMetrics, WorkflowStats};
pub use store::{
    FileSystemStateStore, InMemoryStateStore, StateStore, StoreError, Version, VersionedState,
};
#[cfg(feature = "database")]
pub use store::SqliteStateStore;
pub use telemetry::{create_command_span, generate_correlation_id, init_telemetry};
pub use workflow::{
    apply, next_expected_command, AuthorId, Command, CommandTag, CommentId, CommentState,
    CommentWorkflow, ExpectedCommand, HandlerError, NextStep, PublicationCoordinator,
    PublicationError, PublishError, Publisher, QueryError, Rejection, StateTag, WorkflowPolicy,
};
