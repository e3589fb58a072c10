use anyhow::Result;
use serde_json::json;

use super::{print_json, DynWorkflow};
use crate::workflow::{AuthorId, Command, CommentId};

/// A command issued by an author against one of their comments
pub struct AuthorCommand {
    pub id: CommentId,
    pub user: AuthorId,
    pub command: Command,
}

impl AuthorCommand {
    pub fn new(id: CommentId, user: AuthorId, command: Command) -> Self {
        Self { id, user, command }
    }

    pub async fn execute(self, workflow: &DynWorkflow) -> Result<()> {
        let state = workflow.handle(self.id, &self.user, self.command).await?;
        let next = workflow.next_step(&state);
        print_json(&json!({
            "id": self.id,
            "state": state,
            "next": next,
        }))
    }
}
