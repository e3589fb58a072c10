use anyhow::Result;
use serde_json::json;

use super::{print_json, DynWorkflow};
use crate::workflow::{AuthorId, CommentId};

pub struct StateCommand {
    id: CommentId,
    user: Option<AuthorId>,
}

impl StateCommand {
    pub fn new(id: CommentId, user: Option<AuthorId>) -> Self {
        Self { id, user }
    }

    pub async fn execute(&self, workflow: &DynWorkflow) -> Result<()> {
        let state = match &self.user {
            Some(user) => workflow.get_state_for(self.id, user).await?,
            None => workflow.get_state(self.id).await?,
        };
        print_json(&json!({ "id": self.id, "state": state }))
    }
}

pub struct NextCommand {
    id: CommentId,
    user: AuthorId,
}

impl NextCommand {
    pub fn new(id: CommentId, user: AuthorId) -> Self {
        Self { id, user }
    }

    pub async fn execute(&self, workflow: &DynWorkflow) -> Result<()> {
        let next = workflow.next_step_for(self.id, &self.user).await?;
        print_json(&json!({ "id": self.id, "next": next }))
    }
}
