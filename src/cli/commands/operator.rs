// Completion events from the publication service, entered by an operator

use anyhow::Result;
use serde_json::json;

use super::{print_json, DynWorkflow};
use crate::workflow::{CommentId, Doi, PublishedComment};

pub struct MarkPublishedCommand {
    id: CommentId,
    published: PublishedComment,
}

impl MarkPublishedCommand {
    pub fn new(id: CommentId, doi: Doi, record: u64) -> Self {
        Self {
            id,
            published: PublishedComment { doi, id: record },
        }
    }

    pub async fn execute(self, workflow: &DynWorkflow) -> Result<()> {
        let state = workflow.record_publication(self.id, self.published).await?;
        print_json(&json!({ "id": self.id, "state": state }))
    }
}

pub struct MarkFailedCommand {
    id: CommentId,
    reason: String,
}

impl MarkFailedCommand {
    pub fn new(id: CommentId, reason: String) -> Self {
        Self { id, reason }
    }

    pub async fn execute(self, workflow: &DynWorkflow) -> Result<()> {
        let state = workflow
            .record_publication_failure(self.id, self.reason)
            .await?;
        print_json(&json!({ "id": self.id, "state": state }))
    }
}
