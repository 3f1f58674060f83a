pub mod create;
pub mod delete;
pub mod get;
pub mod patch;
pub mod tree;
pub mod validator;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use self::tree::find_comment_by_id;

/// Placeholder stored in place of the message of a soft-deleted entry.
pub const DELETED_MESSAGE_PLACEHOLDER: &str = "[Message deleted]";

// The flat record as it comes out of storage and goes over the wire
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub short_id: Option<String>,
    pub message: String,
    pub author_id: String,
    pub author_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub author_image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub replied_to_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub replied_to_user_name: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl CommentRecord {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The record was touched after creation (edited or soft-deleted).
    pub fn is_edited(&self) -> bool {
        self.updated_at != self.created_at
    }

    /// Human-facing reference: the short id when there is one.
    pub fn display_id(&self) -> &str {
        self.short_id.as_deref().unwrap_or(&self.id)
    }
}

/// Node of the forest produced by [`tree::build_comment_tree`].
///
/// This shape can hold arbitrarily deep chains so that the validator has
/// something to report on; [`RootComment`] is the two-level view handed to
/// clients.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub record: CommentRecord,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn new(record: CommentRecord) -> Self {
        Self {
            record,
            replies: Vec::new(),
        }
    }

    /// Resolves the parent by id against `forest`. Nodes never own or point
    /// at their parent.
    pub fn parent<'a>(&self, forest: &'a [CommentNode]) -> Option<&'a CommentNode> {
        self.record
            .parent_id
            .as_deref()
            .and_then(|parent_id| find_comment_by_id(forest, parent_id))
    }

    pub fn into_parts(mut self) -> (CommentRecord, Vec<CommentNode>) {
        (
            std::mem::take(&mut self.record),
            std::mem::take(&mut self.replies),
        )
    }
}

// Chains can be as deep as the data is broken, so never drop them recursively
impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

/// A reply carries no replies of its own.
pub type ReplyComment = CommentRecord;

// The model that will be returned to the client
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RootComment {
    #[serde(flatten)]
    pub record: CommentRecord,
    pub replies: Vec<ReplyComment>,
}

impl From<CommentNode> for RootComment {
    /// Anything nested below depth 2 is lifted onto the root so that a
    /// broken chain still renders inside its thread.
    fn from(node: CommentNode) -> Self {
        let (record, direct) = node.into_parts();
        let mut replies = Vec::with_capacity(direct.len());
        let mut stack: Vec<CommentNode> = direct.into_iter().rev().collect();

        while let Some(reply) = stack.pop() {
            let (reply, nested) = reply.into_parts();
            stack.extend(nested.into_iter().rev());
            replies.push(reply);
        }

        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        RootComment { record, replies }
    }
}
