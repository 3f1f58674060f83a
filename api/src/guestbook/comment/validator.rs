use axum::http::StatusCode;
use serde::Serialize;

use crate::error::ApiRequestError;

use super::{CommentNode, CommentRecord};

const MAX_DEPTH: usize = 2;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub max_depth: usize,
    pub total_comments: usize,
    pub root_comments: usize,
    pub replies: usize,
}

impl ValidationResult {
    pub fn log_errors(&self) {
        if self.errors.is_empty() {
            tracing::debug!(
                total = self.total_comments,
                "Guest book has a valid two-level structure"
            );
            return;
        }

        for (i, error) in self.errors.iter().enumerate() {
            tracing::warn!(max_depth = self.max_depth, "{}. {}", i + 1, error);
        }
    }
}

// Longer paths keep their head and tail
const MAX_PATH_SEGMENTS: usize = 6;

#[derive(Default)]
struct Walk<'a> {
    errors: Vec<String>,
    max_depth: usize,
    total_comments: usize,
    root_comments: usize,
    replies: usize,
    trail: Vec<&'a str>,
}

impl<'a> Walk<'a> {
    // Pre-order over an explicit stack, so a broken chain of any depth is
    // reported in the same order a recursive walk would use
    fn run(&mut self, comments: &'a [CommentNode]) {
        let mut pending: Vec<(&'a CommentNode, usize)> =
            comments.iter().rev().map(|c| (c, 1)).collect();

        while let Some((comment, depth)) = pending.pop() {
            self.trail.truncate(depth - 1);
            self.trail.push(comment.record.display_id());
            self.check(comment, depth);

            pending.extend(comment.replies.iter().rev().map(|r| (r, depth + 1)));
        }
    }

    fn path(&self) -> String {
        if self.trail.len() <= MAX_PATH_SEGMENTS {
            return self.trail.join(" -> ");
        }

        let tail = &self.trail[self.trail.len() - (MAX_PATH_SEGMENTS - 2)..];
        format!("{} -> ... -> {}", self.trail[0], tail.join(" -> "))
    }

    fn check(&mut self, comment: &CommentNode, depth: usize) {
        self.total_comments += 1;
        self.max_depth = self.max_depth.max(depth);

        let record = &comment.record;

        match depth {
            1 => {
                self.root_comments += 1;
                if let Some(parent_id) = &record.parent_id {
                    let error = format!("Root comment {} has parentId: {}", self.path(), parent_id);
                    self.errors.push(error);
                }
            }
            2 => {
                self.replies += 1;
                if record.parent_id.is_none() {
                    let error = format!("Reply {} is missing parentId", self.path());
                    self.errors.push(error);
                }
            }
            _ => {
                let error = format!(
                    "Comment {} exceeds maximum depth ({} > {})",
                    self.path(),
                    depth,
                    MAX_DEPTH
                );
                self.errors.push(error);
            }
        }

        if !comment.replies.is_empty() && depth >= MAX_DEPTH {
            let error = format!(
                "Reply {} has nested replies (violates 2-level structure)",
                self.path()
            );
            self.errors.push(error);
        }
    }
}

/// Walks the whole forest and reports every violation of the two-level
/// structure instead of stopping at the first one.
pub fn validate_nested_structure(comments: &[CommentNode]) -> ValidationResult {
    let mut walk = Walk::default();
    walk.run(comments);

    ValidationResult {
        is_valid: walk.errors.is_empty() && walk.max_depth <= MAX_DEPTH,
        errors: walk.errors,
        max_depth: walk.max_depth,
        total_comments: walk.total_comments,
        root_comments: walk.root_comments,
        replies: walk.replies,
    }
}

/// The minimal projection [`ensure_root_parent`] needs.
pub trait ParentLink {
    fn id(&self) -> &str;
    fn parent_id(&self) -> Option<&str>;
}

impl ParentLink for CommentRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

impl ParentLink for (String, Option<String>) {
    fn id(&self) -> &str {
        &self.0
    }

    fn parent_id(&self) -> Option<&str> {
        self.1.as_deref()
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParentResolutionError {
    #[error("Target comment {0} not found")]
    NotFound(String),

    #[error("Target comment {0} is its own parent")]
    SelfReferencing(String),
}

impl ApiRequestError for ParentResolutionError {
    fn status_code(&self) -> StatusCode {
        match self {
            ParentResolutionError::NotFound(_) => StatusCode::NOT_FOUND,
            ParentResolutionError::SelfReferencing(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

/// Redirects a reply aimed at another reply to that reply's parent, so that
/// no third level is ever written.
///
/// Only one hop is followed: with the two-level structure in place the
/// parent of a reply is always a root.
pub fn ensure_root_parent<L: ParentLink>(
    comments: &[L],
    target_parent_id: &str,
) -> Result<String, ParentResolutionError> {
    let target = comments
        .iter()
        .find(|c| c.id() == target_parent_id)
        .ok_or_else(|| ParentResolutionError::NotFound(target_parent_id.to_string()))?;

    match target.parent_id() {
        Some(parent_id) if parent_id == target_parent_id => Err(
            ParentResolutionError::SelfReferencing(target_parent_id.to_string()),
        ),
        Some(parent_id) => Ok(parent_id.to_string()),
        None => Ok(target_parent_id.to_string()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::guestbook::comment::{
        fixtures::{chain, node, record},
        tree::build_comment_tree,
    };

    fn link(id: &str, parent_id: Option<&str>) -> (String, Option<String>) {
        (id.to_string(), parent_id.map(str::to_string))
    }

    #[test]
    fn test_empty_forest_is_valid() {
        let result = validate_nested_structure(&[]);

        assert!(result.is_valid);
        assert_eq!(result.max_depth, 0);
        assert_eq!(result.total_comments, 0);
    }

    #[test]
    fn test_built_tree_is_valid() {
        let comments = vec![
            record("1", None, 0),
            record("2", Some("1"), 1),
            record("3", None, 2),
            record("4", Some("3"), 3),
            record("5", Some("1"), 4),
        ];

        let result = validate_nested_structure(&build_comment_tree(&comments));

        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert!(result.errors.is_empty());
        assert_eq!(result.max_depth, 2);
        assert_eq!(result.total_comments, 5);
        assert_eq!(result.root_comments, 2);
        assert_eq!(result.replies, 3);
    }

    #[test]
    fn test_third_level_is_reported() {
        let tree = vec![node(
            "1",
            None,
            vec![node("2", Some("1"), vec![node("3", Some("2"), vec![])])],
        )];

        let result = validate_nested_structure(&tree);

        assert!(!result.is_valid);
        assert_eq!(result.max_depth, 3);
        assert_eq!(result.total_comments, 3, "Deep node should still be counted");
        assert_eq!(
            result.errors,
            vec![
                "Reply 1 -> 2 has nested replies (violates 2-level structure)".to_string(),
                "Comment 1 -> 2 -> 3 exceeds maximum depth (3 > 2)".to_string(),
            ]
        );
    }

    #[test]
    fn test_every_violation_is_collected() {
        let mut stray_reply = node("4", None, vec![]);
        stray_reply.record.short_id = Some("msg_4".into());

        let tree = vec![
            node("1", Some("x"), vec![]),
            node("3", None, vec![stray_reply]),
        ];

        let result = validate_nested_structure(&tree);

        assert!(!result.is_valid);
        assert_eq!(result.max_depth, 2);
        assert_eq!(
            result.errors,
            vec![
                "Root comment 1 has parentId: x".to_string(),
                "Reply 3 -> msg_4 is missing parentId".to_string(),
            ]
        );
    }

    #[test]
    fn test_ensure_root_parent_resolves_reply_to_root() {
        let comments = vec![link("A", None), link("B", Some("A"))];

        assert_eq!(ensure_root_parent(&comments, "B"), Ok("A".to_string()));
        assert_eq!(ensure_root_parent(&comments, "A"), Ok("A".to_string()));
    }

    #[test]
    fn test_ensure_root_parent_not_found() {
        let comments = vec![link("A", None)];

        assert_eq!(
            ensure_root_parent(&comments, "Z"),
            Err(ParentResolutionError::NotFound("Z".to_string()))
        );
        assert_eq!(
            ParentResolutionError::NotFound("Z".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_ensure_root_parent_rejects_self_parent() {
        let comments = vec![link("A", Some("A"))];

        assert_eq!(
            ensure_root_parent(&comments, "A"),
            Err(ParentResolutionError::SelfReferencing("A".to_string()))
        );
    }

    #[test]
    fn test_ensure_root_parent_over_records() {
        let comments = vec![record("1", None, 0), record("2", Some("1"), 1)];

        assert_eq!(ensure_root_parent(&comments, "2"), Ok("1".to_string()));
    }

    #[test]
    fn test_long_chain_is_reported() {
        let tree = build_comment_tree(&chain(10_000));

        let result = validate_nested_structure(&tree);

        assert!(!result.is_valid);
        assert_eq!(result.max_depth, 10_000);
        assert_eq!(result.total_comments, 10_000);
        assert_eq!(result.root_comments, 1);
        assert_eq!(result.replies, 1);
        // one nested-replies error per node from depth 2 on, one depth error
        // per node from depth 3 on
        assert_eq!(result.errors.len(), 9_998 + 9_998);
        assert_eq!(
            result.errors.last().map(String::as_str),
            Some("Comment 0 -> ... -> 9996 -> 9997 -> 9998 -> 9999 exceeds maximum depth (10000 > 2)")
        );
    }

    #[test]
    fn test_short_paths_are_not_shortened() {
        let comments = chain(6);

        let result = validate_nested_structure(&build_comment_tree(&comments));

        assert_eq!(
            result.errors.last().map(String::as_str),
            Some("Comment 0 -> 1 -> 2 -> 3 -> 4 -> 5 exceeds maximum depth (6 > 2)")
        );
    }
}
