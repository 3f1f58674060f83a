use std::collections::HashMap;

use serde::Serialize;

use super::{CommentNode, CommentRecord};

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommentStats {
    pub total: usize,
    pub root_comments: usize,
    pub replies: usize,
    pub deleted: usize,
}

/// Builds the guest book forest from a flat, unordered list of records.
///
/// Roots are ordered newest first and the replies of each root oldest first.
/// Both sorts are stable, so records sharing a timestamp keep their input
/// order. A record whose `parent_id` is not in `comments` is dropped, and so
/// is anything that is only reachable through a cycle.
pub fn build_comment_tree(comments: &[CommentRecord]) -> Vec<CommentNode> {
    // Index by id first so that attaching children is O(n) regardless of the
    // order the records come in
    let mut index = HashMap::<&str, usize>::with_capacity(comments.len());
    for (i, comment) in comments.iter().enumerate() {
        index.insert(comment.id.as_str(), i);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut roots: Vec<usize> = vec![];

    for (i, comment) in comments.iter().enumerate() {
        // A duplicated id only keeps the record that owns the slot
        if index.get(comment.id.as_str()) != Some(&i) {
            continue;
        }

        match comment.parent_id.as_deref() {
            Some(parent_id) => {
                if let Some(&parent) = index.get(parent_id) {
                    children[parent].push(i);
                }
            }
            None => roots.push(i),
        }
    }

    // Walk down from the roots. Anything on a cycle has no root above it
    // and is never reached; `placed` only guards against revisiting.
    let mut placed = vec![false; comments.len()];
    let mut order: Vec<(usize, Option<usize>)> = Vec::with_capacity(comments.len());
    let mut pending: Vec<(usize, Option<usize>)> = roots.iter().rev().map(|&i| (i, None)).collect();

    while let Some((i, parent)) = pending.pop() {
        if std::mem::replace(&mut placed[i], true) {
            continue;
        }
        order.push((i, parent));
        pending.extend(children[i].iter().rev().map(|&child| (child, Some(i))));
    }

    let mut slots: Vec<Option<CommentNode>> = (0..comments.len()).map(|_| None).collect();
    for &(i, _) in &order {
        slots[i] = Some(CommentNode::new(comments[i].clone()));
    }

    // Descendants come after their ancestors in `order`, so going backwards
    // every node is complete by the time it is attached to its parent
    let mut tree: Vec<CommentNode> = Vec::with_capacity(roots.len());
    for &(i, parent) in order.iter().rev() {
        let Some(mut node) = slots[i].take() else {
            continue;
        };
        node.replies.reverse();

        match parent.and_then(|p| slots[p].as_mut()) {
            Some(parent) => parent.replies.push(node),
            None => tree.push(node),
        }
    }
    tree.reverse();

    // newest root first
    tree.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));

    // oldest reply first within a thread
    for root in tree.iter_mut() {
        root.replies
            .sort_by(|a, b| a.record.created_at.cmp(&b.record.created_at));
    }

    tree
}

/// Depth-first search for a node anywhere in the forest.
pub fn find_comment_by_id<'a>(comments: &'a [CommentNode], id: &str) -> Option<&'a CommentNode> {
    let mut pending: Vec<&CommentNode> = comments.iter().rev().collect();

    while let Some(comment) = pending.pop() {
        if comment.record.id == id {
            return Some(comment);
        }
        pending.extend(comment.replies.iter().rev());
    }

    None
}

/// Pre-order listing of every node, roots and replies alike.
pub fn flatten_comments(comments: &[CommentNode]) -> Vec<&CommentNode> {
    let mut result = Vec::with_capacity(comments.len());
    let mut pending: Vec<&CommentNode> = comments.iter().rev().collect();

    while let Some(comment) = pending.pop() {
        result.push(comment);
        pending.extend(comment.replies.iter().rev());
    }

    result
}

pub fn get_comment_stats(comments: &[CommentNode]) -> CommentStats {
    let flattened = flatten_comments(comments);
    let root_comments = comments.len();

    CommentStats {
        total: flattened.len(),
        root_comments,
        replies: flattened.len() - root_comments,
        deleted: flattened.iter().filter(|c| c.record.is_deleted).count(),
    }
}
