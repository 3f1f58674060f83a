use axum::{
    Json,
    extract::{Query, State},
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};

use crate::{
    App,
    error::AppError,
    guestbook::models::guest_book_entry::GuestBookEntry,
    identity::AdminUser,
    schema::guest_book_entries,
};

use super::{
    CommentRecord, RootComment,
    tree::{CommentStats, build_comment_tree, get_comment_stats},
    validator::{ValidationResult, validate_nested_structure},
};

const DEFAULT_PAGE_SIZE: i64 = 5;
const MAX_PAGE_SIZE: i64 = 20;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Queries {
    page: Option<i64>,
    limit: Option<i64>,
    #[serde(default)]
    load_all: bool,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub limit: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// Page of root comments, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageWindow {
    page: i64,
    limit: i64,
}

impl PageWindow {
    fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        PageWindow {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    // Saturates: a far-away page is just an empty one
    fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    fn pagination(&self, total_items: i64) -> Pagination {
        Pagination {
            current_page: self.page,
            limit: self.limit,
            total_items,
            total_pages: (total_items + self.limit - 1) / self.limit,
            has_next_page: self.skip().saturating_add(self.limit) < total_items,
            has_previous_page: self.page > 1,
        }
    }
}

#[derive(Serialize)]
pub struct CommentsResponse {
    success: bool,
    data: Vec<RootComment>,
    stats: CommentStats,
    pagination: Option<Pagination>,
}

#[derive(Serialize)]
pub struct ValidationResponse {
    success: bool,
    validation: ValidationResult,
    stats: CommentStats,
}

pub async fn get_comments(
    State(ctx): State<App>,
    Query(q): Query<Queries>,
) -> Result<Json<CommentsResponse>, AppError> {
    let (records, pagination) = if q.load_all {
        (load_all_records(&ctx).await?, None)
    } else {
        let window = PageWindow::new(q.page, q.limit);
        let (records, total) = load_page(&ctx, window).await?;
        (records, Some(window.pagination(total)))
    };

    let tree = build_comment_tree(&records);
    let stats = get_comment_stats(&tree);

    let validation = validate_nested_structure(&tree);
    if !validation.is_valid {
        tracing::warn!(
            errors = validation.errors.len(),
            "Guest book entries violate the two-level structure"
        );
        validation.log_errors();
    }

    Ok(Json(CommentsResponse {
        success: true,
        data: tree.into_iter().map(RootComment::from).collect(),
        stats,
        pagination,
    }))
}

pub async fn validate_comments(
    State(ctx): State<App>,
    AdminUser(admin): AdminUser,
) -> Result<Json<ValidationResponse>, AppError> {
    let records = load_all_records(&ctx).await?;
    let tree = build_comment_tree(&records);

    let validation = validate_nested_structure(&tree);
    tracing::info!(
        admin = %admin.id,
        is_valid = validation.is_valid,
        total = validation.total_comments,
        "Validated guest book structure"
    );
    validation.log_errors();

    Ok(Json(ValidationResponse {
        success: true,
        stats: get_comment_stats(&tree),
        validation,
    }))
}

async fn load_all_records(ctx: &App) -> Result<Vec<CommentRecord>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    let entries: Vec<GuestBookEntry> = guest_book_entries::table
        .order(guest_book_entries::created_at.asc())
        .select(GuestBookEntry::as_select())
        .load(&mut conn)
        .await?;

    Ok(entries.into_iter().map(CommentRecord::from).collect())
}

/// One page of root comments plus every reply to them, and the total number
/// of root comments.
async fn load_page(ctx: &App, window: PageWindow) -> Result<(Vec<CommentRecord>, i64), AppError> {
    let mut conn = ctx.diesel.get().await?;

    let roots: Vec<GuestBookEntry> = guest_book_entries::table
        .filter(guest_book_entries::parent_id.is_null())
        .order(guest_book_entries::created_at.desc())
        .offset(window.skip())
        .limit(window.limit)
        .select(GuestBookEntry::as_select())
        .load(&mut conn)
        .await?;

    let total = guest_book_entries::table
        .filter(guest_book_entries::parent_id.is_null())
        .count()
        .get_result::<i64>(&mut conn)
        .await?;

    let root_ids: Vec<String> = roots.iter().map(|r| r.id.clone()).collect();

    let replies: Vec<GuestBookEntry> = if root_ids.is_empty() {
        vec![]
    } else {
        guest_book_entries::table
            .filter(guest_book_entries::parent_id.eq_any(root_ids))
            .order(guest_book_entries::created_at.asc())
            .select(GuestBookEntry::as_select())
            .load(&mut conn)
            .await?
    };

    let records = roots
        .into_iter()
        .chain(replies)
        .map(CommentRecord::from)
        .collect();

    Ok((records, total))
}
