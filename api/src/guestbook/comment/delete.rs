use axum::{
    Json, debug_handler,
    extract::{Path, State},
    http::StatusCode,
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Serialize;

use crate::{
    App,
    error::AppError,
    guestbook::{GuestBookEvent, models::guest_book_entry::UpdateGuestBookEntry},
    identity::AuthUser,
    schema::guest_book_entries,
};

use super::DELETED_MESSAGE_PLACEHOLDER;

#[derive(Serialize)]
pub struct DeleteResponse {
    success: bool,
}

/// Soft delete: the entry keeps its place in the thread, only its message is
/// replaced. `key` is either the id or the short id.
#[debug_handler]
pub async fn delete_comment(
    State(ctx): State<App>,
    Path(key): Path<String>,
    AuthUser(auth_user): AuthUser,
) -> Result<Json<DeleteResponse>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    let (id, author_id) = guest_book_entries::table
        .filter(
            guest_book_entries::id
                .eq(key.as_str())
                .or(guest_book_entries::short_id.eq(key.as_str())),
        )
        .select((guest_book_entries::id, guest_book_entries::author_id))
        .first::<(String, String)>(&mut conn)
        .await
        .optional()?
        .ok_or(("Entry not found", StatusCode::NOT_FOUND))?;

    if !auth_user.can_modify(&author_id, &ctx.config) {
        return Err((
            "You can only delete your own messages",
            StatusCode::FORBIDDEN,
        ))?;
    }

    diesel::update(guest_book_entries::table.find(id.as_str()))
        .set(&UpdateGuestBookEntry {
            message: Some(DELETED_MESSAGE_PLACEHOLDER.to_string()),
            is_deleted: Some(true),
            updated_at: chrono::Utc::now().naive_utc(),
        })
        .execute(&mut conn)
        .await?;

    tracing::info!(%id, deleted_by = %auth_user.id, "Soft deleted guest book entry");

    ctx.guest_book
        .publish(GuestBookEvent::MessageDeleted { id });

    Ok(Json(DeleteResponse { success: true }))
}
