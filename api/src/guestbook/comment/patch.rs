use axum::{
    Json, debug_handler,
    extract::{Path, State},
    http::StatusCode,
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;

use crate::{
    App,
    config::ServerConfig,
    error::AppError,
    guestbook::{
        GuestBookEvent,
        models::guest_book_entry::{GuestBookEntry, UpdateGuestBookEntry},
    },
    identity::{AuthUser, Identity},
    json::JsonBody,
    schema::guest_book_entries,
};

use super::{
    CommentRecord,
    create::{EntryResponse, MAX_MESSAGE_LENGTH},
};

#[debug_handler]
pub async fn patch_comment(
    State(ctx): State<App>,
    Path(id): Path<String>,
    AuthUser(auth_user): AuthUser,
    JsonBody(mut patch): JsonBody<CommentPatch>,
) -> Result<Json<EntryResponse>, AppError> {
    patch
        .validate()
        .map_err(|e| (e, StatusCode::BAD_REQUEST))?;

    let mut conn = ctx.diesel.get().await?;

    let (author_id, is_deleted) = guest_book_entries::table
        .find(id.as_str())
        .select((guest_book_entries::author_id, guest_book_entries::is_deleted))
        .first::<(String, bool)>(&mut conn)
        .await
        .optional()?
        .ok_or(("Entry not found", StatusCode::NOT_FOUND))?;

    check_editable(&auth_user, &author_id, is_deleted, &ctx.config)?;

    // Still guarded in case a delete lands in between
    let entry: GuestBookEntry = diesel::update(
        guest_book_entries::table
            .find(id.as_str())
            .filter(guest_book_entries::is_deleted.eq(false)),
    )
    .set(&UpdateGuestBookEntry {
        message: Some(patch.message),
        is_deleted: None,
        updated_at: chrono::Utc::now().naive_utc(),
    })
    .returning(GuestBookEntry::as_returning())
    .get_result(&mut conn)
    .await
    .optional()?
    .ok_or(DELETED_ENTRY)?;

    let record = CommentRecord::from(entry);
    tracing::info!(id = %record.id, editor = %auth_user.id, "Updated guest book entry");

    ctx.guest_book
        .publish(GuestBookEvent::MessageUpdated(record.clone()));

    Ok(Json(EntryResponse {
        success: true,
        data: record,
    }))
}

const DELETED_ENTRY: (&str, StatusCode) = ("Deleted messages can't be edited", StatusCode::CONFLICT);

/// Only the author or an admin may edit, and only while the entry still shows
/// its message.
fn check_editable(
    user: &Identity,
    author_id: &str,
    is_deleted: bool,
    config: &ServerConfig,
) -> Result<(), (&'static str, StatusCode)> {
    if !user.can_modify(author_id, config) {
        return Err(("You can only edit your own messages", StatusCode::FORBIDDEN));
    }

    if is_deleted {
        return Err(DELETED_ENTRY);
    }

    Ok(())
}

#[derive(Deserialize, Debug)]
pub struct CommentPatch {
    message: String,
}

impl CommentPatch {
    fn validate(&mut self) -> Result<(), &'static str> {
        self.message = self.message.trim().to_string();

        if self.message.is_empty() {
            return Err("Message cannot be empty");
        }

        if self.message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err("Message too long (max 5000 characters)");
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Env;

    #[test]
    fn test_patch_is_trimmed() {
        let mut patch = CommentPatch {
            message: "  edited  ".into(),
        };

        patch.validate().unwrap();
        assert_eq!(patch.message, "edited");
    }

    #[test]
    fn test_empty_patch_is_rejected() {
        let mut patch = CommentPatch {
            message: " \t ".into(),
        };

        assert_eq!(patch.validate(), Err("Message cannot be empty"));
    }

    fn config() -> ServerConfig {
        ServerConfig {
            env: Env::Dev,
            database_url: String::new(),
            port: 3000,
            cors_allowed_origins: vec![],
            admin_user_ids: vec!["user_admin".into()],
        }
    }

    fn user(id: &str) -> Identity {
        Identity {
            id: id.into(),
            name: None,
            image: None,
        }
    }

    #[test]
    fn test_author_can_edit() {
        assert_eq!(check_editable(&user("user_1"), "user_1", false, &config()), Ok(()));
        assert_eq!(check_editable(&user("user_admin"), "user_1", false, &config()), Ok(()));
    }

    #[test]
    fn test_other_users_cannot_edit() {
        let err = check_editable(&user("user_2"), "user_1", false, &config()).unwrap_err();
        assert_eq!(err.1, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_deleted_entry_cannot_be_edited() {
        let err = check_editable(&user("user_1"), "user_1", true, &config()).unwrap_err();
        assert_eq!(err, ("Deleted messages can't be edited", StatusCode::CONFLICT));

        let err = check_editable(&user("user_admin"), "user_1", true, &config()).unwrap_err();
        assert_eq!(err.1, StatusCode::CONFLICT);
    }
}
