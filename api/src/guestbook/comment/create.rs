use axum::{Json, debug_handler, extract::State, http::StatusCode};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    App,
    error::AppError,
    guestbook::{
        GuestBookEvent,
        models::guest_book_entry::{GuestBookEntry, GuestBookEntryLink, NewGuestBookEntry},
    },
    identity::{AuthUser, Identity},
    json::JsonBody,
    schema::guest_book_entries,
};

use super::{CommentRecord, validator::ensure_root_parent};

pub const MAX_MESSAGE_LENGTH: usize = 5000;
const MAX_AUTHOR_NAME_LENGTH: usize = 50;
const SHORT_ID_SUFFIX_LENGTH: usize = 5;

#[derive(Serialize)]
pub struct EntryResponse {
    pub success: bool,
    pub data: CommentRecord,
}

#[debug_handler]
pub async fn create_comment(
    State(ctx): State<App>,
    AuthUser(auth_user): AuthUser,
    JsonBody(mut submission): JsonBody<CommentSubmission>,
) -> Result<Json<EntryResponse>, AppError> {
    submission
        .validate(&auth_user)
        .map_err(|e| (e, StatusCode::BAD_REQUEST))?;

    let mut conn = ctx.diesel.get().await?;

    let mut parent_id = None;
    let mut replied_to = None;

    if let Some(target_id) = submission.parent_id.as_deref() {
        let links: Vec<GuestBookEntryLink> = guest_book_entries::table
            .select(GuestBookEntryLink::as_select())
            .load(&mut conn)
            .await?;

        // Replying to a reply lands in the root's thread
        let root_id = ensure_root_parent(&links, target_id).map_err(|e| {
            tracing::debug!(%e, "Rejected reply target");
            AppError::from(e)
        })?;

        // The replied-to user is whoever wrote the targeted message, even
        // when the reply ends up attached to the root
        let target = links
            .iter()
            .find(|l| l.id == target_id)
            .ok_or(("Target comment not found", StatusCode::NOT_FOUND))?;

        parent_id = Some(root_id);
        replied_to = Some((target.author_id.clone(), target.author_name.clone()));
    }

    let now = chrono::Utc::now();
    let id = Uuid::new_v4();
    let (replied_to_user_id, replied_to_user_name) = replied_to.unzip();

    let new_entry = NewGuestBookEntry {
        id: id.to_string(),
        short_id: Some(generate_short_id(now.timestamp_millis(), &id)),
        message: submission.message,
        author_id: auth_user.id,
        author_name: submission.author_name.ok_or("missing author_name")?,
        author_image: submission.author_image,
        parent_id,
        replied_to_user_id,
        replied_to_user_name,
        is_deleted: false,
        created_at: now.naive_utc(),
        updated_at: now.naive_utc(),
    };

    let entry = diesel::insert_into(guest_book_entries::table)
        .values(&new_entry)
        .returning(GuestBookEntry::as_returning())
        .get_result(&mut conn)
        .await?;

    let record = CommentRecord::from(entry);
    tracing::info!(id = %record.id, parent_id = ?record.parent_id, "Created guest book entry");

    ctx.guest_book
        .publish(GuestBookEvent::NewMessage(record.clone()));

    Ok(Json(EntryResponse {
        success: true,
        data: record,
    }))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommentSubmission {
    message: String,
    author_name: Option<String>,
    author_image: Option<String>,
    parent_id: Option<String>,
}

impl CommentSubmission {
    /// Normalizes the submission in place, falling back to the identity of
    /// the poster for name and avatar.
    fn validate(&mut self, user: &Identity) -> Result<(), &'static str> {
        self.message = self.message.trim().to_string();
        if self.message.is_empty() {
            return Err("Message is required");
        }

        if self.message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err("Message too long (max 5000 characters)");
        }

        let name = self
            .author_name
            .take()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .or_else(|| user.name.clone());

        match name {
            None => return Err("Author name is required"),
            Some(name) if name.chars().count() > MAX_AUTHOR_NAME_LENGTH => {
                return Err("Author name too long");
            }
            Some(name) => self.author_name = Some(name),
        }

        self.author_image = self
            .author_image
            .take()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .or_else(|| user.image.clone());

        self.parent_id = self
            .parent_id
            .take()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Ok(())
    }
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if n == 0 {
        return "0".into();
    }

    let mut s = Vec::new();
    while n > 0 {
        s.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    s.reverse();

    String::from_utf8(s).unwrap_or_default()
}

/// `msg_<millis in base 36>_<5 random base 36 chars>`, only meant as a short
/// human readable handle.
fn generate_short_id(timestamp_millis: i64, id: &Uuid) -> String {
    let random = to_base36(id.as_u128());
    let suffix_start = random.len().saturating_sub(SHORT_ID_SUFFIX_LENGTH);

    format!(
        "msg_{}_{}",
        to_base36(timestamp_millis.max(0) as u128),
        &random[suffix_start..]
    )
}
