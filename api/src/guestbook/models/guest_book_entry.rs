use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::guestbook::comment::{CommentRecord, validator::ParentLink};

#[derive(Queryable, Selectable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::guest_book_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GuestBookEntry {
    pub id: String,
    pub short_id: Option<String>,
    pub message: String,
    pub author_id: String,
    pub author_name: String,
    pub author_image: Option<String>,
    pub parent_id: Option<String>,
    pub replied_to_user_id: Option<String>,
    pub replied_to_user_name: Option<String>,
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<GuestBookEntry> for CommentRecord {
    fn from(entry: GuestBookEntry) -> Self {
        CommentRecord {
            id: entry.id,
            short_id: entry.short_id,
            message: entry.message,
            author_id: entry.author_id,
            author_name: entry.author_name,
            author_image: entry.author_image,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            parent_id: entry.parent_id,
            replied_to_user_id: entry.replied_to_user_id,
            replied_to_user_name: entry.replied_to_user_name,
            is_deleted: entry.is_deleted,
        }
    }
}

/// Just enough of an entry to resolve reply targets.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::guest_book_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GuestBookEntryLink {
    pub id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    pub author_name: String,
}

impl ParentLink for GuestBookEntryLink {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::guest_book_entries)]
pub struct NewGuestBookEntry {
    pub id: String,
    pub short_id: Option<String>,
    pub message: String,
    pub author_id: String,
    pub author_name: String,
    pub author_image: Option<String>,
    pub parent_id: Option<String>,
    pub replied_to_user_id: Option<String>,
    pub replied_to_user_name: Option<String>,
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::guest_book_entries)]
pub struct UpdateGuestBookEntry {
    pub message: Option<String>,
    pub is_deleted: Option<bool>,
    pub updated_at: NaiveDateTime,
}
