use std::{convert::Infallible, time::Duration};

use axum::{
    Json, Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures_util::stream::StreamExt;
use serde::Serialize;
use tokio_stream::wrappers::BroadcastStream;

use crate::App;

use super::comment::{
    create::create_comment,
    delete::delete_comment,
    get::{get_comments, validate_comments},
    patch::patch_comment,
};

pub fn route() -> Router<App> {
    Router::<App>::new()
        .route("/entries", get(get_comments).post(create_comment))
        .route("/entries/validate", get(validate_comments))
        .route("/entries/{id}", axum::routing::patch(patch_comment).delete(delete_comment))
        .route("/stream", get(stream_events))
        .route("/online-count", get(get_online_count))
}

/// Pushes guest book events to the client. The connection counts as a
/// presence in the guest book for as long as it stays open.
async fn stream_events(
    State(ctx): State<App>,
) -> Sse<impl futures_util::Stream<Item = Result<Event, Infallible>>> {
    let events = ctx.guest_book.subscribe();
    let presence = ctx.guest_book.join();

    let stream = BroadcastStream::new(events)
        .filter_map(|event| async move {
            event
                .inspect_err(|err| tracing::debug!(?err, "Guest book stream lagged"))
                .ok()
        })
        .map(move |event| {
            // dropped together with the stream when the client goes away
            let _presence = &presence;
            let json = serde_json::to_string(&event).unwrap_or_default();
            Ok(Event::default().data(json))
        });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineCount {
    online_count: usize,
    timestamp: i64,
}

async fn get_online_count(State(ctx): State<App>) -> Json<OnlineCount> {
    Json(OnlineCount {
        online_count: ctx.guest_book.online_count(),
        timestamp: chrono::Utc::now().timestamp_millis(),
    })
}
