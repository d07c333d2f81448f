//! Server-sent contact change events.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use contact_store::Received;
use tokio_stream::{Stream, StreamExt};

use crate::auth::AuthUser;
use crate::state::AppState;

/// Stream the user's contact changes.
///
/// Each event carries the change as JSON. A `resync` event means some
/// changes were missed and the client should reload the list.
pub async fn contact_events(
    State(state): State<AppState>,
    user: AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!(account = %user.id(), "Change stream opened");

    let stream = state
        .contacts
        .feed()
        .subscribe(user.id())
        .into_stream()
        .map(|received| {
            let event = match received {
                Received::Event(event) => Event::default()
                    .event("change")
                    .json_data(&event.change)
                    .unwrap_or_else(|_| Event::default().event("resync")),
                Received::Lagged(skipped) => Event::default()
                    .event("resync")
                    .data(skipped.to_string()),
            };
            Ok(event)
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
