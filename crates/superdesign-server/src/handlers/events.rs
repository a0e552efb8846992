//! Server-sent event stream of design file changes
//!
//! Each connection subscribes to the watch session of the iterations
//! directory (starting it on first use). The first frame is always
//! `connected`; the subscription is released when the client goes away.

use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use superdesign_core::{SubscriberId, SubscriberReceiver, SyncMessage, WatchSession};
use tracing::{debug, warn};

/// Unsubscribes when the response stream is dropped
struct Subscription {
    session: Arc<WatchSession>,
    id: SubscriberId,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.session.unsubscribe(&self.id) {
            debug!("Viewer {} disconnected", self.id);
        }
    }
}

pub async fn subscribe(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let session = state.registry.acquire(&state.asset_dir()).await;
    let (id, rx) = session.subscribe().map_err(|e| {
        warn!("Cannot subscribe viewer: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    debug!("Viewer {} connected", id);

    let connected = Event::default().data(SyncMessage::connected().to_json());
    let updates = stream::unfold(
        (rx, Subscription { session, id }),
        |(mut rx, subscription): (SubscriberReceiver, Subscription)| async move {
            let body = rx.recv().await?;
            Some((Ok::<_, Infallible>(Event::default().data(body)), (rx, subscription)))
        },
    );

    let events = stream::once(async move { Ok::<_, Infallible>(connected) }).chain(updates);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
