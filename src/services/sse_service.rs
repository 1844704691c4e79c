use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::sse::{AdminHandshake, ServerEvent, SystemStatus},
    error::ServiceError,
    state::SharedState,
};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Identifies the target SSE stream so teardown can release stream-specific resources.
#[derive(Clone)]
pub enum StreamKind {
    Public,
    /// Keeps the state so the admin token can be released once the client goes away.
    Admin(SharedState),
}

/// Subscribe to the public stream, greeting the client with the current system status.
pub fn subscribe_public(state: &SharedState) -> (broadcast::Receiver<ServerEvent>, Vec<ServerEvent>) {
    let receiver = state.public_sse().subscribe();
    let greeting = status_event(state).into_iter().collect();
    (receiver, greeting)
}

/// Subscribe to the admin stream, claiming the single admin token.
///
/// The token is delivered as the first event of the stream and must be sent
/// back in the `X-Admin-Token` header of admin requests.
pub async fn subscribe_admin(
    state: &SharedState,
) -> Result<(broadcast::Receiver<ServerEvent>, Vec<ServerEvent>), ServiceError> {
    let token = claim_admin_token(state).await?;
    let receiver = state.admin_sse().subscribe();

    let mut greeting = Vec::with_capacity(2);
    if let Ok(event) = ServerEvent::json(Some("admin_token".to_string()), &AdminHandshake { token }) {
        greeting.push(event);
    }
    greeting.extend(status_event(state));
    Ok((receiver, greeting))
}

/// Convert a broadcast receiver into an SSE response, sending `greeting` first and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    greeting: Vec<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(16);

    tokio::spawn(async move {
        let mut open = true;
        for payload in greeting {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                open = false;
                break;
            }
        }

        while open {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "SSE subscriber lagged; dropping events");
                        }
                    }
                }
            }
        }

        match kind {
            StreamKind::Public => info!("public SSE stream disconnected"),
            StreamKind::Admin(state) => {
                release_admin_token(&state).await;
                info!("admin SSE stream disconnected")
            }
        }
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(keep_alive())
}

/// Keep-alive comment sent on idle streams.
pub fn keep_alive() -> KeepAlive {
    KeepAlive::new()
        .interval(KEEP_ALIVE_INTERVAL)
        .text("keep-alive")
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

fn status_event(state: &SharedState) -> Option<ServerEvent> {
    ServerEvent::json(
        Some("system.status".to_string()),
        &SystemStatus {
            degraded: state.is_degraded(),
        },
    )
    .ok()
}

/// Reserve the admin token for a new stream, failing if another connection holds it.
async fn claim_admin_token(state: &SharedState) -> Result<String, ServiceError> {
    let mut guard = state.admin_token().lock().await;
    match &mut *guard {
        slot @ None => {
            let token = Uuid::new_v4().simple().to_string();
            slot.replace(token.clone());
            Ok(token)
        }
        Some(_) => Err(ServiceError::Unauthorized(
            "another admin SSE stream is already active".into(),
        )),
    }
}

async fn release_admin_token(state: &SharedState) {
    let mut guard = state.admin_token().lock().await;
    guard.take();
}
