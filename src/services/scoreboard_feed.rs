//! Scoreboard SSE feed: a full player snapshot whenever the players file changes.

use std::{convert::Infallible, time::SystemTime};

use axum::response::sse::Event;
use futures::Stream;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::{
    dao::models::PlayerEntity, dto::player::PlayerView, dto::sse::ServerEvent,
    state::SharedState,
};

const EVENT_SCOREBOARD: &str = "scoreboard";

/// Tracks the last modification time a snapshot was pushed for.
#[derive(Debug, Default)]
struct ChangeDetector {
    last_pushed: Option<Option<SystemTime>>,
}

impl ChangeDetector {
    /// Whether `modified` differs from what the client has seen, recording it if so.
    fn should_push(&mut self, modified: Option<SystemTime>) -> bool {
        if self.last_pushed == Some(modified) {
            return false;
        }
        self.last_pushed = Some(modified);
        true
    }
}

/// Stream the player list to one scoreboard client.
///
/// The first event carries a reconnection hint. Afterwards the players file
/// modification time is polled and a new snapshot pushed whenever it moves.
/// Dropping the stream (client disconnect) stops the polling.
pub fn scoreboard_events(state: SharedState) -> impl Stream<Item = Result<Event, Infallible>> {
    let poll_interval = state.config().scoreboard_poll_interval();
    let retry = state.config().client_reconnect_delay();

    async_stream::stream! {
        let mut detector = ChangeDetector::default();
        let mut sent_first = false;
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Ok(store) = state.require_store().await else {
                continue;
            };
            let modified = match store.players_modified().await {
                Ok(modified) => modified,
                Err(err) => {
                    warn!(error = %err, "failed to stat players file for scoreboard");
                    continue;
                }
            };
            if !detector.should_push(modified) {
                continue;
            }

            let players = match store.load_players().await {
                Ok(players) => players,
                Err(err) => {
                    warn!(error = %err, "failed to load players for scoreboard");
                    continue;
                }
            };

            let Some(mut event) = snapshot_event(players) else {
                continue;
            };
            if !sent_first {
                event = event.retry(retry);
                sent_first = true;
            }
            debug!("pushing scoreboard snapshot");
            yield Ok(event);
        }
    }
}

fn snapshot_event(players: Vec<PlayerEntity>) -> Option<Event> {
    let views: Vec<PlayerView> = players.into_iter().map(Into::into).collect();
    match ServerEvent::json(Some(EVENT_SCOREBOARD.to_string()), &views) {
        Ok(payload) => Some(Event::default().event(EVENT_SCOREBOARD).data(payload.data)),
        Err(err) => {
            warn!(error = %err, "failed to serialize scoreboard snapshot");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;
    use tokio::time::timeout;

    use super::*;
    use crate::services::test_support::state_with_store;

    #[test]
    fn detector_pushes_first_and_changed_times_only() {
        let mut detector = ChangeDetector::default();
        let t0 = SystemTime::UNIX_EPOCH;
        let t1 = t0 + Duration::from_secs(1);

        assert!(detector.should_push(None));
        assert!(!detector.should_push(None));
        assert!(detector.should_push(Some(t0)));
        assert!(!detector.should_push(Some(t0)));
        assert!(detector.should_push(Some(t1)));
    }

    #[tokio::test]
    async fn snapshot_is_pushed_on_connect_and_after_writes() {
        let (state, _dir) = state_with_store().await;
        let store = state.require_store().await.unwrap();
        store.save_players(Vec::new()).await.unwrap();

        let mut stream = Box::pin(scoreboard_events(state.clone()));
        let first = timeout(Duration::from_secs(2), stream.next()).await;
        assert!(matches!(first, Ok(Some(Ok(_)))));

        let idle = timeout(Duration::from_millis(300), stream.next()).await;
        assert!(idle.is_err());

        store
            .save_players(vec![PlayerEntity {
                id: "p1".into(),
                name: "Ada".into(),
                score: 3,
                icon: "/vercel.svg".into(),
                inventory: Vec::new(),
            }])
            .await
            .unwrap();

        let pushed = timeout(Duration::from_secs(2), stream.next()).await;
        assert!(matches!(pushed, Ok(Some(Ok(_)))));
    }
}
