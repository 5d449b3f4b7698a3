//! Watch tracker: sampler and timeout plumbing over the core FSM.
//!
//! One tracker exists per open video. Binding spawns a 1-second sampler
//! that polls the playback handle's position, and a one-shot load timeout
//! that offers the manual fallback if the handle never reports ready. Both
//! tasks are aborted when the tracker is dropped or replaced, so a stale
//! sampler can never write into the next session.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use client::playback::PlaybackHandle;
use portal_core::model::{VideoId, WatchSessionId};
use portal_core::watch::{PlayerEvent, WatchSession};

/// Cadence at which the bound handle's position is sampled.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// How long to wait for the handle's ready callback before offering the
/// manual fallback affordance.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Tracks one open video against a bound playback handle.
///
/// Must be created inside a Tokio runtime; the sampler and timeout run as
/// spawned tasks.
pub struct WatchTracker {
    session: Arc<Mutex<WatchSession>>,
    video_id: VideoId,
    session_id: WatchSessionId,
    sampler: JoinHandle<()>,
    load_timeout: JoinHandle<()>,
}

impl WatchTracker {
    /// Creates a session for the video and binds it to the handle.
    #[must_use]
    pub fn bind(video_id: VideoId, handle: Arc<dyn PlaybackHandle>) -> Self {
        let session = Arc::new(Mutex::new(WatchSession::new(video_id.clone())));
        let session_id = session.lock().id();

        let sampler = tokio::spawn(sample_loop(Arc::clone(&session), handle));
        let load_timeout = tokio::spawn(load_timeout_watch(Arc::clone(&session)));

        Self {
            session,
            video_id,
            session_id,
            sampler,
            load_timeout,
        }
    }

    #[must_use]
    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    #[must_use]
    pub fn session_id(&self) -> WatchSessionId {
        self.session_id
    }

    /// Forwards a provider event into the session state machine.
    pub fn handle_event(&self, event: PlayerEvent) {
        if let PlayerEvent::Error { code } = event {
            // A broken player is logged and never alters the watched flag.
            warn!(video = %self.video_id, code, "playback handle reported an error");
        }
        let applied = self.session.lock().apply(event);
        if !applied {
            debug!(video = %self.video_id, ?event, "ignored out-of-order player event");
        }
    }

    /// A copy of the current session state for rendering and gating.
    #[must_use]
    pub fn snapshot(&self) -> WatchSession {
        self.session.lock().clone()
    }

    #[must_use]
    pub fn watched(&self) -> bool {
        self.session.lock().watched()
    }
}

impl Drop for WatchTracker {
    fn drop(&mut self) {
        self.sampler.abort();
        self.load_timeout.abort();
    }
}

async fn sample_loop(session: Arc<Mutex<WatchSession>>, handle: Arc<dyn PlaybackHandle>) {
    let mut interval = tokio::time::interval(SAMPLE_INTERVAL);
    // The first tick of a fresh interval completes immediately; skip it so
    // samples land on whole-second boundaries after binding.
    interval.tick().await;
    loop {
        interval.tick().await;
        let position = handle.current_time();
        session.lock().tick(position);
    }
}

async fn load_timeout_watch(session: Arc<Mutex<WatchSession>>) {
    tokio::time::sleep(LOAD_TIMEOUT).await;
    let mut session = session.lock();
    if !session.is_bound() {
        warn!(video = %session.video_id(), "player not ready after load timeout, offering fallback");
        session.offer_fallback();
    }
}
