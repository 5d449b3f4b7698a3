//! Watch-session state machine.
//!
//! Models the lifetime of one opened video as explicit states and events, so
//! the watch-threshold contract can be exercised without a real playback
//! provider. The engine owns the 1-second sampler and the load timeout; this
//! module owns the transitions and the derived `watched` flag.

use crate::model::{VideoId, WatchSessionId};

/// Fraction of the duration that must be observed before a video counts as
/// watched.
pub const WATCH_THRESHOLD: f64 = 0.95;

//
// ─── STATES & EVENTS ───────────────────────────────────────────────────────────
//

/// Lifecycle of the bound playback handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No handle yet; duration unknown.
    Unbound,
    /// Handle reported ready and supplied the duration.
    Ready,
    Playing,
    Paused,
    Ended,
}

/// Events delivered by the playback provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    Ready { duration: f64 },
    Playing,
    Paused,
    Ended,
    Error { code: i32 },
}

//
// ─── WATCH SESSION ─────────────────────────────────────────────────────────────
//

/// Ephemeral per-video watch state.
///
/// Created when a video is opened, destroyed when the viewer closes or a
/// different video opens. Never outlives its sampler: a sampler writing into
/// a replaced session corrupts the successor's watch time.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchSession {
    id: WatchSessionId,
    video_id: VideoId,
    state: PlayerState,
    elapsed: f64,
    duration: f64,
    watched: bool,
    fallback_offered: bool,
}

impl WatchSession {
    #[must_use]
    pub fn new(video_id: VideoId) -> Self {
        Self {
            id: WatchSessionId::generate(),
            video_id,
            state: PlayerState::Unbound,
            elapsed: 0.0,
            duration: 0.0,
            watched: false,
            fallback_offered: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> WatchSessionId {
        self.id
    }

    #[must_use]
    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    #[must_use]
    pub fn state(&self) -> PlayerState {
        self.state
    }

    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[must_use]
    pub fn watched(&self) -> bool {
        self.watched
    }

    /// Whether the handle has reported ready.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.state != PlayerState::Unbound
    }

    /// Whether the manual "open externally" affordance should be shown.
    #[must_use]
    pub fn fallback_offered(&self) -> bool {
        self.fallback_offered
    }

    /// Fraction of the video observed so far, in `[0, 1]`.
    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        if self.duration > 0.0 {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Applies a provider event. Returns whether the event caused a
    /// transition; out-of-order events are ignored so the caller can log
    /// them.
    ///
    /// `Ended` forces `watched` regardless of the sampled position, matching
    /// the end-of-media shortcut. `Error` never changes `watched`: a broken
    /// player must not grant or revoke credit.
    pub fn apply(&mut self, event: PlayerEvent) -> bool {
        match (self.state, event) {
            (PlayerState::Unbound, PlayerEvent::Ready { duration }) => {
                self.state = PlayerState::Ready;
                self.duration = duration.max(0.0);
                true
            }
            (PlayerState::Ready | PlayerState::Paused, PlayerEvent::Playing) => {
                self.state = PlayerState::Playing;
                true
            }
            (PlayerState::Playing, PlayerEvent::Paused) => {
                self.state = PlayerState::Paused;
                true
            }
            (PlayerState::Playing, PlayerEvent::Ended) => {
                self.state = PlayerState::Ended;
                self.watched = true;
                self.elapsed = self.duration;
                true
            }
            (_, PlayerEvent::Error { .. }) => false,
            _ => false,
        }
    }

    /// Records a sampled playback position.
    ///
    /// Ignored while unbound. `elapsed` is a high-water mark: a position
    /// jumping backwards (seek) does not reduce the observed watch time.
    /// The threshold is evaluated only once a positive duration is known,
    /// guarding the division before the handle reports one.
    pub fn tick(&mut self, position: f64) {
        if !self.is_bound() {
            return;
        }
        self.elapsed = self.elapsed.max(position.max(0.0));
        if self.duration > 0.0 && self.elapsed / self.duration >= WATCH_THRESHOLD {
            self.watched = true;
        }
    }

    /// Offers the manual fallback affordance after a load timeout.
    ///
    /// Pure UI affordance: gating state is untouched.
    pub fn offer_fallback(&mut self) {
        self.fallback_offered = true;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
