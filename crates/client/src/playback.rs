//! Playback provider seam.
//!
//! The engine never talks to a concrete player; it binds a [`PlaybackHandle`]
//! it can poll for position and duration, and receives lifecycle events from
//! whatever host integration embeds the player. Tests inject
//! [`ScriptedHandle`] to exercise the watch-threshold contract without a
//! real provider.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use portal_core::model::MediaRef;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlaybackError {
    #[error("media reference is not embeddable: {0}")]
    Unsupported(String),

    #[error("player embed failed: {0}")]
    EmbedFailed(String),
}

/// Embed knobs for the hosted player.
///
/// Defaults mirror the restricted configuration the portal ships: visible
/// controls, keyboard and fullscreen disabled, no related videos, minimal
/// branding, inline playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct EmbedOptions {
    pub controls: bool,
    pub keyboard: bool,
    pub fullscreen: bool,
    pub related: bool,
    pub modest_branding: bool,
    pub inline: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            controls: true,
            keyboard: false,
            fullscreen: false,
            related: false,
            modest_branding: true,
            inline: true,
        }
    }
}

/// A live player the watch sampler can poll.
pub trait PlaybackHandle: Send + Sync {
    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Total media duration in seconds; zero until known.
    fn duration(&self) -> f64;
}

/// Embeds media into a host container and returns a pollable handle.
pub trait PlaybackProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns `PlaybackError` if the media cannot be embedded.
    fn embed(
        &self,
        media: &MediaRef,
        container_id: &str,
        options: &EmbedOptions,
    ) -> Result<Arc<dyn PlaybackHandle>, PlaybackError>;
}

/// Extracts the 11-character provider video id from the URL forms the
/// backend stores: embed URLs, `watch?v=` URLs, and short share links.
/// Trailing query parameters are stripped.
#[must_use]
pub fn extract_embed_id(url: &str) -> Option<String> {
    let tail = url
        .split_once("youtube.com/embed/")
        .or_else(|| url.split_once("youtube.com/watch?v="))
        .or_else(|| url.split_once("youtu.be/"))
        .map(|(_, tail)| tail)?;

    let id = tail
        .split(['&', '?'])
        .next()
        .unwrap_or_default();

    (id.len() == 11).then(|| id.to_string())
}

//
// ─── SCRIPTED FAKES ────────────────────────────────────────────────────────────
//

/// Deterministic handle for tests: position and duration are set by the
/// test instead of a real player.
#[derive(Clone, Default)]
pub struct ScriptedHandle {
    inner: Arc<Mutex<(f64, f64)>>,
}

impl ScriptedHandle {
    #[must_use]
    pub fn new(duration: f64) -> Self {
        Self {
            inner: Arc::new(Mutex::new((0.0, duration))),
        }
    }

    pub fn set_position(&self, position: f64) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.0 = position;
        }
    }

    pub fn advance(&self, seconds: f64) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.0 += seconds;
        }
    }
}

impl PlaybackHandle for ScriptedHandle {
    fn current_time(&self) -> f64 {
        self.inner.lock().map(|inner| inner.0).unwrap_or_default()
    }

    fn duration(&self) -> f64 {
        self.inner.lock().map(|inner| inner.1).unwrap_or_default()
    }
}

/// Provider that hands out one pre-built [`ScriptedHandle`] per embed call.
#[derive(Clone)]
pub struct ScriptedProvider {
    handle: ScriptedHandle,
}

impl ScriptedProvider {
    #[must_use]
    pub fn new(handle: ScriptedHandle) -> Self {
        Self { handle }
    }
}

impl PlaybackProvider for ScriptedProvider {
    fn embed(
        &self,
        _media: &MediaRef,
        _container_id: &str,
        _options: &EmbedOptions,
    ) -> Result<Arc<dyn PlaybackHandle>, PlaybackError> {
        Ok(Arc::new(self.handle.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_embed_url() {
        assert_eq!(
            extract_embed_id("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn extracts_id_from_watch_url_with_parameters() {
        assert_eq!(
            extract_embed_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn extracts_id_from_short_url() {
        assert_eq!(
            extract_embed_id("https://youtu.be/dQw4w9WgXcQ?si=share").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn rejects_unrecognized_or_truncated_urls() {
        assert!(extract_embed_id("https://vimeo.com/12345").is_none());
        assert!(extract_embed_id("https://youtu.be/short").is_none());
    }

    #[test]
    fn scripted_handle_reports_position() {
        let handle = ScriptedHandle::new(120.0);
        assert_eq!(handle.duration(), 120.0);
        handle.set_position(30.0);
        handle.advance(2.5);
        assert_eq!(handle.current_time(), 32.5);
    }
}
