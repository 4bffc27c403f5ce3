//! Audio backend seam.
//!
//! The controller and the preloader drive backends through [`AudioSink`].
//! Completion is not a callback: each `play` call carries an [`Episode`]
//! ticket and the backend reports the outcome as an [`AudioEvent`] tagged
//! with that ticket. The controller only honours events for its current
//! episode, so a completion that arrives after a cancel is discarded.

use anyhow::Result;
use std::fmt;

/// Ticket identifying one playback episode of the primary resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Episode(u64);

impl Episode {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    /// The clip started for `episode` played to its end.
    Finished(Episode),
    /// Loading, decoding or output failed for `episode`.
    Failed { episode: Episode, error: String },
}

pub trait AudioSink {
    /// Point the resource at a new clip. Implementations may fetch lazily.
    fn load(&mut self, locator: &str) -> Result<()>;

    /// Start the loaded clip; its outcome is reported for `episode`.
    fn play(&mut self, episode: Episode) -> Result<()>;

    fn pause(&mut self);

    /// Drop the current clip and any pending outcome.
    fn stop(&mut self);

    /// Drain an outcome that became available since the last call.
    fn poll(&mut self) -> Option<AudioEvent> {
        None
    }
}

impl<T: AudioSink + ?Sized> AudioSink for Box<T> {
    fn load(&mut self, locator: &str) -> Result<()> {
        (**self).load(locator)
    }

    fn play(&mut self, episode: Episode) -> Result<()> {
        (**self).play(episode)
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn poll(&mut self) -> Option<AudioEvent> {
        (**self).poll()
    }
}
