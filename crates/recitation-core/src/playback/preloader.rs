use crate::audio::AudioSink;
use crate::model::{Document, Position};
use tracing::debug;

/// Warms the clip that playback will most likely need next on a secondary,
/// silent resource. Never plays, never reports back to the controller.
pub struct Preloader<A> {
    sink: A,
    warmed: Option<String>,
}

impl<A: AudioSink> Preloader<A> {
    pub fn new(sink: A) -> Self {
        Self { sink, warmed: None }
    }

    /// Load the clip of the verse at `position`. Unknown positions and load
    /// errors are ignored.
    pub fn warm(&mut self, document: &Document, position: Position) {
        let Some(verse) = document.verse(position) else {
            debug!(%position, "Nothing to preload; verse not in document");
            return;
        };
        if verse.audio.is_empty() || self.warmed.as_deref() == Some(verse.audio.as_str()) {
            return;
        }
        match self.sink.load(&verse.audio) {
            Ok(()) => {
                debug!(%position, locator = %verse.audio, "Preloading next verse");
                self.warmed = Some(verse.audio.clone());
            }
            Err(err) => debug!(%position, "Preload failed: {err:#}"),
        }
    }

    /// Discard anything the secondary resource reported.
    pub fn drain(&mut self) {
        while let Some(event) = self.sink.poll() {
            debug!(?event, "Discarding preloader event");
        }
    }

    #[cfg(test)]
    fn warmed(&self) -> Option<&str> {
        self.warmed.as_deref()
    }
}
