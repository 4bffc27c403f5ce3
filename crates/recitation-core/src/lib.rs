//! Core of the recitation player: corpus model, document assembly and the
//! verse-by-verse playback engine. Front-ends supply the audio backend and
//! the bookmark store.

pub mod assembler;
pub mod audio;
pub mod bookmark;
pub mod content;
pub mod model;
pub mod playback;

#[cfg(test)]
mod testing;

pub use assembler::assemble;
pub use audio::{AudioEvent, AudioSink, Episode};
pub use bookmark::{BookmarkAdapter, BookmarkRequest, bookmark_label, bookmark_request};
pub use content::{ContentSource, CorpusIndex, DEFAULT_MAX_PAGE, JsonCorpus, StaticCorpus};
pub use model::{
    Document, Footnote, PartInfo, Position, Section, SectionId, SectionInfo, Verse, VerseNumber,
    ViewMode, ViewType,
};
pub use playback::{
    Command, FailurePolicy, PREAMBLE_LOCATOR, PlaybackController, PlaybackPolicy, PlaybackState,
    PreambleRepeat, StateChange,
};
