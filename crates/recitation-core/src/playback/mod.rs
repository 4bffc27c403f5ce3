//! Sequential recitation playback: the state machine, its driver and the
//! preloader.

mod advance;
mod controller;
mod preloader;
mod state;
mod transitions;

pub use advance::{Advance, advance};
pub use controller::{Command, PlaybackController};
pub use preloader::Preloader;
pub use state::{
    DEFAULT_PREAMBLE_EXEMPT, FailurePolicy, PREAMBLE_LOCATOR, PlaybackCore, PlaybackPolicy,
    PlaybackState, PreambleRepeat, StateChange,
};
pub use transitions::{PlaybackAction, PlaybackEvent, TransitionContext, transition};
