use crate::audio::Episode;
use crate::model::{Position, SectionId};
use serde::{Deserialize, Serialize};

/// Fixed invocation clip played before the first verse of most sections.
pub const PREAMBLE_LOCATOR: &str =
    "https://cdn.islamic.network/quran/audio/64/ar.saoodshuraym/1.mp3";

/// Sections whose first verse is never preceded by the preamble.
pub const DEFAULT_PREAMBLE_EXEMPT: [SectionId; 2] = [1, 9];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    PreambleActive,
    VersePlaying,
    Paused,
}

impl PlaybackState {
    /// Whether the primary resource is expected to be producing sound.
    pub fn is_audible(self) -> bool {
        matches!(self, PlaybackState::PreambleActive | PlaybackState::VersePlaying)
    }
}

/// What to do when the primary resource reports a load or play failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stay in the issuing state until the next command.
    #[default]
    Stall,
    /// Treat the failure as a completion and move on.
    Skip,
}

/// Whether resuming on a section's first verse replays the preamble after it
/// already played for the current entry into the section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreambleRepeat {
    #[default]
    OncePerEntry,
    EveryStart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackPolicy {
    pub preamble_locator: String,
    pub preamble_exempt: Vec<SectionId>,
    pub on_audio_failure: FailurePolicy,
    pub preamble_repeat: PreambleRepeat,
    pub preload_next: bool,
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self {
            preamble_locator: PREAMBLE_LOCATOR.to_string(),
            preamble_exempt: DEFAULT_PREAMBLE_EXEMPT.to_vec(),
            on_audio_failure: FailurePolicy::default(),
            preamble_repeat: PreambleRepeat::default(),
            preload_next: true,
        }
    }
}

impl PlaybackPolicy {
    /// First verse of a section outside the exempt list.
    pub fn is_preamble_eligible(&self, position: Position) -> bool {
        position.verse == 1 && !self.preamble_exempt.contains(&position.section)
    }
}

/// Mutable half of the state machine. Everything else the transitions read
/// (document, policy) is borrowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackCore {
    pub(crate) state: PlaybackState,
    pub(crate) position: Option<Position>,
    /// Section whose preamble already started during the current entry.
    pub(crate) preamble_played: Option<SectionId>,
    pub(crate) episode: Episode,
    /// Page requested from the assembler while rolling over in page view.
    pub(crate) pending_page: Option<u32>,
}

impl PlaybackCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn episode(&self) -> Episode {
        self.episode
    }

    pub fn preamble_played(&self) -> Option<SectionId> {
        self.preamble_played
    }

    pub(crate) fn begin_episode(&mut self) -> Episode {
        self.episode = self.episode.next();
        self.episode
    }

    /// Invalidate whatever outcome the primary resource may still report.
    pub(crate) fn cancel(&mut self) {
        self.episode = self.episode.next();
        self.pending_page = None;
    }

    pub fn snapshot(&self) -> StateChange {
        StateChange {
            state: self.state,
            position: self.position,
            preamble_section: match (self.state, self.position) {
                (PlaybackState::PreambleActive, Some(position)) => Some(position.section),
                _ => None,
            },
        }
    }
}

/// Notification handed to the UI after each transition. The UI highlights
/// `position` (or the preamble line of `preamble_section`) and scrolls to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub state: PlaybackState,
    pub position: Option<Position>,
    pub preamble_section: Option<SectionId>,
}
