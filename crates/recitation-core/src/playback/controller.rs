use super::preloader::Preloader;
use super::state::{PlaybackCore, PlaybackPolicy, PlaybackState, StateChange};
use super::transitions::{PlaybackAction, PlaybackEvent, TransitionContext, transition};
use crate::assembler::assemble;
use crate::audio::{AudioEvent, AudioSink, Episode};
use crate::bookmark::{BookmarkAdapter, BookmarkRequest, bookmark_request};
use crate::content::ContentSource;
use crate::model::{Document, Position, ViewMode};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Commands the UI can issue. All of them are accepted in every state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    TogglePlayPause,
    SelectVerse(Position),
    ChangeDocument(Document),
    /// Assemble `mode` and switch to it.
    Open(ViewMode),
}

impl Command {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::TogglePlayPause => "toggle_play_pause",
            Self::SelectVerse(_) => "select_verse",
            Self::ChangeDocument(_) => "change_document",
            Self::Open(_) => "open",
        }
    }
}

/// Drives the recitation of one document.
///
/// Owns the primary audio resource, the preloader's secondary resource, the
/// current document and the playback core. Audio outcomes come back through
/// [`PlaybackController::handle_audio_event`] (or [`PlaybackController::poll_audio`]);
/// every call returns the state changes the UI should reflect.
pub struct PlaybackController<S, A> {
    source: S,
    document: Document,
    policy: PlaybackPolicy,
    core: PlaybackCore,
    primary: A,
    preloader: Preloader<A>,
}

impl<S: ContentSource, A: AudioSink> PlaybackController<S, A> {
    pub fn new(source: S, primary: A, preload: A, policy: PlaybackPolicy, mode: ViewMode) -> Self {
        let document = assemble(&source, mode);
        Self {
            source,
            document,
            policy,
            core: PlaybackCore::new(),
            primary,
            preloader: Preloader::new(preload),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.core.state()
    }

    pub fn position(&self) -> Option<Position> {
        self.core.position()
    }

    pub fn snapshot(&self) -> StateChange {
        self.core.snapshot()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn apply_command(&mut self, command: Command) -> Vec<StateChange> {
        debug!(action = command.action(), "Applying playback command");
        match command {
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::TogglePlayPause => self.toggle_play_pause(),
            Command::SelectVerse(position) => self.select_verse(position),
            Command::ChangeDocument(document) => self.change_document(document),
            Command::Open(mode) => self.open(mode),
        }
    }

    pub fn play(&mut self) -> Vec<StateChange> {
        self.dispatch(PlaybackEvent::Play)
    }

    pub fn pause(&mut self) -> Vec<StateChange> {
        self.dispatch(PlaybackEvent::Pause)
    }

    pub fn toggle_play_pause(&mut self) -> Vec<StateChange> {
        if self.core.state().is_audible() {
            self.pause()
        } else {
            self.play()
        }
    }

    pub fn select_verse(&mut self, position: Position) -> Vec<StateChange> {
        self.dispatch(PlaybackEvent::SelectVerse(position))
    }

    pub fn change_document(&mut self, document: Document) -> Vec<StateChange> {
        info!(
            mode = %document.mode(),
            verses = document.verse_count(),
            "Replacing document"
        );
        self.document = document;
        self.dispatch(PlaybackEvent::DocumentReplaced)
    }

    pub fn open(&mut self, mode: ViewMode) -> Vec<StateChange> {
        let document = assemble(&self.source, mode);
        self.change_document(document)
    }

    pub fn handle_audio_event(&mut self, event: AudioEvent) -> Vec<StateChange> {
        match event {
            AudioEvent::Finished(episode) => self.dispatch(PlaybackEvent::AudioFinished(episode)),
            AudioEvent::Failed { episode, error } => {
                self.dispatch(PlaybackEvent::AudioFailed { episode, error })
            }
        }
    }

    /// Drain outcomes reported by both audio resources.
    pub fn poll_audio(&mut self) -> Vec<StateChange> {
        self.preloader.drain();
        let mut changes = Vec::new();
        while let Some(event) = self.primary.poll() {
            changes.extend(self.handle_audio_event(event));
        }
        changes
    }

    pub fn bookmark_request(&self) -> BookmarkRequest {
        bookmark_request(self.document.mode(), &self.document, self.source.index())
    }

    pub fn toggle_bookmark(&self, adapter: &mut dyn BookmarkAdapter) {
        adapter.toggle(self.bookmark_request());
    }

    fn dispatch(&mut self, event: PlaybackEvent) -> Vec<StateChange> {
        let mut changes = Vec::new();
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let before = self.core.snapshot();
            let actions = {
                let ctx = TransitionContext {
                    document: &self.document,
                    policy: &self.policy,
                    max_page: self.source.index().max_page,
                };
                transition(&mut self.core, &ctx, event)
            };
            let mut restarted = false;
            for action in actions {
                restarted |= matches!(
                    action,
                    PlaybackAction::StartPreamble { .. } | PlaybackAction::StartVerse { .. }
                );
                if let Some(follow_up) = self.run_action(action) {
                    queue.push_back(follow_up);
                }
            }
            let after = self.core.snapshot();
            if restarted || after != before {
                changes.push(after);
            }
        }
        changes
    }

    fn run_action(&mut self, action: PlaybackAction) -> Option<PlaybackEvent> {
        match action {
            PlaybackAction::StopPrimary => {
                self.primary.stop();
                None
            }
            PlaybackAction::StartPreamble { episode, position } => {
                info!(%position, %episode, "Playing preamble");
                let locator = self.policy.preamble_locator.clone();
                self.start_primary(&locator, episode)
            }
            PlaybackAction::StartVerse { episode, position } => {
                let Some(locator) = self.document.verse(position).map(|verse| verse.audio.clone())
                else {
                    return Some(PlaybackEvent::AudioFailed {
                        episode,
                        error: format!("verse {position} is not in the document"),
                    });
                };
                info!(%position, %episode, "Playing verse");
                self.start_primary(&locator, episode)
            }
            PlaybackAction::Warm(position) => {
                self.preloader.warm(&self.document, position);
                None
            }
            PlaybackAction::AssemblePage(page) => {
                self.document = assemble(&self.source, ViewMode::SinglePage(page));
                Some(PlaybackEvent::PageAssembled(page))
            }
        }
    }

    fn start_primary(&mut self, locator: &str, episode: Episode) -> Option<PlaybackEvent> {
        let started = self
            .primary
            .load(locator)
            .and_then(|()| self.primary.play(episode));
        match started {
            Ok(()) => None,
            Err(err) => {
                warn!(%locator, %episode, "Could not start audio: {err:#}");
                Some(PlaybackEvent::AudioFailed {
                    episode,
                    error: format!("{err:#}"),
                })
            }
        }
    }
}
