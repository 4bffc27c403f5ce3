//! Playback state machine.
//!
//! [`transition`] maps `(core, document, event)` to a new core plus the
//! side effects to run, as [`PlaybackAction`] values. It never touches an
//! audio backend, so every rule here can be exercised without one; the
//! controller executes the actions and feeds outcomes back as events.

use super::advance::{Advance, advance};
use super::state::{FailurePolicy, PlaybackCore, PlaybackPolicy, PlaybackState, PreambleRepeat};
use crate::audio::Episode;
use crate::model::{Document, Position};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Play,
    Pause,
    SelectVerse(Position),
    /// The controller swapped in a new document.
    DocumentReplaced,
    AudioFinished(Episode),
    AudioFailed { episode: Episode, error: String },
    /// The page requested by [`PlaybackAction::AssemblePage`] is now the
    /// current document.
    PageAssembled(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackAction {
    StopPrimary,
    StartPreamble { episode: Episode, position: Position },
    StartVerse { episode: Episode, position: Position },
    Warm(Position),
    AssemblePage(u32),
}

pub struct TransitionContext<'a> {
    pub document: &'a Document,
    pub policy: &'a PlaybackPolicy,
    pub max_page: u32,
}

pub fn transition(
    core: &mut PlaybackCore,
    ctx: &TransitionContext<'_>,
    event: PlaybackEvent,
) -> Vec<PlaybackAction> {
    match event {
        PlaybackEvent::Play => on_play(core, ctx),
        PlaybackEvent::Pause => on_pause(core),
        PlaybackEvent::SelectVerse(position) => on_select_verse(core, ctx, position),
        PlaybackEvent::DocumentReplaced => on_document_replaced(core),
        PlaybackEvent::AudioFinished(episode) => on_audio_finished(core, ctx, episode),
        PlaybackEvent::AudioFailed { episode, error } => {
            on_audio_failed(core, ctx, episode, &error)
        }
        PlaybackEvent::PageAssembled(page) => on_page_assembled(core, ctx, page),
    }
}

fn on_play(core: &mut PlaybackCore, ctx: &TransitionContext<'_>) -> Vec<PlaybackAction> {
    core.cancel();
    let mut actions = vec![PlaybackAction::StopPrimary];

    let resume = core.position.filter(|position| ctx.document.contains(*position));
    let position = match resume {
        Some(position) => {
            if ctx.policy.preamble_repeat == PreambleRepeat::EveryStart {
                core.preamble_played = None;
            }
            position
        }
        None => {
            let Some(first) = ctx.document.first_position() else {
                info!("Nothing to play; document is empty");
                core.state = PlaybackState::Idle;
                core.position = None;
                return actions;
            };
            if core.position.is_some() {
                debug!(%first, "Position not in document; restarting from its first verse");
            }
            core.preamble_played = None;
            first
        }
    };

    start_at(core, ctx, position, &mut actions);
    actions
}

fn on_pause(core: &mut PlaybackCore) -> Vec<PlaybackAction> {
    core.cancel();
    if core.position.is_some() {
        core.state = PlaybackState::Paused;
    }
    debug!(position = ?core.position, "Paused playback");
    vec![PlaybackAction::StopPrimary]
}

fn on_select_verse(
    core: &mut PlaybackCore,
    ctx: &TransitionContext<'_>,
    position: Position,
) -> Vec<PlaybackAction> {
    // Invalid selections leave whatever is playing untouched.
    if !ctx.document.contains(position) {
        warn!(%position, "Ignoring selection of a verse outside the document");
        return Vec::new();
    }
    core.cancel();
    let mut actions = vec![PlaybackAction::StopPrimary];
    start_verse(core, ctx, position, &mut actions);
    actions
}

fn on_document_replaced(core: &mut PlaybackCore) -> Vec<PlaybackAction> {
    core.cancel();
    core.state = PlaybackState::Idle;
    core.position = None;
    core.preamble_played = None;
    vec![PlaybackAction::StopPrimary]
}

fn on_audio_finished(
    core: &mut PlaybackCore,
    ctx: &TransitionContext<'_>,
    episode: Episode,
) -> Vec<PlaybackAction> {
    if episode != core.episode || core.pending_page.is_some() {
        debug!(%episode, current = %core.episode, "Ignoring stale audio completion");
        return Vec::new();
    }
    let Some(position) = core.position else {
        return Vec::new();
    };
    let mut actions = Vec::new();
    match core.state {
        PlaybackState::PreambleActive => start_verse(core, ctx, position, &mut actions),
        PlaybackState::VersePlaying => run_advance(core, ctx, position, &mut actions),
        PlaybackState::Idle | PlaybackState::Paused => {}
    }
    actions
}

fn on_audio_failed(
    core: &mut PlaybackCore,
    ctx: &TransitionContext<'_>,
    episode: Episode,
    error: &str,
) -> Vec<PlaybackAction> {
    if episode != core.episode {
        debug!(%episode, "Ignoring failure of a cancelled episode");
        return Vec::new();
    }
    warn!(
        %episode,
        position = ?core.position,
        state = ?core.state,
        "Audio failed: {error}"
    );
    match ctx.policy.on_audio_failure {
        FailurePolicy::Stall => Vec::new(),
        FailurePolicy::Skip => on_audio_finished(core, ctx, episode),
    }
}

fn on_page_assembled(
    core: &mut PlaybackCore,
    ctx: &TransitionContext<'_>,
    page: u32,
) -> Vec<PlaybackAction> {
    if core.pending_page != Some(page) {
        debug!(page, "Ignoring page that is no longer awaited");
        return Vec::new();
    }
    core.pending_page = None;
    core.preamble_played = None;
    let mut actions = Vec::new();
    match ctx.document.first_position() {
        Some(first) => {
            info!(page, %first, "Continuing recitation on next page");
            start_at(core, ctx, first, &mut actions);
        }
        None => {
            warn!(page, "Next page has no verses; stopping");
            finish(core);
        }
    }
    actions
}

fn run_advance(
    core: &mut PlaybackCore,
    ctx: &TransitionContext<'_>,
    from: Position,
    actions: &mut Vec<PlaybackAction>,
) {
    match advance(ctx.document, from, ctx.max_page) {
        Advance::Verse {
            position,
            entered_section,
        } => {
            if entered_section {
                core.preamble_played = None;
            }
            start_at(core, ctx, position, actions);
        }
        Advance::NextPage(page) => {
            core.cancel();
            core.pending_page = Some(page);
            actions.push(PlaybackAction::AssemblePage(page));
        }
        Advance::Finished => {
            info!(last = %from, "Reached end of document");
            finish(core);
        }
    }
}

/// Begin at `position`, inserting the preamble when it is due.
fn start_at(
    core: &mut PlaybackCore,
    ctx: &TransitionContext<'_>,
    position: Position,
    actions: &mut Vec<PlaybackAction>,
) {
    let preamble_due = ctx.policy.is_preamble_eligible(position)
        && core.preamble_played != Some(position.section);
    if !preamble_due {
        start_verse(core, ctx, position, actions);
        return;
    }
    core.position = Some(position);
    core.state = PlaybackState::PreambleActive;
    core.preamble_played = Some(position.section);
    let episode = core.begin_episode();
    debug!(%position, %episode, "Starting preamble");
    actions.push(PlaybackAction::StartPreamble { episode, position });
    if ctx.policy.preload_next {
        actions.push(PlaybackAction::Warm(position));
    }
}

/// Play the verse itself, never the preamble.
fn start_verse(
    core: &mut PlaybackCore,
    ctx: &TransitionContext<'_>,
    position: Position,
    actions: &mut Vec<PlaybackAction>,
) {
    core.position = Some(position);
    core.state = PlaybackState::VersePlaying;
    let episode = core.begin_episode();
    debug!(%position, %episode, "Starting verse");
    actions.push(PlaybackAction::StartVerse { episode, position });
    if !ctx.policy.preload_next {
        return;
    }
    if let Advance::Verse { position: next, .. } = advance(ctx.document, position, ctx.max_page) {
        actions.push(PlaybackAction::Warm(next));
    }
}

fn finish(core: &mut PlaybackCore) {
    core.cancel();
    core.state = PlaybackState::Idle;
    core.position = None;
    core.preamble_played = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ViewMode;
    use crate::testing::section;

    struct Harness {
        core: PlaybackCore,
        document: Document,
        policy: PlaybackPolicy,
    }

    impl Harness {
        fn new(document: Document) -> Self {
            Self {
                core: PlaybackCore::new(),
                document,
                policy: PlaybackPolicy::default(),
            }
        }

        fn send(&mut self, event: PlaybackEvent) -> Vec<PlaybackAction> {
            let ctx = TransitionContext {
                document: &self.document,
                policy: &self.policy,
                max_page: 604,
            };
            transition(&mut self.core, &ctx, event)
        }

        fn finish_current(&mut self) -> Vec<PlaybackAction> {
            let episode = self.core.episode();
            self.send(PlaybackEvent::AudioFinished(episode))
        }
    }

    fn started(actions: &[PlaybackAction]) -> Option<(bool, Position)> {
        actions.iter().find_map(|action| match action {
            PlaybackAction::StartPreamble { position, .. } => Some((true, *position)),
            PlaybackAction::StartVerse { position, .. } => Some((false, *position)),
            _ => None,
        })
    }

    #[test]
    fn play_from_idle_on_eligible_section_starts_preamble() {
        let mut h = Harness::new(Document::new(
            ViewMode::WholeSection(2),
            vec![section(2, &[2, 2])],
        ));
        let actions = h.send(PlaybackEvent::Play);
        assert_eq!(h.core.state(), PlaybackState::PreambleActive);
        assert_eq!(h.core.position(), Some(Position::new(2, 1)));
        assert_eq!(started(&actions), Some((true, Position::new(2, 1))));
        assert!(actions.contains(&PlaybackAction::Warm(Position::new(2, 1))));

        let actions = h.finish_current();
        assert_eq!(h.core.state(), PlaybackState::VersePlaying);
        assert_eq!(started(&actions), Some((false, Position::new(2, 1))));
        assert!(actions.contains(&PlaybackAction::Warm(Position::new(2, 2))));
    }

    #[test]
    fn play_on_ninth_section_skips_preamble() {
        let mut h = Harness::new(Document::new(
            ViewMode::WholeSection(9),
            vec![section(9, &[187])],
        ));
        let actions = h.send(PlaybackEvent::Play);
        assert_eq!(h.core.state(), PlaybackState::VersePlaying);
        assert_eq!(started(&actions), Some((false, Position::new(9, 1))));
    }

    #[test]
    fn select_verse_bypasses_preamble() {
        let mut h = Harness::new(Document::new(
            ViewMode::WholeSection(2),
            vec![section(2, &[2, 2])],
        ));
        let actions = h.send(PlaybackEvent::SelectVerse(Position::new(2, 1)));
        assert_eq!(h.core.state(), PlaybackState::VersePlaying);
        assert_eq!(started(&actions), Some((false, Position::new(2, 1))));
        assert_eq!(actions.first(), Some(&PlaybackAction::StopPrimary));
    }

    #[test]
    fn select_outside_document_changes_nothing() {
        let mut h = Harness::new(Document::new(
            ViewMode::WholeSection(2),
            vec![section(2, &[2, 2])],
        ));
        h.send(PlaybackEvent::Play);
        let before = h.core.clone();
        assert!(h.send(PlaybackEvent::SelectVerse(Position::new(3, 1))).is_empty());
        assert_eq!(h.core, before);
    }

    #[test]
    fn stale_completion_after_pause_is_discarded() {
        let mut h = Harness::new(Document::new(
            ViewMode::WholeSection(9),
            vec![section(9, &[187, 187])],
        ));
        h.send(PlaybackEvent::Play);
        let stale = h.core.episode();
        h.send(PlaybackEvent::Pause);
        assert_eq!(h.core.state(), PlaybackState::Paused);
        assert!(h.send(PlaybackEvent::AudioFinished(stale)).is_empty());
        assert_eq!(h.core.position(), Some(Position::new(9, 1)));
        assert_eq!(h.core.state(), PlaybackState::Paused);
    }

    #[test]
    fn resume_after_preamble_goes_straight_to_verse() {
        let mut h = Harness::new(Document::new(
            ViewMode::WholeSection(2),
            vec![section(2, &[2, 2])],
        ));
        h.send(PlaybackEvent::Play);
        h.send(PlaybackEvent::Pause);
        let actions = h.send(PlaybackEvent::Play);
        assert_eq!(started(&actions), Some((false, Position::new(2, 1))));
    }

    #[test]
    fn every_start_policy_replays_preamble_on_resume() {
        let mut h = Harness::new(Document::new(
            ViewMode::WholeSection(2),
            vec![section(2, &[2, 2])],
        ));
        h.policy.preamble_repeat = PreambleRepeat::EveryStart;
        h.send(PlaybackEvent::Play);
        h.send(PlaybackEvent::Pause);
        let actions = h.send(PlaybackEvent::Play);
        assert_eq!(started(&actions), Some((true, Position::new(2, 1))));
    }

    #[test]
    fn entering_next_section_plays_its_preamble() {
        let mut h = Harness::new(Document::new(
            ViewMode::WholePart(1),
            vec![section(1, &[1]), section(2, &[2])],
        ));
        let actions = h.send(PlaybackEvent::Play);
        assert_eq!(started(&actions), Some((false, Position::new(1, 1))));
        assert!(actions.contains(&PlaybackAction::Warm(Position::new(2, 1))));

        let actions = h.finish_current();
        assert_eq!(h.core.state(), PlaybackState::PreambleActive);
        assert_eq!(started(&actions), Some((true, Position::new(2, 1))));
    }

    #[test]
    fn end_of_page_requests_next_page_then_resumes() {
        let mut h = Harness::new(Document::new(
            ViewMode::SinglePage(1),
            vec![section(1, &[1, 1, 1, 1, 1, 1, 1])],
        ));
        h.send(PlaybackEvent::SelectVerse(Position::new(1, 7)));
        let actions = h.finish_current();
        assert_eq!(actions, vec![PlaybackAction::AssemblePage(2)]);
        assert_eq!(h.core.state(), PlaybackState::VersePlaying);

        h.document = Document::new(ViewMode::SinglePage(2), vec![section(2, &[2, 2])]);
        let actions = h.send(PlaybackEvent::PageAssembled(2));
        assert_eq!(h.core.position(), Some(Position::new(2, 1)));
        assert_eq!(h.core.state(), PlaybackState::PreambleActive);
        assert_eq!(started(&actions), Some((true, Position::new(2, 1))));
    }

    #[test]
    fn command_during_page_rollover_drops_the_awaited_page() {
        let mut h = Harness::new(Document::new(
            ViewMode::SinglePage(1),
            vec![section(1, &[1])],
        ));
        h.send(PlaybackEvent::Play);
        h.finish_current();
        h.send(PlaybackEvent::Pause);
        assert!(h.send(PlaybackEvent::PageAssembled(2)).is_empty());
    }

    #[test]
    fn empty_next_page_ends_playback() {
        let mut h = Harness::new(Document::new(
            ViewMode::SinglePage(1),
            vec![section(1, &[1])],
        ));
        h.send(PlaybackEvent::Play);
        h.finish_current();
        h.document = Document::empty(ViewMode::SinglePage(2));
        h.send(PlaybackEvent::PageAssembled(2));
        assert_eq!(h.core.state(), PlaybackState::Idle);
        assert_eq!(h.core.position(), None);
    }

    #[test]
    fn stall_policy_keeps_state_on_failure() {
        let mut h = Harness::new(Document::new(
            ViewMode::WholeSection(9),
            vec![section(9, &[187, 187])],
        ));
        h.send(PlaybackEvent::Play);
        let episode = h.core.episode();
        let actions = h.send(PlaybackEvent::AudioFailed {
            episode,
            error: "decode".into(),
        });
        assert!(actions.is_empty());
        assert_eq!(h.core.state(), PlaybackState::VersePlaying);
        assert_eq!(h.core.position(), Some(Position::new(9, 1)));
    }

    #[test]
    fn skip_policy_advances_past_failure() {
        let mut h = Harness::new(Document::new(
            ViewMode::WholeSection(9),
            vec![section(9, &[187, 187])],
        ));
        h.policy.on_audio_failure = FailurePolicy::Skip;
        h.send(PlaybackEvent::Play);
        let episode = h.core.episode();
        let actions = h.send(PlaybackEvent::AudioFailed {
            episode,
            error: "network".into(),
        });
        assert_eq!(started(&actions), Some((false, Position::new(9, 2))));
    }

    #[test]
    fn stale_failure_is_discarded_under_skip_policy() {
        let mut h = Harness::new(Document::new(
            ViewMode::WholeSection(9),
            vec![section(9, &[187, 187, 187])],
        ));
        h.policy.on_audio_failure = FailurePolicy::Skip;
        h.send(PlaybackEvent::Play);
        let stale = h.core.episode();
        h.send(PlaybackEvent::SelectVerse(Position::new(9, 2)));

        let actions = h.send(PlaybackEvent::AudioFailed {
            episode: stale,
            error: "network".into(),
        });
        assert!(actions.is_empty());
        assert_eq!(h.core.state(), PlaybackState::VersePlaying);
        assert_eq!(h.core.position(), Some(Position::new(9, 2)));
    }

    #[test]
    fn play_on_empty_document_stays_idle() {
        let mut h = Harness::new(Document::empty(ViewMode::SinglePage(700)));
        let actions = h.send(PlaybackEvent::Play);
        assert_eq!(actions, vec![PlaybackAction::StopPrimary]);
        assert_eq!(h.core.state(), PlaybackState::Idle);
    }

    #[test]
    fn document_replacement_resets_to_idle() {
        let mut h = Harness::new(Document::new(
            ViewMode::WholeSection(2),
            vec![section(2, &[2])],
        ));
        h.send(PlaybackEvent::Play);
        h.send(PlaybackEvent::DocumentReplaced);
        assert_eq!(h.core.state(), PlaybackState::Idle);
        assert_eq!(h.core.position(), None);
        assert_eq!(h.core.preamble_played(), None);
    }

    #[test]
    fn preload_can_be_disabled() {
        let mut h = Harness::new(Document::new(
            ViewMode::WholeSection(9),
            vec![section(9, &[187, 187])],
        ));
        h.policy.preload_next = false;
        let actions = h.send(PlaybackEvent::Play);
        assert!(
            !actions
                .iter()
                .any(|action| matches!(action, PlaybackAction::Warm(_)))
        );
    }
}
