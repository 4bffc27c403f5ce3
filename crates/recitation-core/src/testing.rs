//! Test fixtures shared by the unit tests of this crate.

use crate::audio::{AudioEvent, AudioSink, Episode};
use crate::model::{PartInfo, Section, SectionId, SectionInfo, Verse};
use anyhow::{Result, bail};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Section `id` with one verse per entry of `pages`, numbered from 1.
pub(crate) fn section(id: SectionId, pages: &[u32]) -> Section {
    let verses = pages
        .iter()
        .enumerate()
        .map(|(idx, page)| {
            let number = idx as u16 + 1;
            Verse {
                number,
                audio: format!("audio/{id}/{number}.mp3"),
                page: *page,
                text: format!("text {id}:{number}"),
                translation: format!("translation {id}:{number}"),
                footnotes: Vec::new(),
            }
        })
        .collect::<Vec<_>>();
    Section {
        info: SectionInfo {
            number: id,
            name: format!("Name {id}"),
            native_name: String::new(),
            verse_count: verses.len(),
        },
        verses,
    }
}

pub(crate) fn part(number: u16, start_page: u32) -> PartInfo {
    PartInfo {
        number,
        start_page,
        name: String::new(),
    }
}

pub(crate) fn scratch_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("recitation-{label}-{}-{nanos}", std::process::id()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SinkCall {
    Load(String),
    Play { locator: String, episode: Episode },
    Pause,
    Stop,
}

#[derive(Default)]
struct SinkLog {
    calls: Vec<SinkCall>,
    loaded: Option<String>,
    pending: VecDeque<AudioEvent>,
}

/// Audio sink that records every call. Clones share the same log, so a test
/// can keep a handle while the controller owns another.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
    failing: HashSet<String>,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_on(mut self, locator: &str) -> Self {
        self.failing.insert(locator.to_string());
        self
    }

    fn with_log<T>(&self, f: impl FnOnce(&mut SinkLog) -> T) -> T {
        let mut log = self.log.lock().expect("sink log lock should be available");
        f(&mut log)
    }

    pub(crate) fn calls(&self) -> Vec<SinkCall> {
        self.with_log(|log| log.calls.clone())
    }

    pub(crate) fn clear(&self) {
        self.with_log(|log| log.calls.clear());
    }

    /// Locators passed to `play`, in order.
    pub(crate) fn played(&self) -> Vec<String> {
        self.with_log(|log| {
            log.calls
                .iter()
                .filter_map(|call| match call {
                    SinkCall::Play { locator, .. } => Some(locator.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    pub(crate) fn last_episode(&self) -> Option<Episode> {
        self.with_log(|log| {
            log.calls.iter().rev().find_map(|call| match call {
                SinkCall::Play { episode, .. } => Some(*episode),
                _ => None,
            })
        })
    }

    /// Queue a completion for the most recent `play`, to be drained by `poll`.
    pub(crate) fn finish_current(&self) {
        if let Some(episode) = self.last_episode() {
            self.with_log(|log| log.pending.push_back(AudioEvent::Finished(episode)));
        }
    }
}

impl AudioSink for RecordingSink {
    fn load(&mut self, locator: &str) -> Result<()> {
        let failing = self.failing.contains(locator);
        self.with_log(|log| {
            log.calls.push(SinkCall::Load(locator.to_string()));
            log.loaded = (!failing).then(|| locator.to_string());
        });
        if failing {
            bail!("cannot load {locator}");
        }
        Ok(())
    }

    fn play(&mut self, episode: Episode) -> Result<()> {
        self.with_log(|log| {
            let Some(locator) = log.loaded.clone() else {
                bail!("nothing loaded");
            };
            log.calls.push(SinkCall::Play { locator, episode });
            Ok(())
        })
    }

    fn pause(&mut self) {
        self.with_log(|log| log.calls.push(SinkCall::Pause));
    }

    fn stop(&mut self) {
        self.with_log(|log| {
            log.calls.push(SinkCall::Stop);
            log.loaded = None;
            log.pending.clear();
        });
    }

    fn poll(&mut self) -> Option<AudioEvent> {
        self.with_log(|log| log.pending.pop_front())
    }
}
