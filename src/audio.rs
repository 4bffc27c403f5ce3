//! Audio output backed by `rodio`.
//!
//! Clips are fetched on a background thread (remote locators through
//! `reqwest`, cached under `<cache_dir>/audio/`), then decoded from memory.
//! `load` only schedules the fetch; a `play` issued before the bytes arrive
//! starts as soon as they do. Completion and failure are reported through
//! [`AudioSink::poll`], tagged with the episode given to `play`.

use crate::cache::audio_cache_path;
use anyhow::{Context, Result, anyhow, bail};
use recitation_core::{AudioEvent, AudioSink, Episode};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::collections::VecDeque;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Resolves clip locators to bytes.
pub struct ClipFetcher {
    data_dir: PathBuf,
    cache_dir: PathBuf,
    client: reqwest::blocking::Client,
}

impl ClipFetcher {
    pub fn new(data_dir: PathBuf, cache_dir: PathBuf, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Building HTTP client")?;
        Ok(Self {
            data_dir,
            cache_dir,
            client,
        })
    }

    pub fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        if is_remote(locator) {
            self.fetch_remote(locator)
        } else {
            let path = self.local_path(locator);
            fs::read(&path).with_context(|| format!("Reading clip {}", path.display()))
        }
    }

    fn local_path(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    fn fetch_remote(&self, locator: &str) -> Result<Vec<u8>> {
        let cached = audio_cache_path(&self.cache_dir, locator);
        if let Ok(bytes) = fs::read(&cached) {
            debug!(%locator, path = %cached.display(), "Using cached clip");
            return Ok(bytes);
        }
        debug!(%locator, "Downloading clip");
        let response = self
            .client
            .get(locator)
            .send()
            .with_context(|| format!("Requesting {locator}"))?
            .error_for_status()
            .with_context(|| format!("Fetching {locator}"))?;
        let bytes = response
            .bytes()
            .with_context(|| format!("Reading body of {locator}"))?
            .to_vec();
        if let Err(err) = store_clip(&cached, &bytes) {
            warn!(path = %cached.display(), "Failed to cache clip: {err:#}");
        }
        Ok(bytes)
    }

    /// Decode fetched bytes. A remote clip that does not decode is dropped
    /// from the cache so the next attempt downloads it again.
    pub fn decode(&self, locator: &str, bytes: Vec<u8>) -> Result<Decoder<Cursor<Vec<u8>>>> {
        match Decoder::new(Cursor::new(bytes)) {
            Ok(source) => Ok(source),
            Err(err) => {
                if is_remote(locator) {
                    let cached = audio_cache_path(&self.cache_dir, locator);
                    if fs::remove_file(&cached).is_ok() {
                        warn!(%locator, path = %cached.display(), "Evicted undecodable cached clip");
                    }
                }
                Err(err).with_context(|| format!("Decoding {locator}"))
            }
        }
    }
}

static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `bytes` to a private temporary file beside `path`, then rename it
/// into place. Readers see either no file or the whole clip.
fn store_clip(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Creating audio cache dir {}", parent.display()))?;
    }
    let mut part = path.as_os_str().to_owned();
    part.push(format!(
        ".{}-{}.part",
        std::process::id(),
        PART_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let part = PathBuf::from(part);
    if let Err(err) = fs::write(&part, bytes).and_then(|()| fs::rename(&part, path)) {
        let _ = fs::remove_file(&part);
        return Err(err).with_context(|| format!("Storing clip {}", path.display()));
    }
    Ok(())
}

fn is_remote(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

struct Output {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

enum Clip {
    Empty,
    Fetching,
    Ready(Vec<u8>),
}

/// One clip at a time on its own `rodio::Sink`. A sink built with
/// [`RodioSink::prefetch_only`] has no output device and can only load.
pub struct RodioSink {
    fetcher: Arc<ClipFetcher>,
    output: Option<Output>,
    current: Option<Sink>,
    volume: f32,
    generation: u64,
    clip: Clip,
    locator: String,
    pending_play: Option<Episode>,
    playing: Option<Episode>,
    events: VecDeque<AudioEvent>,
    tx: Sender<(u64, Result<Vec<u8>>)>,
    rx: Receiver<(u64, Result<Vec<u8>>)>,
}

impl RodioSink {
    pub fn new(fetcher: Arc<ClipFetcher>, volume: f32) -> Result<Self> {
        let (_stream, handle) = OutputStream::try_default().context("Opening audio output")?;
        info!(volume, "Opened audio output");
        let mut sink = Self::prefetch_only(fetcher);
        sink.output = Some(Output { _stream, handle });
        sink.volume = volume;
        Ok(sink)
    }

    pub fn prefetch_only(fetcher: Arc<ClipFetcher>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            fetcher,
            output: None,
            current: None,
            volume: 1.0,
            generation: 0,
            clip: Clip::Empty,
            locator: String::new(),
            pending_play: None,
            playing: None,
            events: VecDeque::new(),
            tx,
            rx,
        }
    }

    fn halt(&mut self) {
        if let Some(sink) = self.current.take() {
            sink.stop();
        }
        self.pending_play = None;
        self.playing = None;
    }

    /// Pick up finished fetches; results from superseded loads are dropped.
    fn receive_fetches(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok((generation, result)) if generation == self.generation => {
                    self.clip = match result {
                        Ok(bytes) => {
                            debug!(locator = %self.locator, bytes = bytes.len(), "Clip ready");
                            Clip::Ready(bytes)
                        }
                        Err(err) => {
                            if let Some(episode) = self.pending_play.take() {
                                self.events.push_back(AudioEvent::Failed {
                                    episode,
                                    error: format!("{err:#}"),
                                });
                            } else {
                                debug!(locator = %self.locator, "Prefetch failed: {err:#}");
                            }
                            Clip::Empty
                        }
                    };
                }
                Ok((generation, _)) => debug!(generation, "Dropping stale fetch result"),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    fn start_if_ready(&mut self) {
        let Some(episode) = self.pending_play else {
            return;
        };
        let Clip::Ready(bytes) = &self.clip else {
            return;
        };
        self.pending_play = None;
        match self.start(bytes.clone()) {
            Ok(sink) => {
                debug!(locator = %self.locator, %episode, "Clip started");
                self.current = Some(sink);
                self.playing = Some(episode);
            }
            Err(err) => self.events.push_back(AudioEvent::Failed {
                episode,
                error: format!("{err:#}"),
            }),
        }
    }

    fn start(&self, bytes: Vec<u8>) -> Result<Sink> {
        let output = self
            .output
            .as_ref()
            .ok_or_else(|| anyhow!("no audio output attached"))?;
        let source = self.fetcher.decode(&self.locator, bytes)?;
        let sink = Sink::try_new(&output.handle).context("Creating sink")?;
        sink.set_volume(self.volume);
        sink.append(source);
        sink.play();
        Ok(sink)
    }
}

impl AudioSink for RodioSink {
    fn load(&mut self, locator: &str) -> Result<()> {
        if locator.is_empty() {
            bail!("empty clip locator");
        }
        self.halt();
        self.generation += 1;
        self.locator = locator.to_string();
        self.clip = Clip::Fetching;
        let generation = self.generation;
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        let locator = locator.to_string();
        thread::Builder::new()
            .name("clip-fetch".into())
            .spawn(move || {
                let result = fetcher.fetch(&locator);
                // Receiver gone means the sink was dropped; nothing to report.
                let _ = tx.send((generation, result));
            })
            .context("Spawning fetch thread")?;
        Ok(())
    }

    fn play(&mut self, episode: Episode) -> Result<()> {
        if self.output.is_none() {
            bail!("sink has no audio output");
        }
        if matches!(self.clip, Clip::Empty) {
            bail!("nothing loaded");
        }
        self.pending_play = Some(episode);
        self.start_if_ready();
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.current {
            sink.pause();
        }
    }

    fn stop(&mut self) {
        self.halt();
        self.events.clear();
    }

    fn poll(&mut self) -> Option<AudioEvent> {
        self.receive_fetches();
        self.start_if_ready();
        if let (Some(sink), Some(episode)) = (&self.current, self.playing) {
            if sink.empty() {
                self.current = None;
                self.playing = None;
                self.events.push_back(AudioEvent::Finished(episode));
            }
        }
        self.events.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Instant, SystemTime, UNIX_EPOCH};

    fn scratch_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!("recitation-audio-{label}-{}-{nanos}", std::process::id()))
    }

    fn fetcher(dir: &Path) -> Arc<ClipFetcher> {
        Arc::new(
            ClipFetcher::new(dir.to_path_buf(), dir.join("cache"), Duration::from_secs(1))
                .expect("client should build"),
        )
    }

    #[test]
    fn relative_locators_resolve_under_data_dir() {
        let dir = scratch_dir("local");
        fs::create_dir_all(dir.join("clips")).expect("create dir");
        fs::write(dir.join("clips/1.mp3"), b"abc").expect("write clip");
        let fetcher = fetcher(&dir);
        assert_eq!(fetcher.fetch("clips/1.mp3").expect("read clip"), b"abc");
        assert!(fetcher.fetch("clips/2.mp3").is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn remote_locators_prefer_cached_bytes() {
        let dir = scratch_dir("remote");
        let locator = "https://invalid.example/audio/1.mp3";
        let cached = audio_cache_path(&dir.join("cache"), locator);
        fs::create_dir_all(cached.parent().expect("parent")).expect("create dir");
        fs::write(&cached, b"cached").expect("write cached clip");
        assert_eq!(fetcher(&dir).fetch(locator).expect("cached clip"), b"cached");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn stored_clip_replaces_target_without_leftovers() {
        let dir = scratch_dir("store");
        let target = dir.join("audio").join("clip.mp3");
        store_clip(&target, b"first").expect("store clip");
        store_clip(&target, b"second").expect("overwrite clip");
        assert_eq!(fs::read(&target).expect("read clip"), b"second");
        let entries = fs::read_dir(dir.join("audio")).expect("list cache").count();
        assert_eq!(entries, 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn undecodable_cached_clip_is_served_only_once() {
        let dir = scratch_dir("truncated");
        let locator = "https://clips.invalid/audio/2/1.mp3";
        let cached = audio_cache_path(&dir.join("cache"), locator);
        store_clip(&cached, b"ID3\x03\x00truncated").expect("seed cached clip");
        let fetcher = fetcher(&dir);

        let bytes = fetcher.fetch(locator).expect("cached bytes are served");
        assert!(fetcher.decode(locator, bytes).is_err());
        assert!(!cached.exists());
        if let Ok(bytes) = fetcher.fetch(locator) {
            assert_ne!(bytes, b"ID3\x03\x00truncated");
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn undecodable_local_clip_is_left_in_place() {
        let dir = scratch_dir("local-bad");
        fs::create_dir_all(&dir).expect("create dir");
        fs::write(dir.join("bad.mp3"), b"nope").expect("write clip");
        let fetcher = fetcher(&dir);
        let bytes = fetcher.fetch("bad.mp3").expect("read clip");
        assert!(fetcher.decode("bad.mp3", bytes).is_err());
        assert!(dir.join("bad.mp3").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn prefetch_only_sink_loads_but_refuses_to_play() {
        let dir = scratch_dir("prefetch");
        fs::create_dir_all(&dir).expect("create dir");
        fs::write(dir.join("a.mp3"), b"abc").expect("write clip");
        let mut sink = RodioSink::prefetch_only(fetcher(&dir));
        sink.load("a.mp3").expect("load schedules fetch");
        assert!(sink.play(Episode::new(1)).is_err());

        let deadline = Instant::now() + Duration::from_secs(5);
        while !matches!(sink.clip, Clip::Ready(_)) && Instant::now() < deadline {
            assert!(sink.poll().is_none());
            thread::sleep(Duration::from_millis(5));
        }
        assert!(matches!(sink.clip, Clip::Ready(_)));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_locator_is_rejected() {
        let dir = scratch_dir("empty");
        let mut sink = RodioSink::prefetch_only(fetcher(&dir));
        assert!(sink.load("").is_err());
    }
}
