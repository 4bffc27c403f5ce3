//! Terminal front-end.
//!
//! Reads line commands from stdin on a helper thread, feeds them to the
//! playback controller, and ticks the controller so audio completions are
//! picked up. Every state change is printed as one line, preceded by a
//! header whenever the open view changes.

use crate::audio::{ClipFetcher, RodioSink};
use crate::cache::BookmarkStore;
use crate::commands::{HELP, Input, Listing, parse_input};
use crate::config::{AppConfig, TextMode, serialize_config};
use crate::display::{format_bookmarks, format_document, format_parts, format_sections, format_state};
use anyhow::{Context, Result};
use recitation_core::{
    ContentSource, Document, JsonCorpus, PlaybackController, StateChange, ViewMode,
};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

type Controller = PlaybackController<JsonCorpus, RodioSink>;

pub fn run_app(config: AppConfig, mode: ViewMode) -> Result<()> {
    let corpus = JsonCorpus::open(&config.data_dir, config.max_page)
        .with_context(|| format!("Opening corpus at {}", config.data_dir))?;
    let fetcher = Arc::new(ClipFetcher::new(
        PathBuf::from(&config.data_dir),
        PathBuf::from(&config.cache_dir),
        Duration::from_secs(config.fetch_timeout_secs),
    )?);
    let primary = RodioSink::new(Arc::clone(&fetcher), config.volume)?;
    let preload = RodioSink::prefetch_only(fetcher);
    let controller =
        PlaybackController::new(corpus, primary, preload, config.playback_policy(), mode);
    let bookmarks = BookmarkStore::load(Path::new(&config.cache_dir));
    println!("{}", format_document(controller.document()));

    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit = Arc::clone(&quit);
        ctrlc::set_handler(move || quit.store(true, Ordering::SeqCst))
            .context("Installing Ctrl-C handler")?;
    }
    let lines = spawn_stdin_reader()?;
    let tick = Duration::from_millis(config.poll_interval_ms);
    info!(%mode, tick_ms = config.poll_interval_ms, "Player ready; type `help` for commands");

    let mut player = Player {
        shown_mode: controller.document().mode(),
        text_mode: config.text_mode,
        controller,
        bookmarks,
        config: &config,
    };
    let mut stdin_open = true;
    while !quit.load(Ordering::SeqCst) {
        while stdin_open {
            match lines.try_recv() {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_input(&line) {
                        Ok(Input::Quit) => quit.store(true, Ordering::SeqCst),
                        Ok(input) => player.handle_input(input),
                        Err(err) => println!("{err:#}"),
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("stdin closed; playback continues until Ctrl-C");
                    stdin_open = false;
                }
            }
        }
        let changes = player.controller.poll_audio();
        player.report(changes);
        thread::sleep(tick);
    }

    info!("Stopping playback");
    player.controller.pause();
    Ok(())
}

struct Player<'a> {
    controller: Controller,
    bookmarks: BookmarkStore,
    config: &'a AppConfig,
    text_mode: TextMode,
    shown_mode: ViewMode,
}

impl Player<'_> {
    fn handle_input(&mut self, input: Input) {
        let changes = match input {
            Input::Play => self.controller.play(),
            Input::Pause => self.controller.pause(),
            Input::Toggle => self.controller.toggle_play_pause(),
            Input::Select(position) => self.controller.select_verse(position),
            Input::Open(mode) => self.open(mode),
            Input::Bookmark => {
                let request = self.controller.bookmark_request();
                let had = self.bookmarks.contains(&request);
                self.controller.toggle_bookmark(&mut self.bookmarks);
                let verb = if had { "removed" } else { "saved" };
                println!("bookmark {verb}: {}", request.label);
                Vec::new()
            }
            Input::Bookmarks => {
                println!("{}", format_bookmarks(self.bookmarks.list()));
                Vec::new()
            }
            Input::OpenBookmark(index) => {
                let mode = self.bookmarks.get(index).and_then(|bookmark| {
                    ViewMode::from_parts(bookmark.view_type, bookmark.identifier)
                });
                match mode {
                    Some(mode) => self.open(mode),
                    None => {
                        warn!(index = index + 1, "No such bookmark");
                        println!("no bookmark {}", index + 1);
                        Vec::new()
                    }
                }
            }
            Input::List(Listing::Sections) => {
                println!("{}", format_sections(self.controller.source().index()));
                Vec::new()
            }
            Input::List(Listing::Parts) => {
                println!("{}", format_parts(self.controller.source().index()));
                Vec::new()
            }
            Input::Text(mode) => {
                info!(%mode, "Switched text mode");
                self.text_mode = mode;
                println!("showing {mode} text");
                Vec::new()
            }
            Input::ShowConfig => {
                match serialize_config(self.config) {
                    Ok(text) => println!("{text}"),
                    Err(err) => warn!("Could not render config: {err:#}"),
                }
                Vec::new()
            }
            Input::Help => {
                println!("{HELP}");
                Vec::new()
            }
            Input::Quit => Vec::new(),
        };
        self.report(changes);
    }

    /// Opening always prints the header, even when the view is unchanged.
    fn open(&mut self, mode: ViewMode) -> Vec<StateChange> {
        let changes = self.controller.open(mode);
        self.shown_mode = self.controller.document().mode();
        println!("{}", format_document(self.controller.document()));
        changes
    }

    fn report(&mut self, changes: Vec<StateChange>) {
        if let Some(header) = document_header(&mut self.shown_mode, self.controller.document()) {
            println!("{header}");
        }
        for change in changes {
            println!(
                "{}",
                format_state(&change, self.controller.document(), self.text_mode)
            );
        }
    }
}

/// Header for `document` when it replaced the view last shown, such as after
/// playback rolled over to the next page.
fn document_header(shown: &mut ViewMode, document: &Document) -> Option<String> {
    if *shown == document.mode() {
        return None;
    }
    *shown = document.mode();
    Some(format_document(document))
}

fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("Spawning stdin reader")?;
    Ok(rx)
}
