//! Parsing of command-line arguments and the line commands read from stdin.

use crate::config::TextMode;
use anyhow::{Context, Result, anyhow, bail};
use recitation_core::{Position, ViewMode, ViewType};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";

pub const USAGE: &str = "Usage: recitation-player [--config <path>] [section|part|page <n>]";

pub const HELP: &str = "\
Commands:
  play | pause | toggle         control playback
  select <section> <verse>      play from a verse of the open view
  section|part|page <n>         open another view
  bookmark                      toggle a bookmark for the open view
  bookmarks                     list saved bookmarks
  open <n>                      open the n-th saved bookmark
  list sections|parts           show the corpus index
  mode arabic|both|translation   choose which verse texts are shown
  config                        print the active configuration
  help                          show this help
  quit                          stop and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchArgs {
    pub config_path: PathBuf,
    pub mode: ViewMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Sections,
    Parts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Play,
    Pause,
    Toggle,
    Select(Position),
    Open(ViewMode),
    Bookmark,
    Bookmarks,
    OpenBookmark(usize),
    List(Listing),
    Text(TextMode),
    ShowConfig,
    Help,
    Quit,
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<LaunchArgs> {
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut rest = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().ok_or_else(|| anyhow!("--config needs a path\n{USAGE}"))?;
            config_path = PathBuf::from(path);
        } else {
            rest.push(arg);
        }
    }
    let mode = match rest.as_slice() {
        [] => ViewMode::SinglePage(1),
        [kind, number] => parse_view(kind, number).with_context(|| USAGE.to_string())?,
        _ => bail!("{USAGE}"),
    };
    Ok(LaunchArgs { config_path, mode })
}

pub fn parse_input(line: &str) -> Result<Input> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let input = match words.as_slice() {
        ["play"] => Input::Play,
        ["pause"] => Input::Pause,
        ["toggle" | "t"] => Input::Toggle,
        ["select", section, verse] => Input::Select(Position::new(
            parse_number(section, "section")?,
            parse_number(verse, "verse")?,
        )),
        [kind @ ("section" | "part" | "page"), number] => Input::Open(parse_view(kind, number)?),
        ["bookmark" | "b"] => Input::Bookmark,
        ["bookmarks"] => Input::Bookmarks,
        ["open", index] => {
            let index: usize = parse_number(index, "bookmark index")?;
            if index == 0 {
                bail!("bookmark indices start at 1");
            }
            Input::OpenBookmark(index - 1)
        }
        ["list", "sections"] => Input::List(Listing::Sections),
        ["list", "parts"] => Input::List(Listing::Parts),
        ["mode", "arabic"] => Input::Text(TextMode::Arabic),
        ["mode", "both"] => Input::Text(TextMode::Both),
        ["mode", "translation"] => Input::Text(TextMode::Translation),
        ["config"] => Input::ShowConfig,
        ["help" | "?"] => Input::Help,
        ["quit" | "q" | "exit"] => Input::Quit,
        [] => bail!("empty command"),
        _ => bail!("unknown command: {}", line.trim()),
    };
    Ok(input)
}

fn parse_view(kind: &str, number: &str) -> Result<ViewMode> {
    let view_type = match kind {
        "section" => ViewType::Section,
        "part" => ViewType::Part,
        "page" => ViewType::Page,
        other => bail!("unknown view {other:?}"),
    };
    let identifier: u32 = parse_number(number, kind)?;
    if identifier == 0 {
        bail!("{kind} numbers start at 1");
    }
    ViewMode::from_parts(view_type, identifier).ok_or_else(|| anyhow!("{kind} {identifier} is out of range"))
}

fn parse_number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| anyhow!("invalid {what} number: {raw:?}"))
}
